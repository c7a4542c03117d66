//! Permission repository
//!
//! Permissions are append-only: created under a group, then read back, with
//! no update or delete path.

use crate::domain::{CreatePermissionInput, Permission, StringUuid};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    async fn create(
        &self,
        permission_group_id: StringUuid,
        input: &CreatePermissionInput,
    ) -> Result<Permission>;
    async fn list_by_group(&self, permission_group_id: StringUuid) -> Result<Vec<Permission>>;
}

pub struct PermissionRepositoryImpl {
    pool: MySqlPool,
}

impl PermissionRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const PERMISSION_COLUMNS: &str =
    "id, permission_group_id, name, description, type, searchable, created_at, updated_at";

#[async_trait]
impl PermissionRepository for PermissionRepositoryImpl {
    async fn create(
        &self,
        permission_group_id: StringUuid,
        input: &CreatePermissionInput,
    ) -> Result<Permission> {
        let id = StringUuid::new_v4();
        let searchable = Permission::search_text(
            &input.name,
            input.description.as_deref(),
            input.permission_type,
        );

        sqlx::query(
            r#"
            INSERT INTO permissions (id, permission_group_id, name, description, type, searchable, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(id)
        .bind(permission_group_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.permission_type)
        .bind(&searchable)
        .execute(&self.pool)
        .await?;

        let created = sqlx::query_as::<_, Permission>(&format!(
            "SELECT {} FROM permissions WHERE id = ?",
            PERMISSION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        created.ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create permission")))
    }

    async fn list_by_group(&self, permission_group_id: StringUuid) -> Result<Vec<Permission>> {
        let permissions = sqlx::query_as::<_, Permission>(&format!(
            r#"
            SELECT {}
            FROM permissions
            WHERE permission_group_id = ?
            ORDER BY created_at ASC
            "#,
            PERMISSION_COLUMNS
        ))
        .bind(permission_group_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(permissions)
    }
}
