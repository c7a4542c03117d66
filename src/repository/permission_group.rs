//! Permission group repository

use crate::domain::{CreateGroupInput, ListQuery, PermissionGroup, StringUuid};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PermissionGroupRepository: Send + Sync {
    async fn create(&self, owner_id: StringUuid, input: &CreateGroupInput)
        -> Result<PermissionGroup>;
    /// Owner-scoped lookup; groups are invisible outside their owner.
    async fn find_for_owner(
        &self,
        owner_id: StringUuid,
        id: StringUuid,
    ) -> Result<Option<PermissionGroup>>;
    async fn list_by_owner(
        &self,
        owner_id: StringUuid,
        query: &ListQuery,
    ) -> Result<Vec<PermissionGroup>>;
    async fn count_by_owner(&self, owner_id: StringUuid, query: &ListQuery) -> Result<i64>;
    /// Write fully-merged fields; the searchable projection is recomputed
    /// from them in the same statement.
    async fn update(
        &self,
        id: StringUuid,
        name: &str,
        description: Option<String>,
        parent_id: Option<StringUuid>,
    ) -> Result<PermissionGroup>;
    /// Hard delete; children keep their dangling parent_id.
    async fn delete(&self, id: StringUuid) -> Result<()>;
}

pub struct PermissionGroupRepositoryImpl {
    pool: MySqlPool,
}

impl PermissionGroupRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const GROUP_COLUMNS: &str =
    "id, owner_id, name, description, parent_id, searchable, created_at, updated_at";

#[async_trait]
impl PermissionGroupRepository for PermissionGroupRepositoryImpl {
    async fn create(
        &self,
        owner_id: StringUuid,
        input: &CreateGroupInput,
    ) -> Result<PermissionGroup> {
        let id = StringUuid::new_v4();
        let searchable = PermissionGroup::search_text(&input.name, input.description.as_deref());

        sqlx::query(
            r#"
            INSERT INTO permission_groups (id, owner_id, name, description, parent_id, searchable, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.parent_id)
        .bind(&searchable)
        .execute(&self.pool)
        .await?;

        self.find_for_owner(owner_id, id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create permission group")))
    }

    async fn find_for_owner(
        &self,
        owner_id: StringUuid,
        id: StringUuid,
    ) -> Result<Option<PermissionGroup>> {
        let group = sqlx::query_as::<_, PermissionGroup>(&format!(
            "SELECT {} FROM permission_groups WHERE id = ? AND owner_id = ?",
            GROUP_COLUMNS
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    async fn list_by_owner(
        &self,
        owner_id: StringUuid,
        query: &ListQuery,
    ) -> Result<Vec<PermissionGroup>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM permission_groups
            WHERE owner_id = ?
              AND (? IS NULL OR LOWER(searchable) LIKE CONCAT('%', LOWER(?), '%'))
            ORDER BY {}
            LIMIT ? OFFSET ?
            "#,
            GROUP_COLUMNS,
            query.order_clause()
        );

        let groups = sqlx::query_as::<_, PermissionGroup>(&sql)
            .bind(owner_id)
            .bind(&query.filter)
            .bind(&query.filter)
            .bind(query.per_page)
            .bind(query.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(groups)
    }

    async fn count_by_owner(&self, owner_id: StringUuid, query: &ListQuery) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM permission_groups
            WHERE owner_id = ?
              AND (? IS NULL OR LOWER(searchable) LIKE CONCAT('%', LOWER(?), '%'))
            "#,
        )
        .bind(owner_id)
        .bind(&query.filter)
        .bind(&query.filter)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    async fn update(
        &self,
        id: StringUuid,
        name: &str,
        description: Option<String>,
        parent_id: Option<StringUuid>,
    ) -> Result<PermissionGroup> {
        let searchable = PermissionGroup::search_text(name, description.as_deref());

        let result = sqlx::query(
            r#"
            UPDATE permission_groups
            SET name = ?, description = ?, parent_id = ?, searchable = ?, updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(name)
        .bind(&description)
        .bind(parent_id)
        .bind(&searchable)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Permission group {} not found",
                id
            )));
        }

        let updated = sqlx::query_as::<_, PermissionGroup>(&format!(
            "SELECT {} FROM permission_groups WHERE id = ?",
            GROUP_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        updated
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to update permission group")))
    }

    async fn delete(&self, id: StringUuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM permission_groups WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Permission group {} not found",
                id
            )));
        }

        Ok(())
    }
}
