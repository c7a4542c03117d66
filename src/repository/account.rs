//! Account repository

use crate::domain::{Account, Role, StringUuid};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn create(&self, user_id: StringUuid, role: Role) -> Result<Account>;
    async fn find_by_id(&self, id: StringUuid, include_deleted: bool) -> Result<Option<Account>>;
    async fn find_by_user(&self, user_id: StringUuid) -> Result<Vec<Account>>;
}

pub struct AccountRepositoryImpl {
    pool: MySqlPool,
}

impl AccountRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const ACCOUNT_COLUMNS: &str = "id, user_id, role, hierarchy_setup_id, permission_group_id, created_at, updated_at, deleted_at";

#[async_trait]
impl AccountRepository for AccountRepositoryImpl {
    async fn create(&self, user_id: StringUuid, role: Role) -> Result<Account> {
        let id = StringUuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO accounts (id, user_id, role, created_at, updated_at)
            VALUES (?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(role)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id, false)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create account")))
    }

    async fn find_by_id(&self, id: StringUuid, include_deleted: bool) -> Result<Option<Account>> {
        let sql = if include_deleted {
            format!("SELECT {} FROM accounts WHERE id = ?", ACCOUNT_COLUMNS)
        } else {
            format!(
                "SELECT {} FROM accounts WHERE id = ? AND deleted_at IS NULL",
                ACCOUNT_COLUMNS
            )
        };

        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    async fn find_by_user(&self, user_id: StringUuid) -> Result<Vec<Account>> {
        let accounts = sqlx::query_as::<_, Account>(&format!(
            "SELECT {} FROM accounts WHERE user_id = ? AND deleted_at IS NULL ORDER BY created_at ASC",
            ACCOUNT_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(accounts)
    }
}
