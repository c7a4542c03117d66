//! User repository

use crate::domain::{ListQuery, StringUuid, User};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

use super::conflict_on_duplicate;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user row; `password_hash` must already be hashed.
    async fn create(&self, name: &str, email: &str, password_hash: &str) -> Result<User>;
    /// Lookup by id. Soft-deleted rows are returned when `include_deleted`.
    async fn find_by_id(&self, id: StringUuid, include_deleted: bool) -> Result<Option<User>>;
    /// Lookup by email, live rows only (login path).
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    /// Email uniqueness probe across live AND soft-deleted rows.
    async fn email_exists(&self, email: &str, exclude_id: Option<StringUuid>) -> Result<bool>;
    /// List users excluding the caller; soft-deleted rows are included.
    async fn list_excluding(&self, excluded_id: StringUuid, query: &ListQuery)
        -> Result<Vec<User>>;
    async fn count_excluding(&self, excluded_id: StringUuid, query: &ListQuery) -> Result<i64>;
    async fn update(&self, id: StringUuid, name: &str, email: &str) -> Result<User>;
    /// Claim the default-account slot. Returns false when the slot was
    /// already taken (the WHERE clause is the store-level guarantee).
    async fn set_default_account(&self, id: StringUuid, account_id: StringUuid) -> Result<bool>;
    async fn soft_delete(&self, id: StringUuid) -> Result<()>;
    async fn restore(&self, id: StringUuid) -> Result<()>;
}

pub struct UserRepositoryImpl {
    pool: MySqlPool,
}

impl UserRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = "id, name, email, password_hash, default_account_id, searchable, created_at, updated_at, deleted_at";

#[async_trait]
impl UserRepository for UserRepositoryImpl {
    async fn create(&self, name: &str, email: &str, password_hash: &str) -> Result<User> {
        let id = StringUuid::new_v4();
        let searchable = User::search_text(name, email);

        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, searchable, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(&searchable)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_duplicate(e, "email is already registered"))?;

        self.find_by_id(id, false)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create user")))
    }

    async fn find_by_id(&self, id: StringUuid, include_deleted: bool) -> Result<Option<User>> {
        let sql = if include_deleted {
            format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS)
        } else {
            format!(
                "SELECT {} FROM users WHERE id = ? AND deleted_at IS NULL",
                USER_COLUMNS
            )
        };

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = ? AND deleted_at IS NULL",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn email_exists(&self, email: &str, exclude_id: Option<StringUuid>) -> Result<bool> {
        let row: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM users
            WHERE email = ? AND (? IS NULL OR id <> ?)
            "#,
        )
        .bind(email)
        .bind(exclude_id)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0 > 0)
    }

    async fn list_excluding(
        &self,
        excluded_id: StringUuid,
        query: &ListQuery,
    ) -> Result<Vec<User>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM users
            WHERE id <> ?
              AND (? IS NULL OR LOWER(searchable) LIKE CONCAT('%', LOWER(?), '%'))
            ORDER BY {}
            LIMIT ? OFFSET ?
            "#,
            USER_COLUMNS,
            query.order_clause()
        );

        let users = sqlx::query_as::<_, User>(&sql)
            .bind(excluded_id)
            .bind(&query.filter)
            .bind(&query.filter)
            .bind(query.per_page)
            .bind(query.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    async fn count_excluding(&self, excluded_id: StringUuid, query: &ListQuery) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM users
            WHERE id <> ?
              AND (? IS NULL OR LOWER(searchable) LIKE CONCAT('%', LOWER(?), '%'))
            "#,
        )
        .bind(excluded_id)
        .bind(&query.filter)
        .bind(&query.filter)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    async fn update(&self, id: StringUuid, name: &str, email: &str) -> Result<User> {
        let searchable = User::search_text(name, email);

        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = ?, email = ?, searchable = ?, updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(&searchable)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_duplicate(e, "email is already registered"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }

        self.find_by_id(id, true)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to update user")))
    }

    async fn set_default_account(&self, id: StringUuid, account_id: StringUuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET default_account_id = ?, updated_at = NOW()
            WHERE id = ? AND default_account_id IS NULL
            "#,
        )
        .bind(account_id)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn soft_delete(&self, id: StringUuid) -> Result<()> {
        let result = sqlx::query(
            "UPDATE users SET deleted_at = NOW(), updated_at = NOW() WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }

        Ok(())
    }

    async fn restore(&self, id: StringUuid) -> Result<()> {
        let result = sqlx::query(
            "UPDATE users SET deleted_at = NULL, updated_at = NOW() WHERE id = ? AND deleted_at IS NOT NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }

        Ok(())
    }
}
