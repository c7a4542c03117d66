//! Token repository

use crate::domain::{StringUuid, Token, TokenMode, TokenUse};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::MySqlPool;

use super::conflict_on_duplicate;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenRepository: Send + Sync {
    async fn create(
        &self,
        user_id: StringUuid,
        token: &str,
        mode: TokenMode,
        token_use: TokenUse,
        expires_at: DateTime<Utc>,
    ) -> Result<Token>;
    /// Most recently created token for the triple, expired or not; the
    /// caller decides whether it is still usable.
    async fn find_latest(
        &self,
        user_id: StringUuid,
        mode: TokenMode,
        token_use: TokenUse,
    ) -> Result<Option<Token>>;
    async fn find_by_value(&self, token: &str) -> Result<Option<Token>>;
}

pub struct TokenRepositoryImpl {
    pool: MySqlPool,
}

impl TokenRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const TOKEN_COLUMNS: &str = "id, user_id, token, mode, token_use, created_at, expires_at";

#[async_trait]
impl TokenRepository for TokenRepositoryImpl {
    async fn create(
        &self,
        user_id: StringUuid,
        token: &str,
        mode: TokenMode,
        token_use: TokenUse,
        expires_at: DateTime<Utc>,
    ) -> Result<Token> {
        let id = StringUuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO tokens (id, user_id, token, mode, token_use, created_at, expires_at)
            VALUES (?, ?, ?, ?, ?, NOW(), ?)
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(token)
        .bind(mode)
        .bind(token_use)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_duplicate(e, "token value already exists"))?;

        let created = sqlx::query_as::<_, Token>(&format!(
            "SELECT {} FROM tokens WHERE id = ?",
            TOKEN_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        created.ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create token")))
    }

    async fn find_latest(
        &self,
        user_id: StringUuid,
        mode: TokenMode,
        token_use: TokenUse,
    ) -> Result<Option<Token>> {
        let token = sqlx::query_as::<_, Token>(&format!(
            r#"
            SELECT {}
            FROM tokens
            WHERE user_id = ? AND mode = ? AND token_use = ?
            ORDER BY created_at DESC
            LIMIT 1
            "#,
            TOKEN_COLUMNS
        ))
        .bind(user_id)
        .bind(mode)
        .bind(token_use)
        .fetch_optional(&self.pool)
        .await?;

        Ok(token)
    }

    async fn find_by_value(&self, token: &str) -> Result<Option<Token>> {
        let token = sqlx::query_as::<_, Token>(&format!(
            "SELECT {} FROM tokens WHERE token = ?",
            TOKEN_COLUMNS
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(token)
    }
}
