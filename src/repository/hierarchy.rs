//! Hierarchy rank repository
//!
//! `level` is DECIMAL(10,1) in storage; every SELECT casts it to DOUBLE so
//! callers always see a float.

use crate::domain::{HierarchySetup, StringUuid};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

use super::conflict_on_duplicate;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HierarchyRepository: Send + Sync {
    async fn create(
        &self,
        contract_id: StringUuid,
        level: f64,
        name: &str,
        description: &str,
    ) -> Result<HierarchySetup>;
    async fn find_in_contract(
        &self,
        contract_id: StringUuid,
        id: StringUuid,
    ) -> Result<Option<HierarchySetup>>;
    /// Is `level` already taken in this contract (excluding one row)?
    async fn level_exists(
        &self,
        contract_id: StringUuid,
        level: f64,
        exclude_id: Option<StringUuid>,
    ) -> Result<bool>;
    /// Is `name` already taken in this contract (excluding one row)?
    async fn name_exists(
        &self,
        contract_id: StringUuid,
        name: &str,
        exclude_id: Option<StringUuid>,
    ) -> Result<bool>;
    async fn update(
        &self,
        id: StringUuid,
        level: f64,
        name: &str,
        description: &str,
    ) -> Result<HierarchySetup>;
    /// Hard delete. Ranks have no soft-delete tier.
    async fn delete(&self, id: StringUuid) -> Result<()>;
    async fn list_by_contract(&self, contract_id: StringUuid) -> Result<Vec<HierarchySetup>>;
    async fn count_by_contract(&self, contract_id: StringUuid) -> Result<i64>;
}

pub struct HierarchyRepositoryImpl {
    pool: MySqlPool,
}

impl HierarchyRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const RANK_COLUMNS: &str =
    "id, contract_id, CAST(level AS DOUBLE) AS level, name, description, created_at, updated_at";

#[async_trait]
impl HierarchyRepository for HierarchyRepositoryImpl {
    async fn create(
        &self,
        contract_id: StringUuid,
        level: f64,
        name: &str,
        description: &str,
    ) -> Result<HierarchySetup> {
        let id = StringUuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO hierarchy_setups (id, contract_id, level, name, description, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(id)
        .bind(contract_id)
        .bind(level)
        .bind(name)
        .bind(description)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_duplicate(e, "a rank with the same level or name already exists"))?;

        let created = sqlx::query_as::<_, HierarchySetup>(&format!(
            "SELECT {} FROM hierarchy_setups WHERE id = ?",
            RANK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        created.ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create rank")))
    }

    async fn find_in_contract(
        &self,
        contract_id: StringUuid,
        id: StringUuid,
    ) -> Result<Option<HierarchySetup>> {
        let rank = sqlx::query_as::<_, HierarchySetup>(&format!(
            "SELECT {} FROM hierarchy_setups WHERE id = ? AND contract_id = ?",
            RANK_COLUMNS
        ))
        .bind(id)
        .bind(contract_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(rank)
    }

    async fn level_exists(
        &self,
        contract_id: StringUuid,
        level: f64,
        exclude_id: Option<StringUuid>,
    ) -> Result<bool> {
        let row: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM hierarchy_setups
            WHERE contract_id = ? AND level = ? AND (? IS NULL OR id <> ?)
            "#,
        )
        .bind(contract_id)
        .bind(level)
        .bind(exclude_id)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0 > 0)
    }

    async fn name_exists(
        &self,
        contract_id: StringUuid,
        name: &str,
        exclude_id: Option<StringUuid>,
    ) -> Result<bool> {
        let row: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM hierarchy_setups
            WHERE contract_id = ? AND name = ? AND (? IS NULL OR id <> ?)
            "#,
        )
        .bind(contract_id)
        .bind(name)
        .bind(exclude_id)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0 > 0)
    }

    async fn update(
        &self,
        id: StringUuid,
        level: f64,
        name: &str,
        description: &str,
    ) -> Result<HierarchySetup> {
        let result = sqlx::query(
            r#"
            UPDATE hierarchy_setups
            SET level = ?, name = ?, description = ?, updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(level)
        .bind(name)
        .bind(description)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_duplicate(e, "a rank with the same level or name already exists"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Rank {} not found", id)));
        }

        let updated = sqlx::query_as::<_, HierarchySetup>(&format!(
            "SELECT {} FROM hierarchy_setups WHERE id = ?",
            RANK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to update rank")))
    }

    async fn delete(&self, id: StringUuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM hierarchy_setups WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Rank {} not found", id)));
        }

        Ok(())
    }

    async fn list_by_contract(&self, contract_id: StringUuid) -> Result<Vec<HierarchySetup>> {
        let ranks = sqlx::query_as::<_, HierarchySetup>(&format!(
            r#"
            SELECT {}
            FROM hierarchy_setups
            WHERE contract_id = ?
            ORDER BY level ASC
            "#,
            RANK_COLUMNS
        ))
        .bind(contract_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ranks)
    }

    async fn count_by_contract(&self, contract_id: StringUuid) -> Result<i64> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM hierarchy_setups WHERE contract_id = ?")
                .bind(contract_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(row.0)
    }
}
