//! Contract repository

use crate::domain::{Contract, CreateContractInput, ListQuery, StringUuid};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContractRepository: Send + Sync {
    async fn create(&self, input: &CreateContractInput) -> Result<Contract>;
    async fn find_by_id(&self, id: StringUuid, include_deleted: bool) -> Result<Option<Contract>>;
    /// Cheap existence probe used by the rank ledger; soft-deleted contracts
    /// still anchor their ranks, so the probe spans them.
    async fn exists(&self, id: StringUuid) -> Result<bool>;
    /// Contract listings span live and soft-deleted rows.
    async fn list(&self, query: &ListQuery) -> Result<Vec<Contract>>;
    async fn count(&self, query: &ListQuery) -> Result<i64>;
    /// Write fully-merged fields; the searchable projection is recomputed
    /// from them in the same statement.
    async fn update(
        &self,
        id: StringUuid,
        name: &str,
        description: Option<String>,
    ) -> Result<Contract>;
    async fn soft_delete(&self, id: StringUuid) -> Result<()>;
    async fn restore(&self, id: StringUuid) -> Result<()>;
}

pub struct ContractRepositoryImpl {
    pool: MySqlPool,
}

impl ContractRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const CONTRACT_COLUMNS: &str =
    "id, name, description, searchable, created_at, updated_at, deleted_at";

#[async_trait]
impl ContractRepository for ContractRepositoryImpl {
    async fn create(&self, input: &CreateContractInput) -> Result<Contract> {
        let id = StringUuid::new_v4();
        let searchable = Contract::search_text(&input.name, input.description.as_deref());

        sqlx::query(
            r#"
            INSERT INTO contracts (id, name, description, searchable, created_at, updated_at)
            VALUES (?, ?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&searchable)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id, false)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create contract")))
    }

    async fn find_by_id(&self, id: StringUuid, include_deleted: bool) -> Result<Option<Contract>> {
        let sql = if include_deleted {
            format!("SELECT {} FROM contracts WHERE id = ?", CONTRACT_COLUMNS)
        } else {
            format!(
                "SELECT {} FROM contracts WHERE id = ? AND deleted_at IS NULL",
                CONTRACT_COLUMNS
            )
        };

        let contract = sqlx::query_as::<_, Contract>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(contract)
    }

    async fn exists(&self, id: StringUuid) -> Result<bool> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM contracts WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0 > 0)
    }

    async fn list(&self, query: &ListQuery) -> Result<Vec<Contract>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM contracts
            WHERE (? IS NULL OR LOWER(searchable) LIKE CONCAT('%', LOWER(?), '%'))
            ORDER BY {}
            LIMIT ? OFFSET ?
            "#,
            CONTRACT_COLUMNS,
            query.order_clause()
        );

        let contracts = sqlx::query_as::<_, Contract>(&sql)
            .bind(&query.filter)
            .bind(&query.filter)
            .bind(query.per_page)
            .bind(query.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(contracts)
    }

    async fn count(&self, query: &ListQuery) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM contracts
            WHERE (? IS NULL OR LOWER(searchable) LIKE CONCAT('%', LOWER(?), '%'))
            "#,
        )
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
    ) -> Result<Contract> {
        let searchable = Contract::search_text(name, description.as_deref());

        let result = sqlx::query(
            r#"
            UPDATE contracts
            SET name = ?, description = ?, searchable = ?, updated_at = NOW()
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(name)
        .bind(&description)
        .bind(&searchable)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Contract {} not found", id)));
        }

        self.find_by_id(id, false)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to update contract")))
    }

    async fn soft_delete(&self, id: StringUuid) -> Result<()> {
        let result = sqlx::query(
            "UPDATE contracts SET deleted_at = NOW(), updated_at = NOW() WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Contract {} not found", id)));
        }

        Ok(())
    }

    async fn restore(&self, id: StringUuid) -> Result<()> {
        let result = sqlx::query(
            "UPDATE contracts SET deleted_at = NULL, updated_at = NOW() WHERE id = ? AND deleted_at IS NOT NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Contract {} not found", id)));
        }

        Ok(())
    }
}
