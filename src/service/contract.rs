//! Contract registry business logic

use crate::domain::{
    Contract, CreateContractInput, ListQuery, Page, StringUuid, UpdateContractInput,
    CONTRACT_SORT_FIELDS,
};
use crate::error::{AppError, Result};
use crate::repository::ContractRepository;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

pub struct ContractService<C: ContractRepository> {
    contract_repo: Arc<C>,
}

impl<C: ContractRepository> ContractService<C> {
    pub fn new(contract_repo: Arc<C>) -> Self {
        Self { contract_repo }
    }

    pub async fn create_contract(&self, input: CreateContractInput) -> Result<Contract> {
        input.validate()?;

        let contract = self.contract_repo.create(&input).await?;
        info!(contract_id = %contract.id, "contract created");
        Ok(contract)
    }

    /// Fetch one contract; soft-deleted rows are visible here.
    pub async fn get_contract(&self, id: StringUuid) -> Result<Contract> {
        self.contract_repo
            .find_by_id(id, true)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Contract {} not found", id)))
    }

    /// Listing spans live and soft-deleted contracts.
    pub async fn list_contracts(
        &self,
        page: i64,
        per_page: i64,
        sort_by: Option<&str>,
        filter: Option<String>,
    ) -> Result<Page<Contract>> {
        let query = ListQuery::new(page, per_page, sort_by, filter, CONTRACT_SORT_FIELDS)?;

        let total = self.contract_repo.count(&query).await?;
        let items = self.contract_repo.list(&query).await?;

        Ok(Page { items, total })
    }

    pub async fn update_contract(
        &self,
        id: StringUuid,
        input: UpdateContractInput,
    ) -> Result<Contract> {
        input.validate()?;

        let existing = self
            .contract_repo
            .find_by_id(id, false)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Contract {} not found", id)))?;

        let name = input.name.unwrap_or(existing.name);
        let description = input.description.or(existing.description);

        self.contract_repo.update(id, &name, description).await
    }

    pub async fn delete_contract(&self, id: StringUuid) -> Result<()> {
        let _ = self
            .contract_repo
            .find_by_id(id, false)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Contract {} not found", id)))?;

        self.contract_repo.soft_delete(id).await?;
        info!(contract_id = %id, "contract soft-deleted");
        Ok(())
    }

    pub async fn restore_contract(&self, id: StringUuid) -> Result<()> {
        self.contract_repo.restore(id).await?;
        info!(contract_id = %id, "contract restored");
        Ok(())
    }
}
