//! Contract rank ledger business logic
//!
//! Each contract owns a flat, ordered list of named ranks. Within one
//! contract no two ranks may share a level or a name. The pre-checks here
//! produce friendly conflict errors; the composite unique indexes settle
//! concurrent creators.

use crate::domain::{CreateRankInput, HierarchySetup, Page, StringUuid, UpdateRankInput};
use crate::error::{AppError, Result};
use crate::repository::{ContractRepository, HierarchyRepository};
use std::sync::Arc;
use tracing::info;
use validator::Validate;

pub struct HierarchyService<H: HierarchyRepository, C: ContractRepository> {
    hierarchy_repo: Arc<H>,
    contract_repo: Arc<C>,
}

impl<H: HierarchyRepository, C: ContractRepository> HierarchyService<H, C> {
    pub fn new(hierarchy_repo: Arc<H>, contract_repo: Arc<C>) -> Self {
        Self {
            hierarchy_repo,
            contract_repo,
        }
    }

    /// Ranks can be attached to soft-deleted contracts too, so the anchor
    /// probe spans them.
    async fn ensure_contract(&self, contract_id: StringUuid) -> Result<()> {
        if !self.contract_repo.exists(contract_id).await? {
            return Err(AppError::NotFound(format!(
                "Contract {} not found",
                contract_id
            )));
        }
        Ok(())
    }

    pub async fn create_rank(
        &self,
        contract_id: StringUuid,
        input: CreateRankInput,
    ) -> Result<HierarchySetup> {
        input.validate()?;
        self.ensure_contract(contract_id).await?;

        if self
            .hierarchy_repo
            .level_exists(contract_id, input.level, None)
            .await?
        {
            return Err(AppError::Conflict(
                "a rank with the same level already exists".to_string(),
            ));
        }

        if self
            .hierarchy_repo
            .name_exists(contract_id, &input.name, None)
            .await?
        {
            return Err(AppError::Conflict(
                "a rank with the same name already exists".to_string(),
            ));
        }

        let rank = self
            .hierarchy_repo
            .create(contract_id, input.level, &input.name, &input.description)
            .await?;
        info!(contract_id = %contract_id, rank_id = %rank.id, level = rank.level, "rank created");
        Ok(rank)
    }

    /// Patch a rank. Uniqueness is re-checked only for the fields present in
    /// the patch, excluding the row being updated.
    pub async fn update_rank(
        &self,
        contract_id: StringUuid,
        id: StringUuid,
        input: UpdateRankInput,
    ) -> Result<HierarchySetup> {
        input.validate()?;

        let existing = self
            .hierarchy_repo
            .find_in_contract(contract_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Rank {} not found", id)))?;

        if let Some(level) = input.level {
            if self
                .hierarchy_repo
                .level_exists(contract_id, level, Some(id))
                .await?
            {
                return Err(AppError::Conflict(
                    "a rank with the same level already exists".to_string(),
                ));
            }
        }

        if let Some(name) = input.name.as_deref() {
            if self
                .hierarchy_repo
                .name_exists(contract_id, name, Some(id))
                .await?
            {
                return Err(AppError::Conflict(
                    "a rank with the same name already exists".to_string(),
                ));
            }
        }

        let level = input.level.unwrap_or(existing.level);
        let name = input.name.unwrap_or(existing.name);
        let description = input.description.unwrap_or(existing.description);

        self.hierarchy_repo
            .update(id, level, &name, &description)
            .await
    }

    /// Irrecoverable: ranks have no soft-delete tier.
    pub async fn delete_rank(&self, contract_id: StringUuid, id: StringUuid) -> Result<()> {
        let _ = self
            .hierarchy_repo
            .find_in_contract(contract_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Rank {} not found", id)))?;

        self.hierarchy_repo.delete(id).await?;
        info!(contract_id = %contract_id, rank_id = %id, "rank deleted");
        Ok(())
    }

    /// All ranks of a contract, ascending by level.
    pub async fn list_ranks(&self, contract_id: StringUuid) -> Result<Page<HierarchySetup>> {
        self.ensure_contract(contract_id).await?;

        let total = self.hierarchy_repo.count_by_contract(contract_id).await?;
        let items = self.hierarchy_repo.list_by_contract(contract_id).await?;

        Ok(Page { items, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::contract::MockContractRepository;
    use crate::repository::hierarchy::MockHierarchyRepository;
    use mockall::predicate::*;

    fn service(
        hierarchy_repo: MockHierarchyRepository,
        contract_repo: MockContractRepository,
    ) -> HierarchyService<MockHierarchyRepository, MockContractRepository> {
        HierarchyService::new(Arc::new(hierarchy_repo), Arc::new(contract_repo))
    }

    fn contract_exists() -> MockContractRepository {
        let mut repo = MockContractRepository::new();
        repo.expect_exists().returning(|_| Ok(true));
        repo
    }

    fn rank_input(level: f64, name: &str) -> CreateRankInput {
        CreateRankInput {
            level,
            name: name.to_string(),
            description: format!("{} duties", name),
        }
    }

    #[tokio::test]
    async fn test_create_rank_contract_missing() {
        let mut contract_repo = MockContractRepository::new();
        contract_repo.expect_exists().returning(|_| Ok(false));

        let svc = service(MockHierarchyRepository::new(), contract_repo);

        let result = svc
            .create_rank(StringUuid::new_v4(), rank_input(1.0, "Operator"))
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_rank_level_conflict() {
        let mut hierarchy_repo = MockHierarchyRepository::new();
        hierarchy_repo
            .expect_level_exists()
            .returning(|_, _, _| Ok(true));
        // Name check never runs: level conflict short-circuits
        hierarchy_repo.expect_name_exists().never();

        let svc = service(hierarchy_repo, contract_exists());

        let result = svc
            .create_rank(StringUuid::new_v4(), rank_input(1.0, "Lead"))
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_rank_name_conflict() {
        let mut hierarchy_repo = MockHierarchyRepository::new();
        hierarchy_repo
            .expect_level_exists()
            .returning(|_, _, _| Ok(false));
        hierarchy_repo
            .expect_name_exists()
            .returning(|_, _, _| Ok(true));

        let svc = service(hierarchy_repo, contract_exists());

        let result = svc
            .create_rank(StringUuid::new_v4(), rank_input(3.0, "Operator"))
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_rank_success() {
        let contract_id = StringUuid::new_v4();

        let mut hierarchy_repo = MockHierarchyRepository::new();
        hierarchy_repo
            .expect_level_exists()
            .with(eq(contract_id), eq(3.0), eq(None))
            .returning(|_, _, _| Ok(false));
        hierarchy_repo
            .expect_name_exists()
            .with(eq(contract_id), eq("Manager"), eq(None))
            .returning(|_, _, _| Ok(false));
        hierarchy_repo
            .expect_create()
            .returning(|contract_id, level, name, description| {
                Ok(HierarchySetup {
                    contract_id,
                    level,
                    name: name.to_string(),
                    description: description.to_string(),
                    ..Default::default()
                })
            });

        let svc = service(hierarchy_repo, contract_exists());

        let rank = svc
            .create_rank(contract_id, rank_input(3.0, "Manager"))
            .await
            .unwrap();
        assert_eq!(rank.level, 3.0);
        assert_eq!(rank.name, "Manager");
    }

    #[tokio::test]
    async fn test_update_rank_not_found() {
        let mut hierarchy_repo = MockHierarchyRepository::new();
        hierarchy_repo
            .expect_find_in_contract()
            .returning(|_, _| Ok(None));

        let svc = service(hierarchy_repo, contract_exists());

        let result = svc
            .update_rank(
                StringUuid::new_v4(),
                StringUuid::new_v4(),
                UpdateRankInput::default(),
            )
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_rank_checks_exclude_self() {
        let contract_id = StringUuid::new_v4();
        let rank_id = StringUuid::new_v4();

        let mut hierarchy_repo = MockHierarchyRepository::new();
        hierarchy_repo
            .expect_find_in_contract()
            .returning(move |contract_id, id| {
                Ok(Some(HierarchySetup {
                    id,
                    contract_id,
                    level: 2.0,
                    name: "Supervisor".to_string(),
                    description: "second line".to_string(),
                    ..Default::default()
                }))
            });
        hierarchy_repo
            .expect_level_exists()
            .with(eq(contract_id), eq(2.5), eq(Some(rank_id)))
            .returning(|_, _, _| Ok(false));
        // Name untouched by the patch, so its check must not run
        hierarchy_repo.expect_name_exists().never();
        hierarchy_repo
            .expect_update()
            .with(eq(rank_id), eq(2.5), eq("Supervisor"), eq("second line"))
            .returning(|id, level, name, description| {
                Ok(HierarchySetup {
                    id,
                    level,
                    name: name.to_string(),
                    description: description.to_string(),
                    ..Default::default()
                })
            });

        let svc = service(hierarchy_repo, contract_exists());

        let rank = svc
            .update_rank(
                contract_id,
                rank_id,
                UpdateRankInput {
                    level: Some(2.5),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(rank.level, 2.5);
    }

    #[tokio::test]
    async fn test_update_rank_name_conflict() {
        let mut hierarchy_repo = MockHierarchyRepository::new();
        hierarchy_repo
            .expect_find_in_contract()
            .returning(|contract_id, id| {
                Ok(Some(HierarchySetup {
                    id,
                    contract_id,
                    level: 2.0,
                    name: "Supervisor".to_string(),
                    ..Default::default()
                }))
            });
        hierarchy_repo
            .expect_name_exists()
            .returning(|_, _, _| Ok(true));

        let svc = service(hierarchy_repo, contract_exists());

        let result = svc
            .update_rank(
                StringUuid::new_v4(),
                StringUuid::new_v4(),
                UpdateRankInput {
                    name: Some("Operator".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_delete_rank_not_found() {
        let mut hierarchy_repo = MockHierarchyRepository::new();
        hierarchy_repo
            .expect_find_in_contract()
            .returning(|_, _| Ok(None));

        let svc = service(hierarchy_repo, contract_exists());

        let result = svc
            .delete_rank(StringUuid::new_v4(), StringUuid::new_v4())
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_rank_success() {
        let rank_id = StringUuid::new_v4();

        let mut hierarchy_repo = MockHierarchyRepository::new();
        hierarchy_repo
            .expect_find_in_contract()
            .returning(|contract_id, id| {
                Ok(Some(HierarchySetup {
                    id,
                    contract_id,
                    ..Default::default()
                }))
            });
        hierarchy_repo
            .expect_delete()
            .with(eq(rank_id))
            .times(1)
            .returning(|_| Ok(()));

        let svc = service(hierarchy_repo, contract_exists());

        svc.delete_rank(StringUuid::new_v4(), rank_id).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_ranks_ordered_by_level() {
        let contract_id = StringUuid::new_v4();

        let mut hierarchy_repo = MockHierarchyRepository::new();
        hierarchy_repo
            .expect_count_by_contract()
            .returning(|_| Ok(3));
        hierarchy_repo
            .expect_list_by_contract()
            .with(eq(contract_id))
            .returning(|contract_id| {
                Ok(vec![
                    HierarchySetup {
                        contract_id,
                        level: 1.0,
                        name: "Operator".to_string(),
                        ..Default::default()
                    },
                    HierarchySetup {
                        contract_id,
                        level: 2.0,
                        name: "Supervisor".to_string(),
                        ..Default::default()
                    },
                    HierarchySetup {
                        contract_id,
                        level: 3.0,
                        name: "Manager".to_string(),
                        ..Default::default()
                    },
                ])
            });

        let svc = service(hierarchy_repo, contract_exists());

        let page = svc.list_ranks(contract_id).await.unwrap();
        assert_eq!(page.total, 3);
        let levels: Vec<f64> = page.items.iter().map(|r| r.level).collect();
        assert_eq!(levels, vec![1.0, 2.0, 3.0]);
    }
}
