//! Application state: the composition root wiring repositories, services,
//! and the JWT manager over one bounded connection pool. The boundary layer
//! holds this behind an `Arc` and calls straight into the services.

use crate::config::Config;
use crate::error::Result;
use crate::jwt::JwtManager;
use crate::repository::account::AccountRepositoryImpl;
use crate::repository::contract::ContractRepositoryImpl;
use crate::repository::hierarchy::HierarchyRepositoryImpl;
use crate::repository::permission::PermissionRepositoryImpl;
use crate::repository::permission_group::PermissionGroupRepositoryImpl;
use crate::repository::token::TokenRepositoryImpl;
use crate::repository::user::UserRepositoryImpl;
use crate::service::{
    AccountService, AuthService, ContractService, HierarchyService, PermissionService, UserService,
};
use sqlx::mysql::MySqlPoolOptions;
use sqlx::MySqlPool;
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    pool: MySqlPool,
    pub auth_service: AuthService<UserRepositoryImpl, AccountRepositoryImpl, TokenRepositoryImpl>,
    pub user_service: UserService<UserRepositoryImpl, AccountRepositoryImpl>,
    pub account_service: AccountService<AccountRepositoryImpl, UserRepositoryImpl>,
    pub contract_service: ContractService<ContractRepositoryImpl>,
    pub hierarchy_service: HierarchyService<HierarchyRepositoryImpl, ContractRepositoryImpl>,
    pub permission_service:
        PermissionService<PermissionGroupRepositoryImpl, PermissionRepositoryImpl>,
}

impl AppState {
    pub fn new(pool: MySqlPool, config: Config) -> Self {
        let jwt = JwtManager::new(config.jwt.clone());

        let user_repo = Arc::new(UserRepositoryImpl::new(pool.clone()));
        let account_repo = Arc::new(AccountRepositoryImpl::new(pool.clone()));
        let token_repo = Arc::new(TokenRepositoryImpl::new(pool.clone()));
        let contract_repo = Arc::new(ContractRepositoryImpl::new(pool.clone()));
        let hierarchy_repo = Arc::new(HierarchyRepositoryImpl::new(pool.clone()));
        let group_repo = Arc::new(PermissionGroupRepositoryImpl::new(pool.clone()));
        let permission_repo = Arc::new(PermissionRepositoryImpl::new(pool.clone()));

        Self {
            auth_service: AuthService::new(
                user_repo.clone(),
                account_repo.clone(),
                token_repo,
                jwt,
            ),
            user_service: UserService::new(user_repo.clone(), account_repo.clone()),
            account_service: AccountService::new(account_repo, user_repo),
            contract_service: ContractService::new(contract_repo.clone()),
            hierarchy_service: HierarchyService::new(hierarchy_repo, contract_repo),
            permission_service: PermissionService::new(group_repo, permission_repo),
            config,
            pool,
        }
    }

    /// Connect the bounded pool and build the state.
    pub async fn from_config(config: Config) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(config.database.max_connections)
            .min_connections(config.database.min_connections)
            .connect(&config.database.url)
            .await?;

        Ok(Self::new(pool, config))
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Is the database reachable?
    pub async fn check_ready(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}
