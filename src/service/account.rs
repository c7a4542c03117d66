//! Account/role binding business logic

use crate::domain::{Account, BindOutcome, Role, StringUuid};
use crate::error::{AppError, Result};
use crate::repository::{AccountRepository, UserRepository};
use std::sync::Arc;
use tracing::info;

pub struct AccountService<A: AccountRepository, U: UserRepository> {
    account_repo: Arc<A>,
    user_repo: Arc<U>,
}

impl<A: AccountRepository, U: UserRepository> AccountService<A, U> {
    pub fn new(account_repo: Arc<A>, user_repo: Arc<U>) -> Self {
        Self {
            account_repo,
            user_repo,
        }
    }

    /// Create a role assignment for a user. Nothing caps the number of
    /// accounts a user may hold.
    pub async fn create_account(&self, user_id: StringUuid, role: Role) -> Result<Account> {
        let _ = self
            .user_repo
            .find_by_id(user_id, false)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        let account = self.account_repo.create(user_id, role).await?;
        info!(user_id = %user_id, account_id = %account.id, role = %role, "account created");
        Ok(account)
    }

    /// Bind an account as the user's default. Write-once: if a default is
    /// already set the call reports `AlreadyBound` instead of failing, and
    /// the existing binding is left intact. The conditional update in the
    /// repository settles concurrent first bindings.
    pub async fn bind_default_account(
        &self,
        user_id: StringUuid,
        account_id: StringUuid,
    ) -> Result<BindOutcome> {
        let user = self
            .user_repo
            .find_by_id(user_id, true)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        if let Some(current) = user.default_account_id {
            return Ok(BindOutcome::AlreadyBound { current });
        }

        let account = self
            .account_repo
            .find_by_id(account_id, false)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Account {} not found", account_id)))?;

        if account.user_id != user_id {
            return Err(AppError::Forbidden(
                "cannot bind another user's account as default".to_string(),
            ));
        }

        if self.user_repo.set_default_account(user_id, account_id).await? {
            info!(user_id = %user_id, account_id = %account_id, "default account bound");
            return Ok(BindOutcome::Bound);
        }

        // Lost a race with a concurrent binder; report what won.
        let current = self
            .user_repo
            .find_by_id(user_id, true)
            .await?
            .and_then(|u| u.default_account_id)
            .ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!("default account binding in inconsistent state"))
            })?;

        Ok(BindOutcome::AlreadyBound { current })
    }

    /// All live role assignments for a user.
    pub async fn list_accounts(&self, user_id: StringUuid) -> Result<Vec<Account>> {
        self.account_repo.find_by_user(user_id).await
    }
}
