//! User directory business logic

use crate::domain::{
    AuthContext, CreateUserInput, ListQuery, Page, StringUuid, UpdateUserInput, User,
    USER_SORT_FIELDS,
};
use crate::error::{AppError, Result};
use crate::repository::{AccountRepository, UserRepository};
use crate::service::auth::hash_password;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

pub struct UserService<U: UserRepository, A: AccountRepository> {
    user_repo: Arc<U>,
    account_repo: Arc<A>,
}

impl<U: UserRepository, A: AccountRepository> UserService<U, A> {
    pub fn new(user_repo: Arc<U>, account_repo: Arc<A>) -> Self {
        Self {
            user_repo,
            account_repo,
        }
    }

    /// Signup: create the user, its initial role assignment, and bind that
    /// assignment as the default in one flow. The email-uniqueness check
    /// spans soft-deleted rows so a retired address cannot be re-registered.
    pub async fn create_user(&self, input: CreateUserInput) -> Result<User> {
        input.validate()?;

        if self.user_repo.email_exists(&input.email, None).await? {
            return Err(AppError::Conflict("email is already registered".to_string()));
        }

        let password_hash = hash_password(&input.password)?;
        let user = self
            .user_repo
            .create(&input.name, &input.email, &password_hash)
            .await?;

        let account = self.account_repo.create(user.id, input.role).await?;
        self.user_repo.set_default_account(user.id, account.id).await?;

        info!(user_id = %user.id, "user created");

        self.user_repo
            .find_by_id(user.id, false)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("user vanished after signup")))
    }

    /// Fetch one user; soft-deleted rows are visible here.
    pub async fn get_user(&self, id: StringUuid) -> Result<User> {
        self.user_repo
            .find_by_id(id, true)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    /// Directory listing: everyone except the caller, soft-deleted included.
    pub async fn list_users(
        &self,
        ctx: &AuthContext,
        page: i64,
        per_page: i64,
        sort_by: Option<&str>,
        filter: Option<String>,
    ) -> Result<Page<User>> {
        let query = ListQuery::new(page, per_page, sort_by, filter, USER_SORT_FIELDS)?;

        let total = self.user_repo.count_excluding(ctx.user_id, &query).await?;
        let items = self.user_repo.list_excluding(ctx.user_id, &query).await?;

        Ok(Page { items, total })
    }

    pub async fn update_user(&self, id: StringUuid, input: UpdateUserInput) -> Result<User> {
        input.validate()?;

        let existing = self
            .user_repo
            .find_by_id(id, false)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

        let name = input.name.unwrap_or(existing.name);
        let email = input.email.unwrap_or(existing.email);

        if self.user_repo.email_exists(&email, Some(id)).await? {
            return Err(AppError::Conflict("email is already registered".to_string()));
        }

        self.user_repo.update(id, &name, &email).await
    }

    /// Soft delete: the row survives and stays visible to explicit lookups.
    pub async fn delete_user(&self, id: StringUuid) -> Result<()> {
        let _ = self
            .user_repo
            .find_by_id(id, false)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

        self.user_repo.soft_delete(id).await?;
        info!(user_id = %id, "user soft-deleted");
        Ok(())
    }

    /// Restore a soft-deleted user; a live row is NotFound here.
    pub async fn restore_user(&self, id: StringUuid) -> Result<()> {
        self.user_repo.restore(id).await?;
        info!(user_id = %id, "user restored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Account, Role};
    use crate::repository::account::MockAccountRepository;
    use crate::repository::user::MockUserRepository;
    use mockall::predicate::*;

    fn service(
        user_repo: MockUserRepository,
        account_repo: MockAccountRepository,
    ) -> UserService<MockUserRepository, MockAccountRepository> {
        UserService::new(Arc::new(user_repo), Arc::new(account_repo))
    }

    fn signup_input() -> CreateUserInput {
        CreateUserInput {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            role: Role::Staff,
            password: "correct-horse-battery".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_user_duplicate_email() {
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_email_exists()
            .with(eq("ada@example.com"), eq(None))
            .returning(|_, _| Ok(true));

        let svc = service(user_repo, MockAccountRepository::new());

        let result = svc.create_user(signup_input()).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_user_rejects_invalid_input() {
        let svc = service(MockUserRepository::new(), MockAccountRepository::new());

        let result = svc
            .create_user(CreateUserInput {
                email: "not-an-email".to_string(),
                ..signup_input()
            })
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_user_binds_initial_account_as_default() {
        let mut user_repo = MockUserRepository::new();
        user_repo.expect_email_exists().returning(|_, _| Ok(false));
        user_repo.expect_create().returning(|name, email, hash| {
            assert!(hash.starts_with("$argon2"));
            Ok(User {
                name: name.to_string(),
                email: email.to_string(),
                password_hash: hash.to_string(),
                ..Default::default()
            })
        });
        user_repo
            .expect_set_default_account()
            .times(1)
            .returning(|_, _| Ok(true));
        user_repo.expect_find_by_id().returning(|id, _| {
            Ok(Some(User {
                id,
                name: "Ada Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                ..Default::default()
            }))
        });

        let mut account_repo = MockAccountRepository::new();
        account_repo
            .expect_create()
            .withf(|_, role| *role == Role::Staff)
            .returning(|uid, role| {
                Ok(Account {
                    user_id: uid,
                    role,
                    ..Default::default()
                })
            });

        let svc = service(user_repo, account_repo);

        let user = svc.create_user(signup_input()).await.unwrap();
        assert_eq!(user.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_get_user_includes_soft_deleted() {
        let id = StringUuid::new_v4();
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_id()
            .with(eq(id), eq(true))
            .returning(|id, _| {
                Ok(Some(User {
                    id,
                    deleted_at: Some(chrono::Utc::now()),
                    ..Default::default()
                }))
            });

        let svc = service(user_repo, MockAccountRepository::new());

        let user = svc.get_user(id).await.unwrap();
        assert!(user.is_deleted());
    }

    #[tokio::test]
    async fn test_list_users_rejects_unknown_sort_field() {
        let svc = service(MockUserRepository::new(), MockAccountRepository::new());
        let ctx = AuthContext::new(StringUuid::new_v4());

        let result = svc
            .list_users(&ctx, 1, 20, Some("passwordHash"), None)
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_users_excludes_caller() {
        let caller = StringUuid::new_v4();
        let ctx = AuthContext::new(caller);

        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_count_excluding()
            .withf(move |excluded, _| *excluded == caller)
            .returning(|_, _| Ok(2));
        user_repo
            .expect_list_excluding()
            .withf(move |excluded, query| *excluded == caller && query.per_page == 20)
            .returning(|_, _| Ok(vec![User::default(), User::default()]));

        let svc = service(user_repo, MockAccountRepository::new());

        let page = svc
            .list_users(&ctx, 1, 20, Some("-createdAt"), None)
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items.len(), 2);
    }

    #[tokio::test]
    async fn test_update_user_conflicting_email() {
        let id = StringUuid::new_v4();

        let mut user_repo = MockUserRepository::new();
        user_repo.expect_find_by_id().returning(|id, _| {
            Ok(Some(User {
                id,
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                ..Default::default()
            }))
        });
        user_repo
            .expect_email_exists()
            .with(eq("taken@example.com"), eq(Some(id)))
            .returning(|_, _| Ok(true));

        let svc = service(user_repo, MockAccountRepository::new());

        let result = svc
            .update_user(
                id,
                UpdateUserInput {
                    email: Some("taken@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_user_merges_patch_fields() {
        let id = StringUuid::new_v4();

        let mut user_repo = MockUserRepository::new();
        user_repo.expect_find_by_id().returning(|id, _| {
            Ok(Some(User {
                id,
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                ..Default::default()
            }))
        });
        user_repo.expect_email_exists().returning(|_, _| Ok(false));
        user_repo
            .expect_update()
            .with(eq(id), eq("Ada Lovelace"), eq("ada@example.com"))
            .returning(|id, name, email| {
                Ok(User {
                    id,
                    name: name.to_string(),
                    email: email.to_string(),
                    ..Default::default()
                })
            });

        let svc = service(user_repo, MockAccountRepository::new());

        let user = svc
            .update_user(
                id,
                UpdateUserInput {
                    name: Some("Ada Lovelace".to_string()),
                    email: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(user.name, "Ada Lovelace");
        assert_eq!(user.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_delete_user_not_found() {
        let mut user_repo = MockUserRepository::new();
        user_repo.expect_find_by_id().returning(|_, _| Ok(None));

        let svc = service(user_repo, MockAccountRepository::new());

        let result = svc.delete_user(StringUuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
