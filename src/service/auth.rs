//! Authentication and session token business logic

use crate::domain::{IssuedToken, StringUuid, TokenMode, TokenUse, User};
use crate::error::{AppError, Result};
use crate::jwt::{JwtManager, SessionClaims};
use crate::repository::{AccountRepository, TokenRepository, UserRepository};
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

/// Hash a raw password for storage.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Verify a raw password against a stored hash. Argon2's verifier compares
/// in constant time; a malformed stored hash verifies as false.
pub fn verify_password(hash: &str, password: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

pub struct AuthService<U: UserRepository, A: AccountRepository, T: TokenRepository> {
    user_repo: Arc<U>,
    account_repo: Arc<A>,
    token_repo: Arc<T>,
    jwt: JwtManager,
}

impl<U: UserRepository, A: AccountRepository, T: TokenRepository> AuthService<U, A, T> {
    pub fn new(user_repo: Arc<U>, account_repo: Arc<A>, token_repo: Arc<T>, jwt: JwtManager) -> Self {
        Self {
            user_repo,
            account_repo,
            token_repo,
            jwt,
        }
    }

    /// Authenticate with email and password and hand back a session token.
    ///
    /// An unknown email and a wrong password are indistinguishable to the
    /// caller. Sessions opened this way are always (production, system).
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<IssuedToken> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::Unauthorized("invalid credentials".to_string()))?;

        if !verify_password(&user.password_hash, password) {
            return Err(AppError::Unauthorized("invalid credentials".to_string()));
        }

        self.issue_or_reuse_token(&user, TokenMode::Production, TokenUse::System)
            .await
    }

    /// Return the newest live token for `(user, mode, use)` unchanged, or
    /// mint one. Reuse does not slide the expiration.
    pub async fn issue_or_reuse_token(
        &self,
        user: &User,
        mode: TokenMode,
        token_use: TokenUse,
    ) -> Result<IssuedToken> {
        if let Some(existing) = self.token_repo.find_latest(user.id, mode, token_use).await? {
            if !existing.is_expired_at(Utc::now()) {
                debug!(user_id = %user.id, "reusing live session token");
                return Ok(IssuedToken {
                    token: existing.token,
                    expires_at: existing.expires_at,
                    mode,
                });
            }
        }

        let account = match user.default_account_id {
            Some(account_id) => self.account_repo.find_by_id(account_id, true).await?,
            None => None,
        };
        let hierarchy = account.as_ref().and_then(|a| a.hierarchy_setup_id);

        let (value, expires_at) = self.jwt.create_session_token(
            user.id,
            &user.email,
            user.default_account_id,
            hierarchy,
            mode,
            token_use,
        )?;

        self.token_repo
            .create(user.id, &value, mode, token_use, expires_at)
            .await?;

        debug!(user_id = %user.id, %mode, "minted session token");
        Ok(IssuedToken {
            token: value,
            expires_at,
            mode,
        })
    }

    /// Validate a bearer token value and return its claims.
    ///
    /// Three checks, short-circuiting on the first failure: the value is
    /// known to the store, the signature and payload (including the
    /// payload's own expiry) verify, and the stored expiry is still in the
    /// future. A deleted row fails the first check no matter how valid the
    /// signature is.
    pub async fn validate_token(&self, value: &str) -> Result<SessionClaims> {
        let stored = self
            .token_repo
            .find_by_value(value)
            .await?
            .ok_or_else(|| AppError::Unauthorized("unknown token".to_string()))?;

        let claims = self
            .jwt
            .verify_session_token(value)
            .map_err(|_| AppError::Forbidden("token is invalid or expired".to_string()))?;

        if stored.is_expired_at(Utc::now()) {
            return Err(AppError::Forbidden("token has expired".to_string()));
        }

        Ok(claims)
    }

    /// Lookup a user for issuance flows driven by the boundary layer.
    pub async fn find_user(&self, user_id: StringUuid) -> Result<User> {
        self.user_repo
            .find_by_id(user_id, false)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{JwtConfig, DEFAULT_SESSION_TTL_SECS};
    use crate::domain::{Account, Token};
    use crate::repository::account::MockAccountRepository;
    use crate::repository::token::MockTokenRepository;
    use crate::repository::user::MockUserRepository;
    use chrono::Duration;
    use mockall::predicate::*;

    fn jwt_manager() -> JwtManager {
        JwtManager::new(JwtConfig {
            secret: "unit-test-secret".to_string(),
            issuer: "https://stratum.test".to_string(),
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
        })
    }

    fn service(
        user_repo: MockUserRepository,
        account_repo: MockAccountRepository,
        token_repo: MockTokenRepository,
    ) -> AuthService<MockUserRepository, MockAccountRepository, MockTokenRepository> {
        AuthService::new(
            Arc::new(user_repo),
            Arc::new(account_repo),
            Arc::new(token_repo),
            jwt_manager(),
        )
    }

    fn user_with_password(password: &str) -> User {
        User {
            email: "ada@example.com".to_string(),
            name: "Ada".to_string(),
            password_hash: hash_password(password).unwrap(),
            ..Default::default()
        }
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("hunter2hunter2").unwrap();
        assert!(verify_password(&hash, "hunter2hunter2"));
        assert!(!verify_password(&hash, "wrong-password"));
    }

    #[test]
    fn test_verify_password_malformed_hash() {
        assert!(!verify_password("not-a-phc-string", "anything"));
    }

    #[tokio::test]
    async fn test_authenticate_unknown_email() {
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_email()
            .with(eq("ghost@example.com"))
            .returning(|_| Ok(None));

        let svc = service(
            user_repo,
            MockAccountRepository::new(),
            MockTokenRepository::new(),
        );

        let result = svc.authenticate("ghost@example.com", "whatever").await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password() {
        let user = user_with_password("correct-horse-battery");
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));

        let svc = service(
            user_repo,
            MockAccountRepository::new(),
            MockTokenRepository::new(),
        );

        let result = svc.authenticate("ada@example.com", "wrong-password").await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_authenticate_reuses_live_token() {
        let user = user_with_password("correct-horse-battery");
        let user_id = user.id;

        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));

        let mut token_repo = MockTokenRepository::new();
        token_repo
            .expect_find_latest()
            .with(eq(user_id), eq(TokenMode::Production), eq(TokenUse::System))
            .returning(move |uid, _, _| {
                Ok(Some(Token {
                    user_id: uid,
                    token: "live-token-value".to_string(),
                    expires_at: Utc::now() + Duration::hours(1),
                    ..Default::default()
                }))
            });
        // No create expected: reuse returns the stored value unchanged

        let svc = service(user_repo, MockAccountRepository::new(), token_repo);

        let issued = svc
            .authenticate("ada@example.com", "correct-horse-battery")
            .await
            .unwrap();
        assert_eq!(issued.token, "live-token-value");
        assert_eq!(issued.mode, TokenMode::Production);
    }

    #[tokio::test]
    async fn test_issue_mints_new_token_after_expiry() {
        let account_id = StringUuid::new_v4();
        let user = User {
            default_account_id: Some(account_id),
            ..user_with_password("correct-horse-battery")
        };
        let user_id = user.id;

        let mut token_repo = MockTokenRepository::new();
        token_repo.expect_find_latest().returning(move |uid, _, _| {
            Ok(Some(Token {
                user_id: uid,
                token: "stale-token-value".to_string(),
                expires_at: Utc::now() - Duration::minutes(1),
                ..Default::default()
            }))
        });
        token_repo
            .expect_create()
            .withf(move |uid, value, mode, use_, _| {
                *uid == user_id
                    && value != "stale-token-value"
                    && *mode == TokenMode::Production
                    && *use_ == TokenUse::System
            })
            .returning(|uid, value, mode, use_, exp| {
                Ok(Token {
                    user_id: uid,
                    token: value.to_string(),
                    mode,
                    token_use: use_,
                    expires_at: exp,
                    ..Default::default()
                })
            });

        let mut account_repo = MockAccountRepository::new();
        account_repo
            .expect_find_by_id()
            .with(eq(account_id), eq(true))
            .returning(move |id, _| {
                Ok(Some(Account {
                    id,
                    user_id,
                    ..Default::default()
                }))
            });

        let svc = service(MockUserRepository::new(), account_repo, token_repo);

        let issued = svc
            .issue_or_reuse_token(&user, TokenMode::Production, TokenUse::System)
            .await
            .unwrap();
        assert_ne!(issued.token, "stale-token-value");

        // The minted payload carries the default account
        let claims = jwt_manager().verify_session_token(&issued.token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.account, Some(account_id.to_string()));
    }

    #[tokio::test]
    async fn test_issue_mints_when_no_prior_token() {
        let user = user_with_password("correct-horse-battery");

        let mut token_repo = MockTokenRepository::new();
        token_repo.expect_find_latest().returning(|_, _, _| Ok(None));
        token_repo
            .expect_create()
            .returning(|uid, value, mode, use_, exp| {
                Ok(Token {
                    user_id: uid,
                    token: value.to_string(),
                    mode,
                    token_use: use_,
                    expires_at: exp,
                    ..Default::default()
                })
            });

        let svc = service(MockUserRepository::new(), MockAccountRepository::new(), token_repo);

        let issued = svc
            .issue_or_reuse_token(&user, TokenMode::Development, TokenUse::Personal)
            .await
            .unwrap();
        assert!(!issued.token.is_empty());
        assert_eq!(issued.mode, TokenMode::Development);

        let claims = jwt_manager().verify_session_token(&issued.token).unwrap();
        assert_eq!(claims.mode, TokenMode::Development);
        assert_eq!(claims.token_use, TokenUse::Personal);
        assert!(claims.account.is_none());
    }

    #[tokio::test]
    async fn test_find_user_excludes_soft_deleted() {
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_id()
            .with(always(), eq(false))
            .returning(|_, _| Ok(None));

        let svc = service(
            user_repo,
            MockAccountRepository::new(),
            MockTokenRepository::new(),
        );

        let result = svc.find_user(StringUuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_validate_token_unknown_value() {
        // Cryptographically valid token whose row is gone from the store
        let (value, _) = jwt_manager()
            .create_session_token(
                StringUuid::new_v4(),
                "ada@example.com",
                None,
                None,
                TokenMode::Production,
                TokenUse::System,
            )
            .unwrap();

        let mut token_repo = MockTokenRepository::new();
        token_repo.expect_find_by_value().returning(|_| Ok(None));

        let svc = service(
            MockUserRepository::new(),
            MockAccountRepository::new(),
            token_repo,
        );

        let result = svc.validate_token(&value).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_validate_token_forged_payload() {
        let mut token_repo = MockTokenRepository::new();
        token_repo.expect_find_by_value().returning(|value| {
            Ok(Some(Token {
                token: value.to_string(),
                ..Default::default()
            }))
        });

        let svc = service(
            MockUserRepository::new(),
            MockAccountRepository::new(),
            token_repo,
        );

        let result = svc.validate_token("not.a.jwt").await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_validate_token_expired_in_store() {
        let (value, _) = jwt_manager()
            .create_session_token(
                StringUuid::new_v4(),
                "ada@example.com",
                None,
                None,
                TokenMode::Production,
                TokenUse::System,
            )
            .unwrap();

        let mut token_repo = MockTokenRepository::new();
        token_repo.expect_find_by_value().returning(|value| {
            Ok(Some(Token {
                token: value.to_string(),
                expires_at: Utc::now() - Duration::minutes(1),
                ..Default::default()
            }))
        });

        let svc = service(
            MockUserRepository::new(),
            MockAccountRepository::new(),
            token_repo,
        );

        // Payload still verifies, but the stored row says expired
        let result = svc.validate_token(&value).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_validate_token_success() {
        let user_id = StringUuid::new_v4();
        let (value, exp) = jwt_manager()
            .create_session_token(
                user_id,
                "ada@example.com",
                None,
                None,
                TokenMode::Production,
                TokenUse::System,
            )
            .unwrap();

        let mut token_repo = MockTokenRepository::new();
        token_repo.expect_find_by_value().returning(move |value| {
            Ok(Some(Token {
                token: value.to_string(),
                expires_at: exp,
                ..Default::default()
            }))
        });

        let svc = service(
            MockUserRepository::new(),
            MockAccountRepository::new(),
            token_repo,
        );

        let claims = svc.validate_token(&value).await.unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "ada@example.com");
    }
}
