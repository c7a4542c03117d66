//! Data access layer (Repository pattern)

pub mod account;
pub mod contract;
pub mod hierarchy;
pub mod permission;
pub mod permission_group;
pub mod token;
pub mod user;

pub use account::AccountRepository;
pub use contract::ContractRepository;
pub use hierarchy::HierarchyRepository;
pub use permission::PermissionRepository;
pub use permission_group::PermissionGroupRepository;
pub use token::TokenRepository;
pub use user::UserRepository;

use crate::error::AppError;

/// Surface a duplicate-key failure as the conflict it represents. The unique
/// index is the real uniqueness guarantee; application-level pre-checks only
/// exist for friendlier messages, so racing writers land here.
pub(crate) fn conflict_on_duplicate(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(message.to_string())
        }
        _ => AppError::Database(err),
    }
}
