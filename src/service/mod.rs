//! Business logic layer

pub mod account;
pub mod auth;
pub mod contract;
pub mod hierarchy;
pub mod permission;
pub mod user;

pub use account::AccountService;
pub use auth::AuthService;
pub use contract::ContractService;
pub use hierarchy::HierarchyService;
pub use permission::PermissionService;
pub use user::UserService;
