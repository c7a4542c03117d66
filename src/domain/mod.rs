//! Domain models

pub mod account;
pub mod common;
pub mod context;
pub mod contract;
pub mod hierarchy;
pub mod permission;
pub mod token;
pub mod user;

pub use account::{Account, BindOutcome, Role};
pub use common::{ListQuery, Page, SortBy, StringUuid, MAX_PER_PAGE};
pub use context::AuthContext;
pub use contract::{Contract, CreateContractInput, UpdateContractInput, CONTRACT_SORT_FIELDS};
pub use hierarchy::{CreateRankInput, HierarchySetup, UpdateRankInput};
pub use permission::{
    CreateGroupInput, CreatePermissionInput, Permission, PermissionGroup, PermissionType,
    UpdateGroupInput, PERMISSION_GROUP_SORT_FIELDS,
};
pub use token::{IssuedToken, Token, TokenMode, TokenUse};
pub use user::{CreateUserInput, UpdateUserInput, User, USER_SORT_FIELDS};
