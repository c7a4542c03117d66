//! User domain model

use super::common::StringUuid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::account::Role;

/// Fields a user listing may be sorted by, mapped to storage columns.
pub const USER_SORT_FIELDS: &[(&str, &str)] = &[
    ("name", "name"),
    ("email", "email"),
    ("createdAt", "created_at"),
    ("updatedAt", "updated_at"),
    ("deletedAt", "deleted_at"),
];

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: StringUuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub default_account_id: Option<StringUuid>,
    #[serde(skip_serializing)]
    pub searchable: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// Searchable projection of a user's human-readable fields.
    pub fn search_text(name: &str, email: &str) -> String {
        format!("{} {}", name, email)
    }

    /// Recompute the projection from this row's current fields.
    pub fn searchable(&self) -> String {
        Self::search_text(&self.name, &self.email)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

impl Default for User {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: StringUuid::new_v4(),
            name: String::new(),
            email: String::new(),
            password_hash: String::new(),
            default_account_id: None,
            searchable: String::new(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

/// Input for creating a new user (signup also creates the initial account)
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserInput {
    #[validate(length(min = 3, max = 255))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub role: Role,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Input for updating a user
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUserInput {
    #[validate(length(min = 3, max = 255))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
}
