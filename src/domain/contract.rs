//! Contract domain model

use super::common::StringUuid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Fields a contract listing may be sorted by, mapped to storage columns.
pub const CONTRACT_SORT_FIELDS: &[(&str, &str)] = &[
    ("name", "name"),
    ("description", "description"),
    ("createdAt", "created_at"),
    ("updatedAt", "updated_at"),
    ("deletedAt", "deleted_at"),
];

/// Contract entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Contract {
    pub id: StringUuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(skip_serializing)]
    pub searchable: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Contract {
    /// Searchable projection of a contract's human-readable fields.
    pub fn search_text(name: &str, description: Option<&str>) -> String {
        format!("{} {}", name, description.unwrap_or_default())
    }

    /// Recompute the projection from this row's current fields.
    pub fn searchable(&self) -> String {
        Self::search_text(&self.name, self.description.as_deref())
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

impl Default for Contract {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: StringUuid::new_v4(),
            name: String::new(),
            description: None,
            searchable: String::new(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

/// Input for creating a contract
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateContractInput {
    #[validate(length(min = 3, max = 255))]
    pub name: String,
    pub description: Option<String>,
}

/// Input for updating a contract
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateContractInput {
    #[validate(length(min = 3, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
}
