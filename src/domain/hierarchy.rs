//! Hierarchy rank domain model
//!
//! A `HierarchySetup` is one named, leveled position in a contract's flat
//! ordered rank list. Despite the name there is no parent/child link between
//! ranks; ordering comes from `level` alone.

use super::common::StringUuid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Hierarchy rank entity. `level` is stored as DECIMAL(10,1) and always
/// surfaced as a float with one fractional digit of meaning.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HierarchySetup {
    pub id: StringUuid,
    pub contract_id: StringUuid,
    pub level: f64,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for HierarchySetup {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: StringUuid::new_v4(),
            contract_id: StringUuid::new_v4(),
            level: 0.0,
            name: String::new(),
            description: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for creating a rank
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRankInput {
    #[validate(range(min = 0.0))]
    pub level: f64,
    #[validate(length(min = 3, max = 255))]
    pub name: String,
    #[validate(length(min = 3))]
    pub description: String,
}

/// Patch for updating a rank; only present fields are checked and written.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateRankInput {
    #[validate(range(min = 0.0))]
    pub level: Option<f64>,
    #[validate(length(min = 3, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
}

impl UpdateRankInput {
    pub fn is_empty(&self) -> bool {
        self.level.is_none() && self.name.is_none() && self.description.is_none()
    }
}
