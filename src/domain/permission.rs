//! Permission group and permission domain models

use super::common::StringUuid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Fields a group listing may be sorted by, mapped to storage columns.
pub const PERMISSION_GROUP_SORT_FIELDS: &[(&str, &str)] = &[
    ("name", "name"),
    ("description", "description"),
    ("createdAt", "created_at"),
    ("updatedAt", "updated_at"),
];

/// Capability type of a permission leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionType {
    Read,
    Write,
    Delete,
}

impl PermissionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionType::Read => "read",
            PermissionType::Write => "write",
            PermissionType::Delete => "delete",
        }
    }
}

impl std::fmt::Display for PermissionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PermissionType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(PermissionType::Read),
            "write" => Ok(PermissionType::Write),
            "delete" => Ok(PermissionType::Delete),
            other => Err(format!("unknown permission type: {}", other)),
        }
    }
}

impl sqlx::Type<sqlx::MySql> for PermissionType {
    fn type_info() -> sqlx::mysql::MySqlTypeInfo {
        <String as sqlx::Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::MySql>>::compatible(ty)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::MySql> for PermissionType {
    fn decode(value: sqlx::mysql::MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::MySql>>::decode(value)?;
        s.parse().map_err(Into::into)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::MySql> for PermissionType {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<u8>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <String as sqlx::Encode<sqlx::MySql>>::encode_by_ref(&self.as_str().to_string(), buf)
    }
}

/// Permission group: a node in an owner-scoped forest used to organize
/// permissions. `parent_id` points at another group of the same owner.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PermissionGroup {
    pub id: StringUuid,
    pub owner_id: StringUuid,
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<StringUuid>,
    #[serde(skip_serializing)]
    pub searchable: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PermissionGroup {
    /// Searchable projection of a group's human-readable fields.
    pub fn search_text(name: &str, description: Option<&str>) -> String {
        format!("{} {}", name, description.unwrap_or_default())
    }

    /// Recompute the projection from this row's current fields.
    pub fn searchable(&self) -> String {
        Self::search_text(&self.name, self.description.as_deref())
    }
}

impl Default for PermissionGroup {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: StringUuid::new_v4(),
            owner_id: StringUuid::new_v4(),
            name: String::new(),
            description: None,
            parent_id: None,
            searchable: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Permission leaf. Read-after-create: there is no update or delete path.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Permission {
    pub id: StringUuid,
    pub permission_group_id: StringUuid,
    pub name: String,
    pub description: Option<String>,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub permission_type: PermissionType,
    #[serde(skip_serializing)]
    pub searchable: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Permission {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: StringUuid::new_v4(),
            permission_group_id: StringUuid::new_v4(),
            name: String::new(),
            description: None,
            permission_type: PermissionType::Read,
            searchable: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Permission {
    /// Searchable projection of a permission's human-readable fields.
    pub fn search_text(name: &str, description: Option<&str>, permission_type: PermissionType) -> String {
        format!(
            "{} {} {}",
            name,
            description.unwrap_or_default(),
            permission_type
        )
    }

    /// Recompute the projection from this row's current fields.
    pub fn searchable(&self) -> String {
        Self::search_text(&self.name, self.description.as_deref(), self.permission_type)
    }
}

/// Input for creating a permission group
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateGroupInput {
    #[validate(length(min = 3, max = 255))]
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<StringUuid>,
}

/// Patch for updating a permission group
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateGroupInput {
    #[validate(length(min = 3, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    /// `Some(None)` detaches the group from its parent.
    pub parent_id: Option<Option<StringUuid>>,
}

/// Input for creating a permission inside a group
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePermissionInput {
    #[validate(length(min = 3, max = 255))]
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub permission_type: PermissionType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_type_round_trip() {
        for ty in [
            PermissionType::Read,
            PermissionType::Write,
            PermissionType::Delete,
        ] {
            let parsed: PermissionType = ty.as_str().parse().unwrap();
            assert_eq!(parsed, ty);
        }
    }

    #[test]
    fn test_permission_type_rejects_unknown() {
        let result: Result<PermissionType, _> = "execute".parse();
        assert!(result.is_err());
    }

    #[test]
    fn test_group_search_text() {
        assert_eq!(
            PermissionGroup::search_text("Billing", Some("invoices and refunds")),
            "Billing invoices and refunds"
        );
        assert_eq!(PermissionGroup::search_text("Billing", None), "Billing ");
    }

    #[test]
    fn test_permission_search_text_includes_type() {
        assert_eq!(
            Permission::search_text("invoices", Some("view invoices"), PermissionType::Read),
            "invoices view invoices read"
        );
    }

    #[test]
    fn test_group_searchable_recompute_matches_fields() {
        let group = PermissionGroup {
            name: "Billing".to_string(),
            description: Some("invoices".to_string()),
            searchable: PermissionGroup::search_text("Billing", Some("invoices")),
            ..Default::default()
        };
        assert_eq!(group.searchable(), group.searchable);
    }

    #[test]
    fn test_create_permission_input_type_field_name() {
        let input: CreatePermissionInput = serde_json::from_str(
            r#"{"name": "invoices", "description": null, "type": "write"}"#,
        )
        .unwrap();
        assert_eq!(input.permission_type, PermissionType::Write);
    }

    #[test]
    fn test_update_group_input_detach_parent() {
        let patch = UpdateGroupInput {
            parent_id: Some(None),
            ..Default::default()
        };
        assert!(matches!(patch.parent_id, Some(None)));
    }
}
