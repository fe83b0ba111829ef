//! # Domain Model: Wire Shapes and Editable Records
//!
//! Two families of types live here:
//!
//! 1. **Wire shapes** ([`VariableGroup`], [`VariableValue`], [`SecureFile`],
//!    [`LibrarySnapshot`]): what the load collaborator hands us. They are treated as
//!    given and never mutated after a load.
//! 2. **Editable records** ([`VariableRecord`]): the flattened, per-variable shape the
//!    Record Store keeps for every view. Each record carries a snapshot of
//!    its loaded name/value (`original_*`) so status can be derived by comparison.
//!
//! The matrix view pivots the store's records into one row per name, see
//! [`crate::adapters::matrix`].
//!
//! ## Identity
//!
//! Records and matrix rows get a [`Uuid`]-backed id at creation. Names are editable and
//! therefore never used as identity inside the core.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::status::Status;

/// Backend identifier of a variable group.
pub type GroupId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(Uuid);

impl RecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a pivoted matrix row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowId(Uuid);

impl RowId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RowId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single variable as delivered by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableValue {
    /// Secret variables usually come back without a value.
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub is_secret: bool,
}

impl VariableValue {
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            is_secret: false,
        }
    }

    pub fn secret(value: Option<String>) -> Self {
        Self {
            value,
            is_secret: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableGroup {
    pub id: GroupId,
    pub name: String,
    #[serde(default)]
    pub variables: BTreeMap<String, VariableValue>,
}

impl VariableGroup {
    pub fn new(id: GroupId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            variables: BTreeMap::new(),
        }
    }

    /// Builder-style helper, mostly for fixtures.
    pub fn with_variable(mut self, name: impl Into<String>, value: VariableValue) -> Self {
        self.variables.insert(name.into(), value);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecureFile {
    pub name: String,
}

impl SecureFile {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Everything one fetch returns.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibrarySnapshot {
    #[serde(default)]
    pub variable_groups: Vec<VariableGroup>,
    #[serde(default)]
    pub secure_files: Vec<SecureFile>,
}

/// The user-editable fields of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Value,
}

/// One configuration key within one group.
///
/// `status` is derived by [`crate::status::StatusTracker`]; it is public for reading
/// but only the store writes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableRecord {
    pub id: RecordId,
    pub name: String,
    pub original_name: Option<String>,
    pub value: String,
    pub original_value: Option<String>,
    pub is_secret: bool,
    pub group_name: String,
    pub status: Option<Status>,
    pub(crate) deleted: bool,
}

impl VariableRecord {
    /// A record as it came from the backend: originals captured, clean.
    pub fn loaded(group_name: impl Into<String>, name: impl Into<String>, variable: &VariableValue) -> Self {
        let name = name.into();
        let value = variable.value.clone().unwrap_or_default();
        Self {
            id: RecordId::new(),
            original_name: Some(name.clone()),
            name,
            original_value: Some(value.clone()),
            value,
            is_secret: variable.is_secret,
            group_name: group_name.into(),
            status: None,
            deleted: false,
        }
    }

    /// A record created in memory with no backend counterpart.
    pub fn new_untracked(group_name: impl Into<String>, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: RecordId::new(),
            name: name.into(),
            original_name: None,
            value: value.into(),
            original_value: None,
            is_secret: false,
            group_name: group_name.into(),
            status: None,
            deleted: false,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Name still equals the name the backend knows it by.
    pub fn has_original_name(&self) -> bool {
        self.original_name.as_deref() == Some(self.name.as_str())
    }

    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Value => &self.value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loaded_record_captures_originals() {
        let record = VariableRecord::loaded("Shared", "Api.BaseUrl", &VariableValue::plain("https://x"));
        assert_eq!(record.original_name.as_deref(), Some("Api.BaseUrl"));
        assert_eq!(record.original_value.as_deref(), Some("https://x"));
        assert!(record.has_original_name());
        assert!(record.status.is_none());
    }

    #[test]
    fn secret_without_value_loads_as_empty() {
        let record = VariableRecord::loaded("Shared", "Token", &VariableValue::secret(None));
        assert_eq!(record.value, "");
        assert_eq!(record.original_value.as_deref(), Some(""));
        assert!(record.is_secret);
    }

    #[test]
    fn snapshot_parses_camel_case_wire_shape() {
        let json = r#"{
            "variableGroups": [
                { "id": 7, "name": "Prod", "variables": {
                    "Token": { "value": null, "isSecret": true },
                    "Url": { "value": "https://prod" }
                } }
            ],
            "secureFiles": [ { "name": "signing.pfx" } ]
        }"#;
        let snapshot: LibrarySnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.variable_groups.len(), 1);
        let group = &snapshot.variable_groups[0];
        assert_eq!(group.id, 7);
        assert!(group.variables["Token"].is_secret);
        assert_eq!(group.variables["Url"].value.as_deref(), Some("https://prod"));
        assert_eq!(snapshot.secure_files[0].name, "signing.pfx");
    }
}
