//! Milestone grid row entity

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::core::checkpoint::{self, is_checked_opt};

/// A partial set of row fields keyed by field name
pub type RowPatch = BTreeMap<String, Value>;

/// Name of the derived progress field
pub const PROGRESS_FIELD: &str = "progress_pct";

/// Project overview columns in display order (field, header)
pub const OVERVIEW_COLUMNS: &[(&str, &str)] = &[
    ("project_id", "Project ID"),
    ("project_name", "Project Name"),
    ("branch", "Branch to Involve"),
    ("priority", "Priority"),
    ("sales_team", "Sales Team"),
    ("immediate_action", "Immediate Action to be taken"),
    ("site_engineer", "Site Eng"),
    ("ongoing_milestone", "Ongoing Milestone"),
    ("upcoming_milestone", "Upcoming Milestone"),
    ("owner", "Owner"),
];

/// Descriptive fields held as plain strings
pub const TEXT_FIELDS: &[&str] = &[
    "project_id",
    "project_name",
    "branch",
    "region",
    "status",
    "priority",
    "sales_team",
    "immediate_action",
    "site_engineer",
    "ongoing_milestone",
    "upcoming_milestone",
    "owner",
];

/// Allowed values for the priority select
pub const PRIORITY_VALUES: &[&str] = &["High", "Medium", "Low"];

/// Opaque row identifier assigned by the backing store
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(String);

impl RowId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RowId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Serialize for RowId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RowId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Backends differ on string vs numeric ids
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(Self(s)),
            Value::Number(n) => Ok(Self(n.to_string())),
            other => Err(serde::de::Error::custom(format!(
                "row id must be a string or number, got {}",
                other
            ))),
        }
    }
}

/// Errors from field-level row mutation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("field '{0}' is read-only")]
    ReadOnly(String),

    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// One row of the milestone grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneRow {
    pub id: RowId,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub sales_team: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub immediate_action: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub site_engineer: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub ongoing_milestone: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub upcoming_milestone: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    /// Derived completion percentage; `None` when the store holds no usable value
    #[serde(default, deserialize_with = "lenient_pct", skip_serializing_if = "Option::is_none")]
    pub progress_pct: Option<u8>,

    /// Checkpoint flags plus any other fields the backend returns
    #[serde(flatten)]
    pub cells: BTreeMap<String, Value>,
}

impl MilestoneRow {
    /// Create an empty row with the given id
    pub fn new(id: RowId) -> Self {
        Self {
            id,
            project_id: None,
            project_name: None,
            branch: None,
            region: None,
            status: None,
            priority: None,
            sales_team: None,
            immediate_action: None,
            site_engineer: None,
            ongoing_milestone: None,
            upcoming_milestone: None,
            owner: None,
            progress_pct: None,
            cells: BTreeMap::new(),
        }
    }

    fn text_slot(&self, field: &str) -> Option<&Option<String>> {
        Some(match field {
            "project_id" => &self.project_id,
            "project_name" => &self.project_name,
            "branch" => &self.branch,
            "region" => &self.region,
            "status" => &self.status,
            "priority" => &self.priority,
            "sales_team" => &self.sales_team,
            "immediate_action" => &self.immediate_action,
            "site_engineer" => &self.site_engineer,
            "ongoing_milestone" => &self.ongoing_milestone,
            "upcoming_milestone" => &self.upcoming_milestone,
            "owner" => &self.owner,
            _ => return None,
        })
    }

    fn text_slot_mut(&mut self, field: &str) -> Option<&mut Option<String>> {
        Some(match field {
            "project_id" => &mut self.project_id,
            "project_name" => &mut self.project_name,
            "branch" => &mut self.branch,
            "region" => &mut self.region,
            "status" => &mut self.status,
            "priority" => &mut self.priority,
            "sales_team" => &mut self.sales_team,
            "immediate_action" => &mut self.immediate_action,
            "site_engineer" => &mut self.site_engineer,
            "ongoing_milestone" => &mut self.ongoing_milestone,
            "upcoming_milestone" => &mut self.upcoming_milestone,
            "owner" => &mut self.owner,
            _ => return None,
        })
    }

    /// Read a field by name as a JSON value
    pub fn get_field(&self, field: &str) -> Option<Value> {
        if field == "id" {
            return Some(Value::String(self.id.to_string()));
        }
        if field == PROGRESS_FIELD {
            return self.progress_pct.map(Value::from);
        }
        if let Some(slot) = self.text_slot(field) {
            return slot.clone().map(Value::String);
        }
        self.cells.get(field).cloned()
    }

    /// Set a field by name from a JSON value
    pub fn set_field(&mut self, field: &str, value: Value) -> Result<(), FieldError> {
        if field == "id" {
            return Err(FieldError::ReadOnly(field.to_string()));
        }
        if field == PROGRESS_FIELD {
            self.progress_pct = pct_from_value(&value);
            return Ok(());
        }
        if let Some(slot) = self.text_slot_mut(field) {
            *slot = string_from_value(value);
            return Ok(());
        }
        self.cells.insert(field.to_string(), value);
        Ok(())
    }

    /// Overlay a patch; patched fields win, everything else is untouched
    pub fn apply_patch(&mut self, patch: &RowPatch) {
        for (field, value) in patch {
            if let Err(e) = self.set_field(field, value.clone()) {
                tracing::debug!(row = %self.id, "skipping patch field: {}", e);
            }
        }
    }

    /// Normalized state of one checkpoint
    pub fn checkpoint(&self, field: &str) -> bool {
        is_checked_opt(self.cells.get(field))
    }

    /// Rewrite every catalog checkpoint as a strict boolean
    pub fn normalize_checkpoints(&mut self) {
        for cp in checkpoint::all_checkpoints() {
            let checked = self.checkpoint(cp.field);
            self.cells.insert(cp.field.to_string(), Value::Bool(checked));
        }
    }

    /// Display label: project id, falling back to the row id
    pub fn label(&self) -> String {
        self.project_id
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.id.to_string())
    }
}

/// Field set submitted when creating a row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRow {
    pub project_id: String,
    pub project_name: String,
    pub branch: String,
    pub priority: String,
    pub sales_team: String,
    pub immediate_action: String,
    pub site_engineer: String,
    pub ongoing_milestone: String,
    pub upcoming_milestone: String,
    pub owner: String,
}

impl NewRow {
    /// Defaults used by the "add row" action
    pub fn with_display_id(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            project_name: "New Project".to_string(),
            branch: "Bengaluru".to_string(),
            priority: "Low".to_string(),
            sales_team: String::new(),
            immediate_action: String::new(),
            site_engineer: String::new(),
            ongoing_milestone: String::new(),
            upcoming_milestone: String::new(),
            owner: String::new(),
        }
    }
}

/// Check a non-checkpoint value before it is applied
pub fn validate_field_value(field: &str, value: &Value) -> Result<(), FieldError> {
    match field {
        "id" | PROGRESS_FIELD => Err(FieldError::ReadOnly(field.to_string())),
        "priority" => {
            let ok = value
                .as_str()
                .map(|s| PRIORITY_VALUES.iter().any(|p| p.eq_ignore_ascii_case(s)))
                .unwrap_or(false);
            if ok {
                Ok(())
            } else {
                Err(FieldError::InvalidValue {
                    field: field.to_string(),
                    reason: format!("expected one of {}", PRIORITY_VALUES.join(", ")),
                })
            }
        }
        _ => Ok(()),
    }
}

fn string_from_value(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn pct_from_value(value: &Value) -> Option<u8> {
    value
        .as_u64()
        .filter(|n| *n <= 100)
        .map(|n| n as u8)
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(string_from_value(Value::deserialize(deserializer)?))
}

fn lenient_pct<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u8>, D::Error> {
    Ok(pct_from_value(&Value::deserialize(deserializer)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_lenient_row() {
        let row: MilestoneRow = serde_json::from_value(json!({
            "id": 42,
            "project_id": "TAPL001",
            "project_name": "Tower A",
            "owner": null,
            "progress_pct": "17",
            "m1_slab1": "yes",
            "created_at": "2024-01-01"
        }))
        .unwrap();

        assert_eq!(row.id.as_str(), "42");
        assert_eq!(row.project_name.as_deref(), Some("Tower A"));
        assert_eq!(row.owner, None);
        assert_eq!(row.progress_pct, None);
        assert!(row.checkpoint("m1_slab1"));
        assert_eq!(row.cells.get("created_at"), Some(&json!("2024-01-01")));
    }

    #[test]
    fn test_apply_patch_overrides_only_patched_fields() {
        let mut row: MilestoneRow = serde_json::from_value(json!({
            "id": "r1",
            "project_name": "Tower A",
            "branch": "Chennai",
            "progress_pct": 0,
            "m1_slab1": false,
            "m1_slab2": true
        }))
        .unwrap();
        let before = row.clone();

        let mut patch = RowPatch::new();
        patch.insert("m1_slab1".into(), json!(true));
        patch.insert("progress_pct".into(), json!(2));
        patch.insert("branch".into(), json!("Mumbai"));
        row.apply_patch(&patch);

        assert_eq!(row.get_field("m1_slab1"), Some(json!(true)));
        assert_eq!(row.progress_pct, Some(2));
        assert_eq!(row.branch.as_deref(), Some("Mumbai"));
        assert_eq!(row.project_name, before.project_name);
        assert_eq!(row.get_field("m1_slab2"), before.get_field("m1_slab2"));
        assert_eq!(row.id, before.id);
    }

    #[test]
    fn test_patch_ignores_id() {
        let mut row = MilestoneRow::new(RowId::from("r1"));
        let mut patch = RowPatch::new();
        patch.insert("id".into(), json!("other"));
        row.apply_patch(&patch);
        assert_eq!(row.id.as_str(), "r1");
    }

    #[test]
    fn test_normalize_checkpoints_fills_catalog() {
        let mut row = MilestoneRow::new(RowId::from("r1"));
        row.cells.insert("m5_ups".into(), json!("on"));
        row.normalize_checkpoints();

        assert_eq!(row.cells.get("m5_ups"), Some(&json!(true)));
        assert_eq!(row.cells.get("m10_handover"), Some(&json!(false)));
        assert_eq!(row.cells.len(), checkpoint::checkpoint_count());
    }

    #[test]
    fn test_validate_priority() {
        assert!(validate_field_value("priority", &json!("high")).is_ok());
        assert!(validate_field_value("priority", &json!("Urgent")).is_err());
        assert!(validate_field_value("owner", &json!("anyone")).is_ok());
        assert_eq!(
            validate_field_value("progress_pct", &json!(50)),
            Err(FieldError::ReadOnly("progress_pct".into()))
        );
    }

    #[test]
    fn test_serialize_skips_missing_fields() {
        let row = MilestoneRow::new(RowId::from("r9"));
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value, json!({ "id": "r9" }));
    }
}
