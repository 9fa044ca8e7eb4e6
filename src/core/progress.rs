//! Equal-weight progress calculation and row health

use serde::Serialize;

use crate::core::checkpoint::{self, MilestoneGroup};
use crate::entities::milestone::MilestoneRow;

/// Progress over an explicit field list.
///
/// Every field weighs the same regardless of its milestone group. An empty
/// field list yields 0.
pub fn progress_over(row: &MilestoneRow, fields: &[&str]) -> u8 {
    if fields.is_empty() {
        return 0;
    }
    let checked = fields.iter().filter(|f| row.checkpoint(f)).count();
    percent(checked, fields.len())
}

/// Progress over the full checkpoint catalog
pub fn calculate_progress(row: &MilestoneRow) -> u8 {
    progress_over(row, &checkpoint::checkpoint_fields())
}

/// `round(100 * part / whole)`, half away from zero, in integer arithmetic
pub fn percent(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    let part = part.min(whole);
    ((200 * part + whole) / (2 * whole)) as u8
}

/// Checked/total counts for one milestone group on one row
pub fn group_counts(row: &MilestoneRow, group: &MilestoneGroup) -> (usize, usize) {
    let checked = group
        .checkpoints
        .iter()
        .filter(|c| row.checkpoint(c.field))
        .count();
    (checked, group.checkpoints.len())
}

/// Row classification used for colouring and the summary dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowHealth {
    Complete,
    InProgress,
    OnHold,
    AtRisk,
    NotStarted,
}

impl RowHealth {
    /// Classify a row; progress takes precedence over status
    pub fn of(row: &MilestoneRow) -> Self {
        match row.progress_pct.unwrap_or(0) {
            100 => RowHealth::Complete,
            1..=99 => RowHealth::InProgress,
            _ => match row.status.as_deref() {
                Some("On Hold") => RowHealth::OnHold,
                Some("At Risk") => RowHealth::AtRisk,
                _ => RowHealth::NotStarted,
            },
        }
    }
}

impl std::fmt::Display for RowHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowHealth::Complete => write!(f, "complete"),
            RowHealth::InProgress => write!(f, "in progress"),
            RowHealth::OnHold => write!(f, "on hold"),
            RowHealth::AtRisk => write!(f, "at risk"),
            RowHealth::NotStarted => write!(f, "not started"),
        }
    }
}
