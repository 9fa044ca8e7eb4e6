//! In-memory row filtering

use crate::entities::milestone::MilestoneRow;

/// Search text plus exact-match filters, all case-insensitive
#[derive(Debug, Clone, Default)]
pub struct RowFilter {
    /// Substring matched against project id and project name
    pub search: Option<String>,
    /// Exact status match
    pub status: Option<String>,
    /// Exact match against branch, falling back to region
    pub region: Option<String>,
}

/// Status a `--status` filter compares against; empty when unset
pub fn status_of(row: &MilestoneRow) -> &str {
    row.status.as_deref().unwrap_or("")
}

/// Branch when set, otherwise region; empty when neither is
pub fn region_of(row: &MilestoneRow) -> &str {
    row.branch
        .as_deref()
        .filter(|b| !b.is_empty())
        .or(row.region.as_deref())
        .unwrap_or("")
}

impl RowFilter {
    pub fn search(query: impl Into<String>) -> Self {
        Self {
            search: Some(query.into()),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Text search first, then status, then region
    pub fn matches(&self, row: &MilestoneRow) -> bool {
        if let Some(query) = self.search.as_deref().filter(|q| !q.is_empty()) {
            let query = query.to_lowercase();
            let hit = |field: &Option<String>| {
                field
                    .as_deref()
                    .is_some_and(|v| v.to_lowercase().contains(&query))
            };
            if !hit(&row.project_id) && !hit(&row.project_name) {
                return false;
            }
        }

        if let Some(status) = self.status.as_deref().filter(|s| !s.is_empty()) {
            if !status_of(row).eq_ignore_ascii_case(status) {
                return false;
            }
        }

        if let Some(region) = self.region.as_deref().filter(|r| !r.is_empty()) {
            if !region_of(row).eq_ignore_ascii_case(region) {
                return false;
            }
        }

        true
    }

    /// Matching rows, preserving their relative order
    pub fn apply<'a>(&self, rows: &'a [MilestoneRow]) -> Vec<&'a MilestoneRow> {
        rows.iter().filter(|r| self.matches(r)).collect()
    }
}
