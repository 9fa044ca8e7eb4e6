//! Milestone grid: load, edit, create and delete rows
//!
//! The grid keeps the working row set in memory and drives every change
//! through the same sequence: update the local row first, recompute derived
//! progress, then persist to the remote store. When persisting fails the
//! edit is parked in the [`OverrideCache`] and overlaid on the next load, so
//! user input survives network failures.

use serde_json::Value;
use thiserror::Error;

use crate::core::checkpoint::{is_checked, is_checkpoint};
use crate::core::filter::RowFilter;
use crate::core::overrides::{OverrideCache, OverrideError};
use crate::core::progress::calculate_progress;
use crate::core::store::{MilestoneStore, StoreError};
use crate::entities::milestone::{
    validate_field_value, FieldError, MilestoneRow, NewRow, RowId, RowPatch, PROGRESS_FIELD,
};

/// Prefix of generated display ids
pub const DISPLAY_ID_PREFIX: &str = "TAPL";

#[derive(Debug, Error)]
pub enum GridError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Override(#[from] OverrideError),

    #[error("row '{0}' is not in the grid")]
    UnknownRow(String),

    #[error("{0}")]
    Validation(String),
}

impl From<FieldError> for GridError {
    fn from(e: FieldError) -> Self {
        GridError::Validation(e.to_string())
    }
}

/// Result of persisting one edit
#[derive(Debug)]
pub enum SaveOutcome {
    /// The remote store accepted every write
    Saved,
    /// A write failed; the edit is kept locally in the override cache
    SaveFailed(StoreError),
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved)
    }
}

/// What an edit did to a row
#[derive(Debug)]
pub struct EditResult {
    pub row_id: RowId,
    pub field: String,
    pub value: Value,
    /// Recomputed progress, present for checkpoint edits
    pub progress_pct: Option<u8>,
    pub outcome: SaveOutcome,
}

/// Counters from one grid load
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadStats {
    pub rows: usize,
    /// Rows whose stored progress disagreed with their checkpoints
    pub corrected: usize,
    /// Rows that had a pending override overlaid
    pub overlaid: usize,
    /// Override fields the remote store confirmed during replay
    pub replayed: usize,
    /// Override fields still pending after replay
    pub pending: usize,
}

/// In-memory milestone grid bound to a remote store
pub struct Grid<S: MilestoneStore> {
    store: S,
    overrides: OverrideCache,
    rows: Vec<MilestoneRow>,
}

impl<S: MilestoneStore> Grid<S> {
    pub fn new(store: S, overrides: OverrideCache) -> Self {
        Self {
            store,
            overrides,
            rows: Vec::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn overrides(&self) -> &OverrideCache {
        &self.overrides
    }

    /// Working row set, in store order
    pub fn rows(&self) -> &[MilestoneRow] {
        &self.rows
    }

    pub fn row(&self, id: &RowId) -> Option<&MilestoneRow> {
        self.rows.iter().find(|r| &r.id == id)
    }

    /// Find a row by row id or project id (case-insensitive)
    pub fn find(&self, key: &str) -> Option<&MilestoneRow> {
        self.rows.iter().find(|r| r.id.as_str() == key).or_else(|| {
            self.rows.iter().find(|r| {
                r.project_id
                    .as_deref()
                    .is_some_and(|p| p.eq_ignore_ascii_case(key))
            })
        })
    }

    /// Rows passing `filter`, in their original relative order
    pub fn filtered(&self, filter: &RowFilter) -> Vec<&MilestoneRow> {
        filter.apply(&self.rows)
    }

    /// Fetch all rows, overlay pending overrides and correct derived progress.
    ///
    /// On fetch failure the working set is left empty rather than stale.
    pub fn load(&mut self) -> Result<LoadStats, GridError> {
        self.rows.clear();
        let fetched = self.store.fetch_rows()?;
        let pending = self.overrides.read();

        let mut stats = LoadStats {
            rows: fetched.len(),
            ..Default::default()
        };
        let mut rows = Vec::with_capacity(fetched.len());

        for mut row in fetched {
            let patch = pending.get(row.id.as_str());
            if let Some(patch) = patch {
                row.apply_patch(patch);
                stats.overlaid += 1;
            }
            row.normalize_checkpoints();

            let progress = calculate_progress(&row);
            let stale = row.progress_pct != Some(progress);
            row.progress_pct = Some(progress);

            match patch {
                Some(patch) => {
                    let (confirmed, left) = self.replay(&row.id, patch, progress)?;
                    stats.replayed += confirmed;
                    stats.pending += left;
                    if stale {
                        stats.corrected += 1;
                    }
                }
                None if stale => {
                    stats.corrected += 1;
                    // Best effort; the next load retries
                    if let Err(e) =
                        self.store
                            .update_cell(&row.id, PROGRESS_FIELD, &Value::from(progress))
                    {
                        tracing::warn!(row = %row.id, "failed to push corrected progress: {}", e);
                    }
                }
                None => {}
            }

            rows.push(row);
        }

        self.rows = rows;
        tracing::debug!(?stats, "grid loaded");
        Ok(stats)
    }

    /// Push a pending patch to the store, dropping fields it confirms.
    /// Progress is always replayed from the freshly computed value.
    fn replay(
        &self,
        id: &RowId,
        patch: &RowPatch,
        progress: u8,
    ) -> Result<(usize, usize), GridError> {
        let mut confirmed: Vec<&str> = Vec::new();
        let mut left = 0;

        for (field, value) in patch.iter().filter(|(f, _)| f.as_str() != PROGRESS_FIELD) {
            match self.store.update_cell(id, field, value) {
                Ok(()) => confirmed.push(field),
                Err(e) => {
                    tracing::warn!(row = %id, %field, "override replay failed: {}", e);
                    left += 1;
                }
            }
        }

        match self
            .store
            .update_cell(id, PROGRESS_FIELD, &Value::from(progress))
        {
            Ok(()) => confirmed.push(PROGRESS_FIELD),
            Err(e) => {
                tracing::warn!(row = %id, "progress replay failed: {}", e);
                if patch.contains_key(PROGRESS_FIELD) {
                    left += 1;
                }
            }
        }

        if left == 0 {
            self.overrides.clear_override(id)?;
        } else {
            self.overrides.confirm_fields(id, &confirmed)?;
        }
        let replayed = confirmed
            .iter()
            .filter(|f| patch.contains_key(**f))
            .count();
        Ok((replayed, left))
    }

    fn row_index(&self, id: &RowId) -> Result<usize, GridError> {
        self.rows
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| GridError::UnknownRow(id.to_string()))
    }

    /// Apply a user edit to one cell.
    ///
    /// The local row is updated (and progress recomputed for checkpoints)
    /// before any network call. A failed write does not roll the row back;
    /// it is recorded in the override cache instead.
    pub fn edit_cell(
        &mut self,
        id: &RowId,
        field: &str,
        raw: Value,
    ) -> Result<EditResult, GridError> {
        let idx = self.row_index(id)?;

        if !is_checkpoint(field) {
            validate_field_value(field, &raw)?;
            self.rows[idx].set_field(field, raw.clone())?;
            let outcome = match self.store.update_cell(id, field, &raw) {
                Ok(()) => {
                    self.overrides.confirm_fields(id, &[field])?;
                    SaveOutcome::Saved
                }
                Err(e) => {
                    tracing::warn!(row = %id, %field, "failed to save cell: {}", e);
                    let mut patch = RowPatch::new();
                    patch.insert(field.to_string(), raw.clone());
                    self.overrides.set_override(id, patch)?;
                    SaveOutcome::SaveFailed(e)
                }
            };
            return Ok(EditResult {
                row_id: id.clone(),
                field: field.to_string(),
                value: raw,
                progress_pct: None,
                outcome,
            });
        }

        let value = Value::Bool(is_checked(&raw));
        let row = &mut self.rows[idx];
        row.set_field(field, value.clone())?;
        let progress = calculate_progress(row);
        row.progress_pct = Some(progress);

        let persisted = self
            .store
            .update_cell(id, field, &value)
            .and_then(|()| {
                self.store
                    .update_cell(id, PROGRESS_FIELD, &Value::from(progress))
            });

        let outcome = match persisted {
            Ok(()) => {
                self.overrides.confirm_fields(id, &[field, PROGRESS_FIELD])?;
                SaveOutcome::Saved
            }
            Err(e) => {
                tracing::warn!(row = %id, %field, "failed to save checkpoint: {}", e);
                let mut patch = RowPatch::new();
                patch.insert(field.to_string(), value.clone());
                patch.insert(PROGRESS_FIELD.to_string(), Value::from(progress));
                self.overrides.set_override(id, patch)?;
                SaveOutcome::SaveFailed(e)
            }
        };

        Ok(EditResult {
            row_id: id.clone(),
            field: field.to_string(),
            value,
            progress_pct: Some(progress),
            outcome,
        })
    }

    /// Flip one checkpoint and persist it like any other edit
    pub fn toggle(&mut self, id: &RowId, field: &str) -> Result<EditResult, GridError> {
        if !is_checkpoint(field) {
            return Err(GridError::Validation(format!(
                "'{}' is not a milestone checkpoint",
                field
            )));
        }
        let idx = self.row_index(id)?;
        let next = !self.rows[idx].checkpoint(field);
        self.edit_cell(id, field, Value::Bool(next))
    }

    /// Create a row with default values, then reload the whole grid.
    ///
    /// Returns the generated display id.
    pub fn add_row(&mut self) -> Result<(String, LoadStats), GridError> {
        let display_id = next_display_id(&self.rows);
        self.store
            .create_row(&NewRow::with_display_id(display_id.clone()))?;
        let stats = self.load()?;
        Ok((display_id, stats))
    }

    /// Delete a row remotely; the local row is removed only on success
    pub fn delete_row(&mut self, id: &RowId) -> Result<MilestoneRow, GridError> {
        let idx = self.row_index(id)?;
        self.store.delete_row(id)?;
        let removed = self.rows.remove(idx);
        self.overrides.clear_override(id)?;
        Ok(removed)
    }
}

/// Next `TAPL###` id: starts at row count + 1 and skips ids already in use
pub fn next_display_id(rows: &[MilestoneRow]) -> String {
    let taken = |candidate: &str| {
        rows.iter().any(|r| {
            r.project_id
                .as_deref()
                .is_some_and(|p| p.eq_ignore_ascii_case(candidate))
        })
    };

    let mut n = rows.len() + 1;
    loop {
        let candidate = format!("{}{:03}", DISPLAY_ID_PREFIX, n);
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
