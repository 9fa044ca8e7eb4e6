//! Durable override cache for edits not yet confirmed by the remote store
//!
//! The whole cache is one JSON object (row id -> field patch) stored under a
//! single well-known key in a small SQLite key/value table. It is read on
//! every grid load and written on every edit attempt.
//!
//! IMPORTANT: The store is user-local. It holds client-side input that the
//! backend has not acknowledged; deleting it loses those edits.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use crate::entities::milestone::{RowId, RowPatch};

/// Key under which the override map is stored
pub const OVERRIDES_KEY: &str = "milestones_grid_overrides_v1";

/// Row id -> pending patch
pub type OverrideMap = BTreeMap<String, RowPatch>;

#[derive(Debug, Error)]
pub enum OverrideError {
    #[error("override store error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("override store IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode overrides: {0}")]
    Encode(#[from] serde_json::Error),
}

/// SQLite-backed override cache
pub struct OverrideCache {
    conn: Connection,
}

impl OverrideCache {
    /// Open or create the store at `path`
    pub fn open(path: &Path) -> Result<Self, OverrideError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::with_connection(conn)
    }

    /// In-memory store
    pub fn open_in_memory() -> Result<Self, OverrideError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, OverrideError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(Self { conn })
    }

    /// Read the full map. A missing or corrupt entry reads as empty.
    pub fn read(&self) -> OverrideMap {
        let raw: Option<String> = match self
            .conn
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                params![OVERRIDES_KEY],
                |row| row.get(0),
            )
            .optional()
        {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("failed to read overrides: {}", e);
                None
            }
        };

        match raw {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!("discarding unreadable overrides: {}", e);
                OverrideMap::new()
            }),
            None => OverrideMap::new(),
        }
    }

    /// Replace the full map
    pub fn write(&self, map: &OverrideMap) -> Result<(), OverrideError> {
        let json = serde_json::to_string(map)?;
        self.conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![OVERRIDES_KEY, json, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Pending patch for one row
    pub fn get(&self, row_id: &RowId) -> Option<RowPatch> {
        self.read().remove(row_id.as_str())
    }

    /// Merge `patch` into the row's pending patch
    pub fn set_override(&self, row_id: &RowId, patch: RowPatch) -> Result<(), OverrideError> {
        let mut map = self.read();
        map.entry(row_id.to_string()).or_default().extend(patch);
        self.write(&map)
    }

    /// Drop confirmed fields from a row's patch; empty patches are removed
    pub fn confirm_fields(&self, row_id: &RowId, fields: &[&str]) -> Result<(), OverrideError> {
        let mut map = self.read();
        let Some(patch) = map.get_mut(row_id.as_str()) else {
            return Ok(());
        };
        for field in fields {
            patch.remove(*field);
        }
        if patch.is_empty() {
            map.remove(row_id.as_str());
        }
        self.write(&map)
    }

    /// Remove a row's pending patch entirely
    pub fn clear_override(&self, row_id: &RowId) -> Result<(), OverrideError> {
        let mut map = self.read();
        if map.remove(row_id.as_str()).is_some() {
            self.write(&map)?;
        }
        Ok(())
    }

    /// Remove every pending patch
    pub fn clear_all(&self) -> Result<usize, OverrideError> {
        let map = self.read();
        let count = map.len();
        self.write(&OverrideMap::new())?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn patch(pairs: &[(&str, serde_json::Value)]) -> RowPatch {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_empty_store_reads_empty() {
        let cache = OverrideCache::open_in_memory().unwrap();
        assert!(cache.read().is_empty());
        assert!(cache.get(&RowId::from("r1")).is_none());
    }

    #[test]
    fn test_set_override_merges() {
        let cache = OverrideCache::open_in_memory().unwrap();
        let id = RowId::from("r1");
        cache
            .set_override(&id, patch(&[("m1_slab1", json!(true)), ("progress_pct", json!(2))]))
            .unwrap();
        cache
            .set_override(&id, patch(&[("m1_slab2", json!(true)), ("progress_pct", json!(5))]))
            .unwrap();

        let stored = cache.get(&id).unwrap();
        assert_eq!(stored.get("m1_slab1"), Some(&json!(true)));
        assert_eq!(stored.get("m1_slab2"), Some(&json!(true)));
        assert_eq!(stored.get("progress_pct"), Some(&json!(5)));
    }

    #[test]
    fn test_confirm_fields_removes_empty_entry() {
        let cache = OverrideCache::open_in_memory().unwrap();
        let id = RowId::from("r1");
        cache
            .set_override(&id, patch(&[("m1_slab1", json!(true)), ("progress_pct", json!(2))]))
            .unwrap();

        cache.confirm_fields(&id, &["progress_pct"]).unwrap();
        assert_eq!(cache.get(&id).unwrap().len(), 1);

        cache.confirm_fields(&id, &["m1_slab1"]).unwrap();
        assert!(cache.get(&id).is_none());
        assert!(cache.read().is_empty());
    }

    #[test]
    fn test_corrupt_entry_reads_empty() {
        let cache = OverrideCache::open_in_memory().unwrap();
        cache
            .conn
            .execute(
                "INSERT INTO kv (key, value, updated_at) VALUES (?1, 'not json', '')",
                params![OVERRIDES_KEY],
            )
            .unwrap();
        assert!(cache.read().is_empty());
    }

    #[test]
    fn test_persists_across_reopen() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join(".mtrack/state.db");
        let id = RowId::from("r7");
        {
            let cache = OverrideCache::open(&path).unwrap();
            cache.set_override(&id, patch(&[("m5_ups", json!(true))])).unwrap();
        }
        let cache = OverrideCache::open(&path).unwrap();
        assert_eq!(cache.get(&id).unwrap().get("m5_ups"), Some(&json!(true)));

        assert_eq!(cache.clear_all().unwrap(), 1);
        assert!(cache.read().is_empty());
    }
}
