//! Remote milestone store
//!
//! The grid talks to its backing store through [`MilestoneStore`]. The
//! production implementation is [`HttpStore`], a thin blocking client for the
//! backend's `/api/milestones-grid` endpoints; [`MemoryStore`] keeps rows in
//! process and can be told to fail, which is how offline behaviour is tested.

use std::cell::{Cell, RefCell};
use std::time::Duration;

use serde_json::{json, Value};
use thiserror::Error;

use crate::entities::milestone::{MilestoneRow, NewRow, RowId};

/// Grid resource path relative to the API base URL
const GRID_PATH: &str = "/api/milestones-grid";

/// Errors from remote store calls
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not reach {url}: {message}")]
    Transport { url: String, message: String },

    #[error("server returned {code}{}", format_detail(.detail))]
    Status { code: u16, detail: Option<String> },

    #[error("unexpected response body: {0}")]
    Decode(String),
}

fn format_detail(detail: &Option<String>) -> String {
    detail.as_ref().map(|d| format!(": {}", d)).unwrap_or_default()
}

impl StoreError {
    /// Server-provided detail message, if any
    pub fn detail(&self) -> Option<&str> {
        match self {
            StoreError::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

/// Percent-encode one URL path segment, keeping only RFC 3986 unreserved bytes
fn encode_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Operations the grid needs from its backing store
pub trait MilestoneStore {
    /// Fetch every grid row
    fn fetch_rows(&self) -> Result<Vec<MilestoneRow>, StoreError>;

    /// Create one row from a partial field set
    fn create_row(&self, row: &NewRow) -> Result<(), StoreError>;

    /// Update a single named field on one row
    fn update_cell(&self, id: &RowId, field: &str, value: &Value) -> Result<(), StoreError>;

    /// Delete one row
    fn delete_row(&self, id: &RowId) -> Result<(), StoreError>;
}

/// Blocking HTTP client for the backend REST API
pub struct HttpStore {
    agent: ureq::Agent,
    base_url: String,
    token: Option<String>,
}

impl HttpStore {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn collection_url(&self) -> String {
        format!("{}{}", self.base_url, GRID_PATH)
    }

    fn row_url(&self, id: &RowId) -> String {
        format!("{}{}/{}", self.base_url, GRID_PATH, encode_segment(id.as_str()))
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        tracing::debug!(%method, %url, "store request");
        let req = self.agent.request(method, url);
        match &self.token {
            Some(token) => req.set("Authorization", &format!("Bearer {}", token)),
            None => req,
        }
    }

    fn map_error(url: &str, err: ureq::Error) -> StoreError {
        match err {
            ureq::Error::Status(code, response) => {
                let detail = response
                    .into_json::<Value>()
                    .ok()
                    .and_then(|body| body.get("detail").cloned())
                    .map(|d| match d {
                        Value::String(s) => s,
                        other => other.to_string(),
                    });
                StoreError::Status { code, detail }
            }
            ureq::Error::Transport(t) => StoreError::Transport {
                url: url.to_string(),
                message: t.to_string(),
            },
        }
    }
}

impl MilestoneStore for HttpStore {
    fn fetch_rows(&self) -> Result<Vec<MilestoneRow>, StoreError> {
        let url = self.collection_url();
        let response = self
            .request("GET", &url)
            .call()
            .map_err(|e| Self::map_error(&url, e))?;
        // A null body is treated as an empty grid
        let rows: Option<Vec<MilestoneRow>> = response
            .into_json()
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(rows.unwrap_or_default())
    }

    fn create_row(&self, row: &NewRow) -> Result<(), StoreError> {
        let url = self.collection_url();
        self.request("POST", &url)
            .send_json(row)
            .map_err(|e| Self::map_error(&url, e))?;
        Ok(())
    }

    fn update_cell(&self, id: &RowId, field: &str, value: &Value) -> Result<(), StoreError> {
        let url = self.row_url(id);
        self.request("PUT", &url)
            .send_json(json!({ "field": field, "value": value }))
            .map_err(|e| Self::map_error(&url, e))?;
        Ok(())
    }

    fn delete_row(&self, id: &RowId) -> Result<(), StoreError> {
        let url = self.row_url(id);
        self.request("DELETE", &url)
            .call()
            .map_err(|e| Self::map_error(&url, e))?;
        Ok(())
    }
}

/// In-process store with switchable failures
#[derive(Default)]
pub struct MemoryStore {
    rows: RefCell<Vec<MilestoneRow>>,
    next_id: Cell<u64>,
    fail_fetch: Cell<bool>,
    fail_writes: Cell<bool>,
    fail_delete: Cell<Option<String>>,
    writes: RefCell<Vec<(RowId, String, Value)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<MilestoneRow>) -> Self {
        let store = Self::new();
        store.next_id.set(rows.len() as u64);
        *store.rows.borrow_mut() = rows;
        store
    }

    /// Make `fetch_rows` fail with a transport error
    pub fn set_fail_fetch(&self, fail: bool) {
        self.fail_fetch.set(fail);
    }

    /// Make `create_row` and `update_cell` fail with a transport error
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Make `delete_row` fail with a 400 carrying `detail`
    pub fn set_fail_delete(&self, detail: Option<&str>) {
        self.fail_delete.set(detail.map(String::from));
    }

    /// Snapshot of stored rows
    pub fn rows(&self) -> Vec<MilestoneRow> {
        self.rows.borrow().clone()
    }

    /// Stored row by id
    pub fn row(&self, id: &RowId) -> Option<MilestoneRow> {
        self.rows.borrow().iter().find(|r| &r.id == id).cloned()
    }

    /// Every successful `update_cell` call, in order
    pub fn writes(&self) -> Vec<(RowId, String, Value)> {
        self.writes.borrow().clone()
    }

    fn offline() -> StoreError {
        StoreError::Transport {
            url: "memory://".to_string(),
            message: "store offline".to_string(),
        }
    }
}

impl MilestoneStore for MemoryStore {
    fn fetch_rows(&self) -> Result<Vec<MilestoneRow>, StoreError> {
        if self.fail_fetch.get() {
            return Err(Self::offline());
        }
        Ok(self.rows())
    }

    fn create_row(&self, row: &NewRow) -> Result<(), StoreError> {
        if self.fail_writes.get() {
            return Err(Self::offline());
        }
        let id = self.next_id.get() + 1;
        self.next_id.set(id);

        let fields = serde_json::to_value(row).map_err(|e| StoreError::Decode(e.to_string()))?;
        let mut created = MilestoneRow::new(RowId::new(id.to_string()));
        if let Value::Object(map) = fields {
            for (field, value) in map {
                created
                    .set_field(&field, value)
                    .map_err(|e| StoreError::Decode(e.to_string()))?;
            }
        }
        self.rows.borrow_mut().push(created);
        Ok(())
    }

    fn update_cell(&self, id: &RowId, field: &str, value: &Value) -> Result<(), StoreError> {
        if self.fail_writes.get() {
            return Err(Self::offline());
        }
        let mut rows = self.rows.borrow_mut();
        let row = rows
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or(StoreError::Status {
                code: 404,
                detail: Some("Row not found".to_string()),
            })?;
        row.set_field(field, value.clone())
            .map_err(|e| StoreError::Status {
                code: 422,
                detail: Some(e.to_string()),
            })?;
        self.writes
            .borrow_mut()
            .push((id.clone(), field.to_string(), value.clone()));
        Ok(())
    }

    fn delete_row(&self, id: &RowId) -> Result<(), StoreError> {
        if let Some(detail) = self.fail_delete.take() {
            self.fail_delete.set(Some(detail.clone()));
            return Err(StoreError::Status {
                code: 400,
                detail: Some(detail),
            });
        }
        let mut rows = self.rows.borrow_mut();
        let before = rows.len();
        rows.retain(|r| &r.id != id);
        if rows.len() == before {
            return Err(StoreError::Status {
                code: 404,
                detail: None,
            });
        }
        Ok(())
    }
}
