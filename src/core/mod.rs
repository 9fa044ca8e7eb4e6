//! Core module - grid engine, persistence and workspace plumbing

pub mod checkpoint;
pub mod config;
pub mod export;
pub mod filter;
pub mod grid;
pub mod overrides;
pub mod progress;
pub mod project;
pub mod store;

pub use checkpoint::{Checkpoint, MilestoneGroup, MILESTONE_GROUPS};
pub use config::{Config, ConfigError};
pub use export::{write_csv, ExportError};
pub use filter::RowFilter;
pub use grid::{EditResult, Grid, GridError, LoadStats, SaveOutcome};
pub use overrides::{OverrideCache, OverrideError};
pub use progress::{calculate_progress, RowHealth};
pub use project::{Project, ProjectError};
pub use store::{HttpStore, MemoryStore, MilestoneStore, StoreError};
