//! Entity type definitions
//!
//! - [`MilestoneRow`] - One project's row in the milestone grid
//! - [`NewRow`] - Field set sent when creating a row

pub mod milestone;

pub use milestone::{MilestoneRow, NewRow, RowId, RowPatch};
