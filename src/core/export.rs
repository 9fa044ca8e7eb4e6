//! CSV export of the visible grid

use std::io::Write;

use serde_json::Value;
use thiserror::Error;

use crate::core::checkpoint;
use crate::entities::milestone::{MilestoneRow, OVERVIEW_COLUMNS, PROGRESS_FIELD};

/// Default export file name
pub const DEFAULT_EXPORT_FILE: &str = "milestones-export.csv";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One exported column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportColumn {
    pub field: &'static str,
    pub header: &'static str,
}

/// Export columns in grid order: overview, every checkpoint, progress
pub fn export_columns() -> Vec<ExportColumn> {
    let overview = OVERVIEW_COLUMNS
        .iter()
        .map(|&(field, header)| ExportColumn { field, header });
    let checkpoints = checkpoint::all_checkpoints().map(|c| ExportColumn {
        field: c.field,
        header: c.header,
    });
    overview
        .chain(checkpoints)
        .chain(std::iter::once(ExportColumn {
            field: PROGRESS_FIELD,
            header: "Progress %",
        }))
        .collect()
}

fn cell_text(row: &MilestoneRow, field: &str) -> String {
    if checkpoint::is_checkpoint(field) {
        return row.checkpoint(field).to_string();
    }
    match row.get_field(field) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    }
}

/// Write the header and one record per row; returns the number of rows written.
///
/// Values containing the delimiter, quotes or newlines are quoted.
pub fn write_csv<'a, W, I>(rows: I, writer: W) -> Result<usize, ExportError>
where
    W: Write,
    I: IntoIterator<Item = &'a MilestoneRow>,
{
    let columns = export_columns();
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(columns.iter().map(|c| c.header))?;

    let mut count = 0;
    for row in rows {
        wtr.write_record(columns.iter().map(|c| cell_text(row, c.field)))?;
        count += 1;
    }
    wtr.flush()?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> MilestoneRow {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_columns_cover_grid() {
        let columns = export_columns();
        assert_eq!(
            columns.len(),
            OVERVIEW_COLUMNS.len() + checkpoint::checkpoint_count() + 1
        );
        assert_eq!(columns[0].header, "Project ID");
        assert_eq!(columns.last().map(|c| c.header), Some("Progress %"));
    }

    #[test]
    fn test_export_quotes_embedded_delimiters() {
        let rows = vec![row(json!({
            "id": "1",
            "project_id": "TAPL001",
            "project_name": "Tower \"A\", Phase 2",
            "immediate_action": "call site\nengineer",
            "m1_slab1": "yes",
            "progress_pct": 2
        }))];

        let mut out = Vec::new();
        let count = write_csv(&rows, &mut out).unwrap();
        assert_eq!(count, 1);

        let mut rdr = csv::Reader::from_reader(out.as_slice());
        let headers = rdr.headers().unwrap().clone();
        assert_eq!(headers.len(), export_columns().len());
        assert_eq!(&headers[4], "Sales Team");

        let record = rdr.records().next().unwrap().unwrap();
        assert_eq!(&record[1], "Tower \"A\", Phase 2");
        assert_eq!(&record[5], "call site\nengineer");
        let slab1 = export_columns()
            .iter()
            .position(|c| c.field == "m1_slab1")
            .unwrap();
        assert_eq!(&record[slab1], "true");
        assert_eq!(&record[slab1 + 1], "false");
        assert_eq!(&record[record.len() - 1], "2");
        // Missing fields export as empty
        assert_eq!(&record[3], "");
    }

    #[test]
    fn test_export_empty_writes_header_only() {
        let mut out = Vec::new();
        let count = write_csv(std::iter::empty::<&MilestoneRow>(), &mut out).unwrap();
        assert_eq!(count, 0);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("Project ID,Project Name,"));
    }
}
