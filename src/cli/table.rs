//! Table formatting for grid rows
//!
//! Rows are turned into [`TableRow`]s of typed [`CellValue`]s so that every
//! output format (aligned text, CSV, Markdown, ids) shares one column model.

use console::style;

use crate::cli::helpers::{escape_csv, truncate_str};
use crate::cli::OutputFormat;
use crate::core::checkpoint;
use crate::core::progress::RowHealth;
use crate::entities::milestone::{MilestoneRow, OVERVIEW_COLUMNS, PROGRESS_FIELD};

/// A typed cell value with semantic meaning for formatting
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Row id (cyan)
    Id(String),
    /// Plain text, truncated to the column
    Text(String),
    /// Priority select with color coding
    Priority(String),
    /// Checkpoint flag (✓ green, · dim)
    Check(bool),
    /// Completion percentage with color coding
    Progress(Option<u8>),
    /// Row health with color coding
    Health(RowHealth),
    /// Empty/placeholder
    Empty,
}

impl CellValue {
    /// Format for aligned text output (with colors if terminal)
    pub fn format_tsv(&self, width: usize) -> String {
        match self {
            CellValue::Id(id) => format!("{:<width$}", style(id).cyan(), width = width),
            CellValue::Text(s) => {
                let truncated = truncate_str(s, width.saturating_sub(2));
                format!("{:<width$}", truncated, width = width)
            }
            CellValue::Priority(p) => {
                let styled = match p.to_ascii_lowercase().as_str() {
                    "high" => style(p.as_str()).red().bold(),
                    "medium" => style(p.as_str()).yellow(),
                    _ => style(p.as_str()).dim(),
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Check(true) => format!("{:<width$}", style("✓").green(), width = width),
            CellValue::Check(false) => format!("{:<width$}", style("·").dim(), width = width),
            CellValue::Progress(Some(pct)) => {
                let s = format!("{}%", pct);
                let styled = match pct {
                    100 => style(s).green().bold(),
                    50..=99 => style(s).cyan(),
                    1..=49 => style(s).yellow(),
                    _ => style(s).dim(),
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Progress(None) => format!("{:<width$}", "-", width = width),
            CellValue::Health(health) => {
                let s = health.to_string();
                let styled = match health {
                    RowHealth::Complete => style(s).green(),
                    RowHealth::InProgress => style(s).cyan(),
                    RowHealth::OnHold => style(s).yellow(),
                    RowHealth::AtRisk => style(s).red().bold(),
                    RowHealth::NotStarted => style(s).dim(),
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Empty => format!("{:<width$}", "-", width = width),
        }
    }

    /// Format for CSV output (RFC 4180, no colors)
    pub fn format_csv(&self) -> String {
        match self {
            CellValue::Check(b) => b.to_string(),
            CellValue::Empty => String::new(),
            other => escape_csv(&other.raw()),
        }
    }

    /// Format for Markdown output (no colors, escaped pipes)
    pub fn format_md(&self) -> String {
        let raw = match self {
            CellValue::Check(true) => "✓".to_string(),
            CellValue::Check(false) => " ".to_string(),
            CellValue::Progress(None) | CellValue::Empty => "-".to_string(),
            other => other.raw(),
        };
        raw.replace('|', "\\|")
    }

    /// Get raw string value (no formatting)
    pub fn raw(&self) -> String {
        match self {
            CellValue::Id(s) | CellValue::Text(s) | CellValue::Priority(s) => s.clone(),
            CellValue::Check(b) => b.to_string(),
            CellValue::Progress(pct) => pct.map(|p| p.to_string()).unwrap_or_default(),
            CellValue::Health(h) => h.to_string(),
            CellValue::Empty => String::new(),
        }
    }

    /// Display width of this cell's content (for dynamic column sizing)
    pub fn display_width(&self) -> usize {
        match self {
            CellValue::Check(_) => 1,
            CellValue::Progress(Some(p)) => p.to_string().len() + 1,
            CellValue::Progress(None) | CellValue::Empty => 1,
            other => other.raw().chars().count(),
        }
    }
}

/// Column definition with header label and maximum width
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub key: &'static str,
    pub header: &'static str,
    pub width: usize,
}

impl ColumnDef {
    pub const fn new(key: &'static str, header: &'static str, width: usize) -> Self {
        Self { key, header, width }
    }
}

/// Key of the derived health column
pub const HEALTH_COLUMN: &str = "health";

/// Columns shown by `load` when none are requested
pub const DEFAULT_COLUMNS: &[&str] = &[
    "project_id",
    "project_name",
    "branch",
    "priority",
    "site_engineer",
    "ongoing_milestone",
    PROGRESS_FIELD,
    HEALTH_COLUMN,
];

/// Every column a grid table can show: overview, health, progress, checkpoints
pub fn grid_columns() -> Vec<ColumnDef> {
    let mut columns: Vec<ColumnDef> = OVERVIEW_COLUMNS
        .iter()
        .map(|&(key, header)| ColumnDef::new(key, header, 28))
        .collect();
    columns.push(ColumnDef::new("status", "Status", 12));
    columns.push(ColumnDef::new("region", "Region", 14));
    columns.push(ColumnDef::new(PROGRESS_FIELD, "Progress", 9));
    columns.push(ColumnDef::new(HEALTH_COLUMN, "Health", 12));
    columns.extend(
        checkpoint::all_checkpoints().map(|c| ColumnDef::new(c.field, c.field, c.field.len())),
    );
    columns
}

/// Typed cell for one field of a row
pub fn cell_for(row: &MilestoneRow, key: &str) -> CellValue {
    if checkpoint::is_checkpoint(key) {
        return CellValue::Check(row.checkpoint(key));
    }
    match key {
        PROGRESS_FIELD => CellValue::Progress(row.progress_pct),
        HEALTH_COLUMN => CellValue::Health(RowHealth::of(row)),
        "priority" => row
            .priority
            .clone()
            .filter(|p| !p.is_empty())
            .map(CellValue::Priority)
            .unwrap_or(CellValue::Empty),
        other => match row.get_field(other) {
            None | Some(serde_json::Value::Null) => CellValue::Empty,
            Some(serde_json::Value::String(s)) if s.is_empty() => CellValue::Empty,
            Some(serde_json::Value::String(s)) => CellValue::Text(s),
            Some(v) => CellValue::Text(v.to_string()),
        },
    }
}

/// A row of cell values for table output
pub struct TableRow {
    pub id: String,
    pub cells: Vec<(&'static str, CellValue)>,
}

impl TableRow {
    pub fn from_row(row: &MilestoneRow, columns: &[ColumnDef]) -> Self {
        Self {
            id: row.id.to_string(),
            cells: columns.iter().map(|c| (c.key, cell_for(row, c.key))).collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// Table formatter that outputs rows in various formats
pub struct TableFormatter<'a> {
    columns: &'a [ColumnDef],
    show_summary: bool,
}

impl<'a> TableFormatter<'a> {
    pub fn new(columns: &'a [ColumnDef]) -> Self {
        Self {
            columns,
            show_summary: true,
        }
    }

    /// Suppress the trailing row count
    pub fn without_summary(mut self) -> Self {
        self.show_summary = false;
        self
    }

    /// Output rows in the specified format
    pub fn output<I>(&self, rows: I, format: OutputFormat)
    where
        I: IntoIterator<Item = TableRow>,
    {
        let rows: Vec<TableRow> = rows.into_iter().collect();

        match format {
            OutputFormat::Csv => self.output_csv(&rows),
            OutputFormat::Md => self.output_md(&rows),
            OutputFormat::Id => self.output_ids(&rows),
            _ => self.output_tsv(&rows),
        }
    }

    /// Calculate dynamic column widths based on actual content
    fn calculate_widths(&self, rows: &[TableRow]) -> Vec<usize> {
        let id_width = rows
            .iter()
            .map(|r| r.id.len())
            .max()
            .unwrap_or(2)
            .max(2);
        let mut widths = vec![id_width];

        for col in self.columns {
            let max_content = rows
                .iter()
                .filter_map(|r| r.get(col.key))
                .map(|v| v.display_width())
                .max()
                .unwrap_or(0);
            // Headers are never cut; content is capped at the column width
            let width = col.header.len().max(max_content.saturating_add(2).min(col.width));
            widths.push(width);
        }

        widths
    }

    fn output_tsv(&self, rows: &[TableRow]) {
        let widths = self.calculate_widths(rows);

        let mut header_parts = vec![format!(
            "{:<width$}",
            style("ID").bold().dim(),
            width = widths[0]
        )];
        for (col, width) in self.columns.iter().zip(&widths[1..]) {
            header_parts.push(format!("{:<width$}", style(col.header).bold(), width = *width));
        }
        println!("{}", header_parts.join(" "));

        let total_width: usize = widths.iter().sum::<usize>() + widths.len() - 1;
        println!("{}", "-".repeat(total_width));

        for row in rows {
            let mut parts = vec![CellValue::Id(row.id.clone()).format_tsv(widths[0])];
            for (col, width) in self.columns.iter().zip(&widths[1..]) {
                parts.push(
                    row.get(col.key)
                        .unwrap_or(&CellValue::Empty)
                        .format_tsv(*width),
                );
            }
            println!("{}", parts.join(" "));
        }

        if self.show_summary {
            println!();
            println!("{} row(s) found", style(rows.len()).cyan());
        }
    }

    fn output_csv(&self, rows: &[TableRow]) {
        let mut headers = vec!["id".to_string()];
        headers.extend(self.columns.iter().map(|c| c.key.to_string()));
        println!("{}", headers.join(","));

        for row in rows {
            let mut values = vec![escape_csv(&row.id)];
            for col in self.columns {
                values.push(row.get(col.key).map(|v| v.format_csv()).unwrap_or_default());
            }
            println!("{}", values.join(","));
        }
    }

    fn output_md(&self, rows: &[TableRow]) {
        let mut headers = vec!["ID".to_string()];
        headers.extend(self.columns.iter().map(|c| c.header.to_string()));
        println!("| {} |", headers.join(" | "));

        let separators: Vec<&str> = headers.iter().map(|_| "---").collect();
        println!("|{}|", separators.join("|"));

        for row in rows {
            let mut values = vec![row.id.clone()];
            for col in self.columns {
                values.push(
                    row.get(col.key)
                        .map(|v| v.format_md())
                        .unwrap_or_else(|| "-".to_string()),
                );
            }
            println!("| {} |", values.join(" | "));
        }
    }

    fn output_ids(&self, rows: &[TableRow]) {
        for row in rows {
            println!("{}", row.id);
        }
    }
}

/// Pick columns by key in the requested order; unknown keys are an error
pub fn select_columns(keys: &[String]) -> Result<Vec<ColumnDef>, String> {
    let all = grid_columns();
    keys.iter()
        .map(|key| {
            all.iter()
                .find(|c| c.key.eq_ignore_ascii_case(key))
                .cloned()
                .ok_or_else(|| format!("unknown column '{}'", key))
        })
        .collect()
}
