//! Shared helper functions for CLI commands
//!
//! Workspace and grid setup, value parsing and string formatting used
//! across command modules.

use clap::ValueEnum;
use console::style;
use miette::Result;
use serde_json::Value;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{Config, Grid, HttpStore, LoadStats, OverrideCache, Project};
use crate::entities::milestone::{RowId, TEXT_FIELDS};

/// Workspace plus its effective configuration
pub struct Workspace {
    pub project: Project,
    pub config: Config,
}

impl Workspace {
    /// Locate the workspace (honouring `--project`) and load its config
    pub fn open(global: &GlobalOpts) -> Result<Self> {
        let project =
            Project::resolve(global.project.as_deref()).map_err(|e| miette::miette!("{}", e))?;
        let config = Config::load_for(Some(&project));
        Ok(Self { project, config })
    }

    /// Open the local override cache
    pub fn overrides(&self) -> Result<OverrideCache> {
        OverrideCache::open(&self.project.state_path()).map_err(|e| miette::miette!("{}", e))
    }

    /// Grid bound to the configured backend, not yet loaded
    pub fn grid(&self) -> Result<Grid<HttpStore>> {
        let api_url = self.config.api_url().map_err(|e| miette::miette!("{}", e))?;
        let store = HttpStore::new(api_url, self.config.token(), self.config.timeout());
        Ok(Grid::new(store, self.overrides()?))
    }

    /// Grid with rows fetched; load notices go to stderr unless quiet
    pub fn load_grid(&self, global: &GlobalOpts) -> Result<Grid<HttpStore>> {
        let mut grid = self.grid()?;
        let stats = grid
            .load()
            .map_err(|e| miette::miette!("Failed to load milestones: {}", e))?;
        if !global.quiet {
            report_load(&stats);
        }
        Ok(grid)
    }

    /// Output format: explicit flag, then configured default, then `fallback`
    pub fn format(&self, global: &GlobalOpts, fallback: OutputFormat) -> OutputFormat {
        resolve_format(global.format, self.config.default_format.as_deref(), fallback)
    }
}

fn report_load(stats: &LoadStats) {
    if stats.replayed > 0 {
        eprintln!(
            "{} Saved {} pending edit(s) from earlier sessions",
            style("✓").green(),
            stats.replayed
        );
    }
    if stats.pending > 0 {
        eprintln!(
            "{} {} edit(s) are still not saved; they are shown locally and retried on the next load",
            style("!").yellow(),
            stats.pending
        );
    }
    if stats.corrected > 0 {
        tracing::info!(rows = stats.corrected, "corrected stale progress");
    }
}

pub fn resolve_format(
    flag: OutputFormat,
    configured: Option<&str>,
    fallback: OutputFormat,
) -> OutputFormat {
    if flag != OutputFormat::Auto {
        return flag;
    }
    match configured.map(|s| OutputFormat::from_str(s, true)) {
        Some(Ok(f)) if f != OutputFormat::Auto => f,
        Some(Err(_)) => {
            tracing::warn!(value = ?configured, "ignoring unknown default_format");
            fallback
        }
        _ => fallback,
    }
}

/// Resolve a row argument (row id or project id) against a loaded grid
pub fn resolve_row(grid: &Grid<HttpStore>, key: &str) -> Result<RowId> {
    grid.find(key)
        .map(|r| r.id.clone())
        .ok_or_else(|| miette::miette!("No row matches '{}'", key))
}

/// Interpret a command-line cell value.
///
/// Descriptive fields take the text verbatim; other fields accept JSON
/// (`true`, `1`, `null`) and fall back to a plain string.
pub fn parse_cell_value(field: &str, raw: &str) -> Value {
    if TEXT_FIELDS.contains(&field) {
        return Value::String(raw.to_string());
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Escape a string for CSV output
///
/// Handles commas, quotes, and newlines according to RFC 4180.
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("short", 10), "short");
        assert_eq!(truncate_str("Tower A Phase 2", 10), "Tower A...");
        assert_eq!(truncate_str("Bengaluru Ré", 8), "Benga...");
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("with,comma"), "\"with,comma\"");
        assert_eq!(escape_csv("with\"quote"), "\"with\"\"quote\"");
    }

    #[test]
    fn test_parse_cell_value() {
        assert_eq!(parse_cell_value("m1_slab1", "true"), json!(true));
        assert_eq!(parse_cell_value("m1_slab1", "yes"), json!("yes"));
        assert_eq!(parse_cell_value("m1_slab1", "1"), json!(1));
        assert_eq!(parse_cell_value("owner", "123"), json!("123"));
        assert_eq!(parse_cell_value("owner", "true"), json!("true"));
    }

    #[test]
    fn test_resolve_format() {
        use OutputFormat::*;
        assert_eq!(resolve_format(Json, Some("csv"), Tsv), Json);
        assert_eq!(resolve_format(Auto, Some("csv"), Tsv), Csv);
        assert_eq!(resolve_format(Auto, Some("MD"), Tsv), Md);
        assert_eq!(resolve_format(Auto, Some("bogus"), Tsv), Tsv);
        assert_eq!(resolve_format(Auto, None, Yaml), Yaml);
    }
}
