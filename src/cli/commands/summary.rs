//! `mtrack summary` command - Progress dashboard across rows

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::Workspace;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::filter::{region_of, status_of};
use crate::core::progress::{group_counts, percent, RowHealth};
use crate::core::{RowFilter, MILESTONE_GROUPS};
use crate::entities::MilestoneRow;

#[derive(clap::Args, Debug)]
pub struct SummaryArgs {
    /// Only rows in this branch/region
    #[arg(long)]
    pub region: Option<String>,

    /// Only rows with this status
    #[arg(long)]
    pub status: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct GroupCompletion {
    pub name: &'static str,
    pub checked: usize,
    pub total: usize,
    pub percent: u8,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub rows: usize,
    pub average_progress: f64,
    pub by_health: BTreeMap<RowHealth, usize>,
    /// Keyed the way `--status` matches
    pub by_status: BTreeMap<String, usize>,
    /// Keyed the way `--region` matches (branch, else region)
    pub by_region: BTreeMap<String, usize>,
    pub groups: Vec<GroupCompletion>,
}

/// Label for rows with no value
const UNSET: &str = "(none)";

/// Count rows per key; keys differing only in ASCII case share the first spelling seen
fn count_by(rows: &[&MilestoneRow], key: fn(&MilestoneRow) -> &str) -> BTreeMap<String, usize> {
    let mut spelling: BTreeMap<String, String> = BTreeMap::new();
    let mut counts = BTreeMap::new();
    for row in rows {
        let raw = match key(row) {
            "" => UNSET,
            value => value,
        };
        let label = spelling
            .entry(raw.to_ascii_lowercase())
            .or_insert_with(|| raw.to_string())
            .clone();
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

impl Summary {
    pub fn compute(rows: &[&MilestoneRow]) -> Self {
        let total_progress: u64 = rows
            .iter()
            .map(|r| u64::from(r.progress_pct.unwrap_or(0)))
            .sum();
        let average_progress = if rows.is_empty() {
            0.0
        } else {
            total_progress as f64 / rows.len() as f64
        };

        let mut by_health = BTreeMap::new();
        for row in rows {
            *by_health.entry(RowHealth::of(row)).or_insert(0) += 1;
        }

        let groups = MILESTONE_GROUPS
            .iter()
            .map(|group| {
                let (checked, total) = rows.iter().fold((0, 0), |(c, t), row| {
                    let (rc, rt) = group_counts(row, group);
                    (c + rc, t + rt)
                });
                GroupCompletion {
                    name: group.name,
                    checked,
                    total,
                    percent: percent(checked, total),
                }
            })
            .collect();

        Self {
            rows: rows.len(),
            average_progress,
            by_health,
            by_status: count_by(rows, status_of),
            by_region: count_by(rows, region_of),
            groups,
        }
    }
}

pub fn run(args: SummaryArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = Workspace::open(global)?;
    let grid = workspace.load_grid(global)?;
    let filter = RowFilter {
        search: None,
        status: args.status,
        region: args.region,
    };
    let summary = Summary::compute(&grid.filtered(&filter));

    match workspace.format(global, OutputFormat::Auto) {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summary).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&summary).into_diagnostic()?);
        }
        format => print_summary(&summary, format == OutputFormat::Md),
    }
    Ok(())
}

fn print_summary(summary: &Summary, markdown: bool) {
    println!("{}", style("Milestone Summary").bold().underlined());
    println!();
    println!("  {:<18} {}", "Projects:", style(summary.rows).cyan());
    println!(
        "  {:<18} {}",
        "Average progress:",
        style(format!("{:.1}%", summary.average_progress)).cyan()
    );
    for (health, count) in &summary.by_health {
        println!("  {:<18} {}", format!("{}:", health), count);
    }
    println!();

    for (title, counts) in [("By status", &summary.by_status), ("By region", &summary.by_region)] {
        if counts.is_empty() {
            continue;
        }
        println!("{}", style(title).bold());
        for (label, count) in counts {
            println!("  {:<18} {}", format!("{}:", label), count);
        }
        println!();
    }

    let mut builder = Builder::default();
    builder.push_record(["Milestone", "Checked", "Total", "Complete"]);
    for group in &summary.groups {
        builder.push_record([
            group.name.to_string(),
            group.checked.to_string(),
            group.total.to_string(),
            format!("{}%", group.percent),
        ]);
    }
    let mut table = builder.build();
    if markdown {
        table.with(Style::markdown());
    } else {
        table.with(Style::rounded());
    }
    println!("{}", table);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: serde_json::Value) -> MilestoneRow {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_summary_counts() {
        let a = row(json!({
            "id": "1",
            "m1_slab1": true, "m1_slab2": true, "m1_slab3": true, "m1_slab4": true,
            "progress_pct": 9
        }));
        let b = row(json!({ "id": "2", "status": "On Hold", "m1_slab1": true, "progress_pct": 0 }));
        let summary = Summary::compute(&[&a, &b]);

        assert_eq!(summary.rows, 2);
        assert!((summary.average_progress - 4.5).abs() < f64::EPSILON);
        assert_eq!(summary.by_health.get(&RowHealth::InProgress), Some(&1));
        assert_eq!(summary.by_health.get(&RowHealth::OnHold), Some(&1));

        let slab = summary
            .groups
            .iter()
            .find(|g| g.name == "Milestone 1 - Slab Conduits")
            .unwrap();
        assert_eq!((slab.checked, slab.total, slab.percent), (5, 8, 63));
    }

    #[test]
    fn test_summary_status_and_region_breakdowns() {
        let rows = [
            row(json!({ "id": "1", "status": "Active", "branch": "Bengaluru", "region": "South" })),
            row(json!({ "id": "2", "status": "active", "branch": "", "region": "South" })),
            row(json!({ "id": "3", "status": "On Hold", "region": "bengaluru" })),
            row(json!({ "id": "4" })),
        ];
        let refs: Vec<&MilestoneRow> = rows.iter().collect();
        let summary = Summary::compute(&refs);

        let by_status: Vec<(&str, usize)> =
            summary.by_status.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        assert_eq!(by_status, vec![("(none)", 1), ("Active", 2), ("On Hold", 1)]);

        // Branch wins over region; an empty branch falls back
        let by_region: Vec<(&str, usize)> =
            summary.by_region.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        assert_eq!(by_region, vec![("(none)", 1), ("Bengaluru", 2), ("South", 1)]);

        // Each bucket is exactly what the matching filter selects
        let filtered = RowFilter::default().with_region("BENGALURU").apply(&rows);
        assert_eq!(filtered.len(), summary.by_region["Bengaluru"]);
        let filtered = RowFilter::default().with_status("ACTIVE").apply(&rows);
        assert_eq!(filtered.len(), summary.by_status["Active"]);
    }

    #[test]
    fn test_summary_empty() {
        let summary = Summary::compute(&[]);
        assert!(summary.by_status.is_empty());
        assert!(summary.by_region.is_empty());
        assert_eq!(summary.rows, 0);
        assert_eq!(summary.average_progress, 0.0);
        assert!(summary.groups.iter().all(|g| g.percent == 0));
    }
}
