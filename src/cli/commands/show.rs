//! `mtrack show` command - One row with every checkpoint

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{resolve_row, Workspace};
use crate::cli::table::{cell_for, CellValue, HEALTH_COLUMN};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::progress::{group_counts, percent, RowHealth};
use crate::core::MILESTONE_GROUPS;
use crate::entities::milestone::{MilestoneRow, OVERVIEW_COLUMNS, PROGRESS_FIELD};

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Row id or project id (e.g. TAPL004)
    pub row: String,
}

pub fn run(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = Workspace::open(global)?;
    let grid = workspace.load_grid(global)?;
    let id = resolve_row(&grid, &args.row)?;
    let row = grid
        .row(&id)
        .ok_or_else(|| miette::miette!("No row matches '{}'", args.row))?;

    match workspace.format(global, OutputFormat::Auto) {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(row).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(row).into_diagnostic()?);
        }
        OutputFormat::Id => println!("{}", row.id),
        _ => print_row(row),
    }
    Ok(())
}

fn print_row(row: &MilestoneRow) {
    println!(
        "{} {}  {}",
        style(row.label()).cyan().bold(),
        row.project_name.as_deref().unwrap_or(""),
        style(format!("(row {})", row.id)).dim()
    );
    println!(
        "  {} {}  {}",
        style("Progress:").bold(),
        cell_for(row, PROGRESS_FIELD).format_tsv(5),
        cell_for(row, HEALTH_COLUMN).format_tsv(0)
    );
    println!();

    for &(field, header) in OVERVIEW_COLUMNS.iter().skip(2) {
        let value = match cell_for(row, field) {
            CellValue::Empty => style("-".to_string()).dim(),
            other => style(other.raw()),
        };
        println!("  {:<30} {}", style(header).dim(), value);
    }
    if let Some(status) = row.status.as_deref().filter(|s| !s.is_empty()) {
        println!("  {:<30} {}", style("Status").dim(), status);
    }
    println!();

    for group in MILESTONE_GROUPS {
        let (checked, total) = group_counts(row, group);
        let summary = format!("{}/{} ({}%)", checked, total, percent(checked, total));
        let summary = if checked == total {
            style(summary).green()
        } else {
            style(summary).dim()
        };
        println!("{} {}", style(group.name).bold(), summary);
        for cp in group.checkpoints {
            let mark = if row.checkpoint(cp.field) {
                style("✓").green()
            } else {
                style("·").dim()
            };
            println!(
                "  {} {:<24} {}",
                mark,
                cp.field,
                style(cp.header).dim()
            );
        }
    }

    if RowHealth::of(row) == RowHealth::Complete {
        println!();
        println!("{} All checkpoints complete", style("✓").green());
    }
}
