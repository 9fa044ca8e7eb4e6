//! `mtrack set` and `mtrack toggle` commands - Cell edits
//!
//! A failed save is not an error for the command: the edit stays in the
//! local override cache and is retried on the next load.

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{parse_cell_value, resolve_row, Workspace};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::checkpoint::find_checkpoint;
use crate::core::{EditResult, SaveOutcome};

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Row id or project id
    pub row: String,

    /// Field key (e.g. owner, priority, m3_wires)
    pub field: String,

    /// New value; checkpoints accept true/false, 1/0, yes/no, on/off
    pub value: String,
}

#[derive(clap::Args, Debug)]
pub struct ToggleArgs {
    /// Row id or project id
    pub row: String,

    /// Checkpoint field key (see `mtrack columns`)
    pub field: String,
}

pub fn run_set(args: SetArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = Workspace::open(global)?;
    let mut grid = workspace.load_grid(global)?;
    let id = resolve_row(&grid, &args.row)?;

    let value = parse_cell_value(&args.field, &args.value);
    let result = grid
        .edit_cell(&id, &args.field, value)
        .map_err(|e| miette::miette!("{}", e))?;
    report(&result, &workspace, global)
}

pub fn run_toggle(args: ToggleArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = Workspace::open(global)?;
    let mut grid = workspace.load_grid(global)?;
    let id = resolve_row(&grid, &args.row)?;

    let result = grid
        .toggle(&id, &args.field)
        .map_err(|e| miette::miette!("{}", e))?;
    report(&result, &workspace, global)
}

fn report(result: &EditResult, workspace: &Workspace, global: &GlobalOpts) -> Result<()> {
    match workspace.format(global, OutputFormat::Auto) {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "row_id": result.row_id,
                "field": result.field,
                "value": result.value,
                "progress_pct": result.progress_pct,
                "saved": result.outcome.is_saved(),
                "error": match &result.outcome {
                    SaveOutcome::SaveFailed(e) => Some(e.to_string()),
                    SaveOutcome::Saved => None,
                },
            });
            println!("{}", serde_json::to_string_pretty(&json).into_diagnostic()?);
            return Ok(());
        }
        OutputFormat::Id => {
            println!("{}", result.row_id);
            return Ok(());
        }
        _ => {}
    }

    let label = find_checkpoint(&result.field)
        .map(|c| c.header)
        .unwrap_or(result.field.as_str());

    match &result.outcome {
        SaveOutcome::Saved => {
            if !global.quiet {
                println!(
                    "{} Saved {} {} {}",
                    style("✓").green(),
                    style(label).cyan(),
                    style("→").dim(),
                    style(&result.value).yellow()
                );
            }
        }
        SaveOutcome::SaveFailed(e) => {
            eprintln!(
                "{} Could not save {}: {}",
                style("!").yellow(),
                style(label).cyan(),
                e
            );
            eprintln!(
                "  {}",
                style("The change is kept locally and will be retried on the next load.").dim()
            );
        }
    }

    if let Some(pct) = result.progress_pct {
        if !global.quiet {
            println!("  {} {}%", style("Progress:").bold(), pct);
        }
    }
    Ok(())
}
