//! `mtrack delete` command - Remove a row

use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm};
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{resolve_row, Workspace};
use crate::cli::GlobalOpts;
use crate::core::{GridError, StoreError};

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Row id or project id
    pub row: String,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = Workspace::open(global)?;
    let mut grid = workspace.load_grid(global)?;
    let id = resolve_row(&grid, &args.row)?;
    let label = grid.row(&id).map(|r| r.label()).unwrap_or_else(|| id.to_string());

    if !args.yes {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Delete {}? This cannot be undone", label))
            .default(false)
            .interact()
            .into_diagnostic()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    match grid.delete_row(&id) {
        Ok(_) => {
            println!("{} Deleted {}", style("✓").green(), style(&label).cyan());
            Ok(())
        }
        Err(GridError::Store(e)) => Err(miette::miette!("{}", failure_message(&e))),
        Err(e) => Err(miette::miette!("{}", e)),
    }
}

/// Backend detail first, then the error itself, then a generic message
fn failure_message(err: &StoreError) -> String {
    let message = err
        .detail()
        .map(str::to_string)
        .unwrap_or_else(|| err.to_string());
    if message.trim().is_empty() {
        "Failed to delete".to_string()
    } else {
        message
    }
}
