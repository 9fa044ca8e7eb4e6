//! `mtrack add` command - Create a row with default values

use console::style;
use miette::Result;

use crate::cli::helpers::Workspace;
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(clap::Args, Debug)]
pub struct AddArgs {}

pub fn run(_args: AddArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = Workspace::open(global)?;
    let mut grid = workspace.load_grid(global)?;

    let (display_id, stats) = grid
        .add_row()
        .map_err(|e| miette::miette!("Failed to add row: {}", e))?;

    if workspace.format(global, OutputFormat::Auto) == OutputFormat::Id {
        println!("{}", display_id);
        return Ok(());
    }

    println!(
        "{} Added row {} ({} rows in grid)",
        style("✓").green(),
        style(&display_id).cyan(),
        stats.rows
    );
    if !global.quiet {
        println!(
            "   Fill it in with {}",
            style(format!("mtrack set {} project_name <NAME>", display_id)).yellow()
        );
    }
    Ok(())
}
