//! `mtrack overrides` command - Edits waiting to be saved

use clap::Subcommand;
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm};
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{escape_csv, Workspace};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::entities::RowId;

#[derive(Subcommand, Debug)]
pub enum OverridesCommands {
    /// List pending edits per row
    List,

    /// Discard pending edits
    Clear(ClearArgs),
}

#[derive(clap::Args, Debug)]
pub struct ClearArgs {
    /// Only discard edits for this row id
    pub row: Option<String>,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(cmd: OverridesCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        OverridesCommands::List => run_list(global),
        OverridesCommands::Clear(args) => run_clear(args, global),
    }
}

fn run_list(global: &GlobalOpts) -> Result<()> {
    let workspace = Workspace::open(global)?;
    let pending = workspace.overrides()?.read();

    match workspace.format(global, OutputFormat::Tsv) {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&pending).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&pending).into_diagnostic()?);
        }
        OutputFormat::Id => {
            for row_id in pending.keys() {
                println!("{}", row_id);
            }
        }
        OutputFormat::Csv => {
            println!("row_id,field,value");
            for (row_id, patch) in &pending {
                for (field, value) in patch {
                    println!(
                        "{},{},{}",
                        escape_csv(row_id),
                        escape_csv(field),
                        escape_csv(&value.to_string())
                    );
                }
            }
        }
        _ => {
            if pending.is_empty() {
                println!("{} No pending edits", style("✓").green());
                return Ok(());
            }
            println!(
                "{:<12} {:<28} {}",
                style("ROW").bold(),
                style("FIELD").bold(),
                style("VALUE").bold()
            );
            println!("{}", "-".repeat(52));
            let mut fields = 0;
            for (row_id, patch) in &pending {
                for (field, value) in patch {
                    println!("{:<12} {:<28} {}", style(row_id).cyan(), field, value);
                    fields += 1;
                }
            }
            if !global.quiet {
                println!();
                println!(
                    "{} field(s) on {} row(s) pending. They are retried on every {}.",
                    style(fields).cyan(),
                    style(pending.len()).cyan(),
                    style("mtrack load").yellow()
                );
            }
        }
    }
    Ok(())
}

fn run_clear(args: ClearArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = Workspace::open(global)?;
    let cache = workspace.overrides()?;

    if !args.yes {
        let prompt = match &args.row {
            Some(row) => format!("Discard unsaved edits for row {}?", row),
            None => "Discard all unsaved edits?".to_string(),
        };
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(false)
            .interact()
            .into_diagnostic()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    match args.row {
        Some(row) => {
            let id = RowId::new(row);
            if cache.get(&id).is_none() {
                return Err(miette::miette!("No pending edits for row {}", id));
            }
            cache
                .clear_override(&id)
                .map_err(|e| miette::miette!("{}", e))?;
            println!("{} Discarded pending edits for row {}", style("✓").green(), id);
        }
        None => {
            let count = cache.clear_all().map_err(|e| miette::miette!("{}", e))?;
            println!(
                "{} Discarded pending edits for {} row(s)",
                style("✓").green(),
                count
            );
        }
    }
    Ok(())
}
