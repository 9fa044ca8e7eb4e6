//! `mtrack columns` command - Checkpoint catalog

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::checkpoint::checkpoint_count;
use crate::core::MILESTONE_GROUPS;
use crate::entities::milestone::OVERVIEW_COLUMNS;

#[derive(Serialize)]
struct GroupOut {
    name: &'static str,
    checkpoints: Vec<ColumnOut>,
}

#[derive(Serialize)]
struct ColumnOut {
    field: &'static str,
    header: &'static str,
}

pub fn run(global: &GlobalOpts) -> Result<()> {
    match global.format {
        OutputFormat::Json | OutputFormat::Yaml => {
            let groups: Vec<GroupOut> = MILESTONE_GROUPS
                .iter()
                .map(|g| GroupOut {
                    name: g.name,
                    checkpoints: g
                        .checkpoints
                        .iter()
                        .map(|c| ColumnOut {
                            field: c.field,
                            header: c.header,
                        })
                        .collect(),
                })
                .collect();
            if global.format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&groups).into_diagnostic()?);
            } else {
                print!("{}", serde_yml::to_string(&groups).into_diagnostic()?);
            }
        }
        OutputFormat::Id => {
            for group in MILESTONE_GROUPS {
                for cp in group.checkpoints {
                    println!("{}", cp.field);
                }
            }
        }
        _ => {
            println!("{}", style("Project Overview").bold());
            for (field, header) in OVERVIEW_COLUMNS {
                println!("  {:<28} {}", style(field).cyan(), style(header).dim());
            }
            for group in MILESTONE_GROUPS {
                println!();
                println!("{}", style(group.name).bold());
                for cp in group.checkpoints {
                    println!("  {:<28} {}", style(cp.field).cyan(), style(cp.header).dim());
                }
            }
            println!();
            println!(
                "{} checkpoints, equal weight",
                style(checkpoint_count()).cyan()
            );
        }
    }
    Ok(())
}
