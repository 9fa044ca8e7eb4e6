//! `mtrack load` command - Fetch the grid and list rows

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::Workspace;
use crate::cli::table::{
    grid_columns, select_columns, ColumnDef, TableFormatter, TableRow, DEFAULT_COLUMNS,
};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::checkpoint;
use crate::core::RowFilter;
use crate::entities::MilestoneRow;

#[derive(clap::Args, Debug)]
pub struct LoadArgs {
    /// Case-insensitive search over project id and project name
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Only rows with this status (exact, case-insensitive)
    #[arg(long)]
    pub status: Option<String>,

    /// Only rows in this branch/region (exact, case-insensitive)
    #[arg(long)]
    pub region: Option<String>,

    /// Columns to show (see `mtrack columns` for checkpoint keys)
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,

    /// Show every checkpoint column after the default columns
    #[arg(long, conflicts_with = "columns")]
    pub checkpoints: bool,

    /// Limit number of rows shown
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Only print the number of matching rows
    #[arg(long)]
    pub count: bool,
}

impl LoadArgs {
    fn filter(&self) -> RowFilter {
        RowFilter {
            search: self.search.clone(),
            status: self.status.clone(),
            region: self.region.clone(),
        }
    }

    fn columns(&self) -> Result<Vec<ColumnDef>> {
        if !self.columns.is_empty() {
            return select_columns(&self.columns).map_err(|e| miette::miette!("{}", e));
        }
        let mut keys: Vec<&str> = DEFAULT_COLUMNS.to_vec();
        if self.checkpoints {
            keys.extend(checkpoint::all_checkpoints().map(|c| c.field));
        }
        let all = grid_columns();
        Ok(keys
            .iter()
            .filter_map(|k| all.iter().find(|c| c.key == *k).cloned())
            .collect())
    }
}

pub fn run(args: LoadArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = Workspace::open(global)?;
    let grid = workspace.load_grid(global)?;
    let columns = args.columns()?;

    let mut rows: Vec<&MilestoneRow> = grid.filtered(&args.filter());
    if let Some(limit) = args.limit {
        rows.truncate(limit);
    }

    if args.count {
        println!("{}", rows.len());
        return Ok(());
    }

    let format = workspace.format(global, OutputFormat::Tsv);

    if rows.is_empty() {
        match format {
            OutputFormat::Json | OutputFormat::Yaml => println!("[]"),
            _ => {
                if !global.quiet {
                    println!("No rows found.");
                    if grid.rows().is_empty() {
                        println!();
                        println!("Create one with: {}", style("mtrack add").yellow());
                    }
                }
            }
        }
        return Ok(());
    }

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&rows).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&rows).into_diagnostic()?;
            print!("{}", yaml);
        }
        _ => {
            let mut formatter = TableFormatter::new(&columns);
            if global.quiet {
                formatter = formatter.without_summary();
            }
            formatter.output(rows.iter().map(|r| TableRow::from_row(r, &columns)), format);
        }
    }

    Ok(())
}
