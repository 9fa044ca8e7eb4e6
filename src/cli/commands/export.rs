//! `mtrack export` command - Write visible rows to CSV

use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use crate::cli::helpers::Workspace;
use crate::cli::GlobalOpts;
use crate::core::export::{write_csv, DEFAULT_EXPORT_FILE};
use crate::core::RowFilter;

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// Output file ("-" for stdout)
    #[arg(long, short = 'o', default_value = DEFAULT_EXPORT_FILE)]
    pub output: PathBuf,

    /// Export only rows matching this search
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Export only rows with this status
    #[arg(long)]
    pub status: Option<String>,

    /// Export only rows in this branch/region
    #[arg(long)]
    pub region: Option<String>,
}

pub fn run(args: ExportArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = Workspace::open(global)?;
    let grid = workspace.load_grid(global)?;
    let filter = RowFilter {
        search: args.search,
        status: args.status,
        region: args.region,
    };
    let rows = grid.filtered(&filter);

    if args.output.as_os_str() == "-" {
        write_csv(rows, std::io::stdout().lock()).map_err(|e| miette::miette!("{}", e))?;
        return Ok(());
    }

    let file = File::create(&args.output).into_diagnostic()?;
    let count = write_csv(rows, BufWriter::new(file)).map_err(|e| miette::miette!("{}", e))?;
    if !global.quiet {
        println!(
            "{} Exported {} row(s) to {}",
            style("✓").green(),
            style(count).cyan(),
            style(args.output.display()).cyan()
        );
    }
    Ok(())
}
