//! `mtrack init` command - Initialize a new workspace

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::core::config;
use crate::core::project::{Project, ProjectError};

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: std::path::PathBuf,

    /// Backend base URL to write into the workspace config
    #[arg(long)]
    pub api_url: Option<String>,

    /// Rewrite the workspace config even if .mtrack/ already exists
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    if !path.exists() {
        std::fs::create_dir_all(&path).into_diagnostic()?;
        println!(
            "{} Created directory {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
    }

    let project = if args.force {
        Project::init_force(&path)
    } else {
        Project::init(&path)
    };

    match project {
        Ok(project) => {
            if let Some(url) = &args.api_url {
                write_api_url(&project, url)?;
            }
            println!(
                "{} Initialized mtrack workspace at {}",
                style("✓").green(),
                style(project.root().display()).cyan()
            );
            println!();
            println!("Next steps:");
            if args.api_url.is_none() {
                println!(
                    "  {} Point at your backend",
                    style("mtrack config set api_url <URL>").yellow()
                );
            }
            println!("  {} List the milestone grid", style("mtrack load").yellow());
            println!(
                "  {} Tick a checkpoint",
                style("mtrack toggle <ROW> m1_slab1").yellow()
            );
            Ok(())
        }
        Err(ProjectError::AlreadyExists(path)) => {
            println!(
                "{} mtrack workspace already exists at {}",
                style("!").yellow(),
                style(path.display()).cyan()
            );
            println!();
            println!(
                "Use {} to reinitialize",
                style("mtrack init --force").yellow()
            );
            Ok(())
        }
        Err(e) => Err(miette::miette!("{}", e)),
    }
}

fn write_api_url(project: &Project, url: &str) -> Result<()> {
    let path = project.config_path();
    let content = std::fs::read_to_string(&path).into_diagnostic()?;
    let mut doc: serde_yml::Value =
        serde_yml::from_str(&content).unwrap_or(serde_yml::Value::Null);
    config::set_value(&mut doc, "api_url", url).map_err(|e| miette::miette!("{}", e))?;

    // Keep the commented template below the real setting
    let yaml = serde_yml::to_string(&doc).into_diagnostic()?;
    std::fs::write(&path, format!("{}\n{}", yaml, content)).into_diagnostic()?;
    Ok(())
}
