use clap::Parser;
use miette::Result;
use mtrack::cli::commands;
use mtrack::cli::{Cli, Commands};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) so piping to
    // `head` or `grep -q` does not panic on a broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    init_tracing(global.verbose);

    match cli.command {
        Commands::Init(args) => commands::init::run(args),
        Commands::Load(args) => commands::load::run(args, &global),
        Commands::Show(args) => commands::show::run(args, &global),
        Commands::Set(args) => commands::edit::run_set(args, &global),
        Commands::Toggle(args) => commands::edit::run_toggle(args, &global),
        Commands::Add(args) => commands::add::run(args, &global),
        Commands::Delete(args) => commands::delete::run(args, &global),
        Commands::Export(args) => commands::export::run(args, &global),
        Commands::Summary(args) => commands::summary::run(args, &global),
        Commands::Columns => commands::columns::run(&global),
        Commands::Overrides(cmd) => commands::overrides::run(cmd, &global),
        Commands::Config(cmd) => commands::config::run(cmd, &global),
        Commands::Completions(args) => commands::completions::run(args),
    }
}

/// Diagnostics go to stderr; RUST_LOG wins over `--verbose`
fn init_tracing(verbose: bool) {
    let default = if verbose { "warn,mtrack=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}
