//! todosync CLI entry point.

use clap::Parser;
use std::process::ExitCode;
use todosync::cli::commands;
use todosync::cli::{Cli, Commands};
use todosync::error::Error;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.dry_run {
        todosync::DRY_RUN.store(true, std::sync::atomic::Ordering::Relaxed);
    }
    if cli.no_color {
        colored::control::set_override(false);
    }

    // Set up tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                eprintln!("{}", e.to_structured_json());
            } else if !cli.quiet {
                if let Some(hint) = e.hint() {
                    eprintln!("Error: {e}\n  Hint: {hint}");
                } else {
                    eprintln!("Error: {e}");
                }
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    // Honor RUST_LOG if set, otherwise use verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug,hyper=info,reqwest=info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: &Cli) -> Result<(), Error> {
    let json = cli.json;
    match &cli.command {
        Commands::Sync(args) => commands::sync::execute(args, json),
        Commands::Scan(args) => commands::scan::execute(args, json),
        Commands::Status(args) => commands::status::execute(args, json),
        Commands::Id {
            location,
            line,
            text,
        } => commands::id::execute(location, *line, text, json),
        Commands::Completions { shell } => commands::completions::execute(shell),
        Commands::Version => commands::version::execute(json),
    }
}
