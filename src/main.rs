mod api;
mod charts;
mod cli;
mod csv_export;
mod error;
mod fmt;
mod models;
mod reports;
mod settings;
mod tui;
mod viewer;

use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::path::Path;

use clap::Parser;
use env_logger::Target;

use cli::{Cli, Commands, ConfigCommands, Session};

fn init_logging(verbose: u8, target: Target) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .target(target)
        .init();
}

/// Logs go to stderr, except under the interactive viewer, where stderr is
/// the screen being drawn. There they are appended to `log_file`, or dropped
/// if it cannot be opened.
fn log_target(interactive: bool, log_file: &Path) -> Target {
    if !interactive {
        return Target::Stderr;
    }
    if let Some(dir) = log_file.parent() {
        let _ = std::fs::create_dir_all(dir);
    }
    match OpenOptions::new().create(true).append(true).open(log_file) {
        Ok(file) => Target::Pipe(Box::new(file)),
        Err(_) => Target::Pipe(Box::new(std::io::sink())),
    }
}

fn main() {
    let cli = Cli::parse();
    let interactive = matches!(cli.command, Commands::View { .. }) && std::io::stdout().is_terminal();
    init_logging(cli.verbose, log_target(interactive, &settings::log_path()));

    let session = || Session::new(cli.api_url.as_deref(), &cli.today);

    let result = match cli.command {
        Commands::View { kind, page, tab } => {
            session().and_then(|s| cli::report::view(&s, kind, page, tab))
        }
        Commands::Report { kind, page, tab } => {
            session().and_then(|s| cli::report::run(&s, kind, page, tab))
        }
        Commands::Export {
            kind,
            page,
            tab,
            output,
        } => session().and_then(|s| cli::export::run(&s, kind, page, tab, output)),
        Commands::Charts { page, output } => {
            session().and_then(|s| cli::charts::run(&s, page, output))
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => cli::config::show(),
            ConfigCommands::Set {
                api_url,
                export_dir,
                page_size,
                timeout_secs,
            } => cli::config::set(api_url, export_dir, page_size, timeout_secs),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
