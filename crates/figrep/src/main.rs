mod cli;
mod commands;
mod context;
mod mailer;
mod output;
mod scheduler;

use clap::Parser;
use cli::{Cli, Command};
use libfigrep_core::FigrepError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    let result = run_command(&cli);

    if let Err(e) = result {
        output::emit_error(&cli, &e);
        std::process::exit(e.exit_code());
    }
}

/// Logs go to stderr so stdout stays parseable with --json
fn init_logging(cli: &Cli) {
    let level = if cli.quiet { "warn" } else { cli.log_level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn run_command(cli: &Cli) -> Result<(), FigrepError> {
    match &cli.command {
        Command::Export { output, format, strict } => commands::export::run(cli, output.clone(), *format, *strict),
        Command::Send { strict } => commands::send::run(cli, *strict),
        Command::Schedule { once } => commands::schedule::run(cli, *once),
        Command::Check => commands::check::run(cli),
        Command::Fields => commands::fields::run(cli),
    }
}
