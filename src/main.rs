#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! vbcc — validated `VBoxManage` commands and parsed VirtualBox reports.

mod cli;
mod commands;
mod config;
mod errors;
mod exec;
mod report;
mod schema;
mod types;
mod validate;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, OutputCtx, write_error};
use commands::Session;
use config::Settings;
use errors::CtlError;
use exec::ProcessRunner;
use types::ErrorOutput;

fn main() {
    let cli = Cli::parse();

    let settings = match Settings::resolve(&cli) {
        Ok(s) => s,
        Err(e) => fail(&CtlError::Config(format!("{e:#}")), &cli),
    };
    init_tracing(settings.debug);
    tracing::debug!(?settings, "resolved settings");

    let ctx = OutputCtx::new(cli.output, cli.json, cli.fields.as_deref(), cli.no_header);
    let runner = ProcessRunner::new(settings.program.clone(), settings.timeout());
    let session = Session::new(&runner, settings.tool, cli.dry_run);

    if let Err(err) = commands::dispatch(&cli.command, &session, &ctx) {
        fail(&err, &cli);
    }
}

fn fail(err: &CtlError, cli: &Cli) -> ! {
    tracing::debug!(error = ?err, "command failed");
    write_error(&ErrorOutput::from_error(err), cli.output, cli.json);
    std::process::exit(err.exit_code());
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("vbcc=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
