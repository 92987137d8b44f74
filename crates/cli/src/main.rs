//! artifetch command-line front end.

#![expect(
    clippy::print_stdout,
    clippy::print_stderr,
    reason = "Commands report results on stdout and failures on stderr"
)]

mod cli;
mod commands;
mod errors;
mod settings;
mod tracing;

use std::process::ExitCode;

use crate::settings::Settings;
use crate::tracing::{TracingConfig, TracingFormat};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("{error:?}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> miette::Result<ExitCode> {
    let cli = cli::parse();

    let format = if cli.global.json {
        TracingFormat::Json
    } else {
        cli.global.log_format
    };
    crate::tracing::init_tracing(&TracingConfig {
        format,
        level: cli.global.level.into(),
    })?;

    let settings = Settings::load(cli.global.config.as_deref())?.merge(cli.global.overrides());
    ::tracing::debug!(
        environment = %settings.environment,
        node = %settings.node_name,
        ssl_verify = settings.ssl_verify,
        "Effective settings"
    );

    commands::execute(cli.command, &settings).await
}
