use clap::Parser;
use shrimp::config::ShellConfig;
use shrimp::errors::ShellError;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing(directive: Option<&str>) {
    let filter = directive
        .and_then(|d| EnvFilter::try_new(d).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let config = ShellConfig::parse();
    init_tracing(config.log.as_deref());

    match shrimp::run_shell(config) {
        Ok(status) => ExitCode::from(status as u8),
        // only startup can fail this far up: mask or SIGCHLD handler setup
        Err(err @ ShellError::Os { .. }) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
