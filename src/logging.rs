//! Diagnostic logging setup.
//!
//! Library code only emits `tracing` events; the binary decides where they go.
//! By default only warnings reach stderr. `-v` shows the extraction steps, `-vv`
//! also shows every skipped chunk and abandoned scan start.

use std::error::Error;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Environment variable checked before `RUST_LOG`.
pub const LOG_ENV_VAR: &str = "CARDPEEK_LOG";

const DEFAULT_DIRECTIVE: &str = "warn";

/// Pick the filter directive: command-line verbosity wins over the environment.
pub fn filter_directive(verbosity: u8, from_env: Option<String>) -> String {
    match verbosity {
        0 => from_env
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DIRECTIVE.to_string()),
        1 => "warn,cardpeek=debug".to_string(),
        _ => "info,cardpeek=trace".to_string(),
    }
}

fn env_directive() -> Option<String> {
    std::env::var(LOG_ENV_VAR)
        .ok()
        .or_else(|| std::env::var("RUST_LOG").ok())
}

/// Install the global subscriber, writing to `log_file` (appending) or stderr.
pub fn init(
    verbosity: u8,
    log_file: Option<&Path>,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let directive = filter_directive(verbosity, env_directive());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()?;
        }
        None => builder.with_writer(std::io::stderr).try_init()?,
    }

    Ok(())
}
