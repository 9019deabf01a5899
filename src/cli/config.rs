use std::error::Error;
use std::path::Path;

use crate::core::config::{Config, ConfigError};

#[derive(Debug, PartialEq, Eq)]
pub enum InitOutcome {
    Written,
    AlreadyExists,
}

pub fn show_config(
    config: &Config,
    source: &Path,
) -> Result<String, Box<dyn Error + Send + Sync>> {
    Ok(config.effective_toml(source)?)
}

/// Write a starter config at `path`, leaving an existing file alone unless `force`.
pub fn init_config(path: &Path, force: bool) -> Result<InitOutcome, ConfigError> {
    if path.exists() && !force {
        return Ok(InitOutcome::AlreadyExists);
    }
    Config::default().with_defaults_filled().save_to_path(path)?;
    Ok(InitOutcome::Written)
}
