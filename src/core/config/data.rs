use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::character::scan::ScanLimits;
use crate::character::service::{ExtractOptions, DEFAULT_KEYWORDS};

/// On-disk configuration. Every key is optional; unset keys fall back to the
/// built-in defaults when turned into [`ExtractOptions`].
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Directory that `extract --save` writes into.
    pub output_dir: Option<PathBuf>,
    /// Fall back to scanning raw bytes when no text chunk holds a card.
    pub brute_force: Option<bool>,
    pub scan_window_bytes: Option<usize>,
    pub max_retry_gap: Option<usize>,
    /// Text chunk keywords that carry cards, compared case-insensitively.
    pub keywords: Option<Vec<String>>,
}

pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}

impl Config {
    pub fn extract_options(&self) -> ExtractOptions {
        let defaults = ScanLimits::default();
        let keywords = match &self.keywords {
            Some(keywords) if !keywords.is_empty() => keywords.clone(),
            _ => DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        };

        ExtractOptions {
            keywords,
            brute_force: self.brute_force.unwrap_or(true),
            limits: ScanLimits {
                window_bytes: self.scan_window_bytes.unwrap_or(defaults.window_bytes),
                max_retry_gap: self.max_retry_gap.unwrap_or(defaults.max_retry_gap),
            },
        }
    }

    /// Where saved documents go; the working directory when unset.
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// A copy with every key spelled out, for writing a starter config file.
    pub fn with_defaults_filled(&self) -> Config {
        let options = self.extract_options();
        Config {
            output_dir: self.output_dir.clone(),
            brute_force: Some(options.brute_force),
            scan_window_bytes: Some(options.limits.window_bytes),
            max_retry_gap: Some(options.limits.max_retry_gap),
            keywords: Some(options.keywords),
        }
    }
}
