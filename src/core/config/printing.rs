use crate::core::config::data::{path_display, Config};
use std::path::Path;

impl Config {
    /// The effective configuration as TOML, every default spelled out.
    ///
    /// `output_dir` stays commented out when unset, since its default depends on
    /// the directory the command runs in.
    pub fn effective_toml(&self, source: &Path) -> Result<String, toml::ser::Error> {
        let body = toml::to_string_pretty(&self.with_defaults_filled())?;
        let mut out = format!("# Effective configuration ({})\n", path_display(source));
        if self.output_dir.is_none() {
            out.push_str("# output_dir = \".\"\n");
        }
        out.push_str(&body);
        Ok(out)
    }
}
