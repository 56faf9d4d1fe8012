use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use framegrab_capture::config;

/// Persistent user settings (`settings.json`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// X display to capture; `None` uses `$DISPLAY`
    #[serde(default)]
    pub display: Option<String>,
    /// Output format used when `--format` is absent and `--output` has no
    /// recognizable extension
    #[serde(default = "default_format")]
    pub format: String,
    /// Directory for generated file names; `None` writes to the working directory
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_to_file: bool,
    #[serde(default = "default_log_retention_days")]
    pub log_retention_days: u32,
}

fn default_format() -> String {
    config::output::DEFAULT_FORMAT.to_string()
}

fn default_log_level() -> String {
    config::logging::DEFAULT_LOG_LEVEL.to_string()
}

fn default_log_retention_days() -> u32 {
    config::logging::LOG_RETENTION_DAYS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            display: None,
            format: default_format(),
            output_dir: None,
            log_level: default_log_level(),
            log_to_file: false,
            log_retention_days: default_log_retention_days(),
        }
    }
}
