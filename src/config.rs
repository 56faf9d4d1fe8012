//! Application Configuration Constants
//!
//! Centralized defaults shared by the library and the `framegrab` binary.

/// Output Configuration
pub mod output {
    /// Image format used when neither the command line nor settings name one
    pub const DEFAULT_FORMAT: &str = "png";

    /// Formats accepted by `--format`, in the order they are listed in help
    pub const SUPPORTED_FORMATS: [&str; 4] = ["png", "jpeg", "bmp", "tiff"];
}

/// Logging Configuration
pub mod logging {
    /// Default log level name (parsed case-insensitively)
    pub const DEFAULT_LOG_LEVEL: &str = "Error";

    /// Log retention period in days
    pub const LOG_RETENTION_DAYS: u32 = 14;

    /// Rolling log file name prefix
    pub const LOG_FILE_NAME: &str = "framegrab.log";
}

/// Filesystem Locations
pub mod paths {
    /// Directory name under the platform config/data dirs
    pub const APP_DIR_NAME: &str = "Framegrab";

    /// Settings file name inside the config directory
    pub const SETTINGS_FILE_NAME: &str = "settings.json";
}

/// Environment
pub mod env {
    /// X display used when no display is configured
    pub const DISPLAY_ENV: &str = "DISPLAY";
}
