use anyhow::{bail, Context, Result};
use std::time::SystemTime;

use crate::cli::Cli;
use crate::settings::Settings;
use crate::{logging, output, settings_io};
use framegrab_capture::{create_display_server, DisplayServer, Geometry};

/// Load settings.json, writing a default one on first run.
pub(crate) fn load_settings() -> Settings {
    if let Some(dir) = settings_io::framegrab_config_dir() {
        settings_io::bootstrap_settings_if_missing(&dir);
        settings_io::load_settings_from_disk(&dir)
    } else {
        Settings::default()
    }
}

/// Initialize logging; `--log-level` overrides the settings file.
pub(crate) fn init_logging(cli: &Cli, settings: &Settings) {
    let log_level = cli.log_level.unwrap_or_else(|| {
        settings
            .log_level
            .parse::<logging::LogLevel>()
            .unwrap_or(logging::LogLevel::Error)
    });

    if let Err(e) = logging::init_logging(log_level, settings.log_to_file) {
        eprintln!("framegrab: warning: failed to initialize logging: {:#}", e);
        return;
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        platform = std::env::consts::OS,
        log_level = %log_level,
        "framegrab started"
    );
    tracing::debug!(
        display = ?settings.display,
        format = %settings.format,
        output_dir = ?settings.output_dir,
        log_to_file = settings.log_to_file,
        log_retention_days = settings.log_retention_days,
        "Settings configuration"
    );

    if settings.log_to_file {
        logging::auto_cleanup_old_logs(settings.log_retention_days);
    }
}

/// Effective capture rectangle: the requested geometry resolved against the
/// display's drawable area, or the whole area when nothing was requested.
pub(crate) fn resolve_geometry(
    server: &dyn DisplayServer,
    requested: Option<Geometry>,
) -> Result<Geometry> {
    let bounds = server
        .max_geometry()
        .context("Failed to query screen size")?;
    let geometry = requested.unwrap_or_default().resolve_within(&bounds);

    tracing::debug!(%bounds, requested = ?requested, resolved = %geometry, "Capture geometry");

    if geometry.is_empty() {
        bail!("Nothing to capture: geometry {} covers no pixels", geometry);
    }
    Ok(geometry)
}

/// Capture once and write the image.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let settings = load_settings();
    init_logging(&cli, &settings);

    let display = cli.display.clone().or_else(|| settings.display.clone());
    let server = create_display_server(display).context("Failed to initialize display server")?;
    tracing::debug!(backend = server.name(), "Display server ready");

    let geometry = resolve_geometry(server.as_ref(), cli.geometry)?;
    if cli.print_geometry {
        println!("{}", geometry);
        return Ok(());
    }

    let format = output::resolve_format(cli.format, cli.output.as_deref(), &settings.format)?;
    let path = output::resolve_output_path(
        cli.output,
        settings.output_dir.as_deref(),
        format,
        SystemTime::now(),
    );

    let buffer = server
        .screenshot(&geometry)
        .with_context(|| format!("Failed to capture {}", geometry))?;

    output::write_image(buffer, &path, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use framegrab_capture::{CaptureError, PixelBuffer};

    struct FixedScreen(Option<Geometry>);

    impl DisplayServer for FixedScreen {
        fn name(&self) -> &str {
            "fixed"
        }

        fn max_geometry(&self) -> Result<Geometry, CaptureError> {
            self.0.ok_or_else(|| CaptureError::DisplayUnavailable {
                display: ":9".to_string(),
                reason: "test".to_string(),
            })
        }

        fn screenshot(&self, geometry: &Geometry) -> Result<PixelBuffer, CaptureError> {
            Ok(PixelBuffer::new(geometry.width, geometry.height))
        }
    }

    #[test]
    fn no_geometry_captures_whole_screen() {
        let screen = FixedScreen(Some(Geometry::with_size(1280, 800)));
        assert_eq!(
            resolve_geometry(&screen, None).unwrap(),
            Geometry::with_size(1280, 800)
        );
    }

    #[test]
    fn requested_geometry_is_kept() {
        let screen = FixedScreen(Some(Geometry::with_size(1280, 800)));
        let requested = Geometry::new(200, 100, 10, 20);
        assert_eq!(resolve_geometry(&screen, Some(requested)).unwrap(), requested);
    }

    #[test]
    fn offset_past_screen_is_empty() {
        let screen = FixedScreen(Some(Geometry::with_size(1280, 800)));
        assert!(resolve_geometry(&screen, Some(Geometry::new(0, 0, 2000, 0))).is_err());
    }

    #[test]
    fn unreachable_display_is_reported() {
        let err = resolve_geometry(&FixedScreen(None), None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CaptureError>(),
            Some(CaptureError::DisplayUnavailable { .. })
        ));
    }
}
