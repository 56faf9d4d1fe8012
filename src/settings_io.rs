use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::settings::Settings;
use framegrab_capture::config;

pub fn framegrab_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(config::paths::APP_DIR_NAME))
}

pub fn settings_path(config_dir: &Path) -> PathBuf {
    config_dir.join(config::paths::SETTINGS_FILE_NAME)
}

fn merge_json(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_obj), Value::Object(overlay_obj)) => {
            for (k, v) in overlay_obj {
                match base_obj.get_mut(&k) {
                    Some(existing) => merge_json(existing, v),
                    None => {
                        base_obj.insert(k, v);
                    }
                }
            }
        }
        (base_slot, overlay_value) => {
            *base_slot = overlay_value;
        }
    }
}

/// Canonical name of an output format, or None if unsupported
pub fn normalize_format_name(name: &str) -> Option<&'static str> {
    match name.trim().to_lowercase().as_str() {
        "png" => Some("png"),
        "jpeg" | "jpg" => Some("jpeg"),
        "bmp" => Some("bmp"),
        "tiff" | "tif" => Some("tiff"),
        _ => None,
    }
}

/// Bring hand-edited or older settings files into the current schema.
///
/// - format: aliases ("jpg", "TIF") -> canonical name; unknown -> removed
/// - display / output_dir: "" -> removed
/// - log_level: unknown -> removed
pub fn sanitize_settings_json(value: &mut Value) {
    let Value::Object(obj) = value else {
        return;
    };

    if let Some(format) = obj.get("format").and_then(|v| v.as_str()) {
        match normalize_format_name(format) {
            Some(canonical) => {
                obj.insert("format".to_string(), Value::String(canonical.to_string()));
            }
            None => {
                obj.remove("format");
            }
        }
    }

    for key in ["display", "output_dir"] {
        if obj.get(key).and_then(|v| v.as_str()) == Some("") {
            obj.remove(key);
        }
    }

    if let Some(level) = obj.get("log_level").and_then(|v| v.as_str()) {
        let known = matches!(
            level.to_lowercase().as_str(),
            "off" | "error" | "warn" | "warning" | "info" | "debug" | "trace"
        );
        if !known {
            obj.remove("log_level");
        }
    }
}

/// Parse settings text, layering it over the defaults
pub fn parse_settings(text: &str) -> Result<Settings, String> {
    let overrides: Value =
        serde_json::from_str(text).map_err(|e| format!("Invalid settings.json: {}", e))?;
    if !overrides.is_object() {
        return Err("settings.json must contain a JSON object".to_string());
    }

    let mut merged = serde_json::to_value(Settings::default()).map_err(|e| e.to_string())?;
    merge_json(&mut merged, overrides);
    sanitize_settings_json(&mut merged);

    serde_json::from_value(merged).map_err(|e| format!("Invalid settings.json: {}", e))
}

/// Load settings from `config_dir`, falling back to defaults when the file
/// is missing or unreadable
pub fn load_settings_from_disk(config_dir: &Path) -> Settings {
    let path = settings_path(config_dir);
    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Settings::default(),
        Err(e) => {
            tracing::warn!(path = ?path, error = %e, "Failed to read settings, using defaults");
            return Settings::default();
        }
    };

    parse_settings(&text).unwrap_or_else(|e| {
        tracing::warn!(path = ?path, error = %e, "Failed to parse settings, using defaults");
        Settings::default()
    })
}

pub fn persist_settings_to_disk(config_dir: &Path, settings: &Settings) -> Result<(), String> {
    std::fs::create_dir_all(config_dir)
        .map_err(|e| format!("Failed to create config directory: {}", e))?;
    let data = serde_json::to_string_pretty(settings)
        .map_err(|e| format!("Failed to serialize settings: {}", e))?;
    std::fs::write(settings_path(config_dir), data)
        .map_err(|e| format!("Failed to write settings.json: {}", e))
}

/// Write a fully-populated settings.json so users have something to edit
pub fn bootstrap_settings_if_missing(config_dir: &Path) {
    if settings_path(config_dir).exists() {
        return;
    }

    if let Err(e) = persist_settings_to_disk(config_dir, &Settings::default()) {
        tracing::warn!(error = %e, "Failed to bootstrap settings.json");
    }
}
