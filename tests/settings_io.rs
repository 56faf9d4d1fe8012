#![allow(dead_code)]

use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

#[path = "../src/settings.rs"]
mod settings;
#[path = "../src/settings_io.rs"]
mod settings_io;

struct TempDir {
    path: PathBuf,
}

impl TempDir {
    fn new(label: &str) -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let mut path = std::env::temp_dir();
        path.push(format!("framegrab_test_{}_{}_{}", label, std::process::id(), nanos));
        fs::create_dir_all(&path).unwrap();
        Self { path }
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn write_json(path: &Path, value: serde_json::Value) {
    let data = serde_json::to_string_pretty(&value).unwrap();
    fs::write(path, data).unwrap();
}

#[test]
fn missing_file_uses_defaults() {
    let temp = TempDir::new("settings_missing");
    let loaded = settings_io::load_settings_from_disk(&temp.path);
    assert_eq!(loaded, settings::Settings::default());
}

#[test]
fn partial_file_is_merged_over_defaults() {
    let temp = TempDir::new("settings_partial");
    write_json(
        &settings_io::settings_path(&temp.path),
        json!({"display": ":1", "format": "TIF", "log_to_file": true}),
    );

    let loaded = settings_io::load_settings_from_disk(&temp.path);
    assert_eq!(loaded.display.as_deref(), Some(":1"));
    assert_eq!(loaded.format, "tiff");
    assert!(loaded.log_to_file);
    assert_eq!(loaded.log_level, settings::Settings::default().log_level);
}

#[test]
fn malformed_file_falls_back_to_defaults() {
    let temp = TempDir::new("settings_malformed");
    fs::write(settings_io::settings_path(&temp.path), "{ not json").unwrap();
    assert_eq!(
        settings_io::load_settings_from_disk(&temp.path),
        settings::Settings::default()
    );

    fs::write(settings_io::settings_path(&temp.path), "\"string\"").unwrap();
    assert_eq!(
        settings_io::load_settings_from_disk(&temp.path),
        settings::Settings::default()
    );
}

#[test]
fn unknown_values_are_dropped() {
    let parsed = settings_io::parse_settings(
        &json!({"format": "gif", "display": "", "log_level": "chatty"}).to_string(),
    )
    .unwrap();
    assert_eq!(parsed, settings::Settings::default());
}

#[test]
fn bootstrap_writes_defaults_once() {
    let temp = TempDir::new("settings_bootstrap");
    settings_io::bootstrap_settings_if_missing(&temp.path);

    let path = settings_io::settings_path(&temp.path);
    assert!(path.exists());
    assert_eq!(
        settings_io::load_settings_from_disk(&temp.path),
        settings::Settings::default()
    );

    write_json(&path, json!({"format": "bmp"}));
    settings_io::bootstrap_settings_if_missing(&temp.path);
    assert_eq!(settings_io::load_settings_from_disk(&temp.path).format, "bmp");
}

#[test]
fn persist_and_reload() {
    let temp = TempDir::new("settings_persist");
    let mut saved = settings::Settings::default();
    saved.output_dir = Some(temp.path.join("shots"));
    saved.log_retention_days = 3;

    settings_io::persist_settings_to_disk(&temp.path, &saved).unwrap();
    assert_eq!(settings_io::load_settings_from_disk(&temp.path), saved);
}
