// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration module

use camera_session::Config;
use camera_session::backends::camera::{CameraPosition, OutputType};
use camera_session::config::CONFIG_VERSION;
use camera_session::FilterType;
use std::path::PathBuf;

fn temp_config_path() -> PathBuf {
    std::env::temp_dir()
        .join(format!("camera-session-config-{}", uuid::Uuid::new_v4()))
        .join("config.json")
}

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(config.version, CONFIG_VERSION);
    assert_eq!(config.camera_position, CameraPosition::Back);
    assert_eq!(config.output_type, OutputType::Photo);
    assert!(config.filters.is_empty(), "No filters by default");
    assert!(config.frame_rate >= 15, "Default frame rate must be accepted");
}

#[test]
fn test_config_round_trip() {
    let path = temp_config_path();
    let config = Config {
        camera_position: CameraPosition::Front,
        output_type: OutputType::Video,
        mirror_output: true,
        filters: vec![FilterType::Mono, FilterType::Vignette],
        zoom_factor: 2.0,
        ..Config::default()
    };

    config.save_to(&path).unwrap();
    assert_eq!(Config::load_from(&path), config);

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn test_config_missing_file_uses_defaults() {
    let path = temp_config_path();
    assert_eq!(Config::load_from(&path), Config::default());
}

#[test]
fn test_config_version_mismatch_uses_defaults() {
    let path = temp_config_path();
    let outdated = Config {
        version: CONFIG_VERSION + 1,
        grid_visible: true,
        ..Config::default()
    };
    outdated.save_to(&path).unwrap();

    let loaded = Config::load_from(&path);
    assert_eq!(loaded, Config::default());

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn test_config_partial_file_fills_defaults() {
    let path = temp_config_path();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(
        &path,
        format!(r#"{{ "version": {}, "grid_visible": true }}"#, CONFIG_VERSION),
    )
    .unwrap();

    let loaded = Config::load_from(&path);
    assert!(loaded.grid_visible);
    assert_eq!(loaded.frame_rate, Config::default().frame_rate);

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn test_config_out_of_range_values_are_raised() {
    let path = temp_config_path();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(
        &path,
        format!(
            r#"{{ "version": {}, "frame_rate": 5, "zoom_factor": 0.25 }}"#,
            CONFIG_VERSION
        ),
    )
    .unwrap();

    let loaded = Config::load_from(&path);
    assert_eq!(loaded.frame_rate, 15);
    assert_eq!(loaded.zoom_factor, 1.0);

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn test_config_garbage_uses_defaults() {
    let path = temp_config_path();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "not json").unwrap();

    assert_eq!(Config::load_from(&path), Config::default());

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}
