//! Configuration loading tests
//!
//! Tests that narration settings load from disk, fall back to defaults
//! and survive a save/reload cycle

use readalong::config::Config;
use std::fs;
use tempfile::TempDir;

fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

#[test]
fn test_missing_config_is_created_with_defaults() {
    let dir = temp_dir();
    let path = dir.path().join("readalong.cfg");
    let config = Config::load_from(&path).expect("Failed to load config");

    assert!(path.exists());
    assert_eq!(config.path(), path.as_path());
    assert_eq!(config.rate(), 1.0);
    assert_eq!(config.min_rate(), 0.25);
    assert_eq!(config.max_rate(), 4.0);
    assert!(config.autoplay());
    assert_eq!(config.outro(), None);
}

#[test]
fn test_config_values_are_read() {
    let dir = temp_dir();
    let path = dir.path().join("readalong.cfg");
    fs::write(
        &path,
        "[playback]\nrate=1.75\nrate_step=0.5\nautoplay=false\nauto_scroll=false\noutro=audio/outro.mp3\n",
    )
    .unwrap();

    let config = Config::load_from(&path).expect("Failed to load config");
    assert_eq!(config.rate(), 1.75);
    assert_eq!(config.rate_step(), 0.5);
    assert!(!config.autoplay());
    assert_eq!(config.outro().as_deref(), Some("audio/outro.mp3"));

    let options = config.narrator_options();
    assert_eq!(options.rate.get(), 1.75);
    assert!(!options.auto_scroll);
}

#[test]
fn test_out_of_range_rate_is_clamped() {
    let dir = temp_dir();
    let path = dir.path().join("readalong.cfg");
    fs::write(&path, "[playback]\nrate=9\nmax_rate=3.0\n").unwrap();

    let config = Config::load_from(&path).expect("Failed to load config");
    assert_eq!(config.rate(), 3.0);
    assert_eq!(config.clamp_rate(0.0), 0.25);
}

#[test]
fn test_save_and_reload() {
    let dir = temp_dir();
    let path = dir.path().join("readalong.cfg");
    let mut config = Config::load_from(&path).expect("Failed to load config");
    config.set("playback", "rate", "1.25");
    config.save().expect("Failed to save config");

    let reloaded = Config::load_from(&path).expect("Failed to reload config");
    assert_eq!(reloaded.rate(), 1.25);
}

#[test]
fn test_malformed_config_is_an_error() {
    let dir = temp_dir();
    let path = dir.path().join("readalong.cfg");
    fs::write(&path, "[playback\nrate=1.0\n").unwrap();

    assert!(Config::load_from(&path).is_err());
}
