// Config file persistence and how its defaults feed a session

use std::fs;

use hevc_nvenc::config::Config;
use hevc_nvenc::engine::params::SdkVersion;
use hevc_nvenc::engine::tuning::Preset;
use hevc_nvenc::engine::{CodecRegistry, EncoderSession};
use tempfile::TempDir;

use crate::common::FakeBackend;

#[test]
fn test_missing_file_gives_defaults() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let config = Config::load_from(&dir.path().join("config.toml"))?;
    assert_eq!(config, Config::default());
    Ok(())
}

#[test]
fn test_save_then_load() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("nested").join("config.toml");

    let mut config = Config::default();
    config.defaults.codec = "nvenc_hevc".to_string();
    config.defaults.options.insert("preset".to_string(), "slow".into());
    config.logging.level = "debug".to_string();
    config.save_to(&path)?;

    assert_eq!(Config::load_from(&path)?, config);
    Ok(())
}

#[test]
fn test_malformed_file_reports_path() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("config.toml");
    fs::write(&path, "[defaults\ncodec = ")?;

    let err = Config::load_from(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to parse config file"));
    Ok(())
}

#[test]
fn test_option_order_survives_save_and_decides_synonyms() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        "[defaults.options]\nasync_depth = \"6\"\ndelay = \"2\"\n",
    )?;

    let config = Config::load_from(&path)?;
    config.save_to(&path)?;
    let config = Config::load_from(&path)?;
    assert_eq!(config.defaults.option_string(), "async_depth=6:delay=2");

    let codec = CodecRegistry::with_sdk(SdkVersion::new(8))
        .find_encoder(&config.defaults.codec)
        .expect("default codec is registered");
    let backend = FakeBackend::with_devices(1);
    let mut session = EncoderSession::new(codec, backend.shared());
    session.set_options(&config.defaults.option_string())?;
    assert_eq!(session.context().settings.async_depth, 2);
    Ok(())
}

#[test]
fn test_config_options_precede_command_line() -> anyhow::Result<()> {
    let mut config = Config::default();
    config.defaults.options.insert("preset".to_string(), "slow".into());
    config.defaults.options.insert("surfaces".to_string(), "8".into());

    let codec = CodecRegistry::with_sdk(SdkVersion::new(8))
        .find_encoder(&config.defaults.codec)
        .expect("default codec is registered");
    let backend = FakeBackend::with_devices(1);
    let mut session = EncoderSession::new(codec, backend.shared());
    session.set_options(&config.defaults.option_string())?;
    session.set_options("preset=fast")?;
    session.open()?;

    let params = session.params().expect("resolved");
    assert_eq!(params.preset, Preset::Fast);
    assert_eq!(params.surfaces, 8);
    Ok(())
}
