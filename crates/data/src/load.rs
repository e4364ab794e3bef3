use crate::schema::{Preset, SessionConfig, WeightedPool};
use anyhow::{bail, Context};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

pub const SESSION_CONFIG_FILE: &str = "session.json";
pub const PRESETS_DIR: &str = "presets";
pub const ASSETS_ENV: &str = "RANDOMIZER_ASSETS";

/// `$RANDOMIZER_ASSETS`, falling back to `./assets`.
pub fn default_assets_dir() -> PathBuf {
    std::env::var_os(ASSETS_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("assets"))
}

/// Reads `session.json` from `dir`; a missing file yields the defaults.
pub fn load_session_config(dir: &Path) -> anyhow::Result<SessionConfig> {
    let path = dir.join(SESSION_CONFIG_FILE);
    if !path.exists() {
        return Ok(SessionConfig::default());
    }
    let config: SessionConfig = load_json(&path)?;
    validate_session_config(&config).with_context(|| format!("validate {}", path.display()))?;
    Ok(config)
}

pub fn load_preset(dir: &Path, name: &str) -> anyhow::Result<Preset> {
    if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
        bail!("invalid preset name {name:?}");
    }
    let path = dir.join(PRESETS_DIR).join(format!("{name}.json"));
    let preset: Preset = load_json(&path)?;
    if preset.options.is_empty() {
        bail!("preset {} has no options", path.display());
    }
    Ok(preset)
}

pub fn load_preset_pool(dir: &Path, name: &str) -> anyhow::Result<WeightedPool> {
    let preset = load_preset(dir, name)?;
    preset
        .into_pool()
        .with_context(|| format!("build pool from preset {name}"))
}

/// Preset names (file stems) under `dir/presets`, sorted.
pub fn list_presets(dir: &Path) -> anyhow::Result<Vec<String>> {
    let presets_dir = dir.join(PRESETS_DIR);
    if !presets_dir.exists() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in
        fs::read_dir(&presets_dir).with_context(|| format!("read {}", presets_dir.display()))?
    {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
            names.push(stem.to_string());
        }
    }
    names.sort();
    Ok(names)
}

fn validate_session_config(config: &SessionConfig) -> anyhow::Result<()> {
    if !config.delay_in_range(config.lottery_delay_secs) {
        bail!(
            "lottery_delay_secs {} is outside 0..={}",
            config.lottery_delay_secs,
            config.max_lottery_delay_secs
        );
    }
    if config.default_options.is_empty() {
        bail!("default_options must name at least one option");
    }
    config.validate()?;
    Ok(())
}

fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> anyhow::Result<T> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let value = serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(value)
}
