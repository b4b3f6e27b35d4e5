pub mod schema;

pub use schema::SentinelConfig;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Default sentinel home directory (~/.domain-sentinel).
pub fn default_home_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().join(".domain-sentinel"))
        .unwrap_or_else(|| PathBuf::from(".domain-sentinel"))
}

/// Default config file location.
pub fn default_config_path() -> PathBuf {
    default_home_dir().join("sentinel.toml")
}

/// Expand a leading `~` in a user-supplied path.
pub fn resolve_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

/// Load config from the given path, or return defaults.
pub fn load_config(path: &Path) -> Result<SentinelConfig> {
    if path.exists() {
        let contents =
            std::fs::read_to_string(path).context("Failed to read sentinel config file")?;
        let config: SentinelConfig =
            toml::from_str(&contents).context("Failed to parse sentinel config (TOML)")?;
        Ok(config)
    } else {
        Ok(SentinelConfig::default())
    }
}

/// Load config and apply environment overrides.
pub fn load_with_env(path: &Path) -> Result<SentinelConfig> {
    let mut config = load_config(path)?;
    config.apply_overrides(|key| std::env::var(key).ok());
    Ok(config)
}

/// Save config to the given path (TOML format).
pub fn save_config(config: &SentinelConfig, path: &Path) -> Result<()> {
    let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents).context("Failed to write config file")?;
    Ok(())
}
