// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::theme::MapThemeKind;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    /// Base URL of a Nominatim-compatible service.
    pub endpoint: String,
    /// Nominatim's usage policy requires an identifying agent.
    pub user_agent: String,
    pub result_limit: u32,
    pub timeout_secs: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: format!("WanderList/{}", env!("CARGO_PKG_VERSION")),
            result_limit: 1,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeolocationConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "http://ip-api.com/json/".to_string(),
            timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WanderConfig {
    pub default_theme: MapThemeKind,
    /// One of `off`, `error`, `warn`, `info`, `debug`, `trace`.
    pub log_level: String,
    pub geocoder: GeocoderConfig,
    pub geolocation: GeolocationConfig,
}

impl Default for WanderConfig {
    fn default() -> Self {
        Self {
            default_theme: MapThemeKind::default(),
            log_level: "info".to_string(),
            geocoder: GeocoderConfig::default(),
            geolocation: GeolocationConfig::default(),
        }
    }
}

impl WanderConfig {
    pub fn default_path() -> PathBuf {
        crate::get_config_root().join("config.json")
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Never fails: a broken file is reported and defaults are used.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!(
                    "Config unusable; falling back to defaults: path={} error={:#}",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).context("Failed to create config directory")?;
            }
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn log_level_filter(&self) -> log::LevelFilter {
        self.log_level
            .parse::<log::LevelFilter>()
            .unwrap_or(log::LevelFilter::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = WanderConfig::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config, WanderConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults_for_missing_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"default_theme":"carto_dark","geocoder":{"result_limit":3}}"#)
            .unwrap();

        let config = WanderConfig::load(&path).unwrap();
        assert_eq!(config.default_theme, MapThemeKind::CartoDark);
        assert_eq!(config.geocoder.result_limit, 3);
        assert_eq!(config.geocoder.endpoint, GeocoderConfig::default().endpoint);
        assert!(config.geolocation.enabled);
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(WanderConfig::load(&path).is_err());
        assert_eq!(WanderConfig::load_or_default(&path), WanderConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = WanderConfig::default();
        config.default_theme = MapThemeKind::OpenTopoMap;
        config.geolocation.enabled = false;
        config.log_level = "debug".to_string();
        config.save(&path).unwrap();

        let loaded = WanderConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.log_level_filter(), log::LevelFilter::Debug);
    }
}
