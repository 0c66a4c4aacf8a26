// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Data directory and config file resolution.

use std::path::{Path, PathBuf};

use vinscan_core::ScanConfig;
use vinscan_core::error::Result;

/// Return the application data directory, creating it if needed.
pub fn data_dir() -> PathBuf {
    let dir = dirs_fallback().join("vinscan");
    std::fs::create_dir_all(&dir).ok();
    dir
}

/// Default location of the persisted scanner config.
pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}

/// Load the config at `path` (or the default location). A missing file
/// yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<ScanConfig> {
    match path {
        Some(path) => ScanConfig::load(path),
        None => ScanConfig::load(&config_path()),
    }
}

/// Persist `config` to `path` (or the default location), creating parent
/// directories as needed.
pub fn save_config(config: &ScanConfig, path: Option<&Path>) -> Result<PathBuf> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(config_path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    config.save(&path)?;
    Ok(path)
}

fn dirs_fallback() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    PathBuf::from("/tmp")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_lives_in_vinscan_dir() {
        let path = config_path();
        assert!(path.ends_with("vinscan/config.json"));
    }

    #[test]
    fn save_then_load_explicit_path() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("config.json");
        let config = ScanConfig {
            min_match_count: 3,
            registry_url: Some("https://vpic.nhtsa.dot.gov".into()),
            ..Default::default()
        };
        let written = save_config(&config, Some(&path)).unwrap();
        assert_eq!(written, path);
        assert_eq!(load_config(Some(&path)).unwrap(), config);
    }

    #[test]
    fn missing_explicit_config_is_default() {
        let tmp = tempfile::tempdir().unwrap();
        let config = load_config(Some(&tmp.path().join("absent.json"))).unwrap();
        assert_eq!(config, ScanConfig::default());
    }
}
