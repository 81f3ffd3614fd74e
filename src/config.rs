// src/config.rs

//! Configuration loading utilities.
//!
//! Resolves the effective configuration: TOML file (or defaults), then
//! environment overrides, then command-line overrides, then validation.

use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::models::Config;

/// Load, override and validate the configuration for a run.
pub fn load_config(path: &Path, state_file: Option<PathBuf>) -> Result<Config> {
    let mut config = Config::load_or_default(path);
    config.apply_env()?;
    if let Some(state_file) = state_file {
        config.storage.state_file = state_file;
    }

    config
        .validate()
        .map_err(|e| AppError::config(format!("Invalid configuration: {e}")))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_state_file_override_wins() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("pagewatch.toml");
        std::fs::write(
            &path,
            "[monitor]\ntargets = [\"https://example.com/page\"]\n[storage]\nstate_file = \"from-file.json\"\n",
        )
        .unwrap();

        let config = load_config(&path, Some(PathBuf::from("cli.json"))).unwrap();
        assert_eq!(config.storage.state_file, PathBuf::from("cli.json"));
        assert_eq!(config.monitor.targets, vec!["https://example.com/page"]);
    }

    #[test]
    fn test_invalid_file_config_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("pagewatch.toml");
        std::fs::write(&path, "[monitor]\ntargets = []\n").unwrap();

        let err = load_config(&path, None).unwrap_err();
        assert_eq!(err.kind(), "config");
    }
}
