// SPDX-FileCopyrightText: 2025-2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;
use std::path::PathBuf;

use icsync_core::{APP_NAME, Config};
use tokio::fs;

/// Loads the configuration, falling back to defaults when no file exists.
///
/// An explicitly given path must exist; the default location
/// (`<config_dir>/icsync/config.toml`) is optional.
pub async fn parse_config(path: Option<PathBuf>) -> Result<Config, Box<dyn Error>> {
    let (path, required) = match path {
        Some(path) => (Some(path), true),
        None => (default_config_path(), false),
    };

    let mut config = match path {
        Some(path) if path.exists() => {
            let content = fs::read_to_string(&path)
                .await
                .map_err(|e| format!("Failed to read config file at {}: {e}", path.display()))?;
            toml::from_str(&content)
                .map_err(|e| format!("Failed to parse config at {}: {e}", path.display()))?
        }
        Some(path) if required => {
            return Err(format!("No config found at: {}", path.display()).into());
        }
        _ => Config::default(),
    };

    if config.state_dir.is_none() {
        config.state_dir = default_state_dir();
    }

    Ok(config)
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_NAME).join("config.toml"))
}

fn default_state_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join(APP_NAME))
}
