// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware config directory resolution and JSON config persistence.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use hostlink_core::BridgeConfig;
use hostlink_core::error::{HostlinkError, Result};

const CONFIG_FILE: &str = "hostlink.json";

/// Return the configuration directory.
///
/// `HOSTLINK_CONFIG_DIR` wins, then the XDG config dir, then `~/.config`.
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("HOSTLINK_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("hostlink");
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".config").join("hostlink");
    }
    // Last resort
    PathBuf::from("/tmp").join("hostlink")
}

/// Default config file location.
pub fn default_config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE)
}

/// Load the config at `path`, falling back to defaults when the file is
/// missing, unreadable, or fails validation.
pub fn load_config(path: &Path) -> BridgeConfig {
    let data = match read_config_file(path) {
        Ok(Some(data)) => data,
        Ok(None) => {
            info!(path = %path.display(), "no config file, using defaults");
            return BridgeConfig::default();
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read config, using defaults");
            return BridgeConfig::default();
        }
    };

    let parsed = serde_json::from_str::<BridgeConfig>(&data)
        .map_err(HostlinkError::from)
        .and_then(|config| config.validate().map(|()| config));

    match parsed {
        Ok(config) => {
            info!(path = %path.display(), "config loaded");
            config
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring invalid config");
            BridgeConfig::default()
        }
    }
}

/// Read the config file; `None` only when it does not exist.
fn read_config_file(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(HostlinkError::Io(e)),
    }
}

/// Write `config` to `path` as pretty-printed JSON, creating parent
/// directories as needed.
pub fn persist_config(path: &Path, config: &BridgeConfig) -> Result<()> {
    config.validate()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    info!(path = %path.display(), "config saved");
    Ok(())
}
