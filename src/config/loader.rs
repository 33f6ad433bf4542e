//! Configuration File Loading
//!
//! Resilient by contract: a missing file yields defaults and a
//! best-effort write of a starter file, a malformed file logs a warning
//! and yields defaults. Configuration problems never stop a session
//! from starting.

use std::fs;
use std::path::{Path, PathBuf};

use super::Config;
use crate::error::{Error, Result};

const CONFIG_DIR_NAME: &str = "prismshell";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Directory the config file lives in: an explicit override, or
/// `prismshell/` under the platform config home.
pub fn config_dir(override_dir: Option<&Path>) -> Option<PathBuf> {
    match override_dir {
        Some(dir) => Some(dir.to_path_buf()),
        None => dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME)),
    }
}

/// Full path of the configuration file.
pub fn config_file_path(override_dir: Option<&Path>) -> Option<PathBuf> {
    config_dir(override_dir).map(|d| d.join(CONFIG_FILE_NAME))
}

/// Load the configuration, falling back to defaults on any problem.
pub fn load(override_dir: Option<&Path>) -> Config {
    let Some(path) = config_file_path(override_dir) else {
        warn!("No config directory available; using defaults");
        return Config::default();
    };

    match try_load(&path) {
        Ok(Some(config)) => {
            debug!("Loaded configuration from {}", path.display());
            config
        }
        Ok(None) => {
            debug!("No config file at {}; using defaults", path.display());
            // Leave a starter file behind so users have something to edit.
            if let Err(e) = write_default(&path) {
                debug!("Could not write default config: {}", e);
            }
            Config::default()
        }
        Err(e) => {
            warn!("{}", e);
            warn!("Using default configuration");
            Config::default()
        }
    }
}

fn try_load(path: &Path) -> Result<Option<Config>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|e| Error::ConfigLoadFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let config = toml::from_str(&content).map_err(|e| Error::ConfigLoadFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(Some(config))
}

/// Write the default configuration to `path`, creating parent
/// directories as needed.
pub fn write_default(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::ConfigSaveFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    }
    let content =
        toml::to_string_pretty(&Config::default()).map_err(|e| Error::ConfigSaveFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    fs::write(path, content).map_err(|e| Error::ConfigSaveFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    debug!("Wrote default configuration to {}", path.display());
    Ok(())
}
