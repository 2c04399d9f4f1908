//! Where the CLI keeps its preferences files.

use std::path::PathBuf;

use shared_prefs::StoreConfiguration;
use thiserror::Error;

pub(crate) const DATA_DIR_ENV: &str = "SHARED_PREFS_DIR";

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    /// Config directory not found (HOME or APPDATA not set).
    #[error("Config directory not found (HOME or APPDATA environment variable not set)")]
    ConfigDirNotFound,
}

/// Store configuration for the given data directory, falling back to the per-user default.
pub(crate) fn store_configuration(
    data_dir: Option<PathBuf>,
) -> Result<StoreConfiguration, ConfigError> {
    let folder_path = match data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };
    log::debug!("Using preferences folder {}", folder_path.display());

    Ok(StoreConfiguration::Sqlite { folder_path })
}

fn default_data_dir() -> Result<PathBuf, ConfigError> {
    #[cfg(target_os = "windows")]
    {
        let appdata = std::env::var("APPDATA").map_err(|_| ConfigError::ConfigDirNotFound)?;
        Ok(PathBuf::from(appdata).join("shared-prefs"))
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").map_err(|_| ConfigError::ConfigDirNotFound)?;
        Ok(PathBuf::from(home).join(".config").join("shared-prefs"))
    }
}
