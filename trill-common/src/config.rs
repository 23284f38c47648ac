//! Configuration loading and data folder resolution

use crate::{Error, Result};
use std::path::PathBuf;

/// Database file name inside the data folder
pub const DATABASE_FILE: &str = "trill.db";

/// Data folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_data_folder(
    cli_arg: Option<&str>,
    env_var_name: &str,
    config_file_key: Option<&str>,
) -> Result<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Ok(PathBuf::from(path));
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        return Ok(PathBuf::from(path));
    }

    // Priority 3: TOML config file
    if let Some(key) = config_file_key {
        if let Ok(config_path) = load_config_file() {
            if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
                if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                    if let Some(folder) = config.get(key).and_then(|v| v.as_str()) {
                        return Ok(PathBuf::from(folder));
                    }
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    Ok(get_default_data_folder())
}

/// Full path of the SQLite database inside the resolved data folder
pub fn database_path(data_folder: &std::path::Path) -> PathBuf {
    data_folder.join(DATABASE_FILE)
}

/// Get default configuration file path for the platform
fn load_config_file() -> Result<PathBuf> {
    let config_path = if cfg!(target_os = "linux") {
        // Try ~/.config/trill/config.toml first, then /etc/trill/config.toml
        let user_config = dirs::config_dir().map(|d| d.join("trill").join("config.toml"));
        let system_config = PathBuf::from("/etc/trill/config.toml");

        if let Some(path) = user_config {
            if path.exists() {
                return Ok(path);
            }
        }
        if system_config.exists() {
            return Ok(system_config);
        }
        return Err(Error::Config("No config file found".to_string()));
    } else {
        dirs::config_dir()
            .map(|d| d.join("trill").join("config.toml"))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?
    };

    if config_path.exists() {
        Ok(config_path)
    } else {
        Err(Error::Config(format!(
            "Config file not found: {:?}",
            config_path
        )))
    }
}

/// Get OS-dependent default data folder path
fn get_default_data_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/trill (or /var/lib/trill for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("trill"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/trill"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/trill
        dirs::data_dir()
            .map(|d| d.join("trill"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/trill"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\trill
        dirs::data_local_dir()
            .map(|d| d.join("trill"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\trill"))
    } else {
        PathBuf::from("./trill_data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_argument_wins_over_environment() {
        std::env::set_var("TRILL_TEST_DATA_A", "/from/env");
        let folder = resolve_data_folder(Some("/from/cli"), "TRILL_TEST_DATA_A", None).unwrap();
        assert_eq!(folder, PathBuf::from("/from/cli"));
        std::env::remove_var("TRILL_TEST_DATA_A");
    }

    #[test]
    fn environment_wins_over_default() {
        std::env::set_var("TRILL_TEST_DATA_B", "/from/env");
        let folder = resolve_data_folder(None, "TRILL_TEST_DATA_B", None).unwrap();
        assert_eq!(folder, PathBuf::from("/from/env"));
        std::env::remove_var("TRILL_TEST_DATA_B");
    }

    #[test]
    fn falls_back_to_platform_default() {
        let folder = resolve_data_folder(None, "TRILL_TEST_DATA_UNSET", None).unwrap();
        assert!(folder.to_string_lossy().contains("trill"));
    }

    #[test]
    fn database_path_appends_file_name() {
        let path = database_path(std::path::Path::new("/tmp/data"));
        assert_eq!(path, PathBuf::from("/tmp/data/trill.db"));
    }
}
