//! Command-line and environment configuration

use std::path::PathBuf;

use clap::Parser;

use crate::model::store::DB_NAME;

const APP_DIR: &str = "musicbox";
const SETTINGS_FILE: &str = "settings.json";

/// musicbox: a terminal music library with a Jamendo catalog browser.
#[derive(Parser, Debug, Clone)]
#[command(name = "musicbox", version)]
pub struct Config {
    /// Directory holding the library store and settings.
    /// Defaults to the platform data directory.
    #[arg(long, env = "MUSICBOX_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Directory for rotated log files.
    #[arg(long, default_value = ".logs", env = "MUSICBOX_LOG_DIR")]
    pub log_dir: PathBuf,

    /// Jamendo API client id.
    #[arg(long, env = "JAMENDO_CLIENT_ID", default_value = crate::model::DEFAULT_CLIENT_ID)]
    pub catalog_client_id: String,

    /// Jamendo API base URL.
    #[arg(long, env = "JAMENDO_API_BASE", default_value = crate::model::DEFAULT_API_BASE)]
    pub catalog_base_url: String,
}

impl Config {
    pub fn resolve_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| {
                    dirs::home_dir()
                        .unwrap_or_else(|| PathBuf::from("."))
                        .join(".local")
                        .join("share")
                })
                .join(APP_DIR)
        })
    }

    /// Root of the versioned key-value store
    pub fn store_dir(&self) -> PathBuf {
        self.resolve_data_dir().join(DB_NAME)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.resolve_data_dir().join(SETTINGS_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_data_dir_drives_derived_paths() {
        let config =
            Config::try_parse_from(["musicbox", "--data-dir", "/tmp/mb", "--log-dir", "/tmp/logs"])
                .unwrap();
        assert_eq!(config.store_dir(), PathBuf::from("/tmp/mb/music-player-db"));
        assert_eq!(config.settings_path(), PathBuf::from("/tmp/mb/settings.json"));
        assert_eq!(config.log_dir, PathBuf::from("/tmp/logs"));
    }

    #[test]
    fn catalog_flags_override_defaults() {
        let config = Config::try_parse_from([
            "musicbox",
            "--catalog-client-id",
            "abc",
            "--catalog-base-url",
            "http://localhost:9000/v3.0",
        ])
        .unwrap();
        assert_eq!(config.catalog_client_id, "abc");
        assert_eq!(config.catalog_base_url, "http://localhost:9000/v3.0");
    }

    #[test]
    fn default_data_dir_ends_with_app_name() {
        let config = Config {
            data_dir: None,
            log_dir: PathBuf::from(".logs"),
            catalog_client_id: String::new(),
            catalog_base_url: String::new(),
        };
        assert!(config.resolve_data_dir().ends_with(APP_DIR));
    }
}
