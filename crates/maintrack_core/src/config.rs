//! Runtime configuration resolved from the environment.
//!
//! # Invariants
//! - Every setting has a default; resolution never fails.
//! - Blank environment values count as unset.

use crate::logging::default_log_level;
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "MAINTRACK_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "MAINTRACK_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "MAINTRACK_LOG_DIR";

const DEFAULT_DB_DIRNAME: &str = "maintrack";
const DEFAULT_DB_FILENAME: &str = "maintrack.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub log_level: String,
    /// File logging is disabled when `None`.
    pub log_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Reads `MAINTRACK_*` variables from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves settings through `lookup`, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            database_path: read(ENV_DB_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(default_database_path),
            log_level: read(ENV_LOG_LEVEL).unwrap_or_else(|| default_log_level().to_string()),
            log_dir: read(ENV_LOG_DIR).map(PathBuf::from),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

/// `<data dir>/maintrack/maintrack.db`, or a file in the working directory
/// when the platform reports no data directory.
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::data_dir)
        .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("share")))
        .map(|base| base.join(DEFAULT_DB_DIRNAME).join(DEFAULT_DB_FILENAME))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILENAME))
}

#[cfg(test)]
mod tests {
    use super::{default_database_path, AppConfig, ENV_DB_PATH, ENV_LOG_DIR, ENV_LOG_LEVEL};
    use crate::logging::default_log_level;
    use std::collections::HashMap;
    use std::path::PathBuf;

    #[test]
    fn lookup_values_override_defaults() {
        let vars = HashMap::from([
            (ENV_DB_PATH, "/srv/maintrack/data.db"),
            (ENV_LOG_LEVEL, "warn"),
            (ENV_LOG_DIR, "/var/log/maintrack"),
        ]);
        let config = AppConfig::from_lookup(|key| vars.get(key).map(|value| value.to_string()));

        assert_eq!(config.database_path, PathBuf::from("/srv/maintrack/data.db"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/maintrack")));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = AppConfig::from_lookup(|_| Some("  ".to_string()));

        assert_eq!(config.database_path, default_database_path());
        assert_eq!(config.log_level, default_log_level());
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn default_database_path_ends_with_app_file() {
        let path = default_database_path();
        assert!(path.ends_with("maintrack.db"));
    }
}
