//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/recnik/config.toml)
//! 3. Environment variables (RECNIK_* prefix)
//!
//! Environment variables take precedence over config file values.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable prefix
const ENV_PREFIX: &str = "RECNIK";

/// File name of the dictionary store, both bundled and copied
pub const STORE_FILE_NAME: &str = "dictionary.db";

/// File name of the persisted sync version
pub const SYNC_STATE_FILE_NAME: &str = "sync_state.json";

/// Published changeset document checked when no other URL is configured
pub const DEFAULT_SYNC_URL: &str =
    "https://raw.githubusercontent.com/ljmakaronica/serbian-dictionary-updates/main/updates.json";

/// Default bound on the changeset fetch
pub const DEFAULT_SYNC_TIMEOUT_SECS: u64 = 15;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Writable data directory holding the working copy of the store.
    /// `None` means no writable location is available.
    #[serde(default = "default_data_dir")]
    pub data_dir: Option<PathBuf>,

    /// Read-only dictionary snapshot shipped with the application
    #[serde(default = "default_bundle_path")]
    pub bundle_path: Option<PathBuf>,

    /// Changeset document URL
    #[serde(default = "default_sync_url")]
    pub sync_url: Option<String>,

    /// Whether update checks run
    #[serde(default = "default_sync_enabled")]
    pub sync_enabled: bool,

    /// Timeout for the changeset fetch, in seconds
    #[serde(default = "default_sync_timeout_secs")]
    pub sync_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            bundle_path: default_bundle_path(),
            sync_url: default_sync_url(),
            sync_enabled: default_sync_enabled(),
            sync_timeout_secs: DEFAULT_SYNC_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (RECNIK_DATA_DIR, RECNIK_BUNDLE_PATH,
    ///    RECNIK_SYNC_URL, RECNIK_SYNC_ENABLED, RECNIK_SYNC_TIMEOUT)
    /// 2. Config file (~/.config/recnik/config.toml or RECNIK_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring an explicit path from the command line
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = non_empty(val).map(PathBuf::from);
        }

        if let Ok(val) = std::env::var(format!("{}_BUNDLE_PATH", ENV_PREFIX)) {
            self.bundle_path = non_empty(val).map(PathBuf::from);
        }

        if let Ok(val) = std::env::var(format!("{}_SYNC_URL", ENV_PREFIX)) {
            self.sync_url = non_empty(val);
        }

        if let Ok(val) = std::env::var(format!("{}_SYNC_ENABLED", ENV_PREFIX)) {
            self.sync_enabled = val.eq_ignore_ascii_case("true") || val == "1";
        }

        // Unparseable values keep the current timeout
        if let Ok(val) = std::env::var(format!("{}_SYNC_TIMEOUT", ENV_PREFIX)) {
            if let Ok(secs) = val.parse() {
                self.sync_timeout_secs = secs;
            }
        }
    }

    /// Save configuration to the default config file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Set a configuration value by key
    ///
    /// Empty strings and `none` clear `sync_url` for this session only, and
    /// paths cannot be cleared at all: a key missing from the config file
    /// falls back to its default. Use `sync_enabled = false` to stop update
    /// checks.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "data_dir" => self.data_dir = Some(required_path(key, value)?),
            "bundle_path" => self.bundle_path = Some(required_path(key, value)?),
            "sync_url" => self.sync_url = optional(value),
            "sync_enabled" => {
                self.sync_enabled = value
                    .parse()
                    .context("Invalid value for sync_enabled. Use 'true' or 'false'.")?;
            }
            "sync_timeout_secs" => {
                self.sync_timeout_secs = value
                    .parse()
                    .context("Invalid value for sync_timeout_secs. Use a whole number of seconds.")?;
            }
            _ => anyhow::bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: data_dir, bundle_path, sync_url, sync_enabled, sync_timeout_secs",
                key
            ),
        }
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with RECNIK_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("recnik")
            .join("config.toml")
    }

    /// Path of the writable store copy, if a data directory is configured
    pub fn store_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join(STORE_FILE_NAME))
    }

    /// Path of the persisted sync version
    ///
    /// Kept beside the store but in its own file, so re-copying the store
    /// does not reset it. Falls back to the config directory when no data
    /// directory is available.
    pub fn sync_state_path(&self) -> PathBuf {
        match self.data_dir {
            Some(ref dir) => dir.join(SYNC_STATE_FILE_NAME),
            None => Self::config_file_path()
                .parent()
                .map(|p| p.join(SYNC_STATE_FILE_NAME))
                .unwrap_or_else(|| PathBuf::from(SYNC_STATE_FILE_NAME)),
        }
    }

    /// Changeset URL, when sync is both enabled and configured
    pub fn active_sync_url(&self) -> Option<&str> {
        if self.sync_enabled {
            self.sync_url.as_deref()
        } else {
            None
        }
    }
}

fn non_empty(val: String) -> Option<String> {
    if val.is_empty() {
        None
    } else {
        Some(val)
    }
}

fn optional(value: &str) -> Option<String> {
    if value.is_empty() || value == "none" {
        None
    } else {
        Some(value.to_string())
    }
}

fn required_path(key: &str, value: &str) -> Result<PathBuf> {
    match optional(value) {
        Some(path) => Ok(PathBuf::from(path)),
        None => anyhow::bail!("{} requires a path", key),
    }
}

/// Get the default data directory
fn default_data_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("recnik"))
}

/// Get the default bundled snapshot location: next to the executable
fn default_bundle_path() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(STORE_FILE_NAME)))
}

fn default_sync_url() -> Option<String> {
    Some(DEFAULT_SYNC_URL.to_string())
}

fn default_sync_enabled() -> bool {
    true
}

fn default_sync_timeout_secs() -> u64 {
    DEFAULT_SYNC_TIMEOUT_SECS
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "RECNIK_DATA_DIR",
        "RECNIK_BUNDLE_PATH",
        "RECNIK_SYNC_URL",
        "RECNIK_SYNC_ENABLED",
        "RECNIK_SYNC_TIMEOUT",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.sync_enabled);
        assert_eq!(config.active_sync_url(), Some(DEFAULT_SYNC_URL));
        assert_eq!(config.sync_timeout_secs, DEFAULT_SYNC_TIMEOUT_SECS);
        if let Some(dir) = config.data_dir {
            assert!(dir.ends_with("recnik"));
        }
    }

    #[test]
    fn test_file_paths() {
        let config = Config {
            data_dir: Some(PathBuf::from("/data/recnik")),
            ..Config::default()
        };

        assert_eq!(
            config.store_path(),
            Some(PathBuf::from("/data/recnik/dictionary.db"))
        );
        assert_eq!(
            config.sync_state_path(),
            PathBuf::from("/data/recnik/sync_state.json")
        );
    }

    #[test]
    fn test_no_data_dir_has_no_store_path() {
        let config = Config {
            data_dir: None,
            ..Config::default()
        };
        assert!(config.store_path().is_none());
        assert!(config.sync_state_path().ends_with("sync_state.json"));
    }

    #[test]
    fn test_env_override_paths() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("RECNIK_DATA_DIR", "/tmp/recnik-test");
        env::set_var("RECNIK_BUNDLE_PATH", "/opt/recnik/dictionary.db");
        config.apply_env_overrides();

        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/recnik-test")));
        assert_eq!(
            config.bundle_path,
            Some(PathBuf::from("/opt/recnik/dictionary.db"))
        );

        // Empty string removes the location
        env::set_var("RECNIK_DATA_DIR", "");
        config.apply_env_overrides();
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn test_env_override_sync_enabled() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("RECNIK_SYNC_ENABLED", "false");
        config.apply_env_overrides();
        assert!(!config.sync_enabled);

        env::set_var("RECNIK_SYNC_ENABLED", "true");
        config.apply_env_overrides();
        assert!(config.sync_enabled);

        env::set_var("RECNIK_SYNC_ENABLED", "1");
        config.sync_enabled = false;
        config.apply_env_overrides();
        assert!(config.sync_enabled);

        env::set_var("RECNIK_SYNC_ENABLED", "false");
        config.apply_env_overrides();
        assert!(!config.sync_enabled);
    }

    #[test]
    fn test_env_override_sync_url_and_timeout() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("RECNIK_SYNC_URL", "http://localhost:8080/updates.json");
        env::set_var("RECNIK_SYNC_TIMEOUT", "3");
        config.apply_env_overrides();
        assert_eq!(
            config.sync_url,
            Some("http://localhost:8080/updates.json".to_string())
        );
        assert_eq!(config.sync_timeout_secs, 3);

        env::set_var("RECNIK_SYNC_URL", "");
        env::set_var("RECNIK_SYNC_TIMEOUT", "soon");
        config.apply_env_overrides();
        assert!(config.sync_url.is_none());
        assert_eq!(config.sync_timeout_secs, 3);
    }

    #[test]
    fn test_active_sync_url_requires_enabled() {
        let mut config = Config {
            sync_url: Some("http://example.com/updates.json".to_string()),
            sync_enabled: false,
            ..Config::default()
        };
        assert!(config.active_sync_url().is_none());

        config.sync_enabled = true;
        assert_eq!(
            config.active_sync_url(),
            Some("http://example.com/updates.json")
        );
    }

    #[test]
    fn test_serialization() {
        let config = Config {
            data_dir: Some(PathBuf::from("/data/recnik")),
            bundle_path: Some(PathBuf::from("/opt/recnik/dictionary.db")),
            sync_url: Some("http://updates.example.com/updates.json".to_string()),
            sync_enabled: true,
            sync_timeout_secs: 5,
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("data_dir"));
        assert!(toml_str.contains("bundle_path"));
        assert!(toml_str.contains("sync_enabled"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            data_dir = "/custom/data"
            bundle_path = "/custom/bundle/dictionary.db"
            sync_url = "http://example.com/updates.json"
            sync_enabled = true
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.data_dir, Some(PathBuf::from("/custom/data")));
        assert_eq!(
            config.bundle_path,
            Some(PathBuf::from("/custom/bundle/dictionary.db"))
        );
        assert!(config.sync_enabled);
        assert_eq!(config.sync_timeout_secs, DEFAULT_SYNC_TIMEOUT_SECS);
    }

    #[test]
    fn test_file_without_sync_keys_uses_published_url() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config::load_from_str(r#"data_dir = "/custom/data""#).unwrap();
        assert_eq!(config.active_sync_url(), Some(DEFAULT_SYNC_URL));

        let config = Config::load_from_str("sync_enabled = false").unwrap();
        assert!(config.active_sync_url().is_none());
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);

        let path = PathBuf::from("/nonexistent/config.toml");
        let config = Config::load_from_path(&path).unwrap();
        assert!(config.sync_enabled);
        assert_eq!(config.sync_url.as_deref(), Some(DEFAULT_SYNC_URL));
    }

    #[test]
    fn test_set_value() {
        let mut config = Config::default();

        config.set_value("sync_enabled", "true").unwrap();
        config.set_value("sync_url", "http://x/updates.json").unwrap();
        config.set_value("sync_timeout_secs", "7").unwrap();
        config.set_value("data_dir", "/srv/recnik").unwrap();
        config.set_value("sync_url", "none").unwrap();

        assert!(config.sync_enabled);
        assert!(config.sync_url.is_none());
        assert_eq!(config.sync_timeout_secs, 7);
        assert_eq!(config.data_dir, Some(PathBuf::from("/srv/recnik")));

        assert!(config.set_value("data_dir", "").is_err());
        assert!(config.set_value("sync_enabled", "maybe").is_err());
        assert!(config.set_value("favorite_tag", "x").is_err());
    }
}
