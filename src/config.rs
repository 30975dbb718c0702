//! Runtime configuration resolved from the environment

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{
    CONFIG_DIR_NAME, DEFAULT_LOG_FILTER, DEFAULT_TIMEOUT_SECS, STATE_FILE_NAME,
};

pub const CONFIG_DIR_ENV: &str = "LULL_CONFIG_DIR";
pub const LOG_FILTER_ENV: &str = "LULL_LOG";
pub const TIMEOUT_ENV: &str = "LULL_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub config_dir: PathBuf,
    pub state_path: PathBuf,
    pub log_dir: PathBuf,
    /// `tracing_subscriber::EnvFilter` directive
    pub log_filter: String,
    pub request_timeout: Duration,
}

impl Config {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        let config_dir = config_dir.into();
        Config {
            state_path: config_dir.join(STATE_FILE_NAME),
            log_dir: config_dir.join("logs"),
            config_dir,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let config_dir = var(CONFIG_DIR_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME)))
            .unwrap_or_else(|| Path::new(".").join(format!(".{}", CONFIG_DIR_NAME)));

        let mut config = Config::new(config_dir);
        if let Some(filter) = var(LOG_FILTER_ENV).filter(|v| !v.is_empty()) {
            config.log_filter = filter;
        }
        if let Some(secs) = var(TIMEOUT_ENV).and_then(|v| v.trim().parse::<u64>().ok()) {
            config.request_timeout = Duration::from_secs(secs);
        }
        config
    }

    /// Create the config and log directories
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.config_dir)?;
        fs::create_dir_all(&self.log_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_overrides_from_environment() {
        let config = Config::from_vars(vars(&[
            (CONFIG_DIR_ENV, "/tmp/lull-test"),
            (LOG_FILTER_ENV, "lull=debug"),
            (TIMEOUT_ENV, "5"),
        ]));

        assert_eq!(config.config_dir, PathBuf::from("/tmp/lull-test"));
        assert_eq!(config.state_path, PathBuf::from("/tmp/lull-test/state.json"));
        assert_eq!(config.log_dir, PathBuf::from("/tmp/lull-test/logs"));
        assert_eq!(config.log_filter, "lull=debug");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(vars(&[(TIMEOUT_ENV, "soon")]));
        assert_eq!(config.log_filter, "error");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.state_path.ends_with("state.json"));
    }

    #[test]
    fn test_ensure_dirs() {
        let dir = TempDir::new().unwrap();
        let config = Config::new(dir.path().join("a").join("b"));
        config.ensure_dirs().unwrap();
        assert!(config.config_dir.is_dir());
        assert!(config.log_dir.is_dir());
    }
}
