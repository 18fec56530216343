//! # Configuration
//!
//! Resolved in layers, later layers winning:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config FILE`, or `philsaxioms.toml` in the working
//!    directory when present)
//! 3. Environment: `PHILSAXIOMS_DATA_DIR`, `PHILSAXIOMS_HOST`, `PHILSAXIOMS_PORT`
//! 4. Command-line flags (applied by the CLI)
//!
//! ```toml
//! data_dir = "data"
//! host = "0.0.0.0"
//! port = 3001
//! watch = true
//!
//! [layout]
//! level_height = 400
//! ```

use crate::AppError;
use philsaxioms_core::LayoutConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "philsaxioms.toml";

/// Default number of memoised engine results.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding `categories.yaml` and `nodes.yaml`.
    pub data_dir: PathBuf,
    pub host: String,
    pub port: u16,
    /// Reload the dataset when files in `data_dir` change.
    pub watch: bool,
    /// Maximum memoised evaluations before the oldest is evicted.
    pub cache_capacity: usize,
    pub layout: LayoutConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            host: "127.0.0.1".to_string(),
            port: 3001,
            watch: false,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            layout: LayoutConfig::default(),
        }
    }
}

impl Config {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, AppError> {
        toml::from_str(content).map_err(|e| AppError::Config(e.to_string()))
    }

    /// Resolve defaults, the config file and the process environment.
    ///
    /// An explicit `path` must exist; the implicit `philsaxioms.toml` is
    /// optional.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("cannot read '{}': {}", path.display(), e))
        })?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Self::from_toml_str(&content)
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("PHILSAXIOMS_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(host) = lookup("PHILSAXIOMS_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("PHILSAXIOMS_PORT") {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| AppError::Config(format!("PHILSAXIOMS_PORT is not a port: {}", port)))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.cache_capacity == 0 {
            return Err(AppError::Config(
                "cache_capacity must be at least 1".to_string(),
            ));
        }
        self.layout.validate()?;
        Ok(())
    }

    /// `host:port` for the listener.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            port = 9000

            [layout]
            level_height = 300
            "#,
        )
        .expect("parse");

        assert_eq!(config.port, 9000);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.layout.level_height, 300);
        assert_eq!(config.layout.node_width, 280);
    }

    #[test]
    fn malformed_toml_is_config_error() {
        let result = Config::from_toml_str("port = \"not a number\"");
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn env_overrides_file() {
        let env: BTreeMap<&str, &str> = [
            ("PHILSAXIOMS_DATA_DIR", "/srv/axioms"),
            ("PHILSAXIOMS_PORT", "8081"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_env(|key| env.get(key).map(|v| (*v).to_string()))
            .expect("apply");

        assert_eq!(config.data_dir, PathBuf::from("/srv/axioms"));
        assert_eq!(config.port, 8081);
        assert_eq!(config.bind_addr(), "127.0.0.1:8081");
    }

    #[test]
    fn bad_port_env_is_rejected() {
        let mut config = Config::default();
        let result = config.apply_env(|key| {
            (key == "PHILSAXIOMS_PORT").then(|| "eighty".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn zero_cache_capacity_is_invalid() {
        let config = Config {
            cache_capacity: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn explicit_missing_file_fails() {
        let result = Config::load(Some(Path::new("/definitely/not/here.toml")));
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
