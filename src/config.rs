//! Configuration for the depot API binary.
//!
//! Configuration is loaded from environment variables with sensible defaults, following the
//! pattern `DEPOT_<SECTION>_<KEY>`.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub checksum_cache: ChecksumCacheConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to (default: 0.0.0.0)
    pub host: String,
    /// Port to bind to (default: 8080)
    pub port: u16,
    /// Request timeout in seconds (default: 30)
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Filesystem root under which the default `storage0` topology is created
    /// (default: `./data`).
    pub basedir: PathBuf,
    /// Path to a JSON file describing the storages/repositories topology (groups, proxies,
    /// deployment policies). When unset, the process falls back to a single-storage, two-repo
    /// (`releases`/`snapshots`) default rooted at `basedir`.
    pub topology_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecksumCacheConfig {
    /// How often the sweeper scans for expired entries, in milliseconds (default: 300000).
    pub expired_check_interval_ms: u64,
    /// How long a cached digest stays valid, in milliseconds (default: 60000).
    pub lifetime_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Valid values: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Valid values: "pretty", "json", "compact"
    pub format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            checksum_cache: ChecksumCacheConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 30,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            basedir: PathBuf::from("./data"),
            topology_file: None,
        }
    }
}

impl Default for ChecksumCacheConfig {
    fn default() -> Self {
        Self {
            expired_check_interval_ms: 300_000,
            lifetime_ms: 60_000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    ///
    /// # Examples
    ///
    /// - `DEPOT_SERVER_HOST=127.0.0.1`
    /// - `DEPOT_SERVER_PORT=9090`
    /// - `DEPOT_STORAGE_BASEDIR=/var/lib/depot`
    /// - `DEPOT_STORAGE_TOPOLOGY_FILE=/etc/depot/topology.json`
    /// - `DEPOT_CHECKSUM_CACHE_LIFETIME_MS=120000`
    /// - `DEPOT_LOGGING_FORMAT=json`
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = env::var("DEPOT_SERVER_HOST") {
            config.server.host = host;
        }
        if let Ok(port) = env::var("DEPOT_SERVER_PORT") {
            if let Ok(port) = port.parse() {
                config.server.port = port;
            }
        }
        if let Ok(timeout) = env::var("DEPOT_SERVER_REQUEST_TIMEOUT_SECS") {
            if let Ok(timeout) = timeout.parse() {
                config.server.request_timeout_secs = timeout;
            }
        }

        if let Ok(basedir) = env::var("DEPOT_STORAGE_BASEDIR") {
            config.storage.basedir = PathBuf::from(basedir);
        }
        if let Ok(topology_file) = env::var("DEPOT_STORAGE_TOPOLOGY_FILE") {
            config.storage.topology_file = Some(PathBuf::from(topology_file));
        }

        if let Ok(interval) = env::var("DEPOT_CHECKSUM_CACHE_EXPIRED_CHECK_INTERVAL_MS") {
            if let Ok(interval) = interval.parse() {
                config.checksum_cache.expired_check_interval_ms = interval;
            }
        }
        if let Ok(lifetime) = env::var("DEPOT_CHECKSUM_CACHE_LIFETIME_MS") {
            if let Ok(lifetime) = lifetime.parse() {
                config.checksum_cache.lifetime_ms = lifetime;
            }
        }

        if let Ok(level) = env::var("DEPOT_LOGGING_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(format) = env::var("DEPOT_LOGGING_FORMAT") {
            config.logging.format = format;
        }

        config
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("Server port cannot be 0".to_string());
        }
        if self.server.request_timeout_secs == 0 {
            return Err("Request timeout cannot be 0".to_string());
        }
        if self.checksum_cache.lifetime_ms == 0 {
            return Err("Checksum cache lifetime cannot be 0".to_string());
        }
        if self.checksum_cache.expired_check_interval_ms == 0 {
            return Err("Checksum cache expired-check interval cannot be 0".to_string());
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level '{}'. Valid values: {}",
                self.logging.level,
                valid_levels.join(", ")
            ));
        }

        let valid_formats = ["pretty", "json", "compact"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(format!(
                "Invalid log format '{}'. Valid values: {}",
                self.logging.format,
                valid_formats.join(", ")
            ));
        }

        Ok(())
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.checksum_cache.lifetime_ms, 60_000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());

        let mut invalid = Config::default();
        invalid.server.port = 0;
        assert!(invalid.validate().is_err());

        let mut invalid = Config::default();
        invalid.logging.level = "invalid".to_string();
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_server_address() {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 9090;
        assert_eq!(config.server_address(), "127.0.0.1:9090");
    }

    #[test]
    fn test_from_env() {
        unsafe {
            env::set_var("DEPOT_SERVER_PORT", "9191");
            env::set_var("DEPOT_LOGGING_LEVEL", "debug");
        }

        let config = Config::from_env();

        assert_eq!(config.server.port, 9191);
        assert_eq!(config.logging.level, "debug");

        unsafe {
            env::remove_var("DEPOT_SERVER_PORT");
            env::remove_var("DEPOT_LOGGING_LEVEL");
        }
    }
}
