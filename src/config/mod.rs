//! Configuration module for the catalog gateway.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::Department;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
    #[error("failed to read seed file {path:?}: {source}")]
    SeedRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse seed file {path:?}: {source}")]
    SeedParse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key required from the front end on `/api` requests
    pub api_psk: Option<String>,
    /// Base URL of the remote catalog backend; in-memory backend when unset
    pub remote_url: Option<String>,
    /// Per-call timeout enforced by the HTTP transport
    pub remote_timeout: Duration,
    /// Delay between readiness probes while the connection initializes
    pub connect_retry: Duration,
    /// Administrator principals for the in-memory backend
    pub admin_principals: Vec<String>,
    /// JSON department list preloaded into the in-memory backend
    pub seed_path: Option<PathBuf>,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit logs as JSON lines
    pub log_json: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let api_psk = non_empty("CATALOG_API_PSK");
        let remote_url = non_empty("CATALOG_REMOTE_URL");

        let remote_timeout = Duration::from_secs(parse_var("CATALOG_REMOTE_TIMEOUT_SECS", 30)?);
        let connect_retry = Duration::from_secs(parse_var("CATALOG_CONNECT_RETRY_SECS", 5)?);

        let admin_principals = env::var("CATALOG_ADMIN_PRINCIPALS")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let seed_path = non_empty("CATALOG_SEED_PATH").map(PathBuf::from);

        let bind_addr = parse_var("CATALOG_BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 8080)))?;

        let log_level = env::var("CATALOG_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_json = parse_var("CATALOG_LOG_JSON", false)?;

        Ok(Self {
            api_psk,
            remote_url,
            remote_timeout,
            connect_retry,
            admin_principals,
            seed_path,
            bind_addr,
            log_level,
            log_json,
        })
    }
}

fn non_empty(var: &str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        Err(_) => Ok(default),
    }
}

/// Read a department list from a JSON file.
pub fn load_seed(path: &Path) -> Result<Vec<Department>, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::SeedRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::SeedParse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        // Clear any existing env vars
        for var in [
            "CATALOG_API_PSK",
            "CATALOG_REMOTE_URL",
            "CATALOG_REMOTE_TIMEOUT_SECS",
            "CATALOG_CONNECT_RETRY_SECS",
            "CATALOG_ADMIN_PRINCIPALS",
            "CATALOG_SEED_PATH",
            "CATALOG_BIND_ADDR",
            "CATALOG_LOG_LEVEL",
            "CATALOG_LOG_JSON",
        ] {
            env::remove_var(var);
        }

        let config = Config::from_env().unwrap();

        assert!(config.api_psk.is_none());
        assert!(config.remote_url.is_none());
        assert_eq!(config.remote_timeout, Duration::from_secs(30));
        assert_eq!(config.connect_retry, Duration::from_secs(5));
        assert!(config.admin_principals.is_empty());
        assert!(config.seed_path.is_none());
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert!(!config.log_json);
    }

    #[test]
    fn test_parse_var_rejects_garbage() {
        env::set_var("CATALOG_TEST_PARSE_SECS", "soon");
        let err = parse_var::<u64>("CATALOG_TEST_PARSE_SECS", 1).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "CATALOG_TEST_PARSE_SECS", .. }));
        env::remove_var("CATALOG_TEST_PARSE_SECS");
    }

    #[test]
    fn test_load_seed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id":"cse","name":"Computer Science","semesters":[{{"id":"s1","name":"Semester 1"}}]}}]"#
        )
        .unwrap();

        let departments = load_seed(file.path()).unwrap();
        assert_eq!(departments[0].semesters[0].name, "Semester 1");
    }

    #[test]
    fn test_load_seed_reports_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        assert!(matches!(load_seed(file.path()), Err(ConfigError::SeedParse { .. })));
        assert!(matches!(
            load_seed(Path::new("/definitely/missing/seed.json")),
            Err(ConfigError::SeedRead { .. })
        ));
    }
}
