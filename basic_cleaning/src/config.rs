//! Environment configuration.
//!
//! Read once at startup, after `.env` has been loaded:
//!
//! | Variable               | Default                            |
//! |------------------------|------------------------------------|
//! | `ARTIFACT_STORE_URL`   | unset (use the local store)        |
//! | `ARTIFACT_STORE_TOKEN` | unset                              |
//! | `ARTIFACT_STORE_DIR`   | `.artifacts`                       |
//! | `ARTIFACT_CACHE_DIR`   | `<tmp>/basic_cleaning/artifacts`   |
//! | `LOG_FORMAT`           | `text`                             |

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use reqwest::Url;

use crate::error::{ConfigError, ConfigResult};

/// Default root of the local directory store.
pub const DEFAULT_STORE_DIR: &str = ".artifacts";

/// Where the artifact store lives.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreBackend {
    /// Directory store rooted at `root`.
    Local { root: PathBuf },
    /// Remote store at `base_url`; downloads go to `cache_dir`.
    Http {
        base_url: Url,
        token: Option<String>,
        cache_dir: PathBuf,
    },
}

/// Artifact store configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    pub backend: StoreBackend,
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigError::InvalidLogFormat(other.to_string())),
        }
    }
}

/// Everything read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub store: StoreConfig,
    pub log_format: LogFormat,
}

impl Config {
    /// Load from the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_vars(env::vars().collect())
    }

    /// Load from an explicit variable map.
    pub fn from_vars(vars: HashMap<String, String>) -> ConfigResult<Self> {
        let get = |key: &str| vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        let backend = match get("ARTIFACT_STORE_URL") {
            Some(url) => StoreBackend::Http {
                base_url: parse_base_url(url)?,
                token: get("ARTIFACT_STORE_TOKEN").map(str::to_string),
                cache_dir: get("ARTIFACT_CACHE_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(default_cache_dir),
            },
            None => StoreBackend::Local {
                root: PathBuf::from(get("ARTIFACT_STORE_DIR").unwrap_or(DEFAULT_STORE_DIR)),
            },
        };

        let log_format = match get("LOG_FORMAT") {
            Some(format) => format.parse()?,
            None => LogFormat::default(),
        };

        Ok(Self {
            store: StoreConfig { backend },
            log_format,
        })
    }
}

fn parse_base_url(raw: &str) -> ConfigResult<Url> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        url: raw.to_string(),
        message: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl {
            url: raw.to_string(),
            message: "scheme must be http or https".to_string(),
        });
    }
    Ok(url)
}

fn default_cache_dir() -> PathBuf {
    env::temp_dir().join("basic_cleaning").join("artifacts")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_to_local_store() {
        let config = Config::from_vars(HashMap::new()).unwrap();
        assert_eq!(
            config.store.backend,
            StoreBackend::Local { root: PathBuf::from(".artifacts") }
        );
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn test_local_store_dir() {
        let config = Config::from_vars(vars(&[("ARTIFACT_STORE_DIR", "/data/artifacts")])).unwrap();
        assert_eq!(
            config.store.backend,
            StoreBackend::Local { root: PathBuf::from("/data/artifacts") }
        );
    }

    #[test]
    fn test_http_store() {
        let config = Config::from_vars(vars(&[
            ("ARTIFACT_STORE_URL", "https://artifacts.example.com/api"),
            ("ARTIFACT_STORE_TOKEN", "abc"),
            ("ARTIFACT_CACHE_DIR", "/tmp/cache"),
            ("LOG_FORMAT", "JSON"),
        ]))
        .unwrap();

        match config.store.backend {
            StoreBackend::Http { base_url, token, cache_dir } => {
                assert_eq!(base_url.as_str(), "https://artifacts.example.com/api");
                assert_eq!(token.as_deref(), Some("abc"));
                assert_eq!(cache_dir, PathBuf::from("/tmp/cache"));
            }
            other => panic!("expected http backend, got {:?}", other),
        }
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_blank_url_means_local() {
        let config = Config::from_vars(vars(&[("ARTIFACT_STORE_URL", "  ")])).unwrap();
        assert!(matches!(config.store.backend, StoreBackend::Local { .. }));
    }

    #[test]
    fn test_invalid_url() {
        let err = Config::from_vars(vars(&[("ARTIFACT_STORE_URL", "not a url")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));

        let err = Config::from_vars(vars(&[("ARTIFACT_STORE_URL", "ftp://host/")])).unwrap_err();
        assert!(err.to_string().contains("scheme"));
    }

    #[test]
    fn test_invalid_log_format() {
        let err = Config::from_vars(vars(&[("LOG_FORMAT", "xml")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLogFormat(ref f) if f == "xml"));
    }
}
