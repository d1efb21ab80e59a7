//! Runtime configuration read from environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `RISKMATRIX_FRED_API_KEY` / `FRED_API_KEY` | unset |
//! | `RISKMATRIX_OUTPUT_DIR` | `data` |
//! | `RISKMATRIX_CATALOG` | built-in catalog |
//! | `RISKMATRIX_LOOKBACK_DAYS` | `1100` |
//! | `RISKMATRIX_PUBLISH_ENDPOINT` | unset |
//! | `RISKMATRIX_PUBLIC_BASE_URL` | publish endpoint |
//! | `RISKMATRIX_PUBLISH_ACL_HEADER` | unset, `name:value` |

use std::env;
use std::path::PathBuf;

use thiserror::Error;

use crate::acquisition::DEFAULT_LOOKBACK_DAYS;

pub const DEFAULT_OUTPUT_DIR: &str = "data";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a positive integer, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },
    #[error("{name} must look like 'header-name:value', got '{value}'")]
    InvalidHeader { name: &'static str, value: String },
}

/// Publishing target for `RISKMATRIX_PUBLISH_*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishConfig {
    pub endpoint: String,
    pub public_base_url: Option<String>,
    pub acl_header: Option<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub fred_api_key: Option<String>,
    pub output_dir: PathBuf,
    pub catalog_path: Option<PathBuf>,
    pub lookback_days: u32,
    pub publish: Option<PublishConfig>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            fred_api_key: None,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            catalog_path: None,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            publish: None,
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let lookback_days = match var("RISKMATRIX_LOOKBACK_DAYS") {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|days| *days > 0)
                .ok_or(ConfigError::InvalidNumber {
                    name: "RISKMATRIX_LOOKBACK_DAYS",
                    value: raw,
                })?,
            None => DEFAULT_LOOKBACK_DAYS,
        };

        let publish = match var("RISKMATRIX_PUBLISH_ENDPOINT") {
            Some(endpoint) => Some(PublishConfig {
                endpoint,
                public_base_url: var("RISKMATRIX_PUBLIC_BASE_URL"),
                acl_header: var("RISKMATRIX_PUBLISH_ACL_HEADER")
                    .map(|raw| parse_header("RISKMATRIX_PUBLISH_ACL_HEADER", &raw))
                    .transpose()?,
            }),
            None => None,
        };

        Ok(Self {
            fred_api_key: var("RISKMATRIX_FRED_API_KEY").or_else(|| var("FRED_API_KEY")),
            output_dir: var("RISKMATRIX_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            catalog_path: var("RISKMATRIX_CATALOG").map(PathBuf::from),
            lookback_days,
            publish,
        })
    }
}

pub fn parse_header(name: &'static str, raw: &str) -> Result<(String, String), ConfigError> {
    let invalid = || ConfigError::InvalidHeader {
        name,
        value: raw.to_owned(),
    };
    let (header, value) = raw.split_once(':').ok_or_else(invalid)?;
    let (header, value) = (header.trim(), value.trim());
    if header.is_empty() || value.is_empty() {
        return Err(invalid());
    }
    Ok((header.to_owned(), value.to_owned()))
}
