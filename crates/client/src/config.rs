use std::str::FromStr;
use std::time::Duration;

use guguma_core::image_prep::{PrepareOptions, DEFAULT_MAX_BYTES};

pub const ENV_RECOGNIZE_URL: &str = "API_PLANT_RECOGNIZE";
pub const ENV_CREATE_URL: &str = "API_PLANT_CREATE";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "REQUEST_TIMEOUT_SECS";
pub const ENV_CONNECT_TIMEOUT_SECS: &str = "CONNECT_TIMEOUT_SECS";
pub const ENV_MAX_UPLOAD_BYTES: &str = "MAX_UPLOAD_BYTES";
pub const ENV_UPLOAD_FILE_NAME: &str = "UPLOAD_FILE_NAME";

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_UPLOAD_FILE_NAME: &str = "compressed_image.jpg";

/// Errors from loading [`ClientConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{var} must be a valid {expected}, got '{value}'")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Endpoint and transport settings for the plant services.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Recognition endpoint (multipart image upload).
    pub recognize_url: String,
    /// Plant creation endpoint (JSON body).
    pub create_url: String,
    /// Whole-request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// TCP connect timeout in seconds (default: `10`).
    pub connect_timeout_secs: u64,
    /// Upload ceiling for prepared images (default: 1 MiB).
    pub max_upload_bytes: usize,
    /// File name of the multipart `image` part.
    pub upload_file_name: String,
}

impl ClientConfig {
    /// Config with both endpoint URLs and every other setting at its default.
    pub fn new(recognize_url: impl Into<String>, create_url: impl Into<String>) -> Self {
        Self {
            recognize_url: recognize_url.into(),
            create_url: create_url.into(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            max_upload_bytes: DEFAULT_MAX_BYTES,
            upload_file_name: DEFAULT_UPLOAD_FILE_NAME.to_string(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// | Env Var                | Default                |
    /// |------------------------|------------------------|
    /// | `API_PLANT_RECOGNIZE`  | required               |
    /// | `API_PLANT_CREATE`     | required               |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                   |
    /// | `CONNECT_TIMEOUT_SECS` | `10`                   |
    /// | `MAX_UPLOAD_BYTES`     | `1048576`              |
    /// | `UPLOAD_FILE_NAME`     | `compressed_image.jpg` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &'static str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(var))
        };

        let mut config = Self::new(required(ENV_RECOGNIZE_URL)?, required(ENV_CREATE_URL)?);

        if let Some(secs) = parse_optional(&lookup, ENV_REQUEST_TIMEOUT_SECS, "positive u64")? {
            config.request_timeout_secs = secs;
        }
        if let Some(secs) = parse_optional(&lookup, ENV_CONNECT_TIMEOUT_SECS, "positive u64")? {
            config.connect_timeout_secs = secs;
        }
        if let Some(bytes) = parse_optional(&lookup, ENV_MAX_UPLOAD_BYTES, "positive byte count")? {
            config.max_upload_bytes = bytes;
        }
        if let Some(name) = lookup(ENV_UPLOAD_FILE_NAME).filter(|v| !v.trim().is_empty()) {
            config.upload_file_name = name.trim().to_string();
        }

        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Image preparation options honouring the configured upload ceiling.
    pub fn prepare_options(&self) -> PrepareOptions {
        PrepareOptions::with_max_bytes(self.max_upload_bytes)
    }
}

/// Parse an optional positive integer; `0` is rejected like any other
/// malformed value.
fn parse_optional<F, T>(
    lookup: &F,
    var: &'static str,
    expected: &'static str,
) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Default + PartialEq,
{
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    match raw.trim().parse::<T>() {
        Ok(value) if value != T::default() => Ok(Some(value)),
        _ => Err(ConfigError::Invalid {
            var,
            expected,
            value: raw,
        }),
    }
}
