//! Configuration for talking to the xeo storage and converter services.
//!
//! Everything a command needs is carried by one [`ServicesConfig`], built
//! once at process start via [`ServicesConfigBuilder`] and threaded through
//! [`crate::client::create_clients`]. Nothing in the library reads the
//! process environment on its own; [`ServicesConfig::from_env`] is the single
//! place where `XEO_SERVICES_ACCESS_TOKEN` is looked up, and
//! [`ServicesConfig::from_lookup`] lets tests inject a fake token without
//! touching the real environment.

use crate::error::XeoError;
use crate::progress::ProgressCallback;
use reqwest::Url;
use std::fmt;
use std::path::PathBuf;

/// Environment variable holding the bearer token for both services.
pub const ACCESS_TOKEN_ENV: &str = "XEO_SERVICES_ACCESS_TOKEN";

pub const STORAGE_URL_ENV: &str = "XEO_STORAGE_URL";
pub const CONVERTER_URL_ENV: &str = "XEO_CONVERTER_URL";
pub const LOGS_DIR_ENV: &str = "XEO_LOGS_DIR";
pub const CONVERSION_TYPE_ENV: &str = "XEO_CONVERSION_TYPE";

/// Production storage service.
pub const DEFAULT_STORAGE_URL: &str = "https://storage.xeo.vision";

/// Production converter service.
pub const DEFAULT_CONVERTER_URL: &str = "https://converter.xeo.vision";

/// Conversion type requested by `convert-ifc-xkt`.
pub const DEFAULT_CONVERSION_TYPE: &str = "ifc-xkt";

/// Configuration shared by every command.
///
/// # Example
/// ```rust
/// use xeoservices::ServicesConfig;
///
/// let config = ServicesConfig::builder()
///     .access_token("secret")
///     .logs_dir("/tmp/xeo-logs")
///     .build()
///     .unwrap();
/// assert_eq!(config.conversion_type, "ifc-xkt");
/// ```
#[derive(Clone)]
pub struct ServicesConfig {
    /// Base URL of the storage service. Default: [`DEFAULT_STORAGE_URL`].
    pub storage_url: String,

    /// Base URL of the converter service. Default: [`DEFAULT_CONVERTER_URL`].
    pub converter_url: String,

    /// Bearer token sent as `Authorization: Bearer <token>` to both services.
    ///
    /// Never sent to pre-signed upload URLs; those are self-authorising.
    pub access_token: String,

    /// Conversion `type` sent with `POST process`. Default: `ifc-xkt`.
    pub conversion_type: String,

    /// Directory that receives the JSON log files. Default: `logs/` next to
    /// the running executable.
    pub logs_dir: PathBuf,

    /// Optional step-event callback (spinner, test recorder, …).
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            storage_url: DEFAULT_STORAGE_URL.to_string(),
            converter_url: DEFAULT_CONVERTER_URL.to_string(),
            access_token: String::new(),
            conversion_type: DEFAULT_CONVERSION_TYPE.to_string(),
            logs_dir: default_logs_dir(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ServicesConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServicesConfig")
            .field("storage_url", &self.storage_url)
            .field("converter_url", &self.converter_url)
            .field("access_token", &"<redacted>")
            .field("conversion_type", &self.conversion_type)
            .field("logs_dir", &self.logs_dir)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn WorkflowProgress>"),
            )
            .finish()
    }
}

impl ServicesConfig {
    /// Create a new builder for `ServicesConfig`.
    pub fn builder() -> ServicesConfigBuilder {
        ServicesConfigBuilder {
            config: Self::default(),
        }
    }

    /// Build a config from the process environment.
    ///
    /// Reads `XEO_SERVICES_ACCESS_TOKEN` plus the optional overrides
    /// `XEO_STORAGE_URL`, `XEO_CONVERTER_URL`, `XEO_LOGS_DIR` and
    /// `XEO_CONVERSION_TYPE`. Fails with [`XeoError::MissingAccessToken`]
    /// when the token is unset or empty.
    pub fn from_env() -> Result<Self, XeoError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ServicesConfig::from_env`] but reads variables through
    /// `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, XeoError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup(ACCESS_TOKEN_ENV).unwrap_or_default();
        let mut builder = Self::builder().access_token(token);
        if let Some(url) = lookup(STORAGE_URL_ENV) {
            builder = builder.storage_url(url);
        }
        if let Some(url) = lookup(CONVERTER_URL_ENV) {
            builder = builder.converter_url(url);
        }
        if let Some(dir) = lookup(LOGS_DIR_ENV) {
            builder = builder.logs_dir(dir);
        }
        if let Some(kind) = lookup(CONVERSION_TYPE_ENV) {
            builder = builder.conversion_type(kind);
        }
        builder.build()
    }
}

/// `<exe dir>/logs`, or `./logs` when the executable path is unknown.
pub fn default_logs_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("logs")))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// Builder for [`ServicesConfig`].
#[derive(Debug)]
pub struct ServicesConfigBuilder {
    config: ServicesConfig,
}

impl ServicesConfigBuilder {
    pub fn storage_url(mut self, url: impl Into<String>) -> Self {
        self.config.storage_url = url.into();
        self
    }

    pub fn converter_url(mut self, url: impl Into<String>) -> Self {
        self.config.converter_url = url.into();
        self
    }

    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.config.access_token = token.into();
        self
    }

    pub fn conversion_type(mut self, kind: impl Into<String>) -> Self {
        self.config.conversion_type = kind.into();
        self
    }

    pub fn logs_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.logs_dir = dir.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServicesConfig, XeoError> {
        let c = &self.config;
        if c.access_token.trim().is_empty() {
            return Err(XeoError::MissingAccessToken {
                var: ACCESS_TOKEN_ENV,
            });
        }
        validate_base_url("storage", &c.storage_url)?;
        validate_base_url("converter", &c.converter_url)?;
        if c.conversion_type.trim().is_empty() {
            return Err(XeoError::InvalidConfig(
                "conversion type must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

fn validate_base_url(name: &str, raw: &str) -> Result<(), XeoError> {
    let url = Url::parse(raw)
        .map_err(|e| XeoError::InvalidConfig(format!("{name} URL '{raw}' is invalid: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(XeoError::InvalidConfig(format!(
            "{name} URL '{raw}' must use http or https, got '{other}'"
        ))),
    }
}
