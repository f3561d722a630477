//! Merchant configuration.
//!
//! Credentials and client settings are supplied once and shared read-only by
//! every call made through a [`PayClient`](crate::api::PayClient).
//!
//! ```toml
//! appid = "wx8888888888888888"
//! mch_id = "1900000109"
//! key = "192006250b4c09247ec02edce69f6a2d"
//! sign_type = "HMAC-SHA256"
//!
//! [http]
//! timeout_secs = 10
//!
//! [cert]
//! cert_path = "/etc/weixinpay/apiclient_cert.pem"
//! key_path = "/etc/weixinpay/apiclient_key.pem"
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use url::Url;

use crate::{
    error::{PayError, Result},
    sign::{MerchantKey, SignType},
    transport::HttpConfig,
};

/// Production API host.
pub const DEFAULT_API_BASE: &str = "https://api.mch.weixin.qq.com";

/// Root merchant configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MerchantConfig {
    /// Application id assigned by the provider.
    pub appid: String,

    /// Merchant id.
    pub mch_id: String,

    /// API key used for signing and notification decryption.
    pub key: MerchantKey,

    /// Signature algorithm for requests and replies.
    #[serde(default)]
    pub sign_type: SignType,

    /// HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Client certificate used by refund calls.
    #[serde(default)]
    pub cert: ClientCertConfig,

    /// Endpoint overrides.
    #[serde(default)]
    pub endpoints: Endpoints,
}

impl MerchantConfig {
    /// Creates a configuration with default settings.
    ///
    /// # Examples
    ///
    /// ```
    /// use weixinpay::{config::MerchantConfig, sign::SignType};
    ///
    /// let config = MerchantConfig::new("wx123", "10000100", "secretkey")
    ///     .with_sign_type(SignType::HmacSha256);
    ///
    /// assert!(config.validate().is_ok());
    /// assert_eq!(config.sign_type, SignType::HmacSha256);
    /// ```
    #[must_use]
    pub fn new(appid: impl Into<String>, mch_id: impl Into<String>, key: impl Into<MerchantKey>) -> Self {
        Self {
            appid: appid.into(),
            mch_id: mch_id.into(),
            key: key.into(),
            sign_type: SignType::default(),
            http: HttpConfig::default(),
            cert: ClientCertConfig::default(),
            endpoints: Endpoints::default(),
        }
    }

    /// Returns a copy using `sign_type`.
    #[must_use]
    pub fn with_sign_type(mut self, sign_type: SignType) -> Self {
        self.sign_type = sign_type;
        self
    }

    /// Returns a copy using `http`.
    #[must_use]
    pub fn with_http(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }

    /// Returns a copy using `cert`.
    #[must_use]
    pub fn with_cert(mut self, cert: ClientCertConfig) -> Self {
        self.cert = cert;
        self
    }

    /// Returns a copy using `endpoints`.
    #[must_use]
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Parses and validates a TOML configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PayError::InvalidConfiguration`] if the document does not parse
    /// (including an unknown `sign_type`) or fails [`validate`](Self::validate).
    pub fn from_toml(toml: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml)
            .map_err(|e| PayError::InvalidConfiguration(format!("invalid merchant config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`PayError::InvalidConfiguration`] if the file cannot be read or
    /// [`from_toml`](Self::from_toml) fails.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let toml = fs::read_to_string(path).map_err(|e| {
            PayError::InvalidConfiguration(format!("cannot read '{}': {e}", path.display()))
        })?;
        Self::from_toml(&toml)
    }

    /// Validates the configuration.
    ///
    /// This method checks for:
    /// - Non-empty `appid`, `mch_id` and `key`
    /// - HTTP timeouts within bounds
    /// - An HTTPS, non-loopback `api_base`
    ///
    /// # Errors
    ///
    /// Returns [`PayError::InvalidConfiguration`] if any check fails.
    pub fn validate(&self) -> Result<()> {
        if self.appid.trim().is_empty() {
            return Err(PayError::InvalidConfiguration("appid must not be empty".to_owned()));
        }
        if self.mch_id.trim().is_empty() {
            return Err(PayError::InvalidConfiguration("mch_id must not be empty".to_owned()));
        }
        if self.key.is_empty() {
            return Err(PayError::InvalidConfiguration("key must not be empty".to_owned()));
        }

        self.http.validate()?;
        self.endpoints.validate()?;

        Ok(())
    }
}

/// Client certificate and private key for mutual TLS, as PEM file paths.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientCertConfig {
    /// Certificate (`apiclient_cert.pem`).
    #[serde(default = "default_cert_path")]
    pub cert_path: PathBuf,

    /// Private key (`apiclient_key.pem`).
    #[serde(default = "default_key_path")]
    pub key_path: PathBuf,
}

impl ClientCertConfig {
    /// Creates a certificate configuration.
    #[must_use]
    pub fn new(cert_path: impl Into<PathBuf>, key_path: impl Into<PathBuf>) -> Self {
        Self { cert_path: cert_path.into(), key_path: key_path.into() }
    }
}

impl Default for ClientCertConfig {
    fn default() -> Self {
        Self { cert_path: default_cert_path(), key_path: default_key_path() }
    }
}

fn default_cert_path() -> PathBuf {
    PathBuf::from("./cert.pem")
}

fn default_key_path() -> PathBuf {
    PathBuf::from("./key.pem")
}

/// Provider endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Endpoints {
    /// Scheme and host every operation path is appended to.
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self { api_base: default_api_base() }
    }
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_owned()
}

impl Endpoints {
    /// Joins `path` onto the API base.
    ///
    /// ```
    /// use weixinpay::config::Endpoints;
    ///
    /// let endpoints = Endpoints::default();
    /// assert_eq!(endpoints.url("/pay/orderquery"), "https://api.mch.weixin.qq.com/pay/orderquery");
    /// ```
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_base.trim_end_matches('/'))
    }

    fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.api_base).map_err(|e| {
            PayError::InvalidConfiguration(format!("invalid api_base '{}': {e}", self.api_base))
        })?;

        // Must be HTTPS
        if url.scheme() != "https" {
            return Err(PayError::InvalidConfiguration(format!(
                "api_base must use HTTPS, got: {}",
                url.scheme()
            )));
        }

        // Check for localhost/loopback
        if let Some(host) = url.host_str() {
            let host_lower = host.to_lowercase();
            if host_lower == "localhost"
                || host_lower == "::1"
                || host_lower == "[::1]"
                || host_lower.starts_with("127.")
            {
                return Err(PayError::InvalidConfiguration(format!(
                    "api_base must not be localhost or loopback: {host}"
                )));
            }
        }

        Ok(())
    }
}
