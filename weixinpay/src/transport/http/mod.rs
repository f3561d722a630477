//! HTTP transport implementation using reqwest over rustls.

use std::{fs, path::Path};

use reqwest::{Client, ClientBuilder, Identity};
use tracing::{debug, instrument};
use url::Url;

use super::config::HttpConfig;
use crate::{
    config::ClientCertConfig,
    error::{PayError, Result},
    transport::{Transport, TransportResponse, XmlRequest, sealed},
};

const CONTENT_TYPE: &str = "text/xml; charset=utf-8";

/// Validates URL for security constraints.
///
/// Ensures the URL uses HTTPS and does not point to localhost.
fn validate_url(url: &Url) -> Result<()> {
    if url.scheme() != "https" {
        return Err(PayError::TransportError("Only HTTPS URLs are allowed".to_owned()));
    }

    if let Some(host) = url.host_str()
        && (host == "localhost" || host == "127.0.0.1" || host == "::1" || host == "[::1]")
    {
        return Err(PayError::TransportError("Localhost URLs are not allowed".to_owned()));
    }

    Ok(())
}

/// Reads a PEM file, mapping I/O failures to configuration errors.
fn read_pem(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| {
        PayError::InvalidConfiguration(format!("cannot read '{}': {e}", path.display()))
    })
}

/// Loads the client certificate and private key into a reqwest identity.
///
/// Both files are read on every call.
fn load_identity(cert: &ClientCertConfig) -> Result<Identity> {
    let mut pem = read_pem(&cert.key_path)?;
    pem.push(b'\n');
    pem.extend(read_pem(&cert.cert_path)?);

    Identity::from_pem(&pem).map_err(|e| {
        PayError::InvalidConfiguration(format!(
            "invalid client certificate '{}' / key '{}': {e}",
            cert.cert_path.display(),
            cert.key_path.display()
        ))
    })
}

/// HTTPS transport using reqwest.
///
/// Plain requests share one pooled client. Requests carrying a client
/// certificate get a dedicated client built with that identity.
///
/// # Examples
///
/// ```
/// use weixinpay::transport::{HttpConfig, HttpTransport};
///
/// let config = HttpConfig { pool_max_idle_per_host: 20, timeout_secs: 60, connect_timeout_secs: 15 };
///
/// let transport = HttpTransport::with_config(&config).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: HttpConfig,
}

impl sealed::private::Sealed for HttpTransport {}

impl HttpTransport {
    /// Creates a new HTTP transport with default settings.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client creation fails.
    pub fn new() -> Result<Self> {
        Self::with_config(&HttpConfig::default())
    }

    /// Creates HTTP transport with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client creation fails.
    pub fn with_config(config: &HttpConfig) -> Result<Self> {
        let client = Self::builder(config).build().map_err(PayError::HttpError)?;
        Ok(Self { client, config: config.clone() })
    }

    /// Returns the configuration the transport was built with.
    #[must_use]
    pub const fn config(&self) -> &HttpConfig {
        &self.config
    }

    fn builder(config: &HttpConfig) -> ClientBuilder {
        Client::builder()
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
    }

    fn client_for(&self, identity: Option<&ClientCertConfig>) -> Result<Client> {
        match identity {
            None => Ok(self.client.clone()),
            Some(cert) => Self::builder(&self.config)
                .identity(load_identity(cert)?)
                .build()
                .map_err(PayError::HttpError),
        }
    }

    #[instrument(
        skip(self, request),
        fields(url = %request.url, body_len = request.body.len(), mutual_tls = request.identity.is_some())
    )]
    async fn execute_request(&self, request: XmlRequest<'_>) -> Result<TransportResponse> {
        let url = Url::parse(&request.url)
            .map_err(|e| PayError::TransportError(format!("invalid url '{}': {e}", request.url)))?;

        // Security: Validate URL scheme and host
        validate_url(&url)?;

        let client = self.client_for(request.identity)?;

        let mut builder = client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE)
            .body(request.body.into_bytes());
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(PayError::TransportError(format!(
                "provider returned status {}",
                status.as_u16()
            )));
        }

        let bytes = response.bytes().await.map_err(PayError::HttpError)?;
        let body = String::from_utf8(bytes.to_vec())
            .map_err(|e| PayError::MalformedDocument(format!("response is not UTF-8: {e}")))?;

        debug!(status = status.as_u16(), body_len = body.len(), "provider replied");
        Ok(TransportResponse { status: status.as_u16(), body })
    }
}

impl Transport for HttpTransport {
    async fn post_xml<'a>(&'a self, request: XmlRequest<'a>) -> Result<TransportResponse> {
        self.execute_request(request).await
    }

    fn protocol_name(&self) -> &'static str {
        "https"
    }
}
