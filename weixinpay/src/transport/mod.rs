//! Transport abstraction for provider calls.
//!
//! Every provider operation is a single XML `POST`. The sealed [`Transport`]
//! trait keeps the request builders independent of the HTTP client so they can
//! be driven by an in-memory transport in tests.
//!
//! # Examples
//!
//! ```rust,no_run
//! use weixinpay::transport::{HttpTransport, Transport, XmlRequest};
//!
//! # async fn example() -> weixinpay::error::Result<()> {
//! let transport = HttpTransport::new()?;
//!
//! let request = XmlRequest::new(
//!     "https://api.mch.weixin.qq.com/pay/orderquery",
//!     "<xml><appid>wx123</appid></xml>".to_owned(),
//! );
//!
//! let response = transport.post_xml(request).await?;
//! println!("Status: {}", response.status);
//! # Ok(())
//! # }
//! ```

#[allow(
    redundant_imports,
    reason = "Future needed for RPITIT despite being in Edition 2024 prelude"
)]
use std::future::Future;
use std::time::Duration;

use crate::{config::ClientCertConfig, error::Result};

pub mod config;
pub mod http;
pub(crate) mod sealed;

pub use config::HttpConfig;
pub use http::HttpTransport;

/// One XML `POST` to the provider.
#[derive(Debug, Clone)]
pub struct XmlRequest<'a> {
    /// Full endpoint URL.
    pub url: String,
    /// UTF-8 XML document.
    pub body: String,
    /// Client certificate for mutual TLS (refund calls only).
    pub identity: Option<&'a ClientCertConfig>,
    /// Per-request deadline, overriding the client-wide timeout.
    pub timeout: Option<Duration>,
}

impl<'a> XmlRequest<'a> {
    /// Creates a request without client certificate or deadline.
    #[must_use]
    pub fn new(url: impl Into<String>, body: String) -> Self {
        Self { url: url.into(), body, identity: None, timeout: None }
    }

    /// Attaches a client certificate.
    #[must_use]
    pub fn with_identity(mut self, identity: &'a ClientCertConfig) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Sets a per-request deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Response from transport operations.
#[derive(Debug)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body, decoded as UTF-8.
    pub body: String,
}

/// Transport protocol abstraction.
///
/// This trait is sealed; only implementations within this crate are allowed.
///
/// # Errors
///
/// Implementations return:
/// - [`PayError::HttpError`](crate::error::PayError::HttpError) when the exchange fails
/// - [`PayError::TransportError`](crate::error::PayError::TransportError) on a non-2xx status
/// - [`PayError::MalformedDocument`](crate::error::PayError::MalformedDocument) if the body is not UTF-8
/// - [`PayError::InvalidConfiguration`](crate::error::PayError::InvalidConfiguration) if a client
///   certificate cannot be loaded
pub trait Transport: sealed::private::Sealed + Send + Sync {
    /// Posts an XML document and returns the reply.
    ///
    /// # Errors
    ///
    /// See the trait-level documentation.
    fn post_xml<'a>(
        &'a self,
        request: XmlRequest<'a>,
    ) -> impl Future<Output = Result<TransportResponse>> + Send + 'a;

    /// Returns the protocol name for logging.
    fn protocol_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xml_request_defaults() {
        let request = XmlRequest::new("https://example.com/pay", "<xml></xml>".to_owned());
        assert_eq!(request.url, "https://example.com/pay");
        assert_eq!(request.body, "<xml></xml>");
        assert!(request.identity.is_none());
        assert!(request.timeout.is_none());
    }

    #[test]
    fn test_xml_request_builders() {
        let identity = ClientCertConfig::default();
        let request = XmlRequest::new("https://example.com", String::new())
            .with_identity(&identity)
            .with_timeout(Some(Duration::from_secs(5)));

        assert_eq!(request.identity, Some(&identity));
        assert_eq!(request.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_transport_response_debug() {
        let response = TransportResponse { status: 200, body: "<xml/>".to_owned() };

        let debug_str = format!("{response:?}");
        assert!(debug_str.contains("TransportResponse"));
        assert!(debug_str.contains("200"));
    }
}
