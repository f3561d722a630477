//! Error types for the WeChat Pay SDK.
//!
//! All errors implement the standard [`std::error::Error`] trait via [`thiserror::Error`].
//!
//! # Error Categories
//!
//! - **Caller misuse** ([`PayError::InvalidConfiguration`], [`PayError::InvalidRequest`]):
//!   raised before anything is sent over the wire
//! - **Codec failures** ([`PayError::MalformedDocument`], [`PayError::DecryptionFailed`]):
//!   the provider's XML or a notification payload could not be read
//! - **Notification failures** ([`PayError::NotificationRejected`]): an inbound
//!   notification reports a non-`SUCCESS` `return_code`
//! - **Network failures** ([`PayError::HttpError`], [`PayError::TransportError`])
//!
//! A well-formed provider reply that reports failure (non-`SUCCESS` `return_code`,
//! bad signature) is **not** an error: it is returned as
//! [`ApiOutcome::Rejected`](crate::api::ApiOutcome::Rejected) so callers inspect it
//! like any other value.
//!
//! # Examples
//!
//! ```
//! use weixinpay::error::{PayError, Result};
//!
//! fn require_openid(openid: &str) -> Result<&str> {
//!     if openid.is_empty() {
//!         return Err(PayError::InvalidRequest("trade_type=JSAPI requires openid".to_owned()));
//!     }
//!     Ok(openid)
//! }
//! # assert!(require_openid("").is_err());
//! ```

use thiserror::Error;

/// Result type alias for SDK operations.
pub type Result<T> = std::result::Result<T, PayError>;

/// Errors that can occur while talking to the payment provider.
///
/// # Error Recovery
///
/// - **Configuration errors** ([`InvalidConfiguration`](Self::InvalidConfiguration)): fix the
///   merchant configuration; retrying cannot help
/// - **Request errors** ([`InvalidRequest`](Self::InvalidRequest)): fix the request builder
///   inputs; nothing was sent
/// - **Transient errors** ([`HttpError`](Self::HttpError),
///   [`TransportError`](Self::TransportError)): retrying is a caller decision, payment
///   creation is not idempotent
#[must_use = "errors should be handled, propagated, or explicitly panicked"]
#[derive(Debug, Error)]
pub enum PayError {
    /// Merchant configuration is unusable.
    ///
    /// Common causes include:
    /// - Unsupported signature algorithm (only `MD5` and `HMAC-SHA256` exist)
    /// - Missing `appid`, `mch_id` or merchant key
    /// - Unreadable client certificate files for refund calls
    /// - Non-HTTPS API base URL
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Request failed builder-level validation and was never sent.
    ///
    /// Raised for missing mutually-required fields, e.g. `openid` for JSAPI orders or
    /// none of the order identifiers for a query.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// XML document could not be parsed.
    #[error("Malformed XML document: {0}")]
    MalformedDocument(String),

    /// Refund notification payload could not be decrypted.
    ///
    /// Covers every step of the pipeline: base64, AES key setup, block alignment,
    /// UTF-8 decoding and the inner XML document.
    #[error("Notification decryption failed: {0}")]
    DecryptionFailed(String),

    /// Inbound notification carries a non-`SUCCESS` `return_code`.
    ///
    /// The provider is reporting a failure in the notification itself, so there is
    /// no `req_info` to decrypt. Not a caller mistake.
    #[error("Notification reports failure: {code}: {message}")]
    NotificationRejected {
        /// The envelope's `return_code`.
        code: String,
        /// The envelope's `return_msg`, empty when absent.
        message: String,
    },

    /// HTTP request failed.
    ///
    /// Wraps [`reqwest::Error`]: timeouts, DNS failures, TLS handshake errors.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Transport-level failure that is not a [`reqwest::Error`].
    ///
    /// Raised for non-2xx status codes and for URLs the transport refuses to call.
    #[error("Transport error: {0}")]
    TransportError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = PayError::InvalidRequest("missing openid".into());
        assert_eq!(error.to_string(), "Invalid request: missing openid");
    }

    #[test]
    fn test_invalid_configuration_error() {
        let error = PayError::InvalidConfiguration("unsupported sign type: SHA1".to_owned());
        assert!(error.to_string().contains("Invalid configuration"));
        assert!(error.to_string().contains("SHA1"));
    }

    #[test]
    fn test_decryption_failed_error() {
        let error = PayError::DecryptionFailed("bad base64".into());
        assert_eq!(error.to_string(), "Notification decryption failed: bad base64");
    }

    #[test]
    fn test_notification_rejected_error() {
        let error = PayError::NotificationRejected { code: "FAIL".to_owned(), message: "system busy".to_owned() };
        assert_eq!(error.to_string(), "Notification reports failure: FAIL: system busy");
    }

    #[test]
    fn test_malformed_document_error() {
        let error = PayError::MalformedDocument("unexpected end".into());
        assert!(error.to_string().starts_with("Malformed XML document"));
    }
}
