//! Results of provider calls.

use std::fmt;

use crate::value::{XmlMap, text_field};

/// Result of a well-formed provider exchange.
///
/// Caller mistakes and transport failures are [`PayError`](crate::error::PayError)s.
/// A reply the provider sent but that reports failure, or that fails signature
/// verification, is a [`Rejection`] the caller inspects.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiOutcome<T> {
    /// The provider accepted the request and the reply signature verified.
    Accepted(T),
    /// The provider rejected the request, or its reply could not be trusted.
    Rejected(Rejection),
}

impl<T> ApiOutcome<T> {
    /// Returns `true` for [`ApiOutcome::Accepted`].
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    /// Returns the accepted value, discarding a rejection.
    #[must_use]
    pub fn accepted(self) -> Option<T> {
        match self {
            Self::Accepted(value) => Some(value),
            Self::Rejected(_) => None,
        }
    }

    /// Returns the rejection, if any.
    #[must_use]
    pub const fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Accepted(_) => None,
            Self::Rejected(rejection) => Some(rejection),
        }
    }

    /// Maps the accepted value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiOutcome<U> {
        match self {
            Self::Accepted(value) => ApiOutcome::Accepted(f(value)),
            Self::Rejected(rejection) => ApiOutcome::Rejected(rejection),
        }
    }
}

/// A provider-side failure together with the decoded reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Why the reply was not accepted.
    pub reason: RejectReason,
    /// Decoded reply fields.
    pub response: XmlMap,
}

impl Rejection {
    pub(crate) fn new(reason: RejectReason, response: XmlMap) -> Self {
        Self { reason, response }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.reason.fmt(f)
    }
}

/// Reason a reply was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// `return_code` is not `SUCCESS`.
    ReturnCode {
        /// Reported `return_code` (empty if absent).
        code: String,
        /// Reported `return_msg`.
        message: String,
    },
    /// The reply carries no `sign` field.
    MissingSignature,
    /// The reply's `sign` does not match its contents.
    SignatureMismatch,
    /// `return_code` is `SUCCESS` but the business result failed.
    ResultCode {
        /// Reported `result_code`, or `err_code` when present.
        code: String,
        /// Reported `err_code_des`.
        description: String,
    },
}

impl RejectReason {
    /// Builds a [`RejectReason::ReturnCode`] from a reply.
    pub(crate) fn return_code(reply: &XmlMap) -> Self {
        Self::ReturnCode {
            code: text_field(reply, "return_code").unwrap_or_default().to_owned(),
            message: text_field(reply, "return_msg").unwrap_or_default().to_owned(),
        }
    }

    /// Builds a [`RejectReason::ResultCode`] from a reply.
    pub(crate) fn result_code(reply: &XmlMap) -> Self {
        let code = text_field(reply, "err_code")
            .or_else(|| text_field(reply, "result_code"))
            .unwrap_or_default();
        Self::ResultCode {
            code: code.to_owned(),
            description: text_field(reply, "err_code_des").unwrap_or_default().to_owned(),
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReturnCode { code, message } => write!(f, "return_code {code}: {message}"),
            Self::MissingSignature => f.write_str("reply is not signed"),
            Self::SignatureMismatch => f.write_str("reply signature does not verify"),
            Self::ResultCode { code, description } => write!(f, "result {code}: {description}"),
        }
    }
}
