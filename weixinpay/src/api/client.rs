//! Client shared by all request builders.

use std::{future::Future, time::Duration};

use tracing::{Dispatch, debug, error, instrument::WithSubscriber};

use super::outcome::{ApiOutcome, RejectReason, Rejection};
use crate::{
    config::{ClientCertConfig, MerchantConfig},
    error::{PayError, Result},
    sign::{SIGN_FIELD, SignType, Signer, nonce_str},
    transport::{HttpTransport, Transport, XmlRequest},
    value::{ParamMap, Value, XmlMap, text_field},
    xml,
};

/// Fields every signed request carries.
const COMMON_FIELDS: &[&str] = &["appid", "mch_id", "nonce_str", SIGN_FIELD];

/// Merchant API client.
///
/// Holds the validated merchant configuration, the signer and the transport.
/// The client is immutable and may be shared between tasks; request builders
/// borrow it only for the duration of their call.
///
/// # Examples
///
/// ```rust,no_run
/// use weixinpay::{
///     api::{ApiOutcome, OrderQuery, PayClient},
///     config::MerchantConfig,
/// };
///
/// # async fn example() -> weixinpay::error::Result<()> {
/// let client = PayClient::new(MerchantConfig::new("wx123", "10000100", "secretkey"))?;
///
/// match OrderQuery::new().out_trade_no("1217752501201407033233368018").send(&client).await? {
///     ApiOutcome::Accepted(reply) => println!("{:?}", reply.get("trade_state")),
///     ApiOutcome::Rejected(rejection) => eprintln!("rejected: {rejection}"),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct PayClient<T: Transport = HttpTransport> {
    config: MerchantConfig,
    signer: Signer,
    transport: T,
    dispatch: Option<Dispatch>,
}

impl PayClient<HttpTransport> {
    /// Creates a client with an HTTPS transport built from `config.http`.
    ///
    /// # Errors
    ///
    /// Returns [`PayError::InvalidConfiguration`] if the configuration does not
    /// validate, or [`PayError::HttpError`] if the HTTP client cannot be built.
    pub fn new(config: MerchantConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::with_config(&config.http)?;
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> PayClient<T> {
    /// Creates a client over a specific transport.
    ///
    /// # Errors
    ///
    /// Returns [`PayError::InvalidConfiguration`] if the configuration does not validate.
    pub fn with_transport(config: MerchantConfig, transport: T) -> Result<Self> {
        config.validate()?;
        let signer = Signer::new(config.key.clone(), config.sign_type);
        Ok(Self { config, signer, transport, dispatch: None })
    }

    /// Routes this client's log events to `dispatch` instead of the caller's
    /// default subscriber.
    #[must_use]
    pub fn with_dispatch(mut self, dispatch: impl Into<Dispatch>) -> Self {
        self.dispatch = Some(dispatch.into());
        self
    }

    /// Returns the merchant configuration.
    #[must_use]
    pub const fn config(&self) -> &MerchantConfig {
        &self.config
    }

    /// Returns the signer.
    #[must_use]
    pub const fn signer(&self) -> &Signer {
        &self.signer
    }

    /// Returns the transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the configured signature algorithm.
    #[must_use]
    pub const fn sign_type(&self) -> SignType {
        self.signer.sign_type()
    }

    /// Runs `future` under the injected dispatcher, if any.
    pub(crate) async fn scoped<F: Future>(&self, future: F) -> F::Output {
        match &self.dispatch {
            Some(dispatch) => future.with_subscriber(dispatch.clone()).await,
            None => future.await,
        }
    }

    /// Signs, sends and verifies one call.
    ///
    /// The merchant identity, `sign_type` (for HMAC-SHA256) and a fresh nonce are
    /// added to `call.params` before signing.
    pub(crate) async fn execute(&self, call: Call<'_>) -> Result<ApiOutcome<XmlMap>> {
        let Call { operation, path, mut params, required, identity, timeout } = call;

        params.insert("appid".to_owned(), Value::from(self.config.appid.as_str()));
        params.insert("mch_id".to_owned(), Value::from(self.config.mch_id.as_str()));
        if self.sign_type() != SignType::Md5 {
            params.insert("sign_type".to_owned(), Value::from(self.sign_type().as_str()));
        }
        params.insert("nonce_str".to_owned(), Value::from(nonce_str()));

        let signature = self.signer.sign(&params)?;
        params.insert(SIGN_FIELD.to_owned(), Value::from(signature));

        ensure_present(&params, COMMON_FIELDS.iter().chain(required))?;

        let body = xml::encode(xml::ROOT, &params);
        debug!(operation, protocol = self.transport.protocol_name(), field_count = params.len(), "sending request");

        let mut request = XmlRequest::new(self.config.endpoints.url(path), body).with_timeout(timeout);
        if let Some(identity) = identity {
            request = request.with_identity(identity);
        }

        let response = self.transport.post_xml(request).await?;
        let reply = xml::decode(&response.body)?;
        debug!(operation, field_count = reply.len(), "decoded reply");

        self.check_reply(operation, reply)
    }

    fn check_reply(&self, operation: &str, reply: XmlMap) -> Result<ApiOutcome<XmlMap>> {
        if text_field(&reply, "return_code") != Some("SUCCESS") {
            return Ok(reject(operation, RejectReason::return_code(&reply), reply));
        }
        if text_field(&reply, SIGN_FIELD).is_none() {
            return Ok(reject(operation, RejectReason::MissingSignature, reply));
        }
        if !self.signer.verify(&reply)? {
            return Ok(reject(operation, RejectReason::SignatureMismatch, reply));
        }
        Ok(ApiOutcome::Accepted(reply))
    }
}

/// Logs a provider-side failure and wraps it.
pub(crate) fn reject<T>(operation: &str, reason: RejectReason, reply: XmlMap) -> ApiOutcome<T> {
    error!(
        operation,
        %reason,
        return_msg = text_field(&reply, "return_msg").unwrap_or_default(),
        "provider rejected request"
    );
    ApiOutcome::Rejected(Rejection::new(reason, reply))
}

/// One operation's request, before the common fields are added.
#[derive(Debug)]
pub(crate) struct Call<'a> {
    pub operation: &'static str,
    pub path: &'static str,
    pub params: ParamMap,
    /// Operation-specific fields that must be present and non-blank.
    pub required: &'static [&'static str],
    pub identity: Option<&'a ClientCertConfig>,
    pub timeout: Option<Duration>,
}

impl Call<'_> {
    pub(crate) fn new(operation: &'static str, path: &'static str, params: ParamMap) -> Self {
        Self { operation, path, params, required: &[], identity: None, timeout: None }
    }
}

fn ensure_present<'a>(params: &ParamMap, fields: impl Iterator<Item = &'a &'static str>) -> Result<()> {
    let missing: Vec<&str> = fields
        .filter(|name| params.get(**name).is_none_or(Value::is_blank))
        .copied()
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(PayError::InvalidRequest(format!("missing required fields: {}", missing.join(", "))))
    }
}

/// Inserts the trimmed `value` unless it is absent or empty.
pub(crate) fn insert_text(params: &mut ParamMap, name: &str, value: Option<&str>) {
    if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
        params.insert(name.to_owned(), Value::from(value));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tracing_subscriber::{Registry, fmt::MakeWriter, layer::SubscriberExt};

    use super::*;
    use crate::api::test_support::{StubTransport, signed_reply, signed_reply_with, test_client, test_config};

    #[tokio::test]
    async fn test_execute_adds_common_fields_and_signs() {
        let client = test_client(StubTransport::replying(signed_reply(&[("return_code", "SUCCESS")])));
        let mut params = ParamMap::new();
        params.insert("out_trade_no".to_owned(), Value::from("T1"));

        let outcome = client.execute(Call::new("test", "/pay/test", params)).await.unwrap();
        assert!(outcome.is_accepted());

        let sent = client.transport().last_request();
        assert_eq!(sent.url, "https://api.mch.weixin.qq.com/pay/test");
        let fields = xml::decode(&sent.body).unwrap();
        assert_eq!(text_field(&fields, "appid"), Some("wx123"));
        assert_eq!(text_field(&fields, "mch_id"), Some("10000100"));
        assert_eq!(text_field(&fields, "nonce_str").map(str::len), Some(16));
        assert!(!fields.contains_key("sign_type"));
        assert!(client.signer().verify(&fields).unwrap());
    }

    #[tokio::test]
    async fn test_signature_covers_wire_text() {
        let client = test_client(StubTransport::replying(signed_reply(&[("return_code", "SUCCESS")])));
        let mut params = ParamMap::new();
        params.insert("out_trade_no".to_owned(), Value::from(" T1 "));
        params.insert("attach".to_owned(), Value::from("  "));

        let _ = client.execute(Call::new("test", "/pay/test", params)).await.unwrap();

        let sent = client.transport().last_request();
        assert!(sent.body.contains("<out_trade_no>T1</out_trade_no>"));
        assert!(!sent.body.contains("attach"));
        assert!(client.signer().verify(&sent.fields()).unwrap());
    }

    #[tokio::test]
    async fn test_execute_hmac_sends_sign_type() {
        let config = test_config().with_sign_type(SignType::HmacSha256);
        let reply = signed_reply_with(&[("return_code", "SUCCESS")], SignType::HmacSha256);
        let client = PayClient::with_transport(config, StubTransport::replying(reply)).unwrap();

        let outcome = client.execute(Call::new("test", "/pay/test", ParamMap::new())).await.unwrap();
        assert!(outcome.is_accepted());

        let fields = xml::decode(&client.transport().last_request().body).unwrap();
        assert_eq!(text_field(&fields, "sign_type"), Some("HMAC-SHA256"));
        assert!(client.signer().verify(&fields).unwrap());
    }

    #[tokio::test]
    async fn test_execute_missing_required_field() {
        let client = test_client(StubTransport::replying(String::new()));
        let mut call = Call::new("test", "/pay/test", ParamMap::new());
        call.required = &["out_refund_no"];

        let err = client.execute(call).await.unwrap_err();
        assert!(matches!(err, PayError::InvalidRequest(ref msg) if msg.contains("out_refund_no")));
        assert_eq!(client.transport().request_count(), 0);
    }

    #[tokio::test]
    async fn test_return_code_fail_is_rejected() {
        let client = test_client(StubTransport::replying(
            "<xml><return_code>FAIL</return_code><return_msg>invalid appid</return_msg></xml>".to_owned(),
        ));

        let outcome = client.execute(Call::new("test", "/pay/test", ParamMap::new())).await.unwrap();
        let rejection = outcome.rejection().unwrap();
        assert_eq!(
            rejection.reason,
            RejectReason::ReturnCode { code: "FAIL".to_owned(), message: "invalid appid".to_owned() }
        );
    }

    #[tokio::test]
    async fn test_unsigned_reply_is_rejected() {
        let client = test_client(StubTransport::replying(
            "<xml><return_code>SUCCESS</return_code></xml>".to_owned(),
        ));

        let outcome = client.execute(Call::new("test", "/pay/test", ParamMap::new())).await.unwrap();
        assert_eq!(outcome.rejection().map(|r| &r.reason), Some(&RejectReason::MissingSignature));
    }

    #[tokio::test]
    async fn test_tampered_reply_is_rejected() {
        let reply = signed_reply(&[("return_code", "SUCCESS"), ("total_fee", "100")])
            .replace("<total_fee>100</total_fee>", "<total_fee>1</total_fee>");
        let client = test_client(StubTransport::replying(reply));

        let outcome = client.execute(Call::new("test", "/pay/test", ParamMap::new())).await.unwrap();
        assert_eq!(outcome.rejection().map(|r| &r.reason), Some(&RejectReason::SignatureMismatch));
    }

    #[tokio::test]
    async fn test_malformed_reply_is_error() {
        let client = test_client(StubTransport::replying("<xml><return_code>".to_owned()));

        let err = client.execute(Call::new("test", "/pay/test", ParamMap::new())).await.unwrap_err();
        assert!(matches!(err, PayError::MalformedDocument(_)));
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let client = test_client(StubTransport::failing("provider returned status 502"));

        let err = client.execute(Call::new("test", "/pay/test", ParamMap::new())).await.unwrap_err();
        assert!(matches!(err, PayError::TransportError(_)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = MerchantConfig::new("wx123", "10000100", "");
        assert!(PayClient::with_transport(config, StubTransport::replying(String::new())).is_err());
    }

    #[test]
    fn test_insert_text_skips_blank() {
        let mut params = ParamMap::new();
        insert_text(&mut params, "a", Some("x"));
        insert_text(&mut params, "b", Some("  "));
        insert_text(&mut params, "c", None);
        insert_text(&mut params, "d", Some(" y "));
        assert_eq!(params.len(), 2);
        assert_eq!(params["d"], Value::from("y"));
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[tokio::test]
    async fn test_rejection_logged_to_injected_dispatch() {
        let captured = Captured::default();
        let subscriber = Registry::default()
            .with(tracing_subscriber::fmt::layer().with_writer(captured.clone()).with_ansi(false));

        let client = test_client(StubTransport::replying(
            "<xml><return_code>FAIL</return_code><return_msg>invalid mch_id</return_msg></xml>".to_owned(),
        ))
        .with_dispatch(Dispatch::new(subscriber));

        let outcome = client
            .scoped(client.execute(Call::new("order_query", "/pay/orderquery", ParamMap::new())))
            .await
            .unwrap();
        assert!(!outcome.is_accepted());

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("provider rejected request"));
        assert!(logs.contains("invalid mch_id"));
        assert!(!logs.contains("secretkey"));
    }
}
