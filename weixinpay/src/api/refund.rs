//! Refund application. Requires the merchant's client certificate.

use std::{path::PathBuf, time::Duration};

use tracing::instrument;

use super::{
    client::{Call, PayClient, insert_text},
    order_query::non_blank,
    outcome::ApiOutcome,
};
use crate::{
    config::ClientCertConfig,
    error::{PayError, Result},
    transport::Transport,
    value::{ParamMap, Value, XmlMap},
};

const PATH: &str = "/secapi/pay/refund";

const REQUIRED: &[&str] = &["out_refund_no", "total_fee", "refund_fee"];

/// Refund request.
///
/// The original order is identified by `transaction_id` or `out_trade_no`;
/// when both are set only `transaction_id` is sent.
///
/// # Examples
///
/// ```rust,no_run
/// use weixinpay::{
///     api::{PayClient, Refund},
///     config::MerchantConfig,
/// };
///
/// # async fn example() -> weixinpay::error::Result<()> {
/// let client = PayClient::new(MerchantConfig::new("wx123", "10000100", "secretkey"))?;
///
/// let outcome = Refund::new("R20191206001", 100, 100)
///     .out_trade_no("T20191206001")
///     .refund_desc("out of stock")
///     .certificate("/etc/pay/apiclient_cert.pem", "/etc/pay/apiclient_key.pem")
///     .send(&client)
///     .await?;
/// println!("accepted: {}", outcome.is_accepted());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refund {
    out_refund_no: String,
    total_fee: i64,
    refund_fee: i64,
    transaction_id: Option<String>,
    out_trade_no: Option<String>,
    refund_fee_type: Option<String>,
    refund_desc: Option<String>,
    refund_account: Option<String>,
    notify_url: Option<String>,
    certificate: Option<ClientCertConfig>,
    timeout: Option<Duration>,
}

impl Refund {
    /// Creates a refund of `refund_fee` out of an order of `total_fee` (both in fen).
    #[must_use]
    pub fn new(out_refund_no: impl Into<String>, total_fee: i64, refund_fee: i64) -> Self {
        Self {
            out_refund_no: out_refund_no.into(),
            total_fee,
            refund_fee,
            transaction_id: None,
            out_trade_no: None,
            refund_fee_type: None,
            refund_desc: None,
            refund_account: None,
            notify_url: None,
            certificate: None,
            timeout: None,
        }
    }

    /// Provider transaction id of the original order.
    #[must_use]
    pub fn transaction_id(mut self, transaction_id: impl Into<String>) -> Self {
        self.transaction_id = Some(transaction_id.into());
        self
    }

    /// Merchant order number of the original order.
    #[must_use]
    pub fn out_trade_no(mut self, out_trade_no: impl Into<String>) -> Self {
        self.out_trade_no = Some(out_trade_no.into());
        self
    }

    /// Refund currency, `CNY` if unset.
    #[must_use]
    pub fn refund_fee_type(mut self, refund_fee_type: impl Into<String>) -> Self {
        self.refund_fee_type = Some(refund_fee_type.into());
        self
    }

    /// Reason shown to the payer.
    #[must_use]
    pub fn refund_desc(mut self, refund_desc: impl Into<String>) -> Self {
        self.refund_desc = Some(refund_desc.into());
        self
    }

    /// Funding source: `REFUND_SOURCE_UNSETTLED_FUNDS` (default) or
    /// `REFUND_SOURCE_RECHARGE_FUNDS`.
    #[must_use]
    pub fn refund_account(mut self, refund_account: impl Into<String>) -> Self {
        self.refund_account = Some(refund_account.into());
        self
    }

    /// Refund result notification URL, overriding the one set in the merchant platform.
    #[must_use]
    pub fn notify_url(mut self, notify_url: impl Into<String>) -> Self {
        self.notify_url = Some(notify_url.into());
        self
    }

    /// Client certificate for this call instead of the configured one.
    #[must_use]
    pub fn certificate(mut self, cert_path: impl Into<PathBuf>, key_path: impl Into<PathBuf>) -> Self {
        self.certificate = Some(ClientCertConfig::new(cert_path, key_path));
        self
    }

    /// Deadline for this call.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn params(&self) -> Result<ParamMap> {
        let mut params = ParamMap::new();
        match (non_blank(self.transaction_id.as_deref()), non_blank(self.out_trade_no.as_deref())) {
            (Some(transaction_id), _) => insert_text(&mut params, "transaction_id", Some(transaction_id)),
            (None, Some(out_trade_no)) => insert_text(&mut params, "out_trade_no", Some(out_trade_no)),
            (None, None) => {
                return Err(PayError::InvalidRequest(
                    "one of transaction_id or out_trade_no is required".to_owned(),
                ));
            }
        }

        insert_text(&mut params, "out_refund_no", Some(self.out_refund_no.as_str()));
        params.insert("total_fee".to_owned(), Value::from(self.total_fee));
        params.insert("refund_fee".to_owned(), Value::from(self.refund_fee));
        insert_text(&mut params, "refund_fee_type", self.refund_fee_type.as_deref());
        insert_text(&mut params, "refund_desc", self.refund_desc.as_deref());
        insert_text(&mut params, "refund_account", self.refund_account.as_deref());
        insert_text(&mut params, "notify_url", self.notify_url.as_deref());
        Ok(params)
    }

    /// Applies for the refund over mutual TLS.
    ///
    /// The certificate files are read for every call.
    ///
    /// # Errors
    ///
    /// - [`PayError::InvalidRequest`] if no order identifier or `out_refund_no` is set; nothing is sent.
    /// - [`PayError::InvalidConfiguration`] if the certificate files cannot be loaded.
    /// - Transport and codec errors from the exchange.
    pub async fn send<T: Transport>(self, client: &PayClient<T>) -> Result<ApiOutcome<XmlMap>> {
        client.scoped(self.execute(client)).await
    }

    #[instrument(
        name = "refund",
        skip_all,
        fields(out_refund_no = %self.out_refund_no, refund_fee = self.refund_fee, total_fee = self.total_fee)
    )]
    async fn execute<T: Transport>(self, client: &PayClient<T>) -> Result<ApiOutcome<XmlMap>> {
        let identity = self.certificate.as_ref().unwrap_or(&client.config().cert);

        let mut call = Call::new("refund", PATH, self.params()?);
        call.required = REQUIRED;
        call.identity = Some(identity);
        call.timeout = self.timeout;
        client.execute(call).await
    }
}
