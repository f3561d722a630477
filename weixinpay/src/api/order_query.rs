//! Order query.

use std::time::Duration;

use tracing::instrument;

use super::{
    client::{Call, PayClient, insert_text},
    outcome::ApiOutcome,
};
use crate::{
    error::{PayError, Result},
    transport::Transport,
    value::{ParamMap, XmlMap},
};

const PATH: &str = "/pay/orderquery";

/// Looks up an order by provider transaction id or merchant order number.
///
/// When both are set only `transaction_id` is sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderQuery {
    transaction_id: Option<String>,
    out_trade_no: Option<String>,
    timeout: Option<Duration>,
}

impl OrderQuery {
    /// Creates an empty query; set one of the identifiers before sending.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider transaction id.
    #[must_use]
    pub fn transaction_id(mut self, transaction_id: impl Into<String>) -> Self {
        self.transaction_id = Some(transaction_id.into());
        self
    }

    /// Merchant order number.
    #[must_use]
    pub fn out_trade_no(mut self, out_trade_no: impl Into<String>) -> Self {
        self.out_trade_no = Some(out_trade_no.into());
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
        Ok(params)
    }

    /// Sends the query and returns the verified reply fields.
    ///
    /// # Errors
    ///
    /// - [`PayError::InvalidRequest`] if neither identifier is set; nothing is sent.
    /// - Transport and codec errors from the exchange.
    pub async fn send<T: Transport>(self, client: &PayClient<T>) -> Result<ApiOutcome<XmlMap>> {
        client.scoped(self.execute(client)).await
    }

    #[instrument(
        name = "order_query",
        skip_all,
        fields(transaction_id = ?self.transaction_id, out_trade_no = ?self.out_trade_no)
    )]
    async fn execute<T: Transport>(self, client: &PayClient<T>) -> Result<ApiOutcome<XmlMap>> {
        let mut call = Call::new("order_query", PATH, self.params()?);
        call.timeout = self.timeout;
        client.execute(call).await
    }
}

/// Returns `value` unless it is absent or whitespace.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::test_support::{StubTransport, signed_reply, test_client},
        value::{Value, text_field},
    };

    fn paid_reply() -> String {
        signed_reply(&[
            ("return_code", "SUCCESS"),
            ("result_code", "SUCCESS"),
            ("trade_state", "SUCCESS"),
            ("transaction_id", "1008450740201411110005820873"),
        ])
    }

    #[tokio::test]
    async fn test_query_without_identifier_fails_before_network() {
        let client = test_client(StubTransport::replying(paid_reply()));

        let err = OrderQuery::new().out_trade_no("  ").send(&client).await.unwrap_err();
        assert!(matches!(err, PayError::InvalidRequest(_)));
        assert_eq!(client.transport().request_count(), 0);
    }

    #[tokio::test]
    async fn test_query_by_out_trade_no() {
        let client = test_client(StubTransport::replying(paid_reply()));

        let reply = OrderQuery::new().out_trade_no("T1").send(&client).await.unwrap().accepted().unwrap();
        assert_eq!(reply["trade_state"], Value::from("SUCCESS"));

        let sent = client.transport().last_request();
        assert_eq!(sent.url, "https://api.mch.weixin.qq.com/pay/orderquery");
        assert_eq!(text_field(&sent.fields(), "out_trade_no"), Some("T1"));
    }

    #[tokio::test]
    async fn test_transaction_id_preferred() {
        let client = test_client(StubTransport::replying(paid_reply()));

        let _ = OrderQuery::new()
            .out_trade_no("T1")
            .transaction_id("1008450740201411110005820873")
            .send(&client)
            .await
            .unwrap();

        let fields = client.transport().last_request().fields();
        assert_eq!(text_field(&fields, "transaction_id"), Some("1008450740201411110005820873"));
        assert!(!fields.contains_key("out_trade_no"));
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("a")), Some("a"));
        assert_eq!(non_blank(Some(" ")), None);
        assert_eq!(non_blank(None), None);
    }
}
