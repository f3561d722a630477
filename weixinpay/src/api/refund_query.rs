//! Refund query.

use std::time::Duration;

use tracing::instrument;

use super::{
    client::{Call, PayClient, insert_text},
    order_query::non_blank,
    outcome::ApiOutcome,
};
use crate::{
    error::{PayError, Result},
    transport::Transport,
    value::{ParamMap, Value, XmlMap},
};

const PATH: &str = "/pay/refundquery";

/// Looks up refunds by one of four identifiers.
///
/// Exactly one identifier is sent, in order of precedence: `refund_id`,
/// `out_refund_no`, `transaction_id`, `out_trade_no`. A query by order may
/// match several refunds; their fields come back numbered (`refund_id_0`,
/// `refund_id_1`, ...) and `offset` pages through them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefundQuery {
    refund_id: Option<String>,
    out_refund_no: Option<String>,
    transaction_id: Option<String>,
    out_trade_no: Option<String>,
    offset: Option<u32>,
    timeout: Option<Duration>,
}

impl RefundQuery {
    /// Creates an empty query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider refund id.
    #[must_use]
    pub fn refund_id(mut self, refund_id: impl Into<String>) -> Self {
        self.refund_id = Some(refund_id.into());
        self
    }

    /// Merchant refund number.
    #[must_use]
    pub fn out_refund_no(mut self, out_refund_no: impl Into<String>) -> Self {
        self.out_refund_no = Some(out_refund_no.into());
        self
    }

    /// Provider transaction id of the refunded order.
    #[must_use]
    pub fn transaction_id(mut self, transaction_id: impl Into<String>) -> Self {
        self.transaction_id = Some(transaction_id.into());
        self
    }

    /// Merchant order number of the refunded order.
    #[must_use]
    pub fn out_trade_no(mut self, out_trade_no: impl Into<String>) -> Self {
        self.out_trade_no = Some(out_trade_no.into());
        self
    }

    /// Index of the first refund to return when an order has more than ten.
    #[must_use]
    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Deadline for this call.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn params(&self) -> Result<ParamMap> {
        let identifier = [
            ("refund_id", &self.refund_id),
            ("out_refund_no", &self.out_refund_no),
            ("transaction_id", &self.transaction_id),
            ("out_trade_no", &self.out_trade_no),
        ]
        .into_iter()
        .find_map(|(name, value)| non_blank(value.as_deref()).map(|v| (name, v)));

        let Some((name, value)) = identifier else {
            return Err(PayError::InvalidRequest(
                "one of refund_id, out_refund_no, transaction_id or out_trade_no is required".to_owned(),
            ));
        };

        let mut params = ParamMap::new();
        insert_text(&mut params, name, Some(value));
        if let Some(offset) = self.offset {
            params.insert("offset".to_owned(), Value::from(offset));
        }
        Ok(params)
    }

    /// Sends the query and returns the verified reply fields.
    ///
    /// # Errors
    ///
    /// - [`PayError::InvalidRequest`] if no identifier is set; nothing is sent.
    /// - Transport and codec errors from the exchange.
    pub async fn send<T: Transport>(self, client: &PayClient<T>) -> Result<ApiOutcome<XmlMap>> {
        client.scoped(self.execute(client)).await
    }

    #[instrument(name = "refund_query", skip_all, fields(offset = ?self.offset))]
    async fn execute<T: Transport>(self, client: &PayClient<T>) -> Result<ApiOutcome<XmlMap>> {
        let mut call = Call::new("refund_query", PATH, self.params()?);
        call.timeout = self.timeout;
        client.execute(call).await
    }
}
