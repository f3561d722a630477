//! Merchant API operations.
//!
//! Each operation is a builder that validates its own fields and then hands a
//! parameter map to [`PayClient`], which adds the merchant identity and nonce,
//! signs, posts the XML document and verifies the reply:
//!
//! | Builder          | Endpoint              | Client certificate |
//! |------------------|-----------------------|--------------------|
//! | [`UnifiedOrder`] | `/pay/unifiedorder`   | no                 |
//! | [`OrderQuery`]   | `/pay/orderquery`     | no                 |
//! | [`Refund`]       | `/secapi/pay/refund`  | yes                |
//! | [`RefundQuery`]  | `/pay/refundquery`    | no                 |
//!
//! Builder validation failures are returned as
//! [`PayError::InvalidRequest`](crate::error::PayError::InvalidRequest) before
//! anything is sent. Provider-side failures come back as
//! [`ApiOutcome::Rejected`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use weixinpay::{
//!     api::{ApiOutcome, PayClient, TradeType, UnifiedOrder},
//!     config::MerchantConfig,
//! };
//!
//! # async fn example() -> weixinpay::error::Result<()> {
//! let client = PayClient::new(MerchantConfig::new("wx123", "10000100", "secretkey"))?;
//!
//! let order = UnifiedOrder::new(
//!     "Tencent-Game",
//!     "20150806125346",
//!     1,
//!     "123.12.12.123",
//!     "https://merchant.example.com/notify",
//! )
//! .trade_type(TradeType::Native)
//! .product_id("12235413214070356458058");
//!
//! if let ApiOutcome::Accepted(prepay) = order.send(&client).await? {
//!     println!("QR code: {:?}", prepay.code_url);
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod order_query;
mod outcome;
mod refund;
mod refund_query;
mod unified_order;

#[cfg(test)]
mod test_support;

pub use client::PayClient;
pub use order_query::OrderQuery;
pub use outcome::{ApiOutcome, RejectReason, Rejection};
pub use refund::Refund;
pub use refund_query::RefundQuery;
pub use unified_order::{JsapiPayParams, PrepayResult, TradeType, UnifiedOrder};
