//! WeChat Pay merchant SDK (API v2)
//!
//! A Rust client for the WeChat Pay v2 merchant API: signed XML requests over
//! HTTPS, reply verification, and decryption of refund notifications.
//!
//! # What does it cover?
//!
//! - **Canonical signing**: MD5 and HMAC-SHA256 signatures over sorted fields
//! - **XML codec**: flat `<xml>` documents, repeated-tag folding into `<tag>_all` lists
//! - **Merchant operations**: unified order, order query, refund, refund query
//! - **Refund notifications**: AES-256-ECB `req_info` decryption
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ Request builders │  UnifiedOrder, OrderQuery, Refund, RefundQuery
//! └────────┬─────────┘
//!          │ ParamMap
//! ┌────────▼─────────────────────────────────────┐
//! │                 PayClient                    │
//! │  ┌──────────┐  ┌──────────┐  ┌───────────┐   │
//! │  │  Signer  │  │ xml codec│  │ Transport │   │
//! │  │ MD5/HMAC │  │  _all    │  │ (sealed)  │   │
//! │  └──────────┘  └──────────┘  └───────────┘   │
//! └────────┬─────────────────────────────────────┘
//!          │ HTTPS POST text/xml (mutual TLS for refunds)
//! ┌────────▼────────┐
//! │  api.mch.weixin │
//! └─────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ## 1. Place a JSAPI order
//!
//! ```rust,no_run
//! use weixinpay::{
//!     api::{ApiOutcome, PayClient, UnifiedOrder},
//!     config::MerchantConfig,
//! };
//!
//! # async fn example() -> weixinpay::error::Result<()> {
//! let client = PayClient::new(MerchantConfig::from_file("weixinpay.toml")?)?;
//!
//! let order = UnifiedOrder::new(
//!     "Tencent-Game",
//!     "20150806125346",
//!     1,
//!     "123.12.12.123",
//!     "https://merchant.example.com/notify",
//! )
//! .openid("oUpF8uMuAJO_M2pxb1Q9zNjWeS6o");
//!
//! match order.send(&client).await? {
//!     ApiOutcome::Accepted(prepay) => {
//!         // Hand this to the front end's requestPayment call
//!         println!("{}", serde_json::to_string(&prepay.pay_params).unwrap_or_default());
//!     }
//!     ApiOutcome::Rejected(rejection) => eprintln!("rejected: {rejection}"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## 2. Sign parameters directly
//!
//! ```rust
//! use weixinpay::{
//!     sign::{SignType, sign},
//!     value::{ParamMap, Value},
//! };
//!
//! # fn example() -> weixinpay::error::Result<()> {
//! let mut params = ParamMap::new();
//! params.insert("appid".to_owned(), Value::from("wx123"));
//! params.insert("body".to_owned(), Value::from("test"));
//! params.insert("mch_id".to_owned(), Value::from("10000100"));
//! params.insert("nonce_str".to_owned(), Value::from("IBUEKYMJEU6WVUYB"));
//!
//! let signature = sign(&params, "secretkey", SignType::Md5)?;
//! assert_eq!(signature, "9D309A6CD7F690D1E55EA3C268A9D0F3");
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## 3. Handle a refund notification
//!
//! ```rust,no_run
//! use weixinpay::notify::{RefundNotification, acknowledge};
//!
//! # fn example(body: &str) -> weixinpay::error::Result<String> {
//! let notification = RefundNotification::parse(body, "secretkey")?;
//! println!("{:?} is {:?}", notification.out_refund_no(), notification.refund_status());
//! Ok(acknowledge())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`api`]: request builders and the [`PayClient`](api::PayClient)
//! - [`config`]: merchant configuration loaded from TOML
//! - [`sign`]: canonical signing string, MD5 and HMAC-SHA256
//! - [`xml`]: XML encoding and decoding with `_all` folding
//! - [`notify`]: refund notification decryption
//! - [`transport`]: sealed transport abstraction and the HTTPS implementation
//! - [`value`]: dynamic field values
//! - [`error`]: error types with recovery guidance
//!
//! # Security Considerations
//!
//! - **Merchant key**: held in [`MerchantKey`](sign::MerchantKey), zeroized on drop and
//!   redacted from `Debug` output
//! - **HTTPS only**: the API base must be an `https` URL and not a loopback host
//! - **Reply verification**: replies with a missing or mismatched `sign` are rejected,
//!   never returned as accepted
//! - **Client certificate**: refunds use mutual TLS; the PEM files are read per call
//!
//! # Error Handling
//!
//! Operations return [`Result<ApiOutcome<T>>`](error::Result). The error side covers
//! local and network failures; the provider's own refusals are values:
//!
//! ```rust
//! use weixinpay::{PayError, api::ApiOutcome};
//!
//! fn report<T>(result: weixinpay::Result<ApiOutcome<T>>) {
//!     match result {
//!         Ok(ApiOutcome::Accepted(_)) => println!("done"),
//!         Ok(ApiOutcome::Rejected(rejection)) => eprintln!("provider said no: {rejection}"),
//!         Err(PayError::InvalidRequest(msg)) => eprintln!("fix the request: {msg}"),
//!         Err(PayError::HttpError(e)) => eprintln!("network error: {e}"),
//!         Err(e) => eprintln!("other error: {e}"),
//!     }
//! }
//! # report::<()>(Ok(ApiOutcome::Accepted(())));
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![allow(
    clippy::multiple_crate_versions,
    reason = "transitive dependencies from reqwest and quick-xml"
)]

pub mod api;
pub mod config;
pub mod error;
pub mod notify;
pub mod sign;
pub mod transport;
pub mod value;
pub mod xml;

pub use error::{PayError, Result};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let _ = std::marker::PhantomData::<PayError>;
        let _ = std::marker::PhantomData::<api::PayClient>;
    }
}
