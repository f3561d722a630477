//! Canonical request signing.
//!
//! Every request and every provider reply carries a `sign` field computed over the
//! remaining fields:
//!
//! ```text
//! string = "k1=v1&k2=v2&...&kN=vN&key=<merchant key>"   (keys ascending, blank values skipped)
//! MD5:         upper(hex(md5(string)))
//! HMAC-SHA256: upper(base64(hmac_sha256(merchant key, string)))
//! ```
//!
//! The same function signs the client-facing JSAPI payload returned after a unified
//! order.
//!
//! # Examples
//!
//! ```rust
//! use weixinpay::{
//!     sign::{SignType, Signer},
//!     value::{ParamMap, Value},
//! };
//!
//! # fn example() -> weixinpay::error::Result<()> {
//! let signer = Signer::new("secretkey", SignType::Md5);
//!
//! let mut params = ParamMap::new();
//! params.insert("appid".to_owned(), Value::from("wx123"));
//! params.insert("mch_id".to_owned(), Value::from("10000100"));
//! params.insert("nonce_str".to_owned(), Value::from("IBUEKYMJEU6WVUYB"));
//! params.insert("body".to_owned(), Value::from("test"));
//!
//! assert_eq!(signer.sign(&params)?, "9D309A6CD7F690D1E55EA3C268A9D0F3");
//! # Ok(())
//! # }
//! ```

pub mod key;
pub mod signer;

use std::{fmt, str::FromStr};

use serde::Deserialize;

pub use key::MerchantKey;
pub use signer::{Signer, nonce_str, sign, verify};

use crate::error::PayError;

/// Name of the signature field in requests and replies.
pub const SIGN_FIELD: &str = "sign";

/// Signature algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum SignType {
    /// Upper-case hex MD5 digest. Provider default.
    #[default]
    Md5,
    /// Upper-case base64 HMAC-SHA256 keyed with the merchant key.
    HmacSha256,
}

impl SignType {
    /// Returns the name used on the wire (`sign_type` / `signType` fields).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Md5 => "MD5",
            Self::HmacSha256 => "HMAC-SHA256",
        }
    }
}

impl fmt::Display for SignType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignType {
    type Err = PayError;

    /// Parses a wire name. Anything other than `MD5` or `HMAC-SHA256` is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MD5" => Ok(Self::Md5),
            "HMAC-SHA256" => Ok(Self::HmacSha256),
            other => Err(PayError::InvalidConfiguration(format!(
                "unsupported sign type '{other}', expected MD5 or HMAC-SHA256"
            ))),
        }
    }
}

impl TryFrom<String> for SignType {
    type Error = PayError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
