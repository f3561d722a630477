//! Refund notification handling.
//!
//! The provider posts refund results to the merchant's `notify_url` as an XML
//! envelope whose `req_info` field is encrypted:
//!
//! ```text
//! aes_key   = lower(hex(md5(merchant key)))      32 ASCII bytes, used raw as an AES-256 key
//! plaintext = AES-256-ECB-decrypt(aes_key, base64-decode(req_info))
//! ```
//!
//! The plaintext is itself an XML document with the refund details.
//!
//! # Examples
//!
//! ```rust,no_run
//! use weixinpay::notify::{RefundNotification, acknowledge};
//!
//! # fn handle(body: &str) -> weixinpay::error::Result<String> {
//! let notification = RefundNotification::parse(body, "192006250b4c09247ec02edce69f6a2d")?;
//! println!("refund {:?} is {:?}", notification.out_refund_no(), notification.refund_status());
//! Ok(acknowledge())
//! # }
//! ```

use aes::{
    Aes256,
    cipher::{BlockDecrypt, KeyInit, generic_array::GenericArray},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use tracing::{debug, instrument, warn};
use zeroize::Zeroizing;

use crate::{
    error::{PayError, Result},
    sign::MerchantKey,
    value::{ParamMap, Value, XmlMap, text_field},
    xml,
};

const BLOCK_LEN: usize = 16;

/// Decrypts the `req_info` payload of refund notifications.
#[derive(Clone)]
pub struct RefundNotifyDecryptor {
    cipher: Aes256,
}

impl std::fmt::Debug for RefundNotifyDecryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefundNotifyDecryptor").finish_non_exhaustive()
    }
}

impl RefundNotifyDecryptor {
    /// Derives the AES key from the merchant key.
    ///
    /// # Errors
    ///
    /// Returns [`PayError::DecryptionFailed`] if the derived key is rejected by
    /// the cipher (never happens for an MD5 hex digest).
    pub fn new(key: &MerchantKey) -> Result<Self> {
        let hex_key = Zeroizing::new(format!("{:x}", md5::compute(key.expose().as_bytes())));
        let cipher = Aes256::new_from_slice(hex_key.as_bytes())
            .map_err(|e| PayError::DecryptionFailed(format!("invalid AES key: {e}")))?;
        Ok(Self { cipher })
    }

    /// Decrypts `req_info` and decodes the plaintext document.
    ///
    /// Trailing NUL padding is stripped, followed by PKCS#7 padding when the
    /// remaining tail is a valid pad.
    ///
    /// # Errors
    ///
    /// Returns [`PayError::DecryptionFailed`] if the payload is not base64, is
    /// not a whole number of AES blocks, does not decrypt to UTF-8, or the
    /// plaintext is not a well-formed document.
    #[instrument(level = "debug", skip_all, fields(payload_len = req_info.len()))]
    pub fn decrypt(&self, req_info: &str) -> Result<XmlMap> {
        let mut data = STANDARD
            .decode(req_info.trim())
            .map_err(|e| PayError::DecryptionFailed(format!("req_info is not base64: {e}")))?;

        if data.is_empty() || !data.len().is_multiple_of(BLOCK_LEN) {
            return Err(PayError::DecryptionFailed(format!(
                "ciphertext length {} is not a positive multiple of {BLOCK_LEN}",
                data.len()
            )));
        }

        for block in data.chunks_exact_mut(BLOCK_LEN) {
            self.cipher.decrypt_block(GenericArray::from_mut_slice(block));
        }

        let plaintext = Zeroizing::new(data);
        let text = std::str::from_utf8(strip_padding(&plaintext))
            .map_err(|e| PayError::DecryptionFailed(format!("plaintext is not UTF-8: {e}")))?;

        let fields = xml::decode(text).map_err(|e| {
            warn!(error = %e, "decrypted refund notification is not a valid document");
            PayError::DecryptionFailed(e.to_string())
        })?;
        debug!(field_count = fields.len(), "decrypted refund notification");
        Ok(fields)
    }
}

fn strip_padding(data: &[u8]) -> &[u8] {
    let end = data.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    let data = &data[..end];

    match data.last() {
        Some(&pad) if (1..=BLOCK_LEN).contains(&usize::from(pad)) => {
            let cut = data.len().saturating_sub(usize::from(pad));
            if data[cut..].iter().all(|&b| b == pad) { &data[..cut] } else { data }
        }
        _ => data,
    }
}

/// A decoded and decrypted refund notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundNotification {
    /// Unencrypted envelope fields (`return_code`, `appid`, `mch_id`, `nonce_str`, ...).
    pub envelope: XmlMap,
    /// Decrypted `req_info` fields.
    pub info: XmlMap,
}

impl RefundNotification {
    /// Parses a notification body posted by the provider.
    ///
    /// # Errors
    ///
    /// - [`PayError::MalformedDocument`] if the body is not a well-formed document.
    /// - [`PayError::NotificationRejected`] if the envelope's `return_code` is not `SUCCESS`.
    /// - [`PayError::DecryptionFailed`] if `req_info` is missing or cannot be decrypted.
    #[instrument(skip_all)]
    pub fn parse(body: &str, key: impl Into<MerchantKey>) -> Result<Self> {
        let envelope = xml::decode(body)?;

        let return_code = text_field(&envelope, "return_code").unwrap_or_default();
        if return_code != "SUCCESS" {
            let message = text_field(&envelope, "return_msg").unwrap_or_default();
            return Err(PayError::NotificationRejected { code: return_code.to_owned(), message: message.to_owned() });
        }

        let req_info = text_field(&envelope, "req_info")
            .ok_or_else(|| PayError::DecryptionFailed("notification has no req_info".to_owned()))?;

        let info = RefundNotifyDecryptor::new(&key.into())?.decrypt(req_info)?;
        Ok(Self { envelope, info })
    }

    /// Reads a decrypted text field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        text_field(&self.info, name)
    }

    /// Merchant refund number.
    #[must_use]
    pub fn out_refund_no(&self) -> Option<&str> {
        self.field("out_refund_no")
    }

    /// `SUCCESS`, `CHANGE` or `REFUNDCLOSE`.
    #[must_use]
    pub fn refund_status(&self) -> Option<&str> {
        self.field("refund_status")
    }
}

/// Builds the reply that tells the provider a notification was handled.
#[must_use]
pub fn acknowledge() -> String {
    let mut reply = ParamMap::new();
    reply.insert("return_code".to_owned(), Value::from("SUCCESS"));
    reply.insert("return_msg".to_owned(), Value::from("OK"));
    xml::encode(xml::ROOT, &reply)
}
