//! Signature computation and verification.

use base64::{Engine, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;
use tracing::instrument;

use super::{MerchantKey, SIGN_FIELD, SignType};
use crate::{
    error::{PayError, Result},
    value::{ParamMap, Value, text_field},
};

type HmacSha256 = Hmac<Sha256>;

const NONCE_ALPHABET: &[u8] = b"AaBbCcDdEeFfGgHhIiJjKkLlMmNnOoPpQqRrSsTtUuVvWwXxYyZz0123456789";

/// Length of [`nonce_str`] output.
pub const NONCE_LEN: usize = 16;

/// Signs requests and checks reply signatures with one merchant key.
#[derive(Debug, Clone)]
pub struct Signer {
    key: MerchantKey,
    sign_type: SignType,
}

impl Signer {
    /// Creates a signer.
    ///
    /// # Examples
    ///
    /// ```
    /// use weixinpay::sign::{SignType, Signer};
    ///
    /// let signer = Signer::new("secretkey", SignType::HmacSha256);
    /// assert_eq!(signer.sign_type(), SignType::HmacSha256);
    /// ```
    #[must_use]
    pub fn new(key: impl Into<MerchantKey>, sign_type: SignType) -> Self {
        Self { key: key.into(), sign_type }
    }

    /// Returns the configured algorithm.
    #[must_use]
    pub const fn sign_type(&self) -> SignType {
        self.sign_type
    }

    /// Returns the merchant key.
    #[must_use]
    pub const fn key(&self) -> &MerchantKey {
        &self.key
    }

    /// Signs `params` (every field is covered, including any `sign` already present).
    ///
    /// # Errors
    ///
    /// Returns [`PayError::InvalidConfiguration`] if the HMAC key is rejected.
    pub fn sign(&self, params: &ParamMap) -> Result<String> {
        sign(params, self.key.expose(), self.sign_type)
    }

    /// Checks the `sign` field of a provider reply.
    ///
    /// # Errors
    ///
    /// Returns [`PayError::InvalidConfiguration`] if the HMAC key is rejected.
    pub fn verify(&self, reply: &ParamMap) -> Result<bool> {
        verify(reply, self.key.expose(), self.sign_type)
    }
}

/// Computes the signature of `params`.
///
/// Fields are taken in ascending key order, blank values are skipped, and the
/// merchant key is appended as `key=<key>`.
///
/// # Errors
///
/// Returns [`PayError::InvalidConfiguration`] if the HMAC key is rejected.
///
/// # Examples
///
/// ```
/// use weixinpay::{
///     sign::{SignType, sign},
///     value::{ParamMap, Value},
/// };
///
/// # fn example() -> weixinpay::error::Result<()> {
/// let mut params = ParamMap::new();
/// params.insert("body".to_owned(), Value::from("test"));
/// params.insert("attach".to_owned(), Value::from(""));
///
/// let signature = sign(&params, "secretkey", SignType::Md5)?;
/// assert_eq!(signature.len(), 32);
/// assert_eq!(signature, signature.to_uppercase());
/// # Ok(())
/// # }
/// ```
#[instrument(level = "trace", skip_all, fields(sign_type = %sign_type, field_count = params.len()))]
pub fn sign(params: &ParamMap, key: &str, sign_type: SignType) -> Result<String> {
    let payload = signing_string(params.iter(), key);

    match sign_type {
        SignType::Md5 => {
            let digest = md5::compute(payload.as_bytes());
            Ok(format!("{digest:x}").to_uppercase())
        }
        SignType::HmacSha256 => {
            let mut mac = HmacSha256::new_from_slice(key.as_bytes())
                .map_err(|e| PayError::InvalidConfiguration(format!("HMAC key rejected: {e}")))?;
            mac.update(payload.as_bytes());
            Ok(STANDARD.encode(mac.finalize().into_bytes()).to_uppercase())
        }
    }
}

/// Checks the `sign` field of `reply` against the signature of its other fields.
///
/// A reply without a text `sign` field does not verify.
///
/// # Errors
///
/// Returns [`PayError::InvalidConfiguration`] if the HMAC key is rejected.
pub fn verify(reply: &ParamMap, key: &str, sign_type: SignType) -> Result<bool> {
    let Some(expected) = text_field(reply, SIGN_FIELD) else {
        return Ok(false);
    };

    let unsigned: ParamMap = reply
        .iter()
        .filter(|(name, _)| name.as_str() != SIGN_FIELD)
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();

    Ok(sign(&unsigned, key, sign_type)? == expected)
}

/// Returns a fresh 16-character alphanumeric nonce.
///
/// Drawn from the thread-local RNG; the nonce only has to be unique, not secret.
#[must_use]
pub fn nonce_str() -> String {
    let mut rng = rand::thread_rng();
    (0..NONCE_LEN)
        .map(|_| char::from(NONCE_ALPHABET[rng.gen_range(0..NONCE_ALPHABET.len())]))
        .collect()
}

/// Builds `k=v&...&key=<key>` from fields already in ascending key order.
pub(crate) fn signing_string<'a>(
    fields: impl Iterator<Item = (&'a String, &'a Value)>,
    key: &str,
) -> String {
    let mut out = String::new();
    for (name, value) in fields {
        if value.is_blank() {
            continue;
        }
        out.push_str(name);
        out.push('=');
        out.push_str(&value.to_wire_text());
        out.push('&');
    }
    out.push_str("key=");
    out.push_str(key);
    out
}
