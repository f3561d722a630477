//! Merchant API key.

use std::fmt;

use serde::Deserialize;
use zeroize::Zeroize;

/// Shared secret between merchant and provider.
///
/// Used for request signing and as the seed of the refund-notification AES key.
/// The value never appears in `Debug` output and is wiped from memory on drop.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct MerchantKey(String);

impl MerchantKey {
    /// Wraps a key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key text.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns `true` if no key was configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for MerchantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MerchantKey(***)")
    }
}

impl From<&str> for MerchantKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for MerchantKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl Drop for MerchantKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}
