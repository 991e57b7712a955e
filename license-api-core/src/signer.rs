//! HMAC-SHA256 signing and constant-time verification.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

type HmacSha256 = Hmac<Sha256>;

/// Length of an HMAC-SHA256 tag in bytes.
pub const TAG_SIZE: usize = 32;

/// A shared signing secret, zeroized on drop.
///
/// Loaded once at startup and never mutated afterwards.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SigningSecret {
    bytes: Vec<u8>,
}

impl SigningSecret {
    /// Creates a secret from raw bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self { bytes: bytes.into() }
    }

    /// Returns the secret bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns true if the secret has no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl From<&str> for SigningSecret {
    fn from(secret: &str) -> Self {
        Self::new(secret.as_bytes())
    }
}

impl From<String> for SigningSecret {
    fn from(secret: String) -> Self {
        Self::new(secret.into_bytes())
    }
}

impl std::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningSecret")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Computes the HMAC-SHA256 tag of `message` under `secret`.
#[must_use]
pub fn sign(message: &[u8], secret: &SigningSecret) -> [u8; TAG_SIZE] {
    let mut mac = mac_for(secret);
    mac.update(message);
    mac.finalize().into_bytes().into()
}

/// Computes the tag over several parts fed in order, without concatenating them.
#[must_use]
pub fn sign_parts(parts: &[&[u8]], secret: &SigningSecret) -> [u8; TAG_SIZE] {
    let mut mac = mac_for(secret);
    for part in parts {
        mac.update(part);
    }
    mac.finalize().into_bytes().into()
}

/// Recomputes the tag of `message` and compares it with `tag` in constant time.
#[must_use]
pub fn verify(message: &[u8], tag: &[u8], secret: &SigningSecret) -> bool {
    constant_time_eq(&sign(message, secret), tag)
}

/// Compares two byte strings without branching on their contents.
///
/// Lengths are compared first; tag length is public (always 32 bytes or 64
/// hex characters).
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

fn mac_for(secret: &SigningSecret) -> HmacSha256 {
    match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC accepts keys of any length"),
    }
}
