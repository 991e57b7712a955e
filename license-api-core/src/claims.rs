//! License token structure: header, claims and the compact string form.
//!
//! Tokens use the format: `base64url(header).base64url(claims).base64url(tag)`
//!
//! The header is always `{"alg":"HS256","typ":"JWT"}`. The claims object
//! carries, in this order:
//! - `sub`: subject (customer email)
//! - `product`: product identifier
//! - `tier`: plan identifier
//! - `seats`: seat count
//! - `iat`: issued-at timestamp (seconds since epoch)
//! - `exp`: expiry timestamp (seconds since epoch)
//! - `iss`: issuer identifier
//!
//! The tag is HMAC-SHA256 over the ASCII text `header_b64.claims_b64`, not
//! over the decoded JSON.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default validity period in seconds (365 days).
pub const DEFAULT_VALIDITY_SECS: i64 = 365 * 24 * 60 * 60;

/// Default issuer identifier.
pub const DEFAULT_ISSUER: &str = "license-api";

/// Signing algorithm named in the header.
pub const ALGORITHM: &str = "HS256";

/// Token type named in the header.
pub const TOKEN_TYPE: &str = "JWT";

/// Separator between token segments.
pub const SEGMENT_SEPARATOR: char = '.';

/// The fixed token header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    pub alg: String,
    pub typ: String,
}

impl Default for TokenHeader {
    fn default() -> Self {
        Self {
            alg: ALGORITHM.to_string(),
            typ: TOKEN_TYPE.to_string(),
        }
    }
}

/// The signed license claims (field order is the wire order).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseClaims {
    /// Subject (customer email).
    pub sub: String,
    /// Product identifier.
    pub product: String,
    /// Tier or plan identifier.
    pub tier: String,
    /// Number of seats.
    pub seats: u32,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiry timestamp (seconds since epoch).
    pub exp: i64,
    /// Issuer identifier.
    pub iss: String,
}

impl LicenseClaims {
    /// Returns true if the claims have expired at `now`.
    ///
    /// A token is still valid at the exact expiry second.
    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        now > self.exp
    }
}

/// Claims that passed signature and expiry checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedLicense {
    claims: LicenseClaims,
}

impl ValidatedLicense {
    pub(crate) fn new(claims: LicenseClaims) -> Self {
        Self { claims }
    }

    /// Returns the full claims.
    #[must_use]
    pub fn claims(&self) -> &LicenseClaims {
        &self.claims
    }

    /// Returns the subject (customer email).
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.claims.sub
    }

    /// Returns the product identifier.
    #[must_use]
    pub fn product(&self) -> &str {
        &self.claims.product
    }

    /// Returns the tier or plan identifier.
    #[must_use]
    pub fn tier(&self) -> &str {
        &self.claims.tier
    }

    /// Returns the licensed seat count.
    #[must_use]
    pub fn seats(&self) -> u32 {
        self.claims.seats
    }

    /// Returns the issued-at timestamp (seconds since epoch).
    #[must_use]
    pub fn issued_at_secs(&self) -> i64 {
        self.claims.iat
    }

    /// Returns the expiry timestamp (seconds since epoch).
    #[must_use]
    pub fn expires_at_secs(&self) -> i64 {
        self.claims.exp
    }

    /// Returns the expiry as a UTC datetime, if representable.
    #[must_use]
    pub fn expires_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::from_timestamp(self.claims.exp, 0)
    }

    /// Consumes the license, returning its claims.
    #[must_use]
    pub fn into_claims(self) -> LicenseClaims {
        self.claims
    }
}

/// A signed compact license token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LicenseToken(String);

impl LicenseToken {
    pub(crate) fn new(raw: String) -> Self {
        Self(raw)
    }

    /// Returns the token text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LicenseToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LicenseToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
