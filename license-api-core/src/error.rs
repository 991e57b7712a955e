//! Error types for license tokens and webhook authentication.

use thiserror::Error;

/// Every reason a token or webhook request can be rejected.
///
/// All variants mean "reject"; they differ only in the diagnostic they carry.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Token does not split into three segments, or a segment fails to decode.
    #[error("malformed input: {0}")]
    Malformed(String),

    /// Recomputed HMAC tag does not match the supplied one.
    #[error("signature invalid")]
    SignatureInvalid,

    /// Token expiry is in the past relative to verification time.
    #[error("license expired at {}", format_unix(.expires_at))]
    Expired {
        /// Expiry instant (seconds since epoch).
        expires_at: i64,
    },

    /// Webhook signature header absent, or missing a required key.
    #[error("missing {0}")]
    HeaderMissing(&'static str),

    /// Webhook timestamp outside the freshness window.
    #[error("webhook timestamp {timestamp} outside tolerance (now {now})")]
    StaleTimestamp { timestamp: i64, now: i64 },

    /// Issuance input rejected before signing.
    #[error("invalid claims: {0}")]
    InvalidClaims(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LicenseError {
    /// Stable tag for logs and response bodies.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "malformed",
            Self::SignatureInvalid => "signature_invalid",
            Self::Expired { .. } => "expired",
            Self::HeaderMissing(_) => "header_missing",
            Self::StaleTimestamp { .. } => "stale_timestamp",
            Self::InvalidClaims(_) => "invalid_claims",
            Self::Serialization(_) => "serialization",
        }
    }
}

/// Renders unix seconds as RFC 3339, falling back to the raw number when out of range.
pub(crate) fn format_unix(secs: &i64) -> String {
    chrono::DateTime::from_timestamp(*secs, 0)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| secs.to_string())
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
