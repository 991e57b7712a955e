//! Payment provider webhook authentication.
//!
//! The signature header is a comma-separated list of `key=value` pairs:
//!
//! ```text
//! t=1700000000,v1=5257a869e7ecebeda32affa62cdca3fa51cad7e77a0e56ff536d0ce8e108d8bd
//! ```
//!
//! `t` is the unix timestamp at which the provider signed the request and
//! each `v1` is a lowercase hex HMAC-SHA256 of `"{t}.{raw_body}"`. Unknown
//! keys are ignored. More than one `v1` may be present while the provider
//! rotates its secret; any match authenticates the request.

use crate::error::{LicenseError, LicenseResult};
use crate::event::WebhookEvent;
use crate::signer::{self, SigningSecret};
use tracing::{debug, warn};

/// Default freshness window in seconds.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Parsed signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    /// Raw `t` value exactly as sent; it is what the provider signed.
    timestamp_raw: String,
    pub signatures: Vec<String>,
}

impl SignatureHeader {
    /// Parses a signature header.
    ///
    /// # Errors
    ///
    /// - `HeaderMissing` if `t` or `v1` is absent
    /// - `Malformed` if `t` is not a decimal integer
    pub fn parse(header: &str) -> LicenseResult<Self> {
        let mut timestamp_raw = None;
        let mut signatures = Vec::new();

        for part in header.split(',') {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };
            match key.trim() {
                "t" => timestamp_raw = Some(value.trim()),
                "v1" => signatures.push(value.trim().to_string()),
                _ => {}
            }
        }

        let timestamp_raw = timestamp_raw
            .filter(|t| !t.is_empty())
            .ok_or(LicenseError::HeaderMissing("timestamp (t)"))?;
        signatures.retain(|s| !s.is_empty());
        if signatures.is_empty() {
            return Err(LicenseError::HeaderMissing("signature (v1)"));
        }

        let timestamp = timestamp_raw
            .parse::<i64>()
            .map_err(|_| LicenseError::Malformed(format!("invalid timestamp: {timestamp_raw}")))?;

        Ok(Self {
            timestamp,
            timestamp_raw: timestamp_raw.to_string(),
            signatures,
        })
    }
}

/// A webhook request whose signature and timestamp checked out.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedEvent {
    pub event: WebhookEvent,
    /// Timestamp the provider signed.
    pub signed_at: i64,
}

/// Authenticates inbound webhook requests against a shared secret.
#[derive(Debug, Clone)]
pub struct WebhookAuthenticator {
    secret: SigningSecret,
    tolerance_secs: i64,
}

impl WebhookAuthenticator {
    /// Creates an authenticator with the default freshness window.
    pub fn new(secret: SigningSecret) -> Self {
        Self {
            secret,
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
        }
    }

    /// Overrides the freshness window.
    #[must_use]
    pub fn with_tolerance_secs(mut self, tolerance_secs: i64) -> Self {
        self.tolerance_secs = tolerance_secs;
        self
    }

    /// Returns the freshness window in seconds.
    #[must_use]
    pub fn tolerance_secs(&self) -> i64 {
        self.tolerance_secs
    }

    /// Authenticates a request and parses its body as an event.
    ///
    /// `raw_body` must be the bytes exactly as received. A timestamp exactly
    /// `tolerance_secs` away from `now` is still accepted.
    ///
    /// # Errors
    ///
    /// - `HeaderMissing` if the header is absent or lacks `t` / `v1`
    /// - `StaleTimestamp` if `|now - t|` exceeds the window
    /// - `SignatureInvalid` if no `v1` matches
    /// - `Malformed` if the header timestamp or the body cannot be parsed
    pub fn authenticate(
        &self,
        raw_body: &[u8],
        signature_header: Option<&str>,
        now: i64,
    ) -> LicenseResult<AuthenticatedEvent> {
        let result = self.authenticate_inner(raw_body, signature_header, now);
        if let Err(e) = &result {
            warn!("Webhook rejected: {} ({})", e.reason(), e);
        }
        result
    }

    /// Produces a `t=...,v1=...` header for `raw_body` signed at `timestamp`.
    #[must_use]
    pub fn sign_header(&self, raw_body: &[u8], timestamp: i64) -> String {
        let t = timestamp.to_string();
        format!("t={t},v1={}", self.hex_tag(&t, raw_body))
    }

    fn authenticate_inner(
        &self,
        raw_body: &[u8],
        signature_header: Option<&str>,
        now: i64,
    ) -> LicenseResult<AuthenticatedEvent> {
        let header = signature_header
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or(LicenseError::HeaderMissing("signature header"))?;
        let parsed = SignatureHeader::parse(header)?;

        let skew = now.abs_diff(parsed.timestamp);
        if skew > self.tolerance_secs.unsigned_abs() {
            return Err(LicenseError::StaleTimestamp {
                timestamp: parsed.timestamp,
                now,
            });
        }

        let expected = self.hex_tag(&parsed.timestamp_raw, raw_body);
        // Check every candidate so the work done does not depend on which one matched
        let matched = parsed.signatures.iter().fold(false, |acc, sig| {
            signer::constant_time_eq(expected.as_bytes(), sig.as_bytes()) | acc
        });
        if !matched {
            return Err(LicenseError::SignatureInvalid);
        }

        let event: WebhookEvent = serde_json::from_slice(raw_body)
            .map_err(|e| LicenseError::Malformed(format!("invalid event body: {e}")))?;
        debug!("Authenticated webhook event {}", event.event_type);

        Ok(AuthenticatedEvent {
            event,
            signed_at: parsed.timestamp,
        })
    }

    fn hex_tag(&self, timestamp: &str, raw_body: &[u8]) -> String {
        let tag = signer::sign_parts(
            &[timestamp.as_bytes(), b".".as_slice(), raw_body],
            &self.secret,
        );
        hex::encode(tag)
    }
}
