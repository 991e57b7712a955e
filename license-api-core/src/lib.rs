//! License tokens and payment webhook authentication.
//!
//! This crate handles:
//! - Issuing compact HMAC-SHA256 signed license tokens
//! - Verifying tokens offline (signature, then expiry)
//! - Authenticating payment provider webhooks (timestamp window + HMAC)
//!
//! # Design Principles
//!
//! - **Stateless**: every operation is a pure function of its inputs and a
//!   secret fixed at construction; components are `Send + Sync`
//! - **Offline verification**: no revocation list; expiry is the only way a
//!   token stops being valid
//! - **Constant-time comparison** for every tag check
//!
//! # License Token Format
//!
//! Tokens are formatted as: `base64url(header).base64url(claims).base64url(tag)`
//! with no padding. See [`claims`] for the field layout.

pub mod claims;
pub mod codec;
mod error;
pub mod event;
mod issuer;
pub mod signer;
mod verifier;
pub mod webhook;

pub use claims::{
    DEFAULT_ISSUER, DEFAULT_VALIDITY_SECS, LicenseClaims, LicenseToken, TokenHeader,
    ValidatedLicense,
};
pub use error::{LicenseError, LicenseResult};
pub use event::{CheckoutCompletion, EventKind, WebhookEvent};
pub use issuer::LicenseIssuer;
pub use signer::SigningSecret;
pub use verifier::LicenseVerifier;
pub use webhook::{
    AuthenticatedEvent, DEFAULT_TOLERANCE_SECS, SignatureHeader, WebhookAuthenticator,
};
