//! License issuance: builds claims and signs the compact token.

use crate::claims::{
    DEFAULT_ISSUER, DEFAULT_VALIDITY_SECS, LicenseClaims, LicenseToken, SEGMENT_SEPARATOR,
    TokenHeader,
};
use crate::codec;
use crate::error::{LicenseError, LicenseResult};
use crate::signer::{self, SigningSecret};
use tracing::info;

/// Mints signed license tokens with a fixed secret.
#[derive(Debug, Clone)]
pub struct LicenseIssuer {
    secret: SigningSecret,
    issuer: String,
    validity_secs: i64,
}

impl LicenseIssuer {
    /// Creates an issuer with the default validity period and issuer id.
    pub fn new(secret: SigningSecret) -> Self {
        Self {
            secret,
            issuer: DEFAULT_ISSUER.to_string(),
            validity_secs: DEFAULT_VALIDITY_SECS,
        }
    }

    /// Overrides the validity period.
    #[must_use]
    pub fn with_validity_secs(mut self, validity_secs: i64) -> Self {
        self.validity_secs = validity_secs;
        self
    }

    /// Overrides the `iss` claim.
    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Returns the validity period in seconds.
    #[must_use]
    pub fn validity_secs(&self) -> i64 {
        self.validity_secs
    }

    /// Issues a token valid from `now` for the configured period.
    ///
    /// Product and tier are opaque; the caller is responsible for checking them.
    ///
    /// # Errors
    ///
    /// Returns `InvalidClaims` if `seats` is zero or the expiry overflows.
    pub fn issue(
        &self,
        subject: &str,
        product: &str,
        tier: &str,
        seats: u32,
        now: i64,
    ) -> LicenseResult<LicenseToken> {
        if seats == 0 {
            return Err(LicenseError::InvalidClaims("seats must be positive".to_string()));
        }
        let exp = now
            .checked_add(self.validity_secs)
            .ok_or_else(|| LicenseError::InvalidClaims("expiry out of range".to_string()))?;

        let claims = LicenseClaims {
            sub: subject.to_string(),
            product: product.to_string(),
            tier: tier.to_string(),
            seats,
            iat: now,
            exp,
            iss: self.issuer.clone(),
        };
        let token = self.sign_claims(&claims)?;

        info!(
            "Issued {} license ({}, {} seats) for {}, expires {}",
            claims.product, claims.tier, claims.seats, claims.sub, claims.exp
        );
        Ok(token)
    }

    /// Signs arbitrary claims as-is.
    pub fn sign_claims(&self, claims: &LicenseClaims) -> LicenseResult<LicenseToken> {
        let header_b64 = codec::encode(&TokenHeader::default())?;
        let claims_b64 = codec::encode(claims)?;
        let signing_input = format!("{header_b64}{SEGMENT_SEPARATOR}{claims_b64}");

        let tag = signer::sign(signing_input.as_bytes(), &self.secret);
        let tag_b64 = codec::encode_bytes(&tag);

        Ok(LicenseToken::new(format!(
            "{signing_input}{SEGMENT_SEPARATOR}{tag_b64}"
        )))
    }
}
