//! License token verification.

use crate::claims::{ALGORITHM, LicenseClaims, SEGMENT_SEPARATOR, TokenHeader, ValidatedLicense};
use crate::codec;
use crate::error::{LicenseError, LicenseResult};
use crate::signer::{self, SigningSecret};
use tracing::debug;

/// Checks license tokens against a fixed secret.
///
/// Expiry is the only invalidation mechanism: an unexpired, correctly signed
/// token is always accepted.
#[derive(Debug, Clone)]
pub struct LicenseVerifier {
    secret: SigningSecret,
}

impl LicenseVerifier {
    /// Creates a verifier for tokens signed with `secret`.
    pub fn new(secret: SigningSecret) -> Self {
        Self { secret }
    }

    /// Verifies a token at the given time (seconds since epoch).
    ///
    /// # Errors
    ///
    /// - `Malformed` if the token is not three non-empty segments or a segment
    ///   does not decode
    /// - `SignatureInvalid` if the tag does not match
    /// - `Expired` if `now` is past the `exp` claim
    pub fn verify(&self, token: &str, now: i64) -> LicenseResult<ValidatedLicense> {
        let result = self.verify_inner(token.trim(), now);
        if let Err(e) = &result {
            debug!("License verification failed: {}", e.reason());
        }
        result
    }

    /// Verifies a token against the current wall clock.
    pub fn verify_now(&self, token: &str) -> LicenseResult<ValidatedLicense> {
        self.verify(token, chrono::Utc::now().timestamp())
    }

    fn verify_inner(&self, token: &str, now: i64) -> LicenseResult<ValidatedLicense> {
        let (header_b64, claims_b64, tag_b64) = split_segments(token)?;

        // The signing input is the raw text of the first two segments
        let signing_input_len = header_b64.len() + 1 + claims_b64.len();
        let signing_input = &token[..signing_input_len];

        let tag = codec::decode_bytes(tag_b64)?;
        if !signer::verify(signing_input.as_bytes(), &tag, &self.secret) {
            return Err(LicenseError::SignatureInvalid);
        }

        let header: TokenHeader = codec::decode(header_b64)?;
        if header.alg != ALGORITHM {
            return Err(LicenseError::Malformed(format!(
                "unsupported algorithm: {}",
                header.alg
            )));
        }

        let claims: LicenseClaims = codec::decode(claims_b64)?;
        if claims.is_expired_at(now) {
            return Err(LicenseError::Expired {
                expires_at: claims.exp,
            });
        }

        Ok(ValidatedLicense::new(claims))
    }
}

fn split_segments(token: &str) -> LicenseResult<(&str, &str, &str)> {
    let mut parts = token.split(SEGMENT_SEPARATOR);
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(h), Some(c), Some(s), None) if !h.is_empty() && !c.is_empty() && !s.is_empty() => {
            Ok((h, c, s))
        }
        _ => Err(LicenseError::Malformed(
            "token must have exactly three non-empty segments".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_accepts_three_segments() {
        assert_eq!(split_segments("a.b.c").unwrap(), ("a", "b", "c"));
    }

    #[test]
    fn split_rejects_wrong_counts() {
        for token in ["", "abc", "abc.def", "a.b.c.d", "a..c", ".b.c", "a.b."] {
            assert!(
                matches!(split_segments(token), Err(LicenseError::Malformed(_))),
                "accepted {token:?}"
            );
        }
    }
}
