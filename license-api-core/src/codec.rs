//! Compact segment encoding: `base64url(json)` with no padding.
//!
//! JSON is emitted by `serde_json` in struct declaration order with no
//! whitespace, so the same value always encodes to the same segment.

use crate::error::{LicenseError, LicenseResult};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Serialize, de::DeserializeOwned};

/// Encodes raw bytes as an unpadded base64url segment.
#[must_use]
pub fn encode_bytes(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decodes an unpadded base64url segment.
///
/// Padded input, characters outside the URL-safe alphabet, truncated input
/// and non-canonical trailing bits are all rejected.
pub fn decode_bytes(segment: &str) -> LicenseResult<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| LicenseError::Malformed(format!("invalid base64url segment: {e}")))
}

/// Serializes a value to compact JSON and encodes it as a segment.
pub fn encode<T: Serialize>(value: &T) -> LicenseResult<String> {
    let json = serde_json::to_vec(value)?;
    Ok(encode_bytes(&json))
}

/// Decodes a segment and deserializes its JSON content.
pub fn decode<T: DeserializeOwned>(segment: &str) -> LicenseResult<T> {
    let json = decode_bytes(segment)?;
    serde_json::from_slice(&json)
        .map_err(|e| LicenseError::Malformed(format!("invalid segment JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        b: String,
        a: u32,
    }

    #[test]
    fn header_matches_known_encoding() {
        let header = serde_json::json!({ "alg": "HS256", "typ": "JWT" });
        assert_eq!(encode(&header).unwrap(), "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9");
    }

    #[test]
    fn field_order_follows_declaration() {
        let encoded = encode(&Sample { b: "x".into(), a: 1 }).unwrap();
        let json = decode_bytes(&encoded).unwrap();
        assert_eq!(json, br#"{"b":"x","a":1}"#);
    }

    #[test]
    fn output_is_url_safe_and_unpadded() {
        // 0xfb 0xff encodes to "+/8=" in standard base64
        let encoded = encode_bytes(&[0xfb, 0xff]);
        assert_eq!(encoded, "-_8");
    }

    #[test]
    fn roundtrip() {
        let value = Sample { b: "héllo".into(), a: 42 };
        let decoded: Sample = decode(&encode(&value).unwrap()).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn rejects_padding() {
        assert!(matches!(decode_bytes("-_8="), Err(LicenseError::Malformed(_))));
    }

    #[test]
    fn rejects_standard_alphabet() {
        assert!(matches!(decode_bytes("+/8"), Err(LicenseError::Malformed(_))));
    }

    #[test]
    fn rejects_truncated_input() {
        assert!(matches!(decode_bytes("a"), Err(LicenseError::Malformed(_))));
    }

    #[test]
    fn rejects_non_json() {
        let segment = encode_bytes(b"not json");
        assert!(matches!(decode::<Sample>(&segment), Err(LicenseError::Malformed(_))));
    }
}
