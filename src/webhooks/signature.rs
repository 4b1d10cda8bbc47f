//! Webhook signature verification (HMAC-SHA256).
//!
//! GitHub signs each delivery with the webhook secret and sends the result in
//! the `X-Hub-Signature-256` header as `sha256=<hex>`. Deliveries are verified
//! before their payload is parsed.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Why a delivery's signature was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("signature header is not of the form sha256=<hex>")]
    Malformed,

    #[error("signature does not match payload")]
    Mismatch,
}

/// Parses a `sha256=<hex>` header into raw bytes.
///
/// Returns `None` for a missing prefix, another algorithm, or invalid hex.
///
/// # Examples
///
/// ```
/// use actions_controller::webhooks::parse_signature_header;
///
/// assert!(parse_signature_header("sha256=abcd1234").is_some());
/// assert!(parse_signature_header("sha1=abcd1234").is_none());
/// assert!(parse_signature_header("sha256=xyz").is_none());
/// ```
pub fn parse_signature_header(header: &str) -> Option<Vec<u8>> {
    let hex_sig = header.strip_prefix("sha256=")?;
    hex::decode(hex_sig).ok()
}

/// Computes the HMAC-SHA256 of `payload` under `secret`.
pub fn compute_signature(payload: &[u8], secret: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Formats a signature as a header value, `sha256=<hex>`.
pub fn format_signature_header(signature: &[u8]) -> String {
    format!("sha256={}", hex::encode(signature))
}

/// Verifies a delivery signature in constant time.
///
/// # Examples
///
/// ```
/// use actions_controller::webhooks::{compute_signature, format_signature_header, verify_signature};
///
/// let header = format_signature_header(&compute_signature(b"{}", b"secret"));
/// assert!(verify_signature(b"{}", &header, b"secret").is_ok());
/// assert!(verify_signature(b"{}", &header, b"other").is_err());
/// ```
pub fn verify_signature(
    payload: &[u8],
    signature_header: &str,
    secret: &[u8],
) -> Result<(), SignatureError> {
    let expected = parse_signature_header(signature_header).ok_or(SignatureError::Malformed)?;

    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| SignatureError::Mismatch)?;
    mac.update(payload);
    mac.verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_header() {
        assert_eq!(
            parse_signature_header("sha256=1234ABCD"),
            Some(vec![0x12, 0x34, 0xab, 0xcd])
        );
        assert_eq!(parse_signature_header("sha256="), Some(vec![]));
        assert_eq!(parse_signature_header("1234abcd"), None);
        assert_eq!(parse_signature_header("sha256=abc"), None);
        assert_eq!(parse_signature_header(""), None);
    }

    #[test]
    fn rejects_wrong_secret() {
        let header = format_signature_header(&compute_signature(b"payload", b"right"));

        assert_eq!(verify_signature(b"payload", &header, b"right"), Ok(()));
        assert_eq!(
            verify_signature(b"payload", &header, b"wrong"),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn rejects_modified_payload() {
        let header = format_signature_header(&compute_signature(b"original", b"secret"));
        assert_eq!(
            verify_signature(b"modified", &header, b"secret"),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn malformed_headers_are_reported_as_such() {
        for header in ["", "sha256=zz", "sha1=abc123", "not-a-header"] {
            assert_eq!(
                verify_signature(b"x", header, b"secret"),
                Err(SignatureError::Malformed),
                "{header}"
            );
        }
        // Well-formed but empty digest
        assert_eq!(
            verify_signature(b"x", "sha256=", b"secret"),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn signature_is_32_bytes() {
        assert_eq!(compute_signature(b"any payload", b"any secret").len(), 32);
    }

    proptest! {
        #[test]
        fn prop_sign_verify_roundtrip(payload: Vec<u8>, secret: Vec<u8>) {
            let header = format_signature_header(&compute_signature(&payload, &secret));
            prop_assert!(verify_signature(&payload, &header, &secret).is_ok());
        }

        #[test]
        fn prop_wrong_secret_fails(payload: Vec<u8>, secret1: Vec<u8>, secret2: Vec<u8>) {
            prop_assume!(secret1 != secret2);

            let header = format_signature_header(&compute_signature(&payload, &secret1));
            prop_assert_eq!(
                verify_signature(&payload, &header, &secret2),
                Err(SignatureError::Mismatch)
            );
        }

        #[test]
        fn prop_modified_payload_fails(original: Vec<u8>, modified: Vec<u8>, secret: Vec<u8>) {
            prop_assume!(original != modified);

            let header = format_signature_header(&compute_signature(&original, &secret));
            prop_assert!(verify_signature(&modified, &header, &secret).is_err());
        }

        #[test]
        fn prop_malformed_header_no_panic(header: String, payload: Vec<u8>, secret: Vec<u8>) {
            let _ = parse_signature_header(&header);
            let _ = verify_signature(&payload, &header, &secret);
        }
    }
}
