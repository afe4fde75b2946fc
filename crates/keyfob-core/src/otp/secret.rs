//! Base-32 secret handling (RFC 4648 alphabet `A–Z2–7`).

use crate::otp::types::{OtpError, OtpErrorKind};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Decode / encode
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Decode a base-32 secret into raw key bytes.
///
/// Case-insensitive, tolerant of `=` padding as well as the spaces and dashes
/// some provisioning flows insert for readability. Trailing bits that cannot
/// form a full byte are dropped. Any character outside the alphabet yields
/// `InvalidSecretEncoding`.
pub fn decode_secret(b32: &str) -> Result<Vec<u8>, OtpError> {
    let cleaned = b32.replace(' ', "").replace('-', "").to_uppercase();
    let padded = pad_base32(&cleaned);
    base32::decode(base32::Alphabet::Rfc4648 { padding: true }, &padded)
        .or_else(|| base32::decode(base32::Alphabet::Rfc4648 { padding: false }, &cleaned))
        .ok_or_else(|| {
            OtpError::new(OtpErrorKind::InvalidSecretEncoding, "Invalid base-32 secret")
        })
}

/// Encode raw key bytes to base-32 (no padding, uppercase).
pub fn encode_secret(bytes: &[u8]) -> String {
    base32::encode(base32::Alphabet::Rfc4648 { padding: false }, bytes)
}

/// Generate a cryptographically-random base-32 secret.
pub fn generate_secret(byte_length: usize) -> String {
    let mut buf = vec![0u8; byte_length];
    use rand::RngCore;
    rand::thread_rng().fill_bytes(&mut buf);
    encode_secret(&buf)
}

/// Check if a string looks like a valid base-32 secret.
pub fn is_valid_base32(s: &str) -> bool {
    let cleaned = s.replace(' ', "").replace('-', "").to_uppercase();
    if cleaned.is_empty() {
        return false;
    }
    cleaned.chars().all(|c| matches!(c, 'A'..='Z' | '2'..='7' | '='))
        && decode_secret(&cleaned).is_ok()
}

/// Pad a base-32 string to a multiple of 8 with '='.
fn pad_base32(s: &str) -> String {
    let remainder = s.len() % 8;
    if remainder == 0 {
        s.to_string()
    } else {
        let pad_count = 8 - remainder;
        format!("{}{}", s, "=".repeat(pad_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Decode ───────────────────────────────────────────────────

    #[test]
    fn decode_encode_roundtrip() {
        let original = b"hello world secret";
        let b32 = encode_secret(original);
        let decoded = decode_secret(&b32).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn decode_known_value() {
        let decoded = decode_secret("JBSWY3DPEHPK3PXP").unwrap();
        assert_eq!(decoded, b"Hello!\xde\xad\xbe\xef");
    }

    #[test]
    fn decode_case_insensitive() {
        let upper = decode_secret("JBSWY3DPEHPK3PXP").unwrap();
        let lower = decode_secret("jbswy3dpehpk3pxp").unwrap();
        assert_eq!(upper, lower);
    }

    #[test]
    fn decode_padding_tolerant() {
        let bare = decode_secret("MZXW6YQ").unwrap();
        let padded = decode_secret("MZXW6YQ=").unwrap();
        assert_eq!(bare, padded);
        assert_eq!(bare, b"foob");
    }

    #[test]
    fn decode_with_spaces_dashes() {
        let clean = decode_secret("JBSWY3DPEHPK3PXP").unwrap();
        let spaced = decode_secret("JBSW Y3DP EHPK 3PXP").unwrap();
        let dashed = decode_secret("JBSW-Y3DP-EHPK-3PXP").unwrap();
        assert_eq!(clean, spaced);
        assert_eq!(spaced, dashed);
    }

    #[test]
    fn decode_invalid_character() {
        let err = decode_secret("GM4VC2CQN5UGS33ZJJVWYUSFMQ4HOQJ!").unwrap_err();
        assert_eq!(err.kind, crate::otp::types::OtpErrorKind::InvalidSecretEncoding);
        assert!(decode_secret("!!!").is_err());
        assert!(decode_secret("ABC018").is_err()); // 0, 1 and 8 are outside the alphabet
    }

    #[test]
    fn decode_empty_is_empty_key() {
        assert_eq!(decode_secret("").unwrap(), Vec::<u8>::new());
    }

    // ── Generate / validate ──────────────────────────────────────

    #[test]
    fn generate_secret_length() {
        let s = generate_secret(20);
        assert!(!s.is_empty());
        let bytes = decode_secret(&s).unwrap();
        assert_eq!(bytes.len(), 20);
    }

    #[test]
    fn is_valid_base32_check() {
        assert!(is_valid_base32("JBSWY3DPEHPK3PXP"));
        assert!(is_valid_base32("jbsw y3dp ehpk 3pxp"));
        assert!(!is_valid_base32(""));
        assert!(!is_valid_base32("!!!"));
    }
}
