//! Code generation — RFC 4226 (HOTP), RFC 6238 (TOTP) and Steam Guard.
//!
//! HMAC-SHA1 over an 8-byte big-endian counter, dynamic truncation per
//! RFC 4226 §5.3, then one of two formatting policies: zero-padded decimal
//! (HOTP/TOTP) or Steam's fixed 26-symbol alphabet.

use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::otp::secret::decode_secret;
use crate::otp::types::*;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Raw HMAC-OTP (RFC 4226 §5.3)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Compute an HOTP code for the given raw key bytes and counter.
pub fn hotp_raw(key: &[u8], counter: u64, digits: u8) -> Result<String, OtpError> {
    validate_digits(digits)?;
    let digest = compute_hmac(key, &counter.to_be_bytes());
    Ok(format_decimal(truncate(&digest), digits))
}

/// Compute HMAC-SHA1(key, message).
fn compute_hmac(key: &[u8], data: &[u8]) -> [u8; 20] {
    let mut mac = Hmac::<Sha1>::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().into()
}

/// Dynamic truncation per RFC 4226 §5.3: the digest's last nibble selects a
/// 4-byte window, read big-endian with the sign bit masked off.
fn truncate(digest: &[u8; 20]) -> u32 {
    let offset = (digest[19] & 0x0f) as usize;
    ((digest[offset] as u32 & 0x7f) << 24)
        | ((digest[offset + 1] as u32) << 16)
        | ((digest[offset + 2] as u32) << 8)
        | (digest[offset + 3] as u32)
}

/// Left-zero-padded decimal, exactly `digits` characters. u64 arithmetic so
/// that `digits == 10` does not overflow the modulus.
fn format_decimal(value: u32, digits: u8) -> String {
    let modulus = 10u64.pow(digits as u32);
    let code = value as u64 % modulus;
    format!("{:0>width$}", code, width = digits as usize)
}

fn validate_digits(digits: u8) -> Result<(), OtpError> {
    if !(MIN_DIGITS..=MAX_DIGITS).contains(&digits) {
        return Err(OtpError::new(
            OtpErrorKind::InvalidDigitCount,
            format!("digit count must be {}-{}, got {}", MIN_DIGITS, MAX_DIGITS, digits),
        ));
    }
    Ok(())
}

fn validate_period(period: u32) -> Result<(), OtpError> {
    if period == 0 {
        return Err(OtpError::new(
            OtpErrorKind::InvalidPeriod,
            "period must be positive",
        ));
    }
    Ok(())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  HOTP (counter-based, RFC 4226)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Generate an HOTP code.
///
/// `key` is the raw HMAC key — its UTF-8 bytes are fed to the hash directly,
/// matching the RFC 4226 test-vector convention. Base-32 provisioning secrets
/// belong on the [`totp`] / [`steam_guard`] side, which decode first.
pub fn hotp(key: &str, counter: u64, digits: u8) -> Result<String, OtpError> {
    hotp_raw(key.as_bytes(), counter, digits)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  TOTP (time-based, RFC 6238)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Compute the time-step counter for a given unix timestamp.
pub fn time_step_at(unix_seconds: u64, period: u32) -> u64 {
    unix_seconds / period as u64
}

/// Seconds remaining until the time-step at `unix_seconds` expires.
pub fn seconds_remaining_at(unix_seconds: u64, period: u32) -> u32 {
    let p = period as u64;
    (p - (unix_seconds % p)) as u32
}

/// Progress fraction (0.0 = fresh code, 1.0 = about to expire).
pub fn progress_fraction_at(unix_seconds: u64, period: u32) -> f64 {
    (unix_seconds % period as u64) as f64 / period as f64
}

/// Generate a TOTP code from a base-32 secret at an explicit unix timestamp.
///
/// Strictly HOTP composed with a time-derived counter:
/// `totp(secret, t, d, p) == hotp_raw(decode(secret), t / p, d)`.
pub fn totp(secret: &str, unix_seconds: u64, digits: u8, period: u32) -> Result<String, OtpError> {
    validate_period(period)?;
    validate_digits(digits)?;
    let key = decode_secret(secret)?;
    hotp_raw(&key, time_step_at(unix_seconds, period), digits)
}

/// Generate a TOTP code at the current time.
pub fn totp_now(secret: &str, digits: u8, period: u32) -> Result<String, OtpError> {
    totp(secret, current_unix_time(), digits, period)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Steam Guard
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Generate a 5-character Steam Guard code from a base-32 secret.
///
/// Same HMAC/truncation pipeline as TOTP with the vendor's fixed 30-second
/// period, but the 31-bit truncated value is mapped through Steam's alphabet
/// by repeated division: each round takes `value % 26` as the next character
/// and divides the value by 26.
pub fn steam_guard(secret: &str, unix_seconds: u64) -> Result<String, OtpError> {
    let key = decode_secret(secret)?;
    let counter = time_step_at(unix_seconds, STEAM_PERIOD);
    let mut value = truncate(&compute_hmac(&key, &counter.to_be_bytes()));
    let mut code = String::with_capacity(STEAM_CODE_LEN);
    for _ in 0..STEAM_CODE_LEN {
        code.push(STEAM_ALPHABET[(value % 26) as usize] as char);
        value /= 26;
    }
    Ok(code)
}

/// Generate a Steam Guard code at the current time.
pub fn steam_guard_now(secret: &str) -> Result<String, OtpError> {
    steam_guard(secret, current_unix_time())
}

/// Current unix timestamp in seconds.
fn current_unix_time() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
