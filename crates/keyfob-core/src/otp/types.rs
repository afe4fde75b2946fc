//! Core types and parameter bounds for the OTP engine.

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Parameter bounds
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Smallest supported code length.
pub const MIN_DIGITS: u8 = 1;
/// Largest supported code length. The truncated value is 31 bits wide, so ten
/// decimal digits already cover the full range.
pub const MAX_DIGITS: u8 = 10;
/// Conventional default code length.
pub const DEFAULT_DIGITS: u8 = 6;
/// Conventional default time-step in seconds.
pub const DEFAULT_PERIOD: u32 = 30;

/// Steam Guard's fixed output alphabet (26 symbols, no vowels or lookalikes).
pub const STEAM_ALPHABET: &[u8; 26] = b"23456789BCDFGHJKMNPQRTVWXY";
/// Steam Guard codes are always exactly this long.
pub const STEAM_CODE_LEN: usize = 5;
/// Steam Guard's time-step is fixed by the vendor and not configurable.
pub const STEAM_PERIOD: u32 = 30;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Error type
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Error kind for this crate and the execution bridge built on top of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OtpErrorKind {
    /// The secret is not valid base-32 (character outside `A–Z2–7`).
    InvalidSecretEncoding,
    /// Requested digit count outside `MIN_DIGITS..=MAX_DIGITS`.
    InvalidDigitCount,
    /// Requested period is zero.
    InvalidPeriod,
    /// Generation requested through the bridge before `init` completed.
    Uninitialized,
    /// The bridge's linear memory region could not satisfy an allocation.
    OutOfMemory,
    /// A bridge pointer does not refer to a live allocation.
    InvalidPointer,
}

/// Crate-level error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpError {
    pub kind: OtpErrorKind,
    pub message: String,
    pub detail: Option<String>,
}

impl fmt::Display for OtpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)?;
        if let Some(d) = &self.detail {
            write!(f, " ({})", d)?;
        }
        Ok(())
    }
}

impl std::error::Error for OtpError {}

impl OtpError {
    pub fn new(kind: OtpErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl From<OtpError> for String {
    fn from(e: OtpError) -> String {
        e.to_string()
    }
}
