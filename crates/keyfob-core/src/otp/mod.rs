//! OTP engine: sub-modules.

pub mod types;
pub mod secret;
pub mod core;

// Re-export top-level items for convenience.
pub use types::*;
pub use secret::{decode_secret, encode_secret, generate_secret, is_valid_base32};
pub use core::{
    hotp, hotp_raw, steam_guard, steam_guard_now, totp, totp_now,
    time_step_at, seconds_remaining_at, progress_fraction_at,
};
