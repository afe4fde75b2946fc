//! # Keyfob – one-time-code engine
//!
//! Counter-based and time-based one-time password generation:
//!
//! - **RFC 4226** – HOTP over HMAC-SHA1 with dynamic truncation
//! - **RFC 6238** – TOTP as HOTP over a time-derived counter
//! - **Steam Guard** – the 5-character variant over Steam's fixed
//!   26-symbol alphabet
//! - **Base-32 secrets** – case-insensitive, padding-tolerant decoding,
//!   plus encoding and random secret generation
//!
//! Generation is a pure function of its inputs; nothing here touches the
//! network or persistent storage.

pub mod otp;
