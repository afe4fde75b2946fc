//! End-to-end generation through the process-wide bridge.
//!
//! These tests share one process, so they all run against the same engine
//! instance; the pre-init behavior lives in its own test binary.

use keyfob_bridge::bridge::{self, BridgeConfig, PAGE_SIZE};
use keyfob_core::otp::OtpErrorKind;

const TEST_SECRET: &str = "GM4VC2CQN5UGS33ZJJVWYUSFMQ4HOQJW";

fn setup() {
    bridge::init(BridgeConfig { memory_pages: 2 });
}

#[test]
fn reference_codes_through_bridge() {
    setup();
    assert_eq!(bridge::hotp(TEST_SECRET, 1662681600, 6).unwrap(), "886679");
    assert_eq!(bridge::totp(TEST_SECRET, 1662681600, 6, 30).unwrap(), "473526");
    assert_eq!(bridge::steam_guard(TEST_SECRET, 1662681600).unwrap(), "4PRPM");
}

#[test]
fn validation_errors_surface_through_bridge() {
    setup();
    let err = bridge::hotp(TEST_SECRET, 0, 0).unwrap_err();
    assert_eq!(err.kind, OtpErrorKind::InvalidDigitCount);
    let err = bridge::totp(TEST_SECRET, 0, 6, 0).unwrap_err();
    assert_eq!(err.kind, OtpErrorKind::InvalidPeriod);
    let err = bridge::steam_guard("GM4VC2CQN5UGS33ZJJVWYUSFMQ4HOQJ!", 0).unwrap_err();
    assert_eq!(err.kind, OtpErrorKind::InvalidSecretEncoding);
}

#[test]
fn init_is_idempotent() {
    setup();
    let size = bridge::memory_size().unwrap();
    assert_eq!(size, 2 * PAGE_SIZE);
    // A second init with a different reservation is a no-op.
    bridge::init(BridgeConfig { memory_pages: 100 });
    assert_eq!(bridge::memory_size().unwrap(), size);
    assert!(bridge::is_initialized());
}

#[test]
fn concurrent_callers_serialize() {
    setup();
    let handles: Vec<_> = (0u64..8)
        .map(|i| {
            std::thread::spawn(move || {
                // Racing inits must not replace the instance.
                bridge::init(BridgeConfig { memory_pages: 1 });
                bridge::totp(TEST_SECRET, 1662681600 + i * 30, 6, 30).unwrap()
            })
        })
        .collect();
    for handle in handles {
        let code = handle.join().unwrap();
        assert_eq!(code.len(), 6);
    }
    assert_eq!(bridge::memory_size().unwrap(), 2 * PAGE_SIZE);
}
