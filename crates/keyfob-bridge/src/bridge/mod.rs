//! Bridge: sub-modules and the process-wide engine instance.

pub mod memory;
pub mod engine;

// Re-export top-level items for convenience.
pub use engine::{BridgeConfig, Engine, EntryPoint, DEFAULT_MEMORY_PAGES};
pub use memory::{LinearMemory, PAGE_SIZE};

use std::sync::{Mutex, OnceLock};

use keyfob_core::otp::{OtpError, OtpErrorKind};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Process-wide instance
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The one engine instance for this process. Lives until process teardown.
static BRIDGE: OnceLock<Mutex<Engine>> = OnceLock::new();

/// Establish the execution environment.
///
/// Idempotent: the first call instantiates the engine and its linear memory;
/// every later call is a no-op, whatever configuration it carries. Concurrent
/// first calls race safely — exactly one engine is ever created.
pub fn init(config: BridgeConfig) {
    let mut first = false;
    BRIDGE.get_or_init(|| {
        first = true;
        let engine = Engine::new(config);
        log::info!(
            "bridge initialized: {} pages ({} bytes) of linear memory",
            config.memory_pages.max(1),
            engine.memory().size()
        );
        Mutex::new(engine)
    });
    if !first {
        log::debug!("bridge init ignored: already initialized");
    }
}

/// Establish the environment with the default memory reservation.
pub fn init_default() {
    init(BridgeConfig::default());
}

/// Whether `init` has completed for this process.
pub fn is_initialized() -> bool {
    BRIDGE.get().is_some()
}

/// Size of the instance's linear memory region in bytes.
pub fn memory_size() -> Result<usize, OtpError> {
    with_engine(|engine| Ok(engine.memory().size()))
}

/// Run `f` against the engine, holding its lock for the whole marshaling
/// cycle so concurrent callers serialize cleanly.
fn with_engine<R>(f: impl FnOnce(&mut Engine) -> Result<R, OtpError>) -> Result<R, OtpError> {
    let bridge = BRIDGE.get().ok_or_else(|| {
        OtpError::new(
            OtpErrorKind::Uninitialized,
            "generation requested before init; call init and retry",
        )
    })?;
    let mut engine = bridge.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    f(&mut engine)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Public generation contracts
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Counter-based decimal code, `digits` characters. `key` is the raw HMAC key.
pub fn hotp(key: &str, counter: u64, digits: u8) -> Result<String, OtpError> {
    with_engine(|engine| engine.generate(key, EntryPoint::Hotp { counter, digits }))
}

/// Time-based decimal code from a base-32 secret.
pub fn totp(secret: &str, time: u64, digits: u8, period: u32) -> Result<String, OtpError> {
    with_engine(|engine| engine.generate(secret, EntryPoint::Totp { time, digits, period }))
}

/// 5-character Steam Guard code from a base-32 secret.
pub fn steam_guard(secret: &str, time: u64) -> Result<String, OtpError> {
    with_engine(|engine| engine.generate(secret, EntryPoint::SteamGuard { time }))
}
