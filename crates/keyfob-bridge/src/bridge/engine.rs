//! Engine instance: linear memory plus typed entry-point dispatch.

use serde::{Deserialize, Serialize};

use keyfob_core::otp::{self, OtpError, OtpErrorKind};

use crate::bridge::memory::LinearMemory;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Configuration
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Default linear memory reservation, in 64 KiB pages.
pub const DEFAULT_MEMORY_PAGES: u32 = 250;

/// Bridge configuration, consumed by the first `init` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Linear memory size in 64 KiB pages.
    pub memory_pages: u32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            memory_pages: DEFAULT_MEMORY_PAGES,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Entry points
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Generator entry points callable through the bridge.
///
/// Parameters travel strongly typed; validation happens in the engine before
/// any hash is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "entry")]
pub enum EntryPoint {
    /// Counter-based decimal code; the written buffer is the raw HMAC key.
    Hotp { counter: u64, digits: u8 },
    /// Time-based decimal code; the written buffer is a base-32 secret.
    Totp { time: u64, digits: u8, period: u32 },
    /// 5-character Steam Guard code; the written buffer is a base-32 secret.
    SteamGuard { time: u64 },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Engine
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One engine instance: the memory region and the call dispatcher.
///
/// The global bridge owns a single `Engine` behind a mutex; tests construct
/// their own to exercise marshaling without the process-wide singleton.
pub struct Engine {
    memory: LinearMemory,
}

impl Engine {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            memory: LinearMemory::new(config.memory_pages),
        }
    }

    pub fn memory(&self) -> &LinearMemory {
        &self.memory
    }

    /// Invoke an entry point against a secret previously written into the
    /// region at `ptr`/`len`.
    ///
    /// Returns the pointer and length of a result buffer inside the region;
    /// the caller reads it and then must free it exactly once.
    pub fn call(&mut self, ptr: u32, len: usize, entry: EntryPoint) -> Result<(u32, usize), OtpError> {
        let raw = self.memory.read(ptr, len)?;
        let secret = std::str::from_utf8(&raw).map_err(|_| {
            OtpError::new(OtpErrorKind::InvalidSecretEncoding, "secret buffer is not UTF-8")
        })?;

        let code = match entry {
            EntryPoint::Hotp { counter, digits } => otp::hotp(secret, counter, digits)?,
            EntryPoint::Totp { time, digits, period } => otp::totp(secret, time, digits, period)?,
            EntryPoint::SteamGuard { time } => otp::steam_guard(secret, time)?,
        };

        let out = self.memory.allocate(code.len())?;
        if let Err(e) = self.memory.write(out, code.as_bytes()) {
            let _ = self.memory.free(out);
            return Err(e);
        }
        Ok((out, code.len()))
    }

    /// Run the full marshaling cycle for one generation request:
    /// allocate → write → call → read → free, releasing both buffers on every
    /// exit path.
    pub fn generate(&mut self, secret: &str, entry: EntryPoint) -> Result<String, OtpError> {
        let bytes = secret.as_bytes();
        self.with_buffer(bytes.len(), |engine, ptr| {
            engine.memory.write(ptr, bytes)?;
            let (out, out_len) = engine.call(ptr, bytes.len(), entry)?;
            let result = engine.memory.read(out, out_len);
            engine.memory.free(out)?;
            let code = result?;
            // Generator output is ASCII by construction.
            String::from_utf8(code).map_err(|_| {
                OtpError::new(OtpErrorKind::InvalidPointer, "result buffer is not UTF-8")
            })
        })
    }

    /// Allocate a scratch buffer for the duration of `f`, guaranteeing
    /// release whether `f` succeeds or fails.
    fn with_buffer<R>(
        &mut self,
        size: usize,
        f: impl FnOnce(&mut Engine, u32) -> Result<R, OtpError>,
    ) -> Result<R, OtpError> {
        let ptr = self.memory.allocate(size)?;
        let result = f(self, ptr);
        match self.memory.free(ptr) {
            Ok(()) => result,
            // A free failure only surfaces when the closure succeeded;
            // otherwise the closure's error is the interesting one.
            Err(free_err) => result.and(Err(free_err)),
        }
    }
}
