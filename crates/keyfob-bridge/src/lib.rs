//! # Keyfob – execution bridge
//!
//! Hosts the [`keyfob_core`] engine behind the marshaling contract a caller in
//! a separate memory space would use:
//!
//! - **Init-once environment** – a process-wide engine instance plus its
//!   linear memory region, established by the first `init` call and reused by
//!   every call after it
//! - **Linear memory** – a fixed-capacity byte region with an
//!   allocate/write/read/free protocol; explicit lengths, no terminators
//! - **Typed entry points** – HOTP, TOTP and Steam Guard dispatch with
//!   parameters validated before any cryptographic work
//!
//! Callers that only want codes use [`bridge::hotp`], [`bridge::totp`] and
//! [`bridge::steam_guard`], which run the whole allocate→write→call→read→free
//! cycle under a single lock acquisition.

pub mod bridge;
