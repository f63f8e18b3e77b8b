//! Transport layer for the airlink workspace.
//!
//! Bridges to the actual device-control mechanism: an out-of-process
//! control script that speaks the purifier's wire protocol. This crate
//! owns everything below the session layer:
//!
//! - **[`ScriptGateway`]** — spawns the external process with a bounded
//!   lifetime, enforces the per-call timeout, and classifies every outcome
//!   into a [`Fault`]. No failure path panics or escapes unclassified.
//!
//! - **[`Fault`]** — the closed taxonomy of gateway failures, with
//!   [`is_transient()`](Fault::is_transient) deciding retryability.
//!   Control scripts frequently report transport problems as
//!   application-level error strings, so transient classification also
//!   matches a known set of failure hints inside device-reported messages.
//!
//! - **[`RawStatus`]** — the raw status payload, decoded once at this
//!   boundary from the script's JSON output. Device firmware is
//!   inconsistent about numeric vs string encodings; decoding is tolerant
//!   and malformed fields degrade to absent.
//!
//! - **[`with_retry`]** — bounded retry with a deterministic exponential
//!   backoff ladder, consulted by everything above for both status reads
//!   and command writes.

pub mod fault;
pub mod payload;
pub mod retry;
pub mod script;
pub mod transport;

pub use fault::Fault;
pub use payload::{FanSetting, RawStatus};
pub use retry::{RetryPolicy, with_retry};
pub use script::{Gateway, GatewayConfig, InvocationStyle, ScriptGateway};
pub use transport::{DeviceAddress, Transport};
