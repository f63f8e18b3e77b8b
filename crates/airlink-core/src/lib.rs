//! Device polling and resilience engine for airlink.
//!
//! This crate owns the session layer between the transport crate
//! (`airlink-gateway`) and consumers (CLI, home-automation bridges):
//!
//! - **[`Bridge`]** — the engine facade. [`register_device()`](Bridge::register_device)
//!   validates configuration, creates an isolated session, and starts the
//!   per-device polling timer; [`deregister_device()`](Bridge::deregister_device)
//!   cancels the timer before disposal. Cheaply cloneable via `Arc`.
//!
//! - **Polling scheduler** — one cooperative task per device, cancelled
//!   outright while a session is suspended. At most one gateway call is
//!   outstanding per session at any instant; an overlapping refresh is
//!   served from the cached snapshot instead of hitting the network.
//!
//! - **Circuit breaker** — three consecutive failed refreshes suspend
//!   periodic polling (when enabled) so a dead device cannot spam the log
//!   or the network. Recovery happens through the on-demand probe path:
//!   one successful forced read resumes the timer and restores live state.
//!
//! - **[`normalize`]** — the pure, total normalization step turning raw
//!   heterogeneous device fields into a [`StatusSnapshot`].
//!
//! Reads never fail: an unreachable device settles into the documented
//! safe-default presentation (off, fan 0%, filters OK). Writes propagate
//! their failure so callers can surface it.

pub mod bridge;
pub mod config;
pub mod error;
pub mod model;
pub mod normalize;
mod session;

pub use bridge::Bridge;
pub use config::{DeviceConfig, ERROR_THRESHOLD, MIN_POLL_INTERVAL};
pub use error::CoreError;
pub use model::{DeviceId, FilterLife, OperatingMode, PowerState, StatusSnapshot};
pub use normalize::normalize;

// Wire-level types defined by the gateway crate, re-exported for consumers.
pub use airlink_gateway::{Gateway, GatewayConfig, InvocationStyle, ScriptGateway, Transport};
