// ── Runtime device configuration ──
//
// These types describe *how* to poll one device. Built by the CLI or the
// config crate and handed to `Bridge::register_device` -- core never
// reads config files. Invalid values fail registration instead of being
// silently defaulted mid-flight.

use std::time::Duration;

use airlink_gateway::Transport;

use crate::error::CoreError;

/// Floor for the polling interval. Polling faster than this makes
/// overlapping-call pressure inevitable on a slow CoAP link.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Consecutive failed refreshes before periodic polling is suspended.
pub const ERROR_THRESHOLD: u32 = 3;

/// Configuration for polling a single device, immutable per session.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Network address of the device.
    pub host: String,

    /// Transport variant the control script should use.
    pub transport: Transport,

    /// How often the scheduler refreshes status.
    pub poll_interval: Duration,

    /// Budget for one external call.
    pub call_timeout: Duration,

    /// Retry budget per logical operation (additional attempts after the
    /// first).
    pub max_retries: u32,

    /// Suspend periodic polling after [`ERROR_THRESHOLD`] consecutive
    /// failures.
    pub suspend_on_error: bool,
}

impl DeviceConfig {
    /// Config for `host` with the stock defaults: encrypted transport,
    /// 30s poll interval, 30s call timeout, 2 retries, suspend enabled.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            transport: Transport::default(),
            poll_interval: Duration::from_secs(30),
            call_timeout: Duration::from_millis(30_000),
            max_retries: 2,
            suspend_on_error: true,
        }
    }

    /// Validate at registration time.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.host.trim().is_empty() {
            return Err(CoreError::Validation {
                field: "host".into(),
                reason: "device address must not be empty".into(),
            });
        }
        if self.poll_interval < MIN_POLL_INTERVAL {
            return Err(CoreError::Validation {
                field: "poll_interval".into(),
                reason: format!(
                    "must be at least {}s, got {}s",
                    MIN_POLL_INTERVAL.as_secs(),
                    self.poll_interval.as_secs()
                ),
            });
        }
        if self.call_timeout.is_zero() {
            return Err(CoreError::Validation {
                field: "call_timeout".into(),
                reason: "per-call timeout must be non-zero".into(),
            });
        }
        Ok(())
    }
}
