// ── Core error types ──
//
// User-facing errors from airlink-core. These are NOT transport-specific --
// consumers never see child-process exit codes or JSON parse failures
// directly. The `From<Fault>` impl translates gateway-layer faults into
// domain-appropriate variants.

use thiserror::Error;

use airlink_gateway::Fault;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Registration errors ──────────────────────────────────────────
    #[error("Device not found: {id}")]
    DeviceNotFound { id: String },

    #[error("Device already registered: {id}")]
    AlreadyRegistered { id: String },

    #[error("Invalid value for {field}: {reason}")]
    Validation { field: String, reason: String },

    // ── Device communication errors ──────────────────────────────────
    #[error("Device call timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Cannot reach device: {reason}")]
    Unreachable { reason: String },

    #[error("Device rejected the operation: {message}")]
    Rejected { message: String },

    /// The control script broke its output contract. Surfaced immediately,
    /// never retried.
    #[error("Gateway protocol mismatch: {detail}")]
    Protocol { detail: String },
}

// ── Conversion from gateway-layer faults ─────────────────────────────

impl From<Fault> for CoreError {
    fn from(fault: Fault) -> Self {
        match fault {
            Fault::Timeout { timeout_ms } => CoreError::Timeout { timeout_ms },
            Fault::ConnectionFailure { reason } => CoreError::Unreachable { reason },
            Fault::DeviceReported { message } => CoreError::Rejected { message },
            Fault::MalformedResponse { detail } => CoreError::Protocol { detail },
        }
    }
}
