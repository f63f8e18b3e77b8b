use thiserror::Error;

/// Substrings that mark a device-reported error message as a transport
/// problem rather than a genuine application failure. Control scripts
/// collapse every exception into an `error` string, so this is the only
/// signal available for those cases.
const TRANSPORT_FAILURE_HINTS: &[&str] = &[
    "timeout",
    "timed out",
    "connection refused",
    "no route to host",
    "broken pipe",
    "network is unreachable",
    "connection reset",
];

/// Classified failure outcome of a gateway invocation.
///
/// Covers every failure mode of the external control process: the
/// timeout race, spawn/IO trouble, errors the device itself reports,
/// and output that violates the JSON contract. The session layer maps
/// these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Fault {
    /// The call exceeded its budget; the child process was killed.
    #[error("Gateway call timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The process could not be spawned or its pipes failed mid-read.
    #[error("Could not reach device: {reason}")]
    ConnectionFailure { reason: String },

    /// The control process ran but reported an application-level error.
    #[error("Device reported an error: {message}")]
    DeviceReported { message: String },

    /// Primary output was not the expected JSON payload. Indicates a
    /// contract mismatch with the control script -- never retried.
    #[error("Malformed gateway response: {detail}")]
    MalformedResponse { detail: String },
}

impl Fault {
    /// Returns `true` if this is a transient fault worth retrying.
    ///
    /// Timeouts and connection failures always qualify. Device-reported
    /// errors qualify only when the message matches a known transport
    /// failure hint. Malformed responses never qualify.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::ConnectionFailure { .. } => true,
            Self::DeviceReported { message } => {
                let lowered = message.to_lowercase();
                TRANSPORT_FAILURE_HINTS
                    .iter()
                    .any(|hint| lowered.contains(hint))
            }
            Self::MalformedResponse { .. } => false,
        }
    }
}
