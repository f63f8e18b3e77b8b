//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use airlink_core::CoreError;

/// Exit codes for process termination.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Device communication ─────────────────────────────────────────
    #[error("Cannot reach device: {reason}")]
    #[diagnostic(
        code(airlink::unreachable),
        help(
            "Check that the device is powered and its address is correct.\n\
             Try: airlink status <device> --fresh -vv"
        )
    )]
    Unreachable { reason: String },

    #[error("Device call timed out after {timeout_ms}ms")]
    #[diagnostic(
        code(airlink::timeout),
        help("Increase timeout_ms in the device profile or check device responsiveness.")
    )]
    Timeout { timeout_ms: u64 },

    #[error("Device rejected the operation: {message}")]
    #[diagnostic(code(airlink::rejected))]
    Rejected { message: String },

    #[error("Gateway protocol mismatch: {detail}")]
    #[diagnostic(
        code(airlink::protocol),
        help(
            "The control script did not emit the expected JSON payload.\n\
             Check the [gateway] settings in your config file."
        )
    )]
    Protocol { detail: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("Device '{id}' not found")]
    #[diagnostic(
        code(airlink::not_found),
        help("Run: airlink devices to see configured devices")
    )]
    DeviceNotFound { id: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(airlink::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(airlink::config),
        help("Check the config file; 'airlink devices' prints the resolved path when none is found.")
    )]
    Config(#[from] airlink_config::ConfigError),

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Unreachable { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::DeviceNotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::DeviceNotFound { id } => CliError::DeviceNotFound { id },

            CoreError::AlreadyRegistered { id } => CliError::Validation {
                field: "device".into(),
                reason: format!("'{id}' is already registered"),
            },

            CoreError::Validation { field, reason } => CliError::Validation { field, reason },

            CoreError::Timeout { timeout_ms } => CliError::Timeout { timeout_ms },

            CoreError::Unreachable { reason } => CliError::Unreachable { reason },

            CoreError::Rejected { message } => CliError::Rejected { message },

            CoreError::Protocol { detail } => CliError::Protocol { detail },
        }
    }
}
