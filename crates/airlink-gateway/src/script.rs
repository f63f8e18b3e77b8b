//! External command gateway backed by a control script.
//!
//! Spawns a bounded-lifetime child process per call and parses its JSON
//! output. The per-call timeout is enforced independently of the child's
//! own exit: an overrunning process is killed and reaped before
//! [`Fault::Timeout`] is returned, so nothing is left orphaned.
//!
//! Two invocation shapes exist in the field and are selected by
//! [`InvocationStyle`]; the classification and resilience logic is shared,
//! only argument construction and envelope unwrapping differ.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::Instant;

use crate::fault::Fault;
use crate::payload::RawStatus;
use crate::transport::DeviceAddress;

/// Contract between the session layer and the device-control mechanism.
///
/// One status read, one field write. Implementations must resolve every
/// failure path into a [`Fault`] -- callers never see panics or raw IO
/// errors. The engine is generic over this trait so resilience behavior
/// can be exercised against a scripted stand-in.
pub trait Gateway: Send + Sync + 'static {
    /// Fetch the device's raw status fields.
    fn fetch_status(
        &self,
        device: &DeviceAddress,
        timeout: Duration,
    ) -> impl Future<Output = Result<RawStatus, Fault>> + Send;

    /// Set one raw device field to a wire-encoded value.
    fn set_field(
        &self,
        device: &DeviceAddress,
        field: &str,
        value: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<(), Fault>> + Send;
}

/// Which argument shape the control script expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationStyle {
    /// One single-purpose script per operation:
    /// `<status_script> <host> <transport>` and
    /// `<set_script> <host> <transport> <field> <value>`.
    Direct {
        status_script: PathBuf,
        set_script: PathBuf,
    },

    /// One interface script with subcommands:
    /// `<script> status <id> <host> <transport> true` and
    /// `<script> set <id> <host> <field> <value> <transport>`.
    /// Responses arrive wrapped in a `{"success": ..., "status_data": ...}`
    /// envelope.
    Managed { script: PathBuf },
}

/// How to launch the control process.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Interpreter executable. Defaults to the system `python3`.
    pub interpreter: PathBuf,

    /// Invocation shape and script location(s).
    pub style: InvocationStyle,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            interpreter: PathBuf::from("python3"),
            style: InvocationStyle::Direct {
                status_script: PathBuf::from("get_status.py"),
                set_script: PathBuf::from("set_value.py"),
            },
        }
    }
}

/// The production [`Gateway`]: each call spawns the configured script.
#[derive(Debug, Clone)]
pub struct ScriptGateway {
    config: GatewayConfig,
}

impl ScriptGateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self { config }
    }

    fn status_args(&self, device: &DeviceAddress) -> Vec<String> {
        match &self.config.style {
            InvocationStyle::Direct { status_script, .. } => vec![
                status_script.display().to_string(),
                device.host.clone(),
                device.transport.to_string(),
            ],
            // The engine owns caching, so the interface script's own cache
            // is always bypassed with a forced poll.
            InvocationStyle::Managed { script } => vec![
                script.display().to_string(),
                "status".into(),
                device.id.clone(),
                device.host.clone(),
                device.transport.to_string(),
                "true".into(),
            ],
        }
    }

    fn set_args(&self, device: &DeviceAddress, field: &str, value: &str) -> Vec<String> {
        match &self.config.style {
            InvocationStyle::Direct { set_script, .. } => vec![
                set_script.display().to_string(),
                device.host.clone(),
                device.transport.to_string(),
                field.into(),
                value.into(),
            ],
            InvocationStyle::Managed { script } => vec![
                script.display().to_string(),
                "set".into(),
                device.id.clone(),
                device.host.clone(),
                field.into(),
                value.into(),
                device.transport.to_string(),
            ],
        }
    }

    /// Spawn the control process, enforce the timeout, classify the outcome.
    ///
    /// Never panics and never returns a raw IO error -- every path resolves
    /// to a payload or a [`Fault`].
    async fn invoke(
        &self,
        operation: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<serde_json::Value, Fault> {
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        let started = Instant::now();

        tracing::debug!(
            operation,
            interpreter = %self.config.interpreter.display(),
            ?args,
            "invoking control script"
        );

        let mut child = Command::new(&self.config.interpreter)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Fault::ConnectionFailure {
                reason: format!(
                    "failed to spawn {}: {e}",
                    self.config.interpreter.display()
                ),
            })?;

        let Some(mut stdout) = child.stdout.take() else {
            return Err(Fault::ConnectionFailure {
                reason: "child stdout pipe unavailable".into(),
            });
        };
        let Some(mut stderr) = child.stderr.take() else {
            return Err(Fault::ConnectionFailure {
                reason: "child stderr pipe unavailable".into(),
            });
        };

        // Drain both pipes to EOF, then reap. Reads run concurrently so a
        // chatty child cannot deadlock on a full pipe buffer.
        let outcome = {
            let collect = async {
                let mut out = Vec::new();
                let mut diag = Vec::new();
                let (read_out, read_diag) =
                    tokio::join!(stdout.read_to_end(&mut out), stderr.read_to_end(&mut diag));
                read_out?;
                read_diag?;
                let status = child.wait().await?;
                Ok::<_, std::io::Error>((status, out, diag))
            };
            tokio::time::timeout(timeout, collect).await
        };

        let (status, out, diag) = match outcome {
            Ok(Ok(collected)) => collected,
            Ok(Err(e)) => {
                let _ = child.start_kill();
                let _ = child.wait().await;
                return Err(Fault::ConnectionFailure {
                    reason: format!("failed reading control script output: {e}"),
                });
            }
            Err(_elapsed) => {
                // Kill and reap so the overrunning process is not orphaned.
                let _ = child.start_kill();
                let _ = child.wait().await;
                tracing::warn!(
                    operation,
                    timeout_ms,
                    "control script exceeded its timeout and was killed"
                );
                return Err(Fault::Timeout { timeout_ms });
            }
        };

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let diagnostics = String::from_utf8_lossy(&diag);
        if !diagnostics.trim().is_empty() {
            tracing::warn!(operation, diagnostics = %diagnostics.trim(), "control script diagnostics");
        }

        let stdout_text = String::from_utf8_lossy(&out);
        let payload: serde_json::Value = match serde_json::from_str(stdout_text.trim()) {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(
                    operation,
                    exit = status.code(),
                    elapsed_ms,
                    error = %e,
                    "control script output was not the expected JSON payload"
                );
                return Err(Fault::MalformedResponse {
                    detail: format!("invalid JSON on stdout: {e}"),
                });
            }
        };

        if let Some(message) = payload.get("error").and_then(serde_json::Value::as_str) {
            tracing::warn!(operation, elapsed_ms, message, "device reported an error");
            return Err(Fault::DeviceReported {
                message: message.to_owned(),
            });
        }

        if !status.success() {
            tracing::warn!(
                operation,
                exit = status.code(),
                elapsed_ms,
                "control script exited non-zero but produced a valid payload"
            );
        }

        tracing::debug!(operation, elapsed_ms, "control script call succeeded");

        // Managed-style responses wrap the fields in an envelope.
        match payload.get("status_data") {
            Some(data) => Ok(data.clone()),
            None => Ok(payload),
        }
    }
}

impl Gateway for ScriptGateway {
    fn fetch_status(
        &self,
        device: &DeviceAddress,
        timeout: Duration,
    ) -> impl Future<Output = Result<RawStatus, Fault>> + Send {
        async move {
            let args = self.status_args(device);
            let payload = self.invoke("status", &args, timeout).await?;
            Ok(RawStatus::from_value(&payload))
        }
    }

    fn set_field(
        &self,
        device: &DeviceAddress,
        field: &str,
        value: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<(), Fault>> + Send {
        async move {
            let args = self.set_args(device, field, value);
            self.invoke("set", &args, timeout).await.map(|_| ())
        }
    }
}
