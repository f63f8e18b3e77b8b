//! Shared configuration for airlink tools.
//!
//! TOML device profiles plus gateway invocation settings, merged with
//! `AIRLINK_`-prefixed environment variables, and translation into the
//! runtime types `airlink_core` consumes. The CLI depends on this crate;
//! core itself never reads config files.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use airlink_core::{DeviceConfig, DeviceId, GatewayConfig, InvocationStyle, Transport};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("device '{id}' is not configured")]
    UnknownDevice { id: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// How to launch the external control script.
    #[serde(default)]
    pub gateway: GatewaySection,

    /// Configured devices.
    #[serde(default)]
    pub devices: Vec<DeviceEntry>,
}

/// Which argument shape the control script expects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleName {
    /// One single-purpose script per operation.
    #[default]
    Direct,
    /// One interface script with subcommands.
    Managed,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GatewaySection {
    /// Interpreter executable (defaults to the system `python3`).
    #[serde(default = "default_interpreter")]
    pub interpreter: PathBuf,

    #[serde(default)]
    pub style: StyleName,

    /// Interface script, required for the `managed` style.
    pub script: Option<PathBuf>,

    /// Per-operation scripts, required for the `direct` style.
    pub status_script: Option<PathBuf>,
    pub set_script: Option<PathBuf>,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            style: StyleName::default(),
            script: None,
            status_script: None,
            set_script: None,
        }
    }
}

fn default_interpreter() -> PathBuf {
    PathBuf::from("python3")
}

/// One configured device.
#[derive(Debug, Deserialize, Serialize)]
pub struct DeviceEntry {
    /// Identifier the device is registered and addressed under.
    pub id: String,

    /// Network address.
    pub host: String,

    #[serde(default)]
    pub transport: Transport,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_suspend_on_error")]
    pub suspend_on_error: bool,
}

fn default_poll_interval_secs() -> u64 {
    30
}
fn default_timeout_ms() -> u64 {
    30_000
}
fn default_max_retries() -> u32 {
    2
}
fn default_suspend_on_error() -> bool {
    true
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "airlink", "airlink").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("airlink");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full Config from a specific file + environment.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("AIRLINK_").split("_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning defaults if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(&config_path(), cfg)
}

/// Serialize config to TOML and write to a specific file.
pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation to runtime types ────────────────────────────────────

impl Config {
    /// Look up a device entry by id.
    pub fn device(&self, id: &str) -> Result<&DeviceEntry, ConfigError> {
        self.devices
            .iter()
            .find(|d| d.id == id)
            .ok_or_else(|| ConfigError::UnknownDevice { id: id.to_owned() })
    }

    /// Build the gateway launch configuration, checking that the scripts
    /// the selected style needs are actually configured.
    pub fn gateway_config(&self) -> Result<GatewayConfig, ConfigError> {
        let style = match self.gateway.style {
            StyleName::Direct => {
                let status_script = self.gateway.status_script.clone().ok_or_else(|| {
                    ConfigError::Validation {
                        field: "gateway.status_script".into(),
                        reason: "required for the direct invocation style".into(),
                    }
                })?;
                let set_script = self.gateway.set_script.clone().ok_or_else(|| {
                    ConfigError::Validation {
                        field: "gateway.set_script".into(),
                        reason: "required for the direct invocation style".into(),
                    }
                })?;
                InvocationStyle::Direct {
                    status_script,
                    set_script,
                }
            }
            StyleName::Managed => {
                let script =
                    self.gateway
                        .script
                        .clone()
                        .ok_or_else(|| ConfigError::Validation {
                            field: "gateway.script".into(),
                            reason: "required for the managed invocation style".into(),
                        })?;
                InvocationStyle::Managed { script }
            }
        };

        Ok(GatewayConfig {
            interpreter: self.gateway.interpreter.clone(),
            style,
        })
    }
}

impl DeviceEntry {
    /// Translate into the runtime `DeviceConfig`, applying the same
    /// validation registration would. Invalid entries fail here rather
    /// than defaulting silently.
    pub fn to_device_config(&self) -> Result<(DeviceId, DeviceConfig), ConfigError> {
        let config = DeviceConfig {
            host: self.host.clone(),
            transport: self.transport,
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            call_timeout: Duration::from_millis(self.timeout_ms),
            max_retries: self.max_retries,
            suspend_on_error: self.suspend_on_error,
        };

        config
            .validate()
            .map_err(|e| ConfigError::Validation {
                field: format!("devices.{}", self.id),
                reason: e.to_string(),
            })?;

        Ok((DeviceId::from(self.id.as_str()), config))
    }
}
