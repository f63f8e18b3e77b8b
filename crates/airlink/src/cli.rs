//! Clap derive structures for the `airlink` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use airlink_core::{OperatingMode, Transport};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// airlink -- poll and command networked air purifiers
#[derive(Debug, Parser)]
#[command(
    name = "airlink",
    version,
    about = "Poll and command networked air purifiers from the command line",
    long_about = "Bridges networked air purifiers into scripts and smart-home\n\
        setups. Talks to devices through an external control script and keeps\n\
        polling resilient: per-call timeouts, retry with backoff, and a circuit\n\
        breaker that stops hammering devices that stopped answering.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file path (default: platform config dir)
    #[arg(long, short = 'c', env = "AIRLINK_CONFIG_FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Device address override; also allows addressing a device that has
    /// no config entry
    #[arg(long, env = "AIRLINK_HOST", global = true)]
    pub host: Option<String>,

    /// Transport override (coap or coaps)
    #[arg(long, env = "AIRLINK_TRANSPORT", global = true)]
    pub transport: Option<Transport>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "AIRLINK_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line text (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show a device's current status
    #[command(alias = "st")]
    Status(StatusArgs),

    /// Send a command to a device
    Set(SetArgs),

    /// List configured devices
    #[command(alias = "dev", alias = "d")]
    Devices,

    /// Poll a device continuously and print status updates
    #[command(alias = "w")]
    Watch(WatchArgs),
}

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Device id from the config file
    pub device: String,

    /// Bypass the cache and fetch fresh state from the device
    #[arg(long)]
    pub fresh: bool,
}

#[derive(Debug, Args)]
pub struct SetArgs {
    #[command(subcommand)]
    pub action: SetAction,
}

#[derive(Debug, Subcommand)]
pub enum SetAction {
    /// Switch the device on or off
    Power {
        /// Device id from the config file
        device: String,
        /// Target state
        state: PowerArg,
    },

    /// Select an operating mode
    Mode {
        /// Device id from the config file
        device: String,
        /// Target mode
        mode: ModeArg,
    },

    /// Set the fan speed as a percentage (0 switches the device off)
    Fan {
        /// Device id from the config file
        device: String,
        /// Fan speed, 0-100
        percent: u8,
    },
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Device id from the config file
    pub device: String,
}

// ── Value enums ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PowerArg {
    On,
    Off,
}

impl PowerArg {
    pub fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Auto,
    Manual,
    Sleep,
}

impl From<ModeArg> for OperatingMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Auto => OperatingMode::Automatic,
            ModeArg::Manual => OperatingMode::Manual,
            ModeArg::Sleep => OperatingMode::Sleep,
        }
    }
}
