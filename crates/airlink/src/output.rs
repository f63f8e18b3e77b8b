//! Output formatting: table, JSON, plain.
//!
//! Renders snapshots and device lists in the format selected by
//! `--output`. Table uses `tabled`, JSON serializes the domain types via
//! serde, plain emits compact single-line text for scripting.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use airlink_config::DeviceEntry;
use airlink_core::{PowerState, StatusSnapshot};

use crate::cli::OutputFormat;

/// Determine whether color output should be enabled.
pub fn should_color() -> bool {
    io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err()
}

// ── Status rendering ─────────────────────────────────────────────────

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "DEVICE")]
    device: String,
    #[tabled(rename = "POWER")]
    power: String,
    #[tabled(rename = "MODE")]
    mode: String,
    #[tabled(rename = "FAN")]
    fan: String,
    #[tabled(rename = "AQI")]
    air_quality: String,
    #[tabled(rename = "PRE-FILTER")]
    pre_filter: String,
    #[tabled(rename = "WICK-FILTER")]
    wick_filter: String,
    #[tabled(rename = "TEMP")]
    temperature: String,
    #[tabled(rename = "HUMIDITY")]
    humidity: String,
}

fn filter_cell(life: airlink_core::FilterLife) -> String {
    if life.change_required() {
        format!("{}% CHANGE", life.percent())
    } else {
        format!("{}%", life.percent())
    }
}

fn optional_cell(value: Option<f64>, suffix: &str) -> String {
    value.map_or_else(|| "-".into(), |v| format!("{v}{suffix}"))
}

fn status_row(device: &str, snap: &StatusSnapshot) -> StatusRow {
    StatusRow {
        device: device.to_owned(),
        power: snap.power.to_string(),
        mode: snap.mode.display_mode().to_string(),
        fan: format!("{}%", snap.fan_percent),
        air_quality: optional_cell(snap.air_quality, ""),
        pre_filter: filter_cell(snap.pre_filter),
        wick_filter: filter_cell(snap.wick_filter),
        temperature: optional_cell(snap.temperature, "°C"),
        humidity: optional_cell(snap.humidity, "%"),
    }
}

/// Render one device's snapshot in the chosen format.
pub fn render_status(format: OutputFormat, device: &str, snap: &StatusSnapshot) -> String {
    match format {
        OutputFormat::Table => Table::new([status_row(device, snap)])
            .with(Style::rounded())
            .to_string(),
        OutputFormat::Json => render_json(snap),
        OutputFormat::Plain => format!(
            "{device} power={} mode={} fan={}% aqi={} temp={} rh={}",
            snap.power,
            snap.mode.display_mode(),
            snap.fan_percent,
            optional_cell(snap.air_quality, ""),
            optional_cell(snap.temperature, ""),
            optional_cell(snap.humidity, ""),
        ),
    }
}

/// One timestamped line for `airlink watch`.
pub fn watch_line(snap: &StatusSnapshot) -> String {
    let power = if should_color() {
        match snap.power {
            PowerState::On => snap.power.green().to_string(),
            PowerState::Off => snap.power.red().to_string(),
        }
    } else {
        snap.power.to_string()
    };

    format!(
        "{} power={power} mode={} fan={}% aqi={} temp={} rh={}",
        snap.captured_at.format("%H:%M:%S"),
        snap.mode.display_mode(),
        snap.fan_percent,
        optional_cell(snap.air_quality, ""),
        optional_cell(snap.temperature, ""),
        optional_cell(snap.humidity, ""),
    )
}

// ── Device list rendering ────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "HOST")]
    host: String,
    #[tabled(rename = "TRANSPORT")]
    transport: String,
    #[tabled(rename = "POLL")]
    poll: String,
    #[tabled(rename = "TIMEOUT")]
    timeout: String,
    #[tabled(rename = "RETRIES")]
    retries: String,
    #[tabled(rename = "SUSPEND")]
    suspend: String,
}

/// Render the configured device list in the chosen format.
pub fn render_devices(format: OutputFormat, entries: &[DeviceEntry]) -> String {
    match format {
        OutputFormat::Table => {
            let rows: Vec<DeviceRow> = entries
                .iter()
                .map(|e| DeviceRow {
                    id: e.id.clone(),
                    host: e.host.clone(),
                    transport: e.transport.to_string(),
                    poll: format!("{}s", e.poll_interval_secs),
                    timeout: format!("{}ms", e.timeout_ms),
                    retries: e.max_retries.to_string(),
                    suspend: if e.suspend_on_error { "yes" } else { "no" }.into(),
                })
                .collect();
            Table::new(rows).with(Style::rounded()).to_string()
        }
        OutputFormat::Json => render_json(entries),
        OutputFormat::Plain => entries
            .iter()
            .map(|e| e.id.clone())
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

// ── Shared helpers ───────────────────────────────────────────────────

fn render_json<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".into())
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}
