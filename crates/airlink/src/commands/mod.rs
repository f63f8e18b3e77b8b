//! Command handlers. Each handler loads the config, builds the gateway,
//! and drives the engine for one request-response cycle (or a watch
//! loop).

pub mod devices;
pub mod set;
pub mod status;
pub mod watch;

use airlink_config::Config;
use airlink_core::{Bridge, DeviceConfig, DeviceId, ScriptGateway};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Route a parsed command to its handler.
pub async fn dispatch(command: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match command {
        Command::Status(args) => status::handle(&args, global).await,
        Command::Set(args) => set::handle(args.action, global).await,
        Command::Devices => devices::handle(global),
        Command::Watch(args) => watch::handle(&args, global).await,
    }
}

/// Load the config file, honoring the `--config` override.
pub(crate) fn load_config(global: &GlobalOpts) -> Result<Config, CliError> {
    let config = match &global.config {
        Some(path) => airlink_config::load_config_from(path)?,
        None => airlink_config::load_config()?,
    };
    Ok(config)
}

/// Resolve one device entry and the gateway out of the config, applying
/// the global `--host`/`--transport` overrides. An explicit `--host`
/// also allows addressing a device that has no config entry.
pub(crate) fn resolve_device(
    config: &Config,
    global: &GlobalOpts,
    device: &str,
) -> Result<(ScriptGateway, DeviceId, DeviceConfig), CliError> {
    let (id, mut device_config) = match config.device(device) {
        Ok(entry) => entry.to_device_config()?,
        Err(err) => match &global.host {
            Some(host) => (DeviceId::from(device), DeviceConfig::new(host.clone())),
            None => return Err(err.into()),
        },
    };

    if let Some(host) = &global.host {
        device_config.host.clone_from(host);
    }
    if let Some(transport) = global.transport {
        device_config.transport = transport;
    }

    let gateway = ScriptGateway::new(config.gateway_config()?);
    Ok((gateway, id, device_config))
}

/// Build a polling bridge with one registered device (for `watch`).
pub(crate) async fn polling_bridge(
    config: &Config,
    global: &GlobalOpts,
    device: &str,
) -> Result<(Bridge<ScriptGateway>, DeviceId), CliError> {
    let (gateway, id, device_config) = resolve_device(config, global, device)?;
    let bridge = Bridge::new(gateway);
    bridge.register_device(id.clone(), device_config).await?;
    Ok((bridge, id))
}
