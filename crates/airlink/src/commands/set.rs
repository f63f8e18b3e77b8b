//! `airlink set power|mode|fan <device> <value>`

use airlink_core::{Bridge, OperatingMode};

use crate::cli::{GlobalOpts, SetAction};
use crate::error::CliError;
use crate::output;

pub async fn handle(action: SetAction, global: &GlobalOpts) -> Result<(), CliError> {
    let config = super::load_config(global)?;

    let (device, description) = match &action {
        SetAction::Power { device, state } => {
            (device.clone(), format!("power {}", if state.is_on() { "on" } else { "off" }))
        }
        SetAction::Mode { device, mode } => {
            (device.clone(), format!("mode {}", OperatingMode::from(*mode)))
        }
        SetAction::Fan { device, percent } => (device.clone(), format!("fan {percent}%")),
    };

    let (gateway, id, device_config) = super::resolve_device(&config, global, &device)?;

    {
        let id = id.clone();
        Bridge::oneshot(gateway, id.clone(), device_config, move |bridge| async move {
            match action {
                SetAction::Power { state, .. } => bridge.set_power(&id, state.is_on()).await,
                SetAction::Mode { mode, .. } => {
                    bridge.set_mode(&id, OperatingMode::from(mode)).await
                }
                SetAction::Fan { percent, .. } => bridge.set_fan_percent(&id, percent).await,
            }
        })
        .await?;
    }

    output::print_output(&format!("{id}: {description}"), global.quiet);
    Ok(())
}
