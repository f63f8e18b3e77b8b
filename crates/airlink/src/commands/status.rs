//! `airlink status <device> [--fresh]`

use airlink_core::Bridge;

use crate::cli::{GlobalOpts, StatusArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(args: &StatusArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let config = super::load_config(global)?;
    let (gateway, id, device_config) = super::resolve_device(&config, global, &args.device)?;

    let fresh = args.fresh;
    let snapshot = {
        let id = id.clone();
        Bridge::oneshot(gateway, id.clone(), device_config, move |bridge| async move {
            bridge.get_snapshot(&id, fresh).await
        })
        .await?
    };

    let rendered = output::render_status(global.output, id.as_str(), &snapshot);
    output::print_output(&rendered, global.quiet);
    Ok(())
}
