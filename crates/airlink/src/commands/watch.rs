//! `airlink watch <device>` -- run the polling engine in the foreground
//! and print snapshot updates as they arrive. Ctrl-C stops it.

use tracing::debug;

use crate::cli::{GlobalOpts, WatchArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(args: &WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let config = super::load_config(global)?;
    let (bridge, id) = super::polling_bridge(&config, global, &args.device).await?;
    let mut rx = bridge.subscribe(&id)?;

    output::print_output(
        &format!("watching {id} (Ctrl-C to stop)"),
        global.quiet,
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupt received, shutting down");
                break;
            }
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let line = rx
                    .borrow_and_update()
                    .as_ref()
                    .map(output::watch_line);
                if let Some(line) = line {
                    output::print_output(&line, global.quiet);
                }
            }
        }
    }

    bridge.shutdown().await;
    Ok(())
}
