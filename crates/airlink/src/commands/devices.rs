//! `airlink devices`

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

pub fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let config = super::load_config(global)?;

    if config.devices.is_empty() {
        output::print_output(
            &format!(
                "No devices configured. Expected config at: {}",
                airlink_config::config_path().display()
            ),
            global.quiet,
        );
        return Ok(());
    }

    let rendered = output::render_devices(global.output, &config.devices);
    output::print_output(&rendered, global.quiet);
    Ok(())
}
