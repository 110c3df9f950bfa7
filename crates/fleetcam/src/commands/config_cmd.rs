//! Config subcommand handlers.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(
                &fleetcam_config::config_path().display().to_string(),
                global.quiet,
            );
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = fleetcam_config::load_config()?;
            let active = fleetcam_config::active_profile_name(&cfg, global.profile.as_deref());
            let out = match global.output {
                OutputFormat::Table => {
                    let mut text = fleetcam_config::render_redacted(&cfg)?;
                    text.push_str("\n# active profile: ");
                    text.push_str(&active);
                    text
                }
                ref structured => output::render_single(
                    structured,
                    &fleetcam_config::redacted(&cfg),
                    |_| String::new(),
                )?,
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
