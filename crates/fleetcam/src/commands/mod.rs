//! Command dispatch: bridges CLI args -> core sessions -> output formatting.

pub mod clips;
pub mod config_cmd;
pub mod footage;
pub mod stream;
pub mod util;

use fleetcam_core::Console;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a gateway-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, console: &Console, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Stream(args) => stream::handle(console, args, global).await,
        Command::Footage(args) => footage::handle(console, args, global).await,
        // Clips, Config and Completions are handled before dispatch
        Command::Clips(_) | Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
