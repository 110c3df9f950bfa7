mod cli;
mod commands;
mod config;
mod error;
mod output;
mod player;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use fleetcam_core::Console;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    // Exit explicitly: a pending stdin read would otherwise hold the
    // runtime open after `clips watch` is interrupted.
    let code = match run(cli).await {
        Ok(()) => 0,
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            code
        }
    };
    std::process::exit(code);
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a gateway
        Command::Config(ref args) => commands::config_cmd::handle(args, &cli.global),

        // Clip tracking reads its feed from stdin
        Command::Clips(args) => commands::clips::handle(args, &cli.global).await,

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "fleetcam", &mut std::io::stdout());
            Ok(())
        }

        // Everything else talks to the command gateway
        cmd => {
            let gateway_config = config::build_gateway_config(&cli.global)?;
            let console = Console::new(gateway_config)?;

            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &console, &cli.global).await
        }
    }
}
