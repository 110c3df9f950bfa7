//! Stream command handlers.

use std::time::Duration;

use indicatif::ProgressBar;
use serde::Serialize;
use tracing::{info, warn};

use fleetcam_core::{
    CommandGateway, Console, FeedStatus, PlayerFactory, StreamController, StreamSession,
    StreamState,
};

use crate::cli::{FeedArgs, GlobalOpts, StreamArgs, StreamCommand};
use crate::error::CliError;
use crate::output;
use crate::player::ExternalPlayers;

// ── Views ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct StatusView {
    stream: String,
    status: &'static str,
    stream_url: Option<String>,
}

fn feed_status_label(status: FeedStatus) -> &'static str {
    match status {
        FeedStatus::Active => "active",
        FeedStatus::Stopped => "stopped",
        FeedStatus::Unknown => "pending",
    }
}

fn session_detail(session: &StreamSession, color: bool) -> String {
    let mut lines = vec![
        format!(
            "Stream:   {}",
            session
                .key
                .as_ref()
                .map_or_else(|| "-".into(), ToString::to_string)
        ),
        format!("State:    {}", output::paint_state(session.state, color)),
    ];
    if let Some(ref endpoint) = session.endpoint {
        lines.push(format!("Endpoint: {endpoint}"));
    }
    if let Some(ref err) = session.last_error {
        lines.push(format!("Error:    {err}"));
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(console: &Console, args: StreamArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        StreamCommand::Watch { feed, player } => match player {
            Some(ref command_line) => {
                let players =
                    ExternalPlayers::parse(command_line).ok_or_else(|| CliError::Validation {
                        message: "--player needs a program to run".into(),
                    })?;
                watch(console.stream_controller_with(players), &feed, global).await
            }
            None => watch(console.stream_controller(), &feed, global).await,
        },

        StreamCommand::Status { feed } => {
            let key = feed.key();
            let status = CommandGateway::stream_status(console.gateway().as_ref(), &key).await?;
            let view = StatusView {
                stream: key.to_string(),
                status: feed_status_label(status.status),
                stream_url: status.stream_url,
            };
            let out = output::render_single(&global.output, &view, |v| {
                let mut detail = format!("Stream: {}\nStatus: {}", v.stream, v.status);
                if let Some(ref url) = v.stream_url {
                    detail.push_str(&format!("\nURL:    {url}"));
                }
                detail
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        StreamCommand::Stop { feed } => {
            let key = feed.key();
            CommandGateway::stop_stream(console.gateway().as_ref(), &key).await?;
            if !global.quiet {
                eprintln!("Stop requested for {key}");
            }
            Ok(())
        }
    }
}

/// Host one session until it fails or Ctrl-C. Every exit path goes
/// through a single `stop()`.
async fn watch<G, P>(
    controller: StreamController<G, P>,
    feed: &FeedArgs,
    global: &GlobalOpts,
) -> Result<(), CliError>
where
    G: CommandGateway,
    P: PlayerFactory,
{
    let outcome = tokio::select! {
        res = run_session(&controller, feed, global) => res,
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted, stopping stream");
            Ok(())
        }
    };

    if let Err(e) = controller.stop().await {
        warn!(error = %e, "stop request failed");
    }
    outcome
}

async fn run_session<G, P>(
    controller: &StreamController<G, P>,
    feed: &FeedArgs,
    global: &GlobalOpts,
) -> Result<(), CliError>
where
    G: CommandGateway,
    P: PlayerFactory,
{
    let key = feed.key();
    let color = output::should_color(&global.color);

    let spinner = if global.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    spinner.set_message(format!("Starting {key}..."));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let started = controller.start(key).await;
    let session = match started {
        Ok(()) => controller.wait_settled().await,
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e.into());
        }
    };
    spinner.finish_and_clear();

    if session.state != StreamState::Active {
        return Err(CliError::StreamFailed {
            message: session
                .last_error
                .unwrap_or_else(|| format!("session ended in state {}", session.state)),
        });
    }

    let out = output::render_single(&global.output, &session, |s| session_detail(s, color))?;
    output::print_output(&out, global.quiet);
    if let Some(ref err) = session.last_error {
        warn!(error = %err, "stream is active but playback is unavailable");
    }
    if !global.quiet {
        eprintln!("Press Ctrl-C to stop the stream.");
    }

    // Hold the session until something moves it off Active.
    let mut updates = controller.subscribe();
    let _ = updates
        .wait_for(|s| s.state != StreamState::Active)
        .await;
    Ok(())
}
