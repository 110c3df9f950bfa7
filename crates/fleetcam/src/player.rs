//! External player process as the stream's playback resource.

use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::{debug, warn};
use url::Url;

use fleetcam_core::{CoreError, Player, PlayerFactory};

/// Launches `program args... <endpoint>` when a stream becomes active.
#[derive(Debug, Clone)]
pub struct ExternalPlayers {
    program: String,
    args: Vec<String>,
}

impl ExternalPlayers {
    /// Split a command line like `"ffplay -loglevel error"` on whitespace.
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_owned);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }
}

impl PlayerFactory for ExternalPlayers {
    type Player = ExternalPlayer;

    fn create(&self, endpoint: &Url) -> Result<ExternalPlayer, CoreError> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(endpoint.as_str())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CoreError::Internal(format!("cannot launch {}: {e}", self.program)))?;
        debug!(program = %self.program, pid = child.id(), "player launched");
        Ok(ExternalPlayer { child })
    }
}

pub struct ExternalPlayer {
    child: Child,
}

impl Player for ExternalPlayer {
    fn dispose(&mut self) {
        if let Err(e) = self.child.start_kill() {
            warn!(error = %e, "player process did not accept kill");
        }
    }
}
