//! Clip tracking over an NDJSON change feed read from stdin.
//!
//! Each stdin line is one change event as the storage service emits it
//! (`{"eventType":"INSERT","new":{...}}`). `--seed` supplies the point
//! query result.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bytesize::ByteSize;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use tabled::Tabled;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Notify;
use tracing::warn;

use fleetcam_core::{Clip, ClipChange, ClipFeed, ClipStatus, ClipTracker, CoreError};

use crate::cli::{ClipsArgs, ClipsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util::{format_duration, format_utc};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ClipRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Camera")]
    camera: &'static str,
    #[tabled(rename = "From (UTC)")]
    start: String,
    #[tabled(rename = "Length")]
    length: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Size")]
    size: String,
}

impl From<&Arc<Clip>> for ClipRow {
    fn from(c: &Arc<Clip>) -> Self {
        let status = match c.status {
            ClipStatus::Receiving => format!("receiving {}%", c.progress_percent),
            ClipStatus::Failed => c
                .error_message
                .as_deref()
                .map_or_else(|| "failed".into(), |e| format!("failed: {e}")),
            other => other.to_string(),
        };
        Self {
            id: c.id.to_string(),
            camera: c.camera.short_name(),
            start: format_utc(c.start_utc),
            length: format_duration(c.end_utc.saturating_sub(c.start_utc)),
            status,
            size: if c.file_size > 0 {
                ByteSize::b(c.file_size).to_string()
            } else {
                ByteSize::b(c.bytes_received).to_string()
            },
        }
    }
}

// ── Stdin feed ──────────────────────────────────────────────────────

/// A `ClipFeed` backed by a seed file and stdin.
struct StdinFeed {
    seed: Vec<Clip>,
    /// Stdin is consumed by the first subscription only.
    stdin_taken: AtomicBool,
    closed: Arc<Notify>,
}

impl StdinFeed {
    fn new(seed: Vec<Clip>) -> Self {
        Self {
            seed,
            stdin_taken: AtomicBool::new(false),
            closed: Arc::new(Notify::new()),
        }
    }

    async fn closed(&self) {
        self.closed.notified().await;
    }
}

impl ClipFeed for StdinFeed {
    async fn fetch_clips(&self, serial: &str) -> Result<Vec<Clip>, CoreError> {
        Ok(self
            .seed
            .iter()
            .filter(|c| c.serial == serial)
            .cloned()
            .collect())
    }

    async fn subscribe(&self, _serial: &str) -> Result<BoxStream<'static, ClipChange>, CoreError> {
        if self.stdin_taken.swap(true, Ordering::SeqCst) {
            return Err(CoreError::Internal("stdin feed already subscribed".into()));
        }
        Ok(stdin_changes(Arc::clone(&self.closed)))
    }
}

fn stdin_changes(closed: Arc<Notify>) -> BoxStream<'static, ClipChange> {
    let changes = async_stream::stream! {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<ClipChange>(&line) {
                        Ok(change) => yield change,
                        Err(e) => warn!(error = %e, "skipping malformed change event"),
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "stdin read failed");
                    break;
                }
            }
        }
        closed.notify_one();
    };
    changes.boxed()
}

fn read_seed(path: &Path) -> Result<Vec<Clip>, CliError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: ClipsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ClipsCommand::Watch { serial, seed } => {
            let seed = seed.as_deref().map(read_seed).transpose()?.unwrap_or_default();
            let feed = Arc::new(StdinFeed::new(seed));
            let mut tracker = ClipTracker::attach(Arc::clone(&feed), serial).await?;

            let mut clips = tracker.subscribe();
            render(clips.current(), global)?;

            loop {
                tokio::select! {
                    next = clips.changed() => match next {
                        Some(snapshot) => render(&snapshot, global)?,
                        None => break,
                    },
                    () = feed.closed() => break,
                    _ = tokio::signal::ctrl_c() => break,
                }
            }

            // Changes applied between the last render and the feed closing.
            let latest = clips.latest();
            if !Arc::ptr_eq(clips.current(), &latest) {
                render(&latest, global)?;
            }
            tracker.detach();
            Ok(())
        }
    }
}

fn render(clips: &[Arc<Clip>], global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_list(&global.output, clips, |c| ClipRow::from(c))?;
    output::print_output(&out, global.quiet);
    Ok(())
}
