//! Footage command handlers: ring summary listing and clip requests.

use serde::Serialize;
use tabled::Tabled;

use fleetcam_core::{ClipRequestDraft, Console, MAX_CLIP_SECS, RecordingRegion};

use crate::cli::{FeedArgs, FootageArgs, FootageCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util::{format_duration, format_utc};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct RegionRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "From (UTC)")]
    start: String,
    #[tabled(rename = "To (UTC)")]
    end: String,
    #[tabled(rename = "Length")]
    length: String,
}

#[derive(Serialize)]
struct IndexedRegion {
    index: usize,
    start_utc: i64,
    end_utc: i64,
}

impl From<&IndexedRegion> for RegionRow {
    fn from(r: &IndexedRegion) -> Self {
        Self {
            index: r.index,
            start: format_utc(r.start_utc),
            end: format_utc(r.end_utc),
            length: format_duration(r.end_utc.saturating_sub(r.start_utc)),
        }
    }
}

fn draft_detail(draft: &ClipRequestDraft) -> String {
    format!(
        "Requested {} of {} footage ({}) from {}\nFrom: {} UTC\nTo:   {} UTC",
        format_duration(draft.duration_secs()),
        draft.camera(),
        draft.profile(),
        draft.serial(),
        format_utc(draft.start_utc()),
        format_utc(draft.end_utc()),
    )
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(console: &Console, args: FootageArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        FootageCommand::Regions { feed } => {
            let mut negotiator = console.negotiator();
            let regions = negotiator
                .fetch_regions(&feed.serial, feed.camera, feed.quality)
                .await?;
            if regions.is_empty() && !global.quiet {
                eprintln!(
                    "No footage available for {} ({}, {})",
                    feed.serial, feed.camera, feed.quality
                );
            }
            let indexed: Vec<IndexedRegion> = regions
                .iter()
                .enumerate()
                .map(|(index, r)| IndexedRegion {
                    index,
                    start_utc: r.start_utc(),
                    end_utc: r.end_utc(),
                })
                .collect();
            let out = output::render_list(&global.output, &indexed, |r| RegionRow::from(r))?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        FootageCommand::Request {
            feed,
            start,
            end,
            region,
        } => {
            let mut negotiator = console.negotiator();
            let regions = negotiator
                .fetch_regions(&feed.serial, feed.camera, feed.quality)
                .await?;
            let chosen = choose_region(&regions, &feed, region, start.or(end))?;

            let draft = match (start, end) {
                (None, None) => negotiator.select_region(chosen)?,
                (Some(s), Some(e)) => negotiator.select_range(chosen, s, e)?,
                (Some(s), None) => negotiator.select_range(
                    chosen,
                    s,
                    s.saturating_add(MAX_CLIP_SECS).min(chosen.end_utc()),
                )?,
                (None, Some(e)) => negotiator.select_range(
                    chosen,
                    e.saturating_sub(MAX_CLIP_SECS).max(chosen.start_utc()),
                    e,
                )?,
            }
            .clone();

            negotiator.submit().await?;

            let out = output::render_single(&global.output, &draft, draft_detail)?;
            output::print_output(&out, global.quiet);
            if !global.quiet {
                eprintln!("The clip will appear once the unit finishes uploading it.");
            }
            Ok(())
        }
    }
}

/// Explicit index first, then the region holding `anchor`, then the most
/// recent region.
fn choose_region(
    regions: &[RecordingRegion],
    feed: &FeedArgs,
    index: Option<usize>,
    anchor: Option<i64>,
) -> Result<RecordingRegion, CliError> {
    if regions.is_empty() {
        return Err(CliError::NoFootage {
            serial: feed.serial.clone(),
            camera: feed.camera.to_string(),
            quality: feed.quality.to_string(),
        });
    }
    if let Some(index) = index {
        return regions
            .get(index)
            .copied()
            .ok_or_else(|| CliError::RegionNotFound {
                index,
                serial: feed.serial.clone(),
            });
    }
    if let Some(t) = anchor {
        return regions
            .iter()
            .find(|r| r.start_utc() <= t && t <= r.end_utc())
            .copied()
            .ok_or_else(|| CliError::Validation {
                message: format!("No recording region contains {}", format_utc(t)),
            });
    }
    regions
        .iter()
        .max_by_key(|r| r.end_utc())
        .copied()
        .ok_or_else(|| CliError::Validation {
            message: "No recording region to choose from".into(),
        })
}
