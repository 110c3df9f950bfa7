//! Clap derive structures for the `fleetcam` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use fleetcam_core::{Camera, Profile};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// fleetcam -- live streams, footage requests and clip tracking for dashcams
#[derive(Debug, Parser)]
#[command(
    name = "fleetcam",
    version,
    about = "Operate fleet dashcams from the command line",
    long_about = "Start and watch live dashcam streams, negotiate footage requests\n\
        against a unit's recording ring, and follow clip ingestion.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Gateway profile to use
    #[arg(long, short = 'p', env = "FLEETCAM_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Command gateway URL (overrides profile)
    #[arg(long, short = 'g', env = "FLEETCAM_GATEWAY", global = true)]
    pub gateway: Option<String>,

    /// Gateway API key
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "FLEETCAM_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "FLEETCAM_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "FLEETCAM_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start, watch and stop live streams
    #[command(alias = "s")]
    Stream(StreamArgs),

    /// Inspect recorded footage and request clips
    #[command(alias = "f")]
    Footage(FootageArgs),

    /// Follow clip ingestion for a unit
    Clips(ClipsArgs),

    /// Inspect CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared feed selection ────────────────────────────────────────────

/// Which unit, camera and quality a command targets.
#[derive(Debug, Args)]
pub struct FeedArgs {
    /// Unit serial number
    pub serial: String,

    /// Camera: road, driver (alias: cab)
    #[arg(long, short = 'c', default_value = "road")]
    pub camera: Camera,

    /// Quality profile: high, low
    #[arg(long, default_value = "high")]
    pub quality: Profile,
}

// ── Stream ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct StreamArgs {
    #[command(subcommand)]
    pub command: StreamCommand,
}

#[derive(Debug, Subcommand)]
pub enum StreamCommand {
    /// Start a live stream and hold it until Ctrl-C
    Watch {
        #[command(flatten)]
        feed: FeedArgs,

        /// Player command launched with the stream URL once active
        /// (e.g. "mpv" or "ffplay -loglevel error")
        #[arg(long)]
        player: Option<String>,
    },

    /// Query the gateway for the current feed status
    Status {
        #[command(flatten)]
        feed: FeedArgs,
    },

    /// Ask the unit to stop a feed
    Stop {
        #[command(flatten)]
        feed: FeedArgs,
    },
}

// ── Footage ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct FootageArgs {
    #[command(subcommand)]
    pub command: FootageCommand,
}

#[derive(Debug, Subcommand)]
pub enum FootageCommand {
    /// List recording regions still held on the unit
    #[command(alias = "ls")]
    Regions {
        #[command(flatten)]
        feed: FeedArgs,
    },

    /// Request a clip to be uploaded from the unit
    Request {
        #[command(flatten)]
        feed: FeedArgs,

        /// Clip start (unix seconds); defaults to the region start
        #[arg(long)]
        start: Option<i64>,

        /// Clip end (unix seconds); defaults to start + 300 within the region
        #[arg(long)]
        end: Option<i64>,

        /// Region index from `footage regions` (default: the region containing --start)
        #[arg(long)]
        region: Option<usize>,
    },
}

// ── Clips ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ClipsArgs {
    #[command(subcommand)]
    pub command: ClipsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ClipsCommand {
    /// Track clips for a unit from an NDJSON change feed on stdin
    Watch {
        /// Unit serial number
        serial: String,

        /// JSON array of stored clip records used as the initial snapshot
        #[arg(long)]
        seed: Option<PathBuf>,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,
    /// Show the effective configuration (API keys redacted)
    Show,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
