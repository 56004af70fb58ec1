//! Command-line interface definitions.
//!
//! Uses clap derive API for argument parsing.

use clap::{Parser, Subcommand};

use crate::client::ReviewAction;
use crate::output::Format;

/// Review seismic-event catalogs from your terminal.
#[derive(Parser, Debug)]
#[command(name = "quakereview")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Command,

    /// Review service endpoint URL (or QUAKEREVIEW_ENDPOINT)
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Login user (or QUAKEREVIEW_USER)
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Login password (or QUAKEREVIEW_PASSWORD)
    #[arg(long, global = true)]
    pub password: Option<String>,

    /// Enable verbose debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    pub quiet: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the current event catalog (one-shot fetch and exit)
    Events(EventsArgs),

    /// Watch the catalog, printing it whenever it changes
    Watch(WatchArgs),

    /// Fetch and normalize an event's waveforms
    Waveforms(WaveformsArgs),

    /// List the station inventory
    Stations(StationsArgs),

    /// Submit a review action against an event
    Review(ReviewArgs),
}

/// Arguments for the `events` command.
#[derive(Parser, Debug)]
pub struct EventsArgs {
    /// Only show events not yet reviewed
    #[arg(long)]
    pub unreviewed: bool,

    /// Maximum number of events to show
    #[arg(long, short = 'n', default_value = "50")]
    pub limit: usize,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Arguments for the `watch` command.
#[derive(Parser, Debug)]
pub struct WatchArgs {
    /// Poll interval in seconds (minimum 10)
    #[arg(long, default_value = "60")]
    pub interval: u64,

    /// Maximum number of events to show per update
    #[arg(long, short = 'n', default_value = "50")]
    pub limit: usize,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Arguments for the `waveforms` command.
#[derive(Parser, Debug)]
pub struct WaveformsArgs {
    /// Event identifier to fetch waveforms for
    #[arg(long, short = 'e')]
    pub event: i64,

    /// Output format (human summarizes; json/ndjson carry full traces)
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Arguments for the `stations` command.
#[derive(Parser, Debug)]
pub struct StationsArgs {
    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Arguments for the `review` command.
#[derive(Parser, Debug)]
pub struct ReviewArgs {
    /// Event identifier to act on
    #[arg(long, short = 'e')]
    pub event: String,

    /// Action to submit: accept-aws, accept-aqms, or reject
    #[arg(value_parser = parse_action)]
    pub action: ReviewAction,
}

/// Parse an output format from string.
fn parse_format(s: &str) -> Result<Format, String> {
    s.parse()
}

/// Parse a review action from string.
fn parse_action(s: &str) -> Result<ReviewAction, String> {
    s.parse()
}
