//! QuakeReview - seismic-event review catalog client for your terminal.
//!
//! A terminal-first, pipe-friendly client for browsing a review
//! backend's event catalog, inspecting normalized waveform traces, and
//! submitting review actions.

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, warn};

mod cli;
mod client;
mod errors;
mod models;
mod ordering;
mod output;
mod refresh;
mod trace;
mod waveform;

use cli::{Cli, Command};
use client::ReviewClient;
use models::{events_from_raw, Event};
use output::{OutputPick, TraceSeries};
use refresh::CatalogState;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    let client = connect(&cli)?;

    match cli.command {
        Command::Events(args) => cmd_events(&client, &args),
        Command::Watch(args) => cmd_watch(&client, &args),
        Command::Waveforms(args) => cmd_waveforms(&client, &args),
        Command::Stations(args) => cmd_stations(&client, &args),
        Command::Review(args) => cmd_review(&client, &args),
    }
}

/// Initialize tracing subscriber.
fn init_tracing(verbose: bool, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Resolve a connection option from the CLI or the environment.
fn resolve_option(flag: Option<&String>, env_var: &str) -> Result<String> {
    flag.cloned()
        .or_else(|| std::env::var(env_var).ok())
        .with_context(|| format!("missing connection option (set --{} or {env_var})",
            env_var.trim_start_matches("QUAKEREVIEW_").to_lowercase()))
}

/// Build a client and exchange credentials for a bearer token.
fn connect(cli: &Cli) -> Result<ReviewClient> {
    let endpoint = resolve_option(cli.endpoint.as_ref(), "QUAKEREVIEW_ENDPOINT")?;
    let user = resolve_option(cli.user.as_ref(), "QUAKEREVIEW_USER")?;
    let password = resolve_option(cli.password.as_ref(), "QUAKEREVIEW_PASSWORD")?;

    let mut client = ReviewClient::new(endpoint, user, password)
        .context("failed to create review client")?;
    client.login().context("failed to log into review service")?;
    Ok(client)
}

/// Fetch the catalog and convert it, newest events first.
fn load_catalog(client: &ReviewClient) -> Result<Vec<Event>> {
    let response = client
        .fetch_catalog()
        .context("failed to fetch event catalog")?;
    let mut events = events_from_raw(response.data.events);
    events.sort_by(|a, b| b.origin.time.cmp(&a.origin.time));
    Ok(events)
}

/// Execute the `events` command - one-shot fetch of the catalog.
fn cmd_events(client: &ReviewClient, args: &cli::EventsArgs) -> Result<()> {
    let mut events = load_catalog(client)?;

    if args.unreviewed {
        events.retain(|e| !e.reviewed);
    }
    events.truncate(args.limit);

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    output::write_events(&mut handle, &events, args.format)?;

    Ok(())
}

/// Execute the `watch` command - poll the catalog hash, print on change.
fn cmd_watch(client: &ReviewClient, args: &cli::WatchArgs) -> Result<()> {
    // Validate poll interval
    let interval = args.interval.max(10);
    if interval != args.interval {
        warn!("poll interval clamped to minimum of 10 seconds");
    }

    tracing::info!("watching catalog (poll every {interval}s)");

    let mut state = CatalogState::new();
    loop {
        let (new_state, updated) = refresh::refresh(client, state);
        state = new_state;

        if updated {
            let mut events: Vec<Event> = state.events.clone();
            events.sort_by(|a, b| b.origin.time.cmp(&a.origin.time));
            events.truncate(args.limit);

            let stdout = io::stdout();
            let mut handle = stdout.lock();
            if let Err(e) = output::write_events(&mut handle, &events, args.format) {
                warn!("failed to write events: {e}");
            }
            let _ = handle.flush();
        }

        std::thread::sleep(std::time::Duration::from_secs(interval));
    }
}

/// Execute the `waveforms` command - fetch, order, and normalize traces.
fn cmd_waveforms(client: &ReviewClient, args: &cli::WaveformsArgs) -> Result<()> {
    let identifier = args.event.to_string();
    let events = load_catalog(client)?;
    let event = events
        .iter()
        .find(|e| e.identifier == identifier)
        .with_context(|| format!("event {identifier} is not in the catalog"))?;

    // The station list is fetched independently; a miss only costs the
    // distance ordering.
    let stations = match client.fetch_stations() {
        Ok(response) => response.data,
        Err(e) => {
            warn!("failed to get station data: {e}");
            Vec::new()
        }
    };

    let response = client
        .fetch_waveforms(args.event)
        .context("failed to fetch waveforms")?;
    let waveforms = waveform::unpack_waveforms(&response);
    tracing::debug!("will plot {} waveforms", waveforms.len());

    let ordered = ordering::order_for_plot(
        waveforms,
        &stations,
        event.origin.latitude,
        event.origin.longitude,
    );

    let traces: Vec<TraceSeries> = ordered
        .iter()
        .enumerate()
        .map(|(lane, entry)| {
            let picks = trace::overlay_arrivals(&entry.waveform, &event.origin.arrivals)
                .into_iter()
                .map(|arrival| OutputPick {
                    phase: arrival.phase.clone(),
                    #[allow(clippy::cast_precision_loss)]
                    time_ms: arrival.time.timestamp_millis() as f64,
                })
                .collect();
            TraceSeries {
                name: entry.waveform.name.clone(),
                distance_m: entry.distance_m,
                lane,
                picks,
                points: trace::merge_segments(&entry.waveform.segments),
            }
        })
        .collect();

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    output::write_traces(&mut handle, &traces, args.format)?;

    Ok(())
}

/// Execute the `stations` command - list the station inventory.
fn cmd_stations(client: &ReviewClient, args: &cli::StationsArgs) -> Result<()> {
    let response = client
        .fetch_stations()
        .context("failed to fetch stations")?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    output::write_stations(&mut handle, &response.data, args.format)?;

    Ok(())
}

/// Execute the `review` command - submit a review action.
fn cmd_review(client: &ReviewClient, args: &cli::ReviewArgs) -> Result<()> {
    let response = client
        .submit_action(args.action, &args.event)
        .with_context(|| format!("failed to submit action for event {}", args.event))?;

    match response.message {
        Some(message) => println!("{message}"),
        None => println!("action accepted for event {}", args.event),
    }
    Ok(())
}
