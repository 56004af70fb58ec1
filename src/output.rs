//! Output formatters for catalog events, stations, and traces.
//!
//! Supports human-readable (with colors), JSON, and NDJSON formats.

use std::io::{self, Write};

use serde::Serialize;

use crate::models::{Event, OutputEvent, Station};
use crate::trace::TracePoint;

// ANSI color codes
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[92m";
const YELLOW: &str = "\x1b[93m";

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Human-readable terminal output (default)
    #[default]
    Human,
    /// JSON array
    Json,
    /// Newline-delimited JSON (one object per line)
    Ndjson,
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            "ndjson" => Ok(Self::Ndjson),
            _ => Err(format!("unknown format: {s} (expected: human, json, ndjson)")),
        }
    }
}

/// A phase pick annotating a trace.
#[derive(Debug, Clone, Serialize)]
pub struct OutputPick {
    pub phase: String,
    /// Epoch milliseconds
    pub time_ms: f64,
}

/// One waveform's normalized trace, ready for overlay plotting.
#[derive(Debug, Clone, Serialize)]
pub struct TraceSeries {
    pub name: String,
    /// Epicentral distance in meters; absent when the station is unknown
    pub distance_m: Option<u64>,
    /// Vertical lane the trace plots in (0 = farthest station)
    pub lane: usize,
    pub picks: Vec<OutputPick>,
    pub points: Vec<TracePoint>,
}

fn review_label(reviewed: bool) -> String {
    if reviewed {
        format!("{GREEN}REVIEWED {RESET}")
    } else {
        format!("{YELLOW}AUTOMATIC{RESET}")
    }
}

/// Write events in human-readable format.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_events_human<W: Write>(writer: &mut W, events: &[Event]) -> io::Result<()> {
    for event in events {
        let time = event.origin.time.format("%Y-%m-%d %H:%M:%S%.3f");
        let depth_km = event.origin.depth * 1e-3;
        let picks = event.origin.arrivals.len();
        let status = review_label(event.reviewed);

        let aqms = if event.aqms_event_identifiers.is_empty() {
            String::new()
        } else {
            format!(" {DIM}aqms:{}{RESET}", event.aqms_event_identifiers.join(","))
        };

        writeln!(
            writer,
            "{BOLD}{:>8}{RESET} │ {time} UTC │ \
             {:>9.5}°, {:>10.5}° │ {DIM}{depth_km:>5.1}km{RESET} │ \
             {picks:>3} picks │ {status}{aqms}",
            event.identifier, event.origin.latitude, event.origin.longitude,
        )?;
    }
    Ok(())
}

/// Write events in the specified format.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_events<W: Write>(writer: &mut W, events: &[Event], format: Format) -> io::Result<()> {
    match format {
        Format::Human => write_events_human(writer, events),
        Format::Json => {
            let output: Vec<OutputEvent> = events.iter().map(OutputEvent::from).collect();
            write_json(writer, &output)
        }
        Format::Ndjson => {
            let output: Vec<OutputEvent> = events.iter().map(OutputEvent::from).collect();
            write_ndjson(writer, &output)
        }
    }
}

/// Write stations in the specified format.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_stations<W: Write>(
    writer: &mut W,
    stations: &[Station],
    format: Format,
) -> io::Result<()> {
    match format {
        Format::Human => {
            for station in stations {
                writeln!(
                    writer,
                    "{BOLD}{}.{:<5}{RESET} │ {:>9.5}°, {:>10.5}°",
                    station.network, station.name, station.latitude, station.longitude
                )?;
            }
            Ok(())
        }
        Format::Json => write_json(writer, stations),
        Format::Ndjson => write_ndjson(writer, stations),
    }
}

/// Write trace series in the specified format.
///
/// Human output summarizes each trace; JSON and NDJSON carry the full
/// point series.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_traces<W: Write>(
    writer: &mut W,
    traces: &[TraceSeries],
    format: Format,
) -> io::Result<()> {
    match format {
        Format::Human => {
            for trace in traces {
                let distance = trace.distance_m.map_or_else(
                    || "     ?".to_string(),
                    |d| format!("{:>5.1}km", d as f64 * 1e-3),
                );
                let window_ms = match (trace.points.first(), trace.points.last()) {
                    (Some(first), Some(last)) => last.time_ms - first.time_ms,
                    _ => 0.0,
                };
                writeln!(
                    writer,
                    "{BOLD}{:<16}{RESET} │ {distance} │ {:>8} samples │ {:>7.1}s │ {} picks",
                    trace.name,
                    trace.points.len(),
                    window_ms * 1e-3,
                    trace.picks.len(),
                )?;
            }
            Ok(())
        }
        Format::Json => write_json(writer, traces),
        Format::Ndjson => write_ndjson(writer, traces),
    }
}

fn write_json<W: Write, T: Serialize>(writer: &mut W, values: &[T]) -> io::Result<()> {
    let json = serde_json::to_string_pretty(values)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{json}")
}

fn write_ndjson<W: Write, T: Serialize>(writer: &mut W, values: &[T]) -> io::Result<()> {
    for value in values {
        let json = serde_json::to_string(value)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        writeln!(writer, "{json}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parse() {
        assert_eq!("human".parse::<Format>().unwrap(), Format::Human);
        assert_eq!("json".parse::<Format>().unwrap(), Format::Json);
        assert_eq!("ndjson".parse::<Format>().unwrap(), Format::Ndjson);
        assert!("invalid".parse::<Format>().is_err());
    }

    #[test]
    fn test_traces_ndjson_one_line_per_trace() {
        let traces = vec![
            TraceSeries {
                name: "UU.FORK.HHZ.01".into(),
                distance_m: Some(12_345),
                lane: 0,
                picks: vec![],
                points: vec![TracePoint {
                    time_ms: 1000.0,
                    amplitude: -1.0,
                }],
            },
            TraceSeries {
                name: "UU.MID.EHZ.--".into(),
                distance_m: None,
                lane: 1,
                picks: vec![],
                points: vec![],
            },
        ];

        let mut buffer = Vec::new();
        write_traces(&mut buffer, &traces, Format::Ndjson).expect("write failed");
        let text = String::from_utf8(buffer).expect("utf8");
        assert_eq!(text.lines().count(), 2);
        assert!(text.lines().next().unwrap().contains("UU.FORK.HHZ.01"));
    }
}
