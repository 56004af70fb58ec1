//! Waveform unpacking.
//!
//! Converts raw per-station segment records from the `waveforms`
//! resource into typed waveforms with a computed time envelope.
//! Segments with no samples are dropped; waveforms with no retained
//! segments carry no plottable data and are excluded.

use serde::Deserialize;

/// Sentinel used in waveform names when the location code is absent.
const MISSING_LOCATION_CODE: &str = "--";

/// Response to a `waveforms` request.
#[derive(Debug, Clone, Deserialize)]
pub struct WaveformResponse {
    pub data: Vec<RawWaveform>,
}

/// A waveform as it appears on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct RawWaveform {
    pub network: String,
    pub station: String,
    pub channel: String,
    #[serde(rename = "locationCode")]
    pub location_code: Option<String>,
    #[serde(default)]
    pub segments: Vec<RawSegment>,
}

/// A segment as it appears on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSegment {
    #[serde(default)]
    pub data: Vec<f64>,
    /// Start time of the first sample, microsecond epoch
    #[serde(rename = "startTimeMuS")]
    pub start_time_micros: i64,
    #[serde(rename = "samplingRateHZ")]
    pub sampling_rate_hz: f64,
}

/// One contiguous run of evenly-sampled amplitude data.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Amplitude samples, unchanged from the wire
    pub data: Vec<f64>,
    /// Start time of the first sample, epoch seconds
    pub start_time: f64,
    /// Time of the last sample, epoch seconds
    pub end_time: f64,
    /// Samples per second
    pub sampling_rate: f64,
}

/// One channel's full record for a request window.
///
/// Segment order follows the input; it is not re-sorted here, so
/// consumers must not assume chronological order beyond that.
#[derive(Debug, Clone)]
pub struct Waveform {
    pub network: String,
    pub station: String,
    pub channel: String,
    pub location_code: Option<String>,
    /// Dot-joined identity, `--` standing in for a missing location code
    pub name: String,
    pub segments: Vec<Segment>,
    /// Earliest retained segment start, epoch seconds
    pub start_time: Option<f64>,
    /// Latest retained segment end, epoch seconds
    pub end_time: Option<f64>,
}

/// Unpack one raw segment. Returns `None` when there are no samples,
/// which is how sensors report an empty window (not an error).
#[must_use]
pub fn unpack_segment(raw: &RawSegment) -> Option<Segment> {
    if raw.data.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let start_time = raw.start_time_micros as f64 * 1e-6;
    #[allow(clippy::cast_precision_loss)]
    let end_time = start_time + (raw.data.len() - 1) as f64 / raw.sampling_rate_hz;
    Some(Segment {
        data: raw.data.clone(),
        start_time,
        end_time,
        sampling_rate: raw.sampling_rate_hz,
    })
}

/// Unpack one raw waveform, dropping empty segments and tracking the
/// time envelope over the retained ones. Input segment order is kept.
#[must_use]
pub fn unpack_waveform(raw: &RawWaveform) -> Waveform {
    let name = format!(
        "{}.{}.{}.{}",
        raw.network,
        raw.station,
        raw.channel,
        raw.location_code.as_deref().unwrap_or(MISSING_LOCATION_CODE)
    );

    let mut segments = Vec::with_capacity(raw.segments.len());
    let mut start_time: Option<f64> = None;
    let mut end_time: Option<f64> = None;
    for raw_segment in &raw.segments {
        if let Some(segment) = unpack_segment(raw_segment) {
            start_time = Some(start_time.map_or(segment.start_time, |t: f64| {
                t.min(segment.start_time)
            }));
            end_time = Some(end_time.map_or(segment.end_time, |t: f64| t.max(segment.end_time)));
            segments.push(segment);
        }
    }

    Waveform {
        network: raw.network.clone(),
        station: raw.station.clone(),
        channel: raw.channel.clone(),
        location_code: raw.location_code.clone(),
        name,
        segments,
        start_time,
        end_time,
    }
}

/// Unpack a full waveform response, retaining only waveforms that
/// carry at least one non-empty segment. Output order matches input
/// order; sorting by epicentral distance is a downstream concern.
#[must_use]
pub fn unpack_waveforms(response: &WaveformResponse) -> Vec<Waveform> {
    response
        .data
        .iter()
        .map(unpack_waveform)
        .filter(|w| !w.segments.is_empty())
        .collect()
}
