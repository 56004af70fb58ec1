//! Waveform merging and normalization.
//!
//! Expands a waveform's segments into `(time_ms, amplitude)` points and
//! rescales the amplitudes into a fixed `[-1, 1]` band so that traces of
//! wildly different absolute amplitude can share one vertical axis at
//! fixed per-trace offsets.

use serde::Serialize;
use tracing::debug;

use crate::models::Arrival;
use crate::waveform::{Segment, Waveform};

/// Amplitude range below which a trace is considered flat and left
/// unscaled, avoiding division blow-up on silent channels.
const FLAT_RANGE_EPSILON: f64 = 1e-4;

/// One plottable sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TracePoint {
    /// Epoch milliseconds
    pub time_ms: f64,
    pub amplitude: f64,
}

/// Expand one segment into evenly-spaced points.
///
/// Sample timestamps are assumed exactly evenly spaced within the
/// segment; there is no resampling.
#[must_use]
pub fn expand_segment(segment: &Segment) -> Vec<TracePoint> {
    let floor_time_ms = segment.start_time * 1000.0;
    let sampling_period_ms = 1000.0 / segment.sampling_rate;
    segment
        .data
        .iter()
        .enumerate()
        .map(|(i, &amplitude)| TracePoint {
            #[allow(clippy::cast_precision_loss)]
            time_ms: floor_time_ms + i as f64 * sampling_period_ms,
            amplitude,
        })
        .collect()
}

/// Merge a waveform's segments into a single normalized point series.
///
/// Segments are concatenated in their given order — no gap detection and
/// no global time sort, so out-of-chronological-order input yields a
/// series that jumps backward in time. Amplitudes are rescaled to
/// `[-1, 1]` from the observed range unless the trace is flat.
#[must_use]
pub fn merge_segments(segments: &[Segment]) -> Vec<TracePoint> {
    let mut points: Vec<TracePoint> = Vec::new();
    for segment in segments {
        points.extend(expand_segment(segment));
    }

    let y_min = points.iter().map(|p| p.amplitude).fold(f64::INFINITY, f64::min);
    let y_max = points
        .iter()
        .map(|p| p.amplitude)
        .fold(f64::NEG_INFINITY, f64::max);
    if (y_max - y_min).abs() > FLAT_RANGE_EPSILON {
        let rescale = 1.0 / (y_max - y_min);
        for point in &mut points {
            point.amplitude = 2.0 * (point.amplitude - y_min) * rescale - 1.0;
        }
    }
    debug!("rescaling range is [{y_min}, {y_max}]");
    points
}

/// Vertical offset of the trace plotted in lane `index`.
#[must_use]
pub fn lane_offset(index: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        2.0 * index as f64
    }
}

/// Shift a normalized trace into its plotting lane.
#[must_use]
pub fn shift_into_lane(points: &[TracePoint], index: usize) -> Vec<TracePoint> {
    let offset = lane_offset(index);
    points
        .iter()
        .map(|p| TracePoint {
            time_ms: p.time_ms,
            amplitude: p.amplitude + offset,
        })
        .collect()
}

/// Select the arrivals that annotate a waveform.
///
/// An arrival must match the waveform's network and station, fall inside
/// the waveform's time envelope, and obey the component rule: a P phase
/// annotates vertical-component channels only, every other phase
/// annotates non-vertical channels only.
#[must_use]
pub fn overlay_arrivals<'a>(waveform: &Waveform, arrivals: &'a [Arrival]) -> Vec<&'a Arrival> {
    let (Some(start_time), Some(end_time)) = (waveform.start_time, waveform.end_time) else {
        return Vec::new();
    };
    let vertical = waveform.channel.chars().nth(2) == Some('Z');

    arrivals
        .iter()
        .filter(|arrival| {
            if arrival.network != waveform.network || arrival.station != waveform.station {
                return false;
            }
            #[allow(clippy::cast_precision_loss)]
            let arrival_time = arrival.time.timestamp_millis() as f64 * 1e-3;
            if arrival_time < start_time || arrival_time > end_time {
                return false;
            }
            if arrival.phase == "P" { vertical } else { !vertical }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::epoch_seconds_to_utc;
    use crate::waveform::{RawSegment, unpack_segment};

    fn segment(data: Vec<f64>, start_time_micros: i64, sampling_rate_hz: f64) -> Segment {
        unpack_segment(&RawSegment {
            data,
            start_time_micros,
            sampling_rate_hz,
        })
        .expect("non-empty segment")
    }

    fn arrival(network: &str, station: &str, phase: &str, time: f64) -> Arrival {
        Arrival {
            network: network.into(),
            station: station.into(),
            channel1: "HHZ".into(),
            channel2: None,
            channel3: None,
            location_code: String::new(),
            phase: phase.into(),
            time: epoch_seconds_to_utc(time).expect("in range"),
            residual: None,
        }
    }

    fn waveform(network: &str, station: &str, channel: &str, segments: Vec<Segment>) -> Waveform {
        let start_time = segments.iter().map(|s| s.start_time).fold(f64::INFINITY, f64::min);
        let end_time = segments
            .iter()
            .map(|s| s.end_time)
            .fold(f64::NEG_INFINITY, f64::max);
        Waveform {
            network: network.into(),
            station: station.into(),
            channel: channel.into(),
            location_code: None,
            name: format!("{network}.{station}.{channel}.--"),
            segments,
            start_time: (start_time.is_finite()).then_some(start_time),
            end_time: (end_time.is_finite()).then_some(end_time),
        }
    }

    #[test]
    fn test_expand_segment_spacing() {
        let points = expand_segment(&segment(vec![0.0, 2.0, 4.0], 1_000_000, 1.0));
        let times: Vec<f64> = points.iter().map(|p| p.time_ms).collect();
        let amps: Vec<f64> = points.iter().map(|p| p.amplitude).collect();
        assert_eq!(times, vec![1000.0, 2000.0, 3000.0]);
        assert_eq!(amps, vec![0.0, 2.0, 4.0]);
    }

    #[test]
    fn test_merge_rescales_into_unit_band() {
        let points = merge_segments(&[segment(vec![0.0, 2.0, 4.0], 1_000_000, 1.0)]);
        let expected = [(1000.0, -1.0), (2000.0, 0.0), (3000.0, 1.0)];
        assert_eq!(points.len(), expected.len());
        for (point, (time_ms, amplitude)) in points.iter().zip(expected) {
            assert!((point.time_ms - time_ms).abs() < 1e-9);
            assert!((point.amplitude - amplitude).abs() < 1e-9);
        }
    }

    #[test]
    fn test_merge_length_is_sum_of_segments() {
        let points = merge_segments(&[
            segment(vec![1.0; 5], 0, 100.0),
            segment(vec![2.0; 7], 50_000, 100.0),
            segment(vec![3.0; 3], 120_000, 100.0),
        ]);
        assert_eq!(points.len(), 15);
    }

    #[test]
    fn test_merge_flat_trace_left_unscaled() {
        let points = merge_segments(&[segment(vec![5.0, 5.0 + 0.5e-4, 5.0], 0, 1.0)]);
        for point in points {
            assert!((point.amplitude - 5.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_merge_min_max_hit_band_edges() {
        let points = merge_segments(&[
            segment(vec![3.0, -7.0, 1.0], 0, 40.0),
            segment(vec![12.0, 0.25], 1_000_000, 40.0),
        ]);
        let min = points.iter().map(|p| p.amplitude).fold(f64::INFINITY, f64::min);
        let max = points
            .iter()
            .map(|p| p.amplitude)
            .fold(f64::NEG_INFINITY, f64::max);
        assert!((min + 1.0).abs() < 1e-12);
        assert!((max - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_merge_keeps_segment_order() {
        // Second segment starts before the first; the merged series is
        // expected to jump backward rather than be re-sorted.
        let points = merge_segments(&[
            segment(vec![0.0, 1.0], 10_000_000, 1.0),
            segment(vec![2.0, 3.0], 1_000_000, 1.0),
        ]);
        assert!(points[1].time_ms > points[2].time_ms);
    }

    #[test]
    fn test_lane_shift() {
        let points = [TracePoint {
            time_ms: 0.0,
            amplitude: -1.0,
        }];
        let shifted = shift_into_lane(&points, 3);
        assert!((shifted[0].amplitude - 5.0).abs() < 1e-12);
        assert!((lane_offset(0)).abs() < 1e-12);
    }

    #[test]
    fn test_overlay_component_rule() {
        let vertical = waveform("UU", "FORK", "HHZ", vec![segment(vec![0.0; 10], 0, 1.0)]);
        let horizontal = waveform("UU", "FORK", "HHN", vec![segment(vec![0.0; 10], 0, 1.0)]);
        let arrivals = [arrival("UU", "FORK", "P", 2.0), arrival("UU", "FORK", "S", 4.0)];

        let on_vertical = overlay_arrivals(&vertical, &arrivals);
        assert_eq!(on_vertical.len(), 1);
        assert_eq!(on_vertical[0].phase, "P");

        let on_horizontal = overlay_arrivals(&horizontal, &arrivals);
        assert_eq!(on_horizontal.len(), 1);
        assert_eq!(on_horizontal[0].phase, "S");
    }

    #[test]
    fn test_overlay_window_and_station_filters() {
        let vertical = waveform("UU", "FORK", "HHZ", vec![segment(vec![0.0; 10], 0, 1.0)]);
        let arrivals = [
            arrival("UU", "FORK", "P", 30.0), // outside the envelope
            arrival("UU", "MID", "P", 2.0),   // different station
        ];
        assert!(overlay_arrivals(&vertical, &arrivals).is_empty());
    }
}
