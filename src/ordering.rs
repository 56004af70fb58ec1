//! Plot ordering for waveform collections.
//!
//! Computes each waveform's great-circle distance from the event
//! epicenter to its station and sorts farthest-first, so a reverse
//! iteration at render time stacks the nearest station on top.

use std::cmp::Ordering;
use std::f64::consts::PI;

use tracing::warn;

use crate::models::Station;
use crate::waveform::Waveform;

/// Earth radius in meters for haversine calculations.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A waveform carrying its epicentral distance as an explicit attribute.
#[derive(Debug, Clone)]
pub struct OrderedWaveform {
    pub waveform: Waveform,
    /// Epicenter-to-station distance in whole meters; unset when the
    /// station list has no match for the waveform
    pub distance_m: Option<u64>,
}

/// Calculate the great-circle distance between two points using the haversine formula.
///
/// Returns distance in meters.
#[must_use]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1 * PI / 180.0;
    let lat2_rad = lat2 * PI / 180.0;
    let delta_lat = (lat2 - lat1) * PI / 180.0;
    let delta_lon = (lon2 - lon1) * PI / 180.0;

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_M * c
}

/// Look up a waveform's station and compute its epicentral distance.
///
/// Linear search, first match wins. Warns and returns `None` when the
/// station list has no entry for the waveform.
#[must_use]
pub fn station_distance_m(
    network: &str,
    station: &str,
    event_latitude: f64,
    event_longitude: f64,
    stations: &[Station],
) -> Option<u64> {
    for candidate in stations {
        if candidate.network == network && candidate.name == station {
            let distance = haversine_distance(
                event_latitude,
                event_longitude,
                candidate.latitude,
                candidate.longitude,
            );
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            return Some(distance.floor() as u64);
        }
    }
    warn!("could not find distance for {network}.{station}");
    None
}

/// Attach distances and sort farthest-first, ties by ascending name.
///
/// Waveforms whose station is unknown sort after every known distance.
/// Returns new structures; the input collection is consumed, not
/// mutated in place.
#[must_use]
pub fn order_for_plot(
    waveforms: Vec<Waveform>,
    stations: &[Station],
    event_latitude: f64,
    event_longitude: f64,
) -> Vec<OrderedWaveform> {
    let mut ordered: Vec<OrderedWaveform> = waveforms
        .into_iter()
        .map(|waveform| {
            let distance_m = station_distance_m(
                &waveform.network,
                &waveform.station,
                event_latitude,
                event_longitude,
                stations,
            );
            OrderedWaveform {
                waveform,
                distance_m,
            }
        })
        .collect();

    ordered.sort_by(|a, b| match (a.distance_m, b.distance_m) {
        (Some(da), Some(db)) => db
            .cmp(&da)
            .then_with(|| a.waveform.name.cmp(&b.waveform.name)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.waveform.name.cmp(&b.waveform.name),
    });
    ordered
}
