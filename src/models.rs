//! Data models for the review catalog service API.
//!
//! Every response shares the `{statusCode, data}` envelope; the raw
//! structures here match that wire format, with typed counterparts for
//! everything the rest of the crate works with.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::QuakeReviewError;

/// Convert float epoch seconds to a UTC timestamp, floored to milliseconds.
#[must_use]
pub fn epoch_seconds_to_utc(seconds: f64) -> Option<DateTime<Utc>> {
    let millis = (seconds * 1000.0).floor();
    if !millis.is_finite() {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    let millis = millis as i64;
    Utc.timestamp_millis_opt(millis).single()
}

/// Response to an `eventsHash` request.
#[derive(Debug, Clone, Deserialize)]
pub struct HashResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,

    pub data: HashData,
}

/// Payload of an `eventsHash` response.
#[derive(Debug, Clone, Deserialize)]
pub struct HashData {
    /// Hash of the backend's current catalog
    pub hash: u64,
}

/// Response to a `catalog` request.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,

    pub data: CatalogData,
}

/// Payload of a `catalog` response.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogData {
    /// Raw catalog events
    pub events: Vec<RawEvent>,

    /// Hash of this catalog snapshot
    pub hash: u64,
}

/// A catalog event as it appears on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEvent {
    /// Unique event identifier (stringified integer)
    #[serde(rename = "eventIdentifier")]
    pub event_identifier: String,

    /// Preferred origin; absent on malformed events
    #[serde(rename = "preferredOrigin")]
    pub preferred_origin: Option<RawOrigin>,

    /// Whether an analyst has reviewed this event
    #[serde(default)]
    pub reviewed: bool,

    /// Identifiers of corresponding AQMS catalog events
    #[serde(rename = "aqmsEventIdentifiers", default)]
    pub aqms_event_identifiers: Vec<i64>,
}

/// An origin as it appears on the wire. Times are float epoch seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct RawOrigin {
    pub time: f64,
    pub latitude: f64,
    pub longitude: f64,
    /// Depth in meters (positive down)
    pub depth: f64,
    #[serde(default)]
    pub arrivals: Vec<RawArrival>,
}

/// A phase arrival as it appears on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct RawArrival {
    pub network: String,
    pub station: String,
    /// Vertical channel code
    pub channel1: String,
    /// North channel code, present only for three-component picks
    pub channel2: Option<String>,
    /// East channel code, present only for three-component picks
    pub channel3: Option<String>,
    #[serde(rename = "locationCode")]
    pub location_code: Option<String>,
    pub phase: String,
    /// Arrival time in float epoch seconds
    pub time: f64,
    pub residual: Option<f64>,
}

/// A seismic event with a resolved origin.
#[derive(Debug, Clone)]
pub struct Event {
    pub identifier: String,
    pub origin: Origin,
    pub reviewed: bool,
    pub aqms_event_identifiers: Vec<String>,
}

/// An event origin with typed times.
#[derive(Debug, Clone)]
pub struct Origin {
    pub time: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    /// Depth in meters (positive down)
    pub depth: f64,
    pub arrivals: Vec<Arrival>,
}

/// A phase pick associating a station/channel with a detected phase.
#[derive(Debug, Clone)]
pub struct Arrival {
    pub network: String,
    pub station: String,
    pub channel1: String,
    pub channel2: Option<String>,
    pub channel3: Option<String>,
    pub location_code: String,
    pub phase: String,
    pub time: DateTime<Utc>,
    pub residual: Option<f64>,
}

impl TryFrom<RawEvent> for Event {
    type Error = QuakeReviewError;

    fn try_from(raw: RawEvent) -> Result<Self, Self::Error> {
        let Some(raw_origin) = raw.preferred_origin else {
            return Err(QuakeReviewError::InvalidResponse(format!(
                "event {} does not have a preferred origin",
                raw.event_identifier
            )));
        };

        let origin_time = epoch_seconds_to_utc(raw_origin.time).ok_or_else(|| {
            QuakeReviewError::InvalidResponse(format!(
                "event {} has an unrepresentable origin time",
                raw.event_identifier
            ))
        })?;

        let mut arrivals = Vec::with_capacity(raw_origin.arrivals.len());
        for raw_arrival in raw_origin.arrivals {
            let Some(time) = epoch_seconds_to_utc(raw_arrival.time) else {
                warn!(
                    "dropping arrival {}.{} with unrepresentable time",
                    raw_arrival.network, raw_arrival.station
                );
                continue;
            };
            arrivals.push(Arrival {
                network: raw_arrival.network,
                station: raw_arrival.station,
                channel1: raw_arrival.channel1,
                channel2: raw_arrival.channel2,
                channel3: raw_arrival.channel3,
                location_code: raw_arrival.location_code.unwrap_or_default(),
                phase: raw_arrival.phase,
                time,
                residual: raw_arrival.residual,
            });
        }

        Ok(Self {
            identifier: raw.event_identifier,
            origin: Origin {
                time: origin_time,
                latitude: raw_origin.latitude,
                longitude: raw_origin.longitude,
                depth: raw_origin.depth,
                arrivals,
            },
            reviewed: raw.reviewed,
            aqms_event_identifiers: raw
                .aqms_event_identifiers
                .iter()
                .map(ToString::to_string)
                .collect(),
        })
    }
}

/// Convert raw catalog events, skipping malformed entries with a warning.
///
/// An event without a preferred origin carries nothing reviewable; the
/// rest of the catalog still loads.
#[must_use]
pub fn events_from_raw(raw_events: Vec<RawEvent>) -> Vec<Event> {
    let mut events = Vec::with_capacity(raw_events.len());
    for raw in raw_events {
        match Event::try_from(raw) {
            Ok(event) => events.push(event),
            Err(e) => warn!("skipping malformed catalog event: {e}"),
        }
    }
    events
}

/// Response to a `stations` request.
#[derive(Debug, Clone, Deserialize)]
pub struct StationsResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,

    pub data: Vec<Station>,
}

/// A station record with its geographic coordinates.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Station {
    pub network: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Response to a login request.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,

    pub data: LoginData,
}

/// Payload of a login response.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginData {
    #[serde(rename = "jsonWebToken")]
    pub json_web_token: String,
}

/// Response to a review action request.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,

    #[serde(default)]
    pub message: Option<String>,
}

/// Simplified event for output.
///
/// This is the normalized structure we emit in JSON/NDJSON output.
#[derive(Debug, Clone, Serialize)]
pub struct OutputEvent {
    pub identifier: String,
    pub time: String,
    pub latitude: f64,
    pub longitude: f64,
    pub depth_km: f64,
    pub arrivals: usize,
    pub reviewed: bool,
    pub aqms_event_identifiers: Vec<String>,
}

impl From<&Event> for OutputEvent {
    fn from(event: &Event) -> Self {
        Self {
            identifier: event.identifier.clone(),
            time: event.origin.time.to_rfc3339(),
            latitude: event.origin.latitude,
            longitude: event.origin.longitude,
            depth_km: event.origin.depth * 1e-3,
            arrivals: event.origin.arrivals.len(),
            reviewed: event.reviewed,
            aqms_event_identifiers: event.aqms_event_identifiers.clone(),
        }
    }
}
