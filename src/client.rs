//! Review catalog service client.
//!
//! Provides blocking HTTP access to the review backend. Every resource
//! lives behind a single endpoint URL; requests are authenticated PUTs
//! whose JSON body names the resource. Uses reqwest with rustls for TLS.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument};

use crate::errors::QuakeReviewError;
use crate::models::{
    ActionResponse, CatalogResponse, HashResponse, LoginResponse, StationsResponse,
};
use crate::waveform::WaveformResponse;

/// Default request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// User agent string for API requests.
const USER_AGENT: &str = concat!("quakereview/", env!("CARGO_PKG_VERSION"));

/// Review actions an analyst can submit against an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    /// Accept the event into the AWS-hosted catalog
    AcceptToAws,
    /// Accept the event into the AQMS catalog
    AcceptToAqms,
    /// Reject the event
    Reject,
}

impl ReviewAction {
    /// Get the resource name for this action.
    #[must_use]
    pub const fn as_resource(self) -> &'static str {
        match self {
            Self::AcceptToAws => "actions/acceptToAWS",
            Self::AcceptToAqms => "actions/acceptToAQMS",
            Self::Reject => "actions/rejectEvent",
        }
    }
}

impl std::str::FromStr for ReviewAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "accept-aws" => Ok(Self::AcceptToAws),
            "accept-aqms" => Ok(Self::AcceptToAqms),
            "reject" => Ok(Self::Reject),
            _ => Err(format!(
                "unknown action: {s} (expected: accept-aws, accept-aqms, reject)"
            )),
        }
    }
}

/// Credentials attached to outgoing requests.
enum Auth {
    Basic { user: String, password: String },
    Bearer { token: String },
}

/// Client for the review catalog service.
pub struct ReviewClient {
    client: Client,
    endpoint: String,
    auth: Auth,
}

impl ReviewClient {
    /// Create a new client with basic credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(
        endpoint: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, QuakeReviewError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            auth: Auth::Basic {
                user: user.into(),
                password: password.into(),
            },
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Auth::Basic { user, password } => request.basic_auth(user, Some(password)),
            Auth::Bearer { token } => request.bearer_auth(token),
        }
    }

    /// Send an authenticated PUT and parse the JSON response.
    fn put_json<T: DeserializeOwned>(
        &self,
        body: Option<&serde_json::Value>,
    ) -> Result<T, QuakeReviewError> {
        let mut request = self.authorize(self.client.put(&self.endpoint));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send()?;

        // Check status before parsing
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(QuakeReviewError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text()?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Exchange basic credentials for a bearer token.
    ///
    /// Subsequent requests carry the returned JSON web token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the credentials are refused.
    #[instrument(skip(self))]
    pub fn login(&mut self) -> Result<(), QuakeReviewError> {
        debug!("logging into {}", self.endpoint);
        let response: LoginResponse = self.put_json(None)?;
        ensure_ok(response.status_code, "login")?;
        self.auth = Auth::Bearer {
            token: response.data.json_web_token,
        };
        Ok(())
    }

    /// Fetch the hash of the backend's current catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or response cannot be parsed.
    #[instrument(skip(self))]
    pub fn fetch_events_hash(&self) -> Result<u64, QuakeReviewError> {
        let response: HashResponse = self.put_json(Some(&json!({"resource": "eventsHash"})))?;
        ensure_ok(response.status_code, "eventsHash")?;
        Ok(response.data.hash)
    }

    /// Fetch the full event catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or response cannot be parsed.
    #[instrument(skip(self))]
    pub fn fetch_catalog(&self) -> Result<CatalogResponse, QuakeReviewError> {
        let response: CatalogResponse = self.put_json(Some(&json!({"resource": "catalog"})))?;
        ensure_ok(response.status_code, "catalog")?;
        debug!("fetched {} events", response.data.events.len());
        Ok(response)
    }

    /// Fetch the waveforms recorded for an event.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or response cannot be parsed.
    #[instrument(skip(self))]
    pub fn fetch_waveforms(&self, identifier: i64) -> Result<WaveformResponse, QuakeReviewError> {
        let response: WaveformResponse = self.put_json(Some(&json!({
            "resource": "waveforms",
            "identifier": identifier,
        })))?;
        debug!("fetched {} waveforms", response.data.len());
        Ok(response)
    }

    /// Fetch the station list.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or response cannot be parsed.
    #[instrument(skip(self))]
    pub fn fetch_stations(&self) -> Result<StationsResponse, QuakeReviewError> {
        let response: StationsResponse = self.put_json(Some(&json!({"resource": "stations"})))?;
        ensure_ok(response.status_code, "stations")?;
        debug!("fetched {} stations", response.data.len());
        Ok(response)
    }

    /// Submit a review action against an event.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier is empty, the request fails,
    /// or the service refuses the action.
    #[instrument(skip(self), fields(resource = action.as_resource()))]
    pub fn submit_action(
        &self,
        action: ReviewAction,
        identifier: &str,
    ) -> Result<ActionResponse, QuakeReviewError> {
        if identifier.is_empty() {
            return Err(QuakeReviewError::Validation(
                "event identifier is empty".into(),
            ));
        }

        debug!("submitting {} for {}", action.as_resource(), identifier);
        let response: ActionResponse = self.put_json(Some(&json!({
            "resource": action.as_resource(),
            "identifier": identifier,
        })))?;
        ensure_ok(response.status_code, action.as_resource())?;
        Ok(response)
    }
}

/// Check a response's embedded status code.
fn ensure_ok(status_code: u16, resource: &str) -> Result<(), QuakeReviewError> {
    if status_code == 200 {
        Ok(())
    } else {
        Err(QuakeReviewError::Api {
            status: status_code,
            message: format!("{resource} request refused"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_resource_names() {
        assert_eq!(ReviewAction::AcceptToAws.as_resource(), "actions/acceptToAWS");
        assert_eq!(
            ReviewAction::AcceptToAqms.as_resource(),
            "actions/acceptToAQMS"
        );
        assert_eq!(ReviewAction::Reject.as_resource(), "actions/rejectEvent");
    }

    #[test]
    fn test_action_parse() {
        let parsed: ReviewAction = "accept-aws".parse().expect("failed to parse");
        assert_eq!(parsed, ReviewAction::AcceptToAws);
        assert!("publish".parse::<ReviewAction>().is_err());
    }

    #[test]
    fn test_submit_action_rejects_empty_identifier() {
        let client =
            ReviewClient::new("http://localhost:0", "user", "pass").expect("client build");
        let result = client.submit_action(ReviewAction::Reject, "");
        assert!(matches!(result, Err(QuakeReviewError::Validation(_))));
    }

    #[test]
    fn test_ensure_ok() {
        assert!(ensure_ok(200, "catalog").is_ok());
        assert!(matches!(
            ensure_ok(503, "catalog"),
            Err(QuakeReviewError::Api { status: 503, .. })
        ));
    }
}
