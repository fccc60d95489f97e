//! Outbound HTTP calls to the carrier.
//!
//! Provides trait-based abstractions for the tracking lookup and the
//! batched localisation lookup, with a `ureq` implementation that shares a
//! single agent configured with a global timeout.

use crate::config::UpstreamConfig;
use log::debug;
use serde::Serialize;
use ureq::Agent;
use ureq::http::Response;

/// Source of raw tracking payloads.
#[cfg_attr(test, mockall::automock)]
pub trait TrackingSource: Send + Sync {
    /// Fetch the raw tracking response body for `tracking_number`.
    ///
    /// # Errors
    ///
    /// Returns an error if the carrier cannot be reached or answers with
    /// an error status.
    fn fetch_tracking(&self, tracking_number: &str) -> Result<String, FetchError>;
}

/// Source of localisation strings.
#[cfg_attr(test, mockall::automock)]
pub trait LocalizationSource: Send + Sync {
    /// Send `ids` as one batch and return the raw response body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent or the endpoint
    /// answers with an error status.
    fn lookup_localizations(
        &self,
        ids: &[String],
        tracking_number: &str,
    ) -> Result<String, FetchError>;
}

/// Errors arising from outbound carrier calls.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request could not be completed.
    #[error("request to {url} failed: {reason}")]
    Http {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The carrier answered with a non-success status.
    #[error("{url} answered with HTTP {status}")]
    Status {
        /// The URL that was requested.
        url: String,
        /// The status code received.
        status: u16,
    },

    /// The request URL or body could not be built.
    #[error("cannot encode request for {url}: {reason}")]
    Encode {
        /// The URL, or URL base, the request was meant for.
        url: String,
        /// Encoder message.
        reason: String,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LocalizationRequest<'a> {
    localization_keys: &'a [String],
}

/// Encodes the batched localisation lookup body.
///
/// # Errors
///
/// Returns the serialiser error, which cannot occur for string slices in
/// practice.
///
/// # Examples
///
/// ```
/// use parcel_relay::upstream::client::localization_request_body;
///
/// let body = localization_request_body(&["swa_rex_ofd".to_owned()]).expect("encodes");
/// assert_eq!(body, r#"{"localizationKeys":["swa_rex_ofd"]}"#);
/// ```
pub fn localization_request_body(ids: &[String]) -> Result<String, serde_json::Error> {
    serde_json::to_string(&LocalizationRequest {
        localization_keys: ids,
    })
}

/// `ureq`-backed carrier client.
pub struct HttpCarrier {
    agent: Agent,
    upstream: UpstreamConfig,
}

impl HttpCarrier {
    /// Builds a client whose calls time out after
    /// [`UpstreamConfig::timeout`].
    #[must_use]
    pub fn new(upstream: UpstreamConfig) -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(upstream.timeout()))
            .build();
        Self {
            agent: Agent::new_with_config(config),
            upstream,
        }
    }
}

impl TrackingSource for HttpCarrier {
    fn fetch_tracking(&self, tracking_number: &str) -> Result<String, FetchError> {
        let url = self
            .upstream
            .tracking_url_for(tracking_number)
            .map_err(|e| FetchError::Encode {
                url: self.upstream.tracking_url.clone(),
                reason: e.to_string(),
            })?
            .to_string();
        debug!("fetching tracking data from {url}");
        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|e| map_ureq_error(&url, &e))?;
        read_body(&url, response)
    }
}

impl LocalizationSource for HttpCarrier {
    fn lookup_localizations(
        &self,
        ids: &[String],
        tracking_number: &str,
    ) -> Result<String, FetchError> {
        let url = self.upstream.localization_url.as_str();
        let payload = localization_request_body(ids).map_err(|e| FetchError::Encode {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;
        debug!("requesting {} localisation ids from {url}", ids.len());

        let mut request = self.agent.post(url);
        for (name, value) in &self.upstream.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        let response = request
            .header("Referer", self.upstream.referer_for(tracking_number))
            .send(payload.as_str())
            .map_err(|e| map_ureq_error(url, &e))?;
        read_body(url, response)
    }
}

fn read_body(url: &str, response: Response<ureq::Body>) -> Result<String, FetchError> {
    response
        .into_body()
        .read_to_string()
        .map_err(|e| map_ureq_error(url, &e))
}

/// Map a ureq error to a [`FetchError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> FetchError {
    match err {
        ureq::Error::StatusCode(status) => FetchError::Status {
            url: url.to_owned(),
            status: *status,
        },
        other => FetchError::Http {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}
