//! Shared test utilities: carrier payload builders and stub upstreams.

use crate::upstream::{FetchError, LocalizationSource, TrackingSource};
use serde_json::{Value, json};
use std::sync::{Mutex, PoisonError};

/// Builds a tracking event that carries a `statusSummary` identifier.
#[must_use]
pub fn event(id: &str, code: &str, time: &str, location: Value) -> Value {
    json!({
        "statusSummary": { "localisedStringId": id },
        "eventCode": code,
        "eventTime": time,
        "location": location,
    })
}

/// Builds a carrier location object.
#[must_use]
pub fn location(city: &str, state: &str, country: &str, postal_code: &str) -> Value {
    json!({
        "city": city,
        "stateProvince": state,
        "countryCode": country,
        "postalCode": postal_code,
    })
}

/// Builds a complete tracking response body around `events`.
///
/// The progress meter carries the `swa_rex_ofd` identifier and the shipment
/// summary is in the `OUT_FOR_DELIVERY` state.
#[must_use]
pub fn tracking_body(events: &[Value]) -> String {
    let progress = json!({
        "progressMeter": {
            "milestones": [{ "label": { "localisedStringId": "swa_rex_ofd" } }],
        },
        "expectedDeliveryDate": "2024-01-02T20:00:00Z",
        "summary": {
            "status": "OUT_FOR_DELIVERY",
            "metadata": { "trackingStatus": { "stringValue": "In consegna" } },
        },
    });
    json!({
        "shipperDetails": { "shipperName": "Libreria Ulisse" },
        "progressTracker": progress.to_string(),
        "eventHistory": json!({ "eventHistory": events }).to_string(),
    })
    .to_string()
}

/// A failure returned by the stubs.
#[must_use]
pub fn unreachable(url: &str) -> FetchError {
    FetchError::Http {
        url: url.to_owned(),
        reason: "connection refused".to_owned(),
    }
}

/// Tracking source answering every request with the same outcome.
#[derive(Debug)]
pub struct StubTracking {
    outcome: Result<String, String>,
    requested: Mutex<Vec<String>>,
}

impl StubTracking {
    /// Answers with `body`.
    #[must_use]
    pub fn answering(body: impl Into<String>) -> Self {
        Self {
            outcome: Ok(body.into()),
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Fails every request at the transport level.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            outcome: Err("https://carrier.test/api/tracker/".to_owned()),
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Tracking numbers requested so far.
    #[must_use]
    pub fn requested(&self) -> Vec<String> {
        self.requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl TrackingSource for StubTracking {
    fn fetch_tracking(&self, tracking_number: &str) -> Result<String, FetchError> {
        self.requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tracking_number.to_owned());
        self.outcome.clone().map_err(|url| unreachable(&url))
    }
}

/// Localization source answering every lookup with the same outcome and
/// recording the identifier batches it receives.
#[derive(Debug)]
pub struct StubLocalization {
    outcome: Result<String, String>,
    batches: Mutex<Vec<Vec<String>>>,
}

impl StubLocalization {
    /// Answers with `body`.
    #[must_use]
    pub fn answering(body: impl Into<String>) -> Self {
        Self {
            outcome: Ok(body.into()),
            batches: Mutex::new(Vec::new()),
        }
    }

    /// Fails every lookup at the transport level.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            outcome: Err("https://carrier.test/getLocalizedStrings".to_owned()),
            batches: Mutex::new(Vec::new()),
        }
    }

    /// Identifier batches received so far.
    #[must_use]
    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl LocalizationSource for StubLocalization {
    fn lookup_localizations(
        &self,
        ids: &[String],
        _tracking_number: &str,
    ) -> Result<String, FetchError> {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ids.to_vec());
        self.outcome.clone().map_err(|url| unreachable(&url))
    }
}
