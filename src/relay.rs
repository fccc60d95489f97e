//! Per-request pipeline: fetch, decode, extract, resolve, assemble, render.
//!
//! [`Relay`] owns the read-only configuration and the two upstream
//! sources. It is shared between request threads behind an `Arc`, and
//! every call to [`Relay::handle`] produces exactly one [`Rendered`]
//! response, whatever fails along the way.

use crate::assembler::{AssembledResult, assemble};
use crate::config::RelayConfig;
use crate::error::{RelayError, Result};
use crate::localization::resolve;
use crate::render::{OutputMode, Rendered, render_failure, render_success};
use crate::upstream::{HttpCarrier, LocalizationSource, TrackingRecord, TrackingSource};
use log::{debug, warn};
use parcel_relay_common::extract_localised_ids_from;
use std::sync::Arc;

/// Parsed query of an inbound request.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RelayRequest {
    /// Carrier tracking number; `None` when absent or empty.
    pub tracking: Option<String>,
    /// Requested output format.
    pub mode: OutputMode,
}

impl RelayRequest {
    /// Parses a URL query string such as `tracking=TBA1&json=1`.
    ///
    /// Values are percent-decoded. When a parameter repeats, the first
    /// occurrence wins.
    ///
    /// # Examples
    ///
    /// ```
    /// use parcel_relay::relay::RelayRequest;
    /// use parcel_relay::render::OutputMode;
    ///
    /// let request = RelayRequest::from_query("tracking=TBA%20123&json=1");
    /// assert_eq!(request.tracking.as_deref(), Some("TBA 123"));
    /// assert_eq!(request.mode, OutputMode::Json);
    ///
    /// let empty = RelayRequest::from_query("tracking=");
    /// assert_eq!(empty.tracking, None);
    /// assert_eq!(empty.mode, OutputMode::Html);
    /// ```
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let mut tracking = None;
        let mut json_flag = None;
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "tracking" if tracking.is_none() => tracking = Some(value.into_owned()),
                "json" if json_flag.is_none() => json_flag = Some(value.into_owned()),
                _ => {}
            }
        }
        Self {
            tracking: tracking.filter(|number| !number.is_empty()),
            mode: OutputMode::from_flag(json_flag.as_deref()),
        }
    }
}

/// The tracking relay shared by all request handlers.
pub struct Relay {
    config: Arc<RelayConfig>,
    tracking: Arc<dyn TrackingSource>,
    localization: Arc<dyn LocalizationSource>,
}

impl Relay {
    /// Builds a relay talking to the configured carrier over HTTP.
    #[must_use]
    pub fn new(config: Arc<RelayConfig>) -> Self {
        let carrier = Arc::new(HttpCarrier::new(config.upstream.clone()));
        Self::with_sources(config, carrier.clone(), carrier)
    }

    /// Builds a relay over injected upstream sources.
    #[must_use]
    pub fn with_sources(
        config: Arc<RelayConfig>,
        tracking: Arc<dyn TrackingSource>,
        localization: Arc<dyn LocalizationSource>,
    ) -> Self {
        Self {
            config,
            tracking,
            localization,
        }
    }

    /// Runs the pipeline for `tracking_number`.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Upstream`] when the tracking fetch fails,
    /// [`RelayError::Decode`] when the payload does not decode, and
    /// [`RelayError::Assemble`] when a required field is missing.
    /// Localisation failures are absorbed by the fallback dictionary.
    pub fn lookup(&self, tracking_number: &str) -> Result<AssembledResult> {
        let body = self.tracking.fetch_tracking(tracking_number)?;
        let record = TrackingRecord::from_body(&body)?;

        let ids = extract_localised_ids_from(record.localisation_roots());
        debug!("{tracking_number}: collected {} localisation ids", ids.len());

        let localizations = resolve(
            self.localization.as_ref(),
            &ids,
            tracking_number,
            &self.config.fallback,
        );
        debug!(
            "{tracking_number}: using {:?} localisations ({} entries)",
            localizations.origin(),
            localizations.len()
        );

        Ok(assemble(&record, &localizations)?)
    }

    /// Handles one parsed request and renders its single response.
    #[must_use]
    pub fn handle(&self, request: &RelayRequest) -> Rendered {
        let outcome = request
            .tracking
            .as_deref()
            .ok_or(RelayError::MissingTracking)
            .and_then(|number| self.lookup(number));

        match outcome {
            Ok(result) => render_success(&result, request.mode),
            Err(error) => {
                warn!("request failed ({}): {error}", error.kind().as_str());
                render_failure(&error, request.mode)
            }
        }
    }
}
