//! Decoding of the carrier's tracking response.
//!
//! The response is a JSON object whose `progressTracker` and
//! `eventHistory` fields are themselves JSON documents encoded as strings.
//! [`TrackingRecord::from_body`] performs both decode passes up front so
//! later stages only deal with plain trees.

use serde_json::Value;

const RESPONSE_DOCUMENT: &str = "tracking response";
const PROGRESS_TRACKER: &str = "progressTracker";
const EVENT_HISTORY: &str = "eventHistory";
const PROGRESS_METER: &str = "progressMeter";

static ABSENT: Value = Value::Null;

/// Errors arising while decoding a tracking response.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// A document is not valid JSON.
    #[error("{document} is not valid JSON: {source}")]
    Json {
        /// The document being decoded.
        document: &'static str,
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },

    /// A document decoded to something other than an object.
    #[error("{document} is not a JSON object")]
    NotAnObject {
        /// The document being decoded.
        document: &'static str,
    },

    /// A nested document is present but not carried as a JSON string.
    #[error("{field} is not a JSON-encoded string")]
    NotEncoded {
        /// The field holding the nested document.
        field: &'static str,
    },

    /// A field required for decoding is absent.
    #[error("{field} is missing from the tracking response")]
    MissingField {
        /// Dotted path of the absent field.
        field: &'static str,
    },
}

/// A tracking response with its nested documents decoded.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackingRecord {
    envelope: Value,
    progress_tracker: Value,
    event_history: Value,
}

impl TrackingRecord {
    /// Decodes a raw tracking response body.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] when the body or either nested document is
    /// not a JSON object, when a nested document is not string-encoded, or
    /// when `progressTracker.progressMeter` is absent.
    ///
    /// # Examples
    ///
    /// ```
    /// use parcel_relay::upstream::TrackingRecord;
    ///
    /// let body = r#"{
    ///     "shipperDetails": { "shipperName": "Libreria" },
    ///     "progressTracker": "{\"progressMeter\":{}}",
    ///     "eventHistory": "{\"eventHistory\":[]}"
    /// }"#;
    ///
    /// let record = TrackingRecord::from_body(body).expect("decodes");
    /// assert!(record.event_history().get("eventHistory").is_some());
    /// ```
    pub fn from_body(body: &str) -> Result<Self, DecodeError> {
        let envelope = decode_object(body, RESPONSE_DOCUMENT)?;
        let progress_tracker = decode_nested(&envelope, PROGRESS_TRACKER)?;
        if progress_tracker.get(PROGRESS_METER).is_none() {
            return Err(DecodeError::MissingField {
                field: "progressTracker.progressMeter",
            });
        }
        let event_history = decode_nested(&envelope, EVENT_HISTORY)?;
        Ok(Self {
            envelope,
            progress_tracker,
            event_history,
        })
    }

    /// Builds a record from already decoded trees.
    #[must_use]
    pub const fn from_parts(envelope: Value, progress_tracker: Value, event_history: Value) -> Self {
        Self {
            envelope,
            progress_tracker,
            event_history,
        }
    }

    /// The outer response object.
    #[must_use]
    pub const fn envelope(&self) -> &Value {
        &self.envelope
    }

    /// The decoded `progressTracker` document.
    #[must_use]
    pub const fn progress_tracker(&self) -> &Value {
        &self.progress_tracker
    }

    /// The decoded `eventHistory` document.
    #[must_use]
    pub const fn event_history(&self) -> &Value {
        &self.event_history
    }

    /// The trees searched for localisation identifiers, in search order:
    /// the progress meter, then the whole event history document.
    #[must_use]
    pub fn localisation_roots(&self) -> [&Value; 2] {
        let meter = self
            .progress_tracker
            .get(PROGRESS_METER)
            .unwrap_or(&ABSENT);
        [meter, &self.event_history]
    }
}

fn decode_object(text: &str, document: &'static str) -> Result<Value, DecodeError> {
    let value: Value =
        serde_json::from_str(text).map_err(|source| DecodeError::Json { document, source })?;
    if value.is_object() {
        Ok(value)
    } else {
        Err(DecodeError::NotAnObject { document })
    }
}

fn decode_nested(envelope: &Value, field: &'static str) -> Result<Value, DecodeError> {
    match envelope.get(field) {
        None | Some(Value::Null) => Err(DecodeError::MissingField { field }),
        Some(Value::String(encoded)) => decode_object(encoded, field),
        Some(_) => Err(DecodeError::NotEncoded { field }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn body(progress: &str, events: &str) -> String {
        json!({
            "shipperDetails": { "shipperName": "Libreria" },
            "progressTracker": progress,
            "eventHistory": events,
        })
        .to_string()
    }

    #[rstest]
    fn decodes_both_nested_documents() {
        let raw = body(
            r#"{"progressMeter":{"localisedStringId":"swa_rex_ofd"},"expectedDeliveryDate":"2024-01-02"}"#,
            r#"{"eventHistory":[{"eventCode":"OFD"}]}"#,
        );

        let record = TrackingRecord::from_body(&raw).expect("decodes");

        assert_eq!(
            record.progress_tracker().get("expectedDeliveryDate"),
            Some(&json!("2024-01-02"))
        );
        assert_eq!(
            record.event_history().pointer("/eventHistory/0/eventCode"),
            Some(&json!("OFD"))
        );
        assert_eq!(
            record.envelope().pointer("/shipperDetails/shipperName"),
            Some(&json!("Libreria"))
        );
    }

    #[rstest]
    fn localisation_roots_are_meter_then_history() {
        let raw = body(r#"{"progressMeter":{"a":1}}"#, r#"{"eventHistory":[]}"#);
        let record = TrackingRecord::from_body(&raw).expect("decodes");

        let [meter, history] = record.localisation_roots();

        assert_eq!(meter, &json!({ "a": 1 }));
        assert_eq!(history, &json!({ "eventHistory": [] }));
    }

    #[rstest]
    #[case::not_json("<html>")]
    #[case::truncated("{\"shipperDetails\":")]
    fn rejects_undecodable_body(#[case] raw: &str) {
        let err = TrackingRecord::from_body(raw).expect_err("must fail");

        assert!(matches!(
            err,
            DecodeError::Json {
                document: "tracking response",
                ..
            }
        ));
    }

    #[rstest]
    fn rejects_non_object_body() {
        let err = TrackingRecord::from_body("[1,2]").expect_err("must fail");

        assert!(matches!(err, DecodeError::NotAnObject { .. }));
    }

    #[rstest]
    fn rejects_inline_nested_document() {
        let raw = json!({
            "progressTracker": { "progressMeter": {} },
            "eventHistory": "{}",
        })
        .to_string();

        let err = TrackingRecord::from_body(&raw).expect_err("must fail");

        assert!(matches!(
            err,
            DecodeError::NotEncoded {
                field: "progressTracker"
            }
        ));
    }

    #[rstest]
    fn rejects_undecodable_nested_document() {
        let raw = body(r#"{"progressMeter":{}}"#, "not json");

        let err = TrackingRecord::from_body(&raw).expect_err("must fail");

        assert!(matches!(
            err,
            DecodeError::Json {
                document: "eventHistory",
                ..
            }
        ));
    }

    #[rstest]
    #[case::absent(json!({ "eventHistory": "{}" }), "progressTracker")]
    #[case::null(json!({ "progressTracker": null, "eventHistory": "{}" }), "progressTracker")]
    #[case::no_meter(json!({ "progressTracker": "{}", "eventHistory": "{}" }), "progressTracker.progressMeter")]
    #[case::no_history(json!({ "progressTracker": "{\"progressMeter\":{}}" }), "eventHistory")]
    fn reports_missing_fields(#[case] raw: Value, #[case] expected: &str) {
        let err = TrackingRecord::from_body(&raw.to_string()).expect_err("must fail");

        assert!(matches!(err, DecodeError::MissingField { field } if field == expected));
    }
}
