//! Merges tracking data and localisation text into the labelled result.
//!
//! The carrier payload has no fixed schema, so the assembler reads a
//! handful of known JSON Pointer paths. Those paths are required: when one
//! is absent or has the wrong type the request fails with
//! [`AssembleError::MissingField`] naming the document and path.

use crate::localization::Localizations;
use crate::upstream::TrackingRecord;
use parcel_relay_common::{display_pointer, str_at};
use serde::Serialize;
use serde_json::Value;

/// Label of the shipper field.
pub const SHIPPER_LABEL: &str = "Ordine effettuato presso";
/// Label of the expected delivery date field.
pub const EXPECTED_DELIVERY_LABEL: &str = "Data di consegna prevista";
/// Label of the status field.
pub const STATUS_LABEL: &str = "Stato";
/// Label of the history field.
pub const HISTORY_LABEL: &str = "Storico";

/// Key of an event's status text.
pub const EVENT_STATUS_KEY: &str = "Stato spedizione";
/// Key of an event's timestamp.
pub const EVENT_TIME_KEY: &str = "Data";
/// Key of an event's location.
pub const EVENT_LOCATION_KEY: &str = "Luogo";

const ENVELOPE: &str = "tracking response";
const PROGRESS_TRACKER: &str = "progressTracker";
const EVENT_HISTORY: &str = "eventHistory";

/// Errors arising while assembling the result.
#[derive(Debug, thiserror::Error)]
pub enum AssembleError {
    /// A required field is absent or not of the expected type.
    #[error("{document} has no usable {path}")]
    MissingField {
        /// Document the field was expected in.
        document: &'static str,
        /// Dotted path of the field.
        path: String,
    },
}

/// A display label paired with its value.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct LabelledField<T> {
    /// Human-readable label.
    pub label: &'static str,
    /// Field value.
    pub value: T,
}

impl<T> LabelledField<T> {
    const fn new(label: &'static str, value: T) -> Self {
        Self { label, value }
    }
}

/// One entry of the shipment history.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct HistoryEntry {
    /// Localised status text, or the raw event code.
    #[serde(rename = "Stato spedizione")]
    pub status: String,
    /// Event timestamp as sent by the carrier.
    #[serde(rename = "Data")]
    pub time: String,
    /// Comma-joined address, when the carrier reports a city.
    #[serde(rename = "Luogo", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl HistoryEntry {
    /// Returns the entry as ordered key/value pairs, omitting an absent
    /// location.
    #[must_use]
    pub fn pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = vec![
            (EVENT_STATUS_KEY, self.status.as_str()),
            (EVENT_TIME_KEY, self.time.as_str()),
        ];
        if let Some(location) = &self.location {
            pairs.push((EVENT_LOCATION_KEY, location.as_str()));
        }
        pairs
    }
}

/// The flattened, labelled view of a shipment.
///
/// Field order is significant for HTML rendering and follows declaration
/// order.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssembledResult {
    /// Merchant the order was placed with.
    pub shipper: LabelledField<String>,
    /// Expected delivery date as sent by the carrier.
    pub expected_delivery_date: LabelledField<String>,
    /// Status text followed by the raw status code in parentheses.
    pub status: LabelledField<String>,
    /// Shipment events in carrier order.
    pub history: LabelledField<Vec<HistoryEntry>>,
}

/// Builds the [`AssembledResult`] for `record` using `localizations`.
///
/// # Errors
///
/// Returns [`AssembleError::MissingField`] when the shipper name, expected
/// delivery date, status parts, event list, or an event's code or time is
/// absent or not a string.
pub fn assemble(
    record: &TrackingRecord,
    localizations: &Localizations,
) -> Result<AssembledResult, AssembleError> {
    let shipper = required_str(record.envelope(), ENVELOPE, "/shipperDetails/shipperName")?;
    let tracker = record.progress_tracker();
    let expected = required_str(tracker, PROGRESS_TRACKER, "/expectedDeliveryDate")?;
    let status_text = required_str(
        tracker,
        PROGRESS_TRACKER,
        "/summary/metadata/trackingStatus/stringValue",
    )?;
    let status_code = required_str(tracker, PROGRESS_TRACKER, "/summary/status")?;

    Ok(AssembledResult {
        shipper: LabelledField::new(SHIPPER_LABEL, shipper.to_owned()),
        expected_delivery_date: LabelledField::new(EXPECTED_DELIVERY_LABEL, expected.to_owned()),
        status: LabelledField::new(STATUS_LABEL, format!("{status_text} ({status_code})")),
        history: LabelledField::new(
            HISTORY_LABEL,
            assemble_history(record.event_history(), localizations)?,
        ),
    })
}

fn assemble_history(
    history: &Value,
    localizations: &Localizations,
) -> Result<Vec<HistoryEntry>, AssembleError> {
    let events = history
        .pointer("/eventHistory")
        .and_then(Value::as_array)
        .ok_or_else(|| missing(EVENT_HISTORY, "/eventHistory"))?;

    events
        .iter()
        .enumerate()
        .map(|(index, event)| assemble_event(index, event, localizations))
        .collect()
}

fn assemble_event(
    index: usize,
    event: &Value,
    localizations: &Localizations,
) -> Result<HistoryEntry, AssembleError> {
    let event_field = |name: &str| {
        str_at(event, &format!("/{name}"))
            .ok_or_else(|| missing(EVENT_HISTORY, &format!("/eventHistory/{index}/{name}")))
    };
    let code = event_field("eventCode")?;
    let time = event_field("eventTime")?;

    let status = str_at(event, "/statusSummary/localisedStringId")
        .and_then(|id| localizations.display_for(id))
        .unwrap_or(code);

    Ok(HistoryEntry {
        status: status.to_owned(),
        time: time.to_owned(),
        location: location_of(event),
    })
}

/// Joins city, state or province, country code and postal code when the
/// event carries a city. Absent parts render as empty strings.
fn location_of(event: &Value) -> Option<String> {
    let location = event.get("location")?.as_object()?;
    let city = location.get("city")?.as_str()?;
    let part = |key: &str| location.get(key).and_then(Value::as_str).unwrap_or_default();
    Some(
        [
            city,
            part("stateProvince"),
            part("countryCode"),
            part("postalCode"),
        ]
        .join(", "),
    )
}

fn required_str<'a>(
    document: &'a Value,
    name: &'static str,
    pointer: &str,
) -> Result<&'a str, AssembleError> {
    str_at(document, pointer).ok_or_else(|| missing(name, pointer))
}

fn missing(document: &'static str, pointer: &str) -> AssembleError {
    AssembleError::MissingField {
        document,
        path: display_pointer(pointer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RelayConfig;
    use rstest::{fixture, rstest};
    use serde_json::json;
    use std::collections::HashMap;

    #[fixture]
    fn fallback() -> Localizations {
        Localizations::fallback(&RelayConfig::default().fallback)
    }

    fn record_with_events(events: Value) -> TrackingRecord {
        TrackingRecord::from_parts(
            json!({ "shipperDetails": { "shipperName": "Libreria Ulisse" } }),
            json!({
                "progressMeter": {},
                "expectedDeliveryDate": "2024-01-02",
                "summary": {
                    "status": "IN_TRANSIT",
                    "metadata": { "trackingStatus": { "stringValue": "In transito" } },
                },
            }),
            json!({ "eventHistory": events }),
        )
    }

    fn event(id: Option<&str>, code: &str, location: Value) -> Value {
        let mut event = json!({
            "eventCode": code,
            "eventTime": "2024-01-01T10:00:00Z",
            "location": location,
        });
        if let Some(id) = id {
            event["statusSummary"] = json!({ "localisedStringId": id });
        }
        event
    }

    #[rstest]
    fn assembles_labelled_fields(fallback: Localizations) {
        let record = record_with_events(json!([]));

        let result = assemble(&record, &fallback).expect("assembles");

        assert_eq!(result.shipper.label, "Ordine effettuato presso");
        assert_eq!(result.shipper.value, "Libreria Ulisse");
        assert_eq!(result.expected_delivery_date.value, "2024-01-02");
        assert_eq!(result.status.value, "In transito (IN_TRANSIT)");
        assert_eq!(result.history.label, "Storico");
        assert!(result.history.value.is_empty());
    }

    #[rstest]
    fn localised_event_without_location(fallback: Localizations) {
        let record = record_with_events(json!([event(Some("swa_rex_ofd"), "OFD", Value::Null)]));

        let result = assemble(&record, &fallback).expect("assembles");

        assert_eq!(
            serde_json::to_value(&result.history.value).expect("serialises"),
            json!([{ "Stato spedizione": "In consegna", "Data": "2024-01-01T10:00:00Z" }])
        );
    }

    #[rstest]
    #[case::unknown_id(Some("swa_rex_unknown"))]
    #[case::no_id(None)]
    fn unresolved_status_uses_event_code(fallback: Localizations, #[case] id: Option<&str>) {
        let record = record_with_events(json!([event(id, "OFD", Value::Null)]));

        let result = assemble(&record, &fallback).expect("assembles");

        assert_eq!(result.history.value[0].status, "OFD");
    }

    #[rstest]
    fn remote_map_is_not_merged_with_fallback() {
        let remote = Localizations::remote(HashMap::from([(
            "swa_rex_detail_departed".to_owned(),
            "Partito".to_owned(),
        )]));
        let record = record_with_events(json!([
            event(Some("swa_rex_detail_departed"), "DEPARTED", Value::Null),
            event(Some("swa_rex_ofd"), "OFD", Value::Null),
        ]));

        let result = assemble(&record, &remote).expect("assembles");

        let statuses: Vec<&str> = result
            .history
            .value
            .iter()
            .map(|entry| entry.status.as_str())
            .collect();
        assert_eq!(statuses, ["Partito", "OFD"]);
    }

    #[rstest]
    fn empty_localised_text_uses_event_code() {
        let blank = Localizations::remote(HashMap::from([("swa_rex_ofd".to_owned(), String::new())]));
        let record = record_with_events(json!([event(Some("swa_rex_ofd"), "OFD", Value::Null)]));

        let result = assemble(&record, &blank).expect("assembles");

        assert_eq!(result.history.value[0].status, "OFD");
    }

    #[rstest]
    #[case::full(
        json!({ "city": "Roma", "stateProvince": "RM", "countryCode": "IT", "postalCode": "00184" }),
        Some("Roma, RM, IT, 00184")
    )]
    #[case::partial(
        json!({ "city": "Roma", "stateProvince": null, "countryCode": "IT" }),
        Some("Roma, , IT, ")
    )]
    #[case::null_city(json!({ "city": null, "countryCode": "IT" }), None)]
    #[case::no_city(json!({ "countryCode": "IT" }), None)]
    #[case::null_location(Value::Null, None)]
    fn location_requires_a_city(
        fallback: Localizations,
        #[case] location: Value,
        #[case] expected: Option<&str>,
    ) {
        let record = record_with_events(json!([event(Some("swa_rex_ofd"), "OFD", location)]));

        let result = assemble(&record, &fallback).expect("assembles");

        assert_eq!(result.history.value[0].location.as_deref(), expected);
    }

    #[rstest]
    fn keeps_upstream_event_order(fallback: Localizations) {
        let record = record_with_events(json!([
            event(Some("swa_rex_delivering_no_updated_eddday"), "DELIVERED", Value::Null),
            event(Some("swa_rex_ofd"), "OFD", Value::Null),
            event(Some("swa_rex_detail_pickedUp"), "PICKED_UP", Value::Null),
        ]));

        let result = assemble(&record, &fallback).expect("assembles");

        let statuses: Vec<&str> = result
            .history
            .value
            .iter()
            .map(|entry| entry.status.as_str())
            .collect();
        assert_eq!(statuses, ["Consegnato", "In consegna", "Pacco ritirato"]);
    }

    #[rstest]
    fn missing_shipper_is_reported(fallback: Localizations) {
        let record = TrackingRecord::from_parts(
            json!({ "shipperDetails": {} }),
            record_with_events(json!([])).progress_tracker().clone(),
            json!({ "eventHistory": [] }),
        );

        let err = assemble(&record, &fallback).expect_err("must fail");

        assert_eq!(
            err.to_string(),
            "tracking response has no usable shipperDetails.shipperName"
        );
    }

    #[rstest]
    fn mistyped_status_is_reported(fallback: Localizations) {
        let record = TrackingRecord::from_parts(
            json!({ "shipperDetails": { "shipperName": "Libreria" } }),
            json!({
                "expectedDeliveryDate": "2024-01-02",
                "summary": { "status": 3, "metadata": { "trackingStatus": { "stringValue": "x" } } },
            }),
            json!({ "eventHistory": [] }),
        );

        let err = assemble(&record, &fallback).expect_err("must fail");

        assert!(matches!(
            err,
            AssembleError::MissingField { document: "progressTracker", ref path } if path == "summary.status"
        ));
    }

    #[rstest]
    fn missing_event_list_is_reported(fallback: Localizations) {
        let base = record_with_events(json!([]));
        let record = TrackingRecord::from_parts(
            base.envelope().clone(),
            base.progress_tracker().clone(),
            json!({ "events": [] }),
        );

        let err = assemble(&record, &fallback).expect_err("must fail");

        assert!(err.to_string().contains("eventHistory"));
    }

    #[rstest]
    fn missing_event_time_names_the_event(fallback: Localizations) {
        let record = record_with_events(json!([
            event(Some("swa_rex_ofd"), "OFD", Value::Null),
            { "eventCode": "OFD" },
        ]));

        let err = assemble(&record, &fallback).expect_err("must fail");

        assert!(matches!(
            err,
            AssembleError::MissingField { ref path, .. } if path == "eventHistory.1.eventTime"
        ));
    }

    #[rstest]
    fn pairs_follow_render_order() {
        let entry = HistoryEntry {
            status: "In consegna".to_owned(),
            time: "2024-01-01T10:00:00Z".to_owned(),
            location: Some("Roma, RM, IT, 00184".to_owned()),
        };

        assert_eq!(
            entry.pairs(),
            [
                ("Stato spedizione", "In consegna"),
                ("Data", "2024-01-01T10:00:00Z"),
                ("Luogo", "Roma, RM, IT, 00184"),
            ]
        );
    }
}
