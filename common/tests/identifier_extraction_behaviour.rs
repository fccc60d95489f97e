//! Behaviour coverage for localisation identifier extraction across the two
//! carrier documents the relay searches.

use parcel_relay_common::extract_localised_ids_from;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::{Value, json};

#[derive(Default)]
struct ExtractionWorld {
    progress_meter: Option<Value>,
    event_history: Option<Value>,
    ids: Option<Vec<String>>,
}

#[fixture]
fn world() -> ExtractionWorld {
    ExtractionWorld::default()
}

fn split_ids(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
        .collect()
}

fn event(status: Value) -> Value {
    json!({
        "eventCode": "OFD",
        "eventTime": "2024-01-01T10:00:00Z",
        "statusSummary": { "localisedStringId": status },
        "location": null,
    })
}

#[given("a progress meter labelled \"{id}\"")]
fn given_progress_meter(world: &mut ExtractionWorld, id: String) {
    world.progress_meter = Some(json!({
        "milestones": [{ "label": { "localisedStringId": id } }],
    }));
}

#[given("a progress meter without identifiers")]
fn given_empty_progress_meter(world: &mut ExtractionWorld) {
    world.progress_meter = Some(json!({ "milestones": [] }));
}

#[given("an event history with identifiers \"{ids}\"")]
fn given_event_history(world: &mut ExtractionWorld, ids: String) {
    let events: Vec<Value> = split_ids(&ids).into_iter().map(|id| event(json!(id))).collect();
    world.event_history = Some(json!({ "eventHistory": events }));
}

#[given("an event history without identifiers")]
fn given_empty_event_history(world: &mut ExtractionWorld) {
    world.event_history = Some(json!({ "eventHistory": [{ "eventCode": "OFD" }] }));
}

#[given("an event history whose identifier is a number")]
fn given_malformed_event_history(world: &mut ExtractionWorld) {
    world.event_history = Some(json!({ "eventHistory": [event(json!(17))] }));
}

#[when("identifiers are extracted from both documents")]
fn when_extracted(world: &mut ExtractionWorld) {
    let meter = world.progress_meter.as_ref().expect("progress meter set");
    let history = world.event_history.as_ref().expect("event history set");
    world.ids = Some(extract_localised_ids_from([meter, history]));
}

#[then("the identifiers are \"{expected}\"")]
fn then_identifiers_are(world: &mut ExtractionWorld, expected: String) {
    let mut ids = world.ids.clone().expect("extraction ran");
    ids.sort();
    let mut expected_ids = split_ids(&expected);
    expected_ids.sort();
    assert_eq!(ids, expected_ids);
}

#[then("no identifiers are found")]
fn then_no_identifiers(world: &mut ExtractionWorld) {
    let ids = world.ids.as_ref().expect("extraction ran");
    assert!(ids.is_empty(), "unexpected identifiers: {ids:?}");
}

#[scenario(
    path = "tests/features/identifier_extraction.feature",
    name = "Identifiers are collected from progress meter and event history"
)]
fn scenario_collects_from_both_documents(world: ExtractionWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/identifier_extraction.feature",
    name = "Repeated identifiers are all kept"
)]
fn scenario_keeps_duplicates(world: ExtractionWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/identifier_extraction.feature",
    name = "Documents without identifiers yield nothing"
)]
fn scenario_empty_documents(world: ExtractionWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/identifier_extraction.feature",
    name = "Malformed identifiers are skipped"
)]
fn scenario_malformed_identifiers(world: ExtractionWorld) {
    let _ = world;
}
