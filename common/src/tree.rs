//! Localisation identifier extraction and typed lookups over JSON trees.
//!
//! Carrier payloads embed `localisedStringId` tokens at arbitrary depth,
//! inside objects and inside arrays of objects. [`extract_localised_ids`]
//! walks a tree depth-first and collects every such token. The walk is
//! total: unexpected shapes are skipped, never reported as panics.

use log::debug;
use serde_json::Value;

/// Key under which the carrier stores localisation identifiers.
pub const LOCALISED_STRING_ID: &str = "localisedStringId";

/// Collects every string stored under [`LOCALISED_STRING_ID`] in `value`.
///
/// Objects are searched entry by entry. Nested objects are searched
/// recursively, and so is every object element of a nested array.
/// Identifiers are not deduplicated. The order follows the traversal and
/// carries no meaning for callers.
///
/// # Examples
///
/// ```
/// use parcel_relay_common::extract_localised_ids;
/// use serde_json::json;
///
/// let tree = json!({
///     "summary": { "localisedStringId": "swa_rex_ofd" },
///     "events": [
///         { "statusSummary": { "localisedStringId": "swa_rex_detail_departed" } },
///         "not an object",
///     ],
/// });
///
/// let mut ids = extract_localised_ids(&tree);
/// ids.sort();
/// assert_eq!(ids, ["swa_rex_detail_departed", "swa_rex_ofd"]);
/// ```
#[must_use]
pub fn extract_localised_ids(value: &Value) -> Vec<String> {
    let mut ids = Vec::new();
    collect(value, &mut ids);
    ids
}

/// Runs [`extract_localised_ids`] over several roots and concatenates the
/// results in root order.
///
/// # Examples
///
/// ```
/// use parcel_relay_common::extract_localised_ids_from;
/// use serde_json::json;
///
/// let meter = json!({ "localisedStringId": "a" });
/// let history = json!({ "eventHistory": [{ "localisedStringId": "b" }] });
///
/// assert_eq!(extract_localised_ids_from([&meter, &history]), ["a", "b"]);
/// ```
#[must_use]
pub fn extract_localised_ids_from<'a, I>(roots: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut ids = Vec::new();
    for root in roots {
        collect(root, &mut ids);
    }
    ids
}

fn collect(value: &Value, ids: &mut Vec<String>) {
    match value {
        Value::Object(entries) => {
            for (key, child) in entries {
                if key == LOCALISED_STRING_ID {
                    record_id(child, ids);
                }
                descend(child, ids);
            }
        }
        Value::Array(items) => collect_elements(items, ids),
        _ => {}
    }
}

fn descend(child: &Value, ids: &mut Vec<String>) {
    match child {
        Value::Object(_) => collect(child, ids),
        Value::Array(items) => collect_elements(items, ids),
        _ => {}
    }
}

fn collect_elements(items: &[Value], ids: &mut Vec<String>) {
    for item in items {
        if item.is_object() {
            collect(item, ids);
        } else {
            debug!("skipping non-object array element while collecting localisation ids");
        }
    }
}

fn record_id(candidate: &Value, ids: &mut Vec<String>) {
    match candidate {
        Value::String(id) => ids.push(id.clone()),
        other => debug!("ignoring non-string {LOCALISED_STRING_ID}: {other}"),
    }
}

/// Returns the string at the JSON Pointer `pointer`, if present and a string.
///
/// # Examples
///
/// ```
/// use parcel_relay_common::str_at;
/// use serde_json::json;
///
/// let tree = json!({ "summary": { "status": "DELIVERED", "code": 3 } });
/// assert_eq!(str_at(&tree, "/summary/status"), Some("DELIVERED"));
/// assert_eq!(str_at(&tree, "/summary/code"), None);
/// assert_eq!(str_at(&tree, "/missing"), None);
/// ```
#[must_use]
pub fn str_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value.pointer(pointer).and_then(Value::as_str)
}

/// Renders a JSON Pointer in dotted form for error messages.
///
/// # Examples
///
/// ```
/// use parcel_relay_common::display_pointer;
///
/// assert_eq!(display_pointer("/summary/metadata/status"), "summary.metadata.status");
/// assert_eq!(display_pointer(""), "");
/// ```
#[must_use]
pub fn display_pointer(pointer: &str) -> String {
    pointer.trim_start_matches('/').replace('/', ".")
}
