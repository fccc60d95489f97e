//! Resolution of localisation identifiers to display text.
//!
//! The carrier exposes a batched lookup that turns identifiers into
//! display strings. Lookup failures are never fatal: the relay falls back
//! to a small configured dictionary instead. A non-empty remote answer
//! replaces the fallback entirely; the two are never merged.

use crate::upstream::{FetchError, LocalizationSource};
use log::{debug, warn};
use std::collections::{BTreeMap, HashMap};

/// Where a [`Localizations`] map came from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LocalizationOrigin {
    /// The carrier's lookup endpoint answered with entries.
    Remote,
    /// The configured fallback dictionary.
    Fallback,
}

/// Identifier to display text mapping chosen for one request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Localizations {
    entries: HashMap<String, String>,
    origin: LocalizationOrigin,
}

impl Localizations {
    /// Wraps entries returned by the carrier.
    #[must_use]
    pub const fn remote(entries: HashMap<String, String>) -> Self {
        Self {
            entries,
            origin: LocalizationOrigin::Remote,
        }
    }

    /// Copies the configured fallback dictionary.
    #[must_use]
    pub fn fallback(dictionary: &BTreeMap<String, String>) -> Self {
        Self {
            entries: dictionary
                .iter()
                .map(|(id, text)| (id.clone(), text.clone()))
                .collect(),
            origin: LocalizationOrigin::Fallback,
        }
    }

    /// Returns where the entries came from.
    #[must_use]
    pub const fn origin(&self) -> LocalizationOrigin {
        self.origin
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the display text for `id` when present and non-empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use parcel_relay::localization::Localizations;
    /// use std::collections::HashMap;
    ///
    /// let map = Localizations::remote(HashMap::from([
    ///     ("swa_rex_ofd".to_owned(), "In consegna".to_owned()),
    ///     ("swa_rex_blank".to_owned(), String::new()),
    /// ]));
    ///
    /// assert_eq!(map.display_for("swa_rex_ofd"), Some("In consegna"));
    /// assert_eq!(map.display_for("swa_rex_blank"), None);
    /// assert_eq!(map.display_for("swa_rex_unknown"), None);
    /// ```
    #[must_use]
    pub fn display_for(&self, id: &str) -> Option<&str> {
        self.entries
            .get(id)
            .map(String::as_str)
            .filter(|text| !text.is_empty())
    }
}

/// Internal failure type for the remote lookup.
///
/// Not exported: every variant ends in the fallback dictionary.
#[derive(Debug, thiserror::Error)]
enum LookupError {
    #[error("{0}")]
    Fetch(#[from] FetchError),

    #[error("response is not a string map: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Resolves `ids` through `source`, falling back to `fallback` when the
/// lookup fails, does not decode as a string map, or returns nothing.
///
/// Identifiers are sent as given, duplicates included.
pub fn resolve(
    source: &dyn LocalizationSource,
    ids: &[String],
    tracking_number: &str,
    fallback: &BTreeMap<String, String>,
) -> Localizations {
    match lookup(source, ids, tracking_number) {
        Ok(entries) if !entries.is_empty() => {
            debug!("resolved {} localisation entries remotely", entries.len());
            Localizations::remote(entries)
        }
        Ok(_) => {
            warn!("localisation lookup returned no entries; using fallback dictionary");
            Localizations::fallback(fallback)
        }
        Err(e) => {
            warn!("localisation lookup failed ({e}); using fallback dictionary");
            Localizations::fallback(fallback)
        }
    }
}

fn lookup(
    source: &dyn LocalizationSource,
    ids: &[String],
    tracking_number: &str,
) -> Result<HashMap<String, String>, LookupError> {
    let body = source.lookup_localizations(ids, tracking_number)?;
    Ok(serde_json::from_str(&body)?)
}
