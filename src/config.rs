//! Relay configuration loaded from an optional TOML file.
//!
//! Every value defaults to the constants the relay has always used, so an
//! empty file (or no file at all) reproduces the stock behaviour. The
//! configuration is built once at start-up and shared read-only.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_TRACKING_URL: &str = "https://track.amazon.it/api/tracker/";
const DEFAULT_LOCALIZATION_URL: &str = "https://track.amazon.it/getLocalizedStrings";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

const DEFAULT_HEADERS: [(&str, &str); 11] = [
    (
        "User-Agent",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:121.0) Gecko/20100101 Firefox/121.0",
    ),
    ("Accept", "application/json"),
    ("Accept-Language", "en-US,en;q=0.5"),
    ("Content-Type", "application/json"),
    (
        "anti-csrftoken-a2z",
        "hMOny/PlioLqIfCNSnGcF2OEGuNO1XVbQmal8o6eICdsAAAAAGV4w9kAAAAB",
    ),
    ("Origin", "https://track.amazon.it"),
    ("Connection", "keep-alive"),
    (
        "Cookie",
        concat!(
            "session-id=257-5784047-3884732; session-id-time=2082787201l; ",
            "csm-hit=tb:s-VYH1DKCJS293CC44TVHZ|1702413273725&t:1702413274591&adb:adblk_no; ",
            "ubid-acbit=258-7911589-2663967; ",
            "session-token=9/TU7XVBwIubpQKjYyLs4bsqMYKoO1cs30OnB8f4aZAnRxEd9nSI+E7DmR+62uZnUNtPP/",
            "pghsTqeIWUuCKCqpGpAJfDnycClA6/DFDMvf62rsur5ayeC0YbvhHLRXq+ac1wkulN1oitnWp8xEGJuwOhnH78",
            "MNhvNBqiaFzm1ukmuBnZhE6ft40A5DbXR86M3h3wvIEF/qHdjJCg6mN+kSEocqhiCKwicTE508pkO90wRCQUp4",
            "AmCuDVNE1yE9r5pZFb1LvM1I9cFMv5LR5fD/UZ3MLCtrxkLxUYiRb+cTCKSeZlvB5UVuenTGfgi49gwEixWxU/",
            "16DhqLQXRWlQtuc+Y1yNc8dZ",
        ),
    ),
    ("Sec-Fetch-Dest", "empty"),
    ("Sec-Fetch-Mode", "cors"),
    ("Sec-Fetch-Site", "same-origin"),
];

const DEFAULT_FALLBACK: [(&str, &str); 7] = [
    ("swa_rex_delivering_no_updated_eddday", "Consegnato"),
    ("swa_rex_detail_pickedUp", "Pacco ritirato"),
    (
        "swa_rex_arrived_at_sort_center",
        "Il pacco è arrivato presso la sede del corriere",
    ),
    ("swa_rex_ofd", "In consegna"),
    ("swa_rex_detail_creation_confirmed", "Etichetta creata"),
    ("swa_rex_shipping_label_created", "Etichetta creata"),
    (
        "swa_rex_detail_departed",
        "Il pacco ha lasciato la sede del corriere",
    ),
];

/// Errors raised while loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read configuration {path}: {source}")]
    Io {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or contains unknown keys.
    #[error("invalid configuration {path}: {reason}")]
    Parse {
        /// Path that was requested.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },
}

/// Top-level relay configuration.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RelayConfig {
    /// Socket address the HTTP server listens on.
    pub bind: String,
    /// Carrier endpoints and request shaping.
    pub upstream: UpstreamConfig,
    /// Identifier to display text map used when the remote lookup fails.
    ///
    /// A non-empty table in the file replaces the built-in entries
    /// wholesale.
    pub fallback: BTreeMap<String, String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_owned(),
            upstream: UpstreamConfig::default(),
            fallback: owned_pairs(&DEFAULT_FALLBACK),
        }
    }
}

impl RelayConfig {
    /// Reads and parses a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read and
    /// [`ConfigError::Parse`] when its contents are invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&source).map_err(|reason| ConfigError::Parse {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns the parser message when the text is invalid.
    ///
    /// # Examples
    ///
    /// ```
    /// use parcel_relay::config::RelayConfig;
    ///
    /// let config = RelayConfig::from_toml("bind = \"127.0.0.1:9000\"\n").expect("valid");
    /// assert_eq!(config.bind, "127.0.0.1:9000");
    /// assert_eq!(config.fallback.len(), 7);
    /// ```
    pub fn from_toml(source: &str) -> Result<Self, String> {
        let mut config: Self = toml::from_str(source).map_err(|e| e.to_string())?;
        if config.fallback.is_empty() {
            config.fallback = owned_pairs(&DEFAULT_FALLBACK);
        }
        Ok(config)
    }
}

/// Carrier endpoint settings.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct UpstreamConfig {
    /// Base URL for tracking lookups; the tracking number is appended.
    pub tracking_url: String,
    /// URL receiving the batched localisation lookup.
    pub localization_url: String,
    /// Prefix for the `Referer` header; the tracking number is appended.
    pub referer_base: String,
    /// Global timeout applied to each outbound call, in seconds.
    pub timeout_secs: u64,
    /// Opaque headers the localisation endpoint expects from a browser.
    pub headers: BTreeMap<String, String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            tracking_url: DEFAULT_TRACKING_URL.to_owned(),
            localization_url: DEFAULT_LOCALIZATION_URL.to_owned(),
            referer_base: DEFAULT_LOCALIZATION_URL.to_owned(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            headers: owned_pairs(&DEFAULT_HEADERS),
        }
    }
}

impl UpstreamConfig {
    /// Returns the outbound timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Builds the tracking lookup URL for `tracking_number`.
    ///
    /// The number becomes exactly one percent-encoded path segment, so
    /// `/`, `?`, `#` and spaces cannot change the path or add a query.
    ///
    /// # Errors
    ///
    /// Returns [`url::ParseError`] when `tracking_url` is not an absolute
    /// hierarchical URL.
    ///
    /// # Examples
    ///
    /// ```
    /// use parcel_relay::config::UpstreamConfig;
    ///
    /// let url = UpstreamConfig::default()
    ///     .tracking_url_for("TBA 1?x")
    ///     .expect("valid base");
    /// assert_eq!(url.as_str(), "https://track.amazon.it/api/tracker/TBA%201%3Fx");
    /// ```
    pub fn tracking_url_for(&self, tracking_number: &str) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&self.tracking_url)?;
        url.path_segments_mut()
            .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .push(tracking_number);
        Ok(url)
    }

    /// Builds the `Referer` value sent with the localisation lookup.
    #[must_use]
    pub fn referer_for(&self, tracking_number: &str) -> String {
        format!("{}{tracking_number}", self.referer_base)
    }
}

fn owned_pairs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
        .collect()
}
