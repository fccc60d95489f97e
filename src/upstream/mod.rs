//! Carrier-facing half of the relay.
//!
//! - [`client`] performs the two outbound HTTP calls behind traits so the
//!   pipeline can run against stubs.
//! - [`tracking`] decodes the tracking response, including its two nested
//!   JSON-encoded documents.

pub mod client;
pub mod tracking;

pub use client::{FetchError, HttpCarrier, LocalizationSource, TrackingSource};
pub use tracking::{DecodeError, TrackingRecord};
