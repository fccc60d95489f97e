//! HTTP relay for parcel tracking lookups.
//!
//! A request names a tracking number; the relay fetches the carrier's
//! tracking record, resolves the localisation identifiers it contains into
//! Italian display text and answers with a labelled summary rendered as
//! JSON or as an HTML fragment.
//!
//! The pipeline stages live in their own modules:
//!
//! - [`upstream`]: carrier HTTP clients and response decoding;
//! - [`localization`]: identifier resolution with a fallback dictionary;
//! - [`assembler`]: labelled field extraction;
//! - [`render`]: JSON and HTML output;
//! - [`relay`]: the per-request pipeline;
//! - [`server`]: the `tiny_http` front end.

pub mod assembler;
pub mod cli;
pub mod config;
pub mod error;
pub mod localization;
pub mod relay;
pub mod render;
pub mod server;
pub mod upstream;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;

pub use config::{ConfigError, RelayConfig, UpstreamConfig};
pub use error::{ErrorKind, RelayError, Result};
pub use relay::{Relay, RelayRequest};
pub use render::{OutputMode, Rendered};
