//! Request-level error taxonomy for the relay.
//!
//! Each failure that can end a request maps to one [`RelayError`] variant.
//! The variant fixes the HTTP status and the message the caller sees, and
//! the renderer presents it in the caller's chosen output mode.

use crate::assembler::AssembleError;
use crate::upstream::{DecodeError, FetchError};
use thiserror::Error;

/// Message returned when the `tracking` query parameter is absent.
pub const MISSING_TRACKING_MESSAGE: &str = "Missing Tracking number!";

/// Errors that terminate a relay request.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The caller did not supply a tracking number.
    #[error("Missing Tracking number!")]
    MissingTracking,

    /// The request targeted a path other than the root.
    #[error("no route for {path}")]
    NotFound {
        /// Requested path.
        path: String,
    },

    /// The carrier could not be reached or answered with an error status.
    #[error("tracking fetch failed: {0}")]
    Upstream(#[from] FetchError),

    /// The carrier answered with a payload that does not decode.
    #[error("tracking payload undecodable: {0}")]
    Decode(#[from] DecodeError),

    /// A field the relay depends on is absent from the payload.
    #[error("tracking payload incomplete: {0}")]
    Assemble(#[from] AssembleError),
}

/// Broad classification of a [`RelayError`], used in logs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// Bad or missing caller input.
    Input,
    /// Transport failure talking to the carrier.
    Network,
    /// Malformed carrier payload.
    Decode,
    /// Well-formed carrier payload lacking a required field.
    MissingField,
}

impl ErrorKind {
    /// Returns a short stable label for log lines.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Network => "network",
            Self::Decode => "decode",
            Self::MissingField => "missing-field",
        }
    }
}

impl RelayError {
    /// HTTP status code reported for this error, both on the wire and in
    /// the JSON body.
    ///
    /// # Examples
    ///
    /// ```
    /// use parcel_relay::error::RelayError;
    ///
    /// assert_eq!(RelayError::MissingTracking.status_code(), 422);
    /// ```
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::MissingTracking => 422,
            Self::NotFound { .. } => 404,
            Self::Upstream(_) | Self::Decode(_) | Self::Assemble(_) => 502,
        }
    }

    /// Returns the classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingTracking | Self::NotFound { .. } => ErrorKind::Input,
            Self::Upstream(_) => ErrorKind::Network,
            Self::Decode(DecodeError::MissingField { .. }) | Self::Assemble(_) => {
                ErrorKind::MissingField
            }
            Self::Decode(_) => ErrorKind::Decode,
        }
    }
}

/// Result type alias using [`RelayError`].
pub type Result<T> = std::result::Result<T, RelayError>;
