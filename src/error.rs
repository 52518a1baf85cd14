//! Client-facing error types

use thiserror::Error;

/// A timestamp string that could not be understood
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    #[error("timestamp is empty")]
    Empty,

    #[error("invalid timestamp {0:?}")]
    Malformed(String),
}

/// A submission or query rejected before reaching storage
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// One or more required ingestion fields were absent or blank
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// A timestamp field or query bound did not parse
    #[error("invalid {field}: {source}")]
    InvalidTimestamp {
        field: &'static str,
        #[source]
        source: TimestampError,
    },

    /// The requested page number is not a positive integer or lies past the last page
    #[error("Invalid page.")]
    InvalidPage,
}

impl ValidationError {
    pub(crate) fn timestamp(field: &'static str) -> impl FnOnce(TimestampError) -> Self {
        move |source| ValidationError::InvalidTimestamp { field, source }
    }
}
