//! A persisted event

use crate::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event definition
///
/// Events are written once by the deferred ingestion job and never updated. Field order here is
/// the serialisation order of the query endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Surrogate ID assigned by the backing store
    ///
    /// IDs increase with insertion, so ordering by ID is the natural storage order.
    pub id: i64,

    /// The ID of the client session that produced this event. Not unique.
    pub session_id: String,

    /// Free-form grouping label, like `page_interaction`
    pub category: String,

    /// Free-form event label, like `page_view`
    pub name: String,

    /// Event payload
    ///
    /// This is the JSON document exactly as the client submitted it. It is stored and served as
    /// text and never validated against a schema. Use [`Event::payload`] to decode it.
    pub data: String,

    /// The time at which this event happened
    #[serde(with = "timestamp::serde_format")]
    pub timestamp: DateTime<Utc>,
}

impl Event {
    /// Attempt to decode the stored payload into a [`serde_json::Value`]
    ///
    /// Payloads are opaque to the service, so a malformed document is only discovered here.
    pub fn payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_str(&self.data)
    }
}
