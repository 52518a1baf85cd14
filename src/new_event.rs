//! Event submissions and the deferred write payload

use crate::{error::ValidationError, timestamp};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

/// Raw ingestion body
///
/// Every field is optional here so that a submission with missing fields can still be decoded
/// and reported on. Use [`NewEvent::from_form`] to validate it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventForm {
    pub session_id: Option<String>,
    pub category: Option<String>,
    pub name: Option<String>,
    pub data: Option<String>,
    pub timestamp: Option<String>,
}

/// A validated event submission
///
/// This is the payload handed to the deferred write job. It carries the submitted fields
/// verbatim, with no normalisation, along with the time the submission was received. The
/// receive time becomes the event timestamp when the client did not supply one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewEvent {
    pub session_id: String,
    pub category: String,
    pub name: String,
    pub data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    /// Server time at which the submission was accepted
    #[serde(skip)]
    pub received_at: DateTime<Utc>,
}

impl NewEvent {
    /// Validate a raw form received at `received_at`
    ///
    /// Required fields that are absent or empty are all reported together. A supplied
    /// timestamp must parse, but the original string is kept as-is.
    pub fn from_form(form: EventForm, received_at: DateTime<Utc>) -> Result<Self, ValidationError> {
        let mut missing = Vec::new();

        let session_id = required("session_id", form.session_id, &mut missing);
        let category = required("category", form.category, &mut missing);
        let name = required("name", form.name, &mut missing);
        let data = required("data", form.data, &mut missing);

        match (session_id, category, name, data) {
            (Some(session_id), Some(category), Some(name), Some(data)) if missing.is_empty() => {
                if let Some(raw) = form.timestamp.as_deref().filter(|raw| !raw.is_empty()) {
                    timestamp::parse(raw).map_err(ValidationError::timestamp("timestamp"))?;
                }

                Ok(Self {
                    session_id,
                    category,
                    name,
                    data,
                    timestamp: form.timestamp,
                    received_at,
                })
            }
            _ => {
                log::debug!("Rejected event submission, missing {:?}", missing);

                Err(ValidationError::MissingFields(missing))
            }
        }
    }

    /// The timestamp to persist for this event
    ///
    /// The client's value if one was given, otherwise the receive time. An empty string counts
    /// as not given.
    pub fn resolve_timestamp(&self) -> Result<DateTime<Utc>, ValidationError> {
        match self.timestamp.as_deref().filter(|raw| !raw.is_empty()) {
            Some(raw) => timestamp::parse(raw).map_err(ValidationError::timestamp("timestamp")),
            None => Ok(self.received_at),
        }
    }
}

/// Validate a form received just now
impl TryFrom<EventForm> for NewEvent {
    type Error = ValidationError;

    fn try_from(form: EventForm) -> Result<Self, Self::Error> {
        Self::from_form(form, Utc::now())
    }
}

fn required(
    field: &'static str,
    value: Option<String>,
    missing: &mut Vec<&'static str>,
) -> Option<String> {
    match value {
        Some(value) if !value.is_empty() => Some(value),
        _ => {
            missing.push(field);

            None
        }
    }
}
