//! Event query filters
//!
//! A filter is a set of optional predicates. Only the predicates that are present are applied,
//! and they combine with logical AND. Storage backends translate [`EventFilter::predicates`]
//! into their native query form; [`EventFilter::matches`] evaluates the same predicates against
//! an in-memory [`Event`].

use crate::{error::ValidationError, page::PageRequest, timestamp, Event};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::convert::TryFrom;

/// Raw query string parameters of the list endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListParams {
    pub session_id: Option<String>,
    pub category: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub page: Option<String>,
}

/// A single storage predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate<'a> {
    /// `session_id = value`
    SessionId(&'a str),

    /// `category = value`
    Category(&'a str),

    /// `timestamp >= value`
    StartTime(DateTime<Utc>),

    /// `timestamp <= value`
    EndTime(DateTime<Utc>),
}

impl Predicate<'_> {
    /// Evaluate this predicate against an event
    pub fn matches(&self, event: &Event) -> bool {
        match *self {
            Predicate::SessionId(session_id) => event.session_id == session_id,
            Predicate::Category(category) => event.category == category,
            Predicate::StartTime(start) => event.timestamp >= start,
            Predicate::EndTime(end) => event.timestamp <= end,
        }
    }
}

/// Event filter builder
///
/// # Examples
///
/// ```rust
/// use the_eye::{EventFilter, Predicate};
///
/// let filter = EventFilter::new().session_id("1230").category("test0");
///
/// assert_eq!(
///     filter.predicates(),
///     vec![Predicate::SessionId("1230"), Predicate::Category("test0")]
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    session_id: Option<String>,
    category: Option<String>,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
}

impl EventFilter {
    /// Create a filter that matches every event
    pub fn new() -> Self {
        Self::default()
    }

    /// Only match events from the given session
    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());

        self
    }

    /// Only match events with the given category
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());

        self
    }

    /// Only match events at or after `start`
    pub fn start_time(mut self, start: DateTime<Utc>) -> Self {
        self.start_time = Some(start);

        self
    }

    /// Only match events at or before `end`
    pub fn end_time(mut self, end: DateTime<Utc>) -> Self {
        self.end_time = Some(end);

        self
    }

    /// The predicates present on this filter, in a stable order
    pub fn predicates(&self) -> Vec<Predicate<'_>> {
        let mut predicates = Vec::with_capacity(4);

        if let Some(session_id) = &self.session_id {
            predicates.push(Predicate::SessionId(session_id));
        }

        if let Some(category) = &self.category {
            predicates.push(Predicate::Category(category));
        }

        if let Some(start) = self.start_time {
            predicates.push(Predicate::StartTime(start));
        }

        if let Some(end) = self.end_time {
            predicates.push(Predicate::EndTime(end));
        }

        predicates
    }

    /// Whether the event satisfies every predicate on this filter
    pub fn matches(&self, event: &Event) -> bool {
        self.predicates().iter().all(|p| p.matches(event))
    }
}

impl TryFrom<&ListParams> for EventFilter {
    type Error = ValidationError;

    /// Build a filter from query parameters
    ///
    /// Empty parameters are ignored, as if they were not given at all.
    fn try_from(params: &ListParams) -> Result<Self, Self::Error> {
        let mut filter = EventFilter::new();

        if let Some(session_id) = present(&params.session_id) {
            filter = filter.session_id(session_id);
        }

        if let Some(category) = present(&params.category) {
            filter = filter.category(category);
        }

        if let Some(raw) = present(&params.start_time) {
            filter = filter
                .start_time(timestamp::parse(raw).map_err(ValidationError::timestamp("start_time"))?);
        }

        if let Some(raw) = present(&params.end_time) {
            filter =
                filter.end_time(timestamp::parse(raw).map_err(ValidationError::timestamp("end_time"))?);
        }

        Ok(filter)
    }
}

/// A filter together with the window of matches to return
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub filter: EventFilter,

    /// Maximum number of events to return, or every match if `None`
    pub limit: Option<u32>,

    /// Number of leading matches to skip
    pub offset: u64,
}

impl EventQuery {
    /// Query every event matching `filter`
    pub fn all(filter: EventFilter) -> Self {
        Self {
            filter,
            limit: None,
            offset: 0,
        }
    }

    /// Query the given page of events matching `filter`
    pub fn page(filter: EventFilter, page: PageRequest) -> Self {
        Self {
            filter,
            limit: Some(page.size),
            offset: page.offset(),
        }
    }
}

/// Events matching an [`EventQuery`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matches {
    /// Number of events matching the filter, ignoring the query window
    pub total: u64,

    /// Matching events inside the query window, in storage order
    pub events: Vec<Event>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
