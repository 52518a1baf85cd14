//! # The Eye
//!
//! Event telemetry types and the storage contract behind the ingestion and query endpoints.
//!
//! Clients submit events as an [`EventForm`]. A valid submission becomes a [`NewEvent`], which is
//! handed to a deferred job and later persisted as an [`Event`]. Stored events are retrieved with
//! an [`EventQuery`], which pairs an [`EventFilter`] with a window into the matches.
//!
//! Storage adapters implement [`Storage`] along with [`Persistable`] for [`NewEvent`] and
//! [`Queryable`] for [`EventQuery`]. See the `the-eye-storage-sqlx` crate.

mod error;
mod event;
mod filter;
mod new_event;
mod page;
pub mod timestamp;

pub use crate::error::{TimestampError, ValidationError};
pub use crate::event::Event;
pub use crate::filter::{EventFilter, EventQuery, ListParams, Matches, Predicate};
pub use crate::new_event::{EventForm, NewEvent};
pub use crate::page::{Page, PageRequest};

/// A backing store for events
pub trait Storage {
    /// The error returned by every operation on this store
    type Error;
}

/// Write a value into a backing store, producing `Out`
#[async_trait::async_trait]
pub trait Persistable<S, Out = Self>
where
    S: Storage,
{
    /// Persist this value
    async fn persist(self, store: &S) -> Result<Out, S::Error>;
}

/// Read from a backing store
#[async_trait::async_trait]
pub trait Queryable<S>
where
    S: Storage,
{
    /// The result of running this query
    type Output;

    /// Run this query against the store
    async fn fetch(&self, store: &S) -> Result<Self::Output, S::Error>;
}
