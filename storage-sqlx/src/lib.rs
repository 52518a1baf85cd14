//! # The Eye SQLX storage backend
//!
//! [sqlx](https://crates.io/crates/sqlx) storage adapters for the-eye.
//!
//! Events live in a single `events` table which is created when a store is constructed. Rows
//! are inserted by the deferred ingestion job and never updated, so the auto-increment `id`
//! column doubles as the natural storage order for queries.
//!
//! ## Features
//!
//! - `with-sqlite` (enabled by default) - Enable support for SQLite databases by exposing the `SqlxSqliteStore` storage adapter.
//! - `with-postgres` - Enable support for Postgres databases by exposing the `SqlxPgStore` storage adapter.

#![deny(missing_docs)]

#[cfg(feature = "with-postgres")]
mod postgres;
#[cfg(feature = "with-sqlite")]
mod sqlite;

#[cfg(feature = "with-postgres")]
pub use crate::postgres::SqlxPgStore;
#[cfg(feature = "with-sqlite")]
pub use crate::sqlite::SqlxSqliteStore;

use the_eye::{TimestampError, ValidationError};

/// Columns selected for every event query, in [`the_eye::Event`] field order
const EVENT_COLUMNS: &str = r#"id, session_id, category, name, data, "timestamp""#;

/// Surface a timestamp that failed to resolve while persisting a job
///
/// The value never reaches the database, so there is no driver error to wrap.
fn encode_error(err: ValidationError) -> sqlx::Error {
    sqlx::Error::Protocol(format!("Cannot persist event: {}", err))
}

/// Surface a stored timestamp that could not be read back as a decode error
#[cfg_attr(not(feature = "with-sqlite"), allow(dead_code))]
fn decode_error(err: TimestampError) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(err))
}
