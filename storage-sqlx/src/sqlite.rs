use crate::{decode_error, encode_error, EVENT_COLUMNS};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{Sqlite, SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::QueryBuilder;
use std::convert::TryFrom;
use std::str::FromStr;
use the_eye::{
    timestamp, Event, EventFilter, EventQuery, Matches, NewEvent, Persistable, Predicate,
    Queryable, Storage,
};

/// Fixed-width text layout for the `timestamp` column
///
/// SQLite has no native datetime type. Every value is written with the same width so that
/// lexical comparison in range predicates agrees with chronological order.
const STORAGE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// [sqlx](https://docs.rs/sqlx)-based SQLite backing store
pub struct SqlxSqliteStore {
    /// sqlx [`SqlitePool`](sqlx::SqlitePool) to communicate with the database
    pub pool: SqlitePool,
}

impl SqlxSqliteStore {
    /// Create a new backing store instance with a given [`SqlitePool`](sqlx::SqlitePool)
    pub async fn new(pool: SqlitePool) -> Result<Self, sqlx::Error> {
        Self::create_events_table(&pool).await?;

        Ok(Self { pool })
    }

    /// Open (creating if missing) the database at `url`, like `sqlite://the_eye.db`
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        Self::new(pool).await
    }

    /// Create a store backed by a private in-memory database
    ///
    /// The pool holds exactly one connection which is never recycled, as the database only
    /// lives as long as that connection.
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::new(pool).await
    }

    async fn create_events_table(pool: &SqlitePool) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r#"
            create table if not exists events(
                id integer primary key autoincrement,
                session_id varchar(255) not null,
                category varchar(255) not null,
                name varchar(255) not null,
                data text not null,
                "timestamp" varchar(26) not null
            );
        "#,
        )
        .execute(&mut *tx)
        .await?;

        for column in &["session_id", "category", "timestamp"] {
            sqlx::query(&format!(
                r#"create index if not exists events_{column}_idx on events ("{column}");"#,
                column = column
            ))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }
}

impl Storage for SqlxSqliteStore {
    type Error = sqlx::Error;
}

/// Raw `events` row as stored in SQLite
#[derive(Debug, sqlx::FromRow)]
struct SqliteEventRow {
    id: i64,
    session_id: String,
    category: String,
    name: String,
    data: String,
    timestamp: String,
}

impl TryFrom<SqliteEventRow> for Event {
    type Error = sqlx::Error;

    fn try_from(row: SqliteEventRow) -> Result<Self, Self::Error> {
        let timestamp = timestamp::parse(&row.timestamp).map_err(decode_error)?;

        Ok(Event {
            id: row.id,
            session_id: row.session_id,
            category: row.category,
            name: row.name,
            data: row.data,
            timestamp,
        })
    }
}

fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(STORAGE_FORMAT).to_string()
}

/// Append a `where` clause for every predicate on `filter`
fn push_predicates(builder: &mut QueryBuilder<'_, Sqlite>, filter: &EventFilter) {
    let predicates = filter.predicates();

    if predicates.is_empty() {
        return;
    }

    builder.push(" where ");

    let mut clauses = builder.separated(" and ");

    for predicate in predicates {
        match predicate {
            Predicate::SessionId(session_id) => {
                clauses
                    .push("session_id = ")
                    .push_bind_unseparated(session_id.to_string());
            }
            Predicate::Category(category) => {
                clauses
                    .push("category = ")
                    .push_bind_unseparated(category.to_string());
            }
            Predicate::StartTime(start) => {
                clauses
                    .push(r#""timestamp" >= "#)
                    .push_bind_unseparated(format_timestamp(&start));
            }
            Predicate::EndTime(end) => {
                clauses
                    .push(r#""timestamp" <= "#)
                    .push_bind_unseparated(format_timestamp(&end));
            }
        }
    }
}

#[async_trait::async_trait]
impl Persistable<SqlxSqliteStore, Event> for NewEvent {
    async fn persist(self, store: &SqlxSqliteStore) -> Result<Event, sqlx::Error> {
        let timestamp = self.resolve_timestamp().map_err(encode_error)?;

        let saved: SqliteEventRow = sqlx::query_as(&format!(
            r#"insert into events (
                session_id,
                category,
                name,
                data,
                "timestamp"
            ) values (
                ?,
                ?,
                ?,
                ?,
                ?
            )
            returning {}"#,
            EVENT_COLUMNS
        ))
        .bind(self.session_id)
        .bind(self.category)
        .bind(self.name)
        .bind(self.data)
        .bind(format_timestamp(&timestamp))
        .fetch_one(&store.pool)
        .await?;

        let event = Event::try_from(saved)?;

        log::trace!("Persisted event {}: {:?}", event.id, event);

        Ok(event)
    }
}

#[async_trait::async_trait]
impl Queryable<SqlxSqliteStore> for EventQuery {
    type Output = Matches;

    async fn fetch(&self, store: &SqlxSqliteStore) -> Result<Matches, sqlx::Error> {
        let mut count = QueryBuilder::<Sqlite>::new("select count(*) from events");
        push_predicates(&mut count, &self.filter);

        let (total,): (i64,) = count.build_query_as().fetch_one(&store.pool).await?;

        let mut select =
            QueryBuilder::<Sqlite>::new(format!("select {} from events", EVENT_COLUMNS));
        push_predicates(&mut select, &self.filter);
        select.push(" order by id");

        // SQLite only accepts an offset after a limit; -1 means unbounded
        select
            .push(" limit ")
            .push_bind(self.limit.map_or(-1, i64::from))
            .push(" offset ")
            .push_bind(self.offset as i64);

        let rows: Vec<SqliteEventRow> = select.build_query_as().fetch_all(&store.pool).await?;

        let events = rows
            .into_iter()
            .map(Event::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Matches {
            total: total as u64,
            events,
        })
    }
}
