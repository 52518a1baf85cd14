//! HTTP surface of The Eye
//!
//! Two endpoints on one resource: `POST /events` validates a submission and queues it for a
//! deferred write, `GET /events` lists stored events. Trailing slashes are normalised, so
//! `/events/` reaches the same handlers.

pub mod config;
pub mod error;
pub mod handlers;
pub mod queue;

use crate::config::Config;
use crate::error::ApiError;
use crate::queue::{Deferred, JobQueue};
use actix_web::http::header;
use actix_web::{guard, middleware, web, App, HttpServer};
use std::fmt;
use std::sync::Arc;
use the_eye::{Event, EventQuery, Matches, NewEvent, Persistable, Queryable, Storage};

/// Shared state of every worker
pub struct AppState<S> {
    /// Read side of the event store
    pub store: Arc<S>,

    /// Where accepted events go to be written
    pub jobs: Arc<dyn Deferred>,

    /// Events per page on the list endpoint
    pub page_size: u32,
}

/// Register the event routes for store `S`
///
/// Extractor failures are reported through [`ApiError`] so every error body is JSON.
pub fn configure<S>(cfg: &mut web::ServiceConfig)
where
    S: Storage + Send + Sync + 'static,
    S::Error: fmt::Display,
    EventQuery: Queryable<S, Output = Matches>,
{
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::Malformed(err.to_string()).into()),
    )
    .app_data(
        web::FormConfig::default()
            .error_handler(|err, _req| ApiError::Malformed(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| ApiError::Malformed(err.to_string()).into()),
    )
    .service(
        web::resource("/events")
            .route(web::get().to(handlers::list_events::<S>))
            .route(
                web::post()
                    .guard(guard::fn_guard(is_multipart))
                    .to(handlers::create_event_multipart::<S>),
            )
            .route(web::post().to(handlers::create_event::<S>)),
    );
}

fn is_multipart(ctx: &guard::GuardContext<'_>) -> bool {
    ctx.head()
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map_or(false, |value| {
            value
                .trim_start()
                .to_ascii_lowercase()
                .starts_with("multipart/form-data")
        })
}

/// Serve the API on `config.host:config.port` until the server is stopped
///
/// Writes still queued when the server stops are flushed before this returns.
pub async fn run<S>(config: &Config, store: S) -> std::io::Result<()>
where
    S: Storage + Send + Sync + 'static,
    S::Error: fmt::Display,
    NewEvent: Persistable<S, Event>,
    EventQuery: Queryable<S, Output = Matches>,
{
    let store = Arc::new(store);
    let (queue, workers) = JobQueue::start(store.clone(), config.worker_count);

    let state = web::Data::new(AppState {
        store,
        jobs: Arc::new(queue),
        page_size: config.page_size,
    });

    log::info!(
        "Listening on {}:{} with {} event writers",
        config.host,
        config.port,
        config.worker_count.max(1)
    );

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::NormalizePath::trim())
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure::<S>)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    log::info!("Server stopped, flushing queued events");

    workers.join().await;

    Ok(())
}
