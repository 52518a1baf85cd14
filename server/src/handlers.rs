use crate::error::{ApiError, Result};
use crate::AppState;
use actix_multipart::Multipart;
use actix_web::{web, Either, HttpResponse};
use futures_util::TryStreamExt;
use std::convert::TryFrom;
use std::fmt;
use the_eye::{
    EventFilter, EventForm, EventQuery, ListParams, Matches, NewEvent, Page, PageRequest,
    Queryable, Storage,
};

/// Largest accepted multipart field, in bytes
const MAX_FIELD_SIZE: usize = 256 * 1024;

/// `POST /events`
///
/// Accepts a form or JSON body. The event is queued for a deferred write and acknowledged
/// with `201 Created` straight away.
pub async fn create_event<S>(
    state: web::Data<AppState<S>>,
    body: Either<web::Json<EventForm>, web::Form<EventForm>>,
) -> Result<HttpResponse>
where
    S: 'static,
{
    let form = match body {
        Either::Left(json) => json.into_inner(),
        Either::Right(form) => form.into_inner(),
    };

    accept(state.get_ref(), form)
}

/// `POST /events` with a `multipart/form-data` body
///
/// Text parts named after [`EventForm`] fields are collected. Other parts are read and
/// discarded.
pub async fn create_event_multipart<S>(
    state: web::Data<AppState<S>>,
    mut payload: Multipart,
) -> Result<HttpResponse>
where
    S: 'static,
{
    let form = read_multipart(&mut payload).await?;

    accept(state.get_ref(), form)
}

fn accept<S>(state: &AppState<S>, form: EventForm) -> Result<HttpResponse> {
    let new_event = NewEvent::try_from(form)?;
    let ack = HttpResponse::Created().json(&new_event);

    log::debug!(
        "Queueing event {}/{} for session {}",
        new_event.category,
        new_event.name,
        new_event.session_id
    );

    state.jobs.defer(new_event)?;

    Ok(ack)
}

async fn read_multipart(payload: &mut Multipart) -> Result<EventForm> {
    let mut form = EventForm::default();

    while let Some(mut field) = payload.try_next().await.map_err(malformed)? {
        let name = field
            .content_disposition()
            .get_name()
            .unwrap_or_default()
            .to_string();

        let mut value = Vec::new();

        while let Some(chunk) = field.try_next().await.map_err(malformed)? {
            if value.len() + chunk.len() > MAX_FIELD_SIZE {
                return Err(ApiError::Malformed(format!("Field {} is too large", name)));
            }

            value.extend_from_slice(&chunk);
        }

        let slot = match name.as_str() {
            "session_id" => &mut form.session_id,
            "category" => &mut form.category,
            "name" => &mut form.name,
            "data" => &mut form.data,
            "timestamp" => &mut form.timestamp,
            _ => continue,
        };

        let value = String::from_utf8(value)
            .map_err(|_| ApiError::Malformed(format!("Field {} is not valid UTF-8", name)))?;

        *slot = Some(value);
    }

    Ok(form)
}

fn malformed(err: actix_multipart::MultipartError) -> ApiError {
    ApiError::Malformed(err.to_string())
}

/// `GET /events`
///
/// Lists stored events matching the optional `session_id`, `category`, `start_time` and
/// `end_time` parameters, one page at a time, in storage order.
pub async fn list_events<S>(
    state: web::Data<AppState<S>>,
    params: web::Query<ListParams>,
) -> Result<HttpResponse>
where
    S: Storage + Send + Sync + 'static,
    S::Error: fmt::Display,
    EventQuery: Queryable<S, Output = Matches>,
{
    let params = params.into_inner();

    let filter = EventFilter::try_from(&params)?;
    let request = PageRequest::parse(params.page.as_deref(), state.page_size)?;

    let matches = EventQuery::page(filter, request)
        .fetch(&*state.store)
        .await
        .map_err(|e| {
            log::error!("Failed to query events: {}", e);

            ApiError::Database(e.to_string())
        })?;

    let page = Page::new(request, matches.total, matches.events)?;

    Ok(HttpResponse::Ok().json(page))
}
