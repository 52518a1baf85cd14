use crate::queue::QueueError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use the_eye::ValidationError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Body or query string that could not be decoded at all
    #[error("{0}")]
    Malformed(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error(transparent)]
    Queue(#[from] QueueError),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<&'static str>,
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        let code = self.status_code();

        let fields = match self {
            ApiError::Validation(ValidationError::MissingFields(fields)) => fields.clone(),
            _ => Vec::new(),
        };

        HttpResponse::build(code).json(ErrorResponse {
            error: self.to_string(),
            code: code.as_u16(),
            fields,
        })
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(ValidationError::InvalidPage) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) | ApiError::Malformed(_) => StatusCode::BAD_REQUEST,
            ApiError::Database(_) | ApiError::Queue(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
