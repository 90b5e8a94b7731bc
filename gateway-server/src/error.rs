//! HTTP-layer error type: failures that happen before a request ever
//! reaches the orchestrator (bad JSON, an unknown route extractor failure).
//! Once a request reaches `Orchestrator::query`, failures are reported as
//! an ordinary `200`/`4xx`/`5xx` `QueryResponse` body (spec §7 "Safety
//! errors are always surfaced to the user... never with database stack
//! traces"), not through this type.
use actix_web::{error::JsonPayloadError, http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid request body: {0}")]
    BadRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    error: ErrorDetail<'a>,
}

#[derive(Serialize)]
struct ErrorDetail<'a> {
    kind: &'a str,
    message: String,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let kind = match self {
            ApiError::BadRequest(_) => "config_error",
            ApiError::Internal(_) => "internal_error",
        };
        HttpResponse::build(self.status_code()).json(ErrorBody {
            success: false,
            error: ErrorDetail {
                kind,
                message: self.to_string(),
            },
        })
    }
}

impl From<JsonPayloadError> for ApiError {
    fn from(e: JsonPayloadError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

pub fn json_error_handler(
    err: JsonPayloadError,
    _req: &actix_web::HttpRequest,
) -> actix_web::Error {
    actix_web::Error::from(ApiError::from(err))
}
