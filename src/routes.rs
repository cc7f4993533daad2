//! HTTP handlers. Each one is a thin wrapper over a `Lifecycle` operation and
//! is generic over the `Store` the app was built with (see `startup::run`).

mod admin;
mod health_check;
mod home;
mod messages;
mod newsletter;

use actix_web::error::InternalError;
use actix_web::error::JsonPayloadError;
use actix_web::error::PathError;
use actix_web::error::QueryPayloadError;
use actix_web::http::StatusCode;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::ResponseError;
pub use admin::*;
pub use health_check::*;
pub use home::*;
pub use messages::*;
pub use newsletter::*;
use serde::Deserialize;
use serde::Serialize;

use crate::lifecycle::LifecycleError;
use crate::utils::json_error;

impl ResponseError for LifecycleError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Duplicate(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let code = match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Duplicate(_) => "DUPLICATE_ENTRY",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Unexpected(_) => "INTERNAL_ERROR",
        };
        // the cause chain of unexpected errors is logged by `TracingLogger`, but
        // never sent to the client
        let message = match self {
            Self::Unexpected(_) => "Something went wrong, please try again later".to_string(),
            e => e.to_string(),
        };
        json_error(self.status_code(), code, &message)
    }
}

/// `?status=` filter shared by the list endpoints
#[derive(Deserialize)]
pub struct StatusQuery {
    status: Option<String>,
}

/// Body of `PATCH` requests that change a record's status
#[derive(Deserialize)]
pub struct StatusUpdate {
    status: Option<String>,
}

#[derive(Serialize)]
struct Ack<'a> {
    success: bool,
    message: &'a str,
}

/// 200 `{"success": true, "message": ..}`, for operations with nothing else to
/// return
fn ack(message: &str) -> HttpResponse {
    HttpResponse::Ok().json(Ack {
        success: true,
        message,
    })
}

/// Unparseable JSON bodies are reported like any other validation failure
pub fn json_error_handler(
    err: JsonPayloadError,
    _req: &HttpRequest,
) -> actix_web::Error {
    let resp = json_error(
        StatusCode::BAD_REQUEST,
        "VALIDATION_ERROR",
        &format!("Invalid request body: {err}"),
    );
    InternalError::from_response(err, resp).into()
}

pub fn query_error_handler(
    err: QueryPayloadError,
    _req: &HttpRequest,
) -> actix_web::Error {
    let resp = json_error(
        StatusCode::BAD_REQUEST,
        "VALIDATION_ERROR",
        &format!("Invalid query string: {err}"),
    );
    InternalError::from_response(err, resp).into()
}

/// Ids are UUIDs, so anything else can't refer to an existing record
pub fn path_error_handler(
    err: PathError,
    _req: &HttpRequest,
) -> actix_web::Error {
    let resp = json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "Record not found");
    InternalError::from_response(err, resp).into()
}
