use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;

use actix_web::error::InternalError;
use actix_web::http::header::HeaderValue;
use actix_web::http::header::WWW_AUTHENTICATE;
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde::Serialize;

/// Body of every error response: `{"success": false, "message": .., "error": ..}`
#[derive(Serialize)]
pub struct ErrorBody<'a> {
    success: bool,
    message: &'a str,
    error: &'a str,
}

/// Build an error response with a machine-readable `code` (e.g.
/// `VALIDATION_ERROR`) and a human-readable `message`
pub fn json_error(
    status: StatusCode,
    code: &str,
    message: &str,
) -> HttpResponse {
    HttpResponse::build(status).json(ErrorBody {
        success: false,
        message,
        error: code,
    })
}

/// Convert arbitrary error types to `actix_web::Error` with HTTP 500
pub fn error_500<T>(e: T) -> actix_web::Error
where
    T: Debug + Display + 'static,
{
    actix_web::error::ErrorInternalServerError(e)
}

/// 401 with a `WWW-Authenticate: Bearer` challenge. The cause is kept for
/// logging; clients only see a generic message.
pub fn unauthorized(e: anyhow::Error) -> actix_web::Error {
    let mut resp = json_error(
        StatusCode::UNAUTHORIZED,
        "UNAUTHORIZED",
        "Authentication required",
    );
    resp.headers_mut()
        .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    InternalError::from_response(e, resp).into()
}

/// Print an error along with every error in its `source` chain
pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}
