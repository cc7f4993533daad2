use std::fmt::Debug;

use actix_web::http::StatusCode;
use actix_web::web;
use actix_web::HttpResponse;
use actix_web::ResponseError;
use secrecy::Secret;
use serde::Deserialize;
use serde::Serialize;

use crate::authentication::AuthError;
use crate::authentication::Credentials;
use crate::authentication::TokenIssuer;
use crate::lifecycle::Lifecycle;
use crate::store::Store;
use crate::utils::error_chain_fmt;
use crate::utils::json_error;
use crate::utils::unauthorized;

#[derive(Deserialize)]
pub struct LoginRequest {
    email: String,
    password: Secret<String>,
}

#[derive(Serialize)]
struct LoginResponse {
    token: String,
    token_type: &'static str,
    /// seconds
    expires_in: i64,
}

#[derive(thiserror::Error)]
pub enum LoginError {
    #[error("Invalid email or password")]
    AuthError(#[source] anyhow::Error),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl Debug for LoginError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for LoginError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::AuthError(_) => StatusCode::UNAUTHORIZED,
            Self::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            Self::AuthError(_) => {
                // same 401 (and challenge header) as a missing token
                unauthorized(anyhow::anyhow!(self.to_string())).error_response()
            }
            Self::UnexpectedError(_) => json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Something went wrong, please try again later",
            ),
        }
    }
}

/// `POST /admin/login`
///
/// Exchange admin credentials for a bearer token, to be sent as
/// `Authorization: Bearer <token>` on every other `/admin` request until it
/// expires. There is no logout; tokens simply run out.
#[tracing::instrument(
    name = "Admin login",
    skip(body, lifecycle, tokens),
    fields(
        email = %body.email,
        admin_id = tracing::field::Empty,
    )
)]
pub async fn login<S: Store>(
    body: web::Json<LoginRequest>,
    lifecycle: web::Data<Lifecycle<S>>,
    tokens: web::Data<TokenIssuer>,
) -> Result<HttpResponse, LoginError> {
    let body = body.into_inner();
    let creds = Credentials {
        email: body.email,
        password: body.password,
    };

    let admin_id = lifecycle
        .authenticate(creds)
        .await
        .map_err(|e| match e {
            AuthError::InvalidCredentials(e) => LoginError::AuthError(e),
            AuthError::UnexpectedError(e) => LoginError::UnexpectedError(e),
        })?;
    tracing::Span::current().record("admin_id", tracing::field::display(admin_id));

    Ok(HttpResponse::Ok().json(LoginResponse {
        token: tokens.issue(admin_id),
        token_type: "Bearer",
        expires_in: tokens.ttl_seconds(),
    }))
}
