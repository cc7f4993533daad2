use std::future::ready;
use std::future::Ready;

use actix_web::http::header::AUTHORIZATION;
use actix_web::FromRequest;
use actix_web::HttpRequest;

use crate::utils::unauthorized;

/// Raw token taken from an `Authorization: Bearer <token>` header. Holding one
/// says nothing about its validity; see `TokenIssuer::verify`.
pub struct BearerToken(String);

impl std::fmt::Debug for BearerToken {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str("BearerToken([REDACTED])")
    }
}

impl BearerToken {
    pub fn as_str(&self) -> &str { &self.0 }

    fn from_header(req: &HttpRequest) -> Option<Self> {
        let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
        let (scheme, token) = value.split_once(' ')?;
        let token = token.trim();
        if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
            return None;
        }
        Some(Self(token.to_string()))
    }
}

impl FromRequest for BearerToken {
    type Error = actix_web::Error;

    // reading a header involves no I/O
    type Future = Ready<Result<BearerToken, Self::Error>>;

    fn from_request(
        req: &HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        ready(Self::from_header(req).ok_or_else(|| {
            unauthorized(anyhow::anyhow!(
                "Missing or malformed 'Authorization: Bearer' header"
            ))
        }))
    }
}
