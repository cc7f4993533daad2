use std::ops::Deref;

use actix_web::body::MessageBody;
use actix_web::dev::ServiceRequest;
use actix_web::dev::ServiceResponse;
use actix_web::web;
use actix_web::FromRequest;
use actix_web::HttpMessage;
use actix_web_lab::middleware::Next;
use uuid::Uuid;

use super::BearerToken;
use super::TokenIssuer;
use crate::utils::error_500;
use crate::utils::unauthorized;

/// Id of the admin the request's bearer token was issued for. Inserted into
/// request extensions by `reject_unauthenticated`.
#[derive(Clone, Copy, Debug)]
pub struct AdminId(Uuid);

impl Deref for AdminId {
    type Target = Uuid;
    fn deref(&self) -> &Self::Target { &self.0 }
}

/// Guards every `/admin` route: a request without a valid, unexpired token
/// never reaches the handler.
///
/// See `actix_web_lab::middleware::from_fn`
pub async fn reject_unauthenticated(
    mut req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let (raw_req, payload) = req.parts_mut();
    let token = BearerToken::from_request(raw_req, payload).await?;

    let tokens = req
        .app_data::<web::Data<TokenIssuer>>()
        .ok_or_else(|| error_500("TokenIssuer missing from app data"))?;

    match tokens.verify(token.as_str()) {
        Ok(admin_id) => {
            req.extensions_mut().insert(AdminId(admin_id));
            next.call(req).await
        }
        Err(e) => {
            tracing::warn!(error = %e, "Rejected admin token");
            Err(unauthorized(anyhow::anyhow!(e)))
        }
    }
}
