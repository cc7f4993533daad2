use actix_web::web;
use actix_web::HttpResponse;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::validate_required;
use crate::lifecycle::Lifecycle;
use crate::lifecycle::LifecycleError;
use crate::routes::ack;
use crate::store::Store;

#[derive(Deserialize)]
pub struct SubscribeRequest {
    email: Option<String>,
}

#[derive(Serialize)]
struct SubscribeResponse<'a> {
    msg: &'a str,
    email: &'a str,
}

/// `POST /newsletter`
///
/// Public signup form. 201 `{msg, email}` on success; the welcome email is sent
/// in the background, so a mail outage never fails the signup.
///
/// # Request example
///
/// ```sh
///     curl --json '{"email": "john@foo.com"}' http://127.0.0.1:8000/newsletter
/// ```
#[tracing::instrument(
    name = "Adding new subscriber",
    skip(body, lifecycle),
    fields(subscriber_email = ?body.email)
)]
pub async fn subscribe<S: Store>(
    body: web::Json<SubscribeRequest>,
    lifecycle: web::Data<Lifecycle<S>>,
) -> Result<HttpResponse, LifecycleError> {
    let body = body.into_inner();
    validate_required(&[("email", body.email.as_deref())])?;
    let subscriber = lifecycle.subscribe(body.email.unwrap_or_default()).await?;
    Ok(HttpResponse::Created().json(SubscribeResponse {
        msg: "Successfully subscribed to our newsletter",
        email: subscriber.email.as_ref(),
    }))
}

/// `DELETE /newsletter/{id}`
#[tracing::instrument(name = "Removing subscriber", skip(lifecycle))]
pub async fn unsubscribe<S: Store>(
    id: web::Path<Uuid>,
    lifecycle: web::Data<Lifecycle<S>>,
) -> Result<HttpResponse, LifecycleError> {
    lifecycle.unsubscribe(id.into_inner()).await?;
    Ok(ack("Successfully unsubscribed"))
}
