use actix_web::web;
use actix_web::HttpResponse;

use crate::domain::NewContactMessage;
use crate::lifecycle::Lifecycle;
use crate::lifecycle::LifecycleError;
use crate::store::Store;

/// `POST /messages`
///
/// Contact form. Every field is required; all missing ones are reported in a
/// single 400.
#[tracing::instrument(
    name = "Receiving contact message",
    skip(form, lifecycle),
    fields(sender_email = ?form.email)
)]
pub async fn submit_message<S: Store>(
    form: web::Json<NewContactMessage>,
    lifecycle: web::Data<Lifecycle<S>>,
) -> Result<HttpResponse, LifecycleError> {
    let message = lifecycle.submit_message(form.into_inner()).await?;
    Ok(HttpResponse::Created().json(message))
}
