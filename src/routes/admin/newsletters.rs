use actix_web::web;
use actix_web::HttpResponse;

use crate::authentication::AdminId;
use crate::domain::NewNewsletter;
use crate::lifecycle::Lifecycle;
use crate::lifecycle::LifecycleError;
use crate::store::Store;

/// `POST /admin/newsletter-send`
///
/// `{"topic", "body", "recipients": "all"|"active"|"custom",
/// "custom_recipients": [..]}`. Responds 201 with the recorded newsletter as
/// soon as delivery is queued; `sent_count` is the number of recipients it was
/// queued for.
#[tracing::instrument(
    name = "Publishing newsletter",
    skip(body, lifecycle, admin_id),
    fields(admin_id = %**admin_id)
)]
pub async fn send_newsletter<S: Store>(
    body: web::Json<NewNewsletter>,
    lifecycle: web::Data<Lifecycle<S>>,
    admin_id: web::ReqData<AdminId>,
) -> Result<HttpResponse, LifecycleError> {
    let newsletter = lifecycle.send_newsletter(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(newsletter))
}

/// `GET /admin/newsletters`
pub async fn list_newsletters<S: Store>(
    lifecycle: web::Data<Lifecycle<S>>
) -> Result<HttpResponse, LifecycleError> {
    let newsletters = lifecycle.list_newsletters().await?;
    Ok(HttpResponse::Ok().json(newsletters))
}
