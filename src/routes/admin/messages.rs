use actix_web::web;
use actix_web::HttpResponse;
use uuid::Uuid;

use crate::authentication::AdminId;
use crate::domain::validate_required;
use crate::domain::MessageStatus;
use crate::lifecycle::Lifecycle;
use crate::lifecycle::LifecycleError;
use crate::routes::ack;
use crate::routes::StatusQuery;
use crate::routes::StatusUpdate;
use crate::store::Store;

/// `GET /admin/messages[?status=read|unread]`
pub async fn list_messages<S: Store>(
    query: web::Query<StatusQuery>,
    lifecycle: web::Data<Lifecycle<S>>,
) -> Result<HttpResponse, LifecycleError> {
    let status = query
        .status
        .as_deref()
        .map(MessageStatus::parse)
        .transpose()?;
    let messages = lifecycle.get_messages(status).await?;
    Ok(HttpResponse::Ok().json(messages))
}

/// `GET /admin/messages/{id}`
pub async fn get_message<S: Store>(
    id: web::Path<Uuid>,
    lifecycle: web::Data<Lifecycle<S>>,
) -> Result<HttpResponse, LifecycleError> {
    let message = lifecycle.get_message(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(message))
}

/// `PATCH /admin/messages/{id}` with `{"status": "read"|"unread"}`
pub async fn update_message<S: Store>(
    id: web::Path<Uuid>,
    body: web::Json<StatusUpdate>,
    lifecycle: web::Data<Lifecycle<S>>,
) -> Result<HttpResponse, LifecycleError> {
    validate_required(&[("status", body.status.as_deref())])?;
    let status = MessageStatus::parse(body.status.as_deref().unwrap_or_default())?;
    let message = lifecycle
        .update_message_status(id.into_inner(), status)
        .await?;
    Ok(HttpResponse::Ok().json(message))
}

/// `DELETE /admin/messages/{id}`
#[tracing::instrument(
    name = "Admin deleting message",
    skip(lifecycle, admin_id),
    fields(admin_id = %**admin_id)
)]
pub async fn delete_message<S: Store>(
    id: web::Path<Uuid>,
    lifecycle: web::Data<Lifecycle<S>>,
    admin_id: web::ReqData<AdminId>,
) -> Result<HttpResponse, LifecycleError> {
    lifecycle.delete_message(id.into_inner()).await?;
    Ok(ack("Message deleted successfully"))
}
