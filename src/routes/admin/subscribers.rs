use actix_web::web;
use actix_web::HttpResponse;
use serde::Deserialize;
use uuid::Uuid;

use crate::authentication::AdminId;
use crate::domain::validate_required;
use crate::domain::SubscriberStatus;
use crate::lifecycle::Lifecycle;
use crate::lifecycle::LifecycleError;
use crate::routes::ack;
use crate::routes::StatusQuery;
use crate::routes::StatusUpdate;
use crate::store::Store;

#[derive(Deserialize)]
pub struct NewSubscriberRequest {
    email: Option<String>,
    status: Option<String>,
}

/// `GET /admin/subscribers[?status=active|inactive]`
pub async fn list_subscribers<S: Store>(
    query: web::Query<StatusQuery>,
    lifecycle: web::Data<Lifecycle<S>>,
) -> Result<HttpResponse, LifecycleError> {
    let status = query
        .status
        .as_deref()
        .map(SubscriberStatus::parse)
        .transpose()?;
    let subscribers = lifecycle.list_subscribers(status).await?;
    Ok(HttpResponse::Ok().json(subscribers))
}

/// `POST /admin/subscribers`
///
/// Same checks as the public signup, but `status` can be chosen and no welcome
/// email goes out.
#[tracing::instrument(
    name = "Admin adding subscriber",
    skip(body, lifecycle, admin_id),
    fields(admin_id = %**admin_id)
)]
pub async fn create_subscriber<S: Store>(
    body: web::Json<NewSubscriberRequest>,
    lifecycle: web::Data<Lifecycle<S>>,
    admin_id: web::ReqData<AdminId>,
) -> Result<HttpResponse, LifecycleError> {
    let body = body.into_inner();
    validate_required(&[("email", body.email.as_deref())])?;
    let status = body
        .status
        .as_deref()
        .map(SubscriberStatus::parse)
        .transpose()?;
    let subscriber = lifecycle
        .add_subscriber(body.email.unwrap_or_default(), status)
        .await?;
    Ok(HttpResponse::Created().json(subscriber))
}

/// `GET /admin/subscribers/{id}`
pub async fn get_subscriber<S: Store>(
    id: web::Path<Uuid>,
    lifecycle: web::Data<Lifecycle<S>>,
) -> Result<HttpResponse, LifecycleError> {
    let subscriber = lifecycle.get_subscriber(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(subscriber))
}

/// `PATCH /admin/subscribers/{id}` with `{"status": "active"|"inactive"}`
pub async fn update_subscriber<S: Store>(
    id: web::Path<Uuid>,
    body: web::Json<StatusUpdate>,
    lifecycle: web::Data<Lifecycle<S>>,
) -> Result<HttpResponse, LifecycleError> {
    validate_required(&[("status", body.status.as_deref())])?;
    let status = SubscriberStatus::parse(body.status.as_deref().unwrap_or_default())?;
    let subscriber = lifecycle
        .update_subscriber_status(id.into_inner(), status)
        .await?;
    Ok(HttpResponse::Ok().json(subscriber))
}

/// `DELETE /admin/subscribers/{id}`
#[tracing::instrument(
    name = "Admin deleting subscriber",
    skip(lifecycle, admin_id),
    fields(admin_id = %**admin_id)
)]
pub async fn delete_subscriber<S: Store>(
    id: web::Path<Uuid>,
    lifecycle: web::Data<Lifecycle<S>>,
    admin_id: web::ReqData<AdminId>,
) -> Result<HttpResponse, LifecycleError> {
    lifecycle.delete_subscriber(id.into_inner()).await?;
    Ok(ack("Subscriber deleted successfully"))
}
