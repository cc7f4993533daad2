use actix_web::web;
use actix_web::HttpResponse;

use crate::lifecycle::Lifecycle;
use crate::lifecycle::LifecycleError;
use crate::store::Store;

/// `GET /admin/stats`
pub async fn admin_stats<S: Store>(
    lifecycle: web::Data<Lifecycle<S>>
) -> Result<HttpResponse, LifecycleError> {
    let stats = lifecycle.compute_stats().await?;
    Ok(HttpResponse::Ok().json(stats))
}
