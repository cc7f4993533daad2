use actix_web::HttpResponse;

/// `GET /health_check`
///
/// 200 with an empty body whenever the server is accepting requests. Does not
/// touch the store.
pub async fn health_check() -> HttpResponse { HttpResponse::Ok().finish() }
