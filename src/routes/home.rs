use actix_web::HttpResponse;
use serde_json::json;

/// `GET /`
///
/// Service name, version, and the public entry points
pub async fn home() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "message": "Newsletter admin API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "/health_check",
            "/newsletter",
            "/messages",
            "/admin/login",
            "/admin/subscribers",
            "/admin/messages",
            "/admin/newsletter-send",
            "/admin/newsletters",
            "/admin/stats",
        ],
    }))
}
