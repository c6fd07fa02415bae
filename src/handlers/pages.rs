/// Static pages, the custom error pages, and liveness
use actix_web::{web, HttpResponse};
use askama::Template;
use sqlx::PgPool;

use crate::error::Result;
use crate::middleware::MaybeUser;

use super::render;

#[derive(Template)]
#[template(path = "about_author.html")]
struct AboutAuthorTemplate {
    viewer: Option<String>,
}

#[derive(Template)]
#[template(path = "about_tech.html")]
struct AboutTechTemplate {
    viewer: Option<String>,
}

#[derive(Template)]
#[template(path = "404.html")]
struct NotFoundTemplate {
    viewer: Option<String>,
}

#[derive(Template)]
#[template(path = "500.html")]
struct ServerErrorTemplate;

pub async fn about_author(viewer: MaybeUser) -> Result<HttpResponse> {
    render(&AboutAuthorTemplate {
        viewer: viewer.0.map(|u| u.username),
    })
}

pub async fn about_tech(viewer: MaybeUser) -> Result<HttpResponse> {
    render(&AboutTechTemplate {
        viewer: viewer.0.map(|u| u.username),
    })
}

/// Body of the custom not-found page; shared with the error type.
pub fn not_found_body(viewer: Option<String>) -> String {
    NotFoundTemplate { viewer }
        .render()
        .unwrap_or_else(|_| "<h1>Page not found</h1>".to_string())
}

/// Body of the fallback server-error page. Must not itself fail.
pub fn server_error_body() -> String {
    ServerErrorTemplate
        .render()
        .unwrap_or_else(|_| "<h1>Server error</h1>".to_string())
}

/// Catch-all for unknown paths.
pub async fn not_found(viewer: MaybeUser) -> HttpResponse {
    HttpResponse::NotFound()
        .content_type("text/html; charset=utf-8")
        .body(not_found_body(viewer.0.map(|u| u.username)))
}

/// Liveness: process is up and the database answers.
pub async fn health(pool: web::Data<PgPool>) -> HttpResponse {
    match sqlx::query("SELECT 1").fetch_one(pool.get_ref()).await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "blog-service",
            "version": env!("CARGO_PKG_VERSION"),
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": format!("database connection failed: {}", e),
            "service": "blog-service",
        })),
    }
}
