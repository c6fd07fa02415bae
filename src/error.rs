/// Error types for the blog service
///
/// Errors are converted to HTML responses: unknown resources render the
/// custom not-found page, authentication failures redirect to the login
/// form, and everything else falls back to a plain server-error page.
use actix_web::{error::ResponseError, http::header, http::StatusCode, HttpResponse};
use thiserror::Error;

use crate::handlers::pages;
use crate::middleware::login_redirect_target;

/// Result type for blog-service operations
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Resource does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Request requires an authenticated session; carries the return path
    #[error("login required")]
    LoginRequired { next: String },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Template rendering failed
    #[error("template error: {0}")]
    Template(#[from] askama::Error),

    /// User-visible validation failure
    #[error("{0}")]
    Validation(String),

    /// Anything else
    #[error("internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::LoginRequired { .. } => StatusCode::FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Template(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::LoginRequired { next } => HttpResponse::Found()
                .insert_header((header::LOCATION, login_redirect_target(next)))
                .finish(),
            AppError::NotFound(what) => {
                tracing::debug!(%what, "rendering not-found page");
                HttpResponse::NotFound()
                    .content_type("text/html; charset=utf-8")
                    .body(pages::not_found_body(None))
            }
            other => {
                tracing::error!(error = %other, "request failed");
                HttpResponse::build(other.status_code())
                    .content_type("text/html; charset=utf-8")
                    .body(pages::server_error_body())
            }
        }
    }
}
