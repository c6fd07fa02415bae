/// Comment handler - inline comment creation on the post page
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;

use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::services::{CommentService, PostService};

use super::posts::parse_post_id;
use super::redirect;

#[derive(Debug, Deserialize)]
pub struct CommentFormData {
    #[serde(default)]
    pub text: String,
}

/// Attach a comment to a post. An empty submission creates nothing; the
/// response is a redirect to the post page either way.
pub async fn add_comment(
    pool: web::Data<PgPool>,
    user: CurrentUser,
    path: web::Path<String>,
    form: web::Form<CommentFormData>,
) -> Result<HttpResponse> {
    let post_id = parse_post_id(&path)?;
    PostService::new((**pool).clone())
        .get(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post {}", post_id)))?;

    let text = form.text.trim();
    if !text.is_empty() {
        CommentService::new((**pool).clone())
            .create(post_id, user.id, text)
            .await?;
    }

    Ok(redirect(&format!("/posts/{}/", post_id)))
}
