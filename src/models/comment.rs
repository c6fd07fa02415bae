use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Comment joined with its author for display on the post page.
#[derive(Debug, Clone, FromRow)]
pub struct CommentWithAuthor {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub author_username: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}
