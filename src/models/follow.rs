use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Directed follow edge: follower's feed includes followee's posts.
#[derive(Debug, Clone, FromRow)]
pub struct Follow {
    pub id: Uuid,
    pub follower_id: Uuid,
    pub followee_id: Uuid,
    pub created_at: DateTime<Utc>,
}
