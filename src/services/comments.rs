/// Comment service - comments attached to a post
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::CommentWithAuthor;

pub struct CommentService {
    pool: PgPool,
}

impl CommentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Comments for a post in creation order.
    pub async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentWithAuthor>> {
        let comments = sqlx::query_as::<_, CommentWithAuthor>(
            r#"
            SELECT c.id, c.post_id, c.author_id, u.username AS author_username,
                   c.text, c.created_at
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.post_id = $1
            ORDER BY c.created_at, c.id
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    /// Attach a comment to a post.
    pub async fn create(&self, post_id: Uuid, author_id: Uuid, text: &str) -> Result<Uuid> {
        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO comments (id, post_id, author_id, text)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(post_id)
        .bind(author_id)
        .bind(text)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    pub async fn count_for_post(&self, post_id: Uuid) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM comments WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
