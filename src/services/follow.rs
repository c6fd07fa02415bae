/// Follow service - the directed, deduplicated follow graph
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;

pub struct FollowService {
    pool: PgPool,
}

impl FollowService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Idempotent create; returns true if a new edge was inserted.
    /// Following yourself is a no-op.
    pub async fn follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool> {
        if follower_id == followee_id {
            return Ok(false);
        }

        let inserted = sqlx::query_as::<_, (Uuid,)>(
            r#"
            INSERT INTO follows (id, follower_id, followee_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (follower_id, followee_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(follower_id)
        .bind(followee_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(inserted.is_some())
    }

    /// Idempotent delete; returns true if an edge was removed.
    pub async fn unfollow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool> {
        let affected = sqlx::query(
            r#"
            DELETE FROM follows
            WHERE follower_id = $1 AND followee_id = $2
            "#,
        )
        .bind(follower_id)
        .bind(followee_id)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(affected > 0)
    }

    pub async fn is_following(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM follows WHERE follower_id = $1 AND followee_id = $2
            )
            "#,
        )
        .bind(follower_id)
        .bind(followee_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}
