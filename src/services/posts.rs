/// Post service - listing, retrieval and authoring
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Post, PostWithMeta};

pub struct PostService {
    pool: PgPool,
}

impl PostService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Site-wide post count.
    pub async fn count_all(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Site-wide listing page, newest first.
    pub async fn list_page(&self, limit: i64, offset: i64) -> Result<Vec<PostWithMeta>> {
        let posts = sqlx::query_as::<_, PostWithMeta>(
            r#"
            SELECT p.id, p.text, p.created_at, p.image, p.author_id, u.username AS author_username,
                   p.group_id, g.title AS group_title, g.slug AS group_slug
            FROM posts p
            JOIN users u ON u.id = p.author_id
            LEFT JOIN groups g ON g.id = p.group_id
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    pub async fn count_by_group(&self, group_id: Uuid) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts WHERE group_id = $1")
            .bind(group_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn list_page_by_group(
        &self,
        group_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostWithMeta>> {
        let posts = sqlx::query_as::<_, PostWithMeta>(
            r#"
            SELECT p.id, p.text, p.created_at, p.image, p.author_id, u.username AS author_username,
                   p.group_id, g.title AS group_title, g.slug AS group_slug
            FROM posts p
            JOIN users u ON u.id = p.author_id
            LEFT JOIN groups g ON g.id = p.group_id
            WHERE p.group_id = $1
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(group_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    pub async fn count_by_author(&self, author_id: Uuid) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn list_page_by_author(
        &self,
        author_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostWithMeta>> {
        let posts = sqlx::query_as::<_, PostWithMeta>(
            r#"
            SELECT p.id, p.text, p.created_at, p.image, p.author_id, u.username AS author_username,
                   p.group_id, g.title AS group_title, g.slug AS group_slug
            FROM posts p
            JOIN users u ON u.id = p.author_id
            LEFT JOIN groups g ON g.id = p.group_id
            WHERE p.author_id = $1
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(author_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    /// Posts by authors the given user follows.
    pub async fn count_feed(&self, follower_id: Uuid) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM posts
            WHERE author_id IN (SELECT followee_id FROM follows WHERE follower_id = $1)
            "#,
        )
        .bind(follower_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn list_page_feed(
        &self,
        follower_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostWithMeta>> {
        let posts = sqlx::query_as::<_, PostWithMeta>(
            r#"
            SELECT p.id, p.text, p.created_at, p.image, p.author_id, u.username AS author_username,
                   p.group_id, g.title AS group_title, g.slug AS group_slug
            FROM posts p
            JOIN users u ON u.id = p.author_id
            LEFT JOIN groups g ON g.id = p.group_id
            WHERE p.author_id IN (SELECT followee_id FROM follows WHERE follower_id = $1)
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(follower_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    /// Get a post row by id.
    pub async fn get(&self, post_id: Uuid) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            "SELECT id, text, created_at, image, author_id, group_id FROM posts WHERE id = $1",
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(post)
    }

    /// Get a post with author/group metadata for display.
    pub async fn get_with_meta(&self, post_id: Uuid) -> Result<Option<PostWithMeta>> {
        let post = sqlx::query_as::<_, PostWithMeta>(
            r#"
            SELECT p.id, p.text, p.created_at, p.image, p.author_id, u.username AS author_username,
                   p.group_id, g.title AS group_title, g.slug AS group_slug
            FROM posts p
            JOIN users u ON u.id = p.author_id
            LEFT JOIN groups g ON g.id = p.group_id
            WHERE p.id = $1
            "#,
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(post)
    }

    /// Create a new post.
    pub async fn create(
        &self,
        author_id: Uuid,
        text: &str,
        group_id: Option<Uuid>,
        image: Option<&str>,
    ) -> Result<Post> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (id, text, author_id, group_id, image)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, text, created_at, image, author_id, group_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(text)
        .bind(author_id)
        .bind(group_id)
        .bind(image)
        .fetch_one(&self.pool)
        .await?;

        Ok(post)
    }

    /// Update text, group and (when a new upload came in) image.
    pub async fn update(
        &self,
        post_id: Uuid,
        text: &str,
        group_id: Option<Uuid>,
        image: Option<&str>,
    ) -> Result<Post> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET text = $2, group_id = $3, image = COALESCE($4, image)
            WHERE id = $1
            RETURNING id, text, created_at, image, author_id, group_id
            "#,
        )
        .bind(post_id)
        .bind(text)
        .bind(group_id)
        .bind(image)
        .fetch_one(&self.pool)
        .await?;

        Ok(post)
    }

    /// Delete a post; returns whether a row was removed.
    pub async fn delete(&self, post_id: Uuid) -> Result<bool> {
        let affected = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(post_id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }
}
