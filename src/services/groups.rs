/// Group service - topical categories, managed administratively
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::Group;

pub struct GroupService {
    pool: PgPool,
}

impl GroupService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM groups WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(group)
    }

    pub async fn get_by_id(&self, group_id: Uuid) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM groups WHERE id = $1",
        )
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(group)
    }

    /// All groups, for the post form's dropdown.
    pub async fn list(&self) -> Result<Vec<Group>> {
        let groups = sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM groups ORDER BY title",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(groups)
    }

    pub async fn create(&self, title: &str, slug: &str, description: &str) -> Result<Group> {
        let group = sqlx::query_as::<_, Group>(
            r#"
            INSERT INTO groups (id, title, slug, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, slug, description
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(slug)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;
        Ok(group)
    }

    /// Delete a group; its posts stay, detached from any group.
    pub async fn delete(&self, group_id: Uuid) -> Result<bool> {
        let affected = sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(group_id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }
}
