use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Topical category a post may belong to.
#[derive(Debug, Clone, FromRow)]
pub struct Group {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}
