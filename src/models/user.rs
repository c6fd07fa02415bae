use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Account identity.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim().to_string();
        if full.is_empty() {
            self.username.clone()
        } else {
            full
        }
    }
}
