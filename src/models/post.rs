use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// How many characters of the text the short form keeps.
const SNIPPET_CHARS: usize = 15;
/// How many characters the detail-page preview keeps.
const PREVIEW_CHARS: usize = 30;

/// Authored content row.
#[derive(Debug, Clone, FromRow)]
pub struct Post {
    pub id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub image: Option<String>,
    pub author_id: Uuid,
    pub group_id: Option<Uuid>,
}

/// A post joined with its author and (optional) group for display.
#[derive(Debug, Clone, FromRow)]
pub struct PostWithMeta {
    pub id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub image: Option<String>,
    pub author_id: Uuid,
    pub author_username: String,
    pub group_id: Option<Uuid>,
    pub group_title: Option<String>,
    pub group_slug: Option<String>,
}

/// Char-boundary-safe prefix of a string.
fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

impl Post {
    /// Short identifying snippet of the text.
    pub fn snippet(&self) -> String {
        truncate_chars(&self.text, SNIPPET_CHARS)
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.snippet())
    }
}

impl PostWithMeta {
    /// Preview shown on the detail page.
    pub fn preview(&self) -> String {
        truncate_chars(&self.text, PREVIEW_CHARS)
    }
}
