//! Shared bootstrap for the integration suites.
//!
//! Database-backed tests opt in through `TEST_DATABASE_URL` (and the page
//! cache test additionally through `TEST_REDIS_URL`). When the variable is
//! unset the suite logs a skip and passes, so `cargo test` works without
//! live infrastructure.
#![allow(dead_code)]

use actix_web::cookie::Cookie;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use blog_service::models::User;
use blog_service::security::session;
use blog_service::services::{AccountService, NewAccount};
use blog_service::{db, Config};

pub const TEST_PASSWORD: &str = "correct horse battery";

/// Connect to the test database and migrate it, or skip the test.
pub async fn try_pool() -> Option<PgPool> {
    let url = match std::env::var("TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("TEST_DATABASE_URL not set, skipping database-backed test");
            return None;
        }
    };
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("connect to test database");
    db::MIGRATOR.run(&pool).await.expect("run migrations");
    Some(pool)
}

pub fn test_config() -> Config {
    Config::from_env().expect("load config")
}

/// Unique suffix so parallel tests never collide on usernames or slugs.
pub fn unique(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

pub async fn create_user(pool: &PgPool, prefix: &str) -> User {
    AccountService::new(pool.clone())
        .create_account(NewAccount {
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            username: unique(prefix),
            email: format!("{}@example.com", unique(prefix)),
            password: TEST_PASSWORD.to_string(),
        })
        .await
        .expect("create test user")
}

/// A ready-made session cookie for a user, bypassing the login form.
pub fn session_cookie(config: &Config, user: &User) -> Cookie<'static> {
    let token = session::issue_session_token(
        &config.auth.session_secret,
        user.id,
        &user.username,
        1,
    )
    .expect("issue session token");
    Cookie::build(session::SESSION_COOKIE, token).path("/").finish()
}

/// Hand-rolled multipart body for the post form.
/// Returns (content-type header value, body).
pub fn multipart_form(fields: &[(&str, &str)]) -> (String, String) {
    let boundary = "test-boundary-7MA4YWxkTrZu0gW";
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
            boundary, name, value
        ));
    }
    body.push_str(&format!("--{}--\r\n", boundary));
    (
        format!("multipart/form-data; boundary={}", boundary),
        body,
    )
}

/// Multipart body carrying text fields plus one uploaded file.
pub fn multipart_with_file(
    fields: &[(&str, &str)],
    file_field: &str,
    file_name: &str,
    content_type: &str,
    data: &[u8],
) -> (String, Vec<u8>) {
    let boundary = "test-boundary-7MA4YWxkTrZu0gW";
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                boundary, name, value
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            boundary, file_field, file_name, content_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    (
        format!("multipart/form-data; boundary={}", boundary),
        body,
    )
}

pub async fn follow_edge_count(pool: &PgPool, follower: Uuid, followee: Uuid) -> i64 {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM follows WHERE follower_id = $1 AND followee_id = $2",
    )
    .bind(follower)
    .bind(followee)
    .fetch_one(pool)
    .await
    .expect("count follows");
    count
}
