/// Blog service library
///
/// A server-rendered blog/social-posting application: authored posts with
/// optional group and image, comments, follow edges between users, and
/// paginated feeds (site-wide, per-group, per-author, per-follow-graph).
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and template structs
/// - `models`: typed database rows
/// - `services`: business logic layer
/// - `db`: connection pool and embedded migrations
/// - `cache`: whole-page caching for the site-wide listing
/// - `middleware`: session extraction and authentication gating
/// - `security`: password hashing and session tokens
/// - `pagination`: fixed-size page math
/// - `error`: error types and HTML error responses
/// - `config`: configuration management
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod security;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
