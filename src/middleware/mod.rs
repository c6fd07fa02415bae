/// Session extraction and authentication gating
///
/// `CurrentUser` is the authentication gate: extracting it from an
/// anonymous request short-circuits the handler with a redirect to the
/// login form carrying the original path in `next`. `MaybeUser` never
/// fails and is for pages that only vary by login state.
use actix_web::dev::Payload;
use actix_web::{web, Error, FromRequest, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::config::Config;
use crate::error::AppError;
use crate::security::session;

/// Identity recovered from a valid session cookie.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
}

/// Login state for pages open to anonymous visitors.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<CurrentUser>);

/// Request path plus query string, as sent by the client.
pub fn full_path(req: &HttpRequest) -> String {
    req.uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string())
}

/// Login URL carrying the return path. Slashes stay readable so the
/// target looks like `/auth/login/?next=/create/`.
pub fn login_redirect_target(next: &str) -> String {
    let encoded = urlencoding::encode(next).replace("%2F", "/");
    format!("/auth/login/?next={}", encoded)
}

fn session_user(req: &HttpRequest) -> Option<CurrentUser> {
    let config = req.app_data::<web::Data<Config>>()?;
    let cookie = req.cookie(session::SESSION_COOKIE)?;
    let claims = session::verify_session_token(&config.auth.session_secret, cookie.value())?;
    let id = Uuid::parse_str(&claims.sub).ok()?;
    Some(CurrentUser {
        id,
        username: claims.username,
    })
}

impl FromRequest for CurrentUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(match session_user(req) {
            Some(user) => Ok(user),
            None => Err(AppError::LoginRequired {
                next: full_path(req),
            }
            .into()),
        })
    }
}

impl FromRequest for MaybeUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(MaybeUser(session_user(req))))
    }
}
