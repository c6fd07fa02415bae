/// Auth handlers - registration, login, logout, password lifecycle
use actix_web::cookie::{time, Cookie};
use actix_web::http::header;
use actix_web::{web, HttpResponse};
use askama::Template;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::middleware::{CurrentUser, MaybeUser};
use crate::security::{password, session};
use crate::services::{AccountService, NewAccount};

use super::{redirect, render};

/// Characters the original account system accepts in usernames.
fn valid_username_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_')
}

fn validation_messages(errors: &validator::ValidationErrors) -> Vec<String> {
    let mut messages = Vec::new();
    for (_, field_errors) in errors.field_errors() {
        for error in field_errors {
            match &error.message {
                Some(message) => messages.push(message.to_string()),
                None => messages.push(format!("Invalid value ({}).", error.code)),
            }
        }
    }
    messages
}

/// Only site-relative paths are honored as a post-login destination.
fn sanitize_next(next: Option<&str>) -> String {
    match next {
        Some(n) if n.starts_with('/') && !n.starts_with("//") => n.to_string(),
        _ => "/".to_string(),
    }
}

// ---------------------------------------------------------------------
// Signup
// ---------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct SignupForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 150, message = "Enter a username."))]
    pub username: String,
    #[serde(default)]
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

#[derive(Template)]
#[template(path = "signup.html")]
struct SignupTemplate {
    viewer: Option<String>,
    errors: Vec<String>,
    first_name: String,
    last_name: String,
    username: String,
    email: String,
}

pub async fn signup_form(viewer: MaybeUser) -> Result<HttpResponse> {
    render(&SignupTemplate {
        viewer: viewer.0.map(|u| u.username),
        errors: Vec::new(),
        first_name: String::new(),
        last_name: String::new(),
        username: String::new(),
        email: String::new(),
    })
}

/// Register an account; success lands on the site-wide listing.
pub async fn signup(
    pool: web::Data<PgPool>,
    viewer: MaybeUser,
    form: web::Form<SignupForm>,
) -> Result<HttpResponse> {
    let form = form.into_inner();
    let service = AccountService::new((**pool).clone());

    let mut errors = form
        .validate()
        .err()
        .map(|e| validation_messages(&e))
        .unwrap_or_default();

    if !form.username.is_empty() && !form.username.chars().all(valid_username_char) {
        errors.push(
            "Enter a valid username: letters, digits and @/./+/-/_ only.".to_string(),
        );
    }
    if let Err(message) = password::validate_password_strength(&form.password1) {
        errors.push(message);
    }
    if form.password1 != form.password2 {
        errors.push("The two password fields didn't match.".to_string());
    }
    if errors.is_empty() && service.get_by_username(&form.username).await?.is_some() {
        errors.push("A user with that username already exists.".to_string());
    }

    if errors.is_empty() {
        match service
            .create_account(NewAccount {
                first_name: form.first_name.clone(),
                last_name: form.last_name.clone(),
                username: form.username.clone(),
                email: form.email.clone(),
                password: form.password1.clone(),
            })
            .await
        {
            Ok(_) => return Ok(redirect("/")),
            // Lost the uniqueness race; surface it like any field error.
            Err(AppError::Validation(message)) => errors.push(message),
            Err(other) => return Err(other),
        }
    }

    render(&SignupTemplate {
        viewer: viewer.0.map(|u| u.username),
        errors,
        first_name: form.first_name,
        last_name: form.last_name,
        username: form.username,
        email: form.email,
    })
}

// ---------------------------------------------------------------------
// Login / logout
// ---------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub next: Option<String>,
}

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    viewer: Option<String>,
    failed: bool,
    username: String,
    next: String,
}

pub async fn login_form(viewer: MaybeUser, query: web::Query<NextQuery>) -> Result<HttpResponse> {
    render(&LoginTemplate {
        viewer: viewer.0.map(|u| u.username),
        failed: false,
        username: String::new(),
        next: query.next.clone().unwrap_or_default(),
    })
}

/// Check credentials, set the session cookie and return to `next`.
pub async fn login(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    viewer: MaybeUser,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse> {
    let form = form.into_inner();
    let service = AccountService::new((**pool).clone());

    match service.authenticate(&form.username, &form.password).await? {
        Some(user) => {
            let token = session::issue_session_token(
                &config.auth.session_secret,
                user.id,
                &user.username,
                config.auth.session_ttl_days,
            )?;
            let cookie = Cookie::build(session::SESSION_COOKIE, token)
                .path("/")
                .http_only(true)
                .max_age(time::Duration::days(config.auth.session_ttl_days))
                .finish();
            Ok(HttpResponse::Found()
                .cookie(cookie)
                .insert_header((header::LOCATION, sanitize_next(form.next.as_deref())))
                .finish())
        }
        None => render(&LoginTemplate {
            viewer: viewer.0.map(|u| u.username),
            failed: true,
            username: form.username,
            next: form.next.unwrap_or_default(),
        }),
    }
}

#[derive(Template)]
#[template(path = "logged_out.html")]
struct LoggedOutTemplate {
    viewer: Option<String>,
}

/// Drop the session cookie and confirm the logout.
pub async fn logout() -> Result<HttpResponse> {
    let mut cookie = Cookie::new(session::SESSION_COOKIE, "");
    cookie.set_path("/");
    cookie.make_removal();

    let body = LoggedOutTemplate { viewer: None }
        .render()
        .map_err(AppError::from)?;
    Ok(HttpResponse::Ok()
        .cookie(cookie)
        .content_type("text/html; charset=utf-8")
        .body(body))
}

// ---------------------------------------------------------------------
// Password change
// ---------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct PasswordChangeForm {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password1: String,
    #[serde(default)]
    pub new_password2: String,
}

#[derive(Template)]
#[template(path = "password_change_form.html")]
struct PasswordChangeTemplate {
    viewer: Option<String>,
    errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "password_change_done.html")]
struct PasswordChangeDoneTemplate {
    viewer: Option<String>,
}

pub async fn password_change_form(user: CurrentUser) -> Result<HttpResponse> {
    render(&PasswordChangeTemplate {
        viewer: Some(user.username),
        errors: Vec::new(),
    })
}

pub async fn password_change(
    pool: web::Data<PgPool>,
    user: CurrentUser,
    form: web::Form<PasswordChangeForm>,
) -> Result<HttpResponse> {
    let service = AccountService::new((**pool).clone());
    let account = service
        .get_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {}", user.username)))?;

    let mut errors = Vec::new();
    if !password::verify_password(&form.old_password, &account.password_hash)? {
        errors.push("Your old password was entered incorrectly.".to_string());
    }
    if let Err(message) = password::validate_password_strength(&form.new_password1) {
        errors.push(message);
    }
    if form.new_password1 != form.new_password2 {
        errors.push("The two password fields didn't match.".to_string());
    }

    if !errors.is_empty() {
        return render(&PasswordChangeTemplate {
            viewer: Some(user.username),
            errors,
        });
    }

    service.set_password(user.id, &form.new_password1).await?;
    Ok(redirect("/auth/password_change/done/"))
}

pub async fn password_change_done(user: CurrentUser) -> Result<HttpResponse> {
    render(&PasswordChangeDoneTemplate {
        viewer: Some(user.username),
    })
}

// ---------------------------------------------------------------------
// Password reset
// ---------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct PasswordResetForm {
    #[serde(default)]
    pub email: String,
}

#[derive(Template)]
#[template(path = "password_reset_form.html")]
struct PasswordResetTemplate {
    viewer: Option<String>,
}

#[derive(Template)]
#[template(path = "password_reset_done.html")]
struct PasswordResetDoneTemplate {
    viewer: Option<String>,
}

#[derive(Template)]
#[template(path = "password_reset_confirm.html")]
struct PasswordResetConfirmTemplate {
    viewer: Option<String>,
    valid_link: bool,
    errors: Vec<String>,
    action: String,
}

#[derive(Template)]
#[template(path = "password_reset_complete.html")]
struct PasswordResetCompleteTemplate {
    viewer: Option<String>,
}

pub async fn password_reset_form(viewer: MaybeUser) -> Result<HttpResponse> {
    render(&PasswordResetTemplate {
        viewer: viewer.0.map(|u| u.username),
    })
}

/// Issue a reset token. Whether the email matched an account is not
/// revealed; the link goes to the log in place of an email transport.
pub async fn password_reset(
    pool: web::Data<PgPool>,
    form: web::Form<PasswordResetForm>,
) -> Result<HttpResponse> {
    let service = AccountService::new((**pool).clone());
    if let Some((user, token)) = service.create_reset_token(form.email.trim()).await? {
        tracing::info!(
            username = %user.username,
            "password reset requested, link: /auth/reset/{}/",
            token
        );
    }
    Ok(redirect("/auth/password_reset/done/"))
}

pub async fn password_reset_done(viewer: MaybeUser) -> Result<HttpResponse> {
    render(&PasswordResetDoneTemplate {
        viewer: viewer.0.map(|u| u.username),
    })
}

pub async fn password_reset_confirm_form(
    pool: web::Data<PgPool>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let raw = path.into_inner();
    let service = AccountService::new((**pool).clone());
    let valid_link = match Uuid::parse_str(&raw) {
        Ok(token) => service.get_reset_token_user(token).await?.is_some(),
        Err(_) => false,
    };

    render(&PasswordResetConfirmTemplate {
        viewer: None,
        valid_link,
        errors: Vec::new(),
        action: format!("/auth/reset/{}/", raw),
    })
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetConfirmForm {
    #[serde(default)]
    pub new_password1: String,
    #[serde(default)]
    pub new_password2: String,
}

pub async fn password_reset_confirm(
    pool: web::Data<PgPool>,
    path: web::Path<String>,
    form: web::Form<PasswordResetConfirmForm>,
) -> Result<HttpResponse> {
    let raw = path.into_inner();
    let action = format!("/auth/reset/{}/", raw);
    let service = AccountService::new((**pool).clone());

    let Ok(token) = Uuid::parse_str(&raw) else {
        return render(&PasswordResetConfirmTemplate {
            viewer: None,
            valid_link: false,
            errors: Vec::new(),
            action,
        });
    };

    let mut errors = Vec::new();
    if let Err(message) = password::validate_password_strength(&form.new_password1) {
        errors.push(message);
    }
    if form.new_password1 != form.new_password2 {
        errors.push("The two password fields didn't match.".to_string());
    }
    if !errors.is_empty() {
        return render(&PasswordResetConfirmTemplate {
            viewer: None,
            valid_link: true,
            errors,
            action,
        });
    }

    if service.redeem_reset_token(token, &form.new_password1).await? {
        Ok(redirect("/auth/reset/done/"))
    } else {
        render(&PasswordResetConfirmTemplate {
            viewer: None,
            valid_link: false,
            errors: Vec::new(),
            action,
        })
    }
}

pub async fn password_reset_complete(viewer: MaybeUser) -> Result<HttpResponse> {
    render(&PasswordResetCompleteTemplate {
        viewer: viewer.0.map(|u| u.username),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_must_be_site_relative() {
        assert_eq!(sanitize_next(Some("/create/")), "/create/");
        assert_eq!(sanitize_next(Some("https://evil.example/")), "/");
        assert_eq!(sanitize_next(Some("//evil.example/")), "/");
        assert_eq!(sanitize_next(Some("relative")), "/");
        assert_eq!(sanitize_next(None), "/");
    }

    #[test]
    fn username_charset() {
        assert!("john.doe+test@home_1-x".chars().all(valid_username_char));
        assert!(!"john doe".chars().all(valid_username_char));
        assert!(!"john!".chars().all(valid_username_char));
    }
}
