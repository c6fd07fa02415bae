//! Authentication gating over the HTTP surface.
//!
//! These tests never reach the database: the gate rejects anonymous
//! requests before any query runs, so a lazy (never-connected) pool is
//! enough and the suite passes with no infrastructure at all.
mod common;

use actix_web::http::header;
use actix_web::{test, web, App};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use blog_service::handlers;
use blog_service::models::User;

fn lazy_pool() -> PgPool {
    PgPoolOptions::new()
        .connect_lazy("postgresql://localhost/never-connected")
        .expect("lazy pool")
}

fn location(resp: &actix_web::dev::ServiceResponse) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

macro_rules! gating_app {
    () => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(common::test_config()))
                .app_data(web::Data::new(lazy_pool()))
                .configure(handlers::configure),
        )
        .await
    };
}

#[actix_web::test]
async fn anonymous_create_redirects_to_login_with_next() {
    let app = gating_app!();
    let req = test::TestRequest::get().uri("/create/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 302);
    assert_eq!(location(&resp), "/auth/login/?next=/create/");
}

#[actix_web::test]
async fn anonymous_create_submission_is_rejected_before_any_write() {
    let app = gating_app!();
    let (content_type, body) = common::multipart_form(&[("text", "not stored")]);
    let req = test::TestRequest::post()
        .uri("/create/")
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 302);
    assert_eq!(location(&resp), "/auth/login/?next=/create/");
}

#[actix_web::test]
async fn anonymous_comment_redirects_to_login_with_next() {
    let app = gating_app!();
    let post_id = "0b8e8e2e-90ec-4a6b-b6b6-2f6f4b2d8a11";
    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/comment/", post_id))
        .set_form([("text", "never stored")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 302);
    assert_eq!(
        location(&resp),
        format!("/auth/login/?next=/posts/{}/comment/", post_id)
    );
}

#[actix_web::test]
async fn anonymous_follow_routes_redirect_to_login() {
    let app = gating_app!();
    for path in [
        "/follow/",
        "/profile/someone/follow/",
        "/profile/someone/unfollow/",
        "/auth/password_change/",
    ] {
        let req = test::TestRequest::get().uri(path).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 302, "{} should be gated", path);
        assert_eq!(location(&resp), format!("/auth/login/?next={}", path));
    }
}

#[actix_web::test]
async fn garbage_session_cookie_is_anonymous() {
    let app = gating_app!();
    let req = test::TestRequest::get()
        .uri("/create/")
        .cookie(actix_web::cookie::Cookie::new("sessionid", "not-a-token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 302);
    assert_eq!(location(&resp), "/auth/login/?next=/create/");
}

#[actix_web::test]
async fn valid_session_cookie_passes_the_gate() {
    let config = common::test_config();
    let user = User {
        id: uuid::Uuid::new_v4(),
        username: "walker".to_string(),
        first_name: String::new(),
        last_name: String::new(),
        email: String::new(),
        password_hash: String::new(),
        created_at: chrono::Utc::now(),
    };
    let cookie = common::session_cookie(&config, &user);

    let app = gating_app!();
    // The password-change form renders without touching the database.
    let req = test::TestRequest::get()
        .uri("/auth/password_change/")
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
}

#[actix_web::test]
async fn public_pages_are_open_and_unknown_paths_hit_the_custom_page() {
    let app = gating_app!();

    for path in ["/about/author/", "/about/tech/", "/auth/login/", "/auth/signup/"] {
        let req = test::TestRequest::get().uri(path).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200, "{} should be public", path);
    }

    let req = test::TestRequest::get().uri("/unexisting_page/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
    let body = test::read_body(resp).await;
    let body = String::from_utf8(body.to_vec()).expect("utf8 body");
    assert!(body.contains("Page not found"));
}

#[actix_web::test]
async fn login_page_carries_next_into_the_form() {
    let app = gating_app!();
    let req = test::TestRequest::get()
        .uri("/auth/login/?next=/create/")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body = test::read_body(resp).await;
    let body = String::from_utf8(body.to_vec()).expect("utf8 body");
    assert!(body.contains(r#"name="next" value="/create/""#));
}

#[actix_web::test]
async fn logout_clears_the_session_cookie() {
    let app = gating_app!();
    let req = test::TestRequest::get().uri("/auth/logout/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let set_cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(set_cookie.starts_with("sessionid="));
    assert!(set_cookie.contains("Max-Age=0"));
}
