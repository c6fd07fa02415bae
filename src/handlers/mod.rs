/// HTTP handlers and the route table
///
/// Handlers fetch through the service layer, fold the result into small
/// display structs and render askama templates. Redirect-or-render is
/// decided here; data access stays in `services`.
pub mod auth;
pub mod comments;
pub mod follows;
pub mod media;
pub mod pages;
pub mod posts;

use actix_web::http::header;
use actix_web::{web, HttpResponse};
use askama::Template;

use crate::error::Result;
use crate::models::PostWithMeta;
use crate::pagination::Page;

/// Wire every route; `main` and the tests share this table.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(posts::index))
        .route("/group/{slug}/", web::get().to(posts::group_posts))
        .route("/profile/{username}/", web::get().to(posts::profile))
        .route(
            "/profile/{username}/follow/",
            web::get().to(follows::profile_follow),
        )
        .route(
            "/profile/{username}/unfollow/",
            web::get().to(follows::profile_unfollow),
        )
        .route("/follow/", web::get().to(follows::follow_index))
        .service(
            web::resource("/create/")
                .route(web::get().to(posts::post_create_form))
                .route(web::post().to(posts::post_create)),
        )
        .route("/posts/{id}/", web::get().to(posts::post_detail))
        .service(
            web::resource("/posts/{id}/edit/")
                .route(web::get().to(posts::post_edit_form))
                .route(web::post().to(posts::post_edit)),
        )
        .route("/posts/{id}/comment/", web::post().to(comments::add_comment))
        .service(
            web::resource("/auth/signup/")
                .route(web::get().to(auth::signup_form))
                .route(web::post().to(auth::signup)),
        )
        .service(
            web::resource("/auth/login/")
                .route(web::get().to(auth::login_form))
                .route(web::post().to(auth::login)),
        )
        .route("/auth/logout/", web::get().to(auth::logout))
        .service(
            web::resource("/auth/password_change/")
                .route(web::get().to(auth::password_change_form))
                .route(web::post().to(auth::password_change)),
        )
        .route(
            "/auth/password_change/done/",
            web::get().to(auth::password_change_done),
        )
        .service(
            web::resource("/auth/password_reset/")
                .route(web::get().to(auth::password_reset_form))
                .route(web::post().to(auth::password_reset)),
        )
        .route(
            "/auth/password_reset/done/",
            web::get().to(auth::password_reset_done),
        )
        .service(
            web::resource("/auth/reset/{token}/")
                .route(web::get().to(auth::password_reset_confirm_form))
                .route(web::post().to(auth::password_reset_confirm)),
        )
        .route("/auth/reset/done/", web::get().to(auth::password_reset_complete))
        .route("/about/author/", web::get().to(pages::about_author))
        .route("/about/tech/", web::get().to(pages::about_tech))
        .route("/media/{key:.*}", web::get().to(media::serve))
        .route("/health", web::get().to(pages::health))
        .default_service(web::route().to(pages::not_found));
}

/// A rendered HTML body with the right content type.
pub fn html(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

/// A 302 to a site-relative location.
pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location.to_string()))
        .finish()
}

/// Render a template into an HTML response.
pub fn render<T: Template>(template: &T) -> Result<HttpResponse> {
    Ok(html(template.render().map_err(crate::error::AppError::from)?))
}

/// A post prepared for display.
#[derive(Debug, Clone)]
pub struct PostCard {
    pub id: String,
    pub text: String,
    pub author_username: String,
    pub created: String,
    pub has_group: bool,
    pub group_title: String,
    pub group_slug: String,
    pub has_image: bool,
    pub image_url: String,
}

impl From<PostWithMeta> for PostCard {
    fn from(post: PostWithMeta) -> Self {
        let has_group = post.group_id.is_some();
        let has_image = post.image.is_some();
        PostCard {
            id: post.id.to_string(),
            text: post.text,
            author_username: post.author_username,
            created: post.created_at.format("%d %b %Y %H:%M").to_string(),
            group_title: post.group_title.unwrap_or_default(),
            group_slug: post.group_slug.unwrap_or_default(),
            has_group,
            image_url: post
                .image
                .map(|key| format!("/media/{}", key))
                .unwrap_or_default(),
            has_image,
        }
    }
}

/// One listing page plus the navigation state the templates need.
#[derive(Debug, Clone)]
pub struct PageView {
    pub items: Vec<PostCard>,
    pub number: i64,
    pub num_pages: i64,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous_number: i64,
    pub next_number: i64,
}

impl From<Page<PostWithMeta>> for PageView {
    fn from(page: Page<PostWithMeta>) -> Self {
        PageView {
            number: page.number,
            num_pages: page.num_pages,
            has_previous: page.has_previous(),
            has_next: page.has_next(),
            previous_number: page.previous_number(),
            next_number: page.next_number(),
            items: page.items.into_iter().map(PostCard::from).collect(),
        }
    }
}

/// Untrusted `?page=` parameter.
#[derive(Debug, serde::Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}
