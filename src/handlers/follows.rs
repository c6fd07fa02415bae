/// Follow handlers - the follow-graph feed and edge management
use actix_web::{web, HttpResponse};
use askama::Template;
use sqlx::PgPool;

use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::pagination::{self, Page, POSTS_PER_PAGE};
use crate::services::{AccountService, FollowService, PostService};

use super::{redirect, render, PageQuery, PageView};

#[derive(Template)]
#[template(path = "follow.html")]
struct FollowFeedTemplate {
    viewer: Option<String>,
    page: PageView,
    base_path: String,
}

/// Posts authored by users the requester follows.
pub async fn follow_index(
    pool: web::Data<PgPool>,
    user: CurrentUser,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let service = PostService::new((**pool).clone());
    let total = service.count_feed(user.id).await?;
    let number = pagination::clamp_page(query.page.as_deref(), total, POSTS_PER_PAGE);
    let posts = service
        .list_page_feed(user.id, POSTS_PER_PAGE, pagination::offset(number, POSTS_PER_PAGE))
        .await?;

    render(&FollowFeedTemplate {
        viewer: Some(user.username),
        page: PageView::from(Page {
            items: posts,
            number,
            num_pages: pagination::num_pages(total, POSTS_PER_PAGE),
            total,
        }),
        base_path: "/follow/".to_string(),
    })
}

async fn target_author(
    pool: &PgPool,
    username: &str,
) -> Result<crate::models::User> {
    AccountService::new(pool.clone())
        .get_by_username(username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {}", username)))
}

/// Start following an author. Re-follows and self-follows are no-ops.
pub async fn profile_follow(
    pool: web::Data<PgPool>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let author = target_author(&pool, &path).await?;
    FollowService::new((**pool).clone())
        .follow(user.id, author.id)
        .await?;
    Ok(redirect(&format!("/profile/{}/", author.username)))
}

/// Stop following an author; missing edges are a no-op.
pub async fn profile_unfollow(
    pool: web::Data<PgPool>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let author = target_author(&pool, &path).await?;
    FollowService::new((**pool).clone())
        .unfollow(user.id, author.id)
        .await?;
    Ok(redirect(&format!("/profile/{}/", author.username)))
}
