/// Post handlers - listings, detail, authoring
use actix_multipart::form::bytes::Bytes as UploadedFile;
use actix_multipart::form::text::Text;
use actix_multipart::form::MultipartForm;
use actix_web::{web, HttpRequest, HttpResponse};
use askama::Template;
use sqlx::PgPool;
use uuid::Uuid;

use crate::cache::PageCache;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::middleware::{full_path, CurrentUser, MaybeUser};
use crate::models::{Group, PostWithMeta};
use crate::pagination::{self, Page, POSTS_PER_PAGE};
use crate::services::{AccountService, CommentService, FollowService, GroupService, PostService};

use super::{html, redirect, render, PageQuery, PageView, PostCard};

const INDEX_TITLE: &str = "Latest updates on the site";

fn build_page(posts: Vec<PostWithMeta>, total: i64, number: i64) -> Page<PostWithMeta> {
    Page {
        items: posts,
        number,
        num_pages: pagination::num_pages(total, POSTS_PER_PAGE),
        total,
    }
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    viewer: Option<String>,
    title: String,
    page: PageView,
    base_path: String,
}

/// Site-wide listing. The whole rendered page is cached by URL; a stale
/// page after a write is accepted until the TTL runs out.
pub async fn index(
    pool: web::Data<PgPool>,
    cache: Option<web::Data<PageCache>>,
    viewer: MaybeUser,
    query: web::Query<PageQuery>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let path_query = full_path(&req);
    if let Some(cache) = &cache {
        if let Some(body) = cache.get(&path_query).await {
            return Ok(html(body));
        }
    }

    let service = PostService::new((**pool).clone());
    let total = service.count_all().await?;
    let number = pagination::clamp_page(query.page.as_deref(), total, POSTS_PER_PAGE);
    let posts = service
        .list_page(POSTS_PER_PAGE, pagination::offset(number, POSTS_PER_PAGE))
        .await?;

    let body = IndexTemplate {
        viewer: viewer.0.map(|u| u.username),
        title: INDEX_TITLE.to_string(),
        page: PageView::from(build_page(posts, total, number)),
        base_path: "/".to_string(),
    }
    .render()
    .map_err(AppError::from)?;

    if let Some(cache) = &cache {
        cache.put(&path_query, &body).await;
    }

    Ok(html(body))
}

#[derive(Template)]
#[template(path = "group_list.html")]
struct GroupTemplate {
    viewer: Option<String>,
    group_title: String,
    group_description: String,
    page: PageView,
    base_path: String,
}

/// Posts of one group.
pub async fn group_posts(
    pool: web::Data<PgPool>,
    viewer: MaybeUser,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let slug = path.into_inner();
    let group = GroupService::new((**pool).clone())
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("group {}", slug)))?;

    let service = PostService::new((**pool).clone());
    let total = service.count_by_group(group.id).await?;
    let number = pagination::clamp_page(query.page.as_deref(), total, POSTS_PER_PAGE);
    let posts = service
        .list_page_by_group(group.id, POSTS_PER_PAGE, pagination::offset(number, POSTS_PER_PAGE))
        .await?;

    render(&GroupTemplate {
        viewer: viewer.0.map(|u| u.username),
        group_title: group.title,
        group_description: group.description,
        page: PageView::from(build_page(posts, total, number)),
        base_path: format!("/group/{}/", group.slug),
    })
}

#[derive(Template)]
#[template(path = "profile.html")]
struct ProfileTemplate {
    viewer: Option<String>,
    author_username: String,
    author_full_name: String,
    post_count: i64,
    following: bool,
    show_follow_button: bool,
    page: PageView,
    base_path: String,
}

/// An author's posts plus follow state for the viewer.
pub async fn profile(
    pool: web::Data<PgPool>,
    viewer: MaybeUser,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let username = path.into_inner();
    let author = AccountService::new((**pool).clone())
        .get_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {}", username)))?;

    let service = PostService::new((**pool).clone());
    let total = service.count_by_author(author.id).await?;
    let number = pagination::clamp_page(query.page.as_deref(), total, POSTS_PER_PAGE);
    let posts = service
        .list_page_by_author(author.id, POSTS_PER_PAGE, pagination::offset(number, POSTS_PER_PAGE))
        .await?;

    let following = match &viewer.0 {
        Some(user) => {
            FollowService::new((**pool).clone())
                .is_following(user.id, author.id)
                .await?
        }
        None => false,
    };
    let show_follow_button = viewer.0.as_ref().map(|u| u.id != author.id).unwrap_or(true);

    render(&ProfileTemplate {
        viewer: viewer.0.map(|u| u.username),
        author_username: author.username.clone(),
        author_full_name: author.full_name(),
        post_count: total,
        following,
        show_follow_button,
        page: PageView::from(build_page(posts, total, number)),
        base_path: format!("/profile/{}/", author.username),
    })
}

struct CommentView {
    author_username: String,
    text: String,
    created: String,
}

#[derive(Template)]
#[template(path = "post_detail.html")]
struct PostDetailTemplate {
    viewer: Option<String>,
    post: PostCard,
    preview: String,
    post_count: i64,
    is_author: bool,
    comments: Vec<CommentView>,
}

pub(crate) fn parse_post_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(format!("post {}", raw)))
}

/// One post with its comments.
pub async fn post_detail(
    pool: web::Data<PgPool>,
    viewer: MaybeUser,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let post_id = parse_post_id(&path)?;
    let service = PostService::new((**pool).clone());
    let post = service
        .get_with_meta(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post {}", post_id)))?;

    let post_count = service.count_by_author(post.author_id).await?;
    let comments = CommentService::new((**pool).clone())
        .list_for_post(post_id)
        .await?
        .into_iter()
        .map(|c| CommentView {
            author_username: c.author_username,
            text: c.text,
            created: c.created_at.format("%d %b %Y %H:%M").to_string(),
        })
        .collect();

    let is_author = viewer
        .0
        .as_ref()
        .map(|u| u.id == post.author_id)
        .unwrap_or(false);
    let preview = post.preview();

    render(&PostDetailTemplate {
        viewer: viewer.0.map(|u| u.username),
        post: PostCard::from(post),
        preview,
        post_count,
        is_author,
        comments,
    })
}

// ---------------------------------------------------------------------
// Authoring
// ---------------------------------------------------------------------

/// Multipart payload of the create/edit form.
#[derive(Debug, MultipartForm)]
pub struct PostUpload {
    pub text: Option<Text<String>>,
    pub group: Option<Text<String>>,
    pub image: Option<UploadedFile>,
}

struct GroupOption {
    id: String,
    title: String,
}

#[derive(Template)]
#[template(path = "create_post.html")]
struct PostFormTemplate {
    viewer: Option<String>,
    is_edit: bool,
    action: String,
    errors: Vec<String>,
    text: String,
    selected_group: String,
    groups: Vec<GroupOption>,
}

struct PostFormData {
    text: String,
    group_id: Option<Uuid>,
    image: Option<(String, actix_web::web::Bytes)>,
}

const IMAGE_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "gif", "webp"];

/// Validate the submitted form without touching the filesystem yet.
async fn validate_post_form(
    form: &PostUpload,
    groups: &GroupService,
) -> Result<(PostFormData, Vec<String>)> {
    let mut errors = Vec::new();

    let text = form
        .text
        .as_ref()
        .map(|t| t.0.trim().to_string())
        .unwrap_or_default();
    if text.is_empty() {
        errors.push("Post text is required.".to_string());
    }

    let raw_group = form
        .group
        .as_ref()
        .map(|t| t.0.trim().to_string())
        .filter(|s| !s.is_empty());
    let group_id = match raw_group.as_deref().map(Uuid::parse_str) {
        None => None,
        Some(Ok(id)) => {
            if groups.get_by_id(id).await?.is_some() {
                Some(id)
            } else {
                errors.push("Select a valid group.".to_string());
                None
            }
        }
        Some(Err(_)) => {
            errors.push("Select a valid group.".to_string());
            None
        }
    };

    let image = match &form.image {
        Some(upload) if !upload.data.is_empty() => {
            let extension = upload
                .file_name
                .as_deref()
                .and_then(|name| name.rsplit('.').next())
                .map(|ext| ext.to_ascii_lowercase());
            match extension {
                Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str()) => {
                    Some((ext, upload.data.clone()))
                }
                _ => {
                    errors.push("Upload a valid image (jpeg, png, gif or webp).".to_string());
                    None
                }
            }
        }
        _ => None,
    };

    Ok((
        PostFormData {
            text,
            group_id,
            image,
        },
        errors,
    ))
}

/// Write an uploaded image under the media root, returning its key.
async fn store_image(media_root: &str, ext: &str, data: &[u8]) -> Result<String> {
    let key = format!("posts/{}.{}", Uuid::new_v4(), ext);
    let dir = std::path::Path::new(media_root).join("posts");
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| AppError::Internal(format!("media dir creation failed: {}", e)))?;
    tokio::fs::write(std::path::Path::new(media_root).join(&key), data)
        .await
        .map_err(|e| AppError::Internal(format!("image write failed: {}", e)))?;
    Ok(key)
}

async fn group_options(groups: &GroupService) -> Result<Vec<GroupOption>> {
    Ok(groups
        .list()
        .await?
        .into_iter()
        .map(|g: Group| GroupOption {
            id: g.id.to_string(),
            title: g.title,
        })
        .collect())
}

/// Empty create form.
pub async fn post_create_form(
    pool: web::Data<PgPool>,
    user: CurrentUser,
) -> Result<HttpResponse> {
    let groups = GroupService::new((**pool).clone());
    render(&PostFormTemplate {
        viewer: Some(user.username),
        is_edit: false,
        action: "/create/".to_string(),
        errors: Vec::new(),
        text: String::new(),
        selected_group: String::new(),
        groups: group_options(&groups).await?,
    })
}

/// Create a post; on success the author lands on their profile.
pub async fn post_create(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    user: CurrentUser,
    MultipartForm(form): MultipartForm<PostUpload>,
) -> Result<HttpResponse> {
    let groups = GroupService::new((**pool).clone());
    let (data, errors) = validate_post_form(&form, &groups).await?;

    if !errors.is_empty() {
        return render(&PostFormTemplate {
            viewer: Some(user.username),
            is_edit: false,
            action: "/create/".to_string(),
            errors,
            text: data.text,
            selected_group: data.group_id.map(|id| id.to_string()).unwrap_or_default(),
            groups: group_options(&groups).await?,
        });
    }

    let image_key = match &data.image {
        Some((ext, bytes)) => Some(store_image(&config.media.root, ext, bytes).await?),
        None => None,
    };

    PostService::new((**pool).clone())
        .create(user.id, &data.text, data.group_id, image_key.as_deref())
        .await?;

    Ok(redirect(&format!("/profile/{}/", user.username)))
}

/// Edit form, prefilled; non-authors are sent to the read-only view.
pub async fn post_edit_form(
    pool: web::Data<PgPool>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let post_id = parse_post_id(&path)?;
    let service = PostService::new((**pool).clone());
    let post = service
        .get(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post {}", post_id)))?;

    if post.author_id != user.id {
        return Ok(redirect(&format!("/posts/{}/", post_id)));
    }

    let groups = GroupService::new((**pool).clone());
    render(&PostFormTemplate {
        viewer: Some(user.username),
        is_edit: true,
        action: format!("/posts/{}/edit/", post_id),
        errors: Vec::new(),
        text: post.text,
        selected_group: post.group_id.map(|id| id.to_string()).unwrap_or_default(),
        groups: group_options(&groups).await?,
    })
}

/// Apply an edit; on success the author lands on the detail page.
pub async fn post_edit(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    user: CurrentUser,
    path: web::Path<String>,
    MultipartForm(form): MultipartForm<PostUpload>,
) -> Result<HttpResponse> {
    let post_id = parse_post_id(&path)?;
    let service = PostService::new((**pool).clone());
    let post = service
        .get(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post {}", post_id)))?;

    if post.author_id != user.id {
        return Ok(redirect(&format!("/posts/{}/", post_id)));
    }

    let groups = GroupService::new((**pool).clone());
    let (data, errors) = validate_post_form(&form, &groups).await?;

    if !errors.is_empty() {
        return render(&PostFormTemplate {
            viewer: Some(user.username),
            is_edit: true,
            action: format!("/posts/{}/edit/", post_id),
            errors,
            text: data.text,
            selected_group: data.group_id.map(|id| id.to_string()).unwrap_or_default(),
            groups: group_options(&groups).await?,
        });
    }

    let image_key = match &data.image {
        Some((ext, bytes)) => Some(store_image(&config.media.root, ext, bytes).await?),
        None => None,
    };

    service
        .update(post_id, &data.text, data.group_id, image_key.as_deref())
        .await?;

    Ok(redirect(&format!("/posts/{}/", post_id)))
}
