//! Pagination boundaries and listing membership against a live database.
//!
//! Requires TEST_DATABASE_URL; skips (and passes) otherwise. Listings are
//! asserted per author and per group so parallel tests sharing the
//! database cannot interfere.
mod common;

use blog_service::pagination::{self, POSTS_PER_PAGE};
use blog_service::services::{GroupService, PostService};

#[tokio::test]
async fn first_page_is_full_and_last_page_holds_the_remainder() {
    let Some(pool) = common::try_pool().await else {
        return;
    };
    let author = common::create_user(&pool, "paginated").await;
    let posts = PostService::new(pool.clone());

    let total_posts = POSTS_PER_PAGE + 3;
    for i in 0..total_posts {
        posts
            .create(author.id, &format!("post number {}", i), None, None)
            .await
            .unwrap();
    }

    let total = posts.count_by_author(author.id).await.unwrap();
    assert_eq!(total, total_posts);
    assert_eq!(pagination::num_pages(total, POSTS_PER_PAGE), 2);

    let page_one = posts
        .list_page_by_author(author.id, POSTS_PER_PAGE, 0)
        .await
        .unwrap();
    assert_eq!(page_one.len(), POSTS_PER_PAGE as usize);

    let page_two = posts
        .list_page_by_author(author.id, POSTS_PER_PAGE, POSTS_PER_PAGE)
        .await
        .unwrap();
    assert_eq!(page_two.len(), 3);

    // Newest first across the boundary.
    assert_eq!(page_one[0].text, format!("post number {}", total_posts - 1));
    assert_eq!(page_two[2].text, "post number 0");
}

#[tokio::test]
async fn group_listing_tracks_the_post_group_field() {
    let Some(pool) = common::try_pool().await else {
        return;
    };
    let author = common::create_user(&pool, "mover").await;
    let groups = GroupService::new(pool.clone());
    let group_a = groups
        .create("Group A", &common::unique("group-a"), "first group")
        .await
        .unwrap();
    let group_b = groups
        .create("Group B", &common::unique("group-b"), "second group")
        .await
        .unwrap();

    let posts = PostService::new(pool.clone());
    let post = posts
        .create(author.id, "migrating post", Some(group_a.id), None)
        .await
        .unwrap();

    let in_a = posts.list_page_by_group(group_a.id, 10, 0).await.unwrap();
    assert!(in_a.iter().any(|p| p.id == post.id));
    assert!(posts.list_page_by_group(group_b.id, 10, 0).await.unwrap().is_empty());

    // Editing the group moves the post between listings.
    posts
        .update(post.id, "migrating post", Some(group_b.id), None)
        .await
        .unwrap();

    assert!(posts.list_page_by_group(group_a.id, 10, 0).await.unwrap().is_empty());
    let in_b = posts.list_page_by_group(group_b.id, 10, 0).await.unwrap();
    assert!(in_b.iter().any(|p| p.id == post.id));
}

#[tokio::test]
async fn deleting_a_group_detaches_but_keeps_its_posts() {
    let Some(pool) = common::try_pool().await else {
        return;
    };
    let author = common::create_user(&pool, "survivor").await;
    let groups = GroupService::new(pool.clone());
    let group = groups
        .create("Doomed group", &common::unique("doomed"), "about to go")
        .await
        .unwrap();

    let posts = PostService::new(pool.clone());
    let post = posts
        .create(author.id, "outlives its group", Some(group.id), None)
        .await
        .unwrap();

    assert!(groups.delete(group.id).await.unwrap());

    let survivor = posts.get_with_meta(post.id).await.unwrap().expect("post still exists");
    assert_eq!(survivor.group_id, None);
    assert_eq!(survivor.group_title, None);
}
