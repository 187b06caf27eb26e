//! Full-stack scenarios over the in-memory adapters: account lifecycle, post
//! creation through live aggregation, and the comment round trip with its
//! denormalized counter.

use domains::document::collections;
use domains::models::{Category, Post};
use integration_tests::{draft, wait_for_comments, wait_for_feed, Env};
use services::aggregator::PostAggregator;
use services::comments::CommentThread;
use services::posts::PostService;
use services::recent::RecentlyViewed;
use std::sync::Arc;
use storage_adapters::MemoryKeyValueStorage;

#[tokio::test]
async fn fresh_store_has_an_empty_feed_after_login() {
    let env = Env::new();
    let user = env.login("a@b.com", "tester").await;
    assert_eq!(user.email, "a@b.com");
    assert_eq!(env.auth.current_user(), Some(user));

    let (aggregator, mut rx) = PostAggregator::new(env.store.clone());
    tokio::spawn(aggregator.run());

    let published = wait_for_feed(&mut rx, |_| true).await;
    assert!(published.is_empty());
}

#[tokio::test]
async fn created_post_aggregates_and_detail_open_bumps_views() {
    let env = Env::new();
    let user = env.login("a@b.com", "tester").await;
    let posts = PostService::new(env.store.clone());
    let recent = RecentlyViewed::new(Arc::new(MemoryKeyValueStorage::new()), env.store.clone());

    let (aggregator, mut rx) = PostAggregator::new(env.store.clone());
    tokio::spawn(aggregator.run());

    let id = posts
        .create(&draft("T", Category::General), &user)
        .await
        .unwrap();

    let published = wait_for_feed(&mut rx, |p| p.len() == 1).await;
    assert_eq!(published[0].id(), id);
    assert_eq!(published[0].nickname, "tester");
    assert_eq!(published[0].comment_count, 0);
    assert_eq!(published[0].views(), 0);

    posts.record_detail_open(&id, &recent).await.unwrap();
    let published = wait_for_feed(&mut rx, |p| p.iter().any(|x| x.views() == 1)).await;
    assert_eq!(published[0].views(), 1);
}

#[tokio::test]
async fn comment_round_trip_maintains_the_counter() {
    let env = Env::new();
    let user = env.login("a@b.com", "tester").await;
    let posts = PostService::new(env.store.clone());

    let post_id = posts
        .create(&draft("T", Category::General), &user)
        .await
        .unwrap();

    let thread = CommentThread::new(env.store.clone(), post_id.clone());
    let mut comment_feed = thread.subscribe().await.unwrap();

    let comment_id = thread.add("hello", Some(&user)).await.unwrap();
    let comments = wait_for_comments(&mut comment_feed, |c| c.len() == 1).await;
    assert_eq!(comments[0].id, comment_id);
    assert_eq!(comments[0].content, "hello");
    assert_eq!(comments[0].author_name, "tester");

    let doc = env
        .store
        .get(collections::POSTS, &post_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(Post::from_document(&doc).unwrap().comment_count, 1);

    thread.delete(&comment_id).await.unwrap();
    let comments = wait_for_comments(&mut comment_feed, |c| c.is_empty()).await;
    assert!(comments.is_empty());

    let doc = env
        .store
        .get(collections::POSTS, &post_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(Post::from_document(&doc).unwrap().comment_count, 0);
}

#[tokio::test]
async fn deleting_a_post_cascades_to_its_comments() {
    let env = Env::new();
    let user = env.login("a@b.com", "tester").await;
    let posts = PostService::new(env.store.clone());

    let post_id = posts
        .create(&draft("T", Category::Question), &user)
        .await
        .unwrap();
    let thread = CommentThread::new(env.store.clone(), post_id.clone());
    thread.add("first", Some(&user)).await.unwrap();
    thread.add("second", Some(&user)).await.unwrap();

    posts.delete(&post_id, &user).await.unwrap();

    let leftovers = env
        .store
        .list(
            &domains::document::Query::collection(collections::COMMENTS)
                .where_eq("postId", post_id.as_str()),
        )
        .await
        .unwrap();
    assert!(leftovers.is_empty());
}
