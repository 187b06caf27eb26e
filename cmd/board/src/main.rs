//! # Board Binary
//!
//! Demo entry point that assembles the feed core against the in-memory
//! adapters, seeds a small board, and prints the live aggregated feed. The
//! services never see anything but the `domains` ports, so swapping the
//! in-memory store for a real backend SDK is an adapter change only.

use std::sync::Arc;

use anyhow::Context;
use auth_adapters::SimpleAuthProvider;
use domains::models::{Category, CategoryFilter, PostDraft, SortOrder};
use domains::ports::{AuthProvider, DocumentStore, KeyValueStorage};
use services::accounts::{AccountService, SignupForm};
use services::aggregator::PostAggregator;
use services::comments::CommentThread;
use services::feed;
use services::posts::PostService;
use services::recent::RecentlyViewed;
use storage_adapters::{FileKeyValueStorage, MemoryDocumentStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = configs::load()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&cfg.log.filter)?)
        .init();

    // 1. Adapters
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
    let auth: Arc<dyn AuthProvider> = Arc::new(SimpleAuthProvider::new());
    let device: Arc<dyn KeyValueStorage> =
        Arc::new(FileKeyValueStorage::new(cfg.storage.device_store_path.into()));

    // 2. Services
    let accounts = AccountService::new(store.clone(), auth.clone());
    let posts = PostService::new(store.clone());
    let recent =
        RecentlyViewed::with_cap(device, store.clone(), cfg.feed.recently_viewed_cap);

    // 3. Live aggregation pipeline
    let (aggregator, mut feed_rx) = PostAggregator::new(store.clone());
    let pipeline = tokio::spawn(aggregator.run());

    info!("board feed core starting (in-memory store)");

    // 4. Seed a demo board
    let user = accounts
        .sign_up(&SignupForm {
            email: "demo@board.dev".to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
            nickname: "demo".to_string(),
            profile_image: None,
        })
        .await
        .context("demo signup")?;
    let user = accounts.sign_in(&user.email, "secret1").await?;

    let first = posts
        .create(
            &PostDraft {
                title: "Welcome".to_string(),
                content: "First post on the board".to_string(),
                category: Category::General,
                image_urls: vec![],
            },
            &user,
        )
        .await?;
    posts
        .create(
            &PostDraft {
                title: "Reading list".to_string(),
                content: "Links worth keeping".to_string(),
                category: Category::Info,
                image_urls: vec![],
            },
            &user,
        )
        .await?;

    posts.record_detail_open(&first, &recent).await?;
    let thread = CommentThread::new(store.clone(), first.clone());
    thread.add("hello from the demo", Some(&user)).await?;

    // 5. Wait until the aggregator has caught up with both posts and the
    //    comment recount
    while {
        let published = feed_rx.borrow();
        published.len() < 2 || !published.iter().any(|p| p.comment_count > 0)
    } {
        feed_rx
            .changed()
            .await
            .context("aggregation pipeline closed")?;
    }

    let aggregated = feed_rx.borrow().clone();
    let display = feed::arrange(&aggregated, CategoryFilter::All, SortOrder::MostViewed);
    for item in &display {
        info!(
            title = %item.post.title,
            author = %item.nickname,
            views = item.views(),
            comments = item.comment_count,
            "feed entry"
        );
    }

    let viewed = recent.list_viewed().await?;
    info!(count = viewed.len(), "recently viewed posts");

    pipeline.abort();
    Ok(())
}
