//! Races between fetches and mutations: deduplication, discarded
//! completions, and overlapping edits.
//!
//! Run with: `cargo test -p marquee-tests --test concurrency_tests`

use marquee_core::{EntityId, Error};
use marquee_store::UpdateKind;
use marquee_tests::{admin_cache, settle, CallRecord, EventTypeFixture, UpdateLog};
use std::sync::Arc;

#[tokio::test]
async fn test_late_refetch_cannot_clobber_newer_edits() {
    let (cache, backend) = admin_cache().await;
    backend
        .event_types
        .insert(EventTypeFixture::active(1, "Conference"))
        .await;

    let params = cache.event_types.first_page();
    cache.event_types.list(&params).await.unwrap();
    // Keep the page watched so commits refresh it eagerly.
    let _guard = cache.event_types.subscribe_list(&params, |_| {});

    let gate = backend
        .event_types
        .hold_where(|call| matches!(call, CallRecord::List(_)));

    // First edit. The commit invalidates the watched page, and its
    // background refresh is held at the gate carrying that moment's rows.
    cache
        .event_types
        .update(&params, EntityId::new(1), EventTypeFixture::rename("Summit"))
        .await
        .expect("Failed to update");
    settle().await;
    assert_eq!(backend.event_types.list_calls(), 2);

    // Second edit while the refresh is held. Deduplication spawns no new
    // fetch; the held response is now outdated.
    cache
        .event_types
        .update(&params, EntityId::new(1), EventTypeFixture::rename("Gala"))
        .await
        .expect("Failed to update");
    settle().await;
    assert_eq!(backend.event_types.list_calls(), 2);
    let page = cache.event_types.read_list(&params).data.unwrap();
    assert_eq!(page.items[0].name, "Gala");

    // Releasing the outdated response must not roll the edit back.
    gate.open();
    settle().await;
    let entry = cache.event_types.read_list(&params);
    assert_eq!(entry.data.unwrap().items[0].name, "Gala");
    assert!(entry.stale);

    // The next read converges on server truth.
    let page = cache.event_types.list(&params).await.unwrap();
    assert_eq!(page.items[0].name, "Gala");
    settle().await;
    assert_eq!(backend.event_types.list_calls(), 3);
    assert!(!cache.event_types.read_list(&params).stale);
}

#[tokio::test]
async fn test_overlapping_mutations_settle_independently() {
    let (cache, backend) = admin_cache().await;
    backend
        .event_types
        .insert(EventTypeFixture::active(1, "Conference"))
        .await;
    backend
        .event_types
        .insert(EventTypeFixture::active(2, "Gala"))
        .await;

    let params = cache.event_types.first_page();
    cache.event_types.list(&params).await.unwrap();

    let gate = backend
        .event_types
        .hold_where(|call| matches!(call, CallRecord::Update(_)));

    let task_a = {
        let handle = Arc::clone(&cache.event_types);
        let params = params.clone();
        tokio::spawn(async move {
            handle
                .update(&params, EntityId::new(1), EventTypeFixture::rename("Summit"))
                .await
        })
    };
    settle().await;
    let task_b = {
        let handle = Arc::clone(&cache.event_types);
        let params = params.clone();
        tokio::spawn(async move {
            handle
                .update(&params, EntityId::new(2), EventTypeFixture::rename("Ball"))
                .await
        })
    };
    settle().await;

    // Both edits visible while both calls are held.
    let page = cache.event_types.read_list(&params).data.unwrap();
    assert_eq!(page.items[0].name, "Summit");
    assert_eq!(page.items[1].name, "Ball");

    // Held calls release in arrival order: the first commits.
    gate.release(1);
    task_a
        .await
        .expect("Task panicked")
        .expect("First update failed");

    // The second fails and rolls back only its own edit.
    backend
        .event_types
        .fail_next(Error::Network("connection reset".into()));
    gate.release(1);
    let err = task_b.await.expect("Task panicked");
    assert!(matches!(err, Err(Error::Network(_))));
    settle().await;

    let page = cache.event_types.read_list(&params).data.unwrap();
    assert_eq!(page.items[0].name, "Summit");
    assert_eq!(page.items[1].name, "Gala");
    let records = backend.event_types.records().await;
    assert_eq!(records[0].name, "Summit");
    assert_eq!(records[1].name, "Gala");
}

#[tokio::test]
async fn test_create_survives_a_refetch_completing_late() {
    let (cache, backend) = admin_cache().await;
    backend
        .event_types
        .insert(EventTypeFixture::active(1, "Conference"))
        .await;

    let params = cache.event_types.first_page();
    let gate = backend
        .event_types
        .hold_where(|call| matches!(call, CallRecord::List(_)));

    let pending_list = {
        let handle = Arc::clone(&cache.event_types);
        let params = params.clone();
        tokio::spawn(async move { handle.list(&params).await })
    };
    settle().await;

    // A create lands while the fetch is held.
    let confirmed = cache
        .event_types
        .create(&params, EventTypeFixture::draft("Gala"))
        .await
        .expect("Failed to create");
    assert_eq!(confirmed.id, EntityId::new(2));

    gate.open();
    let fetched = pending_list
        .await
        .expect("Task panicked")
        .expect("List failed");
    settle().await;

    // The caller got what the server answered at the time; the cache
    // discarded it rather than forgetting the newer create.
    assert_eq!(fetched.len(), 1);
    assert_eq!(
        cache.event_types.read_detail(EntityId::new(2)).data.unwrap().name,
        "Gala"
    );

    let page = cache.event_types.list(&params).await.unwrap();
    let ids: Vec<EntityId> = page.items.iter().map(|item| item.id).collect();
    assert_eq!(ids, [1, 2].map(EntityId::new));
    assert_eq!(backend.event_types.list_calls(), 2);
}

#[tokio::test]
async fn test_simultaneous_subscriptions_share_one_fetch() {
    let (cache, backend) = admin_cache().await;
    backend
        .event_types
        .insert(EventTypeFixture::active(1, "Conference"))
        .await;

    let params = cache.event_types.first_page();
    let log_a = UpdateLog::new();
    let log_b = UpdateLog::new();
    let _guard_a = cache.event_types.subscribe_list(&params, log_a.callback());
    let _guard_b = cache.event_types.subscribe_list(&params, log_b.callback());
    settle().await;

    assert_eq!(backend.event_types.list_calls(), 1);
    assert_eq!(log_a.kinds(), vec![UpdateKind::Loading, UpdateKind::Fetched]);
    assert_eq!(log_b.kinds(), vec![UpdateKind::Loading, UpdateKind::Fetched]);
    let entry = cache.event_types.read_list(&params);
    assert_eq!(entry.data.unwrap().items[0].name, "Conference");
    assert_eq!(entry.subscriber_count, 2);
}
