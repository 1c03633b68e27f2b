//! Optimistic mutation flows: apply, confirm, reconcile, roll back.
//!
//! Run with: `cargo test -p marquee-tests --test mutation_tests`

use marquee_core::{EntityId, Error, ListParams, Resource};
use marquee_store::UpdateKind;
use marquee_tests::{admin_cache, settle, wait_for, CallRecord, EventTypeFixture, UpdateLog};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_update_patches_both_views_before_the_server_confirms() {
    let (cache, backend) = admin_cache().await;
    backend
        .event_types
        .insert(EventTypeFixture::active(1, "Conference"))
        .await;

    let params = cache.event_types.first_page();
    cache.event_types.list(&params).await.unwrap();
    cache.event_types.detail(EntityId::new(1)).await.unwrap();

    let gate = backend
        .event_types
        .hold_where(|call| matches!(call, CallRecord::Update(_)));
    let pending = {
        let handle = Arc::clone(&cache.event_types);
        let params = params.clone();
        tokio::spawn(async move {
            handle
                .update(&params, EntityId::new(1), EventTypeFixture::rename("Summit"))
                .await
        })
    };
    settle().await;

    // Both views show the edit while the server call is held open.
    let list = cache.event_types.read_list(&params).data.unwrap();
    assert_eq!(list.items[0].name, "Summit");
    let detail = cache.event_types.read_detail(EntityId::new(1)).data.unwrap();
    assert_eq!(detail.name, "Summit");
    assert!(!pending.is_finished());
    assert_eq!(backend.event_types.records().await[0].name, "Conference");

    gate.open();
    let confirmed = pending
        .await
        .expect("Task panicked")
        .expect("Update failed");
    settle().await;

    assert_eq!(confirmed.name, "Summit");
    assert_eq!(
        cache.event_types.read_detail(EntityId::new(1)).data.unwrap(),
        confirmed
    );
    assert_eq!(backend.event_types.records().await[0].name, "Summit");
}

#[tokio::test]
async fn test_deactivation_shows_at_once_and_flags_sibling_pages() {
    let (cache, backend) = admin_cache().await;
    for i in 1..=5 {
        backend
            .event_types
            .insert(EventTypeFixture::active(i, &format!("Event {i}")))
            .await;
    }

    let page_one = ListParams::page(1).with_page_size(3);
    let page_two = ListParams::page(2).with_page_size(3);
    cache.event_types.list(&page_one).await.unwrap();
    cache.event_types.list(&page_two).await.unwrap();

    let gate = backend
        .event_types
        .hold_where(|call| matches!(call, CallRecord::Update(_)));
    let pending = {
        let handle = Arc::clone(&cache.event_types);
        let params = page_one.clone();
        tokio::spawn(async move {
            handle
                .update(&params, EntityId::new(2), EventTypeFixture::deactivate())
                .await
        })
    };
    settle().await;

    // The flip is visible in the page while the server still says active.
    let page = cache.event_types.read_list(&page_one).data.unwrap();
    assert!(!page.items[1].is_active);
    assert!(backend.event_types.records().await[1].is_active);

    gate.open();
    let confirmed = pending
        .await
        .expect("Task panicked")
        .expect("Update failed");
    settle().await;

    assert!(!confirmed.is_active);
    let page = cache.event_types.read_list(&page_one).data.unwrap();
    assert!(!page.items[1].is_active);
    // Sibling pages of the collection can no longer be trusted.
    assert!(cache.event_types.read_list(&page_two).stale);
    assert!(!backend.event_types.records().await[1].is_active);
}

#[tokio::test]
async fn test_update_failure_restores_both_views_exactly() {
    let (cache, backend) = admin_cache().await;
    backend
        .event_types
        .insert(EventTypeFixture::active(1, "Conference"))
        .await;

    let params = cache.event_types.first_page();
    cache.event_types.list(&params).await.unwrap();
    cache.event_types.detail(EntityId::new(1)).await.unwrap();
    let before_page = cache.event_types.read_list(&params).data.unwrap();
    let before_detail = cache.event_types.read_detail(EntityId::new(1)).data.unwrap();

    let log = UpdateLog::new();
    let _guard = cache.event_types.subscribe_list(&params, log.callback());

    backend
        .event_types
        .fail_next(Error::Network("connection reset".into()));
    let err = cache
        .event_types
        .update(&params, EntityId::new(1), EventTypeFixture::rename("Summit"))
        .await
        .expect_err("Update should fail");
    assert!(matches!(err, Error::Network(_)));

    // Snapshot restored, and the subscriber saw the edit come and go.
    assert_eq!(cache.event_types.read_list(&params).data.unwrap(), before_page);
    assert_eq!(
        cache.event_types.read_detail(EntityId::new(1)).data.unwrap(),
        before_detail
    );
    assert_eq!(log.kinds(), vec![UpdateKind::Patched, UpdateKind::RolledBack]);
    assert_eq!(backend.event_types.records().await[0].name, "Conference");
    // Transport failures trigger no refetch; rollback already settled it.
    assert_eq!(backend.event_types.list_calls(), 1);
}

#[tokio::test]
async fn test_create_shows_a_provisional_row_until_confirmed() {
    let (cache, backend) = admin_cache().await;
    backend
        .event_types
        .insert(EventTypeFixture::active(1, "Conference"))
        .await;

    let params = cache.event_types.first_page();
    cache.event_types.list(&params).await.unwrap();

    let gate = backend
        .event_types
        .hold_where(|call| matches!(call, CallRecord::Create));
    let pending = {
        let handle = Arc::clone(&cache.event_types);
        let params = params.clone();
        tokio::spawn(async move {
            handle.create(&params, EventTypeFixture::draft("Gala")).await
        })
    };
    settle().await;

    // The provisional row is visible with a local id.
    let page = cache.event_types.read_list(&params).data.unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page.total_count, 2);
    assert!(page.items[1].id.is_local());
    assert_eq!(page.items[1].name, "Gala");

    gate.release(1);
    let confirmed = pending
        .await
        .expect("Task panicked")
        .expect("Create failed");
    settle().await;

    // The confirmed entity replaced the provisional row in place.
    assert_eq!(confirmed.id, EntityId::new(2));
    let page = cache.event_types.read_list(&params).data.unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page.items[1].id, EntityId::new(2));
    assert!(!page.items[1].id.is_local());
    assert_eq!(
        cache.event_types.read_detail(EntityId::new(2)).data.unwrap(),
        confirmed
    );
    let records = backend.event_types.records().await;
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].name, "Gala");
}

#[tokio::test]
async fn test_create_failure_removes_the_provisional_row() {
    let (cache, backend) = admin_cache().await;
    backend
        .event_types
        .insert(EventTypeFixture::active(1, "Conference"))
        .await;

    let params = cache.event_types.first_page();
    cache.event_types.list(&params).await.unwrap();
    let before = cache.event_types.read_list(&params).data.unwrap();

    backend.event_types.fail_next(Error::Validation {
        field: "name".into(),
        reason: "required".into(),
    });
    let err = cache
        .event_types
        .create(&params, EventTypeFixture::draft(""))
        .await
        .expect_err("Create should fail");
    assert!(matches!(err, Error::Validation { ref field, .. } if field == "name"));

    assert_eq!(cache.event_types.read_list(&params).data.unwrap(), before);
    assert_eq!(backend.event_types.records().await.len(), 1);
    // Validation failures trigger no refetch either.
    assert_eq!(backend.event_types.list_calls(), 1);
}

#[tokio::test]
async fn test_delete_commit_drops_the_row_and_the_detail_entry() {
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
    cache.event_types.detail(EntityId::new(2)).await.unwrap();

    cache
        .event_types
        .delete(&params, EntityId::new(2))
        .await
        .expect("Failed to delete");
    settle().await;

    let page = cache.event_types.read_list(&params).data.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page.total_count, 1);
    assert_eq!(page.items[0].id, EntityId::new(1));
    // The detail entry is gone, not just stale.
    let detail_key = cache.event_types.detail_key(EntityId::new(2));
    assert!(cache.event_types.cache().details().peek(&detail_key).is_none());
    assert_eq!(backend.event_types.records().await.len(), 1);
}

#[tokio::test]
async fn test_delete_failure_restores_the_row() {
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

    backend
        .event_types
        .fail_next(Error::Network("timeout".into()));
    cache
        .event_types
        .delete(&params, EntityId::new(2))
        .await
        .expect_err("Delete should fail");

    let page = cache.event_types.read_list(&params).data.unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page.items[1].id, EntityId::new(2));
    assert_eq!(backend.event_types.records().await.len(), 2);
}

#[tokio::test]
async fn test_not_found_delete_marks_the_collection_stale() {
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

    backend.event_types.fail_next(Error::NotFound {
        resource: Resource::EventTypes,
        id: EntityId::new(2),
    });
    let err = cache
        .event_types
        .delete(&params, EntityId::new(2))
        .await
        .expect_err("Delete should fail");
    assert!(err.is_not_found());
    settle().await;

    // Rolled back, but flagged for refresh: local state may be behind.
    let entry = cache.event_types.read_list(&params);
    assert_eq!(entry.data.unwrap().len(), 2);
    assert!(entry.stale);
    // Nobody subscribed, so the refresh waits for the next reader.
    assert_eq!(backend.event_types.list_calls(), 1);
}

#[tokio::test]
async fn test_conflict_update_refetches_even_unwatched_views() {
    let (cache, backend) = admin_cache().await;
    backend
        .event_types
        .insert(EventTypeFixture::active(1, "Conference"))
        .await;

    let params = cache.event_types.first_page();
    cache.event_types.list(&params).await.unwrap();

    backend
        .event_types
        .fail_next(Error::Conflict("updated_at moved".into()));
    let err = cache
        .event_types
        .update(&params, EntityId::new(1), EventTypeFixture::rename("Summit"))
        .await
        .expect_err("Update should fail");
    assert!(err.is_conflict());

    // Conflicts mean the cache is wrong, not merely old: the refetch runs
    // without anybody reading or subscribing.
    let server = Arc::clone(&backend.event_types);
    let refetched = wait_for(
        Duration::from_secs(2),
        Duration::from_millis(10),
        move || {
            let server = Arc::clone(&server);
            async move { server.list_calls() >= 2 }
        },
    )
    .await;
    assert!(refetched, "Expected a forced refetch after the conflict");
    settle().await;

    let entry = cache.event_types.read_list(&params);
    assert!(!entry.stale);
    assert_eq!(entry.data.unwrap().items[0].name, "Conference");
}
