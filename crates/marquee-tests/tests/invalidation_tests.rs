//! Staleness propagation after commits: sibling views, dependent
//! resources, and detail entries.
//!
//! Run with: `cargo test -p marquee-tests --test invalidation_tests`

use marquee_core::notification::NotificationPatch;
use marquee_core::questionnaire::QuestionnairePatch;
use marquee_core::{EntityId, ListParams};
use marquee_store::UpdateKind;
use marquee_tests::{
    admin_cache, settle, EventTypeFixture, FieldFixture, NotificationFixture,
    QuestionnaireFixture, ResponseFixture, UpdateLog,
};

#[tokio::test]
async fn test_commits_mark_sibling_views_stale_until_read() {
    let (cache, backend) = admin_cache().await;
    for i in 1..=3 {
        backend
            .event_types
            .insert(EventTypeFixture::active(i, &format!("Event {i}")))
            .await;
    }

    let page_one = ListParams::page(1).with_page_size(2);
    let page_two = ListParams::page(2).with_page_size(2);
    cache.event_types.list(&page_one).await.unwrap();
    cache.event_types.list(&page_two).await.unwrap();

    cache
        .event_types
        .update(&page_one, EntityId::new(1), EventTypeFixture::rename("Summit"))
        .await
        .expect("Failed to update");
    settle().await;

    // The sibling page is flagged but untouched, and nothing refetched it.
    let entry = cache.event_types.read_list(&page_two);
    assert!(entry.stale);
    assert_eq!(entry.data.as_ref().unwrap().items[0].name, "Event 3");
    assert_eq!(backend.event_types.list_calls(), 2);

    // Reading it serves the stale page and refreshes behind the read.
    let page = cache.event_types.list(&page_two).await.unwrap();
    assert_eq!(page.items[0].name, "Event 3");
    settle().await;
    assert_eq!(backend.event_types.list_calls(), 3);
    assert!(!cache.event_types.read_list(&page_two).stale);
}

#[tokio::test]
async fn test_subscribed_views_refresh_right_after_a_commit() {
    let (cache, backend) = admin_cache().await;
    for i in 1..=3 {
        backend
            .event_types
            .insert(EventTypeFixture::active(i, &format!("Event {i}")))
            .await;
    }

    let page_one = ListParams::page(1).with_page_size(2);
    let page_two = ListParams::page(2).with_page_size(2);
    cache.event_types.list(&page_one).await.unwrap();
    cache.event_types.list(&page_two).await.unwrap();

    let log = UpdateLog::new();
    let _guard = cache.event_types.subscribe_list(&page_two, log.callback());
    backend.event_types.clear_calls();

    cache
        .event_types
        .update(&page_one, EntityId::new(1), EventTypeFixture::rename("Summit"))
        .await
        .expect("Failed to update");
    settle().await;

    // The watched page went stale and came back fresh on its own.
    assert!(!cache.event_types.read_list(&page_two).stale);
    assert_eq!(
        log.kinds(),
        vec![UpdateKind::Invalidated, UpdateKind::Loading, UpdateKind::Fetched]
    );
    assert_eq!(backend.event_types.list_calls(), 1);
    // The unwatched page stays stale until somebody reads it.
    assert!(cache.event_types.read_list(&page_one).stale);
}

#[tokio::test]
async fn test_subscribing_to_a_stale_view_refreshes_it_once() {
    let (cache, backend) = admin_cache().await;
    backend
        .event_types
        .insert(EventTypeFixture::active(1, "Conference"))
        .await;

    let params = cache.event_types.first_page();
    cache.event_types.list(&params).await.unwrap();
    cache
        .event_types
        .update(&params, EntityId::new(1), EventTypeFixture::rename("Summit"))
        .await
        .expect("Failed to update");
    settle().await;
    assert!(cache.event_types.read_list(&params).stale);
    backend.event_types.clear_calls();

    // The deferred refresh runs as soon as somebody starts watching.
    let log = UpdateLog::new();
    let _guard = cache.event_types.subscribe_list(&params, log.callback());
    settle().await;

    assert!(!cache.event_types.read_list(&params).stale);
    assert_eq!(backend.event_types.list_calls(), 1);
    assert_eq!(log.kinds(), vec![UpdateKind::Loading, UpdateKind::Fetched]);

    // A second watcher finds the entry fresh and fetches nothing.
    let _second = cache.event_types.subscribe_list(&params, UpdateLog::new().callback());
    settle().await;
    assert_eq!(backend.event_types.list_calls(), 1);
}

#[tokio::test]
async fn test_questionnaire_commits_cascade_to_fields_and_responses() {
    let (cache, backend) = admin_cache().await;
    backend
        .event_types
        .insert(EventTypeFixture::active(1, "Conference"))
        .await;
    backend
        .questionnaires
        .insert(QuestionnaireFixture::for_event_type(7, 1, "Feedback"))
        .await;
    backend
        .questionnaire_fields
        .insert(FieldFixture::at(10, 7, 1))
        .await;
    backend
        .questionnaire_responses
        .insert(ResponseFixture::by(100, 7, "ada"))
        .await;

    let event_types = cache.event_types.first_page();
    let questionnaires = cache.questionnaires.first_page();
    let fields = cache
        .questionnaire_fields
        .first_page()
        .with_filter("questionnaire", "7");
    let responses = cache
        .questionnaire_responses
        .first_page()
        .with_filter("questionnaire", "7");
    cache.event_types.list(&event_types).await.unwrap();
    cache.questionnaires.list(&questionnaires).await.unwrap();
    cache.questionnaire_fields.list(&fields).await.unwrap();
    cache.questionnaire_responses.list(&responses).await.unwrap();

    let publish = QuestionnairePatch {
        is_published: Some(true),
        ..Default::default()
    };
    cache
        .questionnaires
        .update(&questionnaires, EntityId::new(7), publish)
        .await
        .expect("Failed to publish questionnaire");
    settle().await;

    assert!(cache.questionnaires.read_list(&questionnaires).stale);
    assert!(cache.questionnaire_fields.read_list(&fields).stale);
    assert!(cache.questionnaire_responses.read_list(&responses).stale);
    // Parents are not dependents: event types stay trusted.
    assert!(!cache.event_types.read_list(&event_types).stale);
}

#[tokio::test]
async fn test_event_type_commits_reach_questionnaires_but_not_deeper() {
    let (cache, backend) = admin_cache().await;
    backend
        .event_types
        .insert(EventTypeFixture::active(1, "Conference"))
        .await;
    backend
        .questionnaires
        .insert(QuestionnaireFixture::for_event_type(7, 1, "Feedback"))
        .await;
    backend
        .questionnaire_fields
        .insert(FieldFixture::at(10, 7, 1))
        .await;

    let event_types = cache.event_types.first_page();
    let questionnaires = cache.questionnaires.first_page();
    let fields = cache
        .questionnaire_fields
        .first_page()
        .with_filter("questionnaire", "7");
    cache.event_types.list(&event_types).await.unwrap();
    cache.questionnaires.list(&questionnaires).await.unwrap();
    cache.questionnaire_fields.list(&fields).await.unwrap();

    cache
        .event_types
        .update(&event_types, EntityId::new(1), EventTypeFixture::rename("Summit"))
        .await
        .expect("Failed to update");
    settle().await;

    assert!(cache.questionnaires.read_list(&questionnaires).stale);
    // Dependency is one level deep, not transitive.
    assert!(!cache.questionnaire_fields.read_list(&fields).stale);
}

#[tokio::test]
async fn test_notification_commits_stay_within_notifications() {
    let (cache, backend) = admin_cache().await;
    backend
        .notifications
        .insert(NotificationFixture::unread(1, "Welcome"))
        .await;
    backend
        .event_types
        .insert(EventTypeFixture::active(1, "Conference"))
        .await;

    let notifications = cache.notifications.first_page();
    let event_types = cache.event_types.first_page();
    cache.notifications.list(&notifications).await.unwrap();
    cache.event_types.list(&event_types).await.unwrap();

    let mark_read = NotificationPatch {
        is_read: Some(true),
        ..Default::default()
    };
    cache
        .notifications
        .update(&notifications, EntityId::new(1), mark_read)
        .await
        .expect("Failed to mark read");
    settle().await;

    assert!(cache.notifications.read_list(&notifications).stale);
    assert!(!cache.event_types.read_list(&event_types).stale);
}

#[tokio::test]
async fn test_update_commits_rewrite_and_remark_the_detail() {
    let (cache, backend) = admin_cache().await;
    backend
        .event_types
        .insert(EventTypeFixture::active(1, "Conference"))
        .await;

    cache.event_types.detail(EntityId::new(1)).await.unwrap();

    let params = cache.event_types.first_page();
    let confirmed = cache
        .event_types
        .update(&params, EntityId::new(1), EventTypeFixture::rename("Summit"))
        .await
        .expect("Failed to update");
    settle().await;

    // Authoritative data, flagged anyway: the server may have touched
    // fields the patch never mentioned.
    let entry = cache.event_types.read_detail(EntityId::new(1));
    assert_eq!(entry.data.as_ref().unwrap(), &confirmed);
    assert!(entry.stale);

    // The next read serves it and refreshes behind the read.
    let served = cache.event_types.detail(EntityId::new(1)).await.unwrap();
    assert_eq!(served, confirmed);
    settle().await;
    assert_eq!(backend.event_types.get_calls(), 2);
    assert!(!cache.event_types.read_detail(EntityId::new(1)).stale);
}
