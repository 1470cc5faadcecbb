//! End-to-end behaviour of a feed session against test gateways.

use mediafeed_core::{Cursor, FeedError, HasMorePolicy, Page, Section};
use mediafeed_sync::{FeedSession, FetchOutcome, PaginationEngine, SyncConfig};
use mediafeed_test_utils::generators::arb_page;
use mediafeed_test_utils::{item, items, InMemoryGateway, PendingFetches, ScriptedGateway};
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

fn library() -> Vec<mediafeed_core::Item> {
    let mut all = items("c", "culture", 9);
    all.extend(items("h", "history", 7));
    all.extend(items("t", "theory", 3));
    all
}

/// Bootstrap a scripted session, answering the initial fetch with `page`.
async fn scripted_session(
    config: SyncConfig,
    page: Page,
) -> (FeedSession<ScriptedGateway>, PendingFetches) {
    let (gateway, mut pending) = ScriptedGateway::new();
    let session = FeedSession::new(gateway, config);
    let boot = tokio::spawn({
        let session = session.clone();
        async move { session.bootstrap().await }
    });
    pending.next().await.unwrap().respond(Ok(page));
    boot.await.unwrap();
    (session, pending)
}

fn mixed_first_page() -> Page {
    let mut first = items("c", "culture", 5);
    first.extend(items("h", "history", 5));
    Page::new(first, Some(Cursor::Token("c1".to_string())), true)
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[tokio::test]
async fn test_load_more_extends_and_exhausts() {
    let (session, mut pending) = scripted_session(SyncConfig::new().with_page_size(10), mixed_first_page()).await;
    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.items.len(), 10);
    assert!(snapshot.more_available);

    let more = tokio::spawn({
        let session = session.clone();
        async move { session.load_more().await }
    });
    let fetch = pending.next().await.unwrap();
    assert_eq!(fetch.cursor, Some(Cursor::Token("c1".to_string())));
    fetch.respond(Ok(Page::new(items("x", "culture", 5), None, false)));
    assert_eq!(more.await.unwrap(), Some(FetchOutcome::Appended { added: 5 }));

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.items.len(), 15);
    assert!(!snapshot.more_available);
    assert_eq!(snapshot.items[10].id, "x-0");
}

#[tokio::test]
async fn test_failed_refresh_keeps_collection() {
    let (session, mut pending) = scripted_session(SyncConfig::new(), mixed_first_page()).await;
    let before = session.snapshot().await;

    let refresh = tokio::spawn({
        let session = session.clone();
        async move { session.refresh_now().await }
    });
    pending
        .next()
        .await
        .unwrap()
        .respond(Err(FeedError::transport("connection reset")));
    assert!(matches!(refresh.await.unwrap(), FetchOutcome::Failed(_)));

    let after = session.snapshot().await;
    assert!(after.error.is_some());
    assert!(!after.loading);
    assert_eq!(after.items, before.items);
    assert_eq!(after.selected, before.selected);
}

#[tokio::test]
async fn test_rapid_filter_changes_apply_last_only() {
    let (session, mut pending) = scripted_session(SyncConfig::new(), mixed_first_page()).await;

    let culture = tokio::spawn({
        let session = session.clone();
        async move { session.set_filter("culture").await }
    });
    let culture_fetch = pending.next().await.unwrap();
    let history = tokio::spawn({
        let session = session.clone();
        async move { session.set_filter("history").await }
    });
    let history_fetch = pending.next().await.unwrap();
    assert_eq!(history_fetch.section, Section::new("history"));

    culture_fetch.respond(Ok(Page::new(items("c", "culture", 4), None, false)));
    assert_eq!(culture.await.unwrap().unwrap(), Some(FetchOutcome::Stale));
    let snapshot = session.snapshot().await;
    assert!(snapshot.items.is_empty());
    assert!(snapshot.loading);

    history_fetch.respond(Ok(Page::new(items("h", "history", 3), None, false)));
    assert_eq!(
        history.await.unwrap().unwrap(),
        Some(FetchOutcome::Replaced { items: 3 })
    );

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.active_section, Section::new("history"));
    assert_eq!(snapshot.items.len(), 3);
    assert!(snapshot.items.iter().all(|i| i.section == Section::new("history")));
    assert!(!snapshot.loading);
}

#[tokio::test]
async fn test_filter_change_discards_pending_append() {
    let (session, mut pending) = scripted_session(SyncConfig::new(), mixed_first_page()).await;

    let more = tokio::spawn({
        let session = session.clone();
        async move { session.load_more().await }
    });
    let append_fetch = pending.next().await.unwrap();
    assert!(session.snapshot().await.loading_more);

    let history = tokio::spawn({
        let session = session.clone();
        async move { session.set_filter("history").await }
    });
    let history_fetch = pending.next().await.unwrap();
    assert!(!session.snapshot().await.loading_more);

    append_fetch.respond(Ok(Page::new(items("late", "culture", 5), None, false)));
    assert_eq!(more.await.unwrap(), Some(FetchOutcome::Stale));
    history_fetch.respond(Ok(Page::new(items("h", "history", 2), None, false)));
    history.await.unwrap().unwrap();

    let snapshot = session.snapshot().await;
    assert!(snapshot.items.iter().all(|i| i.section == Section::new("history")));
    assert!(snapshot.items.iter().all(|i| !i.id.starts_with("late")));
}

// ============================================================================
// LOAD MORE GUARDS
// ============================================================================

#[tokio::test]
async fn test_load_more_rejected_while_pending() {
    let (session, mut pending) = scripted_session(SyncConfig::new(), mixed_first_page()).await;

    let first = tokio::spawn({
        let session = session.clone();
        async move { session.load_more().await }
    });
    let fetch = pending.next().await.unwrap();

    let before = session.snapshot().await;
    assert_eq!(session.load_more().await, None);
    assert_eq!(session.snapshot().await, before);
    assert!(pending.try_next().is_none());

    fetch.respond(Ok(Page::new(items("x", "culture", 2), None, false)));
    assert_eq!(first.await.unwrap(), Some(FetchOutcome::Appended { added: 2 }));
}

#[tokio::test]
async fn test_short_page_policy_ignores_server_flag() {
    let mut shelf = items("c", "culture", 3);
    shelf.extend(items("h", "history", 14));
    let gateway = InMemoryGateway::new(shelf)
        .with_catalog(vec!["culture", "history"])
        .with_policy(HasMorePolicy::ShortPage);
    let session = FeedSession::new(gateway, SyncConfig::new().with_page_size(7));
    session.bootstrap().await;
    session.set_filter("history").await.unwrap();

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.items.len(), 7);
    assert!(snapshot.more_available);

    // The second page is full too, so the server's "no more" is overruled.
    assert_eq!(
        session.load_more().await,
        Some(FetchOutcome::Appended { added: 7 })
    );
    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.items.len(), 14);
    assert!(snapshot.more_available);

    // An empty page is what finally ends the feed.
    assert_eq!(
        session.load_more().await,
        Some(FetchOutcome::Appended { added: 0 })
    );
    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.items.len(), 14);
    assert!(!snapshot.more_available);
    assert_eq!(session.load_more().await, None);
}

#[tokio::test]
async fn test_more_available_always_leads_somewhere() {
    for policy in [HasMorePolicy::ServerFlag, HasMorePolicy::ShortPage] {
        let gateway = InMemoryGateway::new(library())
            .with_catalog(vec!["culture", "history", "theory"])
            .with_policy(policy);
        let session = FeedSession::new(gateway, SyncConfig::new().with_page_size(3));
        session.bootstrap().await;
        session.set_filter("culture").await.unwrap();

        let mut loads = 0;
        while session.snapshot().await.more_available {
            assert!(session.load_more().await.is_some(), "{:?} stalled", policy);
            loads += 1;
            assert!(loads <= 4, "{:?} never ended", policy);
        }
        assert_eq!(session.snapshot().await.items.len(), 9);
        assert_eq!(session.load_more().await, None);
    }
}

#[tokio::test]
async fn test_same_filter_is_idempotent() {
    let gateway = Arc::new(InMemoryGateway::new(library()));
    let session = FeedSession::new(Arc::clone(&gateway), SyncConfig::new().with_page_size(5));
    session.bootstrap().await;
    session.set_filter("culture").await.unwrap();
    let calls = gateway.page_calls();

    for _ in 0..3 {
        assert_eq!(session.set_filter("culture").await.unwrap(), None);
    }
    assert_eq!(gateway.page_calls(), calls);
}

#[tokio::test]
async fn test_catalog_unions_with_initial_section() {
    let gateway = InMemoryGateway::new(library()).with_catalog(vec!["all", "culture"]);
    let config = SyncConfig::new().with_initial_section("theory");
    let session = FeedSession::new(gateway, config);
    session.bootstrap().await;

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.active_section, Section::new("theory"));
    assert_eq!(
        snapshot.sections,
        vec![Section::all(), Section::new("theory"), Section::new("culture")]
    );
    assert_eq!(snapshot.items.len(), 3);
}

// ============================================================================
// REFRESH SCHEDULER
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_refresh_tick_skipped_during_load_more() {
    let (session, mut pending) = scripted_session(
        SyncConfig::new().with_refresh_interval(Duration::from_secs(60)),
        mixed_first_page(),
    )
    .await;

    let more = tokio::spawn({
        let session = session.clone();
        async move { session.load_more().await }
    });
    let append_fetch = pending.next().await.unwrap();

    session.start().await;
    tokio::time::sleep(Duration::from_secs(150)).await;
    assert!(pending.try_next().is_none());

    append_fetch.respond(Ok(Page::new(items("x", "culture", 3), None, false)));
    more.await.unwrap();

    let metrics = session.stop().await.unwrap();
    assert_eq!(metrics.skipped, 2);
    assert_eq!(metrics.refreshes, 0);
    assert_eq!(session.snapshot().await.items.len(), 13);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_keeps_selection_when_present() {
    let gateway = Arc::new(InMemoryGateway::new(library()));
    let config = SyncConfig::new()
        .with_page_size(5)
        .with_refresh_interval(Duration::from_secs(30));
    let session = FeedSession::new(Arc::clone(&gateway), config);
    session.bootstrap().await;
    assert!(session.select_item("c-3").await);

    session.start().await;
    tokio::time::sleep(Duration::from_secs(31)).await;
    let metrics = session.stop().await.unwrap();
    assert_eq!(metrics.refreshes, 1);

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.selected.map(|i| i.id), Some("c-3".to_string()));
    assert_eq!(gateway.last_cursor(), Some(None));
}

#[tokio::test]
async fn test_bootstrap_without_catalog_or_stats() {
    let (gateway, mut pending) = ScriptedGateway::new();
    let session = FeedSession::new(gateway, SyncConfig::new());
    let boot = tokio::spawn({
        let session = session.clone();
        async move { session.bootstrap().await }
    });
    pending
        .next()
        .await
        .unwrap()
        .respond(Ok(Page::new(vec![item("only", "theory")], None, false)));

    assert_eq!(boot.await.unwrap(), FetchOutcome::Replaced { items: 1 });
    let snapshot = session.snapshot().await;
    assert!(snapshot.stats.is_none());
    assert_eq!(snapshot.selected.map(|i| i.id), Some("only".to_string()));
}

// ============================================================================
// PROPERTIES
// ============================================================================

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn arb_filter() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("all"),
        Just("culture"),
        Just("history"),
        Just("theory"),
        Just("unknown"),
    ]
}

proptest! {
    #[test]
    fn prop_selection_member_of_collection_after_each_filter(
        filters in prop::collection::vec(arb_filter(), 1..12),
        page_size in 1usize..8,
    ) {
        runtime().block_on(async {
            let gateway = InMemoryGateway::new(library())
                .with_catalog(vec!["culture", "history", "theory"]);
            let session = FeedSession::new(gateway, SyncConfig::new().with_page_size(page_size));
            session.bootstrap().await;

            for filter in filters {
                let _ = session.set_filter(filter).await;
                let snapshot = session.snapshot().await;
                if let Some(selected) = &snapshot.selected {
                    prop_assert!(snapshot.items.iter().any(|i| i.id == selected.id));
                }
                prop_assert!(snapshot
                    .items
                    .iter()
                    .all(|i| i.belongs_to(&snapshot.active_section)));
            }
            Ok::<(), TestCaseError>(())
        })?;
    }

    #[test]
    fn prop_appended_ids_stay_unique(
        first in arb_page(10),
        rest in prop::collection::vec(arb_page(10), 0..5),
    ) {
        let mut engine = PaginationEngine::new(HasMorePolicy::ServerFlag, 10);
        engine.replace(first);
        for page in rest {
            engine.append(page);
        }
        let mut ids: Vec<&str> = engine.items().iter().map(|i| i.id.as_str()).collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        prop_assert_eq!(ids.len(), total);
    }
}
