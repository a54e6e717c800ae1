mod helpers;

use memlane::catalog::{InMemorySource, ItemSource, SqliteItemSource};
use memlane::feed::reasons::FeedReason;
use memlane::feed::{FeedOrchestrator, FixedClock};
use std::collections::HashSet;
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn orchestrator(items: Vec<memlane::catalog::types::Item>, seed: u64) -> FeedOrchestrator {
    let source: Arc<dyn ItemSource> = Arc::new(InMemorySource::new(items));
    FeedOrchestrator::new(source, &helpers::seeded_config(seed))
        .with_clock(Arc::new(FixedClock(helpers::test_now())))
}

fn ids(feed: &[memlane::feed::DisplayItem]) -> Vec<String> {
    feed.iter().map(|d| d.item.id.clone()).collect()
}

#[tokio::test]
async fn source_error_propagates_without_side_effects() {
    let source = Arc::new(helpers::FailingSource::default());
    let mut orch = FeedOrchestrator::new(source.clone(), &helpers::seeded_config(1));

    let err = orch.generate_feed(10).await.unwrap_err();
    assert!(err.to_string().contains("catalog unavailable"));
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);

    let stats = orch.algorithm_statistics();
    assert_eq!(stats.pages_generated, 0);
    assert_eq!(stats.display_state.global_position, 0);
    assert_eq!(stats.mixer_display_count, 0);
}

#[tokio::test]
async fn empty_catalog_gives_empty_feed() {
    let mut orch = orchestrator(Vec::new(), 1);
    let feed = orch.generate_feed(20).await.unwrap();
    assert!(feed.is_empty());
    assert_eq!(orch.algorithm_statistics().display_state.tracked_items, 0);
}

#[tokio::test]
async fn small_catalog_is_returned_whole() {
    let items = helpers::varied_catalog(5);
    let mut orch = orchestrator(items.clone(), 2);

    let feed = orch.generate_feed(10).await.unwrap();
    let got: HashSet<String> = ids(&feed).into_iter().collect();
    let want: HashSet<String> = items.into_iter().map(|i| i.id).collect();
    assert_eq!(got, want);
}

#[tokio::test]
async fn page_has_no_duplicates_and_respects_count() {
    let mut orch = orchestrator(helpers::varied_catalog(50), 3);
    let feed = orch.generate_feed(20).await.unwrap();

    assert!(!feed.is_empty());
    assert!(feed.len() <= 20);
    let unique: HashSet<String> = ids(&feed).into_iter().collect();
    assert_eq!(unique.len(), feed.len());

    for entry in &feed {
        assert!((0.0..=1.0).contains(&entry.algorithm_score));
        assert!(entry.display_score >= 0.0);
    }
}

#[tokio::test]
async fn displays_are_recorded_in_output_order() {
    let mut orch = orchestrator(helpers::varied_catalog(30), 4);
    let feed = orch.generate_feed(12).await.unwrap();
    let order = ids(&feed);

    let history: Vec<&str> = orch.mixer().recent_history().collect();
    assert_eq!(history, order.iter().map(String::as_str).collect::<Vec<_>>());

    let tracker = orch.tracker();
    assert_eq!(tracker.global_position(), order.len() as u64);
    for (position, id) in order.iter().enumerate() {
        let state = tracker.state(id).unwrap();
        assert_eq!(state.last_display_position, position as u64);
        assert_eq!(state.display_count, 1);
        assert!((state.display_penalty - 0.5).abs() < 1e-12);
    }
}

#[tokio::test]
async fn same_seed_same_pages() {
    let items = helpers::varied_catalog(40);
    let mut a = orchestrator(items.clone(), 42);
    let mut b = orchestrator(items, 42);

    for _ in 0..3 {
        let pa = a.generate_feed(10).await.unwrap();
        let pb = b.generate_feed(10).await.unwrap();
        assert_eq!(ids(&pa), ids(&pb));
        let ra: Vec<Option<FeedReason>> = pa.iter().map(|d| d.reason_type).collect();
        let rb: Vec<Option<FeedReason>> = pb.iter().map(|d| d.reason_type).collect();
        assert_eq!(ra, rb);
    }
}

#[tokio::test]
async fn consecutive_pages_move_through_catalog() {
    let mut orch = orchestrator(helpers::varied_catalog(60), 5);
    let mut seen = HashSet::new();
    for _ in 0..3 {
        seen.extend(ids(&orch.generate_feed(10).await.unwrap()));
    }
    assert!(seen.len() > 10, "only {} distinct items in 3 pages", seen.len());
}

#[tokio::test]
async fn reasons_attach_to_about_a_tenth() {
    let mut orch = orchestrator(helpers::varied_catalog(100), 6);

    let mut total = 0usize;
    let mut with_reason = 0usize;
    let mut kinds = HashSet::new();
    for _ in 0..120 {
        for entry in orch.generate_feed(100).await.unwrap() {
            total += 1;
            assert_eq!(entry.show_reason, entry.reason_type.is_some());
            assert_eq!(entry.show_reason, entry.reason_text.is_some());
            if let Some(kind) = entry.reason_type {
                with_reason += 1;
                kinds.insert(kind);
                assert!(!entry.reason_text.as_deref().unwrap_or("").is_empty());
            }
        }
    }

    assert_eq!(total, 12_000);
    let fraction = with_reason as f64 / total as f64;
    assert!((0.08..=0.12).contains(&fraction), "reason fraction {fraction}");
    assert_eq!(kinds.len(), FeedReason::ALL.len());
}

#[tokio::test]
async fn reset_clears_session() {
    let mut orch = orchestrator(helpers::varied_catalog(20), 7);
    orch.generate_feed(10).await.unwrap();
    assert!(orch.algorithm_statistics().display_state.tracked_items > 0);

    orch.reset_algorithm_state();
    let stats = orch.algorithm_statistics();
    assert_eq!(stats.display_state.tracked_items, 0);
    assert_eq!(stats.display_state.global_position, 0);
    assert_eq!(stats.mixer_display_count, 0);
    assert!(stats.recent_history.is_empty());
}

#[tokio::test]
async fn debug_info_reads_without_recording() {
    let mut orch = orchestrator(helpers::varied_catalog(20), 8);
    let feed = orch.generate_feed(5).await.unwrap();
    let shown = &feed[0].item.id;

    let info = orch.item_debug_info(shown).await.unwrap().unwrap();
    assert_eq!(&info.item.id, shown);
    assert!((0.0..=1.0).contains(&info.breakdown.total));
    assert!((0.3..=3.0).contains(&info.recovery_rate));
    assert!((5..=100).contains(&info.display.required_distance));
    assert_eq!(info.state.unwrap().display_count, 1);
    assert_eq!(info.recent_occurrences, 1);

    assert_eq!(orch.tracker().global_position(), feed.len() as u64);
    assert!(orch.item_debug_info("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn feed_from_sqlite_catalog() {
    let mut conn = helpers::test_db();
    helpers::seed_items(&mut conn, &helpers::varied_catalog(25));
    let source = Arc::new(SqliteItemSource::from_connection(conn));

    let mut orch = FeedOrchestrator::new(source, &helpers::seeded_config(9));
    let feed = orch.generate_feed(10).await.unwrap();
    assert!(!feed.is_empty());
    assert!(feed.len() <= 10);
}
