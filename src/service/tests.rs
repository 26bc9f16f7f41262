use super::leaderboard::{assign_ranks, has_more, page_offset, window_around};
use super::*;
use crate::cache::MockAnswerCache;
use crate::constants::{ENTITY_TTL, LEADERBOARD_TTL, RANK_TTL};
use crate::store::CountingScoreStore;
use crate::validation::ValidationError;
use std::time::Duration;

type TestService = RankService<CountingScoreStore, MockAnswerCache>;

fn fixture(config: ServiceConfig) -> (TestService, CountingScoreStore, MockAnswerCache) {
    let store = CountingScoreStore::new();
    let cache = MockAnswerCache::new();
    let service = RankService::new(Arc::new(store.clone()), Arc::new(cache.clone()), config);
    (service, store, cache)
}

async fn seeded(
    rows: &[(&str, &str, i32)],
    config: ServiceConfig,
) -> (TestService, CountingScoreStore, MockAnswerCache) {
    let (service, store, cache) = fixture(config);
    for (id, name, score) in rows {
        store
            .inner()
            .insert(Entity::new(*id, *name, *score))
            .await
            .unwrap();
    }
    (service, store, cache)
}

fn assert_ttl(cache: &MockAnswerCache, key: &str, expected: Duration) {
    let ttl = cache
        .ttl(key)
        .unwrap_or_else(|| panic!("{key} is not cached"));
    assert!(
        ttl <= expected && expected - ttl < Duration::from_secs(1),
        "{key}: ttl {ttl:?}, expected {expected:?}"
    );
}

fn row(id: &str, name: &str, score: i32) -> Entity {
    Entity::new(id, name, score)
}

#[test]
fn test_assign_ranks_shares_rank_within_page() {
    let rows = [
        row("a", "alice", 5000),
        row("b", "bob", 4500),
        row("c", "carol", 4500),
        row("d", "dave", 4000),
    ];
    let ranks: Vec<u64> = assign_ranks(&rows, 0, None)
        .into_iter()
        .map(|e| e.rank)
        .collect();
    assert_eq!(ranks, [1, 2, 2, 4]);
}

#[test]
fn test_assign_ranks_leading_rank_carries_tie_across_pages() {
    let rows = [row("c", "carol", 400), row("d", "dave", 400), row("e", "eve", 300)];

    let positional: Vec<u64> = assign_ranks(&rows, 2, None)
        .into_iter()
        .map(|e| e.rank)
        .collect();
    assert_eq!(positional, [3, 3, 5]);

    let exact: Vec<u64> = assign_ranks(&rows, 2, Some(2))
        .into_iter()
        .map(|e| e.rank)
        .collect();
    assert_eq!(exact, [2, 2, 5]);
}

#[test]
fn test_page_arithmetic() {
    assert_eq!(page_offset(1, 50), 0);
    assert_eq!(page_offset(3, 50), 100);
    assert!(has_more(0, 50, 100));
    assert!(!has_more(50, 50, 100));
    assert!(!has_more(500, 50, 100));
}

#[test]
fn test_window_around() {
    assert_eq!(window_around(1, 10), (1, 20));
    assert_eq!(window_around(10, 10), (1, 20));
    assert_eq!(window_around(25, 10), (1, 20));
    assert_eq!(window_around(55, 10), (2, 20));
    assert_eq!(window_around(1_000, 5), (99, 10));
}

#[tokio::test]
async fn test_rank_missing_entity_is_not_found() {
    let (service, _, _) = fixture(ServiceConfig::default());

    let err = service.rank("ghost").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "entity 'ghost' does not exist");
    assert_eq!(service.ranks_in_flight(), 0);
}

#[tokio::test]
async fn test_rank_rejects_empty_id() {
    let (service, store, _) = fixture(ServiceConfig::default());
    assert!(matches!(
        service.rank("").await,
        Err(RankError::Validation(ValidationError::EmptyId))
    ));
    assert_eq!(store.total_reads(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_store_timeout_surfaces_timeout_error() {
    let config = ServiceConfig {
        store_timeout: Duration::from_millis(50),
        ..ServiceConfig::default()
    };
    let (service, store, _) = seeded(&[("a", "alice", 1000)], config).await;
    store.set_latency(Duration::from_millis(500));

    assert!(matches!(
        service.rank("a").await,
        Err(RankError::Timeout {
            operation: "get_by_id"
        })
    ));
}

#[tokio::test]
async fn test_store_failure_propagates() {
    let (service, store, _) = seeded(&[("a", "alice", 1000)], ServiceConfig::default()).await;
    store.set_failing(true);

    assert!(matches!(
        service.page(1, 10).await,
        Err(RankError::Store(StoreError::Unavailable(_)))
    ));
}

#[tokio::test]
async fn test_record_is_served_from_cache_once_warm() {
    let (service, store, _) = seeded(
        &[("a", "alice", 5000), ("b", "bob", 4000)],
        ServiceConfig::default(),
    )
    .await;

    let first = service.record("b").await.unwrap();
    assert_eq!(first.rank, 2);
    assert_eq!(first.entity.name, "bob");
    service.wait_for_background().await;

    let reads = store.total_reads();
    let second = service.record("b").await.unwrap();
    assert_eq!(second, first);
    assert_eq!(store.total_reads(), reads);
}

#[tokio::test]
async fn test_update_score_validates_and_requires_entity() {
    let (service, store, _) = seeded(&[("a", "alice", 1000)], ServiceConfig::default()).await;

    assert!(matches!(
        service.update_score("a", 99).await,
        Err(RankError::Validation(ValidationError::ScoreBelowMinimum { .. }))
    ));
    assert!(matches!(
        service.update_score("a", 5001).await,
        Err(RankError::Validation(ValidationError::ScoreAboveMaximum { .. }))
    ));
    assert_eq!(store.update_score_calls(), 0);

    assert!(service.update_score("ghost", 500).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_update_score_queues_invalidation() {
    let (service, _, cache) = seeded(
        &[("a", "alice", 5000), ("b", "bob", 1000)],
        ServiceConfig::default(),
    )
    .await;
    service.record("b").await.unwrap();
    service.page(1, 10).await.unwrap();
    service.wait_for_background().await;
    assert!(cache.contains("entity:b"));
    assert!(cache.contains(LEADERBOARD_KEY));

    let updated = service.update_score("b", 4000).await.unwrap();
    assert_eq!(updated.entity.score, 4000);
    service.wait_for_background().await;

    assert!(!cache.contains("entity:b"));
    assert!(!cache.contains(LEADERBOARD_KEY));
    assert_eq!(service.rank("b").await.unwrap(), 2);
}

#[tokio::test]
async fn test_register_rejects_duplicate_name() {
    let (service, _, _) = fixture(ServiceConfig::default());

    let created = service.register("1", "  Alice ", 2000).await.unwrap();
    assert_eq!(created.entity.name, "Alice");
    assert_eq!(created.rank, 1);

    assert!(matches!(
        service.register("2", "ALICE", 3000).await,
        Err(RankError::AlreadyExists { .. })
    ));
    assert!(matches!(
        service.register("3", "a!", 3000).await,
        Err(RankError::Validation(_))
    ));
    assert!(matches!(
        service.register("1", "bob", 3000).await,
        Err(RankError::Store(StoreError::DuplicateId { .. }))
    ));
}

#[tokio::test]
async fn test_find_by_name() {
    let (service, _, _) = seeded(
        &[("a", "alice", 5000), ("b", "bob", 4000)],
        ServiceConfig::default(),
    )
    .await;

    let found = service.find_by_name("BOB").await.unwrap().unwrap();
    assert_eq!(found.entity.id, "b");
    assert_eq!(found.rank, 2);
    assert!(service.find_by_name("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn test_page_boundary_tie_resolution_is_configurable() {
    let rows = [
        ("a", "alice", 500),
        ("b", "bob", 400),
        ("c", "carol", 400),
        ("d", "dave", 400),
        ("e", "eve", 300),
    ];

    let (exact, _, _) = seeded(&rows, ServiceConfig::default()).await;
    let page = exact.page(2, 2).await.unwrap();
    let ranks: Vec<u64> = page.entries.iter().map(|e| e.rank).collect();
    assert_eq!(ranks, [2, 2]);

    let positional_config = ServiceConfig {
        exact_page_boundaries: false,
        ..ServiceConfig::default()
    };
    let (positional, _, _) = seeded(&rows, positional_config).await;
    let page = positional.page(2, 2).await.unwrap();
    let ranks: Vec<u64> = page.entries.iter().map(|e| e.rank).collect();
    assert_eq!(ranks, [3, 3]);
}

#[tokio::test]
async fn test_page_is_cached_until_invalidated() {
    let (service, store, _) = seeded(
        &[("a", "alice", 5000), ("b", "bob", 4000)],
        ServiceConfig::default(),
    )
    .await;

    let first = service.page(1, 10).await.unwrap();
    service.wait_for_background().await;
    let second = service.page(1, 10).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(store.page_calls(), 1);

    service.update_score("b", 4500).await.unwrap();
    service.wait_for_background().await;
    let third = service.page(1, 10).await.unwrap();
    assert_eq!(store.page_calls(), 2);
    assert_eq!(third.entries[1].score, 4500);
}

#[tokio::test]
async fn test_page_rejects_bad_arguments() {
    let (service, _, _) = fixture(ServiceConfig::default());
    assert!(matches!(
        service.page(0, 10).await,
        Err(RankError::Validation(ValidationError::PageNumber { page: 0 }))
    ));
    assert!(matches!(
        service.page(1, 1001).await,
        Err(RankError::Validation(ValidationError::PageSize { .. }))
    ));
    assert!(matches!(
        service.page_around("a", 0).await,
        Err(RankError::Validation(ValidationError::ContextSize { .. }))
    ));
}

#[tokio::test]
async fn test_page_around_contains_target_near_top() {
    let rows: Vec<(String, String, i32)> = (0..30)
        .map(|i| (format!("id{i}"), format!("player{i:02}"), 3000 - i * 10))
        .collect();
    let borrowed: Vec<(&str, &str, i32)> = rows
        .iter()
        .map(|(id, name, score)| (id.as_str(), name.as_str(), *score))
        .collect();
    let (service, _, _) = seeded(&borrowed, ServiceConfig::default()).await;

    let window = service.page_around("id4", 5).await.unwrap();
    assert_eq!(window.page, 1);
    assert_eq!(window.page_size, 10);
    assert!(window.entries.iter().any(|e| e.id == "id4"));

    assert!(service.page_around("ghost", 5).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_cache_outage_falls_back_to_store() {
    let (service, store, cache) = seeded(&[("a", "alice", 1000)], ServiceConfig::default()).await;
    cache.set_failing(true);

    assert!(!service.is_healthy().await);
    assert_eq!(service.rank("a").await.unwrap(), 1);
    assert_eq!(service.rank("a").await.unwrap(), 1);
    assert_eq!(store.count_greater_than_calls(), 2);

    cache.set_failing(false);
    assert!(service.is_healthy().await);
}

#[tokio::test]
async fn test_timed_out_write_is_still_invalidated() {
    let config = ServiceConfig {
        store_timeout: Duration::from_millis(30),
        ..ServiceConfig::default()
    };
    let (service, store, cache) = seeded(
        &[("a", "alice", 5000), ("b", "bob", 4500), ("d", "dave", 2000)],
        config,
    )
    .await;
    assert_eq!(service.rank("d").await.unwrap(), 3);
    store.set_write_latency(Duration::from_millis(100));

    assert!(matches!(
        service.update_score("d", 4600).await,
        Err(RankError::Timeout {
            operation: "update_score"
        })
    ));

    tokio::time::sleep(Duration::from_millis(200)).await;
    service.wait_for_background().await;

    assert_eq!(store.inner().get_by_id("d").await.unwrap().unwrap().score, 4600);
    assert!(!cache.contains("rank:d"));
    assert!(!cache.contains("entity:d"));
    assert_eq!(service.rank("d").await.unwrap(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_cached_rank_expires_after_rank_ttl() {
    let (service, store, cache) = seeded(
        &[("a", "alice", 5000), ("b", "bob", 4000)],
        ServiceConfig::default(),
    )
    .await;
    assert_eq!(service.rank("b").await.unwrap(), 2);
    assert_ttl(&cache, "rank:b", RANK_TTL);

    // Straight to the store, so nothing is invalidated.
    store.inner().update_score("b", 5000).await.unwrap();

    tokio::time::advance(RANK_TTL - Duration::from_secs(1)).await;
    assert_eq!(service.rank("b").await.unwrap(), 2);
    assert_eq!(store.count_greater_than_calls(), 1);

    tokio::time::advance(Duration::from_secs(2)).await;
    assert_eq!(service.rank("b").await.unwrap(), 1);
    assert_eq!(store.count_greater_than_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_cache_entries_carry_configured_ttls() {
    let (service, store, cache) = seeded(
        &[("a", "alice", 5000), ("b", "bob", 4000)],
        ServiceConfig::default(),
    )
    .await;
    service.record("b").await.unwrap();
    service.page(1, 10).await.unwrap();
    service.wait_for_background().await;

    assert_ttl(&cache, "entity:b", ENTITY_TTL);
    assert_ttl(&cache, "rank:b", RANK_TTL);
    assert_ttl(&cache, LEADERBOARD_KEY, LEADERBOARD_TTL);
    let pages = cache.keys_with_prefix("leaderboard:");
    assert_eq!(pages.len(), 1);
    assert_ttl(&cache, &pages[0], LEADERBOARD_TTL);

    tokio::time::advance(LEADERBOARD_TTL + Duration::from_secs(1)).await;
    assert!(cache.keys_with_prefix("leaderboard").is_empty());
    service.page(1, 10).await.unwrap();
    assert_eq!(store.page_calls(), 2);
}
