//! Service fixtures over the counting store and the mock answer cache.

use std::sync::Arc;

use ladder::model::Entity;
use ladder::{CountingScoreStore, MockAnswerCache, RankService, ScoreStore, ServiceConfig};

pub type TestService = RankService<CountingScoreStore, MockAnswerCache>;

pub struct Fixture {
    pub service: Arc<TestService>,
    pub store: Arc<CountingScoreStore>,
    pub cache: Arc<MockAnswerCache>,
}

impl Fixture {
    pub async fn new(config: ServiceConfig) -> Self {
        let store = Arc::new(CountingScoreStore::new());
        let cache = Arc::new(MockAnswerCache::new());
        let service = Arc::new(RankService::new(
            Arc::clone(&store),
            Arc::clone(&cache),
            config,
        ));
        Self {
            service,
            store,
            cache,
        }
    }

    /// Inserts straight into the store and clears the call counters.
    pub async fn with_entities(config: ServiceConfig, entities: &[(&str, &str, i32)]) -> Self {
        let fixture = Self::new(config).await;
        for (id, name, score) in entities {
            fixture
                .store
                .insert(Entity::new(*id, *name, *score))
                .await
                .expect("insert fixture entity");
        }
        fixture.store.reset_counts();
        fixture
    }
}

/// A(5000), B(4500), C(4500), D(2000).
pub const FOUR_PLAYERS: &[(&str, &str, i32)] = &[
    ("a", "alice", 5000),
    ("b", "bob", 4500),
    ("c", "carol", 4500),
    ("d", "dave", 2000),
];

/// `count` entities in runs of `run` equal scores, named so name order matches insertion order.
pub fn tied_runs(count: usize, run: usize) -> Vec<(String, String, i32)> {
    (0..count)
        .map(|i| {
            let score = 5000 - (i / run) as i32 * 10;
            (format!("id-{i:03}"), format!("p{i:03}"), score)
        })
        .collect()
}

pub fn as_refs(rows: &[(String, String, i32)]) -> Vec<(&str, &str, i32)> {
    rows.iter()
        .map(|(id, name, score)| (id.as_str(), name.as_str(), *score))
        .collect()
}
