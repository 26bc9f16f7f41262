use std::sync::Arc;

use crate::cache::AnswerCache;
use crate::service::RankService;
use crate::store::ScoreStore;

/// Shared state handed to every handler.
pub struct HandlerState<S, C> {
    pub service: Arc<RankService<S, C>>,
}

impl<S, C> Clone for HandlerState<S, C> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

impl<S: ScoreStore, C: AnswerCache> HandlerState<S, C> {
    pub fn new(service: Arc<RankService<S, C>>) -> Self {
        Self { service }
    }
}
