use std::sync::Arc;

use tokio::sync::RwLock;

use crate::api::cache::LeaderboardCache;
use crate::checkin::CheckInService;
use crate::config::CacheConfig;
use crate::storage::ActivityRepository;

#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn ActivityRepository>,
    pub check_ins: Arc<CheckInService>,
    pub leaderboards: Arc<RwLock<LeaderboardCache>>,
}

impl AppState {
    pub fn new(repository: Arc<dyn ActivityRepository>, cache: &CacheConfig) -> Self {
        Self {
            check_ins: Arc::new(CheckInService::new(repository.clone())),
            repository,
            leaderboards: Arc::new(RwLock::new(LeaderboardCache::new(cache))),
        }
    }
}
