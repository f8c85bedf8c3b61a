use std::{sync::Arc, time::Instant};

use super::users::store::UserStore;
use crate::config::AppConfig;
use crate::core::rate_limit::RateLimiter;

/// 应用共享状态
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<UserStore>,
    pub rate_limiter: Arc<RateLimiter>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: AppConfig, users: UserStore) -> Self {
        let rate_limiter = RateLimiter::from_config(&config.rate_limit);
        Self {
            config: Arc::new(config),
            users: Arc::new(users),
            rate_limiter: Arc::new(rate_limiter),
            started_at: Instant::now(),
        }
    }
}
