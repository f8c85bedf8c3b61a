//! 按客户端的固定窗口限流器

use std::{
    collections::HashMap,
    sync::Mutex,
    time::{Duration, Instant},
};

use super::error::CoreError;
use crate::config::RateLimitConfig;

pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    /// 客户端 -> (窗口开始时间, 窗口内请求数)
    clients: Mutex<HashMap<String, (Instant, u32)>>,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.window(), config.max_requests)
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// 窗口长度（分钟，向上取整），用于提示信息
    pub fn window_minutes(&self) -> u64 {
        self.window.as_secs().div_ceil(60)
    }

    /// 记录一次请求，返回窗口内剩余次数
    pub fn check(&self, client: &str) -> Result<u32, CoreError> {
        self.check_at(client, Instant::now())
    }

    pub fn check_at(&self, client: &str, now: Instant) -> Result<u32, CoreError> {
        let mut clients = self
            .clients
            .lock()
            .map_err(|_| CoreError::Internal("rate limiter lock poisoned".to_string()))?;

        // 清理过期的记录
        let window = self.window;
        clients.retain(|_, (start, _)| now.duration_since(*start) < window);

        let (_, count) = clients.entry(client.to_string()).or_insert((now, 0));
        if *count >= self.max_requests {
            return Err(CoreError::RateLimited {
                window_minutes: self.window_minutes(),
            });
        }

        *count += 1;
        Ok(self.max_requests - *count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_within_window() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 2);
        let now = Instant::now();

        assert_eq!(limiter.check_at("1.2.3.4", now).unwrap(), 1);
        assert_eq!(limiter.check_at("1.2.3.4", now).unwrap(), 0);
        let err = limiter.check_at("1.2.3.4", now).unwrap_err();
        assert!(matches!(err, CoreError::RateLimited { window_minutes: 1 }));

        // 其他客户端不受影响
        assert_eq!(limiter.check_at("5.6.7.8", now).unwrap(), 1);
    }

    #[test]
    fn test_window_resets() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 1);
        let start = Instant::now();

        assert!(limiter.check_at("client", start).is_ok());
        assert!(limiter.check_at("client", start + Duration::from_secs(30)).is_err());
        assert!(limiter
            .check_at("client", start + Duration::from_secs(61))
            .is_ok());
    }

    #[test]
    fn test_window_minutes_rounds_up() {
        assert_eq!(RateLimiter::new(Duration::from_secs(900), 1).window_minutes(), 15);
        assert_eq!(RateLimiter::new(Duration::from_secs(30), 1).window_minutes(), 1);
    }
}
