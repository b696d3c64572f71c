//! Fixed-window per-IP rate limiting for the generation endpoint.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{Duration, Instant};

/// Requests allowed per window for one client IP
pub const MAX_REQUESTS: u32 = 30;
/// Window length
pub const WINDOW: Duration = Duration::from_secs(60);

/// Rejection signal carrying the retry-after hint
#[derive(Debug, thiserror::Error, PartialEq)]
#[error("too many requests, retry after {retry_after:?}")]
pub struct TooManyRequests {
    pub retry_after: Duration,
}

/// Per-IP request window
#[derive(Debug, Clone, Copy)]
struct RateWindow {
    count: u32,
    window_start: Instant,
}

/// Rate limiter state
#[derive(Debug, Clone)]
pub struct RateLimiter {
    windows: Arc<RwLock<HashMap<String, RateWindow>>>,
    max_requests: u32,
    window: Duration,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(MAX_REQUESTS, WINDOW)
    }
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: Arc::new(RwLock::new(HashMap::new())),
            max_requests,
            window,
        }
    }

    /// Record a request from `ip` and decide whether to allow it.
    ///
    /// A fresh window starts at count 1 whenever none exists or the previous
    /// one is older than the window length. The counter only tracks accepted
    /// requests; rejected ones do not inflate it.
    pub async fn check(&self, ip: &str) -> Result<(), TooManyRequests> {
        let now = Instant::now();
        let mut windows = self.windows.write().await;

        match windows.get_mut(ip) {
            Some(window) => {
                if now.duration_since(window.window_start) >= self.window {
                    window.count = 1;
                    window.window_start = now;
                    Ok(())
                } else if window.count >= self.max_requests {
                    Err(TooManyRequests {
                        retry_after: self.window,
                    })
                } else {
                    window.count += 1;
                    Ok(())
                }
            }
            None => {
                windows.insert(
                    ip.to_string(),
                    RateWindow {
                        count: 1,
                        window_start: now,
                    },
                );
                Ok(())
            }
        }
    }

    /// Drop windows idle for two window lengths (call periodically).
    pub async fn cleanup(&self) {
        let now = Instant::now();
        let mut windows = self.windows.write().await;
        windows.retain(|_, w| now.duration_since(w.window_start) < self.window * 2);
    }
}

/// Spawn the periodic window cleanup.
pub fn spawn_limiter_cleanup(limiter: RateLimiter) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(WINDOW * 2);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            limiter.cleanup().await;
        }
    });
}
