// src/health/cached.rs
use super::HealthChecker;
use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};
use url::Url;

#[derive(Debug, Clone, Copy)]
struct CachedResult {
    alive: bool,
    checked_at: Instant,
}

/// Wraps another checker and reuses its verdict per target for `ttl`.
///
/// Cuts the number of probes issued while the dispatcher holds its cursor
/// lock, at the price of acting on liveness up to `ttl` old.
pub struct CachedHealthChecker<C> {
    inner: C,
    ttl: Duration,
    cache: DashMap<String, CachedResult>,
}

impl<C: HealthChecker> CachedHealthChecker<C> {
    pub fn new(inner: C, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cache: DashMap::new(),
        }
    }
}

#[async_trait]
impl<C: HealthChecker> HealthChecker for CachedHealthChecker<C> {
    async fn is_alive(&self, target: &Url) -> bool {
        let cached = self.cache.get(target.as_str()).map(|entry| *entry.value());
        if let Some(result) = cached {
            if result.checked_at.elapsed() < self.ttl {
                return result.alive;
            }
        }

        let alive = self.inner.is_alive(target).await;
        self.cache.insert(
            target.to_string(),
            CachedResult {
                alive,
                checked_at: Instant::now(),
            },
        );
        alive
    }

    fn name(&self) -> &'static str {
        "cached"
    }
}
