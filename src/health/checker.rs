// src/health/checker.rs
use super::{CachedHealthChecker, HttpProbe};
use crate::config::HealthCheckConfig;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

/// Liveness policy consulted by every backend before it is selected.
///
/// Swapping the implementation changes how fresh liveness is without the
/// dispatcher's selection loop knowing about it.
#[async_trait]
pub trait HealthChecker: Send + Sync {
    async fn is_alive(&self, target: &Url) -> bool;

    fn name(&self) -> &'static str;
}

pub fn create_health_checker(config: &HealthCheckConfig) -> Result<Arc<dyn HealthChecker>> {
    let probe = HttpProbe::new(config.timeout())?;

    let checker: Arc<dyn HealthChecker> = if config.cache_ttl().is_zero() {
        Arc::new(probe)
    } else {
        Arc::new(CachedHealthChecker::new(probe, config.cache_ttl()))
    };

    tracing::info!(
        "Using {} health checker (timeout {:?}, cache ttl {:?})",
        checker.name(),
        config.timeout(),
        config.cache_ttl()
    );
    Ok(checker)
}
