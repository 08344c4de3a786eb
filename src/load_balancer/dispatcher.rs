// src/load_balancer/dispatcher.rs
use crate::metrics::MetricsCollector;
use crate::proxy::{Backend, ConfigError, ProxyError};
use hyper::{Body, Request, Response};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Round-robin dispatcher over a fixed, ordered pool.
///
/// The cursor is the only state shared between requests. It advances by one
/// (mod pool size) for every candidate examined, alive or not.
///
/// The cursor lock is held while candidates are probed, so during an outage
/// concurrent selections queue behind each other for up to N probe round
/// trips. Selection stays strictly sequential in exchange; wrap the health
/// checker in a cache to shorten the hold time. Forwarding runs outside the
/// lock.
pub struct Dispatcher {
    backends: Vec<Arc<dyn Backend>>,
    cursor: Mutex<usize>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl Dispatcher {
    pub fn new(backends: Vec<Arc<dyn Backend>>) -> Result<Self, ConfigError> {
        if backends.is_empty() {
            return Err(ConfigError::EmptyPool);
        }

        Ok(Self {
            backends,
            cursor: Mutex::new(0),
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        metrics.set_backend_count(self.backends.len());
        self.metrics = Some(metrics);
        self
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// Never true; a dispatcher cannot be built over an empty pool.
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    pub fn addresses(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.address()).collect()
    }

    /// Current cursor position. Only a snapshot: it can move as soon as this returns.
    pub async fn cursor(&self) -> usize {
        *self.cursor.lock().await
    }

    /// Scan at most one full turn from the cursor and return the first live backend.
    pub async fn select_next(&self) -> Option<Arc<dyn Backend>> {
        let mut cursor = self.cursor.lock().await;
        let count = self.backends.len();

        for _ in 0..count {
            let candidate = &self.backends[*cursor];
            *cursor = (*cursor + 1) % count;

            if candidate.is_alive().await {
                info!("Selected backend: {}", candidate.address());
                if let Some(metrics) = &self.metrics {
                    metrics.record_selection(candidate.address());
                }
                return Some(candidate.clone());
            }

            debug!("Backend {} failed its liveness probe, skipping", candidate.address());
            if let Some(metrics) = &self.metrics {
                metrics.record_probe_failure(candidate.address());
            }
        }

        None
    }

    /// Select a backend and forward the exchange to it.
    ///
    /// With no live backend the client gets 503 and nothing is forwarded.
    /// A failed forward is not retried on another backend.
    pub async fn dispatch(&self, req: Request<Body>) -> Response<Body> {
        let backend = match self.select_next().await {
            Some(backend) => backend,
            None => {
                warn!("No live backend among {} candidates", self.backends.len());
                if let Some(metrics) = &self.metrics {
                    metrics.record_pool_exhausted();
                }
                return ProxyError::NoHealthyBackends.into();
            }
        };

        match backend.forward(req).await {
            Ok(response) => response,
            Err(e) => {
                error!("{}", e);
                if let Some(metrics) = &self.metrics {
                    metrics.record_forward_failure(backend.address());
                }
                e.into()
            }
        }
    }
}
