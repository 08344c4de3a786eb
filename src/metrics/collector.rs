// src/metrics/collector.rs
use anyhow::Result;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub struct MetricsRegistry {
    registry: Registry,
    collector: Arc<MetricsCollector>,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let collector = Arc::new(MetricsCollector::new(&registry)?);

        Ok(Self {
            registry,
            collector,
        })
    }

    pub fn collector(&self) -> Arc<MetricsCollector> {
        self.collector.clone()
    }

    pub fn gather(&self) -> prometheus::Result<Vec<u8>> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(buffer)
    }
}

pub struct MetricsCollector {
    // Request metrics
    pub requests_total: IntCounterVec,
    pub request_duration_seconds: HistogramVec,

    // Selection metrics
    pub backend_selections_total: IntCounterVec,
    pub probe_failures_total: IntCounterVec,
    pub forward_failures_total: IntCounterVec,
    pub pool_exhausted_total: IntCounter,

    pub backends_total: IntGauge,
}

impl MetricsCollector {
    pub fn new(registry: &Registry) -> Result<Self> {
        let requests_total = IntCounterVec::new(
            Opts::new("lb_requests_total", "Total number of requests"),
            &["method", "status_code"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        let request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "lb_request_duration_seconds",
                "Request duration in seconds",
            ),
            &["method"],
        )?;
        registry.register(Box::new(request_duration_seconds.clone()))?;

        let backend_selections_total = IntCounterVec::new(
            Opts::new(
                "lb_backend_selections_total",
                "Times a backend was selected to serve a request",
            ),
            &["backend"],
        )?;
        registry.register(Box::new(backend_selections_total.clone()))?;

        let probe_failures_total = IntCounterVec::new(
            Opts::new(
                "lb_probe_failures_total",
                "Liveness probes that found a backend down",
            ),
            &["backend"],
        )?;
        registry.register(Box::new(probe_failures_total.clone()))?;

        let forward_failures_total = IntCounterVec::new(
            Opts::new(
                "lb_forward_failures_total",
                "Forwards that failed after the backend was selected",
            ),
            &["backend"],
        )?;
        registry.register(Box::new(forward_failures_total.clone()))?;

        let pool_exhausted_total = IntCounter::new(
            "lb_pool_exhausted_total",
            "Requests answered 503 because no backend was alive",
        )?;
        registry.register(Box::new(pool_exhausted_total.clone()))?;

        let backends_total = IntGauge::new("lb_backends_total", "Number of backends in the pool")?;
        registry.register(Box::new(backends_total.clone()))?;

        Ok(Self {
            requests_total,
            request_duration_seconds,
            backend_selections_total,
            probe_failures_total,
            forward_failures_total,
            pool_exhausted_total,
            backends_total,
        })
    }

    pub fn record_request(&self, method: &str, status_code: u16, duration: Duration) {
        let status = status_code.to_string();
        self.requests_total
            .with_label_values(&[method, &status])
            .inc();

        self.request_duration_seconds
            .with_label_values(&[method])
            .observe(duration.as_secs_f64());
    }

    pub fn record_selection(&self, backend: &str) {
        self.backend_selections_total
            .with_label_values(&[backend])
            .inc();
    }

    pub fn record_probe_failure(&self, backend: &str) {
        self.probe_failures_total.with_label_values(&[backend]).inc();
    }

    pub fn record_forward_failure(&self, backend: &str) {
        self.forward_failures_total
            .with_label_values(&[backend])
            .inc();
    }

    pub fn record_pool_exhausted(&self) {
        self.pool_exhausted_total.inc();
    }

    pub fn set_backend_count(&self, total: usize) {
        self.backends_total.set(total as i64);
    }
}

// Helper for timing operations
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
