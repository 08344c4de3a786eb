// src/health/probe.rs
use super::HealthChecker;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::debug;
use url::Url;

/// Eager liveness probe: one GET per call, nothing remembered.
pub struct HttpProbe {
    client: Client,
    timeout: Duration,
}

#[derive(Debug)]
pub struct HealthCheckResult {
    pub target: String,
    pub healthy: bool,
    pub response_time_ms: u64,
    pub error: Option<String>,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to create health check client")?;

        Ok(Self { client, timeout })
    }

    pub async fn probe(&self, target: &Url) -> HealthCheckResult {
        let start = Instant::now();

        let result = timeout(self.timeout, self.client.get(target.clone()).send()).await;

        let (healthy, error) = match result {
            Ok(Ok(response)) => {
                let status = response.status();
                if status == StatusCode::OK {
                    (true, None)
                } else {
                    (false, Some(format!("HTTP {}", status)))
                }
            }
            Ok(Err(e)) => (false, Some(e.to_string())),
            Err(_) => (false, Some("Request timeout".to_string())),
        };

        HealthCheckResult {
            target: target.to_string(),
            healthy,
            response_time_ms: start.elapsed().as_millis() as u64,
            error,
        }
    }
}

#[async_trait]
impl HealthChecker for HttpProbe {
    async fn is_alive(&self, target: &Url) -> bool {
        let result = self.probe(target).await;
        if !result.healthy {
            debug!(
                "Probe of {} failed after {}ms: {:?}",
                result.target, result.response_time_ms, result.error
            );
        }
        result.healthy
    }

    fn name(&self) -> &'static str {
        "http_probe"
    }
}
