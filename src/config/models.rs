// src/config/models.rs
use crate::proxy::parse_address;
use anyhow::{bail, Result};
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Ordered; position defines the round-robin sequence.
    pub backends: Vec<String>,
    pub health_check: HealthCheckConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone)]
pub struct HealthCheckConfig {
    /// Joined onto each backend address. `None` probes the address itself.
    pub path: Option<String>,
    pub timeout_secs: u64,
    /// 0 means every selection attempt probes afresh.
    pub cache_ttl_ms: u64,
}

#[derive(Debug, Clone)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
    pub path: String,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            path: None,
            timeout_secs: 5,
            cache_ttl_ms: 0,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 9090,
            path: "/metrics".to_string(),
        }
    }
}

impl HealthCheckConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }
}

impl Config {
    pub fn listen_addr(&self) -> SocketAddr {
        ([0, 0, 0, 0], self.port).into()
    }

    pub fn validate(&self) -> Result<()> {
        if self.backends.is_empty() {
            bail!("At least one backend address is required");
        }
        for address in &self.backends {
            parse_address(address)?;
        }

        if self.health_check.timeout_secs == 0 {
            bail!("Health check timeout must be greater than zero");
        }

        if self.metrics.enabled {
            if self.metrics.port == self.port {
                bail!("Metrics port {} collides with the listen port", self.metrics.port);
            }
            if !self.metrics.path.starts_with('/') {
                bail!("Metrics path must start with '/': {:?}", self.metrics.path);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            port: 8080,
            backends: vec!["http://127.0.0.1:8001".into(), "http://127.0.0.1:8002".into()],
            health_check: HealthCheckConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn empty_backend_list_is_rejected() {
        let mut config = config();
        config.backends.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_backend_is_rejected() {
        let mut config = config();
        config.backends.push("localhost:8003".into());

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("localhost:8003"), "{err}");
    }

    #[test]
    fn zero_probe_timeout_is_rejected() {
        let mut config = config();
        config.health_check.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn metrics_port_must_differ_from_listen_port() {
        let mut config = config();
        config.metrics.enabled = true;
        config.metrics.port = 8080;
        assert!(config.validate().is_err());

        config.metrics.enabled = false;
        assert!(config.validate().is_ok());
    }
}
