// src/config/mod.rs
mod models;

pub use models::*;

use anyhow::Result;
use clap::Parser;
use std::ffi::OsString;

/// Round-robin reverse proxy over a fixed backend pool.
#[derive(Debug, Parser)]
#[command(name = "roundrobin-proxy", version, about)]
pub struct Cli {
    /// Port to accept client traffic on
    #[arg(short, long, env = "LB_PORT", default_value_t = 8080)]
    port: u16,

    /// Backend address (scheme + host); repeat or comma-separate. Order is the rotation order.
    #[arg(
        short,
        long = "backend",
        env = "LB_BACKENDS",
        value_delimiter = ',',
        required = true
    )]
    backends: Vec<String>,

    /// Path probed on each backend; defaults to the backend address itself
    #[arg(long, env = "LB_HEALTH_PATH")]
    health_path: Option<String>,

    #[arg(long, env = "LB_PROBE_TIMEOUT_SECS", default_value_t = 5)]
    probe_timeout_secs: u64,

    /// Reuse probe results for this long; 0 probes on every selection attempt
    #[arg(long, env = "LB_PROBE_CACHE_TTL_MS", default_value_t = 0)]
    probe_cache_ttl_ms: u64,

    /// Serve Prometheus metrics on a separate port
    #[arg(long, env = "LB_METRICS")]
    metrics: bool,

    #[arg(long, env = "LB_METRICS_PORT", default_value_t = 9090)]
    metrics_port: u16,

    #[arg(long, env = "LB_METRICS_PATH", default_value = "/metrics")]
    metrics_path: String,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Config {
            port: cli.port,
            backends: cli.backends,
            health_check: HealthCheckConfig {
                path: cli.health_path,
                timeout_secs: cli.probe_timeout_secs,
                cache_ttl_ms: cli.probe_cache_ttl_ms,
            },
            metrics: MetricsConfig {
                enabled: cli.metrics,
                port: cli.metrics_port,
                path: cli.metrics_path,
            },
        }
    }
}

/// Load configuration from the process arguments and environment.
///
/// Argument errors print usage and exit, like any clap binary.
pub fn load_config() -> Result<Config> {
    let config: Config = Cli::parse().into();
    config.validate()?;
    Ok(config)
}

/// Same as [`load_config`] but from an explicit argument list, returning parse errors.
pub fn load_config_from<I, T>(args: I) -> Result<Config>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let config: Config = Cli::try_parse_from(args)?.into();
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backends_keep_command_line_order() {
        let config = load_config_from([
            "roundrobin-proxy",
            "--backend",
            "http://127.0.0.1:8002",
            "-b",
            "http://127.0.0.1:8001,http://127.0.0.1:8003",
        ])
        .unwrap();

        assert_eq!(
            config.backends,
            ["http://127.0.0.1:8002", "http://127.0.0.1:8001", "http://127.0.0.1:8003"]
        );
        assert_eq!(config.port, 8080);
        assert_eq!(config.health_check.path, None);
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn probe_and_metrics_flags_are_applied() {
        let config = load_config_from([
            "roundrobin-proxy",
            "--port",
            "9000",
            "--backend",
            "https://www.example.com/",
            "--health-path",
            "/healthz",
            "--probe-timeout-secs",
            "2",
            "--probe-cache-ttl-ms",
            "750",
            "--metrics",
            "--metrics-port",
            "9100",
        ])
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.health_check.path.as_deref(), Some("/healthz"));
        assert_eq!(config.health_check.timeout_secs, 2);
        assert_eq!(config.health_check.cache_ttl_ms, 750);
        assert!(config.metrics.enabled);
        assert_eq!(config.metrics.port, 9100);
        assert_eq!(config.metrics.path, "/metrics");
    }

    #[test]
    fn malformed_backend_aborts_loading() {
        let result = load_config_from(["roundrobin-proxy", "--backend", "ftp://files.local"]);
        assert!(result.is_err());
    }
}
