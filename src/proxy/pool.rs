//
// src/proxy/pool.rs
//

use super::{Backend, ConfigError, ReverseProxyBackend};
use crate::health::HealthChecker;
use hyper::client::HttpConnector;
use hyper::{Body, Client};
use hyper_tls::HttpsConnector;
use std::sync::Arc;
use url::Url;

/// Shared upstream client. Cloning is cheap; all clones share one connection pool.
pub type HttpClient = Client<HttpsConnector<HttpConnector>, Body>;

pub fn http_client() -> HttpClient {
    Client::builder().build(HttpsConnector::new())
}

/// Parse and validate a backend address. Only absolute http(s) URLs with a host are accepted.
pub fn parse_address(address: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidAddress {
        address: address.to_string(),
        reason,
    };

    let url = Url::parse(address).map_err(|e| invalid(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme {other:?}"))),
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }

    Ok(url)
}

/// Build the ordered pool from backend addresses.
///
/// Order is preserved: it defines the round-robin sequence. All backends share
/// one HTTP client and one health checker.
pub fn build_pool(
    addresses: &[String],
    checker: Arc<dyn HealthChecker>,
    health_path: Option<&str>,
) -> Result<Vec<Arc<dyn Backend>>, ConfigError> {
    if addresses.is_empty() {
        return Err(ConfigError::EmptyPool);
    }

    let client = http_client();
    let mut backends: Vec<Arc<dyn Backend>> = Vec::with_capacity(addresses.len());

    for address in addresses {
        let backend =
            ReverseProxyBackend::new(address, client.clone(), checker.clone(), health_path)?;
        tracing::info!("Registered backend: {}", address);
        backends.push(Arc::new(backend));
    }

    Ok(backends)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::HttpProbe;
    use std::time::Duration;

    fn checker() -> Arc<dyn HealthChecker> {
        Arc::new(HttpProbe::new(Duration::from_secs(1)).unwrap())
    }

    #[test]
    fn accepts_http_and_https_addresses() {
        assert!(parse_address("http://localhost:8001").is_ok());
        assert!(parse_address("https://www.example.com/").is_ok());
    }

    #[test]
    fn rejects_malformed_addresses() {
        for address in ["not a url", "ftp://files.example.com", "http://", "unix:/tmp/sock"] {
            assert!(
                matches!(parse_address(address), Err(ConfigError::InvalidAddress { .. })),
                "{address} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn pool_preserves_address_order() {
        let addresses = vec![
            "http://127.0.0.1:8003".to_string(),
            "http://127.0.0.1:8001".to_string(),
            "http://127.0.0.1:8002".to_string(),
        ];

        let pool = build_pool(&addresses, checker(), None).unwrap();
        let built: Vec<&str> = pool.iter().map(|b| b.address()).collect();
        assert_eq!(built, ["http://127.0.0.1:8003", "http://127.0.0.1:8001", "http://127.0.0.1:8002"]);
    }

    #[tokio::test]
    async fn one_bad_address_fails_the_whole_pool() {
        let addresses = vec!["http://127.0.0.1:8001".to_string(), "bogus".to_string()];

        let err = build_pool(&addresses, checker(), None).err().unwrap();
        assert!(matches!(err, ConfigError::InvalidAddress { ref address, .. } if address == "bogus"));
    }

    #[test]
    fn empty_pool_is_rejected() {
        assert!(matches!(build_pool(&[], checker(), None), Err(ConfigError::EmptyPool)));
    }
}
