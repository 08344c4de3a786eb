// ────────────────────────────────
// src/proxy/reverse.rs
// Single-host reverse proxy backend built on the shared hyper client.
// ────────────────────────────────

use super::{parse_address, Backend, ConfigError, HttpClient, ProxyError};
use crate::health::HealthChecker;
use async_trait::async_trait;
use hyper::header::{self, HeaderMap, HeaderName, HeaderValue};
use hyper::{Body, Request, Response, Uri, Version};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tracing::debug;
use url::Url;

const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Peer address of the inbound connection, attached to each request as an
/// extension by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientAddr(pub SocketAddr);

pub struct ReverseProxyBackend {
    address: String,
    url: Url,
    probe_url: Url,
    authority: String,
    host_header: HeaderValue,
    client: HttpClient,
    checker: Arc<dyn HealthChecker>,
}

impl ReverseProxyBackend {
    /// Build a backend for `address` (scheme + host, optionally port and base path).
    ///
    /// `health_path` is joined onto the address for liveness probes; without
    /// it the address itself is probed.
    pub fn new(
        address: &str,
        client: HttpClient,
        checker: Arc<dyn HealthChecker>,
        health_path: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let url = parse_address(address)?;

        // Same joining rule as forwarded paths, so a base path is kept.
        let probe_url = match health_path {
            Some(path) => {
                let (path, query) = match path.split_once('?') {
                    Some((path, query)) => (path, Some(query)),
                    None => (path, None),
                };
                let mut probe_url = url.clone();
                probe_url.set_path(&join_paths(url.path(), path));
                if query.is_some() {
                    probe_url.set_query(query);
                }
                probe_url
            }
            None => url.clone(),
        };

        let host = url.host_str().unwrap_or_default();
        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let host_header =
            HeaderValue::from_str(&authority).map_err(|e| ConfigError::InvalidAddress {
                address: address.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            address: address.to_string(),
            url,
            probe_url,
            authority,
            host_header,
            client,
            checker,
        })
    }

    pub fn probe_url(&self) -> &Url {
        &self.probe_url
    }

    fn upstream_uri(&self, inbound: &Uri) -> Result<Uri, ProxyError> {
        let path = join_paths(self.url.path(), inbound.path());
        let target_query = self.url.query().filter(|q| !q.is_empty());
        let inbound_query = inbound.query().filter(|q| !q.is_empty());

        let path_and_query = match (target_query, inbound_query) {
            (Some(a), Some(b)) => format!("{path}?{a}&{b}"),
            (Some(q), None) | (None, Some(q)) => format!("{path}?{q}"),
            (None, None) => path,
        };

        let uri = Uri::builder()
            .scheme(self.url.scheme())
            .authority(self.authority.as_str())
            .path_and_query(path_and_query)
            .build()?;
        Ok(uri)
    }

    fn rewrite_request(&self, req: Request<Body>) -> Result<Request<Body>, ProxyError> {
        let client_addr = req.extensions().get::<ClientAddr>().copied();
        let (mut parts, body) = req.into_parts();

        parts.uri = self.upstream_uri(&parts.uri)?;
        // The pooled client speaks HTTP/1.1 to upstreams regardless of the inbound version.
        parts.version = Version::HTTP_11;

        strip_hop_by_hop(&mut parts.headers);
        parts.headers.insert(header::HOST, self.host_header.clone());
        if let Some(ClientAddr(peer)) = client_addr {
            append_forwarded_for(&mut parts.headers, peer.ip());
        }

        Ok(Request::from_parts(parts, body))
    }
}

#[async_trait]
impl Backend for ReverseProxyBackend {
    fn address(&self) -> &str {
        &self.address
    }

    async fn is_alive(&self) -> bool {
        self.checker.is_alive(&self.probe_url).await
    }

    async fn forward(&self, req: Request<Body>) -> Result<Response<Body>, ProxyError> {
        let outbound = self.rewrite_request(req)?;
        debug!(backend = %self.address, uri = %outbound.uri(), "forwarding request");

        let mut response = self
            .client
            .request(outbound)
            .await
            .map_err(|source| ProxyError::Forward {
                backend: self.address.clone(),
                source,
            })?;

        strip_hop_by_hop(response.headers_mut());
        Ok(response)
    }
}

/// Join two path segments with exactly one slash between them.
fn join_paths(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{base}/{path}"),
        _ => format!("{base}{path}"),
    }
}

/// Remove connection-scoped headers, including any the peer listed in `Connection`.
fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP_HEADERS {
        headers.remove(*name);
    }
}

fn append_forwarded_for(headers: &mut HeaderMap, ip: IpAddr) {
    let prior: Vec<&str> = headers
        .get_all(X_FORWARDED_FOR)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect();

    let value = if prior.is_empty() {
        ip.to_string()
    } else {
        format!("{}, {}", prior.join(", "), ip)
    };

    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert(X_FORWARDED_FOR, value);
    }
}
