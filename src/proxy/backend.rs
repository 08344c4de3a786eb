// src/proxy/backend.rs
use super::ProxyError;
use async_trait::async_trait;
use hyper::{Body, Request, Response};

/// One upstream target the dispatcher can hand an exchange to.
///
/// The exchange is hyper's request/response pair: the request goes in,
/// and the returned response is what the caller writes back to the client.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Immutable identifier of the upstream, exactly as supplied at construction.
    fn address(&self) -> &str;

    /// Synchronous liveness probe. Blocks the caller for one round trip and
    /// never fails: any error counts as "not alive".
    async fn is_alive(&self) -> bool;

    /// Proxy one exchange to this backend.
    async fn forward(&self, req: Request<Body>) -> Result<Response<Body>, ProxyError>;
}
