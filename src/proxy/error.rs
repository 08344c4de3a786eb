// src/proxy/error.rs
use hyper::{header, Body, Response, StatusCode};

/// Errors raised while dispatching one exchange.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("No healthy backends available")]
    NoHealthyBackends,

    #[error("Forwarding to {backend} failed: {source}")]
    Forward {
        backend: String,
        #[source]
        source: hyper::Error,
    },

    #[error("Cannot build upstream URI: {0}")]
    InvalidUri(#[from] hyper::http::Error),
}

/// Errors that make the pool unusable. Always fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Backend pool must contain at least one backend")]
    EmptyPool,

    #[error("Invalid backend address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },
}

// Convert ProxyError to a Hyper response so the client always gets one
impl From<ProxyError> for Response<Body> {
    fn from(err: ProxyError) -> Self {
        let (status, message) = match err {
            ProxyError::NoHealthyBackends => (StatusCode::SERVICE_UNAVAILABLE, "Service unavailable"),
            ProxyError::Forward { .. } => (StatusCode::BAD_GATEWAY, "Bad gateway"),
            ProxyError::InvalidUri(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };

        let mut response = Response::new(Body::from(message));
        *response.status_mut() = status;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        response
    }
}
