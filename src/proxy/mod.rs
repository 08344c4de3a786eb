//
// src/proxy/mod.rs
//
mod backend;
mod error;
mod pool;
mod reverse;

pub use backend::Backend;
pub use error::{ConfigError, ProxyError};
pub use pool::{build_pool, http_client, parse_address, HttpClient};
pub use reverse::{ClientAddr, ReverseProxyBackend};
