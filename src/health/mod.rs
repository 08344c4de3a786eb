// src/health/mod.rs
mod cached;
mod checker;
mod probe;

pub use cached::CachedHealthChecker;
pub use checker::{create_health_checker, HealthChecker};
pub use probe::{HealthCheckResult, HttpProbe};
