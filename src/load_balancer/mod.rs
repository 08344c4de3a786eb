// src/load_balancer/mod.rs
mod dispatcher;

pub use dispatcher::Dispatcher;
