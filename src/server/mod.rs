pub mod builder;
pub mod handler;
pub mod listener;

pub use builder::{accept_loop, ServerBuilder};
pub use handler::RequestHandler;
