pub mod engine;
pub mod handlers;
pub mod service;
pub mod signals;
pub mod store;
pub mod tracing;
pub mod utils;
