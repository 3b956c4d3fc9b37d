//! HTTP implementation of the remote gateway
//!
//! This crate provides:
//! - `HttpGateway`: reqwest-backed `RemoteGateway` against a REST remote
//! - `Prober`: periodic health-endpoint probe publishing reachability into a
//!   watch channel, for hosts without a platform connectivity signal

pub mod http;
pub mod probe;

// Re-exports
pub use http::HttpGateway;
pub use probe::Prober;
