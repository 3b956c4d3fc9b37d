//! CLI command implementations

pub mod advance;
pub mod enqueue;
pub mod flush;
pub mod pending;
pub mod resume;
pub mod watch;
