//! Utils Module - Helper Functions & Shared Utilities
//!
//! Cache backends, retry, jitter, telemetry and validation shared by the
//! scanner, the API and the CLI.

pub mod cache;
pub mod constants;
pub mod jitter;
pub mod redis_cache;
pub mod retry;
pub mod telemetry;
pub mod validation;

pub use cache::*;
pub use constants::*;
pub use jitter::*;
pub use redis_cache::RedisScanCache;
pub use retry::{backoff_delay, with_retry};
pub use telemetry::*;
pub use validation::*;
