//! Coal Scan HTTP API Module
//! REST surface over the scan orchestrator

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod types;

pub use handlers::AppState;
pub use middleware::{RateLimitConfig, RateLimiter};
pub use routes::create_router;
pub use types::*;
