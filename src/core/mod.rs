//! Core Module - Scoring Pipeline
//!
//! Holder enrichment, bundle detection, the Coal Score calculator and the
//! scan orchestrator that ties them to the gateway and the cache.

pub mod bundle_detector;
pub mod enrichment;
pub mod scanner;
pub mod score;

pub use bundle_detector::*;
pub use enrichment::*;
pub use scanner::*;
pub use score::*;
