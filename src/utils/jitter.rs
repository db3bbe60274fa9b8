//! Injectable randomness
//!
//! Bundle detection scores and retry backoff both add jitter. Routing it
//! through a trait keeps tests deterministic.

use rand::Rng;

/// Source of uniform jitter values
pub trait JitterSource: Send + Sync {
    /// Uniform value in `[0, 1)`
    fn unit(&self) -> f64;

    /// Uniform value in `[low, high)`
    fn range(&self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.unit()
    }
}

/// Thread-local RNG backed jitter (production)
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngJitter;

impl JitterSource for ThreadRngJitter {
    fn unit(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Constant jitter for tests and reproducible runs
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedJitter(pub f64);

impl FixedJitter {
    pub fn zero() -> Self {
        Self(0.0)
    }
}

impl JitterSource for FixedJitter {
    fn unit(&self) -> f64 {
        self.0.clamp(0.0, 1.0 - f64::EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_rng_in_range() {
        let jitter = ThreadRngJitter;
        for _ in 0..1_000 {
            let value = jitter.range(0.0, 10.0);
            assert!((0.0..10.0).contains(&value));
        }
    }

    #[test]
    fn test_fixed_jitter() {
        assert_eq!(FixedJitter::zero().range(15.0, 25.0), 15.0);
        assert_eq!(FixedJitter(0.5).range(0.0, 10.0), 5.0);
        // Clamped below 1 so the upper bound stays exclusive
        assert!(FixedJitter(1.0).range(0.0, 10.0) < 10.0);
    }
}
