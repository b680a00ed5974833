use anyhow::{Context, Result};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Process-wide spacing gate for outbound card lookups.
///
/// One cell per `spacing`, burst of one: the first caller passes immediately and
/// every later caller waits until `spacing` has elapsed since the previous one,
/// regardless of which request it belongs to.
#[derive(Clone)]
pub struct RateGate {
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    spacing: Duration,
}

impl RateGate {
    pub fn new(spacing: Duration) -> Result<Self> {
        let quota = Quota::with_period(spacing)
            .context("rate limit spacing must be non-zero")?
            .allow_burst(NonZeroU32::MIN);

        Ok(Self {
            limiter: Arc::new(RateLimiter::direct(quota)),
            spacing,
        })
    }

    pub async fn until_ready(&self) {
        self.limiter.until_ready().await;
    }

    pub fn spacing(&self) -> Duration {
        self.spacing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_zero_spacing_is_rejected() {
        assert!(RateGate::new(Duration::ZERO).is_err());
    }

    #[tokio::test]
    async fn test_consecutive_calls_are_spaced() {
        let gate = RateGate::new(Duration::from_millis(40)).unwrap();
        assert_eq!(gate.spacing(), Duration::from_millis(40));

        let start = Instant::now();
        for _ in 0..4 {
            gate.until_ready().await;
        }
        // first pass is free, three waits follow
        assert!(start.elapsed() >= Duration::from_millis(110));
    }

    #[tokio::test]
    async fn test_clones_share_the_same_budget() {
        let gate = RateGate::new(Duration::from_millis(50)).unwrap();
        let other = gate.clone();

        let start = Instant::now();
        gate.until_ready().await;
        other.until_ready().await;
        assert!(start.elapsed() >= Duration::from_millis(40));
    }
}
