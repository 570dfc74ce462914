use rand::{thread_rng, Rng};
use tokio::time::{sleep, Duration};

/// Throttles task issuance: after every `every` launches, pause for `pause`.
///
/// Pacing is on launch, not completion, so in-flight work is never awaited
/// here. `every == 0` or a zero pause disables it.
#[derive(Debug, Clone)]
pub struct LaunchPacer {
    every: usize,
    pause: Duration,
    launched: usize,
}

impl LaunchPacer {
    pub fn new(every: usize, pause: Duration) -> Self {
        Self {
            every,
            pause,
            launched: 0,
        }
    }

    pub fn launched(&self) -> usize {
        self.launched
    }

    /// Record one launch, sleeping if it closes a group of `every`.
    pub async fn record_launch(&mut self) {
        self.launched += 1;
        if self.should_pause() {
            sleep(self.pause).await;
        }
    }

    fn should_pause(&self) -> bool {
        self.every > 0 && !self.pause.is_zero() && self.launched % self.every == 0
    }
}

/// Exponential backoff for image downloads. `max_retries == 0` means a single
/// attempt.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base: Duration::from_millis(300),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (0-indexed): `base * 2^retry` plus up
    /// to 25% jitter.
    pub fn delay(&self, retry: u32) -> Duration {
        let backoff = self.base.saturating_mul(2_u32.saturating_pow(retry));
        let jitter_cap = (backoff.as_millis() / 4) as u64;
        let jitter = if jitter_cap == 0 {
            0
        } else {
            thread_rng().gen_range(0..=jitter_cap)
        };
        backoff.saturating_add(Duration::from_millis(jitter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test]
    async fn pauses_after_each_full_group() {
        let pause = Duration::from_millis(40);
        let mut pacer = LaunchPacer::new(3, pause);

        let start = Instant::now();
        pacer.record_launch().await;
        pacer.record_launch().await;
        assert!(start.elapsed() < pause, "no pause before the group fills");

        pacer.record_launch().await;
        assert!(start.elapsed() >= pause);
        assert_eq!(pacer.launched(), 3);
    }

    #[tokio::test]
    async fn zero_group_disables_pacing() {
        let mut pacer = LaunchPacer::new(0, Duration::from_secs(5));
        let start = Instant::now();
        for _ in 0..20 {
            pacer.record_launch().await;
        }
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn retry_delay_grows_exponentially() {
        let policy = RetryPolicy {
            max_retries: 3,
            base: Duration::from_millis(100),
        };
        for (retry, floor) in [(0, 100u64), (1, 200), (2, 400)] {
            let d = policy.delay(retry);
            assert!(d >= Duration::from_millis(floor), "retry {retry}: {d:?}");
            assert!(d <= Duration::from_millis(floor + floor / 4), "retry {retry}: {d:?}");
        }
    }

    #[test]
    fn retry_delay_saturates() {
        let policy = RetryPolicy {
            max_retries: 100,
            base: Duration::from_secs(u64::MAX / 2),
        };
        assert!(policy.delay(40) > Duration::ZERO);
    }
}
