use std::time::Duration;
use tokio::time::sleep;

pub const ADAPTER_PAUSE: Duration = Duration::from_secs(1);

/// Fixed pause between bank adapters so the sites are not hit back to back.
pub struct RateLimiter {
    pause: Duration,
}

impl RateLimiter {
    pub fn new(pause: Duration) -> Self {
        Self { pause }
    }

    /// Wait before the next adapter runs
    pub async fn wait(&self) {
        if !self.pause.is_zero() {
            sleep(self.pause).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_wait_pauses_for_configured_duration() {
        let limiter = RateLimiter::new(Duration::from_millis(50));
        let start = Instant::now();
        limiter.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_zero_pause_returns_immediately() {
        let limiter = RateLimiter::new(Duration::ZERO);
        let start = Instant::now();
        limiter.wait().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
