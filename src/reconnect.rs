use rand::random;
use std::time::Duration;

/// Policy controlling how stream re-establishment attempts are paced.
///
/// The default is a fixed 5 second delay with no backoff and no jitter,
/// retried indefinitely while the collector stays unreachable.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    /// Base delay before an attempt in milliseconds
    pub delay_ms: u64,

    /// Multiplier applied per consecutive failed attempt; 1.0 keeps the
    /// delay fixed
    pub backoff_factor: f64,

    /// Ceiling for the delay in milliseconds when backoff is enabled
    pub max_delay_ms: u64,

    /// Whether to add jitter to delays
    pub jitter: bool,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            delay_ms: 5_000,
            backoff_factor: 1.0,
            max_delay_ms: 60_000,
            jitter: false,
        }
    }
}

impl ReconnectPolicy {
    /// A fixed-delay policy with no backoff and no jitter.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            delay_ms: delay.as_millis() as u64,
            ..Self::default()
        }
    }

    /// Same policy with jitter enabled.
    pub fn with_jitter(mut self) -> Self {
        self.jitter = true;
        self
    }

    /// Delay before reconnect attempt number `attempt` (1-based, counting
    /// consecutive failures since the last healthy stream).
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31) as i32;
        let scaled = self.delay_ms as f64 * self.backoff_factor.powi(exponent);
        let mut delay_ms = scaled.min(self.max_delay_ms as f64) as u64;

        if self.jitter {
            delay_ms += random::<u64>() % 100;
        }

        Duration::from_millis(delay_ms)
    }
}

/// Builder for custom reconnect policies
pub struct ReconnectPolicyBuilder {
    policy: ReconnectPolicy,
}

impl ReconnectPolicyBuilder {
    pub fn new() -> Self {
        Self {
            policy: ReconnectPolicy::default(),
        }
    }

    pub fn delay(mut self, delay_ms: u64) -> Self {
        self.policy.delay_ms = delay_ms;
        self
    }

    pub fn backoff_factor(mut self, factor: f64) -> Self {
        self.policy.backoff_factor = factor;
        self
    }

    pub fn max_delay(mut self, delay_ms: u64) -> Self {
        self.policy.max_delay_ms = delay_ms;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.policy.jitter = jitter;
        self
    }

    pub fn build(self) -> ReconnectPolicy {
        self.policy
    }
}

impl Default for ReconnectPolicyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_policy_never_escalates() {
        let policy = ReconnectPolicy::fixed(Duration::from_secs(5));
        for attempt in 1..=10 {
            assert_eq!(policy.delay(attempt), Duration::from_secs(5));
        }
    }

    #[test]
    fn backoff_grows_and_caps() {
        let policy = ReconnectPolicyBuilder::new()
            .delay(1_000)
            .backoff_factor(2.0)
            .max_delay(10_000)
            .build();

        assert_eq!(policy.delay(1), Duration::from_millis(1_000));
        assert_eq!(policy.delay(2), Duration::from_millis(2_000));
        assert_eq!(policy.delay(3), Duration::from_millis(4_000));
        assert_eq!(policy.delay(5), Duration::from_millis(10_000));
        assert_eq!(policy.delay(12), Duration::from_millis(10_000));
    }

    #[test]
    fn jitter_stays_near_base_delay() {
        let policy = ReconnectPolicy::fixed(Duration::from_secs(5)).with_jitter();
        for attempt in 1..=10 {
            let delay = policy.delay(attempt);
            assert!(delay >= Duration::from_millis(5_000));
            assert!(delay < Duration::from_millis(5_100));
        }
    }
}
