use planrun_core::config::RetryConfig;
use planrun_core::executor::RetryStrategyPlugin;
use std::time::Duration;

/// Plan faults that a fresh attempt cannot fix.
const FATAL_PREFIXES: &[&str] = &["Duplicate task ID"];

pub struct ExponentialBackoffPlugin {
    config: RetryConfig,
}

impl ExponentialBackoffPlugin {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }
}

impl RetryStrategyPlugin for ExponentialBackoffPlugin {
    fn name(&self) -> &str {
        "exponential-backoff"
    }

    fn next_delay(&self, attempt: u32, _error: &str) -> Option<Duration> {
        if attempt >= self.config.max_attempts {
            return None;
        }
        let exp = 1u64 << attempt.min(30);
        let delay = self.config.base_delay_secs.saturating_mul(exp);
        let delay = delay.min(self.config.max_delay_secs);
        Some(Duration::from_secs(delay))
    }

    fn max_attempts(&self) -> u32 {
        self.config.max_attempts
    }

    fn is_fatal_error(&self, error: &str) -> bool {
        FATAL_PREFIXES.iter().any(|prefix| error.starts_with(prefix))
    }
}
