use std::time::Duration;

/// Default upper bound on the gap between two released characters.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(200);

/// Default time budget spread across the current backlog.
pub const DEFAULT_BUDGET: Duration = Duration::from_millis(2000);

/// Pacing parameters for the release loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingConfig {
    pub max_delay: Duration,
    pub budget: Duration,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            max_delay: DEFAULT_MAX_DELAY,
            budget: DEFAULT_BUDGET,
        }
    }
}

/// Delay before the next release: `min(max_delay, budget / queue_len)`.
///
/// A long backlog drains quickly; a short one settles at `max_delay` per
/// character. An empty queue yields `max_delay`.
pub fn pacing_delay(queue_len: usize, config: &PacingConfig) -> Duration {
    if queue_len == 0 {
        return config.max_delay;
    }
    let divisor = u32::try_from(queue_len).unwrap_or(u32::MAX);
    (config.budget / divisor).min(config.max_delay)
}
