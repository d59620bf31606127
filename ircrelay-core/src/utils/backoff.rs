use std::time::Duration;

/// How long the relay session waits before dialing the chat network again
/// after an attempt that never reached registration.
///
/// The wait starts at `first_delay` and grows by `growth` per unregistered
/// attempt, never exceeding `ceiling`. A successful registration resets it.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    pub first_delay: Duration,
    pub ceiling: Duration,
    pub growth: f64,
    /// Stop scheduling retries after this many attempts. `None` keeps
    /// trying forever.
    pub give_up_after: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            first_delay: Duration::from_secs(1),
            ceiling: Duration::from_secs(60),
            growth: 2.0,
            give_up_after: None,
        }
    }
}

impl ReconnectPolicy {
    /// Wait before the retry that follows `failures` unregistered attempts.
    pub fn delay_before(&self, failures: u32) -> Duration {
        let exponent = i32::try_from(failures).unwrap_or(i32::MAX);
        let secs = self.first_delay.as_secs_f64() * self.growth.powi(exponent);
        if secs.is_finite() && secs < self.ceiling.as_secs_f64() {
            Duration::from_secs_f64(secs)
        } else {
            self.ceiling
        }
    }

    /// Whether the session may dial again after `failures` attempts.
    pub fn allows(&self, failures: u32) -> bool {
        self.give_up_after.is_none_or(|limit| failures < limit)
    }
}
