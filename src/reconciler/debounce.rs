/// Consecutive-failure counter that fires once every `threshold` failures.
///
/// The counter resets both on success and right after firing, so a probe
/// that keeps failing produces one alert per `threshold` cycles rather than
/// one per cycle.
#[derive(Debug, Clone)]
pub struct FailureDebounce {
    threshold: u32,
    count: u32,
}

impl FailureDebounce {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            count: 0,
        }
    }

    /// Record a failed probe. Returns the streak length when the threshold
    /// is reached, after which the counter starts again from zero.
    pub fn record_failure(&mut self) -> Option<u32> {
        self.count += 1;
        if self.count >= self.threshold {
            let streak = self.count;
            self.count = 0;
            Some(streak)
        } else {
            None
        }
    }

    pub fn record_success(&mut self) {
        self.count = 0;
    }

    #[cfg(test)]
    pub fn count(&self) -> u32 {
        self.count
    }
}

#[cfg(test)]
impl Default for FailureDebounce {
    fn default() -> Self {
        Self::new(3)
    }
}
