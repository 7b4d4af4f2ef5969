use std::time::Duration;
use std::time::Instant;

/// Short-lived flag set after a patch so the rewritten source is not taken
/// for a new edit. It is released by [`SyncGuard::release_expired`], never
/// renewed while engaged.
#[derive(Debug, Clone)]
pub struct SyncGuard {
    window: Duration,
    engaged_until: Option<Instant>,
}

impl SyncGuard {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            engaged_until: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn engage(&mut self, now: Instant) {
        self.engaged_until = Some(now + self.window);
    }

    pub fn is_engaged(&self, now: Instant) -> bool {
        self.engaged_until.is_some_and(|until| now < until)
    }

    /// Drops the flag once its window has passed. Returns true when it did.
    pub fn release_expired(&mut self, now: Instant) -> bool {
        match self.engaged_until {
            Some(until) if now >= until => {
                self.engaged_until = None;
                true
            }
            _ => false,
        }
    }

    pub fn reset(&mut self) {
        self.engaged_until = None;
    }
}

#[cfg(test)]
mod tests {
    use super::SyncGuard;
    use std::time::Duration;
    use std::time::Instant;

    #[test]
    fn engaged_for_exactly_one_window() {
        let start = Instant::now();
        let mut guard = SyncGuard::new(Duration::from_millis(100));
        assert!(!guard.is_engaged(start));

        guard.engage(start);
        assert!(guard.is_engaged(start + Duration::from_millis(99)));
        assert!(!guard.release_expired(start + Duration::from_millis(50)));
        assert!(guard.release_expired(start + Duration::from_millis(100)));
        assert!(!guard.is_engaged(start + Duration::from_millis(100)));
    }

    #[test]
    fn zero_window_never_blocks() {
        let start = Instant::now();
        let mut guard = SyncGuard::new(Duration::ZERO);
        guard.engage(start);
        assert!(!guard.is_engaged(start));
    }
}
