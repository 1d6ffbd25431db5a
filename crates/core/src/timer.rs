//! Drop timer - deterministic accumulator for the automatic drop driver
//!
//! The owner feeds elapsed milliseconds with [`DropTimer::advance`] and drains due drops with
//! [`DropTimer::fire`]. A stopped timer ignores elapsed time; restarting re-reads the
//! interval and discards partial progress.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropTimer {
    interval_ms: u32,
    elapsed_ms: u32,
    running: bool,
}

impl DropTimer {
    /// A stopped timer with the given interval.
    pub fn new(interval_ms: u32) -> Self {
        Self {
            interval_ms: interval_ms.max(1),
            elapsed_ms: 0,
            running: false,
        }
    }

    pub fn start(&mut self, interval_ms: u32) {
        self.interval_ms = interval_ms.max(1);
        self.elapsed_ms = 0;
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.elapsed_ms = 0;
    }

    /// Same as `start`; named for the level-up path.
    pub fn restart(&mut self, interval_ms: u32) {
        self.start(interval_ms);
    }

    pub fn advance(&mut self, elapsed_ms: u32) {
        if self.running {
            self.elapsed_ms = self.elapsed_ms.saturating_add(elapsed_ms);
        }
    }

    /// Consume one due interval, if any.
    pub fn fire(&mut self) -> bool {
        if self.running && self.elapsed_ms >= self.interval_ms {
            self.elapsed_ms -= self.interval_ms;
            true
        } else {
            false
        }
    }

    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    pub fn elapsed_ms(&self) -> u32 {
        self.elapsed_ms
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl Default for DropTimer {
    fn default() -> Self {
        Self::new(crate::types::DROP_INTERVALS[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopped_timer_never_fires() {
        let mut t = DropTimer::new(100);
        t.advance(1_000);
        assert!(!t.fire());
        assert_eq!(t.elapsed_ms(), 0);
    }

    #[test]
    fn fires_once_per_interval() {
        let mut t = DropTimer::new(0);
        t.start(100);
        t.advance(250);
        assert!(t.fire());
        assert!(t.fire());
        assert!(!t.fire());
        assert_eq!(t.elapsed_ms(), 50);
    }

    #[test]
    fn restart_discards_progress() {
        let mut t = DropTimer::default();
        t.start(800);
        t.advance(700);
        t.restart(700);
        assert_eq!(t.interval_ms(), 700);
        assert_eq!(t.elapsed_ms(), 0);
        assert!(!t.fire());
    }

    #[test]
    fn stop_clears_and_halts() {
        let mut t = DropTimer::default();
        t.start(100);
        t.advance(90);
        t.stop();
        t.advance(90);
        assert!(!t.is_running());
        assert!(!t.fire());
    }
}
