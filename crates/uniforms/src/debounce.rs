use std::time::{Duration, Instant};

/// Trailing-edge debouncer driven by explicit timestamps.
///
/// Each `push` replaces the pending value and restarts the window; `poll`
/// yields the latest value once the window has elapsed without new input.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<Pending<T>>,
}

#[derive(Debug, Clone)]
struct Pending<T> {
    value: T,
    deadline: Instant,
}

impl<T> Debouncer<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some(Pending {
            value,
            deadline: now + self.window,
        });
    }

    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let ready = matches!(&self.pending, Some(pending) if now >= pending.deadline);
        if ready {
            self.pending.take().map(|pending| pending.value)
        } else {
            None
        }
    }

    /// Drops the pending value without firing.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|pending| pending.deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(500);

    #[test]
    fn fires_after_quiet_window() {
        let mut debouncer = Debouncer::new(WINDOW);
        let start = Instant::now();
        debouncer.push("a", start);
        assert_eq!(debouncer.poll(start + Duration::from_millis(499)), None);
        assert_eq!(debouncer.poll(start + WINDOW), Some("a"));
        assert!(!debouncer.is_pending());
        assert_eq!(debouncer.poll(start + WINDOW * 2), None, "fires only once");
    }

    #[test]
    fn new_input_resets_the_deadline() {
        let mut debouncer = Debouncer::new(WINDOW);
        let start = Instant::now();
        debouncer.push("first", start);
        debouncer.push("second", start + Duration::from_millis(400));
        assert_eq!(debouncer.poll(start + Duration::from_millis(600)), None);
        assert_eq!(
            debouncer.deadline(),
            Some(start + Duration::from_millis(900))
        );
        assert_eq!(
            debouncer.poll(start + Duration::from_millis(900)),
            Some("second")
        );
    }

    #[test]
    fn cancel_discards_pending_value() {
        let mut debouncer = Debouncer::new(WINDOW);
        let start = Instant::now();
        debouncer.push(1, start);
        assert!(debouncer.cancel());
        assert!(!debouncer.cancel());
        assert_eq!(debouncer.poll(start + WINDOW), None);
    }
}
