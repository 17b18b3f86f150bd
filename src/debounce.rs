use std::time::Duration;

/// Coalesces bursts of input into a single pass.
///
/// Every call to [`Debouncer::schedule`] supersedes the previous one; a timer
/// that fires with an older ticket is ignored.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    generation: u64,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: 0,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Starts a new burst window and returns its ticket.
    pub fn schedule(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    /// Whether a timer carrying `ticket` is still the latest one.
    pub fn settle(&self, ticket: u64) -> bool {
        ticket == self.generation
    }
}

/// Waits out the delay and hands the ticket back.
pub async fn timer(delay: Duration, ticket: u64) -> u64 {
    tokio::time::sleep(delay).await;
    ticket
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_latest_ticket_settles() {
        let mut debouncer = Debouncer::new(Duration::from_millis(300));
        let first = debouncer.schedule();
        let second = debouncer.schedule();
        let third = debouncer.schedule();

        assert!(!debouncer.settle(first));
        assert!(!debouncer.settle(second));
        assert!(debouncer.settle(third));
    }

    #[test]
    fn settled_ticket_stays_valid_until_next_keystroke() {
        let mut debouncer = Debouncer::new(Duration::from_millis(300));
        let ticket = debouncer.schedule();
        assert!(debouncer.settle(ticket));
        assert!(debouncer.settle(ticket));

        debouncer.schedule();
        assert!(!debouncer.settle(ticket));
    }

    #[tokio::test]
    async fn timer_returns_its_ticket() {
        assert_eq!(timer(Duration::from_millis(1), 7).await, 7);
    }
}
