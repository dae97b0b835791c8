/// Tick deadlines.
///
/// Scheduled events are plain fields compared against the world tick counter
/// once per update. Cancelling is `clear()`; nothing is registered anywhere.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Deadline {
    at: Option<u64>,
}

impl Deadline {
    /// Arm the deadline `after` ticks from `now`, replacing any pending one.
    pub fn schedule(&mut self, now: u64, after: u64) {
        self.at = Some(now.saturating_add(after));
    }

    pub fn clear(&mut self) {
        self.at = None;
    }

    pub fn is_set(&self) -> bool {
        self.at.is_some()
    }

    /// Elapsed ≥ threshold. Does not disarm.
    pub fn due(&self, now: u64) -> bool {
        matches!(self.at, Some(at) if now >= at)
    }

    /// One-shot: true exactly once when due, then disarmed.
    pub fn fire(&mut self, now: u64) -> bool {
        if self.due(now) {
            self.at = None;
            true
        } else {
            false
        }
    }

    pub fn remaining(&self, now: u64) -> Option<u64> {
        self.at.map(|at| at.saturating_sub(now))
    }
}
