use std::cell::Cell;
use std::time::{Duration, Instant};

/// Cooperative wall-clock budget shared by every engine invocation of a
/// single pipeline run.
///
/// The budget is polled, never raised: engines that observe an expiry
/// return a degenerate whole-sequence result and keep going. Expiry is
/// monotonic, once the deadline has passed the budget reports exhaustion
/// for the rest of the run even if the clock readings would disagree.
pub struct Budget {
    deadline: Option<Instant>,
    expired: Cell<bool>,
}

impl Budget {
    /// A budget that never expires.
    pub fn unlimited() -> Budget {
        Budget {
            deadline: None,
            expired: Cell::new(false),
        }
    }

    /// A budget of `ms` milliseconds starting now. `0` means unlimited.
    pub fn from_millis(ms: u64) -> Budget {
        if ms == 0 {
            return Budget::unlimited();
        }
        Budget {
            deadline: Some(Instant::now() + Duration::from_millis(ms)),
            expired: Cell::new(false),
        }
    }

    /// `true` while there is time left. Latches to `false` permanently.
    pub fn is_inside_budget(&self) -> bool {
        if self.expired.get() {
            return false;
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                tracing::debug!("diff computation budget expired");
                self.expired.set(true);
                false
            }
            _ => true,
        }
    }

    /// Whether any caller has observed the expiry.
    pub fn hit(&self) -> bool {
        self.expired.get()
    }

    #[cfg(test)]
    pub(crate) fn already_expired() -> Budget {
        Budget {
            deadline: Some(Instant::now()),
            expired: Cell::new(true),
        }
    }
}
