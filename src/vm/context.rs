//! Execution deadline (spec.md §5 "Cancellation/timeouts"): `set_time_limit`
//! installs a deadline that is checked at statement boundaries (the
//! `ext_stmt` opcode), not on every single instruction, matching the
//! teacher's own per-context mutable-state grouping
//! (`runtime/execution_context.rs`) adapted to a single `Instant` field
//! instead of a full scope chain.

use std::time::{Duration, Instant};

/// `None` means no limit has been installed (the default).
#[derive(Clone, Copy, Debug)]
pub struct Deadline {
    expires_at: Instant,
}

impl Deadline {
    pub fn from_seconds(seconds: u64) -> Self {
        Deadline { expires_at: Instant::now() + Duration::from_secs(seconds) }
    }

    pub fn expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_second_deadline_is_immediately_expired() {
        let deadline = Deadline::from_seconds(0);
        assert!(deadline.expired());
    }

    #[test]
    fn future_deadline_is_not_yet_expired() {
        let deadline = Deadline::from_seconds(60);
        assert!(!deadline.expired());
    }
}
