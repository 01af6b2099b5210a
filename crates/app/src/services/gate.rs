use std::sync::atomic::{AtomicI64, Ordering};

/// Suppresses store writes until a wall-clock instant (epoch millis).
#[derive(Debug, Default)]
pub struct WriteGate {
    blocked_until_ms: AtomicI64,
}

impl WriteGate {
    pub fn is_blocked(&self, now_ms: i64) -> bool {
        now_ms < self.blocked_until_ms.load(Ordering::Acquire)
    }

    /// Extends the lockout; an earlier deadline never shortens it.
    pub fn block_until(&self, until_ms: i64) {
        self.blocked_until_ms.fetch_max(until_ms, Ordering::AcqRel);
    }

    pub fn blocked_until(&self) -> Option<i64> {
        match self.blocked_until_ms.load(Ordering::Acquire) {
            0 => None,
            until => Some(until),
        }
    }
}
