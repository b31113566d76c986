//! Per-frame coalescing of pointer motion.
//!
//! Pointer-move events can arrive several times per display refresh. Only the
//! latest position matters, so moves are parked in a [`PointerCoalescer`] and
//! drained once per frame.

use crate::model::Point;

#[derive(Debug, Clone, Default)]
pub struct PointerCoalescer {
    pending: Option<Point>,
    received: u64,
    processed: u64,
}

impl PointerCoalescer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a move, replacing any position not yet processed.
    pub fn push(&mut self, point: Point) {
        self.pending = Some(point);
        self.received += 1;
    }

    /// The latest position since the previous call, if any.
    pub fn take(&mut self) -> Option<Point> {
        let point = self.pending.take()?;
        self.processed += 1;
        Some(point)
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop the pending position without processing it.
    pub fn discard(&mut self) {
        self.pending = None;
    }

    /// Number of moves pushed so far
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Number of moves handed out by [`take`](Self::take)
    pub fn processed(&self) -> u64 {
        self.processed
    }
}
