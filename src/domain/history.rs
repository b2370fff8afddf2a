// Bounded per-tick history of ball state.
//
// Advisory: rollback correctness comes from re-simulation, not from replaying
// these snapshots. The buffer exists so debug tooling can inspect the last
// second of ball motion and so reconciliation can discard overwritten ticks.

use std::collections::VecDeque;

use glam::Vec3;

use crate::domain::ball::BallState;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistorySnapshot {
    pub tick: u64,
    pub pos: Vec3,
    pub vel: Vec3,
    pub spin: Vec3,
}

impl HistorySnapshot {
    pub fn of(tick: u64, ball: &BallState) -> Self {
        Self {
            tick,
            pos: ball.pos,
            vel: ball.vel,
            spin: ball.spin,
        }
    }
}

/// Fixed-capacity ring of snapshots, oldest first.
#[derive(Debug)]
pub struct SnapshotRing {
    buf: VecDeque<HistorySnapshot>,
    capacity: usize,
}

impl SnapshotRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, snapshot: HistorySnapshot) {
        if self.buf.len() == self.capacity {
            self.buf.pop_front();
        }
        self.buf.push_back(snapshot);
    }

    /// Drop every snapshot newer than `tick`; re-simulation will rewrite them.
    pub fn purge_after(&mut self, tick: u64) {
        while self.buf.back().is_some_and(|s| s.tick > tick) {
            self.buf.pop_back();
        }
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn latest(&self) -> Option<&HistorySnapshot> {
        self.buf.back()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(tick: u64) -> HistorySnapshot {
        HistorySnapshot::of(tick, &BallState::default())
    }

    #[test]
    fn capacity_is_bounded() {
        let mut ring = SnapshotRing::new(3);
        for tick in 0..10 {
            ring.push(snap(tick));
        }
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.latest().unwrap().tick, 9);
    }

    #[test]
    fn purge_drops_only_newer_ticks() {
        let mut ring = SnapshotRing::new(8);
        for tick in 0..8 {
            ring.push(snap(tick));
        }
        ring.purge_after(4);
        assert_eq!(ring.len(), 5);
        assert_eq!(ring.latest().unwrap().tick, 4);
    }
}
