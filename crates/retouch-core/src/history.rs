//! Bounded undo/redo history.
//!
//! A ring of snapshots with a cursor pointing at the state on screen.
//! Pushing a new snapshot drops everything after the cursor (the redo tail),
//! and the oldest snapshot is evicted once the ring is full.

use std::collections::VecDeque;
use std::rc::Rc;

use crate::decode::ImageAsset;
use crate::state::AdjustmentState;

/// Default number of snapshots kept.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// One restorable editor state.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub asset: Rc<ImageAsset>,
    pub adjustments: AdjustmentState,
    /// Milliseconds since the Unix epoch when the entry was recorded
    pub timestamp_ms: f64,
}

impl PartialEq for HistoryEntry {
    /// Entries are equal when they restore the same asset allocation and
    /// adjustments. Timestamps are ignored.
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.asset, &other.asset) && self.adjustments == other.adjustments
    }
}

/// Clock used to stamp entries, returning milliseconds since the Unix epoch.
pub type Clock = fn() -> f64;

/// Wall-clock time from the standard library.
pub fn system_clock() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    /// Index of the entry on screen; meaningless while `entries` is empty
    cursor: usize,
    limit: usize,
    clock: Clock,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT, system_clock)
    }
}

impl History {
    /// Create an empty history keeping at most `limit` entries (minimum 1).
    pub fn new(limit: usize, clock: Clock) -> Self {
        let limit = limit.max(1);
        Self {
            entries: VecDeque::with_capacity(limit),
            cursor: 0,
            limit,
            clock,
        }
    }

    /// Record a new state after the cursor.
    ///
    /// Any redo entries are discarded. When the ring is full the oldest
    /// entry is evicted.
    pub fn push(&mut self, asset: Rc<ImageAsset>, adjustments: AdjustmentState) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }

        self.entries.push_back(HistoryEntry {
            asset,
            adjustments,
            timestamp_ms: (self.clock)(),
        });
        while self.entries.len() > self.limit {
            self.entries.pop_front();
        }
        self.cursor = self.entries.len() - 1;
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty() && self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        !self.entries.is_empty() && self.cursor + 1 < self.entries.len()
    }

    /// Step back one entry.
    ///
    /// # Returns
    ///
    /// The entry to restore, or `None` when already at the oldest entry.
    pub fn undo(&mut self) -> Option<&HistoryEntry> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor)
    }

    /// Step forward one entry.
    pub fn redo(&mut self) -> Option<&HistoryEntry> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor)
    }

    /// The entry on screen.
    pub fn current(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.cursor)
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Forget every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_clock() -> f64 {
        1_700_000_000_000.0
    }

    fn asset() -> Rc<ImageAsset> {
        Rc::new(ImageAsset::new(1, 1, vec![0, 0, 0, 255]))
    }

    fn brightness(v: f32) -> AdjustmentState {
        AdjustmentState {
            brightness: v,
            ..AdjustmentState::default()
        }
    }

    #[test]
    fn test_empty_history() {
        let mut history = History::new(50, fixed_clock);
        assert!(history.is_empty());
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());
        assert!(history.current().is_none());
    }

    #[test]
    fn test_single_entry_cannot_undo() {
        let mut history = History::new(50, fixed_clock);
        history.push(asset(), AdjustmentState::default());
        assert!(!history.can_undo());
        assert_eq!(history.current().unwrap().timestamp_ms, fixed_clock());
    }

    #[test]
    fn test_undo_redo_restores_states() {
        let mut history = History::new(50, fixed_clock);
        let img = asset();
        for v in [100.0, 110.0, 120.0] {
            history.push(Rc::clone(&img), brightness(v));
        }

        assert_eq!(history.undo().unwrap().adjustments, brightness(110.0));
        assert_eq!(history.undo().unwrap().adjustments, brightness(100.0));
        assert!(history.undo().is_none());
        assert_eq!(history.redo().unwrap().adjustments, brightness(110.0));
        assert_eq!(history.redo().unwrap().adjustments, brightness(120.0));
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_undo_restores_same_asset() {
        let mut history = History::new(50, fixed_clock);
        let first = asset();
        history.push(Rc::clone(&first), AdjustmentState::default());
        history.push(asset(), AdjustmentState::default());

        let restored = history.undo().unwrap();
        assert!(Rc::ptr_eq(&restored.asset, &first));
    }

    #[test]
    fn test_push_truncates_redo_tail() {
        let mut history = History::new(50, fixed_clock);
        let img = asset();
        for v in [100.0, 110.0, 120.0] {
            history.push(Rc::clone(&img), brightness(v));
        }
        history.undo();
        history.undo();
        history.push(Rc::clone(&img), brightness(150.0));

        assert_eq!(history.len(), 2);
        assert!(!history.can_redo());
        let values: Vec<f32> = history.entries().map(|e| e.adjustments.brightness).collect();
        assert_eq!(values, vec![100.0, 150.0]);
    }

    #[test]
    fn test_sixty_edits_keep_last_fifty() {
        let mut history = History::new(50, fixed_clock);
        let img = asset();
        for i in 0..60 {
            history.push(Rc::clone(&img), brightness(i as f32));
        }

        assert_eq!(history.len(), 50);
        assert_eq!(history.cursor(), 49);
        let values: Vec<f32> = history.entries().map(|e| e.adjustments.brightness).collect();
        let expected: Vec<f32> = (10..60).map(|i| i as f32).collect();
        assert_eq!(values, expected);

        let mut undos = 0;
        while history.undo().is_some() {
            undos += 1;
        }
        assert_eq!(undos, 49);
        assert_eq!(history.current().unwrap().adjustments, brightness(10.0));
    }

    #[test]
    fn test_zero_limit_keeps_one() {
        let mut history = History::new(0, fixed_clock);
        history.push(asset(), brightness(1.0));
        history.push(asset(), brightness(2.0));
        assert_eq!(history.limit(), 1);
        assert_eq!(history.len(), 1);
        assert_eq!(history.current().unwrap().adjustments, brightness(2.0));
    }

    #[test]
    fn test_clear() {
        let mut history = History::default();
        history.push(asset(), AdjustmentState::default());
        history.clear();
        assert!(history.is_empty());
        assert!(history.current().is_none());
    }

    #[test]
    fn test_system_clock_is_recent() {
        // Any time after 2020-01-01
        assert!(system_clock() > 1_577_836_800_000.0);
    }
}
