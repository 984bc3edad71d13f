use crate::frame::Frame;

/// Slot index that wraps around a ring of fixed capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RingCursor {
    index: usize,
    capacity: usize,
}

impl RingCursor {
    pub fn new(index: usize, capacity: usize) -> Self {
        Self {
            index: index % capacity,
            capacity,
        }
    }

    pub fn index(self) -> usize {
        self.index
    }

    pub fn forward(self, steps: usize) -> Self {
        Self::new(self.index + steps % self.capacity, self.capacity)
    }

    pub fn back(self, steps: usize) -> Self {
        Self::new(
            self.index + self.capacity - steps % self.capacity,
            self.capacity,
        )
    }
}

/// Frames around a reserved cursor slot: undo frames behind it, newest first,
/// redo frames ahead of it, oldest first.
#[derive(Debug)]
pub(crate) struct HistoryRing {
    // undoable + redoable <= slots.len() - 1; slots[cursor] is always None
    slots: Vec<Option<Frame>>,
    cursor: RingCursor,
    undoable: usize,
    redoable: usize,
}

impl HistoryRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: std::iter::repeat_with(|| None).take(capacity).collect(),
            cursor: RingCursor::new(0, capacity),
            undoable: 0,
            redoable: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn undoable(&self) -> usize {
        self.undoable
    }

    pub fn redoable(&self) -> usize {
        self.redoable
    }

    /// `depth` 0 is the most recent undo frame.
    pub fn undo_frame(&self, depth: usize) -> Option<&Frame> {
        if depth >= self.undoable {
            return None;
        }
        self.slots[self.cursor.back(depth + 1).index()].as_ref()
    }

    /// `depth` 0 is the next frame to redo.
    pub fn redo_frame(&self, depth: usize) -> Option<&Frame> {
        if depth >= self.redoable {
            return None;
        }
        self.slots[self.cursor.forward(depth + 1).index()].as_ref()
    }

    pub fn newest_undo_mut(&mut self) -> Option<&mut Frame> {
        if self.undoable == 0 {
            return None;
        }
        self.slots[self.cursor.back(1).index()].as_mut()
    }

    pub fn next_redo_mut(&mut self) -> Option<&mut Frame> {
        if self.redoable == 0 {
            return None;
        }
        self.slots[self.cursor.forward(1).index()].as_mut()
    }

    /// Moves the newest undo frame across the cursor to the redo side.
    pub fn step_back(&mut self) {
        if self.undoable == 0 {
            return;
        }
        let previous = self.cursor.back(1);
        self.slots.swap(previous.index(), self.cursor.index());
        self.cursor = previous;
        self.undoable -= 1;
        self.redoable += 1;
    }

    /// Moves the next redo frame across the cursor to the undo side.
    pub fn step_forward(&mut self) {
        if self.redoable == 0 {
            return;
        }
        let next = self.cursor.forward(1);
        self.slots.swap(next.index(), self.cursor.index());
        self.cursor = next;
        self.redoable -= 1;
        self.undoable += 1;
    }

    /// Stores a freshly committed frame behind the cursor. Redo frames are
    /// discarded and the oldest undo frame is evicted when the ring is full.
    pub fn push(&mut self, frame: Frame) -> Option<Frame> {
        self.discard_redo();
        let evicted = if self.undoable + 1 >= self.capacity() {
            self.lose_oldest()
        } else {
            None
        };
        self.slots[self.cursor.index()] = Some(frame);
        self.cursor = self.cursor.forward(1);
        self.undoable += 1;
        evicted
    }

    pub fn lose_oldest(&mut self) -> Option<Frame> {
        if self.undoable == 0 {
            return None;
        }
        let oldest = self.cursor.back(self.undoable);
        self.undoable -= 1;
        self.slots[oldest.index()].take()
    }

    /// Drops every redo frame; returns how many there were.
    pub fn discard_redo(&mut self) -> usize {
        let discarded = self.redoable;
        for step in 1..=discarded {
            self.slots[self.cursor.forward(step).index()] = None;
        }
        self.redoable = 0;
        discarded
    }

    /// Rebuilds the ring with `capacity` slots, keeping the newest undo frames
    /// that fit. Redo frames are discarded.
    pub fn resize(&mut self, capacity: usize) {
        self.discard_redo();
        let kept = self.undoable.min(capacity.saturating_sub(1));
        while self.undoable > kept {
            self.lose_oldest();
        }

        let mut slots: Vec<Option<Frame>> = std::iter::repeat_with(|| None).take(capacity).collect();
        for (slot, depth) in slots.iter_mut().zip((0..kept).rev()) {
            *slot = self.slots[self.cursor.back(depth + 1).index()].take();
        }
        self.slots = slots;
        self.cursor = RingCursor::new(kept, capacity);
        self.undoable = kept;
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.cursor = RingCursor::new(0, self.capacity());
        self.undoable = 0;
        self.redoable = 0;
    }

    pub fn frames_mut(&mut self) -> impl Iterator<Item = &mut Frame> {
        self.slots.iter_mut().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{ChannelSet, Geometry};

    fn frame(width: u32) -> Frame {
        let geometry = Geometry::new(width, 1, 1).expect("geometry");
        Frame::new(geometry, ChannelSet::default(), None)
    }

    fn undo_widths(ring: &HistoryRing) -> Vec<u32> {
        (0..ring.undoable())
            .filter_map(|depth| ring.undo_frame(depth))
            .map(|frame| frame.geometry().width)
            .collect()
    }

    #[test]
    fn cursor_wraps_both_ways() {
        let cursor = RingCursor::new(0, 5);
        assert_eq!(cursor.back(1).index(), 4);
        assert_eq!(cursor.forward(7).index(), 2);
        assert_eq!(cursor.back(6).index(), 4);
    }

    #[test]
    fn full_ring_evicts_oldest_on_push() {
        let mut ring = HistoryRing::new(4);
        for width in 1..=3 {
            assert!(ring.push(frame(width)).is_none());
        }
        let evicted = ring.push(frame(4)).expect("ring was full");
        assert_eq!(evicted.geometry().width, 1);
        assert_eq!(undo_widths(&ring), vec![4, 3, 2]);
    }

    #[test]
    fn stepping_moves_frames_across_the_cursor() {
        let mut ring = HistoryRing::new(4);
        for width in 1..=3 {
            ring.push(frame(width));
        }
        ring.step_back();
        ring.step_back();
        assert_eq!(undo_widths(&ring), vec![1]);
        assert_eq!(ring.redo_frame(0).map(|f| f.geometry().width), Some(2));
        assert_eq!(ring.redo_frame(1).map(|f| f.geometry().width), Some(3));

        ring.step_forward();
        assert_eq!(undo_widths(&ring), vec![2, 1]);
        assert_eq!(ring.redoable(), 1);

        ring.push(frame(9));
        assert_eq!(ring.redoable(), 0);
        assert_eq!(undo_widths(&ring), vec![9, 2, 1]);
    }

    #[test]
    fn resize_keeps_newest_frames() {
        let mut ring = HistoryRing::new(5);
        for width in 1..=6 {
            ring.push(frame(width));
        }
        assert_eq!(undo_widths(&ring), vec![6, 5, 4, 3]);
        ring.step_back();

        ring.resize(3);
        assert_eq!(ring.capacity(), 3);
        assert_eq!(ring.redoable(), 0);
        assert_eq!(undo_widths(&ring), vec![5, 4]);

        ring.push(frame(7));
        assert_eq!(undo_widths(&ring), vec![7, 5]);

        ring.resize(6);
        ring.push(frame(8));
        assert_eq!(undo_widths(&ring), vec![8, 7, 5]);
    }
}
