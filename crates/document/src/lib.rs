//! Bounded-memory undo/redo for raster images.
//!
//! A [`History`] keeps prior states of a [`LiveImage`] in a ring of frames.
//! Frames are diffed against their neighbour lazily and shrunk to the tiles
//! that changed; the ring drops its oldest steps to stay under its share of
//! the [`UndoBudget`].

mod budget;
mod commit;
mod compress;
mod error;
mod frame;
mod history;
mod image;
mod kind;
mod ring;
mod swap;
mod workspace;

pub use budget::{BudgetLease, DEFAULT_BUDGET_BYTES, UndoBudget};
pub use commit::{CommitFlags, CommitRequest};
pub use error::HistoryError;
pub use frame::{Frame, FrameState};
pub use history::History;
pub use image::LiveImage;
pub use kind::{EditContext, UndoKind};
pub use workspace::{Document, DocumentId, Workspace};

/// 100 undo levels plus the reserved slot.
pub const DEFAULT_UNDO_DEPTH: usize = 101;
pub const MIN_UNDO_DEPTH: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Ring slots, one of which is always reserved.
    pub depth: usize,
}

impl HistoryConfig {
    pub fn clamped(self) -> Self {
        if self.depth < MIN_UNDO_DEPTH {
            log::warn!(
                "undo depth {} is below the minimum, using {MIN_UNDO_DEPTH}",
                self.depth
            );
            return Self {
                depth: MIN_UNDO_DEPTH,
            };
        }
        self
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            depth: DEFAULT_UNDO_DEPTH,
        }
    }
}
