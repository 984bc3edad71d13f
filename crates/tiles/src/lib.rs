//! Tile-level change detection for history frames.
//!
//! `diff_tiles` compares a frame against the live image one tile-high strip
//! at a time; `spans_for_row` turns a strip of the resulting tile map into the
//! skip/copy runs shared by compression and reconstruction.

use static_assertions::const_assert;

mod compare;
mod differ;
mod progress;
mod spans;

pub use compare::compare_aligned_chunks;
pub use differ::{DiffOutcome, FlatReason, diff_tiles};
pub use progress::{NoProgress, ProgressHook};
pub use spans::{RowSpans, Span, spans_for_row};

const_assert!(model::TILE_SIZE == 1 << model::TILE_SHIFT);
const_assert!(model::TILE_SIZE as usize % size_of::<usize>() == 0);
