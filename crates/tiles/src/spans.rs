//! Skip/copy span codec for one tile-high row strip.
//!
//! The compressor uses the copy runs to pack marked tiles out of a full row,
//! and the swap engine uses the very same runs to exchange them back, so a
//! packed row is always `copied` bytes long.

use bitvec::prelude::{BitSlice, Lsb0};
use model::TILE_SIZE;
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub skip: usize,
    pub copy: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSpans {
    // Last entry is the sentinel: `copy == 0`, `skip` is the trailing gap.
    spans: SmallVec<[Span; 8]>,
    copied: usize,
}

impl RowSpans {
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Packed length of one row.
    pub fn copied(&self) -> usize {
        self.copied
    }

    pub fn is_empty(&self) -> bool {
        self.copied == 0
    }

    /// `(offset_in_row, offset_in_packed_row, len)` for every copy run.
    pub fn copy_runs(&self) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        let mut row_offset = 0;
        let mut packed_offset = 0;
        self.spans.iter().filter_map(move |span| {
            row_offset += span.skip;
            if span.copy == 0 {
                return None;
            }
            let run = (row_offset, packed_offset, span.copy);
            row_offset += span.copy;
            packed_offset += span.copy;
            Some(run)
        })
    }

    /// Gathers the copy runs of `row` into `packed`.
    pub fn pack_row(&self, row: &[u8], packed: &mut [u8]) {
        for (at, to, len) in self.copy_runs() {
            packed[to..to + len].copy_from_slice(&row[at..at + len]);
        }
    }

    /// Saves the copy runs of `row` into `save`, then overwrites them from
    /// `restore`.
    pub fn exchange_row(&self, row: &mut [u8], save: &mut [u8], restore: &[u8]) {
        for (at, to, len) in self.copy_runs() {
            save[to..to + len].copy_from_slice(&row[at..at + len]);
            row[at..at + len].copy_from_slice(&restore[to..to + len]);
        }
    }
}

pub fn spans_for_row(tiles: &BitSlice<usize, Lsb0>, width: u32, bytes_per_pixel: usize) -> RowSpans {
    let tile_bytes = TILE_SIZE as usize * bytes_per_pixel;
    let row_bytes = width as usize * bytes_per_pixel;
    let mut spans = SmallVec::new();
    let mut copied = 0;
    let mut skip = 0;
    let mut copy = 0;

    for (tile, marked) in tiles.iter().by_vals().enumerate() {
        let start = tile * tile_bytes;
        if start >= row_bytes {
            break;
        }
        let len = tile_bytes.min(row_bytes - start);
        if marked {
            copy += len;
            continue;
        }
        if copy > 0 {
            spans.push(Span { skip, copy });
            copied += copy;
            skip = 0;
            copy = 0;
        }
        skip += len;
    }
    if copy > 0 {
        spans.push(Span { skip, copy });
        copied += copy;
        skip = 0;
    }
    spans.push(Span { skip, copy: 0 });

    RowSpans { spans, copied }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitvec::prelude::{BitVec, bitvec};
    use proptest::prelude::*;

    #[test]
    fn unmarked_row_is_one_sentinel() {
        let tiles = bitvec![usize, Lsb0; 0, 0, 0];
        let spans = spans_for_row(&tiles, 150, 1);
        assert_eq!(spans.spans(), &[Span { skip: 150, copy: 0 }]);
        assert!(spans.is_empty());
    }

    #[test]
    fn alternating_runs_cover_partial_last_tile() {
        // 3 bytes per pixel, width 150 -> tiles of 192, 192, 66 bytes
        let tiles = bitvec![usize, Lsb0; 1, 0, 1];
        let spans = spans_for_row(&tiles, 150, 3);
        assert_eq!(
            spans.spans(),
            &[
                Span { skip: 0, copy: 192 },
                Span { skip: 192, copy: 66 },
                Span { skip: 0, copy: 0 },
            ]
        );
        assert_eq!(spans.copied(), 258);
        assert_eq!(
            spans.copy_runs().collect::<Vec<_>>(),
            vec![(0, 0, 192), (384, 192, 66)]
        );
    }

    #[test]
    fn adjacent_marked_tiles_merge_into_one_run() {
        let tiles = bitvec![usize, Lsb0; 0, 1, 1, 0];
        let spans = spans_for_row(&tiles, 256, 1);
        assert_eq!(
            spans.spans(),
            &[Span { skip: 64, copy: 128 }, Span { skip: 64, copy: 0 }]
        );
    }

    #[test]
    fn exchange_row_swaps_only_copy_runs() {
        let tiles = bitvec![usize, Lsb0; 0, 1];
        let spans = spans_for_row(&tiles, 100, 1);
        let mut row = vec![1u8; 100];
        let mut save = vec![0u8; spans.copied()];
        let restore = vec![9u8; spans.copied()];
        spans.exchange_row(&mut row, &mut save, &restore);
        assert!(row[..64].iter().all(|byte| *byte == 1));
        assert!(row[64..].iter().all(|byte| *byte == 9));
        assert!(save.iter().all(|byte| *byte == 1));
    }

    proptest! {
        #[test]
        fn spans_cover_the_row_exactly(
            marks in proptest::collection::vec(any::<bool>(), 1..20),
            trim in 0u32..64,
            bytes_per_pixel in prop_oneof![Just(1usize), Just(3usize)],
        ) {
            let width = (marks.len() as u32 * TILE_SIZE).saturating_sub(trim).max(1);
            let tiles: BitVec<usize, Lsb0> = marks.iter().copied().collect();
            let spans = spans_for_row(&tiles, width, bytes_per_pixel);

            let total: usize = spans.spans().iter().map(|span| span.skip + span.copy).sum();
            prop_assert_eq!(total, width as usize * bytes_per_pixel);
            prop_assert_eq!(spans.spans().last().map(|span| span.copy), Some(0));
            prop_assert!(spans.spans()[..spans.spans().len() - 1].iter().all(|span| span.copy > 0));
            let copied: usize = spans.copy_runs().map(|(_, _, len)| len).sum();
            prop_assert_eq!(copied, spans.copied());
        }
    }
}
