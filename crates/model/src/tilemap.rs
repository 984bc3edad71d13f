use bitvec::prelude::{BitSlice, BitVec, Lsb0};

use crate::{GeometryError, TileGrid, TilePos};

/// One bit per tile, row-major; a set bit marks a tile whose content differs
/// between a frame and the state it is one step away from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileMap {
    // bits.len() == grid.max_tiles()
    grid: TileGrid,
    bits: BitVec<usize, Lsb0>,
    marked: usize,
}

impl TileMap {
    pub fn new(grid: TileGrid) -> Self {
        Self {
            grid,
            bits: BitVec::repeat(false, grid.max_tiles()),
            marked: 0,
        }
    }

    pub fn grid(&self) -> TileGrid {
        self.grid
    }

    pub fn mark(&mut self, tile: TilePos) -> Result<(), GeometryError> {
        let index = self.grid.tile_index(tile)?;
        self.mark_index(index);
        Ok(())
    }

    pub fn is_marked(&self, tile: TilePos) -> Result<bool, GeometryError> {
        let index = self.grid.tile_index(tile)?;
        Ok(self.bits[index])
    }

    /// Bits of one tile-high strip, left to right.
    pub fn row(&self, strip: u32) -> &BitSlice<usize, Lsb0> {
        let per_row = self.grid.tiles_per_row() as usize;
        let start = strip as usize * per_row;
        &self.bits[start..start + per_row]
    }

    pub fn mark_row(&mut self, strip: u32, marks: &[bool]) {
        let per_row = self.grid.tiles_per_row() as usize;
        let start = strip as usize * per_row;
        for (offset, marked) in marks.iter().take(per_row).enumerate() {
            if *marked {
                self.mark_index(start + offset);
            }
        }
    }

    pub fn marked_count(&self) -> usize {
        self.marked
    }

    pub fn is_empty(&self) -> bool {
        self.marked == 0
    }

    pub fn iter_marked(&self) -> impl Iterator<Item = TilePos> + '_ {
        let per_row = self.grid.tiles_per_row() as usize;
        self.bits.iter_ones().map(move |index| TilePos {
            x: (index % per_row) as u32,
            y: (index / per_row) as u32,
        })
    }

    /// Packed size: each strip rounded up to whole bytes.
    pub fn byte_len(&self) -> usize {
        (self.grid.tiles_per_row() as usize).div_ceil(8) * self.grid.strips() as usize
    }

    fn mark_index(&mut self, index: usize) {
        let was_marked = self.bits[index];
        self.bits.set(index, true);
        self.marked += !was_marked as usize;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marking_is_idempotent() {
        let mut map = TileMap::new(TileGrid::new(200, 200));
        map.mark(TilePos { x: 1, y: 2 }).expect("mark");
        map.mark(TilePos { x: 1, y: 2 }).expect("mark again");
        assert_eq!(map.marked_count(), 1);
        assert_eq!(map.is_marked(TilePos { x: 1, y: 2 }), Ok(true));
        assert_eq!(map.is_marked(TilePos { x: 2, y: 1 }), Ok(false));
    }

    #[test]
    fn row_exposes_one_strip() {
        let mut map = TileMap::new(TileGrid::new(256, 128));
        map.mark_row(1, &[false, true, false, true]);
        assert_eq!(map.row(0).count_ones(), 0);
        assert_eq!(map.row(1).iter_ones().collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(
            map.iter_marked().collect::<Vec<_>>(),
            vec![TilePos { x: 1, y: 1 }, TilePos { x: 3, y: 1 }]
        );
    }

    #[test]
    fn byte_len_packs_each_strip() {
        let map = TileMap::new(TileGrid::new(1000, 1000));
        // 16 tiles per row -> 2 bytes, 16 strips
        assert_eq!(map.byte_len(), 32);
    }
}
