use model::{Channel, ChannelSet, ChannelSlot, Geometry, LiveChannels, NUM_CHANNELS, TILE_SIZE, TileMap};
use smallvec::SmallVec;

use crate::compare::compare_aligned_chunks;
use crate::progress::ProgressHook;

/// Why a frame stays uncompressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlatReason {
    TooSmall,
    GeometryMismatch,
    ChannelMismatch,
    NothingToCompare,
    MostlyChanged,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffOutcome {
    Tiles(TileMap),
    Flat(FlatReason),
}

struct ChannelPair<'a> {
    old: &'a [u8],
    live: &'a [u8],
    bytes_per_pixel: usize,
}

/// Marks every tile whose bytes differ between the frame's `Owned` channels
/// and the live image.
pub fn diff_tiles(
    old: &ChannelSet,
    old_geometry: Geometry,
    live: &LiveChannels,
    live_geometry: Geometry,
    progress: &mut dyn ProgressHook,
) -> DiffOutcome {
    if live_geometry.width + live_geometry.height < TILE_SIZE * 3 {
        return DiffOutcome::Flat(FlatReason::TooSmall);
    }
    if old_geometry != live_geometry {
        return DiffOutcome::Flat(FlatReason::GeometryMismatch);
    }
    if old.present_mask() != live.present_mask() {
        return DiffOutcome::Flat(FlatReason::ChannelMismatch);
    }

    let geometry = live_geometry;
    let mut pairs: SmallVec<[ChannelPair<'_>; NUM_CHANNELS]> = SmallVec::new();
    for channel in Channel::ALL {
        let (ChannelSlot::Owned(old_buffer), Some(live_buffer)) =
            (old.get(channel), live.get(channel))
        else {
            continue;
        };
        let expected = geometry.channel_len(channel);
        if old_buffer.len() != expected || live_buffer.len() != expected {
            return DiffOutcome::Flat(FlatReason::GeometryMismatch);
        }
        pairs.push(ChannelPair {
            old: old_buffer,
            live: live_buffer,
            bytes_per_pixel: geometry.channel_bpp(channel),
        });
    }
    if pairs.is_empty() {
        return DiffOutcome::Flat(FlatReason::NothingToCompare);
    }

    let grid = geometry.tile_grid();
    let mut map = TileMap::new(grid);
    let mut tiles = vec![false; grid.tiles_per_row() as usize];
    let mut columns = Vec::new();

    for strip in 0..grid.strips() {
        if progress.report_progress(strip as f32 / grid.strips() as f32) {
            return DiffOutcome::Flat(FlatReason::Cancelled);
        }
        let (top, rows) = grid.strip_rows(strip);
        tiles.fill(false);

        for pair in &pairs {
            if tiles.iter().all(|marked| *marked) {
                break;
            }
            let row_bytes = geometry.width as usize * pair.bytes_per_pixel;
            let start = top as usize * row_bytes;
            let end = start + rows as usize * row_bytes;

            columns.clear();
            columns.resize(row_bytes.div_ceil(TILE_SIZE as usize), false);
            seed_columns(&tiles, pair.bytes_per_pixel, &mut columns);
            if mark_strip(&pair.old[start..end], &pair.live[start..end], row_bytes, &mut columns) > 0 {
                fold_planes(&columns, pair.bytes_per_pixel, &mut tiles);
            }
        }
        map.mark_row(strip, &tiles);
    }

    log::trace!(
        "tile diff {}x{}: {} of {} tiles changed",
        geometry.width,
        geometry.height,
        map.marked_count(),
        grid.max_tiles()
    );
    if map.marked_count() * 2 > grid.max_tiles() {
        return DiffOutcome::Flat(FlatReason::MostlyChanged);
    }
    DiffOutcome::Tiles(map)
}

/// Marks `TILE_SIZE`-byte columns of a strip that contain a difference.
/// Columns already marked are never compared again. Returns how many
/// columns got newly marked.
fn mark_strip(old: &[u8], live: &[u8], row_bytes: usize, columns: &mut [bool]) -> usize {
    let tile = TILE_SIZE as usize;
    let total = columns.len();
    let mut remaining = columns.iter().filter(|marked| !**marked).count();
    let mut newly_marked = 0;
    if remaining == 0 {
        return 0;
    }

    for (old_row, live_row) in old.chunks_exact(row_bytes).zip(live.chunks_exact(row_bytes)) {
        let mut next = next_with(columns, 0, false);
        while let Some(first) = next {
            let last = next_with(columns, first, true).unwrap_or(total);
            let start = first * tile;
            let end = (last * tile).min(row_bytes);
            match compare_aligned_chunks(&old_row[start..end], &live_row[start..end]) {
                Some(offset) => {
                    let hit = (start + offset) / tile;
                    columns[hit] = true;
                    newly_marked += 1;
                    remaining -= 1;
                    if remaining == 0 {
                        return newly_marked;
                    }
                    next = next_with(columns, hit + 1, false);
                }
                None => next = next_with(columns, last, false),
            }
        }
    }
    newly_marked
}

fn next_with(columns: &[bool], from: usize, state: bool) -> Option<usize> {
    columns
        .get(from..)?
        .iter()
        .position(|marked| *marked == state)
        .map(|offset| from + offset)
}

/// Byte columns `t * bpp .. t * bpp + bpp` make up pixel tile `t`.
fn seed_columns(tiles: &[bool], bytes_per_pixel: usize, columns: &mut [bool]) {
    for (tile, _) in tiles.iter().enumerate().filter(|(_, marked)| **marked) {
        let low = (tile * bytes_per_pixel).min(columns.len());
        let high = (low + bytes_per_pixel).min(columns.len());
        columns[low..high].fill(true);
    }
}

fn fold_planes(columns: &[bool], bytes_per_pixel: usize, tiles: &mut [bool]) {
    for (tile, marked) in tiles.iter_mut().enumerate() {
        let low = tile * bytes_per_pixel;
        if low >= columns.len() {
            break;
        }
        let high = (low + bytes_per_pixel).min(columns.len());
        *marked |= columns[low..high].iter().any(|column| *column);
    }
}
