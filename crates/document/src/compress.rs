use std::sync::Arc;

use model::{Buffer, Channel, ChannelSlot, Geometry, TileMap};
use tiles::{DiffOutcome, ProgressHook, RowSpans, diff_tiles, spans_for_row};

use crate::frame::{Frame, FrameState};
use crate::image::LiveImage;

/// Span layout of one tile-high strip of a tiled channel.
pub(crate) struct StripSpans {
    pub spans: RowSpans,
    pub top: u32,
    pub rows: u32,
}

impl StripSpans {
    /// Bytes this strip occupies in packed storage.
    pub fn packed_len(&self) -> usize {
        self.spans.copied() * self.rows as usize
    }
}

pub(crate) fn strip_layout(map: &TileMap, geometry: Geometry, channel: Channel) -> Vec<StripSpans> {
    let grid = map.grid();
    let bytes_per_pixel = geometry.channel_bpp(channel);
    (0..grid.strips())
        .map(|strip| {
            let (top, rows) = grid.strip_rows(strip);
            StripSpans {
                spans: spans_for_row(map.row(strip), geometry.width, bytes_per_pixel),
                top,
                rows,
            }
        })
        .collect()
}

pub(crate) fn packed_len(layout: &[StripSpans]) -> usize {
    layout.iter().map(StripSpans::packed_len).sum()
}

/// Diffs a `Raw` frame against the live image, its neighbour, and stores
/// only what differs. Frames that cannot be tiled stay flat.
pub(crate) fn ensure_compressed(
    frame: &mut Frame,
    image: &LiveImage,
    progress: &mut dyn ProgressHook,
) {
    if frame.state == FrameState::Compressed {
        return;
    }
    frame.state = FrameState::Compressed;
    frame.invalidate_cost();

    if frame.palette.as_ref() == Some(image.palette()) {
        frame.palette = None;
    }

    match diff_tiles(
        &frame.channels,
        frame.geometry,
        image.channels(),
        image.geometry(),
        progress,
    ) {
        DiffOutcome::Tiles(map) => compress(frame, map, progress),
        DiffOutcome::Flat(reason) => log::debug!("undo frame kept flat: {reason:?}"),
    }
}

/// Packs every `Owned` channel of `frame` down to the tiles marked in `map`.
/// Progress is reported per packed strip; packing cannot be cancelled.
pub(crate) fn compress(frame: &mut Frame, map: TileMap, progress: &mut dyn ProgressHook) {
    frame.invalidate_cost();

    if map.is_empty() {
        for channel in Channel::ALL {
            let slot = frame.channels.get_mut(channel);
            if matches!(slot, ChannelSlot::Owned(_)) {
                *slot = ChannelSlot::Unchanged;
            }
        }
        log::debug!("undo frame identical to live image, buffers released");
        return;
    }

    let geometry = frame.geometry;
    let map = Arc::new(map);
    let owned = Channel::ALL
        .into_iter()
        .filter(|&channel| matches!(frame.channels.get(channel), ChannelSlot::Owned(_)))
        .count();
    let total = (owned * map.grid().strips() as usize).max(1) as f32;
    let mut packed_strips = 0;

    for channel in Channel::ALL {
        let slot = frame.channels.get_mut(channel);
        if let ChannelSlot::Owned(buffer) = slot {
            let layout = strip_layout(&map, geometry, channel);
            let packed = pack_tiles(
                std::mem::take(buffer),
                &layout,
                geometry.row_bytes(channel),
                |done| {
                    let _ = progress.report_progress((packed_strips + done) as f32 / total);
                },
            );
            packed_strips += layout.len();
            *slot = ChannelSlot::Tiled(Arc::clone(&map), packed);
        }
    }
    log::debug!(
        "undo frame tiled: {} of {} tiles kept",
        map.marked_count(),
        map.grid().max_tiles()
    );
}

/// Gathers the marked tiles of `buffer` strip by strip, rows in natural order.
/// `on_strip` receives the number of strips packed so far.
fn pack_tiles(
    mut buffer: Buffer,
    layout: &[StripSpans],
    row_bytes: usize,
    mut on_strip: impl FnMut(usize),
) -> Buffer {
    let kept = packed_len(layout);

    if kept * 3 <= buffer.len() {
        let mut packed = Vec::new();
        if packed.try_reserve_exact(kept).is_ok() {
            packed.resize(kept, 0);
            let mut write = 0;
            for (index, strip) in layout.iter().enumerate() {
                let copied = strip.spans.copied();
                for row in strip.top..strip.top + strip.rows {
                    let row_start = row as usize * row_bytes;
                    strip.spans.pack_row(
                        &buffer[row_start..row_start + row_bytes],
                        &mut packed[write..write + copied],
                    );
                    write += copied;
                }
                on_strip(index + 1);
            }
            return packed;
        }
    }

    // Packed offsets never run ahead of source offsets.
    let mut write = 0;
    for (index, strip) in layout.iter().enumerate() {
        for row in strip.top..strip.top + strip.rows {
            let row_start = row as usize * row_bytes;
            for (at, _, len) in strip.spans.copy_runs() {
                let from = row_start + at;
                buffer.copy_within(from..from + len, write);
                write += len;
            }
        }
        on_strip(index + 1);
    }
    buffer.truncate(write);
    buffer.shrink_to_fit();
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{ChannelSet, TilePos};
    use tiles::NoProgress;

    fn checker(geometry: Geometry) -> Buffer {
        (0..geometry.channel_len(Channel::Image))
            .map(|index| (index % 251) as u8)
            .collect()
    }

    #[test]
    fn fresh_and_in_place_packing_agree() {
        let geometry = Geometry::new(200, 130, 1).expect("geometry");
        let buffer = checker(geometry);
        let row_bytes = geometry.row_bytes(Channel::Image);

        let mut sparse = TileMap::new(geometry.tile_grid());
        sparse.mark(TilePos { x: 3, y: 2 }).expect("mark");
        let layout = strip_layout(&sparse, geometry, Channel::Image);
        let packed = pack_tiles(buffer.clone(), &layout, row_bytes, |_| {});
        // last column is 8 px wide, last strip 2 rows high
        assert_eq!(packed.len(), 8 * 2);
        assert_eq!(packed[..8], buffer[128 * 200 + 192..128 * 200 + 200]);

        let mut dense = TileMap::new(geometry.tile_grid());
        for x in 0..3 {
            for y in 0..2 {
                dense.mark(TilePos { x, y }).expect("mark");
            }
        }
        let layout = strip_layout(&dense, geometry, Channel::Image);
        let packed = pack_tiles(buffer.clone(), &layout, row_bytes, |_| {});
        assert_eq!(packed.len(), 192 * 128);
        for row in 0..128 {
            let source = &buffer[row * 200..row * 200 + 192];
            assert_eq!(&packed[row * 192..(row + 1) * 192], source);
        }
    }

    #[test]
    fn empty_map_turns_owned_channels_unchanged() {
        let geometry = Geometry::new(256, 256, 1).expect("geometry");
        let mut channels = ChannelSet::default();
        channels.replace(Channel::Image, ChannelSlot::Owned(checker(geometry)));
        let mut frame = Frame::new(geometry, channels, None);

        compress(&mut frame, TileMap::new(geometry.tile_grid()), &mut NoProgress);

        assert_eq!(frame.channels.get(Channel::Image), &ChannelSlot::Unchanged);
        assert_eq!(frame.byte_cost(), 0);
    }

    #[test]
    fn packing_reports_every_strip() {
        let geometry = Geometry::new(200, 130, 1).expect("geometry");
        let mut channels = ChannelSet::default();
        channels.replace(Channel::Image, ChannelSlot::Owned(checker(geometry)));
        channels.replace(Channel::Alpha, ChannelSlot::Owned(checker(geometry)));
        let mut frame = Frame::new(geometry, channels, None);
        let mut map = TileMap::new(geometry.tile_grid());
        map.mark(TilePos { x: 1, y: 1 }).expect("mark");

        let mut fractions = Vec::new();
        let mut cancel_everything = |fraction: f32| {
            fractions.push(fraction);
            true
        };
        compress(&mut frame, map, &mut cancel_everything);

        // two channels of three strips each
        assert_eq!(fractions.len(), 6);
        assert_eq!(fractions.last(), Some(&1.0));
        assert!(fractions.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(frame.is_tiled());
        assert_eq!(
            frame.channels.get(Channel::Alpha),
            frame.channels.get(Channel::Image)
        );
    }
}
