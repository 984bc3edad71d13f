use model::{Channel, ChannelSlot, Geometry};

use crate::compress::{StripSpans, packed_len, strip_layout};
use crate::error::HistoryError;
use crate::frame::{Frame, FrameState};
use crate::image::LiveImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Undo,
    Redo,
}

/// Exchanges the state held by `frame` with the live image. Afterwards the
/// frame holds what was live, so stepping back over it restores the image.
pub(crate) fn swap_with(
    frame: &mut Frame,
    image: &mut LiveImage,
    direction: Direction,
) -> Result<(), HistoryError> {
    validate(frame, image)?;

    let geometry = frame.geometry;
    for channel in Channel::ALL {
        let displaced: ChannelSlot = match frame.channels.take(channel) {
            ChannelSlot::Absent => image.channels_mut().take(channel).into(),
            ChannelSlot::Owned(buffer) => image.channels_mut().replace(channel, Some(buffer)).into(),
            ChannelSlot::Unchanged => ChannelSlot::Unchanged,
            ChannelSlot::Tiled(map, mut packed) => {
                if let Some(live) = image.channels_mut().get_mut(channel) {
                    let layout = strip_layout(&map, geometry, channel);
                    exchange_tiles(
                        live,
                        &mut packed,
                        &layout,
                        geometry.row_bytes(channel),
                        direction,
                    );
                }
                ChannelSlot::Tiled(map, packed)
            }
        };
        frame.channels.replace(channel, displaced);
    }

    frame.geometry = image.geometry();
    image.set_geometry(geometry);
    if let Some(palette) = frame.palette.as_mut() {
        std::mem::swap(palette, image.palette_mut());
    }
    frame.state = FrameState::Compressed;
    frame.invalidate_cost();

    image.clamp_colors();
    image.fix_current_channel();
    Ok(())
}

/// Checks everything a swap relies on before any buffer moves.
fn validate(frame: &Frame, image: &LiveImage) -> Result<(), HistoryError> {
    let mismatch = |stored: Geometry| HistoryError::GeometryMismatch {
        frame: stored,
        live: image.geometry(),
    };
    for (channel, slot) in frame.channels.iter() {
        match slot {
            ChannelSlot::Unchanged if !image.channels().is_present(channel) => {
                return Err(mismatch(frame.geometry));
            }
            ChannelSlot::Tiled(map, packed) => {
                if frame.geometry != image.geometry()
                    || map.grid() != image.geometry().tile_grid()
                    || !image.channels().is_present(channel)
                    || packed.len() != packed_len(&strip_layout(map, frame.geometry, channel))
                {
                    return Err(mismatch(frame.geometry));
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// Swaps the marked tiles of `live` with packed storage in place.
///
/// Each row saves the live bytes into the slot vacated by the previous row,
/// so undo leaves every strip rotated by one row (row 0 stored last) and redo
/// walks the strip backwards to undo that rotation.
fn exchange_tiles(
    live: &mut [u8],
    packed: &mut [u8],
    layout: &[StripSpans],
    row_bytes: usize,
    direction: Direction,
) {
    let widest = layout.iter().map(|strip| strip.spans.copied()).max().unwrap_or(0);
    let mut scratch = vec![0u8; widest];
    let mut base = 0;

    for strip in layout {
        let len = strip.spans.copied();
        let stored = &mut packed[base..base + strip.packed_len()];
        base += strip.packed_len();
        if len == 0 {
            continue;
        }
        let scratch = &mut scratch[..len];
        let rows = strip.rows as usize;
        let live_row = |row: usize| (strip.top as usize + row) * row_bytes;

        match direction {
            Direction::Undo => {
                for row in 0..rows {
                    let at = live_row(row);
                    let row_slice = &mut live[at..at + row_bytes];
                    if row == 0 {
                        strip.spans.exchange_row(row_slice, scratch, &stored[..len]);
                    } else {
                        let (head, tail) = stored.split_at_mut(row * len);
                        let previous = &mut head[(row - 1) * len..];
                        strip.spans.exchange_row(row_slice, previous, &tail[..len]);
                    }
                }
                stored[(rows - 1) * len..].copy_from_slice(scratch);
            }
            Direction::Redo => {
                scratch.copy_from_slice(&stored[(rows - 1) * len..]);
                for row in (0..rows).rev() {
                    let at = live_row(row);
                    let row_slice = &mut live[at..at + row_bytes];
                    if row == 0 {
                        // scratch holds row 0 and slot 0 is free again
                        let (current, _) = stored.split_at_mut(len);
                        strip.spans.exchange_row(row_slice, current, scratch);
                    } else {
                        let (head, tail) = stored.split_at_mut(row * len);
                        let previous = &head[(row - 1) * len..];
                        strip.spans.exchange_row(row_slice, &mut tail[..len], previous);
                    }
                }
            }
        }
    }
}
