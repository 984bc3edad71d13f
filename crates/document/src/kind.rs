use model::{Channel, ChannelMask};

use crate::commit::{CommitFlags, CommitRequest};
use crate::image::LiveImage;

/// Editor-level reason for a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoKind {
    /// Palette only.
    Palette,
    /// Palette plus the image channel of an indexed image.
    IndexedPalette,
    /// Palette plus the image channel of an RGB image.
    Colors,
    /// Continuous drawing; folds into one step while the pen is down.
    Tool,
    Draw,
    Invert,
    /// Every channel, possibly with a new geometry.
    Transform,
    Filter,
    Paste { clip_has_alpha: bool },
}

/// Editor state that decides which channels an edit touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EditContext {
    /// Drawing on the image also draws on alpha.
    pub rgba_mode: bool,
    pub alpha_disabled: bool,
}

impl UndoKind {
    pub fn request(self, image: &LiveImage, context: EditContext) -> CommitRequest {
        let current = image.current_channel();
        let current_mask = ChannelMask::of(current);
        let on_image = current == Channel::Image;
        let indexed = image.geometry().is_indexed();
        let draw_mask = if on_image && context.rgba_mode {
            ChannelMask::RGBA
        } else {
            current_mask
        };

        let (channels, flags) = match self {
            UndoKind::Palette => (ChannelMask::empty(), CommitFlags::empty()),
            UndoKind::IndexedPalette if indexed => (ChannelMask::IMAGE, CommitFlags::empty()),
            UndoKind::IndexedPalette => (ChannelMask::empty(), CommitFlags::empty()),
            UndoKind::Colors if !indexed => (ChannelMask::IMAGE, CommitFlags::empty()),
            UndoKind::Colors => (ChannelMask::empty(), CommitFlags::empty()),
            UndoKind::Tool => (draw_mask, CommitFlags::PEN_DOWN),
            UndoKind::Draw => (draw_mask, CommitFlags::empty()),
            // inverting an indexed image only rewrites the palette
            UndoKind::Invert if on_image && indexed => (ChannelMask::empty(), CommitFlags::empty()),
            UndoKind::Invert => (current_mask, CommitFlags::empty()),
            UndoKind::Transform => (ChannelMask::all(), CommitFlags::empty()),
            UndoKind::Filter => (current_mask, CommitFlags::empty()),
            UndoKind::Paste { clip_has_alpha } => {
                let with_alpha =
                    on_image && !context.alpha_disabled && (clip_has_alpha || context.rgba_mode);
                let channels = if with_alpha {
                    ChannelMask::RGBA
                } else {
                    current_mask
                };
                (channels, CommitFlags::PEN_DOWN)
            }
        };
        CommitRequest::new(channels).with_flags(flags)
    }
}
