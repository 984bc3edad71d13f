use bitflags::bitflags;
use model::{BUFFER_OVERHEAD, Channel, ChannelMask, Geometry, NUM_CHANNELS};

use crate::image::LiveImage;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CommitFlags: u8 {
        /// Allocate affected channels the live image lacks.
        const CREATE_MISSING = 1 << 0;
        /// Remove affected channels from the live image.
        const DELETE = 1 << 1;
        /// Fill new live buffers instead of copying the old contents.
        const NO_COPY = 1 << 2;
        /// Later pen-down commits fold into this one until the pen lifts.
        const PEN_DOWN = 1 << 3;
    }
}

/// What an editing tool is about to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitRequest {
    pub channels: ChannelMask,
    /// Shape after the edit; `None` keeps the current one.
    pub geometry: Option<Geometry>,
    pub flags: CommitFlags,
}

impl CommitRequest {
    pub fn new(channels: ChannelMask) -> Self {
        Self {
            channels,
            geometry: None,
            flags: CommitFlags::empty(),
        }
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn with_flags(mut self, flags: CommitFlags) -> Self {
        self.flags |= flags;
        self
    }
}

/// What happens to one channel during a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChannelAction {
    /// Not touched; the frame records `Unchanged` or `Absent`.
    Keep,
    /// Live buffer moves into the frame and the channel disappears.
    Delete,
    /// Live buffer moves into the frame; a new one of `len` bytes replaces it.
    Replace { len: usize, copy: bool },
    /// Channel did not exist; a fresh buffer of `len` bytes is created.
    Create { len: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CommitPlan {
    pub actions: [ChannelAction; NUM_CHANNELS],
    pub geometry: Geometry,
    /// Bytes reserved up front. The recorded frame never costs more, except
    /// for delete commits, which only reserve the palette.
    pub estimate: usize,
}

impl CommitPlan {
    pub fn new(image: &LiveImage, request: &CommitRequest) -> Self {
        let old_geometry = image.geometry();
        let geometry = request.geometry.unwrap_or(old_geometry);
        let reshaped = geometry != old_geometry;
        let flags = request.flags;

        let mut actions = [ChannelAction::Keep; NUM_CHANNELS];
        let mut allocated = 0;
        let mut outgoing = 0;
        for channel in Channel::ALL {
            let present = image.channels().is_present(channel);
            let affected = request.channels.has(channel) || (reshaped && present);
            let len = geometry.channel_len(channel);

            let action = match (affected, present) {
                (false, _) => ChannelAction::Keep,
                (true, true) if flags.contains(CommitFlags::DELETE) => ChannelAction::Delete,
                (true, true) => ChannelAction::Replace {
                    len,
                    copy: !reshaped && !flags.contains(CommitFlags::NO_COPY),
                },
                (true, false)
                    if flags.contains(CommitFlags::CREATE_MISSING)
                        && !flags.contains(CommitFlags::DELETE) =>
                {
                    ChannelAction::Create { len }
                }
                (true, false) => ChannelAction::Keep,
            };
            match action {
                ChannelAction::Keep | ChannelAction::Delete => {}
                ChannelAction::Replace { len, .. } => {
                    allocated += len + BUFFER_OVERHEAD;
                    outgoing += old_geometry.channel_len(channel) + BUFFER_OVERHEAD;
                }
                ChannelAction::Create { len } => allocated += len + BUFFER_OVERHEAD,
            }
            actions[channel.index()] = action;
        }

        Self {
            actions,
            geometry,
            estimate: image.palette().stored_bytes() + allocated.max(outgoing),
        }
    }

    pub fn action(&self, channel: Channel) -> ChannelAction {
        self.actions[channel.index()]
    }
}
