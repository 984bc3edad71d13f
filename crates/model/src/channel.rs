use std::sync::Arc;

use bitflags::bitflags;

use crate::{BUFFER_OVERHEAD, NUM_CHANNELS, TileMap};

pub type Buffer = Vec<u8>;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Channel {
    Image,
    Alpha,
    Selection,
    Mask,
}

impl Channel {
    pub const ALL: [Channel; NUM_CHANNELS] = [
        Channel::Image,
        Channel::Alpha,
        Channel::Selection,
        Channel::Mask,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Value a freshly created channel is filled with.
    pub const fn fill_value(self) -> u8 {
        match self {
            Channel::Alpha => 255,
            _ => 0,
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ChannelMask: u8 {
        const IMAGE = 1 << 0;
        const ALPHA = 1 << 1;
        const SELECTION = 1 << 2;
        const MASK = 1 << 3;
        const RGBA = Self::IMAGE.bits() | Self::ALPHA.bits();
    }
}

impl ChannelMask {
    pub const fn of(channel: Channel) -> Self {
        Self::from_bits_retain(1 << channel.index())
    }

    pub fn has(self, channel: Channel) -> bool {
        self.contains(Self::of(channel))
    }
}

impl From<Channel> for ChannelMask {
    fn from(channel: Channel) -> Self {
        Self::of(channel)
    }
}

/// Storage state of one channel inside a history frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChannelSlot {
    #[default]
    Absent,
    Owned(Buffer),
    /// Byte-identical to the neighbouring state nearer the live image.
    Unchanged,
    /// Only the pixels of marked tiles, strip by strip.
    Tiled(Arc<TileMap>, Buffer),
}

impl ChannelSlot {
    pub fn is_present(&self) -> bool {
        !matches!(self, ChannelSlot::Absent)
    }

    pub fn is_tiled(&self) -> bool {
        matches!(self, ChannelSlot::Tiled(..))
    }

    pub fn stored_bytes(&self) -> usize {
        match self {
            ChannelSlot::Owned(buffer) | ChannelSlot::Tiled(_, buffer) => {
                buffer.len() + BUFFER_OVERHEAD
            }
            ChannelSlot::Absent | ChannelSlot::Unchanged => 0,
        }
    }
}

impl From<Option<Buffer>> for ChannelSlot {
    /// A buffer leaving the live image: owned when it existed.
    fn from(buffer: Option<Buffer>) -> Self {
        buffer.map_or(ChannelSlot::Absent, ChannelSlot::Owned)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChannelSet {
    slots: [ChannelSlot; NUM_CHANNELS],
}

impl ChannelSet {
    pub fn get(&self, channel: Channel) -> &ChannelSlot {
        &self.slots[channel.index()]
    }

    pub fn get_mut(&mut self, channel: Channel) -> &mut ChannelSlot {
        &mut self.slots[channel.index()]
    }

    pub fn replace(&mut self, channel: Channel, slot: ChannelSlot) -> ChannelSlot {
        std::mem::replace(&mut self.slots[channel.index()], slot)
    }

    pub fn take(&mut self, channel: Channel) -> ChannelSlot {
        std::mem::take(&mut self.slots[channel.index()])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Channel, &ChannelSlot)> {
        Channel::ALL.into_iter().zip(self.slots.iter())
    }

    pub fn present_mask(&self) -> ChannelMask {
        self.iter()
            .filter(|(_, slot)| slot.is_present())
            .fold(ChannelMask::empty(), |mask, (channel, _)| {
                mask | ChannelMask::of(channel)
            })
    }

    /// Tile map shared by the tiled channels, if any.
    pub fn tilemap(&self) -> Option<&Arc<TileMap>> {
        self.slots.iter().find_map(|slot| match slot {
            ChannelSlot::Tiled(map, _) => Some(map),
            _ => None,
        })
    }

    pub fn stored_bytes(&self) -> usize {
        let buffers: usize = self.slots.iter().map(ChannelSlot::stored_bytes).sum();
        let tilemap = self
            .tilemap()
            .map_or(0, |map| map.byte_len() + BUFFER_OVERHEAD);
        buffers + tilemap
    }
}

/// The channels of the live image; each is either absent or owned.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LiveChannels {
    buffers: [Option<Buffer>; NUM_CHANNELS],
}

impl LiveChannels {
    pub fn get(&self, channel: Channel) -> Option<&[u8]> {
        self.buffers[channel.index()].as_deref()
    }

    pub fn get_mut(&mut self, channel: Channel) -> Option<&mut [u8]> {
        self.buffers[channel.index()].as_deref_mut()
    }

    pub fn is_present(&self, channel: Channel) -> bool {
        self.buffers[channel.index()].is_some()
    }

    pub fn take(&mut self, channel: Channel) -> Option<Buffer> {
        self.buffers[channel.index()].take()
    }

    pub fn replace(&mut self, channel: Channel, buffer: Option<Buffer>) -> Option<Buffer> {
        std::mem::replace(&mut self.buffers[channel.index()], buffer)
    }

    pub fn present_mask(&self) -> ChannelMask {
        Channel::ALL
            .into_iter()
            .filter(|channel| self.is_present(*channel))
            .fold(ChannelMask::empty(), |mask, channel| {
                mask | ChannelMask::of(channel)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_of_channel_matches_named_flags() {
        assert_eq!(ChannelMask::of(Channel::Image), ChannelMask::IMAGE);
        assert_eq!(ChannelMask::of(Channel::Mask), ChannelMask::MASK);
        assert!(ChannelMask::RGBA.has(Channel::Alpha));
        assert!(!ChannelMask::RGBA.has(Channel::Selection));
    }

    #[test]
    fn present_mask_ignores_absent_slots() {
        let mut set = ChannelSet::default();
        set.replace(Channel::Image, ChannelSlot::Owned(vec![0; 4]));
        set.replace(Channel::Selection, ChannelSlot::Unchanged);
        assert_eq!(
            set.present_mask(),
            ChannelMask::IMAGE | ChannelMask::SELECTION
        );

        let mut live = LiveChannels::default();
        live.replace(Channel::Alpha, Some(vec![255; 4]));
        assert_eq!(live.present_mask(), ChannelMask::ALPHA);
    }

    #[test]
    fn unchanged_and_absent_slots_cost_nothing() {
        let mut set = ChannelSet::default();
        set.replace(Channel::Image, ChannelSlot::Owned(vec![0; 100]));
        set.replace(Channel::Alpha, ChannelSlot::Unchanged);
        assert_eq!(set.stored_bytes(), 100 + BUFFER_OVERHEAD);
    }
}
