use model::{Channel, ChannelMask, Geometry, LiveChannels, Palette};

/// The editable state a history steps around: channel buffers, palette and
/// the tool colour indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveImage {
    geometry: Geometry,
    channels: LiveChannels,
    palette: Palette,
    color_a: usize,
    color_b: usize,
    current_channel: Channel,
}

impl LiveImage {
    /// Creates the channels in `channels`, each filled with its fill value.
    pub fn new(geometry: Geometry, channels: ChannelMask, palette: Palette) -> Self {
        let mut live = LiveChannels::default();
        for channel in Channel::ALL.into_iter().filter(|c| channels.has(*c)) {
            live.replace(
                channel,
                Some(vec![channel.fill_value(); geometry.channel_len(channel)]),
            );
        }
        let mut image = Self {
            geometry,
            channels: live,
            palette,
            color_a: 0,
            color_b: 0,
            current_channel: Channel::Image,
        };
        image.fix_current_channel();
        image
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn channels(&self) -> &LiveChannels {
        &self.channels
    }

    pub fn channel(&self, channel: Channel) -> Option<&[u8]> {
        self.channels.get(channel)
    }

    pub fn channel_mut(&mut self, channel: Channel) -> Option<&mut [u8]> {
        self.channels.get_mut(channel)
    }

    /// Bytes of one pixel in `channel`.
    pub fn pixel(&self, channel: Channel, x: u32, y: u32) -> Option<&[u8]> {
        let at = self.pixel_offset(channel, x, y)?;
        let bpp = self.geometry.channel_bpp(channel);
        self.channels.get(channel).map(|buffer| &buffer[at..at + bpp])
    }

    pub fn set_pixel(&mut self, channel: Channel, x: u32, y: u32, value: &[u8]) -> bool {
        let bpp = self.geometry.channel_bpp(channel);
        let Some(at) = self.pixel_offset(channel, x, y) else {
            return false;
        };
        match self.channels.get_mut(channel) {
            Some(buffer) if value.len() == bpp => {
                buffer[at..at + bpp].copy_from_slice(value);
                true
            }
            _ => false,
        }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn palette_mut(&mut self) -> &mut Palette {
        &mut self.palette
    }

    pub fn color_a(&self) -> usize {
        self.color_a
    }

    pub fn color_b(&self) -> usize {
        self.color_b
    }

    /// Out-of-palette indices are rejected.
    pub fn set_colors(&mut self, color_a: usize, color_b: usize) -> bool {
        if color_a >= self.palette.len() || color_b >= self.palette.len() {
            return false;
        }
        self.color_a = color_a;
        self.color_b = color_b;
        true
    }

    pub fn current_channel(&self) -> Channel {
        self.current_channel
    }

    pub fn set_current_channel(&mut self, channel: Channel) -> bool {
        if !self.channels.is_present(channel) {
            return false;
        }
        self.current_channel = channel;
        true
    }

    pub(crate) fn channels_mut(&mut self) -> &mut LiveChannels {
        &mut self.channels
    }

    pub(crate) fn set_geometry(&mut self, geometry: Geometry) {
        self.geometry = geometry;
    }

    pub(crate) fn clamp_colors(&mut self) {
        let len = self.palette.len();
        if self.color_a >= len {
            self.color_a = 0;
        }
        if self.color_b >= len {
            self.color_b = 0;
        }
    }

    pub(crate) fn fix_current_channel(&mut self) {
        if !self.channels.is_present(self.current_channel) {
            self.current_channel = Channel::Image;
        }
    }

    fn pixel_offset(&self, channel: Channel, x: u32, y: u32) -> Option<usize> {
        if x >= self.geometry.width || y >= self.geometry.height {
            return None;
        }
        let index = y as usize * self.geometry.width as usize + x as usize;
        Some(index * self.geometry.channel_bpp(channel))
    }
}
