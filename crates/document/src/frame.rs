use model::{ChannelSet, Geometry, Palette};

/// Compression lifecycle of a frame. Frames start `Raw` at commit time and
/// are diffed at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Raw,
    Compressed,
}

/// One stored image state in the history ring.
#[derive(Debug, Clone)]
pub struct Frame {
    pub(crate) geometry: Geometry,
    pub(crate) channels: ChannelSet,
    /// `None` when equal to the palette of the neighbouring state nearer the
    /// live image.
    pub(crate) palette: Option<Palette>,
    pub(crate) byte_cost: Option<usize>,
    pub(crate) state: FrameState,
}

impl Frame {
    pub(crate) fn new(geometry: Geometry, channels: ChannelSet, palette: Option<Palette>) -> Self {
        Self {
            geometry,
            channels,
            palette,
            byte_cost: None,
            state: FrameState::Raw,
        }
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn channels(&self) -> &ChannelSet {
        &self.channels
    }

    pub fn palette(&self) -> Option<&Palette> {
        self.palette.as_ref()
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn is_tiled(&self) -> bool {
        self.channels.tilemap().is_some()
    }

    /// Accounted size, cached until the frame's storage changes.
    pub fn byte_cost(&mut self) -> usize {
        if let Some(cost) = self.byte_cost {
            return cost;
        }
        let cost = self.measure();
        self.byte_cost = Some(cost);
        cost
    }

    pub fn measure(&self) -> usize {
        self.channels.stored_bytes() + self.palette.as_ref().map_or(0, Palette::stored_bytes)
    }

    pub(crate) fn invalidate_cost(&mut self) {
        self.byte_cost = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{BUFFER_OVERHEAD, Channel, ChannelSlot};

    #[test]
    fn cost_is_cached_until_invalidated() {
        let geometry = Geometry::new(10, 10, 1).expect("geometry");
        let mut channels = ChannelSet::default();
        channels.replace(Channel::Image, ChannelSlot::Owned(vec![0; 100]));
        let palette = Palette::grayscale(16).expect("palette");
        let mut frame = Frame::new(geometry, channels, Some(palette));

        let expected = 100 + BUFFER_OVERHEAD + 16 * 3 + BUFFER_OVERHEAD;
        assert_eq!(frame.byte_cost(), expected);

        frame.channels.replace(Channel::Image, ChannelSlot::Unchanged);
        assert_eq!(frame.byte_cost(), expected);
        frame.invalidate_cost();
        assert_eq!(frame.byte_cost(), 16 * 3 + BUFFER_OVERHEAD);
    }
}
