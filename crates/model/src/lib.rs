mod channel;
mod palette;
mod tilemap;

pub use channel::{Buffer, Channel, ChannelMask, ChannelSet, ChannelSlot, LiveChannels};
pub use palette::{PALETTE_CAPACITY, Palette, PaletteError, Rgb};
pub use tilemap::TileMap;

use thiserror::Error;

pub const TILE_SIZE: u32 = 64;
pub const TILE_SHIFT: u32 = 6;
pub const NUM_CHANNELS: usize = 4;
/// Bytes charged per stored block on top of its payload.
pub const BUFFER_OVERHEAD: usize = 32;
pub const MAX_DIMENSION: u32 = 16384;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TilePos {
    pub x: u32,
    pub y: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("image dimensions must be non-zero")]
    ZeroSize,
    #[error("unsupported bytes per pixel: {0}")]
    UnsupportedBytesPerPixel(u8),
    #[error("image {width}x{height} exceeds the maximum dimension")]
    TooLarge { width: u32, height: u32 },
    #[error("tile index out of bounds")]
    TileOutOfBounds,
}

/// Shape of one image state. Indexed images carry 1 byte per pixel in the
/// image channel, RGB images 3; every other channel is always 1 byte.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
    pub bytes_per_pixel: u8,
}

impl Geometry {
    pub fn new(width: u32, height: u32, bytes_per_pixel: u8) -> Result<Self, GeometryError> {
        if width == 0 || height == 0 {
            return Err(GeometryError::ZeroSize);
        }
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(GeometryError::TooLarge { width, height });
        }
        if bytes_per_pixel != 1 && bytes_per_pixel != 3 {
            return Err(GeometryError::UnsupportedBytesPerPixel(bytes_per_pixel));
        }
        Ok(Self {
            width,
            height,
            bytes_per_pixel,
        })
    }

    pub fn is_indexed(self) -> bool {
        self.bytes_per_pixel == 1
    }

    pub fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn channel_bpp(self, channel: Channel) -> usize {
        match channel {
            Channel::Image => self.bytes_per_pixel as usize,
            _ => 1,
        }
    }

    pub fn row_bytes(self, channel: Channel) -> usize {
        self.width as usize * self.channel_bpp(channel)
    }

    pub fn channel_len(self, channel: Channel) -> usize {
        self.pixel_count() * self.channel_bpp(channel)
    }

    pub fn tile_grid(self) -> TileGrid {
        TileGrid::new(self.width, self.height)
    }
}

/// Tile partition of a canvas. Edge tiles may be narrower or shorter than
/// `TILE_SIZE`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TileGrid {
    width: u32,
    height: u32,
    tiles_per_row: u32,
    tiles_per_column: u32,
}

impl TileGrid {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tiles_per_row: width.div_ceil(TILE_SIZE),
            tiles_per_column: height.div_ceil(TILE_SIZE),
        }
    }

    pub fn width(self) -> u32 {
        self.width
    }

    pub fn height(self) -> u32 {
        self.height
    }

    pub fn tiles_per_row(self) -> u32 {
        self.tiles_per_row
    }

    /// Number of tile-high row strips.
    pub fn strips(self) -> u32 {
        self.tiles_per_column
    }

    pub const fn max_tiles(self) -> usize {
        self.tiles_per_row as usize * self.tiles_per_column as usize
    }

    /// First pixel row of `strip` and its height in rows.
    pub fn strip_rows(self, strip: u32) -> (u32, u32) {
        let top = strip << TILE_SHIFT;
        (top, (self.height - top).min(TILE_SIZE))
    }

    pub fn tile_index(self, tile: TilePos) -> Result<usize, GeometryError> {
        if tile.x >= self.tiles_per_row || tile.y >= self.tiles_per_column {
            Err(GeometryError::TileOutOfBounds)
        } else {
            Ok((tile.y * self.tiles_per_row + tile.x) as usize)
        }
    }

    pub fn tile_pos(self, index: usize) -> Result<TilePos, GeometryError> {
        if index >= self.max_tiles() {
            Err(GeometryError::TileOutOfBounds)
        } else {
            let x = index % self.tiles_per_row as usize;
            let y = index / self.tiles_per_row as usize;
            Ok(TilePos {
                x: x as u32,
                y: y as u32,
            })
        }
    }

    /// Tile containing pixel (`x`, `y`).
    pub fn tile_at(self, x: u32, y: u32) -> Result<TilePos, GeometryError> {
        if x >= self.width || y >= self.height {
            return Err(GeometryError::TileOutOfBounds);
        }
        Ok(TilePos {
            x: x >> TILE_SHIFT,
            y: y >> TILE_SHIFT,
        })
    }
}
