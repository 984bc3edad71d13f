use thiserror::Error;

use crate::BUFFER_OVERHEAD;

pub const PALETTE_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PaletteError {
    #[error("palette must hold at least one colour")]
    Empty,
    #[error("palette holds {0} colours, at most 256 are allowed")]
    TooManyColors(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Palette {
    pub fn new(colors: Vec<Rgb>) -> Result<Self, PaletteError> {
        if colors.is_empty() {
            return Err(PaletteError::Empty);
        }
        if colors.len() > PALETTE_CAPACITY {
            return Err(PaletteError::TooManyColors(colors.len()));
        }
        Ok(Self { colors })
    }

    pub fn grayscale(len: usize) -> Result<Self, PaletteError> {
        let steps = len.saturating_sub(1).max(1);
        Self::new(
            (0..len)
                .map(|index| {
                    let level = (index * 255 / steps) as u8;
                    Rgb::new(level, level, level)
                })
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    pub fn get(&self, index: usize) -> Option<Rgb> {
        self.colors.get(index).copied()
    }

    pub fn set(&mut self, index: usize, color: Rgb) -> bool {
        match self.colors.get_mut(index) {
            Some(slot) => {
                *slot = color;
                true
            }
            None => false,
        }
    }

    pub fn resize(&mut self, len: usize) -> Result<(), PaletteError> {
        if len == 0 {
            return Err(PaletteError::Empty);
        }
        if len > PALETTE_CAPACITY {
            return Err(PaletteError::TooManyColors(len));
        }
        self.colors.resize(len, Rgb::default());
        Ok(())
    }

    /// Accounted size of a stored copy.
    pub fn stored_bytes(&self) -> usize {
        self.colors.len() * 3 + BUFFER_OVERHEAD
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: (0..PALETTE_CAPACITY)
                .map(|index| Rgb::new(index as u8, index as u8, index as u8))
                .collect(),
        }
    }
}
