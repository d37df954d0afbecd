//! Bitmap font: two glyph sets of fixed-size monochrome bitmaps

use super::cell::FontSize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Widest glyph a row word can hold
pub const MAX_GLYPH_WIDTH: u16 = 32;

/// A monochrome glyph bitmap.
///
/// Each entry of `rows` is one pixel row. Pixel column `x` is bit
/// `glyph_width - 1 - x`, so the leftmost pixel is the highest used bit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Glyph {
    pub rows: Vec<u32>,
}

fn width_mask(width: u16) -> u32 {
    if width >= 32 {
        u32::MAX
    } else {
        (1u32 << width) - 1
    }
}

impl Glyph {
    /// Build a glyph padded or trimmed to exactly `height` rows of `width` bits
    pub fn from_rows(rows: &[u32], width: u16, height: u16) -> Self {
        let mask = width_mask(width.min(MAX_GLYPH_WIDTH));
        let mut out: Vec<u32> = rows.iter().take(height as usize).map(|r| r & mask).collect();
        out.resize(height as usize, 0);
        Self { rows: out }
    }

    pub fn blank(height: u16) -> Self {
        Self {
            rows: vec![0; height as usize],
        }
    }

    /// Parse rows drawn with `#` (set) and any other character (clear)
    pub fn from_art(lines: &[&str], width: u16, height: u16) -> Self {
        let rows: Vec<u32> = lines
            .iter()
            .map(|line| {
                line.chars().take(width as usize).enumerate().fold(0u32, |acc, (x, ch)| {
                    if ch == '#' {
                        acc | 1 << (width as usize - 1 - x)
                    } else {
                        acc
                    }
                })
            })
            .collect();
        Self::from_rows(&rows, width, height)
    }

    pub fn pixel(&self, x: u16, y: u16, width: u16) -> bool {
        if x >= width {
            return false;
        }
        self.rows
            .get(y as usize)
            .map(|row| row >> (width - 1 - x) & 1 == 1)
            .unwrap_or(false)
    }

    /// Bytes per pixel row on the wire
    pub fn row_bytes(width: u16) -> usize {
        (width as usize).div_ceil(8)
    }

    /// Serialize as MSB-first rows, `row_bytes(width)` bytes per row
    pub fn to_wire(&self, width: u16, height: u16) -> Vec<u8> {
        let row_bytes = Self::row_bytes(width);
        let padded_bits = row_bytes * 8;
        let mut out = Vec::with_capacity(row_bytes * height as usize);
        for y in 0..height as usize {
            let row = self.rows.get(y).copied().unwrap_or(0) & width_mask(width);
            // Left-align the row inside its byte run.
            let aligned = (row as u64) << (padded_bits - width as usize);
            for b in (0..row_bytes).rev() {
                out.push((aligned >> (b * 8)) as u8);
            }
        }
        out
    }

    /// Inverse of [`Glyph::to_wire`]; short input leaves cleared rows
    pub fn from_wire(bytes: &[u8], width: u16, height: u16) -> Self {
        let row_bytes = Self::row_bytes(width);
        if row_bytes == 0 {
            return Self::blank(height);
        }
        let padded_bits = row_bytes * 8;
        let rows: Vec<u32> = bytes
            .chunks(row_bytes)
            .take(height as usize)
            .map(|chunk| {
                let mut aligned: u64 = 0;
                for i in 0..row_bytes {
                    aligned = aligned << 8 | chunk.get(i).copied().unwrap_or(0) as u64;
                }
                (aligned >> (padded_bits - width as usize)) as u32
            })
            .collect();
        Self::from_rows(&rows, width, height)
    }
}

/// A complete device font
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontFile {
    #[serde(default)]
    pub name: String,
    pub glyph_width: u16,
    pub glyph_height: u16,
    /// Cell advance for the wide variant, if the font has one
    #[serde(default)]
    pub glyph_full_width: Option<u16>,
    #[serde(default)]
    pub large: BTreeMap<char, Glyph>,
    #[serde(default)]
    pub small: BTreeMap<char, Glyph>,
}

impl FontFile {
    pub fn new(name: impl Into<String>, glyph_width: u16, glyph_height: u16) -> Self {
        Self {
            name: name.into(),
            glyph_width: glyph_width.min(MAX_GLYPH_WIDTH),
            glyph_height,
            glyph_full_width: None,
            large: BTreeMap::new(),
            small: BTreeMap::new(),
        }
    }

    pub fn glyphs(&self, size: FontSize) -> &BTreeMap<char, Glyph> {
        match size {
            FontSize::Large => &self.large,
            FontSize::Small => &self.small,
        }
    }

    /// Insert a glyph, normalising it to the font's dimensions
    pub fn insert(&mut self, size: FontSize, ch: char, glyph: Glyph) {
        let glyph = Glyph::from_rows(&glyph.rows, self.glyph_width, self.glyph_height);
        match size {
            FontSize::Large => self.large.insert(ch, glyph),
            FontSize::Small => self.small.insert(ch, glyph),
        };
    }

    pub fn glyph_count(&self) -> usize {
        self.large.len() + self.small.len()
    }

    /// Horizontal advance per cell
    pub fn cell_width(&self) -> u16 {
        self.glyph_full_width.unwrap_or(self.glyph_width)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let mut font: FontFile = serde_json::from_str(json)?;
        font.normalise();
        Ok(font)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Re-pad every glyph to exactly the declared dimensions
    pub fn normalise(&mut self) {
        self.glyph_width = self.glyph_width.min(MAX_GLYPH_WIDTH);
        let (w, h) = (self.glyph_width, self.glyph_height);
        for glyph in self.large.values_mut().chain(self.small.values_mut()) {
            *glyph = Glyph::from_rows(&glyph.rows, w, h);
        }
    }
}
