//! Device colour palette

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Number of colour slots the device exposes
pub const PALETTE_SLOTS: u8 = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 0xFF)
    }

    pub fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Remaps one device colour slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteEntry {
    pub slot: u8,
    pub colour: Rgba,
}

/// An ordered set of slot remappings plus the shared background colour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub background: Rgba,
    pub entries: Vec<PaletteEntry>,
}

impl Default for Palette {
    fn default() -> Self {
        Self::default_for_device()
    }
}

impl Palette {
    pub fn new(background: Rgba) -> Self {
        Self {
            background,
            entries: Vec::new(),
        }
    }

    /// Factory colours, slot order matching the display colour codes
    pub fn default_for_device() -> Self {
        let colours = [
            Rgba::opaque(0x00, 0x00, 0x00), // black
            Rgba::opaque(0xFF, 0xA5, 0x00), // amber
            Rgba::opaque(0xFF, 0xFF, 0xFF), // white
            Rgba::opaque(0x3D, 0xD9, 0xE6), // cyan
            Rgba::opaque(0x00, 0xFF, 0x3D), // green
            Rgba::opaque(0xFF, 0x63, 0xFF), // magenta
            Rgba::opaque(0xFF, 0x00, 0x00), // red
            Rgba::opaque(0xFF, 0xFF, 0x00), // yellow
            Rgba::opaque(0x61, 0x5C, 0x42), // brown
            Rgba::opaque(0x77, 0x77, 0x77), // grey
            Rgba::opaque(0x79, 0x73, 0x5E), // khaki
        ];
        Self {
            background: Rgba::opaque(0, 0, 0),
            entries: colours
                .iter()
                .enumerate()
                .map(|(slot, colour)| PaletteEntry {
                    slot: slot as u8,
                    colour: *colour,
                })
                .collect(),
        }
    }

    pub fn set(&mut self, slot: u8, colour: Rgba) -> &mut Self {
        self.entries.push(PaletteEntry { slot, colour });
        self
    }

    pub fn get(&self, slot: u8) -> Option<Rgba> {
        self.entries.iter().rev().find(|e| e.slot == slot).map(|e| e.colour)
    }

    /// Drop out-of-range slots, keep the last entry per slot, sort by slot
    pub fn normalise(&mut self) {
        let mut seen: Vec<PaletteEntry> = Vec::with_capacity(self.entries.len());
        for entry in self.entries.iter().rev() {
            if entry.slot < PALETTE_SLOTS && !seen.iter().any(|e| e.slot == entry.slot) {
                seen.push(*entry);
            }
        }
        seen.sort_by_key(|e| e.slot);
        self.entries = seen;
    }

    pub fn normalised(&self) -> Self {
        let mut copy = self.clone();
        copy.normalise();
        copy
    }

    /// Duplicate-check serialization of the normalised palette
    pub fn signature(&self) -> String {
        let normalised = self.normalised();
        let bg = normalised.background;
        let mut sig = format!("bg={:02x}{:02x}{:02x}{:02x}", bg.r, bg.g, bg.b, bg.a);
        for entry in &normalised.entries {
            let c = entry.colour;
            let _ = write!(sig, ";{}={:02x}{:02x}{:02x}{:02x}", entry.slot, c.r, c.g, c.b, c.a);
        }
        sig
    }
}
