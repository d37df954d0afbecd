//! Font and palette upload encoders
//!
//! Both uploads are streams of 0xF0 reports produced by patching a packet
//! template. The template layouts are described by small JSON "packet maps"
//! bundled with the crate; see [`FontPacketMap`] and [`PalettePacketMap`].

use crate::core::error::{PanelError, PanelResult};
use crate::hid::protocol::percent_to_byte;
use crate::hid::template::{HoleTarget, PacketTemplate, TemplateBuilder};
use crate::model::{FontFile, FontSize, Glyph, Palette, Rgba, MCDU_COLUMNS, MCDU_ROWS};
use crate::resources::ResourceRegistry;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// LCD width in pixels
pub const LCD_WIDTH_PX: i64 = 640;

/// LCD height in pixels
pub const LCD_HEIGHT_PX: i64 = 480;

/// Start of a font upload payload
pub const FONT_OPENING: [u8; 6] = [0x32, 0xBB, 0x00, 0x00, 0x1E, 0x01];

/// Precedes the large glyph set ("LGFNT\x01")
pub const LARGE_FONT_MARKER: [u8; 6] = [0x4C, 0x47, 0x46, 0x4E, 0x54, 0x01];

/// Precedes the small glyph set ("SGFNT\x02")
pub const SMALL_FONT_MARKER: [u8; 6] = [0x53, 0x47, 0x46, 0x4E, 0x54, 0x02];

/// Precedes the glyph records of either set ("GLYPH\0")
pub const GLYPH_DATA_MARKER: [u8; 6] = [0x47, 0x4C, 0x59, 0x50, 0x48, 0x00];

/// Lead-in of each palette slot record ("CL")
pub const PALETTE_SLOT_TAG: [u8; 2] = [0x43, 0x4C];

/// Variant marker for a glyph set
pub fn variant_marker(size: FontSize) -> [u8; 6] {
    match size {
        FontSize::Large => LARGE_FONT_MARKER,
        FontSize::Small => SMALL_FONT_MARKER,
    }
}

fn decode_hex_list(name: &str, lines: &[String]) -> PanelResult<Vec<Vec<u8>>> {
    lines
        .iter()
        .map(|line| {
            hex::decode(line.trim()).map_err(|e| PanelError::Resource {
                name: name.to_string(),
                reason: e.to_string(),
            })
        })
        .collect()
}

fn decode_hex(name: &str, line: &str) -> PanelResult<Vec<u8>> {
    hex::decode(line.trim()).map_err(|e| PanelError::Resource {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

/// Bundled description of a font upload for one glyph size
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontPacketMap {
    pub name: String,
    pub glyph_width: u16,
    pub glyph_height: u16,
    /// Insert a continue report after this many stream reports
    #[serde(default)]
    pub continue_every: usize,
    /// Round the stream's report count up to a multiple of this
    #[serde(default)]
    pub pad_to: usize,
    /// Literal reports sent before the stream, hex encoded
    #[serde(default)]
    pub prologue: Vec<String>,
    /// Characters carried by both glyph sets, in upload order
    pub charset: String,
    /// Literal reports sent after the stream, hex encoded
    #[serde(default)]
    pub epilogue: Vec<String>,
}

impl FontPacketMap {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Lay the map out as a packet template with a hole per glyph
    pub fn build(&self) -> PanelResult<PacketTemplate> {
        let glyph_len = Glyph::row_bytes(self.glyph_width) * self.glyph_height as usize;
        let blank = vec![0u8; glyph_len];

        let mut builder = TemplateBuilder::new(&self.name)
            .glyph_size(self.glyph_width, self.glyph_height)
            .continue_every(self.continue_every);
        for packet in decode_hex_list(&self.name, &self.prologue)? {
            builder.literal(packet);
        }

        builder.bytes(&FONT_OPENING);
        builder.bytes(&[self.glyph_width as u8, self.glyph_height as u8]);
        builder.hole(HoleTarget::XOffset, &[0, 0]);
        builder.hole(HoleTarget::YOffset, &[0, 0]);
        builder.hole(HoleTarget::Brightness, &[0xFF]);

        for size in [FontSize::Large, FontSize::Small] {
            builder.bytes(&variant_marker(size));
            builder.bytes(&GLYPH_DATA_MARKER);
            for ch in self.charset.chars() {
                builder.bytes(&(ch as u32).to_le_bytes());
                let target = match size {
                    FontSize::Large => HoleTarget::LargeGlyph(ch),
                    FontSize::Small => HoleTarget::SmallGlyph(ch),
                };
                builder.hole(target, &blank);
            }
            builder.bytes(&0u32.to_le_bytes());
        }
        builder.end_stream(self.pad_to);

        for packet in decode_hex_list(&self.name, &self.epilogue)? {
            builder.literal(packet);
        }
        Ok(builder.build())
    }
}

/// Bundled description of the palette update sequence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PalettePacketMap {
    pub name: String,
    #[serde(default)]
    pub continue_every: usize,
    #[serde(default)]
    pub pad_to: usize,
    /// Payload bytes opening the colour table update, hex encoded
    pub header: String,
    /// Payload bytes closing the update, hex encoded
    pub trailer: String,
}

impl PalettePacketMap {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Lay out one record per slot, pre-filled with the factory palette
    pub fn build(&self) -> PanelResult<PacketTemplate> {
        let defaults = Palette::default_for_device();
        let mut builder = TemplateBuilder::new(&self.name).continue_every(self.continue_every);
        builder.bytes(&decode_hex(&self.name, &self.header)?);
        for entry in &defaults.entries {
            builder.bytes(&PALETTE_SLOT_TAG);
            builder.bytes(&[entry.slot]);
            builder.hole(HoleTarget::Foreground(entry.slot), &entry.colour.to_bytes());
            builder.hole(HoleTarget::Background(entry.slot), &defaults.background.to_bytes());
        }
        builder.bytes(&decode_hex(&self.name, &self.trailer)?);
        builder.end_stream(self.pad_to);
        Ok(builder.build())
    }
}

/// Caller-supplied font upload parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontUploadParams {
    pub brightness_percent: i32,
    pub x_adjust: i32,
    pub y_adjust: i32,
}

impl Default for FontUploadParams {
    fn default() -> Self {
        Self {
            brightness_percent: 100,
            x_adjust: 0,
            y_adjust: 0,
        }
    }
}

fn saturate_u16(value: i64) -> u16 {
    value.clamp(0, u16::MAX as i64) as u16
}

/// Shift a row so pixel 0 stays leftmost at a different width
fn realign_row(row: u32, from: u16, to: u16) -> u32 {
    if to >= from {
        row.checked_shl((to - from) as u32).unwrap_or(0)
    } else {
        row.checked_shr((from - to) as u32).unwrap_or(0)
    }
}

/// Patches the font template for a font's glyph height
#[derive(Debug)]
pub struct FontUploader {
    resources: Arc<ResourceRegistry>,
    columns: usize,
    rows: usize,
    last_font: Option<FontFile>,
}

impl FontUploader {
    pub fn new(resources: Arc<ResourceRegistry>) -> Self {
        Self::with_grid(resources, MCDU_COLUMNS, MCDU_ROWS)
    }

    /// Uploader centring a `columns` x `rows` grid instead of the MCDU screen
    pub fn with_grid(resources: Arc<ResourceRegistry>, columns: usize, rows: usize) -> Self {
        Self {
            resources,
            columns,
            rows,
            last_font: None,
        }
    }

    /// Top-left pixel of the glyph block, centred on the LCD
    pub fn offsets(&self, font: &FontFile, params: &FontUploadParams) -> (u16, u16) {
        let block_w = self.columns as i64 * font.cell_width() as i64;
        let block_h = self.rows as i64 * font.glyph_height as i64;
        let x = (LCD_WIDTH_PX - block_w) / 2 + params.x_adjust as i64;
        let y = (LCD_HEIGHT_PX - block_h) / 2 + params.y_adjust as i64;
        (saturate_u16(x), saturate_u16(y))
    }

    /// Render every report of the upload for `font`
    pub fn encode(&self, font: &FontFile, params: &FontUploadParams) -> PanelResult<Vec<Vec<u8>>> {
        let template = self
            .resources
            .font_template(font.glyph_height)
            .ok_or(PanelError::UnsupportedGlyphHeight(font.glyph_height))?;
        let (x, y) = self.offsets(font, params);
        let brightness = percent_to_byte(params.brightness_percent);
        let (width, height) = (template.glyph_width, template.glyph_height);
        debug!(
            "Encoding font '{}' with template {} at ({}, {})",
            font.name, template.name, x, y
        );

        let glyph_bytes = |glyph: Option<&Glyph>| -> Vec<u8> {
            match glyph {
                Some(glyph) => {
                    let rows: Vec<u32> = glyph
                        .rows
                        .iter()
                        .map(|&row| realign_row(row, font.glyph_width, width))
                        .collect();
                    Glyph::from_rows(&rows, width, height).to_wire(width, height)
                }
                None => vec![0u8; Glyph::row_bytes(width) * height as usize],
            }
        };

        Ok(template.render(|target| match target {
            HoleTarget::XOffset => Some(x.to_le_bytes().to_vec()),
            HoleTarget::YOffset => Some(y.to_le_bytes().to_vec()),
            HoleTarget::Brightness => Some(vec![brightness]),
            HoleTarget::LargeGlyph(ch) => Some(glyph_bytes(font.large.get(ch))),
            HoleTarget::SmallGlyph(ch) => Some(glyph_bytes(font.small.get(ch))),
            HoleTarget::Foreground(_) | HoleTarget::Background(_) => None,
        }))
    }

    /// Record the font now loaded on the device
    pub fn commit(&mut self, font: &FontFile) {
        self.last_font = Some(font.clone());
    }

    pub fn last_font(&self) -> Option<&FontFile> {
        self.last_font.as_ref()
    }
}

/// Patches the palette template
#[derive(Debug)]
pub struct PaletteUploader {
    resources: Arc<ResourceRegistry>,
    last_palette: Option<Palette>,
}

impl PaletteUploader {
    pub fn new(resources: Arc<ResourceRegistry>) -> Self {
        Self {
            resources,
            last_palette: None,
        }
    }

    /// Reports for `palette`, or `None` if it matches the last upload
    pub fn encode(&self, palette: &Palette, skip_duplicate_check: bool) -> Option<Vec<Vec<u8>>> {
        let palette = palette.normalised();
        if !skip_duplicate_check
            && self.last_palette.as_ref().map(Palette::signature) == Some(palette.signature())
        {
            return None;
        }
        let background = palette.background;
        let colour = |slot: &u8| -> Option<Rgba> { palette.get(*slot) };
        Some(self.resources.palette_template().render(|target| match target {
            HoleTarget::Foreground(slot) => colour(slot).map(|c| c.to_bytes().to_vec()),
            HoleTarget::Background(slot) => colour(slot).map(|_| background.to_bytes().to_vec()),
            _ => None,
        }))
    }

    /// Record the palette now loaded on the device
    pub fn commit(&mut self, palette: &Palette) {
        self.last_palette = Some(palette.normalised());
    }

    pub fn last_palette(&self) -> Option<&Palette> {
        self.last_palette.as_ref()
    }
}
