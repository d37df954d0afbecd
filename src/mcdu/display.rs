//! Character grid encoder
//!
//! A display update is a run of 64-byte reports tagged 0xF2. The payload
//! after the tag is one stream of cells in row-major order, each written as
//! a two-byte colour/size code followed by the character's UTF-8 bytes.
//! Cells freely straddle report boundaries.

use crate::core::config::DisplayConfig;
use crate::hid::protocol::{ReportTag, PACKET_SIZE};
use crate::model::{Buffer, Colour, FontSize};
use tracing::warn;

/// Added to the low code byte of the first cell in the grid
pub const FIRST_CELL_BIAS: u8 = 1;

/// Added to the low code byte of the last cell in the grid
pub const LAST_CELL_BIAS: u8 = 2;

/// Offset between a colour's large and small code
pub const SMALL_CODE_OFFSET: u16 = 0x016B;

const LARGE_CODES: [(Colour, u16); 10] = [
    (Colour::Amber, 0x0021),
    (Colour::White, 0x0042),
    (Colour::Cyan, 0x0063),
    (Colour::Green, 0x0084),
    (Colour::Magenta, 0x00A5),
    (Colour::Red, 0x00C6),
    (Colour::Yellow, 0x00E7),
    (Colour::Brown, 0x0108),
    (Colour::Grey, 0x0129),
    (Colour::Khaki, 0x014A),
];

/// Colour/size to code lookup, indexed by colour discriminant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColourTable {
    large: [u16; 10],
}

impl Default for ColourTable {
    fn default() -> Self {
        let mut large = [0u16; 10];
        for (colour, code) in LARGE_CODES {
            large[colour.index()] = code;
        }
        Self { large }
    }
}

impl ColourTable {
    /// Default codes with the configured overrides applied
    pub fn from_config(config: &DisplayConfig) -> Self {
        let mut table = Self::default();
        for (name, [lo, hi]) in &config.colour_overrides {
            match name.parse::<Colour>() {
                Ok(colour) => table.set_large(colour, u16::from_le_bytes([*lo, *hi])),
                Err(e) => warn!("Ignoring colour override: {}", e),
            }
        }
        table
    }

    /// Replace the large-font code of `colour`; the small code follows it
    pub fn set_large(&mut self, colour: Colour, code: u16) {
        self.large[colour.index()] = code;
    }

    /// Colour/size code of a cell
    pub fn code(&self, colour: Colour, size: FontSize) -> u16 {
        let large = self.large[colour.index()];
        match size {
            FontSize::Large => large,
            FontSize::Small => large.wrapping_add(SMALL_CODE_OFFSET),
        }
    }

    /// Code bytes as sent, low byte first
    pub fn code_bytes(&self, colour: Colour, size: FontSize) -> [u8; 2] {
        self.code(colour, size).to_le_bytes()
    }

    /// Reverse lookup used when reading display reports back
    pub fn lookup(&self, code: u16) -> Option<(Colour, FontSize)> {
        Colour::ALL.into_iter().find_map(|colour| {
            if self.code(colour, FontSize::Large) == code {
                Some((colour, FontSize::Large))
            } else if self.code(colour, FontSize::Small) == code {
                Some((colour, FontSize::Small))
            } else {
                None
            }
        })
    }
}

/// Boundary bias for the cell at `index` of a grid holding `count` cells
pub fn cell_bias(index: usize, count: usize) -> u8 {
    let mut bias = 0u8;
    if index == 0 {
        bias = bias.wrapping_add(FIRST_CELL_BIAS);
    }
    if count > 0 && index == count - 1 {
        bias = bias.wrapping_add(LAST_CELL_BIAS);
    }
    bias
}

/// Encoded display update together with the signature it was built from
#[derive(Debug, Clone)]
pub struct DisplayFrame {
    pub signature: String,
    pub packets: Vec<[u8; PACKET_SIZE]>,
}

/// Accumulates a tagged payload stream into fixed-size reports
struct ReportWriter {
    tag: u8,
    current: [u8; PACKET_SIZE],
    len: usize,
    packets: Vec<[u8; PACKET_SIZE]>,
}

impl ReportWriter {
    fn new(tag: u8) -> Self {
        let mut current = [0u8; PACKET_SIZE];
        current[0] = tag;
        Self {
            tag,
            current,
            len: 1,
            packets: Vec::new(),
        }
    }

    fn push(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.current[self.len] = byte;
            self.len += 1;
            if self.len == PACKET_SIZE {
                self.flush();
            }
        }
    }

    fn flush(&mut self) {
        self.packets.push(self.current);
        self.current = [0u8; PACKET_SIZE];
        self.current[0] = self.tag;
        self.len = 1;
    }

    fn finish(mut self) -> Vec<[u8; PACKET_SIZE]> {
        if self.len > 1 {
            self.flush();
        }
        self.packets
    }
}

/// Serialises a [`Buffer`] into display reports with duplicate suppression
#[derive(Debug, Default)]
pub struct DisplayEncoder {
    colours: ColourTable,
    last_sent: Option<String>,
}

impl DisplayEncoder {
    pub fn new(colours: ColourTable) -> Self {
        Self {
            colours,
            last_sent: None,
        }
    }

    pub fn colours(&self) -> &ColourTable {
        &self.colours
    }

    /// Encode `buffer`, or `None` when it matches what was last sent.
    ///
    /// Nothing is recorded here; call [`DisplayEncoder::mark_sent`] once the
    /// packets have been written.
    pub fn encode(&self, buffer: &Buffer, skip_duplicate_check: bool) -> Option<DisplayFrame> {
        let signature = buffer.signature();
        if !skip_duplicate_check && self.last_sent.as_deref() == Some(signature.as_str()) {
            return None;
        }
        Some(DisplayFrame {
            signature,
            packets: self.packets(buffer),
        })
    }

    /// Build the reports for `buffer` unconditionally
    pub fn packets(&self, buffer: &Buffer) -> Vec<[u8; PACKET_SIZE]> {
        let count = buffer.height() * buffer.width();
        let mut writer = ReportWriter::new(ReportTag::Display.as_byte());
        let mut utf8 = [0u8; 4];

        let cells = buffer.rows().iter().flat_map(|row| row.cells().iter());
        for (index, cell) in cells.enumerate() {
            let [lo, hi] = self.colours.code_bytes(cell.colour, cell.size);
            writer.push(&[lo.wrapping_add(cell_bias(index, count)), hi]);
            writer.push(cell.character.encode_utf8(&mut utf8).as_bytes());
        }
        writer.finish()
    }

    /// Record a frame as on the device; call only after every packet was written
    pub fn mark_sent(&mut self, signature: String) {
        self.last_sent = Some(signature);
    }

    /// Forget the last signature so the next encode always produces packets
    pub fn reset(&mut self) {
        self.last_sent = None;
    }
}
