//! Display data model - pure data, no I/O

pub mod buffer;
pub mod cell;
pub mod font;
pub mod leds;
pub mod palette;

pub use buffer::{Buffer, Direction, Row, MCDU_COLUMNS, MCDU_ROWS};
pub use cell::{Cell, Colour, FontSize};
pub use font::{FontFile, Glyph, MAX_GLYPH_WIDTH};
pub use leds::{clamp_percent, McduLed, McduLeds};
pub use palette::{Palette, PaletteEntry, Rgba, PALETTE_SLOTS};
