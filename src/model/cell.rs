//! Character cell, colour and font size

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed set of colours the MCDU firmware can draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Colour {
    #[default]
    White = 0,
    Amber = 1,
    Cyan = 2,
    Green = 3,
    Grey = 4,
    Khaki = 5,
    Magenta = 6,
    Red = 7,
    Yellow = 8,
    Brown = 9,
}

impl Colour {
    /// Every colour, in discriminant order
    pub const ALL: [Colour; 10] = [
        Colour::White,
        Colour::Amber,
        Colour::Cyan,
        Colour::Green,
        Colour::Grey,
        Colour::Khaki,
        Colour::Magenta,
        Colour::Red,
        Colour::Yellow,
        Colour::Brown,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Colour::White => "white",
            Colour::Amber => "amber",
            Colour::Cyan => "cyan",
            Colour::Green => "green",
            Colour::Grey => "grey",
            Colour::Khaki => "khaki",
            Colour::Magenta => "magenta",
            Colour::Red => "red",
            Colour::Yellow => "yellow",
            Colour::Brown => "brown",
        }
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Colour {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Colour::ALL
            .into_iter()
            .find(|c| c.name() == lower || (lower == "gray" && *c == Colour::Grey))
            .ok_or_else(|| format!("unknown colour '{}'", s))
    }
}

/// Large or small glyph set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    #[default]
    Large,
    Small,
}

/// One character cell on the display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub character: char,
    pub colour: Colour,
    pub size: FontSize,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            character: ' ',
            colour: Colour::White,
            size: FontSize::Large,
        }
    }
}

impl Cell {
    pub fn new(character: char, colour: Colour, size: FontSize) -> Self {
        Self {
            character,
            colour,
            size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cell() {
        let cell = Cell::default();
        assert_eq!(cell.character, ' ');
        assert_eq!(cell.colour, Colour::White);
        assert_eq!(cell.size, FontSize::Large);
    }

    #[test]
    fn test_colour_parse() {
        assert_eq!("Amber".parse::<Colour>(), Ok(Colour::Amber));
        assert_eq!("gray".parse::<Colour>(), Ok(Colour::Grey));
        assert!("purple".parse::<Colour>().is_err());
    }

    #[test]
    fn test_colour_index_matches_all() {
        for (i, colour) in Colour::ALL.iter().enumerate() {
            assert_eq!(colour.index(), i);
        }
    }
}
