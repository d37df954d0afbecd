//! MCDU key definitions
//!
//! Keys are listed in input-report bit order: key `i` is bit `i % 8` of
//! byte `1 + i / 8`.

use crate::core::events::KeyId;
use crate::hid::input::{AmbientSensor, InputLayout};

/// Offset of the left ambient light sensor reading
pub const AMBIENT_LEFT_OFFSET: usize = 17;

/// Offset of the right ambient light sensor reading
pub const AMBIENT_RIGHT_OFFSET: usize = 19;

/// Maximum raw ambient light sensor reading
pub const AMBIENT_SENSOR_MAX: u16 = 0x0FFF;

macro_rules! mcdu_keys {
    ($($key:ident => $label:literal),* $(,)?) => {
        /// A physical MCDU key
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum McduKey {
            $($key),*
        }

        impl McduKey {
            /// Every key, in report bit order
            pub const ALL: &'static [McduKey] = &[$(McduKey::$key),*];

            /// Legend printed on the key
            pub fn label(self) -> &'static str {
                match self {
                    $(McduKey::$key => $label),*
                }
            }
        }
    };
}

mcdu_keys! {
    Lsk1L => "LSK1L", Lsk2L => "LSK2L", Lsk3L => "LSK3L",
    Lsk4L => "LSK4L", Lsk5L => "LSK5L", Lsk6L => "LSK6L",
    Lsk1R => "LSK1R", Lsk2R => "LSK2R", Lsk3R => "LSK3R",
    Lsk4R => "LSK4R", Lsk5R => "LSK5R", Lsk6R => "LSK6R",
    Dir => "DIR", Prog => "PROG", Perf => "PERF", Init => "INIT", Data => "DATA",
    Blank1 => "BLANK1", Brt => "BRT",
    FPln => "F-PLN", RadNav => "RAD NAV", FuelPred => "FUEL PRED",
    SecFPln => "SEC F-PLN", AtcComm => "ATC COMM", McduMenu => "MCDU MENU",
    Dim => "DIM", Airport => "AIRPORT", Blank2 => "BLANK2",
    SlewLeft => "SLEW LEFT", SlewUp => "SLEW UP", SlewRight => "SLEW RIGHT", SlewDown => "SLEW DOWN",
    Digit1 => "1", Digit2 => "2", Digit3 => "3", Digit4 => "4", Digit5 => "5",
    Digit6 => "6", Digit7 => "7", Digit8 => "8", Digit9 => "9",
    Dot => ".", Digit0 => "0", PlusMinus => "+/-",
    A => "A", B => "B", C => "C", D => "D", E => "E", F => "F", G => "G",
    H => "H", I => "I", J => "J", K => "K", L => "L", M => "M", N => "N",
    O => "O", P => "P", Q => "Q", R => "R", S => "S", T => "T", U => "U",
    V => "V", W => "W", X => "X", Y => "Y", Z => "Z",
    Slash => "/", Space => "SP", Ovfy => "OVFY", Clr => "CLR",
}

impl McduKey {
    /// Character the key types into a scratchpad, if any
    pub fn character(self) -> Option<char> {
        let label = self.label();
        let mut chars = label.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ if self == McduKey::Space => Some(' '),
            _ => None,
        }
    }

    pub fn is_line_select(self) -> bool {
        self <= McduKey::Lsk6R
    }
}

/// Input layout of the MCDU's 25-byte report
pub fn mcdu_input_layout() -> InputLayout {
    InputLayout::sequential(
        McduKey::ALL.iter().map(|k| KeyId::Mcdu(*k)),
        Some(AmbientSensor {
            left_offset: AMBIENT_LEFT_OFFSET,
            right_offset: AMBIENT_RIGHT_OFFSET,
            max_raw: AMBIENT_SENSOR_MAX,
        }),
    )
}
