//! Cockpit Panels
//!
//! USB HID communication layer for flight-simulator cockpit panels.
//!
//! # Features
//! - MCDU: 14x24 character display, annunciator lamps, brightness, font and
//!   palette uploads, keypad and ambient light events
//! - FCU with optional EFIS panels: seven-segment windows, lamps, keys
//! - Offline font recovery from captured upload reports

pub mod capture;
pub mod core;
pub mod fcu;
pub mod hid;
pub mod mcdu;
pub mod model;
pub mod resources;

pub use capture::{extract_font_from_capture_lines, Extraction, FontExtractor};
pub use core::config::Config;
pub use core::error::{ExtractError, PanelError, PanelResult};
pub use core::events::{EventHub, KeyId, PanelEvent, SubscriptionId};
pub use fcu::{Fcu, FcuLeds, FcuPanels, FcuState};
pub use hid::{HidApiTransport, HidTransport, PanelSession};
pub use mcdu::Mcdu;
pub use model::{Buffer, Colour, FontFile, FontSize, McduLed, McduLeds, Palette};
pub use resources::ResourceRegistry;
