//! Error types for the panel communication layer

use thiserror::Error;

/// Errors raised while opening, driving or encoding for a panel
#[derive(Debug, Error)]
pub enum PanelError {
    /// The underlying HID transport failed
    #[error("HID transport error: {0}")]
    Hid(#[from] hidapi::HidError),

    /// No enumerated device matched the configured IDs
    #[error("no device with VID 0x{vendor_id:04X} PID 0x{product_id:04X}")]
    DeviceNotFound { vendor_id: u16, product_id: u16 },

    /// The device declares an output report smaller than the protocol needs
    #[error("device output capacity {actual} bytes is below the required {required}")]
    OutputCapacity { required: usize, actual: usize },

    /// No packet map exists for the requested glyph height
    #[error("no packet map for glyph height {0}")]
    UnsupportedGlyphHeight(u16),

    /// The session has been shut down or the device went away
    #[error("device disconnected")]
    Disconnected,

    /// A bundled resource could not be parsed
    #[error("resource {name}: {reason}")]
    Resource { name: String, reason: String },

    /// A write did not complete
    #[error("write failed: {0}")]
    Write(String),
}

/// Errors raised by the capture font extractor
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    /// A report with an unexpected leading tag interrupted a multi-byte read
    #[error("invalid capture: report {report} has tag 0x{tag:02X} in the middle of a glyph record")]
    InvalidCapture { report: usize, tag: u8 },

    /// The captured font header declares glyphs wider than a row word holds
    #[error("invalid capture: report {report} declares {width} pixel wide glyphs, at most {max} are supported")]
    GlyphTooWide { report: usize, width: u16, max: u16 },

    /// A capture line was not valid hex
    #[error("line {line}: {reason}")]
    BadHex { line: usize, reason: String },
}

pub type PanelResult<T> = std::result::Result<T, PanelError>;
