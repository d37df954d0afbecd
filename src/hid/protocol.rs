//! HID report definitions shared by the MCDU and FCU families
//!
//! All reports are fixed-size and tag-prefixed:
//! - Display update: 64 bytes, tag 0xF2
//! - LED / brightness: 14 bytes, tag 0x02
//! - Upload (font, palette, 7-segment): 64 bytes, tag 0xF0
//! - Input: 25 bytes, tag 0x01

use crate::model::clamp_percent;

/// Size of display and upload output reports
pub const PACKET_SIZE: usize = 64;

/// Size of the LED / brightness output report
pub const INDICATOR_PACKET_SIZE: usize = 14;

/// Size of the input report
pub const INPUT_REPORT_SIZE: usize = 25;

/// Upload report header: tag, 0x00, sequence, payload length
pub const UPLOAD_HEADER_SIZE: usize = 4;

/// Maximum upload payload per report
pub const UPLOAD_PAYLOAD_SIZE: usize = PACKET_SIZE - UPLOAD_HEADER_SIZE;

/// Payload of a continue report (carried with a zero length byte)
pub const CONTINUE_MARKER: [u8; 2] = [0x1E, 0x05];

/// Leading byte of every report type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReportTag {
    /// Input report from the device
    Input = 0x01,
    /// LED or brightness change
    Indicator = 0x02,
    /// Font, palette and segment uploads
    Upload = 0xF0,
    /// Character grid update
    Display = 0xF2,
}

impl ReportTag {
    /// Convert to the leading report byte
    pub fn as_byte(&self) -> u8 {
        *self as u8
    }

    /// Parse a leading report byte; `None` for tags this crate does not use
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(ReportTag::Input),
            0x02 => Some(ReportTag::Indicator),
            0xF0 => Some(ReportTag::Upload),
            0xF2 => Some(ReportTag::Display),
            _ => None,
        }
    }
}

/// Two-byte address of a sub-panel within a compound device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandPrefix(pub [u8; 2]);

impl CommandPrefix {
    /// MCDU display head
    pub const MCDU: CommandPrefix = CommandPrefix([0x32, 0xBB]);
    /// FCU centre unit
    pub const FCU: CommandPrefix = CommandPrefix([0x10, 0xBB]);
    /// Captain-side EFIS
    pub const EFIS_LEFT: CommandPrefix = CommandPrefix([0x0D, 0xBF]);
    /// First-officer-side EFIS
    pub const EFIS_RIGHT: CommandPrefix = CommandPrefix([0x0E, 0xBF]);

    /// The two prefix bytes as they appear after the report tag
    pub fn bytes(&self) -> [u8; 2] {
        self.0
    }
}

/// Brightness channels shared by every sub-panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrightnessKind {
    /// Key backlight
    Backlight,
    /// LCD or segment display
    Display,
    /// Indicator lamps
    Leds,
}

impl BrightnessKind {
    /// Indicator code carried in the brightness report
    pub fn code(self) -> u8 {
        match self {
            BrightnessKind::Backlight => 0x00,
            BrightnessKind::Display => 0x01,
            BrightnessKind::Leds => 0x02,
        }
    }
}

/// Convert a percentage to the device's 0-255 scale, clamping first
pub fn percent_to_byte(percent: i32) -> u8 {
    let p = clamp_percent(percent) as u32;
    ((p * 255 + 50) / 100) as u8
}

/// Build the fixed 14-byte "indicator code + value" report
pub fn indicator_packet(prefix: CommandPrefix, code: u8, value: u8) -> [u8; INDICATOR_PACKET_SIZE] {
    let [p0, p1] = prefix.bytes();
    [
        ReportTag::Indicator.as_byte(),
        p0,
        p1,
        0x00,
        0x00,
        0x03,
        0x49,
        code,
        value,
        0x00,
        0x00,
        0x00,
        0x00,
        0x00,
    ]
}

/// Brightness report for one channel of a sub-panel
pub fn brightness_packet(
    prefix: CommandPrefix,
    kind: BrightnessKind,
    percent: i32,
) -> [u8; INDICATOR_PACKET_SIZE] {
    indicator_packet(prefix, kind.code(), percent_to_byte(percent))
}

/// Build an upload report around a payload chunk
pub fn upload_report(sequence: u8, payload: &[u8]) -> [u8; PACKET_SIZE] {
    let len = payload.len().min(UPLOAD_PAYLOAD_SIZE);
    let mut report = [0u8; PACKET_SIZE];
    report[0] = ReportTag::Upload.as_byte();
    report[1] = 0x00;
    report[2] = sequence;
    report[3] = len as u8;
    report[UPLOAD_HEADER_SIZE..UPLOAD_HEADER_SIZE + len].copy_from_slice(&payload[..len]);
    report
}

/// An upload report with no payload
pub fn padding_report(sequence: u8) -> [u8; PACKET_SIZE] {
    upload_report(sequence, &[])
}

/// An upload report carrying only the continue marker
pub fn continue_report(sequence: u8) -> [u8; PACKET_SIZE] {
    let mut report = padding_report(sequence);
    report[UPLOAD_HEADER_SIZE..UPLOAD_HEADER_SIZE + CONTINUE_MARKER.len()]
        .copy_from_slice(&CONTINUE_MARKER);
    report
}

/// Classification of an upload report by its header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    /// Carries `len` payload bytes
    Data(usize),
    /// Zero length, no marker
    Padding,
    /// Zero length with [`CONTINUE_MARKER`]
    Continue,
}

/// Classify an upload report; `None` if it is not an upload report
pub fn classify_upload(report: &[u8]) -> Option<UploadKind> {
    if report.first() != Some(&ReportTag::Upload.as_byte()) {
        return None;
    }
    let len = report.get(3).copied().unwrap_or(0) as usize;
    if len > 0 {
        return Some(UploadKind::Data(len.min(UPLOAD_PAYLOAD_SIZE)));
    }
    let body = report.get(UPLOAD_HEADER_SIZE..).unwrap_or(&[]);
    if body.starts_with(&CONTINUE_MARKER) {
        Some(UploadKind::Continue)
    } else {
        Some(UploadKind::Padding)
    }
}

/// Next upload sequence number; wraps from 255 back to 1
pub fn next_sequence(sequence: u8) -> u8 {
    if sequence == u8::MAX {
        1
    } else {
        sequence + 1
    }
}
