//! Font recovery from captured upload reports
//!
//! [`FontExtractor`] consumes output reports one at a time, pulls the
//! payload bytes out of the 0xF0 upload reports and walks them with a small
//! state machine:
//!
//! ```text
//! LookingForOpeningReport -> LookingForFontStart -> LookingForMarkerHead
//!     -> LookingForMarkerTail -> ReadingCodepoint <-> ReadingBitmap
//!                                       |
//!                         (zero codepoint, large set) -> LookingForMarkerHead
//!                         (zero codepoint, small set) -> Finished
//! ```
//!
//! Padding and continue reports carry no payload and are skipped wherever
//! they appear. Running out of input is never an error; whatever glyphs were
//! read are returned.

use super::lines::parse_capture_lines;
use crate::core::error::ExtractError;
use crate::hid::protocol::{classify_upload, UploadKind, UPLOAD_HEADER_SIZE};
use crate::hid::template::{Hole, HoleTarget, PacketTemplate, Span};
use crate::mcdu::upload::{FONT_OPENING, GLYPH_DATA_MARKER, LARGE_FONT_MARKER, SMALL_FONT_MARKER};
use crate::model::{FontFile, FontSize, Glyph, MAX_GLYPH_WIDTH};
use std::ops::Range;
use tracing::{debug, warn};

/// Width, height, x offset, y offset, brightness
const FONT_HEADER_LEN: usize = 7;

/// Name given to recovered fonts
pub const EXTRACTED_FONT_NAME: &str = "extracted";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractState {
    LookingForOpeningReport,
    LookingForFontStart,
    LookingForMarkerHead,
    LookingForMarkerTail,
    ReadingCodepoint,
    ReadingBitmap,
    Finished,
}

/// What a capture yielded
#[derive(Debug, Clone)]
pub struct Extraction {
    pub font: FontFile,
    /// Inferred packet template, when one was requested and the upload opened
    pub template: Option<PacketTemplate>,
    pub offsets: Option<(u16, u16)>,
    pub brightness: Option<u8>,
}

/// Streaming font extractor; see the module docs
pub struct FontExtractor {
    state: ExtractState,
    want_template: bool,
    reports_seen: usize,
    font: FontFile,
    size: FontSize,
    codepoint: Option<char>,
    pending: Vec<u8>,
    /// (template packet, byte offset) of each pending byte
    positions: Vec<(usize, usize)>,
    recording: bool,
    packets: Vec<Vec<u8>>,
    holes: Vec<Hole>,
    offsets: Option<(u16, u16)>,
    brightness: Option<u8>,
}

impl FontExtractor {
    /// Extractor waiting for the opening report. With `want_template` it also records the upload.
    pub fn new(want_template: bool) -> Self {
        Self {
            state: ExtractState::LookingForOpeningReport,
            want_template,
            reports_seen: 0,
            font: FontFile::new(EXTRACTED_FONT_NAME, 0, 0),
            size: FontSize::Large,
            codepoint: None,
            pending: Vec::new(),
            positions: Vec::new(),
            recording: false,
            packets: Vec::new(),
            holes: Vec::new(),
            offsets: None,
            brightness: None,
        }
    }

    pub fn state(&self) -> ExtractState {
        self.state
    }

    /// Consume one captured report
    pub fn feed(&mut self, report: &[u8]) -> Result<(), ExtractError> {
        let index = self.reports_seen;
        self.reports_seen += 1;

        match self.state {
            ExtractState::LookingForOpeningReport => return self.open(index, report),
            ExtractState::Finished => {
                // Stream padding after the last record belongs to the upload
                let trailer = matches!(
                    classify_upload(report),
                    Some(UploadKind::Padding) | Some(UploadKind::Continue)
                );
                if self.recording && trailer {
                    self.packets.push(report.to_vec());
                } else {
                    self.recording = false;
                }
                return Ok(());
            }
            _ => {}
        }

        let Some(&tag) = report.first() else {
            return Ok(());
        };
        match classify_upload(report) {
            None if self.mid_value() => Err(ExtractError::InvalidCapture { report: index, tag }),
            None => {
                debug!("Skipping report {} with tag 0x{:02X}", index, tag);
                Ok(())
            }
            Some(UploadKind::Padding) | Some(UploadKind::Continue) => {
                self.record(report);
                Ok(())
            }
            Some(UploadKind::Data(len)) => {
                let packet = self.record(report);
                let end = (UPLOAD_HEADER_SIZE + len).min(report.len());
                self.consume(index, report, UPLOAD_HEADER_SIZE.min(end)..end, packet)
            }
        }
    }

    /// Stop and return what was recovered
    pub fn finish(self) -> Extraction {
        if self.state != ExtractState::Finished {
            debug!("Capture ended in state {:?} with {} glyphs", self.state, self.font.glyph_count());
        }
        let opened = self.state != ExtractState::LookingForOpeningReport;
        let template = (self.want_template && opened).then(|| PacketTemplate {
            name: format!("captured-{}x{}", self.font.glyph_width, self.font.glyph_height),
            glyph_width: self.font.glyph_width,
            glyph_height: self.font.glyph_height,
            packets: self.packets,
            holes: self.holes,
        });
        Extraction {
            font: self.font,
            template,
            offsets: self.offsets,
            brightness: self.brightness,
        }
    }

    fn open(&mut self, index: usize, report: &[u8]) -> Result<(), ExtractError> {
        let Some(UploadKind::Data(len)) = classify_upload(report) else {
            return Ok(());
        };
        let end = (UPLOAD_HEADER_SIZE + len).min(report.len());
        let Some(payload) = report.get(UPLOAD_HEADER_SIZE..end) else {
            return Ok(());
        };
        let Some(start) = payload
            .windows(FONT_OPENING.len())
            .position(|w| w == FONT_OPENING)
        else {
            return Ok(());
        };

        debug!("Font upload opens in report {}", index);
        self.state = ExtractState::LookingForFontStart;
        self.recording = self.want_template;
        let packet = self.record(report);
        let from = UPLOAD_HEADER_SIZE + start + FONT_OPENING.len();
        self.consume(index, report, from..end, packet)
    }

    fn record(&mut self, report: &[u8]) -> usize {
        let index = self.packets.len();
        if self.recording {
            self.packets.push(report.to_vec());
        }
        index
    }

    /// A bitmap always follows its codepoint, so `ReadingBitmap` counts even with nothing pending
    fn mid_value(&self) -> bool {
        match self.state {
            ExtractState::ReadingBitmap => true,
            ExtractState::LookingForFontStart | ExtractState::ReadingCodepoint => !self.pending.is_empty(),
            _ => false,
        }
    }

    fn glyph_len(&self) -> usize {
        Glyph::row_bytes(self.font.glyph_width) * self.font.glyph_height as usize
    }

    fn needed(&self) -> usize {
        match self.state {
            ExtractState::LookingForFontStart => FONT_HEADER_LEN,
            ExtractState::LookingForMarkerHead | ExtractState::LookingForMarkerTail => 6,
            ExtractState::ReadingCodepoint => 4,
            ExtractState::ReadingBitmap => self.glyph_len(),
            ExtractState::LookingForOpeningReport | ExtractState::Finished => 0,
        }
    }

    fn consume(&mut self, index: usize, report: &[u8], range: Range<usize>, packet: usize) -> Result<(), ExtractError> {
        for offset in range {
            if self.state == ExtractState::Finished {
                break;
            }
            self.pending.push(report[offset]);
            self.positions.push((packet, offset));
            if self.pending.len() >= self.needed() {
                self.complete_value(index)?;
            }
        }
        Ok(())
    }

    fn clear(&mut self) {
        self.pending.clear();
        self.positions.clear();
    }

    fn complete_value(&mut self, index: usize) -> Result<(), ExtractError> {
        match self.state {
            ExtractState::LookingForFontStart => {
                let width = self.pending[0] as u16;
                let height = self.pending[1] as u16;
                if width > MAX_GLYPH_WIDTH {
                    return Err(ExtractError::GlyphTooWide {
                        report: index,
                        width,
                        max: MAX_GLYPH_WIDTH,
                    });
                }
                self.font = FontFile::new(EXTRACTED_FONT_NAME, width, height);
                let x = u16::from_le_bytes([self.pending[2], self.pending[3]]);
                let y = u16::from_le_bytes([self.pending[4], self.pending[5]]);
                self.offsets = Some((x, y));
                self.brightness = Some(self.pending[6]);
                self.add_hole(HoleTarget::XOffset, 2..4);
                self.add_hole(HoleTarget::YOffset, 4..6);
                self.add_hole(HoleTarget::Brightness, 6..7);
                debug!("Font is {}x{} at ({}, {})", width, height, x, y);
                self.clear();
                self.state = ExtractState::LookingForMarkerHead;
            }
            ExtractState::LookingForMarkerHead => {
                let size = if self.pending == LARGE_FONT_MARKER {
                    Some(FontSize::Large)
                } else if self.pending == SMALL_FONT_MARKER {
                    Some(FontSize::Small)
                } else {
                    None
                };
                match size {
                    Some(size) => {
                        self.size = size;
                        self.clear();
                        self.state = ExtractState::LookingForMarkerTail;
                    }
                    None => {
                        self.pending.remove(0);
                        self.positions.remove(0);
                    }
                }
            }
            ExtractState::LookingForMarkerTail => {
                if self.pending == GLYPH_DATA_MARKER {
                    self.clear();
                    self.state = ExtractState::ReadingCodepoint;
                } else {
                    // Not the glyph marker after all; rescan these bytes for a head
                    self.state = ExtractState::LookingForMarkerHead;
                    return self.complete_value(index);
                }
            }
            ExtractState::ReadingCodepoint => {
                let raw = u32::from_le_bytes([
                    self.pending[0],
                    self.pending[1],
                    self.pending[2],
                    self.pending[3],
                ]);
                self.clear();
                if raw == 0 {
                    self.state = match self.size {
                        FontSize::Large => ExtractState::LookingForMarkerHead,
                        FontSize::Small => ExtractState::Finished,
                    };
                    return Ok(());
                }
                match char::from_u32(raw) {
                    Some(ch) if self.glyph_len() == 0 => {
                        self.font.insert(self.size, ch, Glyph::blank(self.font.glyph_height));
                    }
                    Some(ch) => {
                        self.codepoint = Some(ch);
                        self.state = ExtractState::ReadingBitmap;
                    }
                    None => {
                        warn!("Invalid codepoint 0x{:08X}, stopping extraction", raw);
                        self.state = ExtractState::Finished;
                    }
                }
            }
            ExtractState::ReadingBitmap => {
                if let Some(ch) = self.codepoint.take() {
                    let glyph = Glyph::from_wire(&self.pending, self.font.glyph_width, self.font.glyph_height);
                    self.font.insert(self.size, ch, glyph);
                    let target = match self.size {
                        FontSize::Large => HoleTarget::LargeGlyph(ch),
                        FontSize::Small => HoleTarget::SmallGlyph(ch),
                    };
                    let len = self.pending.len();
                    self.add_hole(target, 0..len);
                }
                self.clear();
                self.state = ExtractState::ReadingCodepoint;
            }
            ExtractState::LookingForOpeningReport | ExtractState::Finished => {}
        }
        Ok(())
    }

    fn add_hole(&mut self, target: HoleTarget, range: Range<usize>) {
        if !self.recording {
            return;
        }
        let mut spans: Vec<Span> = Vec::new();
        for (value_offset, &(packet, offset)) in self.positions[range].iter().enumerate() {
            match spans.last_mut() {
                Some(span) if span.packet == packet && span.offset + span.len == offset => span.len += 1,
                _ => spans.push(Span {
                    packet,
                    offset,
                    len: 1,
                    value_offset,
                }),
            }
        }
        self.holes.push(Hole { target, spans });
    }
}

/// Parse hex capture lines and run them through a [`FontExtractor`]
pub fn extract_font_from_capture_lines<'a, I>(lines: I, want_template: bool) -> Result<Extraction, ExtractError>
where
    I: IntoIterator<Item = &'a str>,
{
    let reports = parse_capture_lines(lines)?;
    let mut extractor = FontExtractor::new(want_template);
    for report in &reports {
        extractor.feed(report)?;
    }
    Ok(extractor.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hid::protocol::{continue_report, padding_report, upload_report};

    fn stream(payload: &[u8]) -> Vec<Vec<u8>> {
        payload
            .chunks(60)
            .enumerate()
            .map(|(i, chunk)| upload_report(i as u8 + 1, chunk).to_vec())
            .collect()
    }

    fn tiny_font_payload() -> Vec<u8> {
        // 4x2 glyphs: one byte per row
        let mut payload = FONT_OPENING.to_vec();
        payload.extend_from_slice(&[4, 2, 0x10, 0x00, 0x20, 0x00, 0xFF]);
        payload.extend_from_slice(&LARGE_FONT_MARKER);
        payload.extend_from_slice(&GLYPH_DATA_MARKER);
        payload.extend_from_slice(&('A' as u32).to_le_bytes());
        payload.extend_from_slice(&[0xF0, 0x90]);
        payload.extend_from_slice(&0u32.to_le_bytes());
        payload.extend_from_slice(&SMALL_FONT_MARKER);
        payload.extend_from_slice(&GLYPH_DATA_MARKER);
        payload.extend_from_slice(&('a' as u32).to_le_bytes());
        payload.extend_from_slice(&[0x60, 0x60]);
        payload.extend_from_slice(&0u32.to_le_bytes());
        payload
    }

    #[test]
    fn test_extracts_both_sets() {
        let mut extractor = FontExtractor::new(true);
        for report in stream(&tiny_font_payload()) {
            extractor.feed(&report).unwrap();
        }
        assert_eq!(extractor.state(), ExtractState::Finished);
        let extraction = extractor.finish();
        assert_eq!((extraction.font.glyph_width, extraction.font.glyph_height), (4, 2));
        assert_eq!(extraction.font.large[&'A'].rows, vec![0b1111, 0b1001]);
        assert_eq!(extraction.font.small[&'a'].rows, vec![0b0110, 0b0110]);
        assert_eq!(extraction.offsets, Some((0x10, 0x20)));
        assert_eq!(extraction.brightness, Some(0xFF));

        let template = extraction.template.unwrap();
        assert_eq!(template.read_hole(&HoleTarget::LargeGlyph('A')), Some(vec![0xF0, 0x90]));
        assert_eq!(template.read_hole(&HoleTarget::XOffset), Some(vec![0x10, 0x00]));
    }

    #[test]
    fn test_interruptions_are_skipped() {
        let payload = tiny_font_payload();
        let (head, tail) = payload.split_at(30);
        let reports = vec![
            vec![0x02, 0x32, 0xBB],
            upload_report(1, head).to_vec(),
            continue_report(2).to_vec(),
            padding_report(3).to_vec(),
            Vec::new(),
            upload_report(4, tail).to_vec(),
        ];
        let mut extractor = FontExtractor::new(false);
        for report in &reports {
            extractor.feed(report).unwrap();
        }
        let extraction = extractor.finish();
        assert_eq!(extraction.font.glyph_count(), 2);
        assert!(extraction.template.is_none());
    }

    #[test]
    fn test_foreign_tag_mid_codepoint_fails() {
        let payload = tiny_font_payload();
        // Split inside the 'A' codepoint
        let split = FONT_OPENING.len() + FONT_HEADER_LEN + 12 + 2;
        let mut extractor = FontExtractor::new(false);
        extractor.feed(&upload_report(1, &payload[..split])).unwrap();
        let err = extractor.feed(&[0xF2, 0x00, 0x00]).unwrap_err();
        assert_eq!(err, ExtractError::InvalidCapture { report: 1, tag: 0xF2 });
    }

    #[test]
    fn test_foreign_tag_before_bitmap_fails() {
        let payload = tiny_font_payload();
        // Split right after the 'A' codepoint, before its bitmap
        let split = FONT_OPENING.len() + FONT_HEADER_LEN + 12 + 4;
        let mut extractor = FontExtractor::new(false);
        extractor.feed(&upload_report(1, &payload[..split])).unwrap();
        assert_eq!(extractor.state(), ExtractState::ReadingBitmap);
        let err = extractor.feed(&[0xF2, 0x00, 0x00]).unwrap_err();
        assert_eq!(err, ExtractError::InvalidCapture { report: 1, tag: 0xF2 });
    }

    #[test]
    fn test_foreign_tag_between_glyphs_is_skipped() {
        let payload = tiny_font_payload();
        // Split after the whole 'A' record
        let split = FONT_OPENING.len() + FONT_HEADER_LEN + 12 + 4 + 2;
        let mut extractor = FontExtractor::new(false);
        extractor.feed(&upload_report(1, &payload[..split])).unwrap();
        assert_eq!(extractor.state(), ExtractState::ReadingCodepoint);
        extractor.feed(&[0xF2, 0x00, 0x00]).unwrap();
        extractor.feed(&upload_report(2, &payload[split..])).unwrap();
        assert_eq!(extractor.finish().font.glyph_count(), 2);
    }

    #[test]
    fn test_wide_glyph_header_fails() {
        let mut payload = FONT_OPENING.to_vec();
        payload.extend_from_slice(&[40, 2, 0x10, 0x00, 0x20, 0x00, 0xFF]);
        payload.extend_from_slice(&LARGE_FONT_MARKER);
        payload.extend_from_slice(&GLYPH_DATA_MARKER);
        payload.extend_from_slice(&('A' as u32).to_le_bytes());
        payload.extend_from_slice(&[0xAA; 10]);
        payload.extend_from_slice(&('B' as u32).to_le_bytes());
        payload.extend_from_slice(&[0x55; 10]);

        let mut extractor = FontExtractor::new(false);
        let err = extractor.feed(&upload_report(1, &payload)).unwrap_err();
        assert_eq!(
            err,
            ExtractError::GlyphTooWide {
                report: 0,
                width: 40,
                max: MAX_GLYPH_WIDTH
            }
        );
    }

    #[test]
    fn test_truncated_capture_keeps_partial_result() {
        let payload = tiny_font_payload();
        let cut = payload.len() - 20;
        let mut extractor = FontExtractor::new(false);
        for report in stream(&payload[..cut]) {
            extractor.feed(&report).unwrap();
        }
        let extraction = extractor.finish();
        assert_eq!(extraction.font.large.len(), 1);
        assert!(extraction.font.small.is_empty());
    }

    #[test]
    fn test_no_opening_gives_empty_font() {
        let extraction = extract_font_from_capture_lines(["f0 00 01 02 aa bb", "02 32 bb"], true).unwrap();
        assert_eq!(extraction.font.glyph_count(), 0);
        assert!(extraction.template.is_none());
    }

    #[test]
    fn test_bad_hex_line() {
        assert!(matches!(
            extract_font_from_capture_lines(["f0 0"], false),
            Err(ExtractError::BadHex { line: 1, .. })
        ));
    }
}
