//! Packet templates: pre-built upload report skeletons with overwrite regions
//!
//! A template is an ordered list of literal reports plus a set of holes. A
//! hole names what belongs in it (a glyph bitmap, an offset, a colour) and
//! the spans of report bytes it occupies. Values may straddle report
//! boundaries, so each span records which slice of the value it holds.

use super::protocol::{
    continue_report, next_sequence, padding_report, upload_report, UPLOAD_HEADER_SIZE,
    UPLOAD_PAYLOAD_SIZE,
};
use serde::{Deserialize, Serialize};

/// What a hole is filled with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HoleTarget {
    /// Horizontal pixel offset, u16 little-endian
    XOffset,
    /// Vertical pixel offset, u16 little-endian
    YOffset,
    /// Brightness byte
    Brightness,
    /// Bitmap of a large-font glyph
    LargeGlyph(char),
    /// Bitmap of a small-font glyph
    SmallGlyph(char),
    /// Foreground RGBA for a palette slot
    Foreground(u8),
    /// Background RGBA for a palette slot
    Background(u8),
}

/// A contiguous run of template bytes belonging to one hole
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub packet: usize,
    pub offset: usize,
    pub len: usize,
    /// Offset of this run within the hole's value
    pub value_offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hole {
    pub target: HoleTarget,
    pub spans: Vec<Span>,
}

impl Hole {
    /// Total value length covered by the spans
    pub fn len(&self) -> usize {
        self.spans.iter().map(|s| s.value_offset + s.len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An immutable report skeleton; see the module docs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketTemplate {
    pub name: String,
    #[serde(default)]
    pub glyph_width: u16,
    #[serde(default)]
    pub glyph_height: u16,
    #[serde(with = "hex_packets")]
    pub packets: Vec<Vec<u8>>,
    pub holes: Vec<Hole>,
}

impl PacketTemplate {
    /// First hole for `target`
    pub fn hole(&self, target: &HoleTarget) -> Option<&Hole> {
        self.holes.iter().find(|h| h.target == *target)
    }

    /// Current bytes of a hole as stored in the template
    pub fn read_hole(&self, target: &HoleTarget) -> Option<Vec<u8>> {
        let hole = self.hole(target)?;
        let mut value = vec![0u8; hole.len()];
        for span in &hole.spans {
            let src = self.packets.get(span.packet)?.get(span.offset..span.offset + span.len)?;
            value[span.value_offset..span.value_offset + span.len].copy_from_slice(src);
        }
        Some(value)
    }

    /// Copy the packets and patch every hole `values` produces bytes for.
    ///
    /// Short values only overwrite their leading bytes; holes without a value
    /// keep the template's bytes.
    pub fn render<F>(&self, values: F) -> Vec<Vec<u8>>
    where
        F: Fn(&HoleTarget) -> Option<Vec<u8>>,
    {
        let mut packets = self.packets.clone();
        for hole in &self.holes {
            let Some(value) = values(&hole.target) else {
                continue;
            };
            for span in &hole.spans {
                if span.value_offset >= value.len() {
                    continue;
                }
                let len = span.len.min(value.len() - span.value_offset);
                if let Some(dst) = packets
                    .get_mut(span.packet)
                    .and_then(|p| p.get_mut(span.offset..span.offset + len))
                {
                    dst.copy_from_slice(&value[span.value_offset..span.value_offset + len]);
                }
            }
        }
        packets
    }

    /// Pretty JSON, packets as hex strings
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Incrementally lays a payload stream out across upload reports
pub struct TemplateBuilder {
    name: String,
    glyph_width: u16,
    glyph_height: u16,
    packets: Vec<Vec<u8>>,
    holes: Vec<Hole>,
    pending: Vec<u8>,
    sequence: u8,
    stream_reports: usize,
    continue_every: usize,
}

impl TemplateBuilder {
    /// Start a template whose stream opens at sequence 1
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            glyph_width: 0,
            glyph_height: 0,
            packets: Vec::new(),
            holes: Vec::new(),
            pending: Vec::with_capacity(UPLOAD_PAYLOAD_SIZE),
            sequence: 1,
            stream_reports: 0,
            continue_every: 0,
        }
    }

    /// Record the glyph cell the template was captured for
    pub fn glyph_size(mut self, width: u16, height: u16) -> Self {
        self.glyph_width = width;
        self.glyph_height = height;
        self
    }

    /// Insert a continue report after every `n` stream reports (0 disables)
    pub fn continue_every(mut self, n: usize) -> Self {
        self.continue_every = n;
        self
    }

    /// Append a report verbatim, closing any partial stream report first
    pub fn literal(&mut self, packet: Vec<u8>) {
        self.flush();
        self.packets.push(packet);
    }

    /// Append literal bytes to the payload stream
    pub fn bytes(&mut self, data: &[u8]) {
        self.write(data, None);
    }

    /// Append a hole to the payload stream, pre-filled with `default`
    pub fn hole(&mut self, target: HoleTarget, default: &[u8]) {
        self.holes.push(Hole {
            target,
            spans: Vec::new(),
        });
        let index = self.holes.len() - 1;
        self.write(default, Some(index));
    }

    /// Close the stream, padding the report count up to a multiple of `pad_to`
    pub fn end_stream(&mut self, pad_to: usize) {
        self.flush();
        if pad_to > 1 {
            while self.stream_reports % pad_to != 0 {
                self.packets.push(padding_report(self.sequence).to_vec());
                self.sequence = next_sequence(self.sequence);
                self.stream_reports += 1;
            }
        }
    }

    /// Flush any partial report and return the template
    pub fn build(mut self) -> PacketTemplate {
        self.flush();
        PacketTemplate {
            name: self.name,
            glyph_width: self.glyph_width,
            glyph_height: self.glyph_height,
            packets: self.packets,
            holes: self.holes,
        }
    }

    fn write(&mut self, mut data: &[u8], hole: Option<usize>) {
        let mut value_offset = 0;
        while !data.is_empty() {
            let room = UPLOAD_PAYLOAD_SIZE - self.pending.len();
            let take = room.min(data.len());
            if let Some(index) = hole {
                let span = Span {
                    packet: self.packets.len(),
                    offset: UPLOAD_HEADER_SIZE + self.pending.len(),
                    len: take,
                    value_offset,
                };
                self.holes[index].spans.push(span);
            }
            self.pending.extend_from_slice(&data[..take]);
            value_offset += take;
            data = &data[take..];
            if self.pending.len() == UPLOAD_PAYLOAD_SIZE {
                self.flush();
            }
        }
    }

    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        self.packets.push(upload_report(self.sequence, &self.pending).to_vec());
        self.pending.clear();
        self.sequence = next_sequence(self.sequence);
        self.stream_reports += 1;
        if self.continue_every > 0 && self.stream_reports % self.continue_every == 0 {
            self.packets.push(continue_report(self.sequence).to_vec());
            self.sequence = next_sequence(self.sequence);
        }
    }
}

/// Serialize packets as hex strings
mod hex_packets {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(packets: &[Vec<u8>], s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(packets.iter().map(hex::encode))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Vec<u8>>, D::Error> {
        let lines: Vec<String> = Vec::deserialize(d)?;
        lines
            .iter()
            .map(|l| hex::decode(l).map_err(serde::de::Error::custom))
            .collect()
    }
}
