//! Input report parsing and button/sensor diffing

use super::protocol::{ReportTag, INPUT_REPORT_SIZE};
use crate::core::events::{KeyId, PanelEvent};

/// A raw fixed-size input report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputReport {
    data: [u8; INPUT_REPORT_SIZE],
}

impl Default for InputReport {
    fn default() -> Self {
        Self {
            data: [0u8; INPUT_REPORT_SIZE],
        }
    }
}

impl InputReport {
    /// Copy bytes into a report, zero-filling or truncating to size
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut report = Self::default();
        let len = bytes.len().min(INPUT_REPORT_SIZE);
        report.data[..len].copy_from_slice(&bytes[..len]);
        report
    }

    /// Raw report bytes
    pub fn as_bytes(&self) -> &[u8; INPUT_REPORT_SIZE] {
        &self.data
    }

    /// Leading report byte
    pub fn tag(&self) -> u8 {
        self.data[0]
    }

    /// Test a single bit; out-of-range offsets read as clear
    pub fn bit(&self, offset: usize, mask: u8) -> bool {
        self.data.get(offset).map(|b| b & mask != 0).unwrap_or(false)
    }

    /// Set or clear the bits of `mask` at `offset`; out-of-range offsets are ignored
    pub fn set_bit(&mut self, offset: usize, mask: u8, on: bool) {
        if let Some(byte) = self.data.get_mut(offset) {
            if on {
                *byte |= mask;
            } else {
                *byte &= !mask;
            }
        }
    }

    /// Little-endian word at `offset`, zero past the end
    pub fn u16_le(&self, offset: usize) -> u16 {
        let lo = self.data.get(offset).copied().unwrap_or(0);
        let hi = self.data.get(offset + 1).copied().unwrap_or(0);
        u16::from_le_bytes([lo, hi])
    }

    /// Store a little-endian word at `offset`
    pub fn set_u16_le(&mut self, offset: usize, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        if offset + 1 < INPUT_REPORT_SIZE {
            self.data[offset] = lo;
            self.data[offset + 1] = hi;
        }
    }

    /// Three 64-bit words over bytes 1..=24, for cheap equality checks
    pub fn digest(&self) -> [u64; 3] {
        let mut words = [0u64; 3];
        for (i, word) in words.iter_mut().enumerate() {
            let start = 1 + i * 8;
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&self.data[start..start + 8]);
            *word = u64::from_le_bytes(bytes);
        }
        words
    }
}

/// Location of one button bit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBit {
    pub key: KeyId,
    pub offset: usize,
    pub mask: u8,
}

/// Ambient light sensor fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmbientSensor {
    pub left_offset: usize,
    pub right_offset: usize,
    pub max_raw: u16,
}

impl AmbientSensor {
    /// Average of both readings as a 0-100 percentage of the sensor maximum
    pub fn percent(&self, left: u16, right: u16) -> u8 {
        if self.max_raw == 0 {
            return 0;
        }
        let average = (left as u32 + right as u32) as f64 / 2.0;
        let percent = (average * 100.0 / self.max_raw as f64).round();
        percent.clamp(0.0, 100.0) as u8
    }
}

/// Per-family description of the input report
#[derive(Debug, Clone)]
pub struct InputLayout {
    pub report_len: usize,
    pub tag: u8,
    pub keys: Vec<KeyBit>,
    pub ambient: Option<AmbientSensor>,
}

impl InputLayout {
    /// Layout with keys numbered sequentially from byte 1, bit 0
    pub fn sequential(keys: impl IntoIterator<Item = KeyId>, ambient: Option<AmbientSensor>) -> Self {
        let keys = keys
            .into_iter()
            .enumerate()
            .map(|(i, key)| KeyBit {
                key,
                offset: 1 + i / 8,
                mask: 1 << (i % 8),
            })
            .collect();
        Self {
            report_len: INPUT_REPORT_SIZE,
            tag: ReportTag::Input.as_byte(),
            keys,
            ambient,
        }
    }

    /// Where `key` sits in the report, if the layout has it
    pub fn key_bit(&self, key: KeyId) -> Option<KeyBit> {
        self.keys.iter().copied().find(|k| k.key == key)
    }
}

/// Diffs consecutive input reports into discrete events
pub struct InputDecoder {
    layout: InputLayout,
    previous: InputReport,
    previous_digest: [u64; 3],
}

impl InputDecoder {
    /// Decoder whose first report is compared against an all-zero one
    pub fn new(layout: InputLayout) -> Self {
        let previous = InputReport::default();
        let previous_digest = previous.digest();
        Self {
            layout,
            previous,
            previous_digest,
        }
    }

    pub fn layout(&self) -> &InputLayout {
        &self.layout
    }

    /// Process one raw report; reports of the wrong size or tag are ignored
    pub fn process(&mut self, raw: &[u8]) -> Vec<PanelEvent> {
        if raw.len() != self.layout.report_len || raw.first() != Some(&self.layout.tag) {
            return Vec::new();
        }
        let current = InputReport::from_bytes(raw);
        let digest = current.digest();
        if digest == self.previous_digest {
            return Vec::new();
        }

        let mut events = Vec::new();
        for bit in &self.layout.keys {
            let now = current.bit(bit.offset, bit.mask);
            if now != self.previous.bit(bit.offset, bit.mask) {
                events.push(if now {
                    PanelEvent::KeyActivated(bit.key)
                } else {
                    PanelEvent::KeyDeactivated(bit.key)
                });
            }
        }

        if let Some(sensor) = self.layout.ambient {
            let left = current.u16_le(sensor.left_offset);
            let right = current.u16_le(sensor.right_offset);
            if left != self.previous.u16_le(sensor.left_offset)
                || right != self.previous.u16_le(sensor.right_offset)
            {
                events.push(PanelEvent::AmbientLightChanged {
                    left,
                    right,
                    percent: sensor.percent(left, right),
                });
            }
        }

        self.previous = current;
        self.previous_digest = digest;
        events
    }

    /// Forget the previous report so the next one is diffed against zeroes
    pub fn reset(&mut self) {
        self.previous = InputReport::default();
        self.previous_digest = self.previous.digest();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcdu::keys::{mcdu_input_layout, McduKey};

    fn report_with(keys: &[McduKey], layout: &InputLayout) -> [u8; INPUT_REPORT_SIZE] {
        let mut report = InputReport::default();
        report.data[0] = 0x01;
        for key in keys {
            let bit = layout.key_bit(KeyId::Mcdu(*key)).unwrap();
            report.set_bit(bit.offset, bit.mask, true);
        }
        *report.as_bytes()
    }

    #[test]
    fn test_accessors() {
        let mut report = InputReport::default();
        report.set_u16_le(17, 0x0ABC);
        report.set_bit(3, 0x10, true);
        assert_eq!(report.u16_le(17), 0x0ABC);
        assert_eq!(report.as_bytes()[17], 0xBC);
        assert!(report.bit(3, 0x10));
        assert!(!report.bit(3, 0x08));
        assert!(!report.bit(99, 0x01));
    }

    #[test]
    fn test_digest_tracks_button_bytes() {
        let mut a = InputReport::default();
        let b = InputReport::default();
        assert_eq!(a.digest(), b.digest());
        a.set_bit(24, 0x80, true);
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn test_press_and_release() {
        let layout = mcdu_input_layout();
        let mut decoder = InputDecoder::new(layout.clone());

        let pressed = report_with(&[McduKey::Dir], &layout);
        assert_eq!(
            decoder.process(&pressed),
            vec![PanelEvent::KeyActivated(KeyId::Mcdu(McduKey::Dir))]
        );
        assert!(decoder.process(&pressed).is_empty());

        let released = report_with(&[], &layout);
        assert_eq!(
            decoder.process(&released),
            vec![PanelEvent::KeyDeactivated(KeyId::Mcdu(McduKey::Dir))]
        );
    }

    #[test]
    fn test_wrong_size_or_tag_ignored() {
        let mut decoder = InputDecoder::new(mcdu_input_layout());
        let mut report = [0xFFu8; INPUT_REPORT_SIZE];
        report[0] = 0x02;
        assert!(decoder.process(&report).is_empty());
        assert!(decoder.process(&[0x01, 0xFF]).is_empty());
    }

    #[test]
    fn test_ambient_light_event() {
        let mut decoder = InputDecoder::new(mcdu_input_layout());
        let mut report = InputReport::default();
        report.data[0] = 0x01;
        report.set_u16_le(17, 0x0FFF);
        report.set_u16_le(19, 0x0FFF);
        let events = decoder.process(report.as_bytes());
        assert_eq!(
            events,
            vec![PanelEvent::AmbientLightChanged {
                left: 0x0FFF,
                right: 0x0FFF,
                percent: 100
            }]
        );

        // Same readings plus a key: no sensor event
        let bit = decoder.layout().key_bit(KeyId::Mcdu(McduKey::Clr)).unwrap();
        report.set_bit(bit.offset, bit.mask, true);
        let events = decoder.process(report.as_bytes());
        assert_eq!(events, vec![PanelEvent::KeyActivated(KeyId::Mcdu(McduKey::Clr))]);
    }

    #[test]
    fn test_sensor_percent() {
        let sensor = AmbientSensor {
            left_offset: 17,
            right_offset: 19,
            max_raw: 0x0FFF,
        };
        assert_eq!(sensor.percent(0, 0), 0);
        assert_eq!(sensor.percent(0x0FFF, 0), 50);
        assert_eq!(sensor.percent(0xFFFF, 0xFFFF), 100);
    }
}
