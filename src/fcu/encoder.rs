//! FCU and EFIS report encoding
//!
//! Every window update is a pair of 64-byte reports per unit: a segment
//! report carrying the folded digit data and annunciator bits, then a fixed
//! commit report. Encoding is a pure function of the state, so identical
//! state always yields identical bytes.

use super::segments::{encode_digits, swap_layout};
use super::state::{EfisBaro, EfisLed, EfisLeds, FcuLed, FcuLeds, FcuState};
use crate::hid::protocol::{
    brightness_packet, indicator_packet, BrightnessKind, CommandPrefix, PACKET_SIZE,
};
use crate::mcdu::lights::IndicatorPacket;

pub type SegmentPacket = [u8; PACKET_SIZE];

/// Offset of the first field byte in a segment report
pub const FIELD_DATA_OFFSET: usize = 25;

const SPEED_OFFSET: usize = 25;
const HEADING_OFFSET: usize = 29;
const ALTITUDE_OFFSET: usize = 33;
const VERTICAL_SPEED_OFFSET: usize = 39;
const BARO_OFFSET: usize = 25;

const SEGMENT_HEADER: [u8; 18] = [
    0xF0, 0x00, 0x01, 0x31, 0x00, 0x00, 0x00, 0x00, 0x02, 0x01, 0x00, 0x00, 0xFF, 0xFF, 0x02, 0x00,
    0x00, 0x20,
];
const COMMIT_HEADER: [u8; 16] = [
    0xF0, 0x00, 0x01, 0x11, 0x00, 0x00, 0x00, 0x00, 0x03, 0x01, 0x00, 0x00, 0xFF, 0xFF, 0x02, 0x00,
];

/// One physical unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FcuPanel {
    Centre,
    LeftEfis,
    RightEfis,
}

impl FcuPanel {
    /// Command prefix the unit answers to
    pub fn prefix(self) -> CommandPrefix {
        match self {
            FcuPanel::Centre => CommandPrefix::FCU,
            FcuPanel::LeftEfis => CommandPrefix::EFIS_LEFT,
            FcuPanel::RightEfis => CommandPrefix::EFIS_RIGHT,
        }
    }
}

/// Which EFIS panels are attached alongside the centre unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FcuPanels {
    pub left_efis: bool,
    pub right_efis: bool,
}

impl FcuPanels {
    pub const ALL: FcuPanels = FcuPanels {
        left_efis: true,
        right_efis: true,
    };
    pub const CENTRE_ONLY: FcuPanels = FcuPanels {
        left_efis: false,
        right_efis: false,
    };

    /// Centre first, then each present EFIS
    pub fn present(self) -> impl Iterator<Item = FcuPanel> {
        [
            Some(FcuPanel::Centre),
            self.left_efis.then_some(FcuPanel::LeftEfis),
            self.right_efis.then_some(FcuPanel::RightEfis),
        ]
        .into_iter()
        .flatten()
    }
}

impl Default for FcuPanels {
    fn default() -> Self {
        Self::ALL
    }
}

/// Annunciators and decimal points, each a single bit in a segment report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FcuFlag {
    SpdLabel,
    MachLabel,
    SpeedManaged,
    MachDot,
    HdgLabel,
    TrkLabel,
    LatLabel,
    HeadingManaged,
    HdgVsLabel,
    TrkFpaLabel,
    AltLabel,
    LvlCh,
    AltitudeManaged,
    VsLabel,
    FpaLabel,
    VsMinus,
    VsPlus,
    FpaDot,
    VsHorizontalLine,
    Qnh,
    Qfe,
    InHgDot,
    Std,
    Hpa,
    InHg,
}

/// (byte, mask) for each [`FcuFlag`], in declaration order.
///
/// Flags sit in the slots the digit fold leaves free: the high nibble of a
/// field's first byte, the low nibble of its last, and each digit's bit 0.
pub const FLAG_BITS: [(usize, u8); 25] = [
    (25, 0x80), // SpdLabel
    (25, 0x40), // MachLabel
    (26, 0x10), // SpeedManaged
    (28, 0x10), // MachDot
    (29, 0x80), // HdgLabel
    (29, 0x40), // TrkLabel
    (29, 0x20), // LatLabel
    (30, 0x10), // HeadingManaged
    (32, 0x08), // HdgVsLabel
    (32, 0x04), // TrkFpaLabel
    (33, 0x80), // AltLabel
    (33, 0x40), // LvlCh
    (34, 0x10), // AltitudeManaged
    (39, 0x80), // VsLabel
    (39, 0x40), // FpaLabel
    (39, 0x20), // VsMinus
    (39, 0x10), // VsPlus
    (43, 0x10), // FpaDot
    (43, 0x08), // VsHorizontalLine
    (25, 0x80), // Qnh
    (25, 0x40), // Qfe
    (28, 0x10), // InHgDot
    (29, 0x08), // Std
    (29, 0x04), // Hpa
    (29, 0x02), // InHg
];

impl FcuFlag {
    /// (byte offset, mask) of the flag in its segment report
    pub fn bit(self) -> (usize, u8) {
        FLAG_BITS[self as usize]
    }
}

/// Indicator code of a centre-unit lamp
pub fn led_code(led: FcuLed) -> u8 {
    match led {
        FcuLed::Loc => 0x03,
        FcuLed::Ap1 => 0x05,
        FcuLed::Ap2 => 0x07,
        FcuLed::Athr => 0x09,
        FcuLed::Exped => 0x0B,
        FcuLed::Appr => 0x0D,
    }
}

/// Indicator code of an EFIS lamp, on either side's prefix
pub fn efis_led_code(led: EfisLed) -> u8 {
    match led {
        EfisLed::Fd => 0x03,
        EfisLed::Ls => 0x04,
        EfisLed::Cstr => 0x05,
        EfisLed::Wpt => 0x06,
        EfisLed::Vord => 0x07,
        EfisLed::Ndb => 0x08,
        EfisLed::Arpt => 0x09,
    }
}

fn clamp_digits(value: f64, max: u32) -> u32 {
    value.round().clamp(0.0, max as f64) as u32
}

fn speed_text(state: &FcuState) -> String {
    match state.speed {
        None => "---".to_string(),
        Some(mach) if state.speed_is_mach => format!("{:03}", clamp_digits(mach as f64 * 100.0, 999)),
        Some(knots) => format!("{:03}", clamp_digits(knots as f64, 999)),
    }
}

fn heading_text(state: &FcuState) -> String {
    match state.heading {
        None => "---".to_string(),
        Some(heading) => format!("{:03}", heading.min(999)),
    }
}

fn altitude_text(state: &FcuState) -> String {
    match state.altitude {
        None => "-----".to_string(),
        Some(altitude) => format!("{:05}", altitude.min(99_999)),
    }
}

fn vertical_speed_text(state: &FcuState) -> String {
    match state.vertical_speed {
        None => "----".to_string(),
        Some(fpa) if state.vs_is_fpa => format!("{:02}  ", fpa.unsigned_abs().min(99)),
        Some(vs) => format!("{:04}", vs.unsigned_abs().min(9_999)),
    }
}

fn baro_text(baro: &EfisBaro) -> String {
    match baro.pressure {
        _ if baro.is_std => "Std ".to_string(),
        None => "----".to_string(),
        Some(inhg) if baro.is_hg => format!("{:04}", clamp_digits(inhg as f64 * 100.0, 9_999)),
        Some(hpa) => format!("{:04}", clamp_digits(hpa as f64, 9_999)),
    }
}

fn set_flag(packet: &mut SegmentPacket, flag: FcuFlag, on: bool) {
    if on {
        let (offset, mask) = flag.bit();
        packet[offset] |= mask;
    }
}

fn put_field(packet: &mut SegmentPacket, offset: usize, text: &str) {
    let folded = swap_layout(&encode_digits(text));
    for (slot, byte) in packet[offset..].iter_mut().zip(folded) {
        *slot |= byte;
    }
}

fn segment_packet(prefix: CommandPrefix) -> SegmentPacket {
    let mut packet = [0u8; PACKET_SIZE];
    packet[..SEGMENT_HEADER.len()].copy_from_slice(&SEGMENT_HEADER);
    packet[4..6].copy_from_slice(&prefix.bytes());
    packet
}

fn commit_packet(prefix: CommandPrefix) -> SegmentPacket {
    let mut packet = [0u8; PACKET_SIZE];
    packet[..COMMIT_HEADER.len()].copy_from_slice(&COMMIT_HEADER);
    packet[4..6].copy_from_slice(&prefix.bytes());
    packet
}

fn centre_packet(state: &FcuState) -> SegmentPacket {
    let mut packet = segment_packet(CommandPrefix::FCU);
    put_field(&mut packet, SPEED_OFFSET, &speed_text(state));
    put_field(&mut packet, HEADING_OFFSET, &heading_text(state));
    put_field(&mut packet, ALTITUDE_OFFSET, &altitude_text(state));
    put_field(&mut packet, VERTICAL_SPEED_OFFSET, &vertical_speed_text(state));

    let mach = state.speed_is_mach;
    let track = state.heading_is_track;
    set_flag(&mut packet, FcuFlag::SpdLabel, !mach);
    set_flag(&mut packet, FcuFlag::MachLabel, mach);
    set_flag(&mut packet, FcuFlag::MachDot, mach && state.speed.is_some());
    set_flag(&mut packet, FcuFlag::SpeedManaged, state.speed_managed);
    set_flag(&mut packet, FcuFlag::HdgLabel, !track);
    set_flag(&mut packet, FcuFlag::TrkLabel, track);
    set_flag(&mut packet, FcuFlag::LatLabel, state.lat_mode);
    set_flag(&mut packet, FcuFlag::HeadingManaged, state.heading_managed);
    set_flag(&mut packet, FcuFlag::HdgVsLabel, !track);
    set_flag(&mut packet, FcuFlag::TrkFpaLabel, track);
    set_flag(&mut packet, FcuFlag::AltLabel, true);
    set_flag(&mut packet, FcuFlag::LvlCh, state.alt_mode_managed);
    set_flag(&mut packet, FcuFlag::AltitudeManaged, state.altitude_managed);
    set_flag(&mut packet, FcuFlag::VsLabel, !state.vs_is_fpa);
    set_flag(&mut packet, FcuFlag::FpaLabel, state.vs_is_fpa);
    set_flag(&mut packet, FcuFlag::VsHorizontalLine, state.vs_horizontal_line);
    if let Some(vs) = state.vertical_speed {
        set_flag(&mut packet, FcuFlag::VsMinus, vs < 0);
        set_flag(&mut packet, FcuFlag::VsPlus, vs >= 0);
        set_flag(&mut packet, FcuFlag::FpaDot, state.vs_is_fpa);
    }
    packet
}

fn efis_packet(prefix: CommandPrefix, baro: &EfisBaro) -> SegmentPacket {
    let mut packet = segment_packet(prefix);
    put_field(&mut packet, BARO_OFFSET, &baro_text(baro));

    let std = baro.is_std;
    set_flag(&mut packet, FcuFlag::Std, std);
    set_flag(&mut packet, FcuFlag::Qnh, !std && !baro.is_qfe);
    set_flag(&mut packet, FcuFlag::Qfe, !std && baro.is_qfe);
    set_flag(&mut packet, FcuFlag::Hpa, !std && !baro.is_hg);
    set_flag(&mut packet, FcuFlag::InHg, !std && baro.is_hg);
    set_flag(
        &mut packet,
        FcuFlag::InHgDot,
        !std && baro.is_hg && baro.pressure.is_some(),
    );
    packet
}

/// Encodes windows, lamps and brightness for the centre unit and EFIS panels
#[derive(Debug, Default)]
pub struct FcuEncoder {
    applied: Option<FcuLeds>,
}

impl FcuEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Segment and commit reports for every present unit
    pub fn encode_display(&self, state: &FcuState, panels: FcuPanels) -> Vec<SegmentPacket> {
        panels
            .present()
            .flat_map(|panel| {
                let segments = match panel {
                    FcuPanel::Centre => centre_packet(state),
                    FcuPanel::LeftEfis => efis_packet(panel.prefix(), &state.left),
                    FcuPanel::RightEfis => efis_packet(panel.prefix(), &state.right),
                };
                [segments, commit_packet(panel.prefix())]
            })
            .collect()
    }

    /// Brightness report for one channel of one unit
    pub fn brightness(&self, panel: FcuPanel, kind: BrightnessKind, percent: i32) -> IndicatorPacket {
        brightness_packet(panel.prefix(), kind, percent)
    }

    /// Indicator reports for lamps that differ from the last committed set
    pub fn leds(&self, leds: &FcuLeds, panels: FcuPanels, skip_duplicate_check: bool) -> Vec<IndicatorPacket> {
        let baseline = self.applied.unwrap_or_default();
        let changed = |now: bool, before: bool| skip_duplicate_check || now != before;
        let mut packets = Vec::new();

        for led in FcuLed::ALL {
            let on = leds.get(led);
            if changed(on, baseline.get(led)) {
                packets.push(indicator_packet(CommandPrefix::FCU, led_code(led), on as u8));
            }
        }

        let sides: [(bool, FcuPanel, &EfisLeds, &EfisLeds); 2] = [
            (panels.left_efis, FcuPanel::LeftEfis, &leds.left, &baseline.left),
            (panels.right_efis, FcuPanel::RightEfis, &leds.right, &baseline.right),
        ];
        for (present, panel, now, before) in sides {
            if !present {
                continue;
            }
            for led in EfisLed::ALL {
                let on = now.get(led);
                if changed(on, before.get(led)) {
                    packets.push(indicator_packet(panel.prefix(), efis_led_code(led), on as u8));
                }
            }
        }
        packets
    }

    /// Record lamps as sent
    pub fn commit_leds(&mut self, leds: &FcuLeds) {
        self.applied = Some(*leds);
    }

    /// Forget committed lamps, as after a power cycle
    pub fn forget(&mut self) {
        self.applied = None;
    }
}
