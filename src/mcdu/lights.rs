//! LED and brightness encoder

use crate::hid::protocol::{
    brightness_packet, indicator_packet, BrightnessKind, CommandPrefix, INDICATOR_PACKET_SIZE,
};
use crate::model::{McduLed, McduLeds};

pub type IndicatorPacket = [u8; INDICATOR_PACKET_SIZE];

/// Indicator code addressing a named MCDU lamp
pub fn led_code(led: McduLed) -> u8 {
    match led {
        McduLed::Fail => 0x08,
        McduLed::Fm => 0x09,
        McduLed::Mcdu => 0x0A,
        McduLed::Menu => 0x0B,
        McduLed::Fm1 => 0x0C,
        McduLed::Ind => 0x0D,
        McduLed::Rdy => 0x0E,
        McduLed::Status => 0x0F,
        McduLed::Fm2 => 0x10,
    }
}

/// Builds indicator reports, sending only lamps that changed
#[derive(Debug)]
pub struct LightEncoder {
    prefix: CommandPrefix,
    applied: Option<McduLeds>,
}

impl Default for LightEncoder {
    fn default() -> Self {
        Self::new(CommandPrefix::MCDU)
    }
}

impl LightEncoder {
    /// Encoder addressing the panel at `prefix`, with nothing committed yet
    pub fn new(prefix: CommandPrefix) -> Self {
        Self {
            prefix,
            applied: None,
        }
    }

    /// Key backlight brightness report; `percent` is clamped to 0-100
    pub fn backlight(&self, percent: i32) -> IndicatorPacket {
        brightness_packet(self.prefix, BrightnessKind::Backlight, percent)
    }

    /// LCD brightness report
    pub fn display_brightness(&self, percent: i32) -> IndicatorPacket {
        brightness_packet(self.prefix, BrightnessKind::Display, percent)
    }

    /// Indicator lamp brightness report
    pub fn led_brightness(&self, percent: i32) -> IndicatorPacket {
        brightness_packet(self.prefix, BrightnessKind::Leds, percent)
    }

    /// One report per lamp that differs from the last committed state.
    ///
    /// Before anything is committed every lamp is assumed off.
    pub fn apply(&self, leds: &McduLeds, skip_duplicate_check: bool) -> Vec<IndicatorPacket> {
        let dark = McduLeds::dark();
        let baseline = self.applied.as_ref().unwrap_or(&dark);
        McduLed::ALL
            .into_iter()
            .filter(|led| skip_duplicate_check || leds.get(*led) != baseline.get(*led))
            .map(|led| indicator_packet(self.prefix, led_code(led), leds.get(led) as u8))
            .collect()
    }

    /// Record `leds` as the state now on the device
    pub fn commit(&mut self, leds: &McduLeds) {
        self.applied = Some(leds.clone());
    }

    /// Drop the committed state so the next `apply` compares against all-off
    pub fn forget(&mut self) {
        self.applied = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_led_toggle_once() {
        let mut encoder = LightEncoder::default();
        let mut leds = McduLeds::default();
        leds.set(McduLed::Rdy, true);

        let packets = encoder.apply(&leds, false);
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0][7], 0x0E);
        assert_eq!(packets[0][8], 0x01);
        encoder.commit(&leds);

        assert!(encoder.apply(&leds, false).is_empty());
    }

    #[test]
    fn test_skip_sends_everything() {
        let encoder = LightEncoder::default();
        let packets = encoder.apply(&McduLeds::default(), true);
        assert_eq!(packets.len(), McduLed::ALL.len());
        assert!(packets.iter().all(|p| p[8] == 0x00));
    }

    #[test]
    fn test_turning_off_after_commit() {
        let mut encoder = LightEncoder::default();
        let mut leds = McduLeds::default();
        leds.fail = true;
        leds.menu = true;
        encoder.commit(&leds);

        leds.fail = false;
        let packets = encoder.apply(&leds, false);
        assert_eq!(packets, vec![indicator_packet(CommandPrefix::MCDU, 0x08, 0x00)]);

        encoder.forget();
        assert_eq!(encoder.apply(&leds, false).len(), 1);
    }

    #[test]
    fn test_brightness_reports() {
        let encoder = LightEncoder::default();
        assert_eq!(encoder.backlight(150)[7..9], [0x00, 0xFF]);
        assert_eq!(encoder.display_brightness(50)[7..9], [0x01, 0x80]);
        assert_eq!(encoder.led_brightness(0)[7..9], [0x02, 0x00]);
    }
}
