//! Indicator LEDs and brightness levels

/// Clamp a percentage into 0..=100
pub fn clamp_percent(percent: i32) -> u8 {
    percent.clamp(0, 100) as u8
}

/// Named indicator lamps on the MCDU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum McduLed {
    Fail,
    Fm,
    Mcdu,
    Menu,
    Fm1,
    Ind,
    Rdy,
    Status,
    Fm2,
}

impl McduLed {
    pub const ALL: [McduLed; 9] = [
        McduLed::Fail,
        McduLed::Fm,
        McduLed::Mcdu,
        McduLed::Menu,
        McduLed::Fm1,
        McduLed::Ind,
        McduLed::Rdy,
        McduLed::Status,
        McduLed::Fm2,
    ];
}

/// LED and brightness state for an MCDU
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McduLeds {
    pub fail: bool,
    pub fm: bool,
    pub mcdu: bool,
    pub menu: bool,
    pub fm1: bool,
    pub ind: bool,
    pub rdy: bool,
    pub status: bool,
    pub fm2: bool,
    display_brightness_percent: u8,
    led_brightness_percent: u8,
    backlight_brightness_percent: u8,
}

impl Default for McduLeds {
    fn default() -> Self {
        Self {
            fail: false,
            fm: false,
            mcdu: false,
            menu: false,
            fm1: false,
            ind: false,
            rdy: false,
            status: false,
            fm2: false,
            display_brightness_percent: 80,
            led_brightness_percent: 80,
            backlight_brightness_percent: 50,
        }
    }
}

impl McduLeds {
    /// All lamps off, all brightness levels zero
    pub fn dark() -> Self {
        Self {
            display_brightness_percent: 0,
            led_brightness_percent: 0,
            backlight_brightness_percent: 0,
            ..Self::default()
        }
    }

    pub fn get(&self, led: McduLed) -> bool {
        match led {
            McduLed::Fail => self.fail,
            McduLed::Fm => self.fm,
            McduLed::Mcdu => self.mcdu,
            McduLed::Menu => self.menu,
            McduLed::Fm1 => self.fm1,
            McduLed::Ind => self.ind,
            McduLed::Rdy => self.rdy,
            McduLed::Status => self.status,
            McduLed::Fm2 => self.fm2,
        }
    }

    pub fn set(&mut self, led: McduLed, on: bool) {
        let slot = match led {
            McduLed::Fail => &mut self.fail,
            McduLed::Fm => &mut self.fm,
            McduLed::Mcdu => &mut self.mcdu,
            McduLed::Menu => &mut self.menu,
            McduLed::Fm1 => &mut self.fm1,
            McduLed::Ind => &mut self.ind,
            McduLed::Rdy => &mut self.rdy,
            McduLed::Status => &mut self.status,
            McduLed::Fm2 => &mut self.fm2,
        };
        *slot = on;
    }

    /// Turn every lamp off without touching brightness
    pub fn all_off(&mut self) {
        for led in McduLed::ALL {
            self.set(led, false);
        }
    }

    pub fn display_brightness_percent(&self) -> u8 {
        self.display_brightness_percent
    }

    pub fn led_brightness_percent(&self) -> u8 {
        self.led_brightness_percent
    }

    pub fn backlight_brightness_percent(&self) -> u8 {
        self.backlight_brightness_percent
    }

    pub fn set_display_brightness_percent(&mut self, percent: i32) {
        self.display_brightness_percent = clamp_percent(percent);
    }

    pub fn set_led_brightness_percent(&mut self, percent: i32) {
        self.led_brightness_percent = clamp_percent(percent);
    }

    pub fn set_backlight_brightness_percent(&mut self, percent: i32) {
        self.backlight_brightness_percent = clamp_percent(percent);
    }
}
