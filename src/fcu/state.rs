//! What the FCU and EFIS windows should show

/// Baro window of one EFIS panel
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EfisBaro {
    /// hPa, or inHg when `is_hg` is set; `None` shows dashes
    pub pressure: Option<f32>,
    pub is_hg: bool,
    pub is_qfe: bool,
    pub is_std: bool,
}

/// Centre unit windows and annunciators, plus both baro windows
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FcuState {
    /// Knots, or a mach number when `speed_is_mach`
    pub speed: Option<f32>,
    pub heading: Option<u16>,
    pub altitude: Option<u32>,
    /// ft/min, or flight path angle x10 when `vs_is_fpa`
    pub vertical_speed: Option<i32>,
    pub speed_is_mach: bool,
    pub heading_is_track: bool,
    pub vs_is_fpa: bool,
    pub speed_managed: bool,
    pub heading_managed: bool,
    pub altitude_managed: bool,
    /// LAT annunciator
    pub lat_mode: bool,
    /// LVL/CH annunciator
    pub alt_mode_managed: bool,
    /// Dash the V/S window with a single bar instead of digits
    pub vs_horizontal_line: bool,
    pub left: EfisBaro,
    pub right: EfisBaro,
}

/// Centre unit lamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FcuLed {
    Loc,
    Ap1,
    Ap2,
    Athr,
    Exped,
    Appr,
}

impl FcuLed {
    pub const ALL: [FcuLed; 6] = [
        FcuLed::Loc,
        FcuLed::Ap1,
        FcuLed::Ap2,
        FcuLed::Athr,
        FcuLed::Exped,
        FcuLed::Appr,
    ];
}

/// Lamps on one EFIS panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EfisLed {
    Fd,
    Ls,
    Cstr,
    Wpt,
    Vord,
    Ndb,
    Arpt,
}

impl EfisLed {
    pub const ALL: [EfisLed; 7] = [
        EfisLed::Fd,
        EfisLed::Ls,
        EfisLed::Cstr,
        EfisLed::Wpt,
        EfisLed::Vord,
        EfisLed::Ndb,
        EfisLed::Arpt,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EfisLeds {
    pub fd: bool,
    pub ls: bool,
    pub cstr: bool,
    pub wpt: bool,
    pub vord: bool,
    pub ndb: bool,
    pub arpt: bool,
}

impl EfisLeds {
    pub fn get(&self, led: EfisLed) -> bool {
        match led {
            EfisLed::Fd => self.fd,
            EfisLed::Ls => self.ls,
            EfisLed::Cstr => self.cstr,
            EfisLed::Wpt => self.wpt,
            EfisLed::Vord => self.vord,
            EfisLed::Ndb => self.ndb,
            EfisLed::Arpt => self.arpt,
        }
    }

    pub fn set(&mut self, led: EfisLed, on: bool) {
        let slot = match led {
            EfisLed::Fd => &mut self.fd,
            EfisLed::Ls => &mut self.ls,
            EfisLed::Cstr => &mut self.cstr,
            EfisLed::Wpt => &mut self.wpt,
            EfisLed::Vord => &mut self.vord,
            EfisLed::Ndb => &mut self.ndb,
            EfisLed::Arpt => &mut self.arpt,
        };
        *slot = on;
    }
}

/// Every FCU and EFIS lamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FcuLeds {
    pub loc: bool,
    pub ap1: bool,
    pub ap2: bool,
    pub athr: bool,
    pub exped: bool,
    pub appr: bool,
    pub left: EfisLeds,
    pub right: EfisLeds,
}

impl FcuLeds {
    pub fn get(&self, led: FcuLed) -> bool {
        match led {
            FcuLed::Loc => self.loc,
            FcuLed::Ap1 => self.ap1,
            FcuLed::Ap2 => self.ap2,
            FcuLed::Athr => self.athr,
            FcuLed::Exped => self.exped,
            FcuLed::Appr => self.appr,
        }
    }

    pub fn set(&mut self, led: FcuLed, on: bool) {
        let slot = match led {
            FcuLed::Loc => &mut self.loc,
            FcuLed::Ap1 => &mut self.ap1,
            FcuLed::Ap2 => &mut self.ap2,
            FcuLed::Athr => &mut self.athr,
            FcuLed::Exped => &mut self.exped,
            FcuLed::Appr => &mut self.appr,
        };
        *slot = on;
    }

    pub fn all_off(&mut self) {
        *self = Self::default();
    }
}
