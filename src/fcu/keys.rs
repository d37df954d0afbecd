//! FCU and EFIS key definitions
//!
//! Keys are listed in input-report bit order, centre unit first, then the
//! left and right EFIS panels. The FCU report has no ambient light sensor.

use crate::core::events::KeyId;
use crate::hid::input::InputLayout;

macro_rules! fcu_keys {
    ($($key:ident => $label:literal),* $(,)?) => {
        /// A physical key, knob push/pull or knob detent on the FCU or an EFIS
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum FcuKey {
            $($key),*
        }

        impl FcuKey {
            /// Every key, in report bit order
            pub const ALL: &'static [FcuKey] = &[$(FcuKey::$key),*];

            pub fn label(self) -> &'static str {
                match self {
                    $(FcuKey::$key => $label),*
                }
            }
        }
    };
}

fcu_keys! {
    SpdMach => "SPD/MACH",
    Loc => "LOC",
    HdgTrk => "HDG/TRK",
    Ap1 => "AP1",
    Ap2 => "AP2",
    Athr => "A/THR",
    Exped => "EXPED",
    MetricAlt => "METRIC ALT",
    Appr => "APPR",
    SpdDec => "SPD DEC",
    SpdInc => "SPD INC",
    SpdPush => "SPD PUSH",
    SpdPull => "SPD PULL",
    HdgDec => "HDG DEC",
    HdgInc => "HDG INC",
    HdgPush => "HDG PUSH",
    HdgPull => "HDG PULL",
    AltDec => "ALT DEC",
    AltInc => "ALT INC",
    AltPush => "ALT PUSH",
    AltPull => "ALT PULL",
    VsDec => "V/S DEC",
    VsInc => "V/S INC",
    VsPush => "V/S PUSH",
    VsPull => "V/S PULL",
    Alt100 => "ALT 100",
    Alt1000 => "ALT 1000",
    LeftFd => "L FD",
    LeftLs => "L LS",
    LeftCstr => "L CSTR",
    LeftWpt => "L WPT",
    LeftVord => "L VOR.D",
    LeftNdb => "L NDB",
    LeftArpt => "L ARPT",
    LeftBaroPush => "L BARO PUSH",
    LeftBaroPull => "L BARO PULL",
    LeftBaroDec => "L BARO DEC",
    LeftBaroInc => "L BARO INC",
    LeftInHg => "L INHG",
    LeftHpa => "L HPA",
    LeftModeLs => "L MODE LS",
    LeftModeVor => "L MODE VOR",
    LeftModeNav => "L MODE NAV",
    LeftModeArc => "L MODE ARC",
    LeftModePlan => "L MODE PLAN",
    LeftRange10 => "L RANGE 10",
    LeftRange20 => "L RANGE 20",
    LeftRange40 => "L RANGE 40",
    LeftRange80 => "L RANGE 80",
    LeftRange160 => "L RANGE 160",
    LeftRange320 => "L RANGE 320",
    LeftAdf1 => "L ADF1",
    LeftOff1 => "L OFF1",
    LeftVor1 => "L VOR1",
    LeftAdf2 => "L ADF2",
    LeftOff2 => "L OFF2",
    LeftVor2 => "L VOR2",
    RightFd => "R FD",
    RightLs => "R LS",
    RightCstr => "R CSTR",
    RightWpt => "R WPT",
    RightVord => "R VOR.D",
    RightNdb => "R NDB",
    RightArpt => "R ARPT",
    RightBaroPush => "R BARO PUSH",
    RightBaroPull => "R BARO PULL",
    RightBaroDec => "R BARO DEC",
    RightBaroInc => "R BARO INC",
    RightInHg => "R INHG",
    RightHpa => "R HPA",
    RightModeLs => "R MODE LS",
    RightModeVor => "R MODE VOR",
    RightModeNav => "R MODE NAV",
    RightModeArc => "R MODE ARC",
    RightModePlan => "R MODE PLAN",
    RightRange10 => "R RANGE 10",
    RightRange20 => "R RANGE 20",
    RightRange40 => "R RANGE 40",
    RightRange80 => "R RANGE 80",
    RightRange160 => "R RANGE 160",
    RightRange320 => "R RANGE 320",
    RightAdf1 => "R ADF1",
    RightOff1 => "R OFF1",
    RightVor1 => "R VOR1",
    RightAdf2 => "R ADF2",
    RightOff2 => "R OFF2",
    RightVor2 => "R VOR2",
}

/// Which physical unit a key sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FcuKeyPanel {
    Centre,
    LeftEfis,
    RightEfis,
}

impl FcuKey {
    pub fn panel(self) -> FcuKeyPanel {
        if self <= FcuKey::Alt1000 {
            FcuKeyPanel::Centre
        } else if self <= FcuKey::LeftVor2 {
            FcuKeyPanel::LeftEfis
        } else {
            FcuKeyPanel::RightEfis
        }
    }
}

/// Input layout of the FCU's 25-byte report
pub fn fcu_input_layout() -> InputLayout {
    InputLayout::sequential(FcuKey::ALL.iter().map(|k| KeyId::Fcu(*k)), None)
}
