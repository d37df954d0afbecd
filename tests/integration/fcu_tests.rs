//! FCU window and lamp encoding

use cockpit_panels::fcu::{EfisBaro, FcuEncoder, FcuLeds, FcuPanels, FcuState};
use proptest::prelude::*;

fn baro_strategy() -> impl Strategy<Value = EfisBaro> {
    (proptest::option::of(900.0f32..1100.0), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(pressure, is_hg, is_qfe, is_std)| EfisBaro {
            pressure: if is_hg { pressure.map(|p| p / 33.8639) } else { pressure },
            is_hg,
            is_qfe,
            is_std,
        },
    )
}

fn state_strategy() -> impl Strategy<Value = FcuState> {
    (
        proptest::option::of(100.0f32..400.0),
        proptest::option::of(0u16..360),
        proptest::option::of(0u32..50_000),
        proptest::option::of(-6000i32..6000),
        any::<[bool; 9]>(),
        baro_strategy(),
        baro_strategy(),
    )
        .prop_map(|(speed, heading, altitude, vertical_speed, flags, left, right)| FcuState {
            speed,
            heading,
            altitude,
            vertical_speed,
            speed_is_mach: false,
            heading_is_track: flags[0],
            vs_is_fpa: flags[1],
            speed_managed: flags[2],
            heading_managed: flags[3],
            altitude_managed: flags[4],
            lat_mode: flags[5],
            alt_mode_managed: flags[6],
            vs_horizontal_line: flags[7],
            left: if flags[8] { left } else { EfisBaro::default() },
            right,
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_encoding_is_idempotent(state in state_strategy()) {
        let encoder = FcuEncoder::new();
        let first = encoder.encode_display(&state, FcuPanels::ALL);
        let second = encoder.encode_display(&state, FcuPanels::ALL);
        prop_assert_eq!(first.len(), 6);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_field_data_stays_inside_its_window(state in state_strategy()) {
        let packets = FcuEncoder::new().encode_display(&state, FcuPanels::ALL);
        prop_assert!(packets[0][44..].iter().all(|b| *b == 0));
        prop_assert!(packets[2][30..].iter().all(|b| *b == 0));
        prop_assert!(packets[4][30..].iter().all(|b| *b == 0));
    }
}

#[test]
fn test_committed_lamps_are_not_resent() {
    let mut encoder = FcuEncoder::new();
    let mut leds = FcuLeds::default();
    leds.loc = true;
    leds.right.arpt = true;

    let packets = encoder.leds(&leds, FcuPanels::ALL, false);
    assert_eq!(packets.len(), 2);
    encoder.commit_leds(&leds);
    assert!(encoder.leds(&leds, FcuPanels::ALL, false).is_empty());

    // Lamps on an absent panel are never addressed
    let only_centre = encoder.leds(&FcuLeds::default(), FcuPanels::CENTRE_ONLY, false);
    assert_eq!(only_centre.len(), 1);
}
