//! Input report decoding

use cockpit_panels::fcu::{fcu_input_layout, FcuKey};
use cockpit_panels::hid::input::{InputDecoder, InputReport};
use cockpit_panels::hid::protocol::INPUT_REPORT_SIZE;
use cockpit_panels::mcdu::keys::{mcdu_input_layout, AMBIENT_LEFT_OFFSET, AMBIENT_RIGHT_OFFSET};
use cockpit_panels::mcdu::McduKey;
use cockpit_panels::{KeyId, PanelEvent};
use proptest::prelude::*;

fn report() -> InputReport {
    InputReport::from_bytes(&[0x01])
}

proptest! {
    #[test]
    fn prop_single_bit_gives_single_event(index in 0..McduKey::ALL.len()) {
        let key = McduKey::ALL[index];
        let mut decoder = InputDecoder::new(mcdu_input_layout());
        let bit = decoder.layout().key_bit(KeyId::Mcdu(key)).unwrap();

        let mut pressed = report();
        pressed.set_bit(bit.offset, bit.mask, true);
        prop_assert_eq!(
            decoder.process(pressed.as_bytes()),
            vec![PanelEvent::KeyActivated(KeyId::Mcdu(key))]
        );
        prop_assert!(decoder.process(pressed.as_bytes()).is_empty());
        prop_assert_eq!(
            decoder.process(report().as_bytes()),
            vec![PanelEvent::KeyDeactivated(KeyId::Mcdu(key))]
        );
    }

    #[test]
    fn prop_ambient_event_only_on_change(left in 0u16..0x1000, right in 0u16..0x1000) {
        let mut decoder = InputDecoder::new(mcdu_input_layout());
        let mut first = report();
        first.set_u16_le(AMBIENT_LEFT_OFFSET, left);
        first.set_u16_le(AMBIENT_RIGHT_OFFSET, right);

        let events = decoder.process(first.as_bytes());
        let ambient = events
            .iter()
            .filter(|e| matches!(e, PanelEvent::AmbientLightChanged { .. }))
            .count();
        prop_assert_eq!(ambient, usize::from(left != 0 || right != 0));
        prop_assert!(decoder.process(first.as_bytes()).is_empty());
    }
}

#[test]
fn test_wrong_size_or_tag_is_ignored() {
    let mut decoder = InputDecoder::new(mcdu_input_layout());
    assert!(decoder.process(&[0x01, 0xFF, 0xFF]).is_empty());
    let mut bytes = [0xFFu8; INPUT_REPORT_SIZE];
    bytes[0] = 0x02;
    assert!(decoder.process(&bytes).is_empty());
}

#[test]
fn test_fcu_keys_have_no_ambient() {
    let mut decoder = InputDecoder::new(fcu_input_layout());
    let mut bytes = report();
    bytes.set_u16_le(17, 0x0800);
    assert!(decoder.process(bytes.as_bytes()).is_empty());

    let bit = decoder.layout().key_bit(KeyId::Fcu(FcuKey::Ap1)).unwrap();
    bytes.set_bit(bit.offset, bit.mask, true);
    assert_eq!(
        decoder.process(bytes.as_bytes()),
        vec![PanelEvent::KeyActivated(KeyId::Fcu(FcuKey::Ap1))]
    );
}
