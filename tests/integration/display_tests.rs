//! Display and lamp encoding through the public API

use cockpit_panels::hid::protocol::{brightness_packet, BrightnessKind, CommandPrefix, PACKET_SIZE};
use cockpit_panels::mcdu::display::{cell_bias, ColourTable, DisplayEncoder};
use cockpit_panels::mcdu::LightEncoder;
use cockpit_panels::model::{Buffer, Cell, Colour, FontSize, McduLed, McduLeds};
use proptest::prelude::*;

/// Independent reading of a display report stream back into cells
fn decode(packets: &[[u8; PACKET_SIZE]], count: usize, table: &ColourTable) -> Vec<Cell> {
    let payload: Vec<u8> = packets.iter().flat_map(|p| p[1..].iter().copied()).collect();
    let mut cells = Vec::with_capacity(count);
    let mut i = 0;
    for index in 0..count {
        let lo = payload[i].wrapping_sub(cell_bias(index, count));
        let hi = payload[i + 1];
        let (colour, size) = table
            .lookup(u16::from_le_bytes([lo, hi]))
            .expect("unknown colour code");
        i += 2;

        let width = match payload[i] {
            b if b < 0x80 => 1,
            b if b >= 0xF0 => 4,
            b if b >= 0xE0 => 3,
            _ => 2,
        };
        let text = std::str::from_utf8(&payload[i..i + width]).expect("bad utf-8");
        cells.push(Cell::new(text.chars().next().unwrap(), colour, size));
        i += width;
    }
    cells
}

fn cell_strategy() -> impl Strategy<Value = Cell> {
    let chars = prop::sample::select(vec!['A', 'z', '0', ' ', '*', '°', '←', '☐', 'Δ']);
    (chars, 0..Colour::ALL.len(), any::<bool>()).prop_map(|(ch, colour, small)| {
        let size = if small { FontSize::Small } else { FontSize::Large };
        Cell::new(ch, Colour::ALL[colour], size)
    })
}

fn grid_strategy() -> impl Strategy<Value = Buffer> {
    (1usize..=14, 1usize..=24)
        .prop_flat_map(|(rows, columns)| {
            prop::collection::vec(cell_strategy(), rows * columns)
                .prop_map(move |cells| (rows, columns, cells))
        })
        .prop_map(|(rows, columns, cells)| {
            let mut buffer = Buffer::new(rows, columns);
            for (i, cell) in cells.into_iter().enumerate() {
                if let Some(target) = buffer.cell_mut(i / columns, i % columns) {
                    *target = cell;
                }
            }
            buffer
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_display_reports_decode_to_the_grid(buffer in grid_strategy()) {
        let encoder = DisplayEncoder::default();
        let packets = encoder.packets(&buffer);
        prop_assert!(packets.iter().all(|p| p[0] == 0xF2));

        let expected: Vec<Cell> = buffer.rows().iter().flat_map(|r| r.cells().iter().copied()).collect();
        let decoded = decode(&packets, expected.len(), encoder.colours());
        prop_assert_eq!(decoded, expected);
    }

    #[test]
    fn prop_unchanged_grid_is_suppressed(buffer in grid_strategy(), row in 0usize..14, column in 0usize..24) {
        let mut encoder = DisplayEncoder::default();
        let frame = encoder.encode(&buffer, false).unwrap();
        encoder.mark_sent(frame.signature);
        prop_assert!(encoder.encode(&buffer, false).is_none());
        prop_assert!(encoder.encode(&buffer, true).is_some());

        let mut changed = buffer.clone();
        let (row, column) = (row % buffer.height(), column % buffer.width());
        let cell = changed.cell_mut(row, column).unwrap();
        cell.character = if cell.character == '#' { '@' } else { '#' };
        prop_assert!(encoder.encode(&changed, false).is_some());
    }
}

#[test]
fn test_white_w_in_top_left() {
    let mut buffer = Buffer::default();
    buffer.write("W");
    let frame = DisplayEncoder::default().encode(&buffer, false).unwrap();
    assert_eq!(&frame.packets[0][..4], &[0xF2, 0x43, 0x00, 0x57]);
    // 336 single-byte cells at three bytes each
    assert_eq!(frame.packets.len(), (336 * 3usize).div_ceil(63));
}

#[test]
fn test_lamp_toggle_sends_one_report() {
    let mut lights = LightEncoder::default();
    let mut leds = McduLeds::default();
    lights.commit(&leds);

    leds.set(McduLed::Fail, true);
    let packets = lights.apply(&leds, false);
    assert_eq!(packets.len(), 1);
    assert_eq!(
        packets[0],
        [0x02, 0x32, 0xBB, 0x00, 0x00, 0x03, 0x49, 0x08, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00]
    );
}

#[test]
fn test_brightness_over_range_saturates() {
    let packet = brightness_packet(CommandPrefix::MCDU, BrightnessKind::Backlight, 150);
    assert_eq!(packet[8], 0xFF);
    let packet = brightness_packet(CommandPrefix::MCDU, BrightnessKind::Backlight, -5);
    assert_eq!(packet[8], 0x00);
}
