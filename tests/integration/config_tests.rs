//! Configuration file handling

use cockpit_panels::mcdu::display::ColourTable;
use cockpit_panels::model::{Colour, FontSize};
use cockpit_panels::Config;
use tempfile::TempDir;

#[test]
fn test_missing_file_gives_defaults() {
    let dir = TempDir::new().unwrap();
    let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.mcdu.product_id, 0xBB36);
    assert_eq!(config.fcu.product_id, 0xBB10);
}

#[test]
fn test_partial_file_and_overrides() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[mcdu]
product_id = 0xBB37
read_timeout_ms = 250

[display]
backlight_brightness = 20

[display.colour_overrides]
khaki = [0x50, 0x01]
teal = [0x01, 0x00]
"#,
    )
    .unwrap();

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.mcdu.vendor_id, 0x4098);
    assert_eq!(config.mcdu.product_id, 0xBB37);
    assert_eq!(config.mcdu.read_timeout_ms, 250);
    assert_eq!(config.display.backlight_brightness, 20);
    assert_eq!(config.display.display_brightness, 80);

    let table = ColourTable::from_config(&config.display);
    assert_eq!(table.code(Colour::Khaki, FontSize::Large), 0x0150);
    assert_eq!(table.code(Colour::Amber, FontSize::Large), 0x0021);
}

#[test]
fn test_save_then_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");
    let mut config = Config::default();
    config.display.x_offset_adjust = -3;
    config.save_to(&path).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded.display.x_offset_adjust, -3);
}
