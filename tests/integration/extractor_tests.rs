//! Font recovery from captured upload reports

use cockpit_panels::capture::{extract_font_from_capture_lines, FontExtractor};
use cockpit_panels::hid::template::HoleTarget;
use cockpit_panels::mcdu::{FontUploadParams, FontUploader};
use cockpit_panels::model::{FontFile, FontSize, Glyph};
use cockpit_panels::ResourceRegistry;
use proptest::prelude::*;
use std::sync::Arc;

const SAMPLE_CHARS: [char; 5] = ['A', 'g', '0', '°', '→'];

fn font_strategy(width: u16, height: u16) -> impl Strategy<Value = FontFile> {
    let glyph = prop::collection::vec(any::<u32>(), height as usize);
    prop::collection::vec((glyph.clone(), glyph), SAMPLE_CHARS.len()).prop_map(move |glyphs| {
        let mut font = FontFile::new("sample", width, height);
        for (ch, (large, small)) in SAMPLE_CHARS.iter().zip(glyphs) {
            font.insert(FontSize::Large, *ch, Glyph::from_rows(&large, width, height));
            font.insert(FontSize::Small, *ch, Glyph::from_rows(&small, width, height));
        }
        font
    })
}

fn to_capture(reports: &[Vec<u8>]) -> String {
    reports.iter().map(hex::encode).collect::<Vec<_>>().join("\n")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_uploaded_font_is_recovered(font in font_strategy(22, 29)) {
        let resources = Arc::new(ResourceRegistry::load().unwrap());
        let uploader = FontUploader::new(Arc::clone(&resources));
        let reports = uploader.encode(&font, &FontUploadParams::default()).unwrap();

        let mut extractor = FontExtractor::new(false);
        for report in &reports {
            extractor.feed(report).unwrap();
        }
        let recovered = extractor.finish().font;

        prop_assert_eq!((recovered.glyph_width, recovered.glyph_height), (22, 29));
        for ch in SAMPLE_CHARS {
            prop_assert_eq!(&recovered.large[&ch], &font.large[&ch]);
            prop_assert_eq!(&recovered.small[&ch], &font.small[&ch]);
        }
        let charset = resources.font_map(29).unwrap().charset.chars().count();
        prop_assert_eq!(recovered.large.len(), charset);
        prop_assert_eq!(recovered.small.len(), charset);
        prop_assert!(recovered.large[&'Z'].rows.iter().all(|r| *r == 0));
    }
}

#[test]
fn test_capture_lines_with_template() {
    let resources = Arc::new(ResourceRegistry::load().unwrap());
    let mut font = FontFile::new("sample", 24, 31);
    font.insert(FontSize::Large, 'X', Glyph::from_rows(&[0xFFFFFF; 31], 24, 31));
    let params = FontUploadParams {
        brightness_percent: 50,
        ..FontUploadParams::default()
    };
    let uploader = FontUploader::new(resources);
    let reports = uploader.encode(&font, &params).unwrap();
    let (x, y) = uploader.offsets(&font, &params);

    let extraction = extract_font_from_capture_lines(to_capture(&reports).lines(), true).unwrap();
    assert_eq!(extraction.font.large[&'X'], font.large[&'X']);
    assert_eq!(extraction.offsets, Some((x, y)));
    assert_eq!(extraction.brightness, Some(0x80));

    let template = extraction.template.unwrap();
    assert_eq!(template.glyph_height, 31);
    assert_eq!(template.packets, reports);
    assert_eq!(
        template.read_hole(&HoleTarget::LargeGlyph('X')),
        Some(font.large[&'X'].to_wire(24, 31))
    );
}

#[test]
fn test_capture_without_upload_is_empty() {
    let capture = "# display traffic only\nf2 43 00 57\n02 32 bb 00 00 03 49 08 01 00 00 00 00 00\n";
    let extraction = extract_font_from_capture_lines(capture.lines(), true).unwrap();
    assert_eq!(extraction.font.glyph_count(), 0);
    assert!(extraction.template.is_none());
}

#[test]
fn test_empty_capture() {
    let extraction = extract_font_from_capture_lines(std::iter::empty(), false).unwrap();
    assert_eq!(extraction.font.glyph_count(), 0);
}
