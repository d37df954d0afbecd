//! Offline font recovery from captured output reports

pub mod extractor;
pub mod lines;

pub use extractor::{extract_font_from_capture_lines, ExtractState, Extraction, FontExtractor};
pub use lines::{parse_capture_line, parse_capture_lines};
