//! Integration tests for the cockpit panel HID layer

mod config_tests;
mod display_tests;
mod extractor_tests;
mod fcu_tests;
mod input_tests;
