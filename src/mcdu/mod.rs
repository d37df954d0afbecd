//! Multi-function control and display unit

pub mod device;
pub mod display;
pub mod keys;
pub mod lights;
pub mod upload;

pub use device::Mcdu;
pub use display::{ColourTable, DisplayEncoder, DisplayFrame};
pub use keys::{mcdu_input_layout, McduKey};
pub use lights::LightEncoder;
pub use upload::{FontPacketMap, FontUploadParams, FontUploader, PalettePacketMap, PaletteUploader};
