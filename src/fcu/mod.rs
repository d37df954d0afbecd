//! FCU and EFIS panels: seven-segment windows, lamps and keys

pub mod device;
pub mod encoder;
pub mod keys;
pub mod segments;
pub mod state;

pub use device::Fcu;
pub use encoder::{FcuEncoder, FcuFlag, FcuPanel, FcuPanels, FLAG_BITS};
pub use keys::{fcu_input_layout, FcuKey};
pub use state::{EfisBaro, EfisLed, EfisLeds, FcuLed, FcuLeds, FcuState};
