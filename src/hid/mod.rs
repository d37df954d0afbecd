//! HID module - report framing, transport and device sessions shared by every panel

pub mod input;
pub mod protocol;
pub mod session;
pub mod template;
pub mod transport;

pub use input::{InputDecoder, InputLayout, InputReport};
pub use protocol::{BrightnessKind, CommandPrefix, ReportTag, PACKET_SIZE};
pub use session::{hidapi_presence, DeviceWatcher, PanelSession};
pub use template::{HoleTarget, PacketTemplate, TemplateBuilder};
pub use transport::{HidApiTransport, HidTransport};

#[cfg(any(test, feature = "mock-hid"))]
pub use transport::{MockRead, MockTransport};
