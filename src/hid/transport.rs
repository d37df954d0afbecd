//! Byte transport underneath a panel session
//!
//! [`HidTransport`] is the seam between the protocol code and `hidapi`. The
//! real implementation wraps a [`hidapi::HidDevice`]; tests substitute
//! [`MockTransport`], which scripts input and records output.

use crate::core::config::DeviceConfig;
use crate::core::error::{PanelError, PanelResult};
use hidapi::{HidApi, HidDevice};
use parking_lot::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::protocol::PACKET_SIZE;

/// Longest a single blocking read holds the device lock
const READ_SLICE_MS: i32 = 50;

/// Raw report I/O against one open device
pub trait HidTransport: Send + Sync + 'static {
    /// Write one output report, returning the number of bytes accepted
    fn write(&self, data: &[u8]) -> PanelResult<usize>;

    /// Read one input report; `Ok(0)` means the timeout elapsed
    fn read_timeout(&self, buf: &mut [u8], timeout_ms: i32) -> PanelResult<usize>;

    /// Platform enumeration path
    fn path(&self) -> &str;

    /// Largest output report the device declares
    fn output_report_len(&self) -> usize;
}

impl<T: HidTransport> HidTransport for std::sync::Arc<T> {
    fn write(&self, data: &[u8]) -> PanelResult<usize> {
        (**self).write(data)
    }

    fn read_timeout(&self, buf: &mut [u8], timeout_ms: i32) -> PanelResult<usize> {
        (**self).read_timeout(buf, timeout_ms)
    }

    fn path(&self) -> &str {
        (**self).path()
    }

    fn output_report_len(&self) -> usize {
        (**self).output_report_len()
    }
}

/// Largest output report, in bytes, declared by a HID report descriptor.
///
/// Only the global Report Size / Report Count / Report ID items and the
/// Output main item matter here; a report ID adds one byte.
pub fn output_report_len_from_descriptor(descriptor: &[u8]) -> Option<usize> {
    let mut report_size: u32 = 0;
    let mut report_count: u32 = 0;
    let mut report_id: u8 = 0;
    let mut bits: std::collections::BTreeMap<u8, u32> = std::collections::BTreeMap::new();

    let mut i = 0;
    while i < descriptor.len() {
        let prefix = descriptor[i];
        if prefix == 0xFE {
            // Long item: size byte, tag byte, data
            let size = *descriptor.get(i + 1)? as usize;
            i += 3 + size;
            continue;
        }
        let size = match prefix & 0x03 {
            3 => 4,
            n => n as usize,
        };
        let data = descriptor.get(i + 1..i + 1 + size)?;
        let value = data
            .iter()
            .rev()
            .fold(0u32, |acc, &b| acc << 8 | b as u32);
        match prefix & 0xFC {
            0x74 => report_size = value,
            0x94 => report_count = value,
            0x84 => report_id = value as u8,
            0x90 => *bits.entry(report_id).or_default() += report_size * report_count,
            _ => {}
        }
        i += 1 + size;
    }

    bits.iter()
        .map(|(id, bits)| (*bits as usize).div_ceil(8) + usize::from(*id != 0))
        .max()
}

/// `hidapi` backed transport
pub struct HidApiTransport {
    device: Mutex<HidDevice>,
    path: String,
    output_report_len: usize,
}

impl HidApiTransport {
    /// Open the first device matching the configured vendor and product IDs
    pub fn open(api: &HidApi, config: &DeviceConfig) -> PanelResult<Self> {
        let info = api
            .device_list()
            .find(|d| d.vendor_id() == config.vendor_id && d.product_id() == config.product_id)
            .ok_or(PanelError::DeviceNotFound {
                vendor_id: config.vendor_id,
                product_id: config.product_id,
            })?;

        info!(
            "Found panel: {} {}",
            info.manufacturer_string().unwrap_or("Unknown"),
            info.product_string().unwrap_or("Unknown")
        );

        let device = info.open_device(api)?;
        device.set_blocking_mode(true)?;
        let path = info.path().to_string_lossy().into_owned();

        let mut descriptor = [0u8; 4096];
        let output_report_len = match device.get_report_descriptor(&mut descriptor) {
            Ok(len) => output_report_len_from_descriptor(&descriptor[..len]).unwrap_or(PACKET_SIZE),
            Err(e) => {
                warn!("Could not read report descriptor, assuming {} byte reports: {}", PACKET_SIZE, e);
                PACKET_SIZE
            }
        };
        debug!("Opened {} (output report {} bytes)", path, output_report_len);

        Ok(Self {
            device: Mutex::new(device),
            path,
            output_report_len,
        })
    }
}

impl HidTransport for HidApiTransport {
    fn write(&self, data: &[u8]) -> PanelResult<usize> {
        let written = self.device.lock().write(data)?;
        Ok(written)
    }

    fn read_timeout(&self, buf: &mut [u8], timeout_ms: i32) -> PanelResult<usize> {
        // Read in short slices so writers are not locked out for the whole timeout.
        let deadline = Instant::now() + Duration::from_millis(timeout_ms.max(0) as u64);
        loop {
            let n = self.device.lock().read_timeout(buf, READ_SLICE_MS.min(timeout_ms.max(0)))?;
            if n > 0 || Instant::now() >= deadline {
                return Ok(n);
            }
        }
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn output_report_len(&self) -> usize {
        self.output_report_len
    }
}

/// One scripted result for [`MockTransport::read_timeout`]
#[cfg(any(test, feature = "mock-hid"))]
#[derive(Debug, Clone)]
pub enum MockRead {
    Report(Vec<u8>),
    Timeout,
    Error,
}

/// In-memory transport for tests
#[cfg(any(test, feature = "mock-hid"))]
pub struct MockTransport {
    path: String,
    output_report_len: usize,
    reads: Mutex<std::collections::VecDeque<MockRead>>,
    writes: Mutex<Vec<Vec<u8>>>,
    fail_writes_after: Mutex<Option<usize>>,
}

#[cfg(any(test, feature = "mock-hid"))]
impl MockTransport {
    /// Mock with 64-byte output reports and no queued input
    pub fn new() -> Self {
        Self::with_output_len(PACKET_SIZE)
    }

    /// Mock declaring a different output report length
    pub fn with_output_len(output_report_len: usize) -> Self {
        Self {
            path: "mock://panel".to_string(),
            output_report_len,
            reads: Mutex::new(std::collections::VecDeque::new()),
            writes: Mutex::new(Vec::new()),
            fail_writes_after: Mutex::new(None),
        }
    }

    /// Queue the outcome of a future `read_timeout`
    pub fn push_read(&self, read: MockRead) {
        self.reads.lock().push_back(read);
    }

    /// Queue an input report
    pub fn push_report(&self, report: &[u8]) {
        self.push_read(MockRead::Report(report.to_vec()));
    }

    /// Every report written so far
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.writes.lock().clone()
    }

    /// Drain the written reports
    pub fn take_writes(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut *self.writes.lock())
    }

    /// Fail every write once `n` more have succeeded
    pub fn fail_writes_after(&self, n: Option<usize>) {
        *self.fail_writes_after.lock() = n;
    }
}

#[cfg(any(test, feature = "mock-hid"))]
impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "mock-hid"))]
impl HidTransport for MockTransport {
    fn write(&self, data: &[u8]) -> PanelResult<usize> {
        let mut remaining = self.fail_writes_after.lock();
        match remaining.as_mut() {
            Some(0) => return Err(PanelError::Write("mock write failure".to_string())),
            Some(n) => *n -= 1,
            None => {}
        }
        self.writes.lock().push(data.to_vec());
        Ok(data.len())
    }

    fn read_timeout(&self, buf: &mut [u8], timeout_ms: i32) -> PanelResult<usize> {
        let next = self.reads.lock().pop_front();
        match next {
            Some(MockRead::Report(report)) => {
                let n = report.len().min(buf.len());
                buf[..n].copy_from_slice(&report[..n]);
                Ok(n)
            }
            Some(MockRead::Error) => Err(PanelError::Disconnected),
            Some(MockRead::Timeout) | None => {
                std::thread::sleep(Duration::from_millis(timeout_ms.clamp(0, 10) as u64));
                Ok(0)
            }
        }
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn output_report_len(&self) -> usize {
        self.output_report_len
    }
}
