//! Device session: output serialisation, input polling and unplug detection

use super::input::{InputDecoder, InputLayout};
use super::protocol::PACKET_SIZE;
use super::transport::HidTransport;
use crate::core::config::DeviceConfig;
use crate::core::error::{PanelError, PanelResult};
use crate::core::events::{EventHub, PanelEvent, SubscriptionId};
use hidapi::HidApi;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Granularity of the stop-flag checks in background threads
const STOP_POLL_MS: u64 = 10;

/// State shared between a session and its background threads
#[derive(Clone)]
pub struct SessionLink {
    stop: Arc<AtomicBool>,
    disconnected: Arc<AtomicBool>,
    events: EventHub,
}

impl SessionLink {
    /// Publish `Disconnected` once and ask the read loop to stop
    pub fn mark_disconnected(&self) {
        self.stop.store(true, Ordering::Relaxed);
        if !self.disconnected.swap(true, Ordering::SeqCst) {
            info!("Panel disconnected");
            self.events.publish(&PanelEvent::Disconnected);
        }
    }

    /// Whether `Disconnected` has been published
    pub fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::Relaxed)
    }
}

/// One open panel.
///
/// Events are published on the session's read thread; subscribers run
/// there and must hand work off themselves if they need another thread.
pub struct PanelSession<T: HidTransport> {
    transport: Mutex<Option<Arc<T>>>,
    path: String,
    output: Mutex<()>,
    link: SessionLink,
    finished: Arc<AtomicBool>,
    reader: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
    shutdown_timeout: Duration,
}

impl<T: HidTransport> PanelSession<T> {
    /// Take ownership of an open transport and start polling it
    pub fn new(transport: T, layout: InputLayout, config: &DeviceConfig) -> PanelResult<Self> {
        let actual = transport.output_report_len();
        if actual < PACKET_SIZE {
            return Err(PanelError::OutputCapacity {
                required: PACKET_SIZE,
                actual,
            });
        }

        let transport = Arc::new(transport);
        let path = transport.path().to_string();
        let link = SessionLink {
            stop: Arc::new(AtomicBool::new(false)),
            disconnected: Arc::new(AtomicBool::new(false)),
            events: EventHub::new(),
        };
        let finished = Arc::new(AtomicBool::new(false));

        let reader = spawn_reader(
            Arc::clone(&transport),
            InputDecoder::new(layout),
            link.clone(),
            Arc::clone(&finished),
            config.read_timeout_ms,
        );
        info!("Session opened on {}", path);

        Ok(Self {
            transport: Mutex::new(Some(transport)),
            path,
            output: Mutex::new(()),
            link,
            finished,
            reader: Mutex::new(Some(reader)),
            closed: AtomicBool::new(false),
            shutdown_timeout: Duration::from_millis(config.shutdown_timeout_ms),
        })
    }

    /// Platform path of the device this session drives
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Event hub fed by the read thread
    pub fn events(&self) -> &EventHub {
        &self.link.events
    }

    /// Register a callback; it runs on the read thread
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&PanelEvent) + Send + Sync + 'static,
    {
        self.link.events.subscribe(callback)
    }

    /// Remove a callback; returns whether it was registered
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.link.events.unsubscribe(id)
    }

    /// Handle for background threads that need to flag a disconnect
    pub fn link(&self) -> SessionLink {
        self.link.clone()
    }

    /// False once shut down or disconnected
    pub fn is_connected(&self) -> bool {
        !self.closed.load(Ordering::Relaxed) && !self.link.is_disconnected()
    }

    /// Write reports in order while holding the output lock
    pub fn send_sequence<P: AsRef<[u8]>>(&self, packets: &[P]) -> PanelResult<()> {
        let _guard = self.output.lock();
        let transport = self
            .transport
            .lock()
            .as_ref()
            .map(Arc::clone)
            .ok_or(PanelError::Disconnected)?;

        for packet in packets {
            let bytes = packet.as_ref();
            let written = transport.write(bytes)?;
            if written == 0 && !bytes.is_empty() {
                return Err(PanelError::Write(format!(
                    "device accepted 0 of {} bytes",
                    bytes.len()
                )));
            }
        }
        debug!("Wrote {} reports to {}", packets.len(), self.path);
        Ok(())
    }

    /// Watch the `hidapi` device list and report removal of this session's device
    pub fn watch(&self, api: Arc<Mutex<HidApi>>, interval: Duration) -> DeviceWatcher {
        self.watch_with(interval, hidapi_presence(api))
    }

    /// Watch with a custom presence check; see [`DeviceWatcher::spawn`]
    pub fn watch_with<F>(&self, interval: Duration, present: F) -> DeviceWatcher
    where
        F: FnMut(&str) -> Option<bool> + Send + 'static,
    {
        DeviceWatcher::spawn(self.path.clone(), interval, self.link.clone(), present)
    }

    /// Stop polling and release the device; later calls do nothing
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.link.stop.store(true, Ordering::Relaxed);

        let deadline = Instant::now() + self.shutdown_timeout;
        while !self.finished.load(Ordering::Acquire) && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(STOP_POLL_MS));
        }
        if let Some(handle) = self.reader.lock().take() {
            if self.finished.load(Ordering::Acquire) {
                let _ = handle.join();
            } else {
                warn!("Read thread for {} did not stop in time", self.path);
            }
        }

        let _guard = self.output.lock();
        self.transport.lock().take();
        info!("Session on {} shut down", self.path);
    }
}

impl<T: HidTransport> Drop for PanelSession<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn spawn_reader<T: HidTransport>(
    transport: Arc<T>,
    mut decoder: InputDecoder,
    link: SessionLink,
    finished: Arc<AtomicBool>,
    timeout_ms: i32,
) -> JoinHandle<()> {
    thread::spawn(move || {
        info!("Panel read thread started");
        // Oversized so over-long reports are seen and rejected by length.
        let mut buf = [0u8; PACKET_SIZE];
        while !link.stop.load(Ordering::Relaxed) {
            match transport.read_timeout(&mut buf, timeout_ms) {
                Ok(0) => continue,
                Ok(n) => {
                    for event in decoder.process(&buf[..n]) {
                        link.events.publish(&event);
                    }
                }
                Err(e) => {
                    if !link.stop.load(Ordering::Relaxed) {
                        warn!("Read failed, ending session: {}", e);
                        link.mark_disconnected();
                    }
                    break;
                }
            }
        }
        finished.store(true, Ordering::Release);
        info!("Panel read thread stopped");
    })
}

/// Presence check over the `hidapi` device list.
///
/// Returns `None` when the list could not be refreshed, so one failed
/// enumeration never counts as an unplug.
pub fn hidapi_presence(api: Arc<Mutex<HidApi>>) -> impl FnMut(&str) -> Option<bool> + Send + 'static {
    move |path| {
        let mut api_guard = api.lock();
        if let Err(e) = api_guard.refresh_devices() {
            debug!("Failed to refresh device list: {}", e);
            return None;
        }
        let found = api_guard
            .device_list()
            .any(|d| d.path().to_string_lossy() == path);
        Some(found)
    }
}

/// Polls for the session's device and flags the session when it vanishes
pub struct DeviceWatcher {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl DeviceWatcher {
    /// Run `present(path)` every `interval` until stopped or the device is gone
    pub fn spawn<F>(path: String, interval: Duration, link: SessionLink, mut present: F) -> Self
    where
        F: FnMut(&str) -> Option<bool> + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = thread::spawn(move || {
            info!("Device watcher started for {}", path);
            while !stop_flag.load(Ordering::Relaxed) && !link.is_disconnected() {
                let wake = Instant::now() + interval;
                while Instant::now() < wake {
                    if stop_flag.load(Ordering::Relaxed) {
                        info!("Device watcher stopped for {}", path);
                        return;
                    }
                    thread::sleep(Duration::from_millis(STOP_POLL_MS));
                }

                if present(path.as_str()) == Some(false) {
                    info!("{} is no longer enumerated", path);
                    link.mark_disconnected();
                }
            }
            info!("Device watcher stopped for {}", path);
        });

        Self {
            stop,
            handle: Some(handle),
        }
    }

    /// Stop polling and wait for the thread; later calls do nothing
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for DeviceWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}
