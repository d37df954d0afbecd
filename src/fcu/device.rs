//! FCU device: centre unit plus optional EFIS panels on one session

use super::encoder::{FcuEncoder, FcuPanel, FcuPanels};
use super::keys::fcu_input_layout;
use super::state::{FcuLeds, FcuState};
use crate::core::config::Config;
use crate::core::error::PanelResult;
use crate::core::events::{PanelEvent, SubscriptionId};
use crate::hid::protocol::BrightnessKind;
use crate::hid::session::{hidapi_presence, DeviceWatcher, PanelSession};
use crate::hid::transport::{HidApiTransport, HidTransport};
use crate::model::clamp_percent;
use crate::resources::ResourceRegistry;
use hidapi::HidApi;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Brightness {
    backlight: u8,
    display: u8,
    leds: u8,
}

impl Brightness {
    fn get(&self, kind: BrightnessKind) -> u8 {
        match kind {
            BrightnessKind::Backlight => self.backlight,
            BrightnessKind::Display => self.display,
            BrightnessKind::Leds => self.leds,
        }
    }

    fn slot(&mut self, kind: BrightnessKind) -> &mut u8 {
        match kind {
            BrightnessKind::Backlight => &mut self.backlight,
            BrightnessKind::Display => &mut self.display,
            BrightnessKind::Leds => &mut self.leds,
        }
    }
}

/// A connected FCU
pub struct Fcu<T: HidTransport> {
    session: PanelSession<T>,
    resources: Arc<ResourceRegistry>,
    panels: FcuPanels,
    state: FcuState,
    leds: FcuLeds,
    brightness: Brightness,
    encoder: FcuEncoder,
    last_sent: Option<(FcuState, FcuPanels)>,
    watcher: Mutex<Option<DeviceWatcher>>,
}

impl Fcu<HidApiTransport> {
    /// Open the first FCU on the bus and watch it for removal
    pub fn open(
        api: &Arc<Mutex<HidApi>>,
        config: &Config,
        panels: FcuPanels,
        resources: Arc<ResourceRegistry>,
    ) -> PanelResult<Self> {
        let transport = HidApiTransport::open(&api.lock(), &config.fcu)?;
        let fcu = Self::new(transport, config, panels, resources)?;
        fcu.watch_presence(
            Duration::from_millis(config.fcu.presence_poll_ms),
            hidapi_presence(Arc::clone(api)),
        );
        Ok(fcu)
    }
}

impl<T: HidTransport> Fcu<T> {
    /// Wrap an open transport driving the units in `panels`
    pub fn new(
        transport: T,
        config: &Config,
        panels: FcuPanels,
        resources: Arc<ResourceRegistry>,
    ) -> PanelResult<Self> {
        let session = PanelSession::new(transport, fcu_input_layout(), &config.fcu)?;
        Ok(Self {
            session,
            resources,
            panels,
            state: FcuState::default(),
            leds: FcuLeds::default(),
            brightness: Brightness {
                backlight: clamp_percent(config.display.backlight_brightness),
                display: clamp_percent(config.display.display_brightness),
                leds: clamp_percent(config.display.led_brightness),
            },
            encoder: FcuEncoder::new(),
            last_sent: None,
            watcher: Mutex::new(None),
        })
    }

    pub fn session(&self) -> &PanelSession<T> {
        &self.session
    }

    pub fn panels(&self) -> FcuPanels {
        self.panels
    }

    pub fn state(&self) -> &FcuState {
        &self.state
    }

    /// Edit window values; call [`Fcu::refresh_display`] to send them
    pub fn state_mut(&mut self) -> &mut FcuState {
        &mut self.state
    }

    pub fn leds(&self) -> &FcuLeds {
        &self.leds
    }

    /// Edit lamps; call [`Fcu::refresh_leds`] to send them
    pub fn leds_mut(&mut self) -> &mut FcuLeds {
        &mut self.leds
    }

    /// Register an input callback; it runs on the read thread
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&PanelEvent) + Send + Sync + 'static,
    {
        self.session.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.session.unsubscribe(id)
    }

    /// Poll `present` every `interval`, raising `Disconnected` once the FCU is gone
    pub fn watch_presence<F>(&self, interval: Duration, present: F)
    where
        F: FnMut(&str) -> Option<bool> + Send + 'static,
    {
        let watcher = self.session.watch_with(interval, present);
        if let Some(mut old) = self.watcher.lock().replace(watcher) {
            old.stop();
        }
    }

    /// Replay the power-on sequence, then push brightness, lamps and windows
    pub fn initialise(&mut self) -> PanelResult<()> {
        info!("Initialising FCU on {}", self.session.path());
        self.session.send_sequence(self.resources.fcu_startup())?;
        self.encoder.forget();
        self.last_sent = None;

        let mut packets = Vec::new();
        for panel in self.panels.present() {
            for kind in [BrightnessKind::Backlight, BrightnessKind::Display, BrightnessKind::Leds] {
                let percent = self.brightness.get(kind);
                packets.push(self.encoder.brightness(panel, kind, percent as i32));
            }
        }
        self.session.send_sequence(&packets)?;
        self.refresh_leds(true)?;
        self.refresh_display(true)?;
        Ok(())
    }

    /// Send the windows; returns whether anything was written
    pub fn refresh_display(&mut self, skip_duplicate_check: bool) -> PanelResult<bool> {
        let current = (self.state, self.panels);
        if !skip_duplicate_check && self.last_sent == Some(current) {
            debug!("FCU windows unchanged");
            return Ok(false);
        }
        let packets = self.encoder.encode_display(&self.state, self.panels);
        self.session.send_sequence(&packets)?;
        self.last_sent = Some(current);
        Ok(true)
    }

    /// Send lamps that changed, on every present unit
    pub fn refresh_leds(&mut self, skip_duplicate_check: bool) -> PanelResult<()> {
        let packets = self.encoder.leds(&self.leds, self.panels, skip_duplicate_check);
        if !packets.is_empty() {
            self.session.send_sequence(&packets)?;
        }
        self.encoder.commit_leds(&self.leds);
        Ok(())
    }

    /// Set one brightness channel on every present unit
    pub fn set_brightness(&mut self, kind: BrightnessKind, percent: i32) -> PanelResult<()> {
        let percent = clamp_percent(percent);
        *self.brightness.slot(kind) = percent;
        let packets: Vec<_> = self
            .panels
            .present()
            .map(|panel| self.encoder.brightness(panel, kind, percent as i32))
            .collect();
        self.session.send_sequence(&packets)
    }

    /// Set one brightness channel on a single unit
    pub fn set_panel_brightness(&mut self, panel: FcuPanel, kind: BrightnessKind, percent: i32) -> PanelResult<()> {
        let packet = self.encoder.brightness(panel, kind, percent);
        self.session.send_sequence(&[packet])
    }

    /// Darken every unit, switch lamps off and dash the windows
    pub fn cleanup(&mut self) -> PanelResult<()> {
        for kind in [BrightnessKind::Backlight, BrightnessKind::Display, BrightnessKind::Leds] {
            self.set_brightness(kind, 0)?;
        }
        self.leds.all_off();
        self.refresh_leds(true)?;
        self.state = FcuState::default();
        self.refresh_display(true)?;
        Ok(())
    }

    /// Stop the presence watcher and close the session
    pub fn shutdown(&self) {
        if let Some(mut watcher) = self.watcher.lock().take() {
            watcher.stop();
        }
        self.session.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hid::transport::MockTransport;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn open(panels: FcuPanels) -> (Arc<MockTransport>, Fcu<Arc<MockTransport>>) {
        let mock = Arc::new(MockTransport::new());
        let mut config = Config::default();
        config.fcu.read_timeout_ms = 10;
        let resources = Arc::new(ResourceRegistry::load().unwrap());
        let fcu = Fcu::new(Arc::clone(&mock), &config, panels, resources).unwrap();
        (mock, fcu)
    }

    #[test]
    fn test_initialise() {
        let (mock, mut fcu) = open(FcuPanels::ALL);
        fcu.initialise().unwrap();
        let writes = mock.writes();
        let startup = ResourceRegistry::load().unwrap().fcu_startup().to_vec();
        assert_eq!(&writes[..startup.len()], &startup[..]);
        // 3 brightness per unit, every lamp, then a segment/commit pair per unit
        assert_eq!(writes.len(), startup.len() + 9 + 20 + 6);
    }

    #[test]
    fn test_display_idempotent() {
        let (mock, mut fcu) = open(FcuPanels::CENTRE_ONLY);
        fcu.state_mut().speed = Some(250.0);
        assert!(fcu.refresh_display(false).unwrap());
        let first = mock.take_writes();
        assert_eq!(first.len(), 2);

        assert!(!fcu.refresh_display(false).unwrap());
        assert!(mock.writes().is_empty());

        assert!(fcu.refresh_display(true).unwrap());
        assert_eq!(mock.take_writes(), first);
    }

    #[test]
    fn test_brightness_goes_to_every_unit() {
        let (mock, mut fcu) = open(FcuPanels::ALL);
        fcu.set_brightness(BrightnessKind::Display, 150).unwrap();
        let writes = mock.writes();
        assert_eq!(writes.len(), 3);
        assert!(writes.iter().all(|w| w[7] == 0x01 && w[8] == 0xFF));
        assert_eq!(&writes[1][1..3], &[0x0D, 0xBF]);
    }

    #[test]
    fn test_unplug_is_reported_and_watch_stops() {
        let (_mock, fcu) = open(FcuPanels::CENTRE_ONLY);
        let plugged = Arc::new(AtomicBool::new(true));
        let p = Arc::clone(&plugged);
        fcu.watch_presence(Duration::from_millis(10), move |_| Some(p.load(Ordering::SeqCst)));
        assert!(fcu.session().is_connected());

        plugged.store(false, Ordering::SeqCst);
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while fcu.session().is_connected() && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(!fcu.session().is_connected());

        fcu.shutdown();
        assert!(fcu.watcher.lock().is_none());
    }

    #[test]
    fn test_cleanup() {
        let (mock, mut fcu) = open(FcuPanels::CENTRE_ONLY);
        fcu.leds_mut().ap1 = true;
        fcu.state_mut().altitude = Some(3000);
        fcu.cleanup().unwrap();
        assert!(!fcu.leds().ap1);
        assert_eq!(fcu.state(), &FcuState::default());
        let writes = mock.writes();
        assert!(writes[..3].iter().all(|w| w[8] == 0x00));
        assert_eq!(writes.last().unwrap()[3], 0x11);
    }
}
