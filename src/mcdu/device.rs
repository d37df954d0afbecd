//! MCDU device: screen, lamps and uploads over one session

use super::display::{ColourTable, DisplayEncoder};
use super::keys::mcdu_input_layout;
use super::lights::LightEncoder;
use super::upload::{FontUploadParams, FontUploader, PaletteUploader};
use crate::core::config::Config;
use crate::core::error::PanelResult;
use crate::core::events::{PanelEvent, SubscriptionId};
use crate::hid::session::{hidapi_presence, DeviceWatcher, PanelSession};
use crate::hid::transport::{HidApiTransport, HidTransport};
use crate::model::{Buffer, FontFile, McduLeds, Palette, MCDU_COLUMNS, MCDU_ROWS};
use crate::resources::ResourceRegistry;
use hidapi::HidApi;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// A connected MCDU
pub struct Mcdu<T: HidTransport> {
    session: PanelSession<T>,
    resources: Arc<ResourceRegistry>,
    screen: Buffer,
    leds: McduLeds,
    display: DisplayEncoder,
    lights: LightEncoder,
    fonts: FontUploader,
    palettes: PaletteUploader,
    watcher: Mutex<Option<DeviceWatcher>>,
    font_adjust: (i32, i32),
}

impl Mcdu<HidApiTransport> {
    /// Open the first MCDU on the bus and watch it for removal
    pub fn open(api: &Arc<Mutex<HidApi>>, config: &Config, resources: Arc<ResourceRegistry>) -> PanelResult<Self> {
        let transport = HidApiTransport::open(&api.lock(), &config.mcdu)?;
        let mcdu = Self::new(transport, config, resources)?;
        mcdu.watch_presence(
            Duration::from_millis(config.mcdu.presence_poll_ms),
            hidapi_presence(Arc::clone(api)),
        );
        Ok(mcdu)
    }
}

impl<T: HidTransport> Mcdu<T> {
    /// Wrap an open transport. Brightness starts from the `[display]` config.
    pub fn new(transport: T, config: &Config, resources: Arc<ResourceRegistry>) -> PanelResult<Self> {
        let session = PanelSession::new(transport, mcdu_input_layout(), &config.mcdu)?;

        let mut leds = McduLeds::default();
        leds.set_display_brightness_percent(config.display.display_brightness);
        leds.set_led_brightness_percent(config.display.led_brightness);
        leds.set_backlight_brightness_percent(config.display.backlight_brightness);

        Ok(Self {
            session,
            screen: Buffer::new(MCDU_ROWS, MCDU_COLUMNS),
            leds,
            display: DisplayEncoder::new(ColourTable::from_config(&config.display)),
            lights: LightEncoder::default(),
            fonts: FontUploader::new(Arc::clone(&resources)),
            palettes: PaletteUploader::new(Arc::clone(&resources)),
            resources,
            watcher: Mutex::new(None),
            font_adjust: (config.display.x_offset_adjust, config.display.y_offset_adjust),
        })
    }

    pub fn session(&self) -> &PanelSession<T> {
        &self.session
    }

    /// Screen contents as last edited, not necessarily as sent
    pub fn screen(&self) -> &Buffer {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut Buffer {
        &mut self.screen
    }

    pub fn leds(&self) -> &McduLeds {
        &self.leds
    }

    /// Edit lamps; call [`Mcdu::refresh_leds`] to send them
    pub fn leds_mut(&mut self) -> &mut McduLeds {
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

    /// Poll `present` every `interval` and raise `Disconnected` once the panel is gone.
    /// Replaces any earlier watcher; stopped by [`Mcdu::shutdown`].
    pub fn watch_presence<F>(&self, interval: Duration, present: F)
    where
        F: FnMut(&str) -> Option<bool> + Send + 'static,
    {
        let watcher = self.session.watch_with(interval, present);
        if let Some(mut old) = self.watcher.lock().replace(watcher) {
            old.stop();
        }
    }

    /// Replay the power-on sequence, then push brightness and lamps
    pub fn initialise(&mut self) -> PanelResult<()> {
        info!("Initialising MCDU on {}", self.session.path());
        self.session.send_sequence(self.resources.mcdu_startup())?;
        self.display.reset();
        self.lights.forget();
        self.send_brightness()?;
        self.refresh_leds(true)
    }

    /// Send the screen; returns whether anything was written
    pub fn refresh_display(&mut self, skip_duplicate_check: bool) -> PanelResult<bool> {
        let Some(frame) = self.display.encode(&self.screen, skip_duplicate_check) else {
            return Ok(false);
        };
        self.session.send_sequence(&frame.packets)?;
        self.display.mark_sent(frame.signature);
        Ok(true)
    }

    /// Send lamps that changed since the last successful send
    pub fn refresh_leds(&mut self, skip_duplicate_check: bool) -> PanelResult<()> {
        let packets = self.lights.apply(&self.leds, skip_duplicate_check);
        if !packets.is_empty() {
            self.session.send_sequence(&packets)?;
        }
        self.lights.commit(&self.leds);
        Ok(())
    }

    /// Set and send key backlight brightness, clamped to 0-100
    pub fn set_backlight_brightness(&mut self, percent: i32) -> PanelResult<()> {
        self.leds.set_backlight_brightness_percent(percent);
        let packet = self.lights.backlight(self.leds.backlight_brightness_percent() as i32);
        self.session.send_sequence(&[packet])
    }

    /// Set and send LCD brightness
    pub fn set_display_brightness(&mut self, percent: i32) -> PanelResult<()> {
        self.leds.set_display_brightness_percent(percent);
        let packet = self.lights.display_brightness(self.leds.display_brightness_percent() as i32);
        self.session.send_sequence(&[packet])
    }

    /// Set and send lamp brightness
    pub fn set_led_brightness(&mut self, percent: i32) -> PanelResult<()> {
        self.leds.set_led_brightness_percent(percent);
        let packet = self.lights.led_brightness(self.leds.led_brightness_percent() as i32);
        self.session.send_sequence(&[packet])
    }

    fn send_brightness(&mut self) -> PanelResult<()> {
        let packets = [
            self.lights.backlight(self.leds.backlight_brightness_percent() as i32),
            self.lights.display_brightness(self.leds.display_brightness_percent() as i32),
            self.lights.led_brightness(self.leds.led_brightness_percent() as i32),
        ];
        self.session.send_sequence(&packets)
    }

    /// Upload a font. The configured offset nudges are added to `params`.
    pub fn upload_font(&mut self, font: &FontFile, params: &FontUploadParams) -> PanelResult<()> {
        let params = FontUploadParams {
            x_adjust: params.x_adjust + self.font_adjust.0,
            y_adjust: params.y_adjust + self.font_adjust.1,
            ..*params
        };
        let packets = self.fonts.encode(font, &params)?;
        info!("Uploading font '{}' ({} reports)", font.name, packets.len());
        self.session.send_sequence(&packets)?;
        self.fonts.commit(font);
        Ok(())
    }

    /// Font most recently uploaded successfully
    pub fn last_font(&self) -> Option<&FontFile> {
        self.fonts.last_font()
    }

    /// Upload a palette, then repaint unless `suppress_refresh` is set
    pub fn upload_palette(&mut self, palette: &Palette, suppress_refresh: bool) -> PanelResult<()> {
        let Some(packets) = self.palettes.encode(palette, false) else {
            debug!("Palette unchanged, not uploading");
            return Ok(());
        };
        self.session.send_sequence(&packets)?;
        self.palettes.commit(palette);
        if !suppress_refresh {
            self.refresh_display(true)?;
        }
        Ok(())
    }

    /// Palette most recently uploaded successfully
    pub fn last_palette(&self) -> Option<&Palette> {
        self.palettes.last_palette()
    }

    /// Restore device-side state after a reconnect
    pub fn reestablish(&mut self) -> PanelResult<()> {
        self.display.reset();
        if let Some(palette) = self.palettes.last_palette().cloned() {
            if let Some(packets) = self.palettes.encode(&palette, true) {
                info!("Re-sending palette after reconnect");
                self.session.send_sequence(&packets)?;
            }
        }
        self.refresh_display(true)?;
        Ok(())
    }

    /// Darken and blank the panel ahead of shutdown
    pub fn cleanup(&mut self) -> PanelResult<()> {
        self.set_backlight_brightness(0)?;
        self.set_display_brightness(0)?;
        self.set_led_brightness(0)?;
        self.leds.all_off();
        self.refresh_leds(true)?;
        self.screen.clear();
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
    use crate::hid::protocol::ReportTag;
    use crate::hid::transport::MockTransport;
    use crate::model::{McduLed, Rgba};

    fn open() -> (Arc<MockTransport>, Mcdu<Arc<MockTransport>>) {
        let mock = Arc::new(MockTransport::new());
        let mut config = Config::default();
        config.mcdu.read_timeout_ms = 10;
        let resources = Arc::new(ResourceRegistry::load().unwrap());
        let mcdu = Mcdu::new(Arc::clone(&mock), &config, resources).unwrap();
        (mock, mcdu)
    }

    #[test]
    fn test_initialise_replays_startup_verbatim() {
        let (mock, mut mcdu) = open();
        mcdu.initialise().unwrap();
        let writes = mock.writes();
        let startup = ResourceRegistry::load().unwrap().mcdu_startup().to_vec();
        assert_eq!(&writes[..startup.len()], &startup[..]);
        // Three brightness reports then every lamp
        assert_eq!(writes.len(), startup.len() + 3 + McduLed::ALL.len());
    }

    #[test]
    fn test_display_refresh_is_suppressed_when_unchanged() {
        let (mock, mut mcdu) = open();
        mcdu.screen_mut().write("HELLO");
        assert!(mcdu.refresh_display(false).unwrap());
        let sent = mock.take_writes().len();
        assert!(sent > 0);

        assert!(!mcdu.refresh_display(false).unwrap());
        assert!(mock.writes().is_empty());
        assert!(mcdu.refresh_display(true).unwrap());
        assert_eq!(mock.writes().len(), sent);
    }

    #[test]
    fn test_failed_send_is_not_recorded() {
        let (mock, mut mcdu) = open();
        mock.fail_writes_after(Some(0));
        assert!(mcdu.refresh_display(false).is_err());
        mock.fail_writes_after(None);
        assert!(mcdu.refresh_display(false).unwrap());
    }

    #[test]
    fn test_led_toggle() {
        let (mock, mut mcdu) = open();
        mcdu.leds_mut().set(McduLed::Fm1, true);
        mcdu.refresh_leds(false).unwrap();
        let writes = mock.take_writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].len(), 14);
        assert_eq!((writes[0][7], writes[0][8]), (0x0C, 0x01));

        mcdu.leds_mut().set(McduLed::Fm1, true);
        mcdu.refresh_leds(false).unwrap();
        assert!(mock.writes().is_empty());
    }

    #[test]
    fn test_palette_upload_repaints() {
        let (mock, mut mcdu) = open();
        let mut palette = Palette::new(Rgba::opaque(0, 0, 0));
        palette.set(1, Rgba::opaque(0xFF, 0x80, 0x00));

        mcdu.upload_palette(&palette, false).unwrap();
        let writes = mock.take_writes();
        assert_eq!(writes.last().unwrap()[0], ReportTag::Display.as_byte());

        mcdu.upload_palette(&palette, false).unwrap();
        assert!(mock.take_writes().is_empty());

        mcdu.reestablish().unwrap();
        let writes = mock.take_writes();
        assert_eq!(writes[0][0], ReportTag::Upload.as_byte());
        assert_eq!(writes.last().unwrap()[0], ReportTag::Display.as_byte());
    }

    #[test]
    fn test_reestablish_without_palette_only_repaints() {
        let (mock, mut mcdu) = open();
        mcdu.refresh_display(false).unwrap();
        mock.take_writes();
        mcdu.reestablish().unwrap();
        let writes = mock.writes();
        assert!(!writes.is_empty());
        assert!(writes.iter().all(|w| w[0] == ReportTag::Display.as_byte()));
    }

    #[test]
    fn test_cleanup_darkens_and_blanks() {
        let (mock, mut mcdu) = open();
        mcdu.screen_mut().write("XYZ");
        mcdu.leds_mut().fail = true;
        mcdu.cleanup().unwrap();

        assert_eq!(mcdu.leds().backlight_brightness_percent(), 0);
        assert!(!mcdu.leds().fail);
        assert_eq!(mcdu.screen().cell(0, 0).unwrap().character, ' ');
        let writes = mock.writes();
        assert_eq!(&writes[0][7..9], &[0x00, 0x00]);
        assert_eq!(writes.last().unwrap()[0], ReportTag::Display.as_byte());
    }

    #[test]
    fn test_upload_font_applies_configured_adjust() {
        let mock = Arc::new(MockTransport::new());
        let mut config = Config::default();
        config.mcdu.read_timeout_ms = 10;
        config.display.x_offset_adjust = 7;
        config.display.y_offset_adjust = -3;
        let resources = Arc::new(ResourceRegistry::load().unwrap());
        let mut mcdu = Mcdu::new(Arc::clone(&mock), &config, Arc::clone(&resources)).unwrap();

        let font = FontFile::new("test", 22, 29);
        let params = FontUploadParams {
            x_adjust: 1,
            ..FontUploadParams::default()
        };
        mcdu.upload_font(&font, &params).unwrap();

        let uploader = FontUploader::new(resources);
        let adjusted = FontUploadParams {
            x_adjust: 8,
            y_adjust: -3,
            ..params
        };
        assert_eq!(mock.writes(), uploader.encode(&font, &adjusted).unwrap());
        let (x, y) = uploader.offsets(&font, &FontUploadParams::default());
        assert_eq!(uploader.offsets(&font, &adjusted), (x + 8, y - 3));
    }

    #[test]
    fn test_presence_watch_raises_disconnect() {
        let (_mock, mcdu) = open();
        let (_id, mut rx) = mcdu.session().events().channel();
        let plugged = Arc::new(std::sync::atomic::AtomicBool::new(true));
        let p = Arc::clone(&plugged);
        mcdu.watch_presence(Duration::from_millis(10), move |_| {
            Some(p.load(std::sync::atomic::Ordering::SeqCst))
        });

        plugged.store(false, std::sync::atomic::Ordering::SeqCst);
        let event = tokio_test::block_on(async {
            tokio::time::timeout(Duration::from_secs(2), rx.recv()).await
        });
        assert!(matches!(event, Ok(Some(PanelEvent::Disconnected))));
        assert!(!mcdu.session().is_connected());
        mcdu.shutdown();
        assert!(mcdu.watcher.lock().is_none());
    }

    #[test]
    fn test_shutdown_stops_presence_watch() {
        let (_mock, mcdu) = open();
        mcdu.watch_presence(Duration::from_millis(10), |_| Some(true));
        assert!(mcdu.watcher.lock().is_some());
        mcdu.shutdown();
        assert!(mcdu.watcher.lock().is_none());
    }

    #[test]
    fn test_shutdown_twice() {
        let (_mock, mcdu) = open();
        mcdu.shutdown();
        mcdu.shutdown();
        assert!(!mcdu.session().is_connected());
    }
}
