//! Configuration management

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// HID device selection and polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// USB Vendor ID
    #[serde(default = "default_vendor_id")]
    pub vendor_id: u16,
    /// USB Product ID
    pub product_id: u16,
    /// Blocking read timeout for the polling loop in milliseconds
    #[serde(default = "default_read_timeout")]
    pub read_timeout_ms: i32,
    /// Device-list refresh interval for unplug detection in milliseconds
    #[serde(default = "default_presence_poll")]
    pub presence_poll_ms: u64,
    /// Bound on waiting for the polling thread at shutdown in milliseconds
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_ms: u64,
}

fn default_vendor_id() -> u16 {
    0x4098
}
fn default_mcdu_product_id() -> u16 {
    0xBB36
}
fn default_fcu_product_id() -> u16 {
    0xBB10
}
fn default_read_timeout() -> i32 {
    1000
}
fn default_presence_poll() -> u64 {
    1000
}
fn default_shutdown_timeout() -> u64 {
    5000
}

impl DeviceConfig {
    pub fn mcdu() -> Self {
        Self {
            vendor_id: default_vendor_id(),
            product_id: default_mcdu_product_id(),
            read_timeout_ms: default_read_timeout(),
            presence_poll_ms: default_presence_poll(),
            shutdown_timeout_ms: default_shutdown_timeout(),
        }
    }

    pub fn fcu() -> Self {
        Self {
            product_id: default_fcu_product_id(),
            ..Self::mcdu()
        }
    }
}

fn default_mcdu_device() -> DeviceConfig {
    DeviceConfig::mcdu()
}

fn default_fcu_device() -> DeviceConfig {
    DeviceConfig::fcu()
}

/// Display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Initial display brightness percent
    #[serde(default = "default_display_brightness")]
    pub display_brightness: i32,
    /// Initial key backlight percent
    #[serde(default = "default_backlight")]
    pub backlight_brightness: i32,
    /// Initial indicator LED brightness percent
    #[serde(default = "default_display_brightness")]
    pub led_brightness: i32,
    /// Nudge applied to the centred font x offset, in pixels
    #[serde(default)]
    pub x_offset_adjust: i32,
    /// Nudge applied to the centred font y offset, in pixels
    #[serde(default)]
    pub y_offset_adjust: i32,
    /// Replacement colour/size code pairs for unverified colour mappings,
    /// keyed by colour name, value `[large_lo, large_hi]`
    #[serde(default)]
    pub colour_overrides: BTreeMap<String, [u8; 2]>,
}

fn default_display_brightness() -> i32 {
    80
}

fn default_backlight() -> i32 {
    50
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            display_brightness: default_display_brightness(),
            backlight_brightness: default_backlight(),
            led_brightness: default_display_brightness(),
            x_offset_adjust: 0,
            y_offset_adjust: 0,
            colour_overrides: BTreeMap::new(),
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// MCDU device configuration
    #[serde(default = "default_mcdu_device")]
    pub mcdu: DeviceConfig,
    /// FCU device configuration
    #[serde(default = "default_fcu_device")]
    pub fcu: DeviceConfig,
    /// Display configuration
    #[serde(default)]
    pub display: DisplayConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mcdu: DeviceConfig::mcdu(),
            fcu: DeviceConfig::fcu(),
            display: DisplayConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from a file, falling back to defaults if absent
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to a file
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "cockpit-panels", "CockpitPanels")
            .context("Failed to determine config directory")?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }
}
