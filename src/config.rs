// src/config.rs

//! Configuration of the display daemon.
//!
//! Every section has defaults matching a two-panel display on a Raspberry Pi,
//! so an empty JSON object (or no file at all) is a valid configuration.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{info, warn};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::logging::LogLevel;
use crate::scheduler::{IdlePolicy, Timing, DEFAULT_RENDER_PRIORITY};
use crate::sink::ht1632::PANEL_WIDTH;
use crate::sink::SinkKind;

/// Environment variable holding the path of the JSON configuration file.
pub const CONFIG_ENV_VAR: &str = "PI_LEDMATRIX_CONFIG";

/// Process-wide configuration, loaded on first use.
pub static CONFIG: Lazy<Config> = Lazy::new(Config::load_or_default);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub display: DisplayConfig,
    pub timing: TimingConfig,
    pub content: ContentConfig,
    pub scheduler: SchedulerConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Reads a JSON configuration file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_json(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        info!("Config: Loaded {}", path.display());
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Invalid configuration JSON")
    }

    /// Loads the file named by `PI_LEDMATRIX_CONFIG`, falling back to the
    /// defaults when it is unset or unusable.
    pub fn load_or_default() -> Self {
        let Some(path) = std::env::var_os(CONFIG_ENV_VAR) else {
            info!("Config: {} not set, using defaults", CONFIG_ENV_VAR);
            return Self::default();
        };
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Config: {:#}; using defaults", e);
                Self::default()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Number of chained 32x8 panels.
    pub panels: usize,
    /// PWM level, 0 to 15.
    pub brightness: u8,
    pub blink: bool,
    pub sink: SinkKind,
    /// One `spidev` device per panel, in panel order.
    pub spi_devices: Vec<String>,
    pub spi_speed_hz: u32,
}

impl DisplayConfig {
    /// Total number of columns across all panels.
    pub fn width(&self) -> usize {
        self.panels * PANEL_WIDTH
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            panels: 2,
            brightness: 15,
            blink: false,
            sink: SinkKind::default(),
            spi_devices: vec!["/dev/spidev0.0".to_string(), "/dev/spidev0.1".to_string()],
            spi_speed_hz: 256 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub render_period_ms: u64,
    pub compute_period_ms: u64,
    /// Real-time priority of the render thread; `null` disables it.
    pub render_priority: Option<i32>,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            render_period_ms: 15,
            compute_period_ms: 1000,
            render_priority: Some(DEFAULT_RENDER_PRIORITY),
        }
    }
}

impl From<&TimingConfig> for Timing {
    /// Periods below one millisecond are raised to one.
    fn from(config: &TimingConfig) -> Self {
        Timing {
            render_period: Duration::from_millis(config.render_period_ms.max(1)),
            compute_period: Duration::from_millis(config.compute_period_ms.max(1)),
            render_priority: config.render_priority,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    pub clock_priority: u8,
    pub message_priority: u8,
    /// Render cycles per one-column scroll step.
    pub scroll_speed_divisor: u32,
    pub letter_spacing: usize,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            clock_priority: 0,
            message_priority: 10,
            scroll_speed_divisor: 1,
            letter_spacing: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SchedulerConfig {
    pub idle_policy: IdlePolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
}
