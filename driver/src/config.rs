//! Driver configuration
//!
//! Static identity and geometry of the device. Every field has a default,
//! so a JSON file only needs to name what it changes.
//!
//! # Example
//!
//! ```
//! use loopdev_lib::config::DriverConfig;
//!
//! let config: DriverConfig = serde_json::from_str(r#"{ "device_name": "Studio Loop" }"#).unwrap();
//! assert_eq!(config.device_name, "Studio Loop");
//! assert_eq!(config.channels, 2);
//! assert!(config.validate().is_ok());
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::object::StreamFormat;
use crate::utils::error::HardwareError;
use crate::utils::math::DecibelRange;

/// Environment variable naming a JSON config file
pub const CONFIG_ENV: &str = "LOOPDEV_CONFIG";

/// Configuration error
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Values that parse but cannot describe a working device
    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

impl From<ConfigError> for HardwareError {
    fn from(err: ConfigError) -> Self {
        HardwareError::Unspecified(err.to_string())
    }
}

/// Keys under which the host persists box settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageKeys {
    pub box_acquired: String,
    pub box_name: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            box_acquired: "box acquired".to_string(),
            box_name: "box name".to_string(),
        }
    }
}

/// Driver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub device_name: String,
    pub device_uid: String,
    pub device_model_uid: String,
    pub manufacturer: String,
    pub box_uid: String,
    pub box_model: String,
    pub box_serial_number: String,
    pub box_firmware_version: String,
    /// Box name used until the host has persisted one
    pub default_box_name: String,
    pub bundle_id: String,
    /// Icon resource inside the bundle
    pub icon: String,

    /// Interleaved channels per frame
    pub channels: u32,
    pub sample_rates: Vec<f64>,
    pub default_sample_rate: f64,
    /// Ring buffer capacity in frames, a power of two
    pub ring_buffer_frames: u32,
    /// Frames per zero-time-stamp period, a power of two
    pub zero_timestamp_period: u32,

    pub volume_min_db: f32,
    pub volume_max_db: f32,

    pub hidden: bool,
    pub can_be_default: bool,

    pub storage: StorageKeys,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            device_name: "Loopdev".to_string(),
            device_uid: "Loopdev_Device_UID".to_string(),
            device_model_uid: "Loopdev_Model_UID".to_string(),
            manufacturer: "Loopdev".to_string(),
            box_uid: "Loopdev_Box_UID".to_string(),
            box_model: "Loopdev Box".to_string(),
            box_serial_number: "00000001".to_string(),
            box_firmware_version: "0.1.0".to_string(),
            default_box_name: "Loopdev Box".to_string(),
            bundle_id: "audio.loopdev.driver".to_string(),
            icon: "DeviceIcon.icns".to_string(),
            channels: 2,
            sample_rates: vec![44_100.0, 48_000.0, 88_200.0, 96_000.0, 176_400.0, 192_000.0],
            default_sample_rate: 48_000.0,
            ring_buffer_frames: 16_384,
            zero_timestamp_period: 16_384,
            volume_min_db: -64.0,
            volume_max_db: 0.0,
            hidden: false,
            can_be_default: true,
            storage: StorageKeys::default(),
        }
    }
}

impl DriverConfig {
    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "Loading driver config");

        let content = std::fs::read_to_string(path)?;
        let config: DriverConfig = serde_json::from_str(&content)?;
        config.validate()?;

        tracing::info!(path = %path.display(), "Driver config loaded");
        Ok(config)
    }

    /// Config named by `LOOPDEV_CONFIG`, or the defaults
    pub fn from_env() -> Self {
        let Ok(path) = std::env::var(CONFIG_ENV) else {
            return Self::default();
        };

        Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!(error = %e, path = %path, "Failed to load driver config, using defaults");
            Self::default()
        })
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if !self.ring_buffer_frames.is_power_of_two() {
            return invalid(format!(
                "ring_buffer_frames must be a power of two, got {}",
                self.ring_buffer_frames
            ));
        }
        if !self.zero_timestamp_period.is_power_of_two() {
            return invalid(format!(
                "zero_timestamp_period must be a power of two, got {}",
                self.zero_timestamp_period
            ));
        }
        if self.zero_timestamp_period > self.ring_buffer_frames {
            return invalid("zero_timestamp_period exceeds ring_buffer_frames".to_string());
        }
        if self.channels == 0 {
            return invalid("channels must be at least 1".to_string());
        }
        if self.sample_rates.is_empty() {
            return invalid("sample_rates is empty".to_string());
        }
        if let Some(rate) = self
            .sample_rates
            .iter()
            .find(|rate| **rate <= 0.0 || rate.fract() != 0.0)
        {
            return invalid(format!("sample rate {rate} is not a positive integer"));
        }
        if !self.supports_sample_rate(self.default_sample_rate) {
            return invalid(format!(
                "default_sample_rate {} is not in sample_rates",
                self.default_sample_rate
            ));
        }
        if self.volume_min_db >= self.volume_max_db {
            return invalid(format!(
                "volume range [{}, {}] is empty",
                self.volume_min_db, self.volume_max_db
            ));
        }
        if self.volume_max_db > 0.0 {
            return invalid(format!(
                "volume_max_db must not exceed 0 dB, got {}",
                self.volume_max_db
            ));
        }
        Ok(())
    }

    pub fn supports_sample_rate(&self, rate: f64) -> bool {
        self.sample_rates.contains(&rate)
    }

    pub fn bytes_per_frame(&self) -> u32 {
        self.channels * 4
    }

    pub fn decibel_range(&self) -> DecibelRange {
        DecibelRange::new(self.volume_min_db, self.volume_max_db)
    }

    /// The device's stream format at `sample_rate`
    pub fn stream_format(&self, sample_rate: f64) -> StreamFormat {
        StreamFormat::float32(sample_rate, self.channels)
    }
}
