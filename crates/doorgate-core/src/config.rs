//! Process configuration.
//!
//! Configuration is read once at start-up from a TOML file and validated into
//! an immutable [`Settings`] value. Nothing changes it afterwards: the device
//! identifier and key in particular are fixed for the process lifetime.
//!
//! ```toml
//! [server]
//! host = "auth.example.local"
//! port = 8080
//!
//! [device]
//! id = "6f9619ff-8b86-d011-b42d-00c04fc964ff"
//! key = "2b7e151628aed2a6abf7158809cf4f3c"
//!
//! [timing]
//! movement_ms = 360
//! open_ms = 3000
//! debounce_ms = 50
//! ```
//!
//! The key may be left out of the file and supplied through the
//! `DOORGATE_KEY` environment variable instead.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_DEBOUNCE_MS, DEFAULT_DRAIN_TIMEOUT_MS,
    DEFAULT_MOVEMENT_MS, DEFAULT_OPEN_MS, DEFAULT_POLL_INTERVAL_MS, DEFAULT_RESPONSE_TIMEOUT_MS,
    DEFAULT_SERVER_PORT, KEY_ENV_VAR,
};
use crate::error::Error;
use crate::types::{DeviceId, EncryptionKey};
use crate::Result;

/// Raw configuration as it appears in the TOML file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DoorgateConfig {
    pub server: ServerConfig,
    pub device: DeviceConfig,
    #[serde(default)]
    pub timing: TimingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_response_timeout")]
    pub response_timeout_ms: u64,
    #[serde(default = "default_drain_timeout")]
    pub drain_timeout_ms: u64,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceConfig {
    pub id: String,
    #[serde(default)]
    pub key: Option<String>,
}

impl std::fmt::Debug for DeviceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceConfig")
            .field("id", &self.id)
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimingConfig {
    #[serde(default = "default_movement")]
    pub movement_ms: u64,
    #[serde(default = "default_open")]
    pub open_ms: u64,
    #[serde(default = "default_debounce")]
    pub debounce_ms: u64,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            movement_ms: DEFAULT_MOVEMENT_MS,
            open_ms: DEFAULT_OPEN_MS,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_SERVER_PORT
}

fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

fn default_response_timeout() -> u64 {
    DEFAULT_RESPONSE_TIMEOUT_MS
}

fn default_drain_timeout() -> u64 {
    DEFAULT_DRAIN_TIMEOUT_MS
}

fn default_movement() -> u64 {
    DEFAULT_MOVEMENT_MS
}

fn default_open() -> u64 {
    DEFAULT_OPEN_MS
}

fn default_debounce() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

impl DoorgateConfig {
    /// Parse configuration from TOML text.
    ///
    /// # Errors
    /// Returns `Error::Config` if the text is not valid TOML or does not
    /// match the expected layout.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Read configuration from a file without consulting the environment.
    ///
    /// # Errors
    /// Returns `Error::Io` if the file cannot be read and `Error::Config` if
    /// it cannot be parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Read configuration from a file, letting `DOORGATE_KEY` supply or
    /// override the key.
    ///
    /// # Errors
    /// See [`DoorgateConfig::from_file`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let config = Self::from_file(path)?;
        Ok(config.with_key_override(std::env::var(KEY_ENV_VAR).ok()))
    }

    /// Replace the key when an override is present.
    #[must_use]
    pub fn with_key_override(mut self, key: Option<String>) -> Self {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.device.key = Some(key);
        }
        self
    }

    /// Validate and convert into typed, immutable settings.
    ///
    /// # Errors
    /// Returns `Error::MissingConfig` when no key was supplied and
    /// `Error::Config` (or the typed parse error) for any invalid value.
    pub fn validate(&self) -> Result<Settings> {
        if self.server.host.trim().is_empty() {
            return Err(Error::Config("server.host must not be empty".to_string()));
        }
        if self.server.port == 0 {
            return Err(Error::Config("server.port must not be 0".to_string()));
        }

        let device_id: DeviceId = self.device.id.parse()?;
        let key_hex = self
            .device
            .key
            .as_deref()
            .ok_or_else(|| Error::MissingConfig(format!("device.key (or {KEY_ENV_VAR})")))?;
        let key = EncryptionKey::from_hex(key_hex)?;

        let server = ServerSettings {
            host: self.server.host.trim().to_string(),
            port: self.server.port,
            connect_timeout: positive("server.connect_timeout_ms", self.server.connect_timeout_ms)?,
            response_timeout: positive(
                "server.response_timeout_ms",
                self.server.response_timeout_ms,
            )?,
            drain_timeout: positive("server.drain_timeout_ms", self.server.drain_timeout_ms)?,
        };

        let timing = DoorTiming {
            movement: positive("timing.movement_ms", self.timing.movement_ms)?,
            open: positive("timing.open_ms", self.timing.open_ms)?,
            debounce: positive("timing.debounce_ms", self.timing.debounce_ms)?,
        };
        let poll_interval = positive("timing.poll_interval_ms", self.timing.poll_interval_ms)?;
        if poll_interval >= timing.debounce {
            return Err(Error::Config(format!(
                "timing.poll_interval_ms ({}) must be shorter than timing.debounce_ms ({})",
                self.timing.poll_interval_ms, self.timing.debounce_ms
            )));
        }

        Ok(Settings {
            server,
            device_id,
            key,
            timing,
            poll_interval,
        })
    }
}

fn positive(name: &str, millis: u64) -> Result<Duration> {
    if millis == 0 {
        return Err(Error::Config(format!("{name} must be greater than 0")));
    }
    Ok(Duration::from_millis(millis))
}

/// Authorization server endpoint and exchange bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub connect_timeout: Duration,
    pub response_timeout: Duration,
    pub drain_timeout: Duration,
}

/// Physical timing of the door mechanism and the override button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoorTiming {
    /// Drive time between end positions.
    pub movement: Duration,
    /// Dwell time in the open position before auto-close.
    pub open: Duration,
    /// Button settle window.
    pub debounce: Duration,
}

impl Default for DoorTiming {
    fn default() -> Self {
        Self {
            movement: Duration::from_millis(DEFAULT_MOVEMENT_MS),
            open: Duration::from_millis(DEFAULT_OPEN_MS),
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
        }
    }
}

/// Validated configuration, fixed for the process lifetime.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub device_id: DeviceId,
    pub key: EncryptionKey,
    pub timing: DoorTiming,
    pub poll_interval: Duration,
}
