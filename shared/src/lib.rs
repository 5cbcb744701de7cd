//! GoPro AP Shared Protocol Types
//!
//! This crate provides the protocol vocabulary, the characteristic codec and the
//! readiness state machine used by the Wi-Fi access point enabler.

pub mod codec;
pub mod state_machine;

use std::fmt;

/// Default parameters for the enable workflow
pub mod defaults {
    /// Seconds allowed for a single BLE scan/connect attempt
    pub const ATTEMPT_TIMEOUT_SECS: u64 = 15;

    /// Additional connection attempts after the first one fails
    pub const CONNECT_RETRIES: u32 = 5;

    /// Maximum number of AP state samples before giving up
    pub const READY_POLLS: u32 = 25;

    /// Delay between two AP state samples
    pub const READY_POLL_INTERVAL_MS: u64 = 200;

    /// Advertised name prefix of a camera in pairing mode
    pub const DEVICE_NAME_PREFIX: &str = "GoPro";
}

/// GATT characteristics of the camera's Wi-Fi access point service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Characteristic {
    /// AP network name (read, UTF-8)
    WifiSsid,
    /// AP passphrase (read, UTF-8)
    WifiPassword,
    /// AP power switch (write, one byte)
    WifiApEnable,
    /// AP state (read, one byte)
    WifiApState,
}

impl Characteristic {
    /// Every characteristic a session needs before it counts as open
    pub const REQUIRED: [Characteristic; 4] = [
        Characteristic::WifiSsid,
        Characteristic::WifiPassword,
        Characteristic::WifiApEnable,
        Characteristic::WifiApState,
    ];

    /// 128-bit UUID of the characteristic
    pub const fn uuid_u128(self) -> u128 {
        match self {
            Characteristic::WifiSsid => 0xb5f90002_aa8d_11e3_9046_0002a5d5c51b,
            Characteristic::WifiPassword => 0xb5f90003_aa8d_11e3_9046_0002a5d5c51b,
            Characteristic::WifiApEnable => 0xb5f90004_aa8d_11e3_9046_0002a5d5c51b,
            Characteristic::WifiApState => 0xb5f90005_aa8d_11e3_9046_0002a5d5c51b,
        }
    }

    /// Look up a characteristic by its 128-bit UUID
    pub fn from_uuid_u128(uuid: u128) -> Option<Self> {
        Self::REQUIRED.into_iter().find(|c| c.uuid_u128() == uuid)
    }

    /// Whether the characteristic accepts writes
    pub fn is_writable(self) -> bool {
        matches!(self, Characteristic::WifiApEnable)
    }
}

impl fmt::Display for Characteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Characteristic::WifiSsid => write!(f, "Wi-Fi SSID"),
            Characteristic::WifiPassword => write!(f, "Wi-Fi password"),
            Characteristic::WifiApEnable => write!(f, "Wi-Fi AP enable"),
            Characteristic::WifiApState => write!(f, "Wi-Fi AP state"),
        }
    }
}

/// Typed response to a query against an open session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusValue<T> {
    pub data: T,
}

impl<T> StatusValue<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Which camera to talk to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceTarget {
    serial_suffix: Option<String>,
}

impl DeviceTarget {
    /// First camera found in pairing mode
    pub fn any() -> Self {
        Self::default()
    }

    /// Camera whose serial ends with `suffix`
    pub fn with_serial(suffix: impl Into<String>) -> Self {
        let suffix = suffix.into();
        let suffix = suffix.trim();
        Self {
            serial_suffix: (!suffix.is_empty()).then(|| suffix.to_string()),
        }
    }

    pub fn serial_suffix(&self) -> Option<&str> {
        self.serial_suffix.as_deref()
    }

    /// Check an advertised device name against this target.
    ///
    /// Cameras advertise as `GoPro XXXX`, where `XXXX` are the last digits of
    /// the serial number.
    pub fn matches_name(&self, name: &str) -> bool {
        let name = name.trim();
        if !name.starts_with(defaults::DEVICE_NAME_PREFIX) {
            return false;
        }
        match &self.serial_suffix {
            Some(suffix) => name.ends_with(suffix.as_str()),
            None => true,
        }
    }
}

impl fmt::Display for DeviceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.serial_suffix {
            Some(suffix) => write!(f, "{} *{}", defaults::DEVICE_NAME_PREFIX, suffix),
            None => write!(f, "first {} in pairing mode", defaults::DEVICE_NAME_PREFIX),
        }
    }
}
