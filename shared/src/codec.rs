//! Characteristic value codec
//!
//! Raw GATT values are small and unframed:
//! ```text
//! SSID / password : UTF-8 bytes, optionally NUL padded
//! AP state        : [ 1 byte: 0x00 disabled, 0x01 starting, >= 0x03 broadcasting ]
//! AP enable       : [ 1 byte: 0x00 off, 0x01 on ]
//! ```

use bytes::{Buf, Bytes};
use thiserror::Error;

use crate::Characteristic;

/// Lowest AP state value meaning the access point is up and broadcasting
pub const AP_STATE_ENABLED: u8 = 0x03;

/// Errors that can occur during encoding/decoding
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Empty value for {0}")]
    Empty(Characteristic),

    #[error("Value of {characteristic} is not valid UTF-8")]
    InvalidUtf8 { characteristic: Characteristic },

    #[error("{0} is not writable")]
    NotWritable(Characteristic),

    #[error("Invalid parameter for {characteristic}: expected {expected}, got {got:02x?}")]
    InvalidParams {
        characteristic: Characteristic,
        expected: &'static str,
        got: Vec<u8>,
    },
}

/// Decoded AP state byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApState {
    Disabled,
    Starting,
    Enabled,
    Other(u8),
}

impl ApState {
    pub fn from_byte(value: u8) -> Self {
        match value {
            0x00 => ApState::Disabled,
            0x01 => ApState::Starting,
            v if v >= AP_STATE_ENABLED => ApState::Enabled,
            v => ApState::Other(v),
        }
    }

    pub fn is_active(self) -> bool {
        self == ApState::Enabled
    }
}

/// Decode a UTF-8 string characteristic
pub fn decode_string(characteristic: Characteristic, mut buf: impl Buf) -> Result<String, CodecError> {
    let raw = buf.copy_to_bytes(buf.remaining());
    let end = raw
        .iter()
        .rposition(|&b| b != 0)
        .map(|i| i + 1)
        .unwrap_or(0);

    String::from_utf8(raw[..end].to_vec())
        .map_err(|_| CodecError::InvalidUtf8 { characteristic })
}

/// Decode the AP state characteristic
pub fn decode_ap_state(mut buf: impl Buf) -> Result<ApState, CodecError> {
    if !buf.has_remaining() {
        return Err(CodecError::Empty(Characteristic::WifiApState));
    }
    Ok(ApState::from_byte(buf.get_u8()))
}

/// Decode a boolean status characteristic
pub fn decode_flag(characteristic: Characteristic, mut buf: impl Buf) -> Result<bool, CodecError> {
    match characteristic {
        Characteristic::WifiApState => decode_ap_state(buf).map(ApState::is_active),
        _ => {
            if !buf.has_remaining() {
                return Err(CodecError::Empty(characteristic));
            }
            Ok(buf.get_u8() != 0)
        }
    }
}

/// A state-changing request addressed to one characteristic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub characteristic: Characteristic,
    pub params: Bytes,
}

impl Command {
    pub fn new(characteristic: Characteristic, params: impl Into<Bytes>) -> Self {
        Self {
            characteristic,
            params: params.into(),
        }
    }

    /// Turn the camera's Wi-Fi access point on or off
    pub fn enable_wifi_ap(enable: bool) -> Self {
        Self::new(Characteristic::WifiApEnable, vec![u8::from(enable)])
    }

    /// Check the parameters and return the bytes to write
    pub fn encode(&self) -> Result<Bytes, CodecError> {
        if !self.characteristic.is_writable() {
            return Err(CodecError::NotWritable(self.characteristic));
        }

        match self.characteristic {
            Characteristic::WifiApEnable => match self.params.as_ref() {
                [0x00] | [0x01] => Ok(self.params.clone()),
                other => Err(CodecError::InvalidParams {
                    characteristic: self.characteristic,
                    expected: "a single 0x00 or 0x01 byte",
                    got: other.to_vec(),
                }),
            },
            _ => Err(CodecError::NotWritable(self.characteristic)),
        }
    }
}
