//! Device link abstraction over the camera's control channel

use crate::error::LinkError;
use async_trait::async_trait;
use gopro_ap_shared::{Characteristic, DeviceTarget};
use std::time::Duration;

/// Acknowledgement of an accepted write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    pub characteristic: Characteristic,
}

/// The five primitives the session layer needs from a control channel
#[async_trait]
pub trait DeviceLink: Send + Sync {
    /// Connection handle produced by `connect`
    type Handle: Send;

    /// Locate `target` and open a connection, giving up after `timeout`.
    ///
    /// Must be cancel-safe: dropping the future releases anything the
    /// attempt opened so far.
    async fn connect(&self, target: &DeviceTarget, timeout: Duration) -> Result<Self::Handle, LinkError>;

    /// Read a string characteristic
    async fn read_string(
        &self,
        handle: &mut Self::Handle,
        characteristic: Characteristic,
    ) -> Result<String, LinkError>;

    /// Read a boolean status characteristic
    async fn read_bool(
        &self,
        handle: &mut Self::Handle,
        characteristic: Characteristic,
    ) -> Result<bool, LinkError>;

    /// Write an already-encoded value
    async fn write_command(
        &self,
        handle: &mut Self::Handle,
        characteristic: Characteristic,
        value: &[u8],
    ) -> Result<Ack, LinkError>;

    /// Tear down the connection
    async fn disconnect(&self, handle: Self::Handle) -> Result<(), LinkError>;

    /// Human-readable name for this link
    fn name(&self) -> &'static str;
}
