//! GATT link to a camera over BlueZ

use crate::error::LinkError;
use crate::transport::bt_discovery;
use crate::transport::guard::ConnectGuard;
use crate::transport::traits::{Ack, DeviceLink};
use async_trait::async_trait;
use bluer::gatt::remote::Characteristic as RemoteCharacteristic;
use bluer::{Address, Device};
use bytes::Bytes;
use gopro_ap_shared::{codec, Characteristic, DeviceTarget};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

/// Share of an attempt spent scanning
const SCAN_SHARE: f64 = 0.5;
/// Share of an attempt kept back for disconnecting after a failure
const TEARDOWN_SHARE: f64 = 0.1;

/// An open GATT connection with the Wi-Fi characteristics resolved
pub struct GattHandle {
    device: Device,
    name: String,
    characteristics: HashMap<Characteristic, RemoteCharacteristic>,
}

impl GattHandle {
    fn characteristic(&self, characteristic: Characteristic) -> Result<&RemoteCharacteristic, LinkError> {
        self.characteristics
            .get(&characteristic)
            .ok_or_else(|| LinkError::MissingCharacteristics(vec![characteristic]))
    }
}

/// BLE control channel backed by the system's default adapter
#[derive(Debug, Default)]
pub struct GattLink {
    /// Cameras whose last connection attempt failed
    failed: Mutex<HashSet<Address>>,
}

impl GattLink {
    pub fn new() -> Self {
        Self::default()
    }

    fn failed_addresses(&self) -> HashSet<Address> {
        self.failed.lock().map(|failed| failed.clone()).unwrap_or_default()
    }

    fn record_attempt(&self, address: Address, succeeded: bool) {
        if let Ok(mut failed) = self.failed.lock() {
            if succeeded {
                failed.remove(&address);
            } else {
                failed.insert(address);
            }
        }
    }
}

/// Split an attempt into the scan budget and the deadline offset for
/// connect, pair and the service walk
fn attempt_budget(timeout: Duration) -> (Duration, Duration) {
    (
        timeout.mul_f64(SCAN_SHARE),
        timeout.mul_f64(1.0 - TEARDOWN_SHARE),
    )
}

/// Disconnect a device whose attempt was dropped before it could clean up
fn release_abandoned(device: Device) {
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        warn!("[BLE] No runtime left to release {}", device.address());
        return;
    };
    runtime.spawn(async move {
        debug!("[BLE] Releasing abandoned connection to {}", device.address());
        if let Err(e) = device.disconnect().await {
            debug!("[BLE] Release of {} failed: {}", device.address(), e);
        }
    });
}

#[async_trait]
impl DeviceLink for GattLink {
    type Handle = GattHandle;

    async fn connect(&self, target: &DeviceTarget, timeout: Duration) -> Result<GattHandle, LinkError> {
        let (scan_duration, open_within) = attempt_budget(timeout);
        let deadline = Instant::now() + open_within;

        info!("[BLE] Scanning for {} ...", target);
        let (adapter, camera) =
            bt_discovery::discover(target, scan_duration, self.failed_addresses()).await?;
        let camera = camera.ok_or_else(|| LinkError::NotFound(target.to_string()))?;

        info!(
            "[BLE] Connecting to {} at {} (rssi {:?})",
            camera.name, camera.address, camera.rssi
        );
        let device = adapter.device(camera.address)?;

        // Covers the attempt being dropped by the caller's timeout or an interrupt
        let guard = ConnectGuard::new({
            let device = device.clone();
            move || release_abandoned(device)
        });

        let opened = match timeout_at(deadline, open_device(&device)).await {
            Ok(result) => result,
            Err(_) => Err(LinkError::Timeout(timeout)),
        };

        match opened {
            Ok(characteristics) => {
                guard.disarm();
                self.record_attempt(camera.address, true);
                info!("[BLE] BLE connection established with {}", camera.name);
                Ok(GattHandle {
                    device,
                    name: camera.name,
                    characteristics,
                })
            }
            Err(e) => {
                self.record_attempt(camera.address, false);
                // Next attempt starts from a clean slate
                if let Err(disconnect_err) = device.disconnect().await {
                    debug!("[BLE] Cleanup disconnect failed: {}", disconnect_err);
                }
                guard.disarm();
                Err(e)
            }
        }
    }

    async fn read_string(
        &self,
        handle: &mut GattHandle,
        characteristic: Characteristic,
    ) -> Result<String, LinkError> {
        let raw = Bytes::from(handle.characteristic(characteristic)?.read().await?);
        Ok(codec::decode_string(characteristic, raw)?)
    }

    async fn read_bool(
        &self,
        handle: &mut GattHandle,
        characteristic: Characteristic,
    ) -> Result<bool, LinkError> {
        let raw = Bytes::from(handle.characteristic(characteristic)?.read().await?);
        debug!("[BLE] {} raw value: {:02x?}", characteristic, raw.as_ref());
        Ok(codec::decode_flag(characteristic, raw)?)
    }

    async fn write_command(
        &self,
        handle: &mut GattHandle,
        characteristic: Characteristic,
        value: &[u8],
    ) -> Result<Ack, LinkError> {
        handle
            .characteristic(characteristic)?
            .write(value)
            .await
            .map_err(|e| LinkError::Rejected(e.to_string()))?;
        Ok(Ack { characteristic })
    }

    async fn disconnect(&self, handle: GattHandle) -> Result<(), LinkError> {
        debug!("[BLE] Disconnecting from {}", handle.name);
        handle.device.disconnect().await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "BLE"
    }
}

/// Connect, pair if needed and resolve the Wi-Fi characteristics
async fn open_device(device: &Device) -> Result<HashMap<Characteristic, RemoteCharacteristic>, LinkError> {
    if !device.is_connected().await? {
        device
            .connect()
            .await
            .map_err(|e| LinkError::Handshake(format!("connect: {}", e)))?;
    }

    if !device.is_paired().await? {
        info!("[BLE] Pairing with {}", device.address());
        device
            .pair()
            .await
            .map_err(|e| LinkError::Handshake(format!("pair: {}", e)))?;
    }

    resolve_characteristics(device).await
}

async fn resolve_characteristics(
    device: &Device,
) -> Result<HashMap<Characteristic, RemoteCharacteristic>, LinkError> {
    let mut found = HashMap::new();

    let services = device.services().await?;
    debug!("[BLE] Found {} services", services.len());

    for service in services {
        debug!("[BLE] Checking service: {}", service.uuid().await?);
        for remote in service.characteristics().await? {
            let uuid = remote.uuid().await?;
            if let Some(known) = Characteristic::from_uuid_u128(uuid.as_u128()) {
                debug!("[BLE]   - {} -> {}", uuid, known);
                found.insert(known, remote);
            }
        }
    }

    let missing: Vec<Characteristic> = Characteristic::REQUIRED
        .into_iter()
        .filter(|c| !found.contains_key(c))
        .collect();

    if !missing.is_empty() {
        for c in Characteristic::REQUIRED {
            let status = if found.contains_key(&c) { "OK" } else { "MISSING" };
            warn!("[BLE]   {}: {}", c, status);
        }
        return Err(LinkError::MissingCharacteristics(missing));
    }

    Ok(found)
}
