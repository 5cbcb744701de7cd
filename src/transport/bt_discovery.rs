//! Bluetooth device discovery for finding cameras in pairing mode

use bluer::{Adapter, Address, Device};
use futures::StreamExt;
use gopro_ap_shared::DeviceTarget;
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info};

/// Information about a discovered camera
#[derive(Debug, Clone)]
pub struct CameraDevice {
    /// Bluetooth MAC address
    pub address: Address,
    /// Advertised name, e.g. `GoPro 1234`
    pub name: String,
    /// Signal strength, only present while the camera is advertising
    pub rssi: Option<i16>,
    /// Already connected to this host
    pub connected: bool,
}

impl CameraDevice {
    /// Seen advertising during the current discovery
    pub fn is_advertising(&self) -> bool {
        self.rssi.is_some()
    }

    /// Whether a device BlueZ already knows can be used without a scan.
    ///
    /// Cached entries outlive the camera being in range, so a known device
    /// counts only while connected, or while advertising if the previous
    /// attempt against it did not fail.
    pub fn is_usable_known(&self, failed: &HashSet<Address>) -> bool {
        self.connected || (self.is_advertising() && !failed.contains(&self.address))
    }
}

/// Bluetooth discovery for one camera target
pub struct BtDiscovery {
    target: DeviceTarget,
    scan_duration: Duration,
    /// Addresses whose last connection attempt failed
    failed: HashSet<Address>,
}

impl BtDiscovery {
    pub fn new(target: DeviceTarget, scan_duration: Duration) -> Self {
        Self {
            target,
            scan_duration,
            failed: HashSet::new(),
        }
    }

    /// Do not trust these known devices without seeing them in a scan
    pub fn with_failed(mut self, failed: HashSet<Address>) -> Self {
        self.failed = failed;
        self
    }

    /// Get the default Bluetooth adapter
    pub async fn get_adapter() -> bluer::Result<Adapter> {
        let session = bluer::Session::new().await?;
        let adapter = session.default_adapter().await?;
        adapter.set_powered(true).await?;
        Ok(adapter)
    }

    /// Find the first camera matching the target.
    ///
    /// Known devices are used straight away only when they are live; anything
    /// else has to show up advertising during a fresh scan.
    pub async fn find_camera(&self, adapter: &Adapter) -> bluer::Result<Option<CameraDevice>> {
        for addr in adapter.device_addresses().await? {
            if let Some(camera) = self.check_device(adapter, addr).await {
                if camera.is_usable_known(&self.failed) {
                    debug!("[BLE] Using known device {}", camera.address);
                    return Ok(Some(camera));
                }
                debug!("[BLE] Known device {} is not live, scanning instead", camera.address);
            }
        }

        // Property changes are reported too, so cached cameras that start
        // advertising again show up here
        let discover = adapter.discover_devices_with_changes().await?;
        tokio::pin!(discover);

        let scan_result = timeout(self.scan_duration, async {
            while let Some(evt) = discover.next().await {
                if let bluer::AdapterEvent::DeviceAdded(addr) = evt {
                    if let Some(camera) = self.check_device(adapter, addr).await {
                        if camera.is_advertising() || camera.connected {
                            info!("[BLE] Found camera: {} ({})", camera.name, addr);
                            return Some(camera);
                        }
                    }
                }
            }
            None
        })
        .await;

        match scan_result {
            Ok(found) => Ok(found),
            Err(_) => {
                info!("[BLE] Discovery scan completed without a match");
                Ok(None)
            }
        }
    }

    async fn check_device(&self, adapter: &Adapter, addr: Address) -> Option<CameraDevice> {
        let device = adapter.device(addr).ok()?;
        let name = device_name(&device).await?;
        if !self.target.matches_name(&name) {
            return None;
        }

        Some(CameraDevice {
            address: addr,
            name,
            rssi: device.rssi().await.ok().flatten(),
            connected: device.is_connected().await.unwrap_or(false),
        })
    }
}

async fn device_name(device: &Device) -> Option<String> {
    match device.name().await {
        Ok(Some(name)) => Some(name),
        _ => device.alias().await.ok(),
    }
}

/// Power on the default adapter and look for `target`
pub async fn discover(
    target: &DeviceTarget,
    scan_duration: Duration,
    failed: HashSet<Address>,
) -> bluer::Result<(Adapter, Option<CameraDevice>)> {
    let adapter = BtDiscovery::get_adapter().await?;
    let discovery = BtDiscovery::new(target.clone(), scan_duration).with_failed(failed);
    let camera = discovery.find_camera(&adapter).await?;
    Ok((adapter, camera))
}
