//! Enable workflow
//!
//! open -> read SSID/password -> enable AP -> wait for AP -> close.
//! The session is closed on every exit path, including interruption.

use crate::error::{Error, Phase};
use crate::readiness::{PollConfig, ReadinessPoller};
use crate::session::{Session, SessionConfig, SessionManager};
use crate::transport::DeviceLink;
use gopro_ap_shared::codec::Command;
use gopro_ap_shared::Characteristic;
use std::cell::Cell;
use std::future::Future;
use tracing::{error, info, warn};

/// Credentials of the camera's now-broadcasting access point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApCredentials {
    pub ssid: String,
    pub password: String,
    /// Status poll that confirmed the AP
    pub ready_after: u32,
}

/// Enables the camera's Wi-Fi access point over one control session
pub struct EnableAp<L: DeviceLink> {
    manager: SessionManager<L>,
    poller: ReadinessPoller,
}

impl<L: DeviceLink> EnableAp<L> {
    pub fn new(link: L, session: SessionConfig, poll: PollConfig) -> Self {
        Self {
            manager: SessionManager::new(link, session),
            poller: ReadinessPoller::new(poll),
        }
    }

    /// Run the workflow until it finishes or `shutdown` resolves
    pub async fn run(&self, shutdown: impl Future<Output = ()>) -> Result<ApCredentials, Error> {
        tokio::pin!(shutdown);

        let mut session = tokio::select! {
            opened = self.manager.open() => match opened {
                Ok(session) => session,
                Err(e) => {
                    error!("[MAIN] {} failed: {}", Phase::Connect, e);
                    return Err(e.into());
                }
            },
            _ = &mut shutdown => {
                warn!("[MAIN] Interrupted during {}", Phase::Connect);
                return Err(Error::Interrupted(Phase::Connect));
            }
        };

        info!(
            "[MAIN] Connected to {} after {} attempt(s)",
            session.target(),
            session.attempts()
        );

        let phase = Cell::new(Phase::ReadCredentials);
        let outcome = tokio::select! {
            result = self.drive(&mut session, &phase) => result,
            _ = &mut shutdown => Err(Error::Interrupted(phase.get())),
        };

        if let Err(e) = &outcome {
            error!("[MAIN] {} failed: {}", phase.get(), e);
        }

        self.manager.close(&mut session).await;
        info!("[MAIN] BLE session closed.");

        outcome
    }

    async fn drive(
        &self,
        session: &mut Session<L::Handle>,
        phase: &Cell<Phase>,
    ) -> Result<ApCredentials, Error> {
        phase.set(Phase::ReadCredentials);
        let ssid = self.manager.query(session, Characteristic::WifiSsid).await?.data;
        let password = self
            .manager
            .query(session, Characteristic::WifiPassword)
            .await?
            .data;
        info!("[AP] Current camera Wi-Fi SSID: {}", ssid);
        info!("[AP] Current camera Wi-Fi password: {}", password);

        phase.set(Phase::EnableAp);
        info!("[AP] Enabling the camera Wi-Fi access point via BLE...");
        self.manager
            .command(session, &Command::enable_wifi_ap(true))
            .await?;

        phase.set(Phase::WaitForAp);
        let ready_after = self
            .poller
            .wait_until_ready(&self.manager, session, Characteristic::WifiApState)
            .await?;

        Ok(ApCredentials {
            ssid,
            password,
            ready_after,
        })
    }
}
