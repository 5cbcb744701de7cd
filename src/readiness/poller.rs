use crate::error::{ReadinessError, ReadinessTimeoutError};
use crate::session::{Session, SessionManager};
use crate::transport::DeviceLink;
use gopro_ap_shared::state_machine::{ReadinessState, ReadinessStateMachine};
use gopro_ap_shared::{defaults, Characteristic};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Poll budget and cadence
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Maximum number of status samples
    pub max_attempts: u32,
    /// Delay between two samples
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::READY_POLLS,
            interval: Duration::from_millis(defaults::READY_POLL_INTERVAL_MS),
        }
    }
}

/// Waits for a status flag on an open session to turn true
pub struct ReadinessPoller {
    config: PollConfig,
}

impl ReadinessPoller {
    pub fn new(config: PollConfig) -> Self {
        Self { config }
    }

    /// Sample `characteristic` until it reads true.
    ///
    /// Returns the 1-based poll number that confirmed readiness. A failed read
    /// aborts polling immediately instead of counting as a "not ready" sample.
    pub async fn wait_until_ready<L: DeviceLink>(
        &self,
        manager: &SessionManager<L>,
        session: &mut Session<L::Handle>,
        characteristic: Characteristic,
    ) -> Result<u32, ReadinessError> {
        let mut fsm = ReadinessStateMachine::new(self.config.max_attempts);

        loop {
            let attempt = match fsm.state() {
                ReadinessState::Polling(n) => n,
                ReadinessState::Confirmed(n) => {
                    info!("[AP] {} confirmed (status poll #{})", characteristic, n);
                    return Ok(n);
                }
                ReadinessState::Exhausted(n) => {
                    warn!("[AP] {} still not ready after {} poll(s)", characteristic, n);
                    return Err(ReadinessTimeoutError {
                        characteristic,
                        attempts: n,
                    }
                    .into());
                }
            };

            let sample = manager
                .query_flag(session, characteristic)
                .await
                .map_err(|source| ReadinessError::Query { attempt, source })?;
            debug!(
                "[AP] Status poll #{}/{}: {}",
                attempt,
                fsm.max_attempts(),
                sample.data
            );

            if let ReadinessState::Polling(_) = fsm.observe(sample.data) {
                sleep(self.config.interval).await;
            }
        }
    }
}
