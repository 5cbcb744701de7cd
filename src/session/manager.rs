//! Session manager for the camera control channel
//!
//! Opens one session with bounded retries and a per-attempt timeout, issues
//! reads and writes against it, and tears it down exactly once.

use crate::error::{CommandError, ConnectionError, LinkError, QueryError};
use crate::transport::{Ack, DeviceLink};
use gopro_ap_shared::codec::Command;
use gopro_ap_shared::{defaults, Characteristic, DeviceTarget, StatusValue};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Configuration for opening a session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Camera to connect to
    pub target: DeviceTarget,
    /// Upper bound for a single scan/connect attempt
    pub attempt_timeout: Duration,
    /// Attempts allowed after the first one fails
    pub max_retries: u32,
    /// Pause between two attempts
    pub retry_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            target: DeviceTarget::any(),
            attempt_timeout: Duration::from_secs(defaults::ATTEMPT_TIMEOUT_SECS),
            max_retries: defaults::CONNECT_RETRIES,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// Whether a session can still carry requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Closed,
}

/// One open control-channel connection
pub struct Session<H> {
    handle: Option<H>,
    target: DeviceTarget,
    /// Connection attempts it took to open
    attempts: u32,
}

impl<H> Session<H> {
    /// Open until `close` releases the handle
    pub fn state(&self) -> SessionState {
        if self.handle.is_some() {
            SessionState::Open
        } else {
            SessionState::Closed
        }
    }

    /// Shorthand for `state() == SessionState::Open`
    pub fn is_open(&self) -> bool {
        self.state() == SessionState::Open
    }

    /// Camera this session was opened against
    pub fn target(&self) -> &DeviceTarget {
        &self.target
    }

    /// Connection attempts it took to open, 1-based
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

impl<H> Drop for Session<H> {
    fn drop(&mut self) {
        if self.handle.is_some() {
            warn!("[SESSION] Session with {} dropped without close", self.target);
        }
    }
}

/// Owns the device link and the session discipline around it
pub struct SessionManager<L: DeviceLink> {
    link: L,
    config: SessionConfig,
}

impl<L: DeviceLink> SessionManager<L> {
    pub fn new(link: L, config: SessionConfig) -> Self {
        Self { link, config }
    }

    /// Open a session, retrying up to `max_retries` times
    pub async fn open(&self) -> Result<Session<L::Handle>, ConnectionError> {
        let max_attempts = self.config.max_retries.saturating_add(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            info!(
                "[SESSION] Connecting to {} via {} (attempt {}/{})",
                self.config.target,
                self.link.name(),
                attempt,
                max_attempts
            );

            match self.try_connect().await {
                Ok(handle) => {
                    info!("[SESSION] Session open after {} attempt(s)", attempt);
                    return Ok(Session {
                        handle: Some(handle),
                        target: self.config.target.clone(),
                        attempts: attempt,
                    });
                }
                Err(e) if attempt < max_attempts => {
                    warn!("[SESSION] Attempt {}/{} failed: {}", attempt, max_attempts, e);
                    tokio::time::sleep(self.config.retry_delay).await;
                }
                Err(e) => {
                    return Err(ConnectionError {
                        target: self.config.target.to_string(),
                        attempts: attempt,
                        last: e,
                    });
                }
            }
        }
    }

    /// One fresh discovery/connect cycle, cancelled at the attempt timeout.
    /// Cancellation drops the connect future, which releases what it opened.
    async fn try_connect(&self) -> Result<L::Handle, LinkError> {
        let limit = self.config.attempt_timeout;
        match timeout(limit, self.link.connect(&self.config.target, limit)).await {
            Ok(result) => result,
            Err(_) => Err(LinkError::Timeout(limit)),
        }
    }

    /// Read a string setting
    pub async fn query(
        &self,
        session: &mut Session<L::Handle>,
        characteristic: Characteristic,
    ) -> Result<StatusValue<String>, QueryError> {
        let handle = session
            .handle
            .as_mut()
            .ok_or(QueryError::NotOpen(characteristic))?;

        let data = self
            .link
            .read_string(handle, characteristic)
            .await
            .map_err(|source| QueryError::Failed {
                characteristic,
                source,
            })?;

        debug!("[SESSION] Read {}", characteristic);
        Ok(StatusValue::new(data))
    }

    /// Read a boolean status flag
    pub async fn query_flag(
        &self,
        session: &mut Session<L::Handle>,
        characteristic: Characteristic,
    ) -> Result<StatusValue<bool>, QueryError> {
        let handle = session
            .handle
            .as_mut()
            .ok_or(QueryError::NotOpen(characteristic))?;

        let data = self
            .link
            .read_bool(handle, characteristic)
            .await
            .map_err(|source| QueryError::Failed {
                characteristic,
                source,
            })?;

        Ok(StatusValue::new(data))
    }

    /// Issue a state-changing request.
    ///
    /// Returns once the camera accepted the write; the transition itself
    /// completes asynchronously.
    pub async fn command(
        &self,
        session: &mut Session<L::Handle>,
        command: &Command,
    ) -> Result<Ack, CommandError> {
        let characteristic = command.characteristic;
        let handle = session
            .handle
            .as_mut()
            .ok_or(CommandError::NotOpen(characteristic))?;

        let value = command.encode()?;
        debug!("[SESSION] Writing {:02x?} to {}", value.as_ref(), characteristic);

        self.link
            .write_command(handle, characteristic, &value)
            .await
            .map_err(|source| CommandError::Rejected {
                characteristic,
                source,
            })
    }

    /// Release the session. Closing a closed session does nothing.
    pub async fn close(&self, session: &mut Session<L::Handle>) {
        let Some(handle) = session.handle.take() else {
            debug!("[SESSION] Session already closed");
            return;
        };

        match self.link.disconnect(handle).await {
            Ok(()) => info!("[SESSION] Session with {} closed", session.target),
            Err(e) => warn!("[SESSION] Teardown of {} reported: {}", session.target, e),
        }
    }
}
