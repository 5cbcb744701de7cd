//! Scripted in-memory link for exercising the session layer without hardware

use crate::error::LinkError;
use crate::transport::guard::ConnectGuard;
use crate::transport::traits::{Ack, DeviceLink};
use async_trait::async_trait;
use gopro_ap_shared::{Characteristic, DeviceTarget};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How a scripted connection attempt behaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    Succeed,
    /// Report a timeout straight away
    TimedOut,
    /// Report that no camera was found
    NotFound,
    /// Never complete; the caller's timeout has to cancel it
    Hang,
    /// Open a connection, then stall before handing it over
    HalfOpen,
}

/// Handle to a mock connection
#[derive(Debug)]
pub struct MockHandle {
    connection_id: u32,
}

#[derive(Default)]
struct Inner {
    connects: Mutex<VecDeque<ConnectOutcome>>,
    ap_states: Mutex<VecDeque<Result<bool, String>>>,
    connect_attempts: AtomicU32,
    string_reads: AtomicU32,
    status_reads: AtomicU32,
    disconnects: AtomicU32,
    reject_writes: AtomicBool,
    fail_disconnect: AtomicBool,
    writes: Mutex<Vec<(Characteristic, Vec<u8>)>>,
    /// Connections opened and not yet released
    live: Mutex<HashSet<u32>>,
}

/// Cloneable so a test can keep a handle while the session manager owns the link
#[derive(Clone, Default)]
pub struct MockLink {
    inner: Arc<Inner>,
}

impl MockLink {
    /// Link whose connects succeed and whose AP never comes up
    pub fn new() -> Self {
        Self::default()
    }

    /// Script connection attempts in order; unscripted attempts succeed
    pub fn with_connects(self, outcomes: impl IntoIterator<Item = ConnectOutcome>) -> Self {
        self.inner.connects.lock().unwrap().extend(outcomes);
        self
    }

    /// Script AP state samples in order; unscripted samples report not ready
    pub fn with_ap_states(self, states: impl IntoIterator<Item = bool>) -> Self {
        self.inner
            .ap_states
            .lock()
            .unwrap()
            .extend(states.into_iter().map(Ok));
        self
    }

    /// Make the next unscripted AP state sample fail
    pub fn with_ap_state_error(self, message: &str) -> Self {
        self.inner
            .ap_states
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    pub fn rejecting_writes(self) -> Self {
        self.inner.reject_writes.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing_disconnect(self) -> Self {
        self.inner.fail_disconnect.store(true, Ordering::SeqCst);
        self
    }

    pub fn connect_attempts(&self) -> u32 {
        self.inner.connect_attempts.load(Ordering::SeqCst)
    }

    pub fn string_reads(&self) -> u32 {
        self.inner.string_reads.load(Ordering::SeqCst)
    }

    pub fn status_reads(&self) -> u32 {
        self.inner.status_reads.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> u32 {
        self.inner.disconnects.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> Vec<(Characteristic, Vec<u8>)> {
        self.inner.writes.lock().unwrap().clone()
    }

    pub fn live_connections(&self) -> usize {
        self.inner.live.lock().unwrap().len()
    }
}

#[async_trait]
impl DeviceLink for MockLink {
    type Handle = MockHandle;

    async fn connect(&self, target: &DeviceTarget, timeout: Duration) -> Result<MockHandle, LinkError> {
        let connection_id = self.inner.connect_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let outcome = self
            .inner
            .connects
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ConnectOutcome::Succeed);

        match outcome {
            ConnectOutcome::TimedOut => return Err(LinkError::Timeout(timeout)),
            ConnectOutcome::NotFound => return Err(LinkError::NotFound(target.to_string())),
            ConnectOutcome::Hang => return std::future::pending().await,
            ConnectOutcome::Succeed | ConnectOutcome::HalfOpen => {}
        }

        self.inner.live.lock().unwrap().insert(connection_id);
        let guard = ConnectGuard::new({
            let inner = Arc::clone(&self.inner);
            move || {
                inner.live.lock().unwrap().remove(&connection_id);
            }
        });

        if outcome == ConnectOutcome::HalfOpen {
            std::future::pending::<()>().await;
        }

        guard.disarm();
        Ok(MockHandle { connection_id })
    }

    async fn read_string(
        &self,
        _handle: &mut MockHandle,
        characteristic: Characteristic,
    ) -> Result<String, LinkError> {
        self.inner.string_reads.fetch_add(1, Ordering::SeqCst);
        match characteristic {
            Characteristic::WifiSsid => Ok("GP24501234".into()),
            Characteristic::WifiPassword => Ok("mock-pass-1234".into()),
            other => Err(LinkError::Rejected(format!("{} is not a string", other))),
        }
    }

    async fn read_bool(
        &self,
        _handle: &mut MockHandle,
        _characteristic: Characteristic,
    ) -> Result<bool, LinkError> {
        self.inner.status_reads.fetch_add(1, Ordering::SeqCst);
        match self.inner.ap_states.lock().unwrap().pop_front() {
            Some(Ok(ready)) => Ok(ready),
            Some(Err(message)) => Err(LinkError::Rejected(message)),
            None => Ok(false),
        }
    }

    async fn write_command(
        &self,
        _handle: &mut MockHandle,
        characteristic: Characteristic,
        value: &[u8],
    ) -> Result<Ack, LinkError> {
        if self.inner.reject_writes.load(Ordering::SeqCst) {
            return Err(LinkError::Rejected("write not permitted".into()));
        }
        self.inner
            .writes
            .lock()
            .unwrap()
            .push((characteristic, value.to_vec()));
        Ok(Ack { characteristic })
    }

    async fn disconnect(&self, handle: MockHandle) -> Result<(), LinkError> {
        self.inner.disconnects.fetch_add(1, Ordering::SeqCst);
        self.inner.live.lock().unwrap().remove(&handle.connection_id);
        if self.inner.fail_disconnect.load(Ordering::SeqCst) {
            return Err(LinkError::Rejected("already gone".into()));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
