//! Error taxonomy for the enable workflow

use gopro_ap_shared::codec::CodecError;
use gopro_ap_shared::Characteristic;
use std::time::Duration;
use thiserror::Error;

/// Failure reported by a `DeviceLink` operation
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("No camera matching {0} found")]
    NotFound(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Handshake failed: {0}")]
    Handshake(String),

    #[error("Missing characteristics: {}", .0.iter().map(|c| c.to_string()).collect::<Vec<_>>().join(", "))]
    MissingCharacteristics(Vec<Characteristic>),

    #[error("Device rejected request: {0}")]
    Rejected(String),

    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] bluer::Error),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// The camera could not be reached within the retry budget
#[derive(Error, Debug)]
#[error("Failed to connect to {target} after {attempts} attempt(s): {last}")]
pub struct ConnectionError {
    pub target: String,
    pub attempts: u32,
    #[source]
    pub last: LinkError,
}

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Cannot read {0}: session is not open")]
    NotOpen(Characteristic),

    #[error("Reading {characteristic} failed: {source}")]
    Failed {
        characteristic: Characteristic,
        #[source]
        source: LinkError,
    },
}

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Cannot write {0}: session is not open")]
    NotOpen(Characteristic),

    #[error("Malformed command: {0}")]
    Malformed(#[from] CodecError),

    #[error("Camera rejected write to {characteristic}: {source}")]
    Rejected {
        characteristic: Characteristic,
        #[source]
        source: LinkError,
    },
}

/// The status flag never turned true within the poll budget
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{characteristic} not ready after {attempts} poll(s)")]
pub struct ReadinessTimeoutError {
    pub characteristic: Characteristic,
    pub attempts: u32,
}

#[derive(Error, Debug)]
pub enum ReadinessError {
    #[error(transparent)]
    Timeout(#[from] ReadinessTimeoutError),

    /// A status read failed; polling stops at that attempt
    #[error("Status poll #{attempt} failed: {source}")]
    Query {
        attempt: u32,
        #[source]
        source: QueryError,
    },
}

/// Phase of the workflow, used for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Connect,
    ReadCredentials,
    EnableAp,
    WaitForAp,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Connect => write!(f, "connect"),
            Phase::ReadCredentials => write!(f, "read credentials"),
            Phase::EnableAp => write!(f, "enable AP"),
            Phase::WaitForAp => write!(f, "wait for AP"),
        }
    }
}

/// Fatal error of one run
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Readiness(#[from] ReadinessError),

    #[error("Interrupted during {0}")]
    Interrupted(Phase),
}

impl Error {
    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Connection(_) => 2,
            Error::Query(_) => 3,
            Error::Command(_) => 4,
            Error::Readiness(_) => 5,
            Error::Interrupted(_) => 130,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct_and_nonzero() {
        let errors = [
            Error::Connection(ConnectionError {
                target: "GoPro *1234".into(),
                attempts: 3,
                last: LinkError::Timeout(Duration::from_secs(15)),
            }),
            Error::Query(QueryError::NotOpen(Characteristic::WifiSsid)),
            Error::Command(CommandError::NotOpen(Characteristic::WifiApEnable)),
            Error::Readiness(ReadinessError::Timeout(ReadinessTimeoutError {
                characteristic: Characteristic::WifiApState,
                attempts: 10,
            })),
            Error::Interrupted(Phase::Connect),
        ];
        let mut codes: Vec<u8> = errors.iter().map(Error::exit_code).collect();
        assert!(codes.iter().all(|&c| c != 0));
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_messages_carry_context() {
        let err = ConnectionError {
            target: "GoPro *1234".into(),
            attempts: 3,
            last: LinkError::NotFound("GoPro *1234".into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("3 attempt"));
        assert!(msg.contains("GoPro *1234"));

        let missing = LinkError::MissingCharacteristics(vec![
            Characteristic::WifiSsid,
            Characteristic::WifiApState,
        ]);
        assert_eq!(
            missing.to_string(),
            "Missing characteristics: Wi-Fi SSID, Wi-Fi AP state"
        );
    }
}
