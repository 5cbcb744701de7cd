//! CLI argument definitions using clap

use crate::readiness::PollConfig;
use crate::session::SessionConfig;
use clap::{Parser, ValueEnum};
use gopro_ap_shared::{defaults, DeviceTarget};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "gopro-ap")]
#[command(
    author,
    version,
    about = "Use BLE to turn on the camera's Wi-Fi AP and show the SSID/password",
    long_about = "Use BLE to turn on the camera's Wi-Fi AP (GPxxxx) and show the SSID/password \
                  so the host can join that network for HTTP control."
)]
pub struct Cli {
    /// Last 4 digits of the camera serial (default: first camera in pairing mode)
    #[arg(long)]
    pub serial: Option<String>,

    /// Seconds to wait per BLE attempt
    #[arg(long, default_value_t = defaults::ATTEMPT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// How many BLE scan/connect retries before failing
    #[arg(long, default_value_t = defaults::CONNECT_RETRIES)]
    pub retries: u32,

    /// Max polls for the AP mode status
    #[arg(
        long = "ready-polls",
        default_value_t = defaults::READY_POLLS,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub ready_polls: u32,

    /// Log verbosity
    #[arg(long = "log-level", value_enum, ignore_case = true, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
}

/// Verbosity names accepted by `--log-level`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warning => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

impl Cli {
    /// Camera to look for; no serial means the first one advertising
    pub fn target(&self) -> DeviceTarget {
        match &self.serial {
            Some(serial) => DeviceTarget::with_serial(serial.as_str()),
            None => DeviceTarget::any(),
        }
    }

    /// Session settings from `--serial`, `--timeout` and `--retries`
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            target: self.target(),
            attempt_timeout: Duration::from_secs(self.timeout),
            max_retries: self.retries,
            ..Default::default()
        }
    }

    /// Poll settings from `--ready-polls`
    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            max_attempts: self.ready_polls,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["gopro-ap"]).unwrap();
        assert_eq!(cli.serial, None);
        assert_eq!(cli.timeout, 15);
        assert_eq!(cli.retries, 5);
        assert_eq!(cli.ready_polls, 25);
        assert_eq!(cli.log_level, LogLevel::Info);
        assert_eq!(cli.target(), DeviceTarget::any());
    }

    #[test]
    fn test_flags_map_to_configs() {
        let cli = Cli::try_parse_from([
            "gopro-ap",
            "--serial",
            "1234",
            "--timeout",
            "30",
            "--retries",
            "2",
            "--ready-polls",
            "10",
            "--log-level",
            "DEBUG",
        ])
        .unwrap();

        let session = cli.session_config();
        assert_eq!(session.target, DeviceTarget::with_serial("1234"));
        assert_eq!(session.attempt_timeout, Duration::from_secs(30));
        assert_eq!(session.max_retries, 2);

        let poll = cli.poll_config();
        assert_eq!(poll.max_attempts, 10);
        assert_eq!(poll.interval, Duration::from_millis(200));

        assert_eq!(tracing::Level::from(cli.log_level), tracing::Level::DEBUG);
    }

    #[test]
    fn test_warning_level_accepted() {
        let cli = Cli::try_parse_from(["gopro-ap", "--log-level", "WARNING"]).unwrap();
        assert_eq!(tracing::Level::from(cli.log_level), tracing::Level::WARN);
    }

    #[test]
    fn test_rejects_zero_ready_polls() {
        assert!(Cli::try_parse_from(["gopro-ap", "--ready-polls", "0"]).is_err());
    }

    #[test]
    fn test_rejects_unknown_log_level() {
        assert!(Cli::try_parse_from(["gopro-ap", "--log-level", "TRACE"]).is_err());
    }
}
