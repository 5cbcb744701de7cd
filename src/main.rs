//! gopro-ap - enable a camera's Wi-Fi access point over BLE.
//!
//! Opens a short BLE session with the camera, reads the AP credentials, turns
//! the AP on and waits until the camera reports it is broadcasting.

mod cli;
mod error;
mod readiness;
mod session;
mod transport;
mod workflow;

use anyhow::Context;
use clap::Parser;
use cli::Cli;
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use transport::GattLink;
use workflow::EnableAp;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Installed once, before the first operation
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::from(cli.log_level).into()))
        .try_init()
        .context("Failed to initialize logging")?;

    let workflow = EnableAp::new(GattLink::new(), cli.session_config(), cli.poll_config());

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("[MAIN] Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    match workflow.run(shutdown).await {
        Ok(creds) => {
            info!(
                "[MAIN] Wi-Fi AP is broadcasting. Connect your PC Wi-Fi interface to SSID '{}' with password '{}' to send HTTP commands.",
                creds.ssid, creds.password
            );
            info!("[MAIN] The camera will keep the AP on until you disable it or the camera powers down.");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => Ok(ExitCode::from(e.exit_code())),
    }
}
