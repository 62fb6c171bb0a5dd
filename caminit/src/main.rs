//! caminit - IMX219 bring-up over an FTDI bridge
//!
//! Opens an FT2232H/FT232H, turns two low-byte GPIO lines into a software
//! I2C bus and writes the IMX219 preview configuration, ending with
//! stream-on.
//!
//! Usage: `caminit [CONFIG.toml]`
//!
//! Exits with status 2 on any failure, after draining and logging whatever
//! the bridge sent back.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use caminit_core::BridgeSession;
use caminit_hal_ftdi::FtdiBridge;
use caminit_protocol::RxEvent;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::CaminitConfig;

mod config;

#[cfg(test)]
#[path = "../build_support.rs"]
mod build_support;

/// Exit status for any failed run
const EXIT_FAILURE: u8 = 2;

fn main() -> ExitCode {
    init_logging();
    info!("init..");

    let path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = match config::load(path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    let bridge = match FtdiBridge::open(&config.device.device_config()) {
        Ok(bridge) => bridge,
        Err(e) => {
            error!("{:#}", anyhow::Error::new(e));
            error!("ABORT.");
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    let mut session = BridgeSession::new(bridge);
    let outcome = run(&mut session, &config);

    if let Err(e) = &outcome {
        error!("{:#}", e);
        drain_rx(&mut session);
        error!("ABORT.");
    }

    // Both paths restore the saved latency timer
    if let Err(e) = session.into_transport().close() {
        warn!(error = %e, "failed to close bridge");
    }

    match outcome {
        Ok(count) => {
            info!(writes = count, "sensor streaming");
            ExitCode::SUCCESS
        }
        Err(_) => ExitCode::from(EXIT_FAILURE),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Configure the bridge clock and write the full sensor sequence
fn run(session: &mut BridgeSession<FtdiBridge>, config: &CaminitConfig) -> Result<usize> {
    session
        .configure(&config.bridge)
        .context("failed to configure MPSSE clock")?;
    info!(
        sck_hz = config.bridge.sck_frequency_hz(),
        "bridge in MPSSE mode"
    );

    let bus = config.sensor.bus();
    let sequence = config
        .sensor
        .imx219()
        .init_sequence(&config.sensor.extra_writes);

    let count = session.write_sequence(&bus, sequence, |_, write| {
        info!("cam[0x{:04X}] <= 0x{:02X}", write.address, write.value);
    })?;

    Ok(count)
}

/// Log anything the bridge sent back unasked
fn drain_rx(session: &mut BridgeSession<FtdiBridge>) {
    let drained = session.drain_rx(|event| match event {
        RxEvent::BadCommand(opcode) => error!("bridge rejected opcode 0x{:02X}", opcode),
        RxEvent::Unexpected(byte) => error!("unexpected rx byte: {:02X}", byte),
    });
    if let Err(e) = drained {
        warn!(error = %e, "could not drain rx");
    }
}
