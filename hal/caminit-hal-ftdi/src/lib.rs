//! FTDI MPSSE bridge for caminit
//!
//! Implements `caminit_hal::Transport` on top of libftdi (through the `ftdi`
//! crate). Covers device discovery, the one-time MPSSE bring-up and
//! in-order command/reply transfer. Everything above raw bytes lives in
//! `caminit-core`.
//!
//! Reply reads poll the device until the configured I/O timeout expires;
//! USB-level timeouts from libftdi surface as `ErrorKind::Timeout` too.

#![deny(unsafe_code)]

pub mod bridge;
pub mod error;

pub use bridge::{DeviceConfig, FtdiBridge, Interface, FT232H_PID, FT2232H_PID, FTDI_VID};
pub use error::FtdiError;
