//! Bridge-agnostic bring-up logic for caminit
//!
//! This crate contains everything between the byte transport and the
//! sensor register table:
//!
//! - GPIO command encoder (pin states to MPSSE commands)
//! - Bit-banged I2C write engine, with optional acknowledge checking
//! - 16-bit register write protocol and ordered write sequences
//! - Bridge and sensor bus configuration types
//! - Session owning the transport for one bring-up run
//!
//! ```text
//!  RegisterWrite ──► BitBangI2c ──► GpioEncoder ──► Transport
//!   (reg, value)     (pin states)   (0x80 cmds)     (USB bytes)
//! ```

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod encoder;
pub mod i2c;
pub mod register;
pub mod session;

#[cfg(any(test, feature = "std"))]
pub mod testing;

pub use config::{BridgeConfig, ConfigError, SensorBusConfig, DEFAULT_SENSOR_ADDRESS};
pub use encoder::GpioEncoder;
pub use i2c::{BitBangI2c, I2cError};
pub use register::{write_register, write_sequence, RegisterWrite, SequenceError};
pub use session::BridgeSession;
