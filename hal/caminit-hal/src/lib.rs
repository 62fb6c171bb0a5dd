//! caminit Hardware Abstraction Layer
//!
//! This crate defines the seams between the bit-bang I2C engine and the
//! bridge hardware. Host-side bridge crates (libftdi, ...) implement
//! [`Transport`]; the core crate builds pin drivers and I2C on top of it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  caminit (binary)                       │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  caminit-core: register writes, I2C,    │
//! │  GPIO command encoder                   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  caminit-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  caminit-hal-ftdi                       │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`transport::Transport`] - In-order byte stream to the bridge
//! - [`gpio::PinDriver`], [`gpio::PinSampler`] - SDA/SCL line control
//! - [`i2c::I2cWrite`] - I2C write transactions

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod i2c;
pub mod transport;

// Re-export key traits at crate root for convenience
pub use gpio::{PinDriver, PinSampler, PinState};
pub use i2c::{AckMode, I2cWrite};
pub use transport::{Error, ErrorKind, Transport};
