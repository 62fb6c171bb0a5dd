//! Bridge Command Protocol
//!
//! This crate defines the byte-level command stream spoken to an FTDI
//! MPSSE engine that is used purely as a GPIO bit-banger. Nothing here
//! knows about I2C; it only describes what bytes make the bridge move
//! its pins and clocks.
//!
//! # Protocol Overview
//!
//! Commands are sent back to back on a single in-order byte stream:
//! ```text
//! ┌────────┬───────────┬───────────┐
//! │ OPCODE │ OPERAND 0 │ OPERAND 1 │
//! │ 1B     │ 0–1B      │ 0–1B      │
//! └────────┴───────────┴───────────┘
//! ```
//!
//! The bridge only talks back for read commands, or to reject an unknown
//! opcode with `0xFA <opcode>`.

#![no_std]
#![deny(unsafe_code)]

pub mod command;
pub mod rx;

pub use command::{
    divisor_for_frequency, opcode, sck_frequency_hz, Command, CommandError, MAX_COMMAND_SIZE,
};
pub use rx::{RxEvent, RxParser};
