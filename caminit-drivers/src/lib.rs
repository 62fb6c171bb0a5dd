//! Sensor drivers for caminit
//!
//! Register maps and bring-up sequences for the image sensors caminit can
//! configure. Sequences are plain iterators of
//! [`RegisterWrite`](caminit_core::RegisterWrite); running them over a bus
//! is left to `caminit_core::BridgeSession`.
//!
//! - Sony IMX219 (640×480 preview, test patterns, analog gain)

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod sensor;
