//! Configuration types
//!
//! Bridge clocking and sensor bus settings. Both are plain data; the
//! binary fills them from its TOML file.

use caminit_hal::i2c::AckMode;
use caminit_protocol::{sck_frequency_hz, Command};
use heapless::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default 7-bit address of the IMX219
pub const DEFAULT_SENSOR_ADDRESS: u8 = 0x10;

/// Highest valid 7-bit address
pub const MAX_SEVEN_BIT_ADDRESS: u8 = 0x7F;

/// Maximum setup commands emitted by [`BridgeConfig::commands`]
pub const MAX_SETUP_COMMANDS: usize = 4;

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Device address does not fit in 7 bits
    AddressOutOfRange(u8),
}

/// MPSSE clock setup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct BridgeConfig {
    /// Divide the 60 MHz master clock by 5
    pub divide_by_5: bool,
    /// SK clock divisor
    pub clock_divisor: u16,
    /// Explicitly turn 3-phase data clocking off
    pub disable_three_phase: bool,
    /// Explicitly turn adaptive clocking off
    pub disable_adaptive: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            divide_by_5: true,
            clock_divisor: 0, // 6 MHz SK with divide-by-5
            disable_three_phase: false,
            disable_adaptive: false,
        }
    }
}

impl BridgeConfig {
    /// Setup commands, in the order they must be sent
    pub fn commands(&self) -> Vec<Command, MAX_SETUP_COMMANDS> {
        let mut commands = Vec::new();
        // Capacity covers the worst case, pushes cannot fail
        let _ = commands.push(Command::ClockDivideBy5(self.divide_by_5));
        if self.disable_three_phase {
            let _ = commands.push(Command::ThreePhaseClocking(false));
        }
        if self.disable_adaptive {
            let _ = commands.push(Command::AdaptiveClocking(false));
        }
        let _ = commands.push(Command::SetClockDivisor(self.clock_divisor));
        commands
    }

    /// Resulting SK frequency in Hz
    pub fn sck_frequency_hz(&self) -> u32 {
        sck_frequency_hz(self.clock_divisor, self.divide_by_5)
    }
}

/// Target device on the bit-banged bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct SensorBusConfig {
    /// 7-bit device address
    pub address: u8,
    /// Sample the acknowledge bit after every byte
    pub ack_check: bool,
}

impl Default for SensorBusConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_SENSOR_ADDRESS,
            ack_check: false,
        }
    }
}

impl SensorBusConfig {
    /// Acknowledge handling for this bus
    pub fn ack_mode(&self) -> AckMode {
        if self.ack_check {
            AckMode::Check
        } else {
            AckMode::Ignore
        }
    }

    /// Check the address fits in 7 bits
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.address > MAX_SEVEN_BIT_ADDRESS {
            return Err(ConfigError::AddressOutOfRange(self.address));
        }
        Ok(())
    }
}
