//! I2C start, byte and stop as fixed pin-state sequences
//!
//! ```text
//!          start      bit 7 .. bit 0         ack        stop
//! SDA  ‾‾‾‾\____ XXX|‾‾‾‾‾‾‾|XXX ... ‾‾‾‾‾‾‾‾‾‾‾‾‾ ______/‾‾‾
//! SCL  ‾‾‾‾‾‾\__ ____/‾‾‾\__ ... ____/‾‾‾\____ __/‾‾‾‾‾‾‾‾
//! ```
//!
//! SDA only moves while SCL is low, except in the start (falling SDA) and
//! stop (rising SDA) conditions.

use caminit_hal::gpio::{PinDriver, PinSampler, PinState};
use caminit_hal::i2c::{AckMode, I2cWrite};

use super::I2cError;

const fn pins(sda: u8, scl: u8) -> PinState {
    PinState::new(sda != 0, scl != 0)
}

/// Start condition: SDA falls while SCL is high, then SCL drops
pub const START: [PinState; 3] = [pins(1, 1), pins(0, 1), pins(0, 0)];

/// Stop condition: SCL rises with SDA low, then SDA rises
pub const STOP: [PinState; 3] = [pins(0, 0), pins(0, 1), pins(1, 1)];

/// Acknowledge clock with SDA driven high; never sampled
pub const ACK_SLOT: [PinState; 3] = [pins(1, 0), pins(1, 1), pins(1, 0)];

/// Pin states emitted by one byte: 8 data bits plus the ack slot
pub const BYTE_PIN_STATES: usize = 8 * 3 + ACK_SLOT.len();

/// Bit-banged I2C master on top of a [`PinDriver`]
///
/// The engine keeps no transaction state; callers are responsible for
/// pairing `start` with `stop`.
#[derive(Debug)]
pub struct BitBangI2c<P> {
    pins: P,
    ack: AckMode,
}

impl<P: PinDriver> BitBangI2c<P> {
    /// Create an engine that never samples the acknowledge bit
    pub fn new(pins: P) -> Self {
        Self {
            pins,
            ack: AckMode::Ignore,
        }
    }

    /// Consume the engine and return the pin driver
    pub fn into_inner(self) -> P {
        self.pins
    }

    /// Access the underlying pin driver
    pub fn pins_mut(&mut self) -> &mut P {
        &mut self.pins
    }

    /// Acknowledge handling in effect
    pub fn ack_mode(&self) -> AckMode {
        self.ack
    }

    fn drive(&mut self, states: &[PinState]) -> Result<(), P::Error> {
        for &state in states {
            self.pins.set_pins(state)?;
        }
        Ok(())
    }

    /// Generate a start condition
    pub fn start(&mut self) -> Result<(), P::Error> {
        self.drive(&START)
    }

    /// Generate a stop condition
    pub fn stop(&mut self) -> Result<(), P::Error> {
        self.drive(&STOP)
    }

    /// Clock out 8 data bits, MSB first, leaving SCL low
    fn send_bits(&mut self, value: u8) -> Result<(), P::Error> {
        for i in (0..8).rev() {
            let bit = (value >> i) & 1 != 0;
            self.pins.set_pins(PinState::new(bit, false))?;
            self.pins.set_pins(PinState::new(bit, true))?;
            self.pins.set_pins(PinState::new(bit, false))?;
        }
        Ok(())
    }

    /// Send one byte followed by an unsampled acknowledge clock
    ///
    /// Always emits [`BYTE_PIN_STATES`] pin states.
    pub fn send_byte(&mut self, value: u8) -> Result<(), P::Error> {
        self.send_bits(value)?;
        self.drive(&ACK_SLOT)
    }

    fn write_unchecked<I>(&mut self, address: u8, bytes: I) -> Result<(), P::Error>
    where
        I: IntoIterator<Item = u8>,
    {
        self.start()?;
        self.send_byte(address << 1)?;
        for byte in bytes {
            self.send_byte(byte)?;
        }
        self.stop()
    }
}

impl<P: PinSampler> BitBangI2c<P> {
    /// Create an engine with explicit acknowledge handling
    pub fn with_ack_mode(pins: P, ack: AckMode) -> Self {
        Self { pins, ack }
    }

    /// Send one byte and sample the acknowledge bit
    ///
    /// SDA is released for the ack slot so the device can pull it low.
    /// Returns `true` when the device acknowledged.
    pub fn send_byte_checked(&mut self, value: u8) -> Result<bool, P::Error> {
        self.send_bits(value)?;
        self.pins.release_sda(false)?;
        self.pins.release_sda(true)?;
        let sampled = self.pins.read_pins()?;
        self.pins.release_sda(false)?;
        Ok(!sampled.sda)
    }

    fn write_checked<I>(&mut self, address: u8, bytes: I) -> Result<(), I2cError<P::Error>>
    where
        I: IntoIterator<Item = u8>,
    {
        self.start().map_err(I2cError::Transport)?;
        let frame = core::iter::once(address << 1).chain(bytes);
        for (index, byte) in frame.enumerate() {
            let acked = self.send_byte_checked(byte).map_err(I2cError::Transport)?;
            if !acked {
                self.stop().map_err(I2cError::Transport)?;
                return Err(I2cError::Nack { byte: index });
            }
        }
        self.stop().map_err(I2cError::Transport)
    }

    /// Write one byte to a 16-bit register of a device
    ///
    /// start, `slave << 1` (write), register high, register low, value, stop.
    /// Stops at the first pin-driver failure without issuing anything else.
    /// In [`AckMode::Check`] a NACK ends the transaction with a stop.
    pub fn write_register(
        &mut self,
        slave: u8,
        register: u16,
        value: u8,
    ) -> Result<(), I2cError<P::Error>> {
        let [reg_high, reg_low] = register.to_be_bytes();
        self.write_bytes(slave, [reg_high, reg_low, value])
    }

    /// Write a byte sequence as one transaction, honouring the ack mode
    pub fn write_bytes<I>(&mut self, address: u8, bytes: I) -> Result<(), I2cError<P::Error>>
    where
        I: IntoIterator<Item = u8>,
    {
        match self.ack {
            AckMode::Ignore => self
                .write_unchecked(address, bytes)
                .map_err(I2cError::Transport),
            AckMode::Check => self.write_checked(address, bytes),
        }
    }
}

impl<P: PinSampler> I2cWrite for BitBangI2c<P> {
    type Error = I2cError<P::Error>;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error> {
        self.write_bytes(address, data.iter().copied())
    }
}
