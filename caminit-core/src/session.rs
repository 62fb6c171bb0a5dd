//! Bridge session
//!
//! Owns the transport for the lifetime of a bring-up run. Every engine
//! operation borrows the session, so exactly one command stream is ever
//! in flight and commands reach the bridge in program order.

use caminit_hal::gpio::{PinDriver, PinState};
use caminit_hal::Transport;
use caminit_protocol::{RxEvent, RxParser};

use crate::config::{BridgeConfig, SensorBusConfig};
use crate::encoder::GpioEncoder;
use crate::i2c::{BitBangI2c, I2cError};
use crate::register::{self, RegisterWrite, SequenceError};

/// Bytes pulled from the receive buffer per drain read
const DRAIN_CHUNK: usize = 64;

/// Upper bound on drain reads, in case the bridge keeps talking
const MAX_DRAIN_READS: usize = 64;

/// An open bridge and the state of its setup
#[derive(Debug)]
pub struct BridgeSession<T> {
    transport: T,
    configured: bool,
}

impl<T: Transport> BridgeSession<T> {
    /// Start a session on a transport already in MPSSE mode
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            configured: false,
        }
    }

    /// Send the clock setup and park the bus idle (SDA and SCL high)
    pub fn configure(&mut self, config: &BridgeConfig) -> Result<(), T::Error> {
        let mut pins = GpioEncoder::new(&mut self.transport);
        for cmd in config.commands() {
            pins.send_command(cmd)?;
        }
        pins.set_pins(PinState::IDLE)?;
        self.configured = true;
        Ok(())
    }

    /// Whether [`configure`](Self::configure) has completed
    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// Pin driver borrowing this session
    pub fn pins(&mut self) -> GpioEncoder<&mut T> {
        GpioEncoder::new(&mut self.transport)
    }

    /// I2C engine borrowing this session
    pub fn i2c(&mut self, bus: &SensorBusConfig) -> BitBangI2c<GpioEncoder<&mut T>> {
        BitBangI2c::with_ack_mode(self.pins(), bus.ack_mode())
    }

    /// Write one sensor register
    pub fn write_register(
        &mut self,
        bus: &SensorBusConfig,
        register: u16,
        value: u8,
    ) -> Result<(), I2cError<T::Error>> {
        let mut i2c = self.i2c(bus);
        register::write_register(&mut i2c, bus.address, register, value)
    }

    /// Write a register table front to back
    ///
    /// See [`register::write_sequence`].
    pub fn write_sequence<I, F>(
        &mut self,
        bus: &SensorBusConfig,
        writes: I,
        inspect: F,
    ) -> Result<usize, SequenceError<I2cError<T::Error>>>
    where
        I: IntoIterator<Item = RegisterWrite>,
        F: FnMut(usize, &RegisterWrite),
    {
        let mut i2c = self.i2c(bus);
        register::write_sequence(&mut i2c, bus.address, writes, inspect)
    }

    /// Drain anything the bridge sent back unasked
    ///
    /// Every classified byte is reported through `on_event`. Returns the
    /// number of raw bytes drained.
    pub fn drain_rx<F: FnMut(RxEvent)>(&mut self, mut on_event: F) -> Result<usize, T::Error> {
        let mut parser = RxParser::new();
        let mut buf = [0u8; DRAIN_CHUNK];
        let mut total = 0;

        for _ in 0..MAX_DRAIN_READS {
            let n = self.transport.recv_available(&mut buf)?;
            if n == 0 {
                break;
            }
            total += n;
            parser.feed_bytes(&buf[..n], &mut on_event);
        }
        if let Some(event) = parser.finish() {
            on_event(event);
        }

        Ok(total)
    }

    /// Access the underlying transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// End the session and hand back the transport
    pub fn into_transport(self) -> T {
        self.transport
    }
}
