//! GPIO command encoder
//!
//! Turns an (SDA, SCL) level pair into one `SET_BITS_LOW` command and pushes
//! it through the transport. One call, one command: repeated identical
//! states are sent again because the bit-bang timing depends on the full
//! explicit sequence being present in the stream.

use caminit_hal::gpio::{PinDriver, PinSampler, PinState, SCL_BIT, SDA_BIT};
use caminit_hal::Transport;
use caminit_protocol::{opcode, Command};

/// Direction mask with SDA and SCL both driven
pub const DIRECTION_DRIVE_BOTH: u8 = SDA_BIT | SCL_BIT;

/// Direction mask with SDA released (input) and SCL driven
pub const DIRECTION_RELEASE_SDA: u8 = SCL_BIT;

/// Pin driver backed by the bridge's low GPIO byte
#[derive(Debug)]
pub struct GpioEncoder<T> {
    transport: T,
}

impl<T: Transport> GpioEncoder<T> {
    /// Wrap a transport that is already in bit-bang command mode
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Consume the encoder and return the transport
    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Access the underlying transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Build the command that drives `state` on both lines
    pub fn command_for(state: PinState) -> Command {
        Command::SetBitsLow {
            value: state.bits(),
            direction: DIRECTION_DRIVE_BOTH,
        }
    }

    /// Encode and send a single command
    pub fn send_command(&mut self, cmd: Command) -> Result<(), T::Error> {
        let bytes = cmd.encode_to_vec();
        self.transport.send(&bytes)
    }
}

impl<T: Transport> PinDriver for GpioEncoder<T> {
    type Error = T::Error;

    fn set_pins(&mut self, state: PinState) -> Result<(), Self::Error> {
        self.send_command(Self::command_for(state))
    }
}

impl<T: Transport> PinSampler for GpioEncoder<T> {
    fn release_sda(&mut self, scl: bool) -> Result<(), Self::Error> {
        // Output latch stays high so re-driving SDA later starts from idle
        let value = PinState::new(true, scl).bits();
        self.send_command(Command::SetBitsLow {
            value,
            direction: DIRECTION_RELEASE_SDA,
        })
    }

    fn read_pins(&mut self) -> Result<PinState, Self::Error> {
        // Ask for the pin byte and flush it back right away
        self.transport
            .send(&[opcode::GET_BITS_LOW, opcode::SEND_IMMEDIATE])?;

        let mut reply = [0u8; 1];
        self.transport.recv(&mut reply)?;
        Ok(PinState::from_bits(reply[0]))
    }
}
