//! 16-bit register write protocol
//!
//! A register write is one I2C write transaction:
//! ```text
//! ┌───────┬──────────────┬──────────┬──────────┬───────┬──────┐
//! │ START │ ADDR<<1 | W  │ REG[15:8]│ REG[7:0] │ VALUE │ STOP │
//! └───────┴──────────────┴──────────┴──────────┴───────┴──────┘
//! ```
//! Device bring-up is an ordered table of such writes, executed front to
//! back and abandoned at the first failure.

use caminit_hal::i2c::I2cWrite;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One register assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields))]
pub struct RegisterWrite {
    /// 16-bit register address
    #[cfg_attr(feature = "serde", serde(rename = "reg"))]
    pub address: u16,
    /// Value to store
    pub value: u8,
}

impl RegisterWrite {
    /// Create a register write
    pub const fn new(address: u16, value: u8) -> Self {
        Self { address, value }
    }

    /// Bytes that follow the device address: register high, low, value
    pub const fn payload(&self) -> [u8; 3] {
        let [high, low] = self.address.to_be_bytes();
        [high, low, self.value]
    }
}

/// A write in a sequence failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SequenceError<E> {
    /// Position of the failing write in the sequence
    pub index: usize,
    /// The write that failed
    pub write: RegisterWrite,
    /// Underlying bus error
    pub error: E,
}

impl<E: core::fmt::Display> core::fmt::Display for SequenceError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "write {} (cam[0x{:04X}] <= 0x{:02X}) failed: {}",
            self.index, self.write.address, self.write.value, self.error
        )
    }
}

#[cfg(feature = "std")]
impl<E> std::error::Error for SequenceError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Write one byte to a 16-bit register of `slave`
pub fn write_register<B: I2cWrite>(
    bus: &mut B,
    slave: u8,
    register: u16,
    value: u8,
) -> Result<(), B::Error> {
    bus.write(slave, &RegisterWrite::new(register, value).payload())
}

/// Write every entry of `writes` in order
///
/// `inspect` is called with the index and entry right before each write.
/// Returns the number of writes performed.
pub fn write_sequence<B, I, F>(
    bus: &mut B,
    slave: u8,
    writes: I,
    mut inspect: F,
) -> Result<usize, SequenceError<B::Error>>
where
    B: I2cWrite,
    I: IntoIterator<Item = RegisterWrite>,
    F: FnMut(usize, &RegisterWrite),
{
    let mut count = 0;
    for (index, write) in writes.into_iter().enumerate() {
        inspect(index, &write);
        write_register(bus, slave, write.address, write.value)
            .map_err(|error| SequenceError {
                index,
                write,
                error,
            })?;
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::GpioEncoder;
    use crate::i2c::{BitBangI2c, I2cError};
    use crate::testing::{MockError, RecordingTransport};
    use std::vec::Vec;

    /// Bus double that records payloads instead of pin states
    #[derive(Default)]
    struct PayloadBus {
        writes: Vec<(u8, Vec<u8>)>,
        fail_on: Option<usize>,
    }

    impl I2cWrite for PayloadBus {
        type Error = usize;

        fn write(&mut self, address: u8, data: &[u8]) -> Result<(), usize> {
            let n = self.writes.len();
            if self.fail_on == Some(n) {
                return Err(n);
            }
            self.writes.push((address, data.to_vec()));
            Ok(())
        }
    }

    #[test]
    fn test_payload_is_big_endian() {
        assert_eq!(RegisterWrite::new(0x30EB, 0x05).payload(), [0x30, 0xEB, 0x05]);
        assert_eq!(RegisterWrite::new(0x0100, 0x01).payload(), [0x01, 0x00, 0x01]);
    }

    #[test]
    fn test_write_register_payload() {
        let mut bus = PayloadBus::default();
        write_register(&mut bus, 0x10, 0x0160, 0x02).unwrap();
        assert_eq!(bus.writes, vec![(0x10, vec![0x01, 0x60, 0x02])]);
    }

    #[test]
    fn test_sequence_in_order() {
        let table = [
            RegisterWrite::new(0x0100, 0x00),
            RegisterWrite::new(0x30EB, 0x05),
            RegisterWrite::new(0x0100, 0x01),
        ];
        let mut bus = PayloadBus::default();
        let mut seen = Vec::new();
        let count = write_sequence(&mut bus, 0x10, table, |i, w| seen.push((i, *w))).unwrap();

        assert_eq!(count, 3);
        assert_eq!(seen, vec![(0, table[0]), (1, table[1]), (2, table[2])]);
        assert_eq!(bus.writes[1], (0x10, vec![0x30, 0xEB, 0x05]));
    }

    #[test]
    fn test_sequence_stops_at_first_failure() {
        let table = [
            RegisterWrite::new(0x0100, 0x00),
            RegisterWrite::new(0x0114, 0x01),
            RegisterWrite::new(0x0128, 0x00),
        ];
        let mut bus = PayloadBus {
            fail_on: Some(1),
            ..Default::default()
        };
        let mut inspected = 0;
        let err = write_sequence(&mut bus, 0x10, table, |_, _| inspected += 1).unwrap_err();

        assert_eq!(
            err,
            SequenceError {
                index: 1,
                write: table[1],
                error: 1
            }
        );
        assert_eq!(bus.writes.len(), 1);
        assert_eq!(inspected, 2);
    }

    #[test]
    fn test_sequence_error_message() {
        let err = SequenceError {
            index: 3,
            write: RegisterWrite::new(0x0160, 0x02),
            error: I2cError::<MockError>::Nack { byte: 2 },
        };
        assert_eq!(
            err.to_string(),
            "write 3 (cam[0x0160] <= 0x02) failed: byte 2 not acknowledged"
        );
    }

    #[test]
    fn test_sequence_over_bitbang_engine() {
        let table = [RegisterWrite::new(0x0100, 0x00), RegisterWrite::new(0x0100, 0x01)];
        let mut i2c = BitBangI2c::new(GpioEncoder::new(RecordingTransport::new()));
        write_sequence(&mut i2c, 0x10, table, |_, _| {}).unwrap();

        assert_eq!(i2c.pins_mut().transport_mut().pin_states().len(), 2 * 114);
    }

    #[test]
    fn test_sequence_transport_failure_mid_table() {
        // Second write dies on its very first command
        let table = [RegisterWrite::new(0x0100, 0x00), RegisterWrite::new(0x0100, 0x01)];
        let transport = RecordingTransport::failing_at(114);
        let mut i2c = BitBangI2c::new(GpioEncoder::new(transport));
        let err = write_sequence(&mut i2c, 0x10, table, |_, _| {}).unwrap_err();

        assert_eq!(err.index, 1);
        assert_eq!(err.error, I2cError::Transport(MockError::Io));
        assert_eq!(i2c.pins_mut().transport_mut().send_calls(), 115);
    }
}
