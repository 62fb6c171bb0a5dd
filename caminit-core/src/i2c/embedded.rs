//! `embedded-hal` I2C adapter for the bit-bang engine
//!
//! Lets ordinary embedded-hal device drivers push register writes through
//! the bridge. Only write operations are supported; a transaction that
//! contains a read is rejected before anything is put on the bus.

use caminit_hal::gpio::PinSampler;
use embedded_hal::i2c::{self, ErrorKind, NoAcknowledgeSource, Operation, SevenBitAddress};

use super::{BitBangI2c, I2cError};

impl<E: core::fmt::Debug> i2c::Error for I2cError<E> {
    fn kind(&self) -> ErrorKind {
        match self {
            I2cError::Transport(_) => ErrorKind::Bus,
            I2cError::Nack { byte: 0 } => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address),
            I2cError::Nack { .. } => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data),
            I2cError::ReadUnsupported => ErrorKind::Other,
        }
    }
}

impl<P> i2c::ErrorType for BitBangI2c<P>
where
    P: PinSampler,
    P::Error: core::fmt::Debug,
{
    type Error = I2cError<P::Error>;
}

impl<P> i2c::I2c<SevenBitAddress> for BitBangI2c<P>
where
    P: PinSampler,
    P::Error: core::fmt::Debug,
{
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if operations
            .iter()
            .any(|op| matches!(op, Operation::Read(_)))
        {
            return Err(I2cError::ReadUnsupported);
        }

        // Adjacent writes go out back to back in one transaction
        let bytes = operations.iter().flat_map(|op| match op {
            Operation::Write(data) => data.iter().copied(),
            Operation::Read(_) => [].iter().copied(),
        });
        self.write_bytes(address, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::GpioEncoder;
    use crate::testing::RecordingTransport;
    use embedded_hal::i2c::{Error as _, I2c};

    fn engine() -> BitBangI2c<GpioEncoder<RecordingTransport>> {
        BitBangI2c::new(GpioEncoder::new(RecordingTransport::new()))
    }

    #[test]
    fn test_write_matches_register_write() {
        let mut expected = engine();
        expected.write_register(0x10, 0x0114, 0x01).unwrap();

        let mut i2c = engine();
        I2c::write(&mut i2c, 0x10, &[0x01, 0x14, 0x01]).unwrap();

        assert_eq!(
            i2c.pins_mut().transport_mut().sent(),
            expected.pins_mut().transport_mut().sent()
        );
    }

    #[test]
    fn test_split_writes_form_one_transaction() {
        let mut expected = engine();
        expected.write_register(0x10, 0x0128, 0x00).unwrap();

        let mut i2c = engine();
        i2c.transaction(
            0x10,
            &mut [Operation::Write(&[0x01, 0x28]), Operation::Write(&[0x00])],
        )
        .unwrap();

        assert_eq!(
            i2c.pins_mut().transport_mut().sent(),
            expected.pins_mut().transport_mut().sent()
        );
    }

    #[test]
    fn test_read_is_rejected_without_bus_traffic() {
        let mut i2c = engine();
        let mut buf = [0u8; 1];
        let err = i2c.write_read(0x10, &[0x00, 0x00], &mut buf).unwrap_err();

        assert_eq!(err, I2cError::ReadUnsupported);
        assert_eq!(err.kind(), ErrorKind::Other);
        assert!(i2c.pins_mut().transport_mut().sent().is_empty());
    }

    #[test]
    fn test_error_kinds() {
        let nack_addr: I2cError<()> = I2cError::Nack { byte: 0 };
        let nack_data: I2cError<()> = I2cError::Nack { byte: 3 };
        assert_eq!(
            nack_addr.kind(),
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
        );
        assert_eq!(
            nack_data.kind(),
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data)
        );
        assert_eq!(I2cError::Transport(()).kind(), ErrorKind::Bus);
    }
}
