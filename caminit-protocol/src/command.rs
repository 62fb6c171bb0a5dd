//! Command encoding for the MPSSE bit-bang engine.
//!
//! Every command is an opcode byte followed by zero to two operand bytes:
//! - SET_BITS_LOW (3 bytes): 0x80, pin values, pin directions (1 = output)
//! - GET_BITS_LOW (1 byte): 0x81, bridge answers with one byte of pin levels
//! - SET_CLK_DIVISOR (3 bytes): 0x86, divisor low byte, divisor high byte
//! - mode toggles (1 byte): clock divide-by-5, 3-phase, adaptive, loopback

use heapless::Vec;

/// MPSSE opcodes
pub mod opcode {
    /// Set data bits, low byte (ADBUS/BDBUS 0-7)
    pub const SET_BITS_LOW: u8 = 0x80;
    /// Read data bits, low byte
    pub const GET_BITS_LOW: u8 = 0x81;
    /// Set data bits, high byte
    pub const SET_BITS_HIGH: u8 = 0x82;
    /// Read data bits, high byte
    pub const GET_BITS_HIGH: u8 = 0x83;
    /// Connect TDI/DO to TDO/DI internally
    pub const LOOPBACK_ENABLE: u8 = 0x84;
    /// Disconnect internal loopback
    pub const LOOPBACK_DISABLE: u8 = 0x85;
    /// Set TCK/SK clock divisor
    pub const SET_CLK_DIVISOR: u8 = 0x86;
    /// Flush the reply buffer back to the host
    pub const SEND_IMMEDIATE: u8 = 0x87;
    /// Use the 60 MHz master clock directly
    pub const DISABLE_CLK_DIV5: u8 = 0x8A;
    /// Divide the master clock by 5 (12 MHz, FT2232D compatible)
    pub const ENABLE_CLK_DIV5: u8 = 0x8B;
    /// Enable 3-phase data clocking
    pub const ENABLE_3PHASE: u8 = 0x8C;
    /// Disable 3-phase data clocking
    pub const DISABLE_3PHASE: u8 = 0x8D;
    /// Enable adaptive clocking
    pub const ENABLE_ADAPTIVE: u8 = 0x96;
    /// Disable adaptive clocking
    pub const DISABLE_ADAPTIVE: u8 = 0x97;
    /// Prefix of the bridge's answer to an opcode it does not know
    pub const BAD_COMMAND: u8 = 0xFA;
}

/// Longest encoded command in bytes
pub const MAX_COMMAND_SIZE: usize = 3;

/// Master clock with divide-by-5 disabled
pub const BASE_CLOCK_HZ: u32 = 60_000_000;

/// Master clock with divide-by-5 enabled
pub const DIV5_CLOCK_HZ: u32 = 12_000_000;

/// Errors that can occur during command encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// Buffer too small for encoding
    BufferTooSmall,
    /// Command is incomplete (need more bytes)
    Incomplete,
    /// Opcode outside the supported set
    UnknownOpcode(u8),
}

/// One MPSSE command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Drive the low GPIO byte
    SetBitsLow {
        /// Output levels
        value: u8,
        /// Direction mask (1 = output)
        direction: u8,
    },
    /// Read the low GPIO byte (one reply byte)
    GetBitsLow,
    /// Drive the high GPIO byte
    SetBitsHigh {
        /// Output levels
        value: u8,
        /// Direction mask (1 = output)
        direction: u8,
    },
    /// Read the high GPIO byte (one reply byte)
    GetBitsHigh,
    /// Enable or disable internal loopback
    Loopback(bool),
    /// Set the clock divisor
    SetClockDivisor(u16),
    /// Flush pending replies to the host
    SendImmediate,
    /// Enable or disable the master clock divide-by-5
    ClockDivideBy5(bool),
    /// Enable or disable 3-phase data clocking
    ThreePhaseClocking(bool),
    /// Enable or disable adaptive clocking
    AdaptiveClocking(bool),
}

impl Command {
    /// Opcode byte for this command
    pub fn opcode(&self) -> u8 {
        match self {
            Command::SetBitsLow { .. } => opcode::SET_BITS_LOW,
            Command::GetBitsLow => opcode::GET_BITS_LOW,
            Command::SetBitsHigh { .. } => opcode::SET_BITS_HIGH,
            Command::GetBitsHigh => opcode::GET_BITS_HIGH,
            Command::Loopback(true) => opcode::LOOPBACK_ENABLE,
            Command::Loopback(false) => opcode::LOOPBACK_DISABLE,
            Command::SetClockDivisor(_) => opcode::SET_CLK_DIVISOR,
            Command::SendImmediate => opcode::SEND_IMMEDIATE,
            Command::ClockDivideBy5(true) => opcode::ENABLE_CLK_DIV5,
            Command::ClockDivideBy5(false) => opcode::DISABLE_CLK_DIV5,
            Command::ThreePhaseClocking(true) => opcode::ENABLE_3PHASE,
            Command::ThreePhaseClocking(false) => opcode::DISABLE_3PHASE,
            Command::AdaptiveClocking(true) => opcode::ENABLE_ADAPTIVE,
            Command::AdaptiveClocking(false) => opcode::DISABLE_ADAPTIVE,
        }
    }

    /// Encoded length in bytes
    pub fn encoded_len(&self) -> usize {
        match self {
            Command::SetBitsLow { .. }
            | Command::SetBitsHigh { .. }
            | Command::SetClockDivisor(_) => 3,
            _ => 1,
        }
    }

    /// Number of reply bytes the bridge sends back for this command
    pub fn reply_len(&self) -> usize {
        match self {
            Command::GetBitsLow | Command::GetBitsHigh => 1,
            _ => 0,
        }
    }

    /// Encode this command into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, CommandError> {
        let len = self.encoded_len();
        if buffer.len() < len {
            return Err(CommandError::BufferTooSmall);
        }

        buffer[0] = self.opcode();
        match *self {
            Command::SetBitsLow { value, direction } | Command::SetBitsHigh { value, direction } => {
                buffer[1] = value;
                buffer[2] = direction;
            }
            Command::SetClockDivisor(divisor) => {
                // Divisor goes out low byte first
                let [low, high] = divisor.to_le_bytes();
                buffer[1] = low;
                buffer[2] = high;
            }
            _ => {}
        }

        Ok(len)
    }

    /// Decode one command from the front of `bytes`
    ///
    /// Returns the command and the number of bytes it occupied.
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize), CommandError> {
        let (&op, operands) = bytes.split_first().ok_or(CommandError::Incomplete)?;
        let operand_pair = || match operands {
            [a, b, ..] => Ok((*a, *b)),
            _ => Err(CommandError::Incomplete),
        };
        let cmd = match op {
            opcode::SET_BITS_LOW => {
                let (value, direction) = operand_pair()?;
                Command::SetBitsLow { value, direction }
            }
            opcode::SET_BITS_HIGH => {
                let (value, direction) = operand_pair()?;
                Command::SetBitsHigh { value, direction }
            }
            opcode::SET_CLK_DIVISOR => {
                let (low, high) = operand_pair()?;
                Command::SetClockDivisor(u16::from_le_bytes([low, high]))
            }
            opcode::GET_BITS_LOW => Command::GetBitsLow,
            opcode::GET_BITS_HIGH => Command::GetBitsHigh,
            opcode::LOOPBACK_ENABLE => Command::Loopback(true),
            opcode::LOOPBACK_DISABLE => Command::Loopback(false),
            opcode::SEND_IMMEDIATE => Command::SendImmediate,
            opcode::ENABLE_CLK_DIV5 => Command::ClockDivideBy5(true),
            opcode::DISABLE_CLK_DIV5 => Command::ClockDivideBy5(false),
            opcode::ENABLE_3PHASE => Command::ThreePhaseClocking(true),
            opcode::DISABLE_3PHASE => Command::ThreePhaseClocking(false),
            opcode::ENABLE_ADAPTIVE => Command::AdaptiveClocking(true),
            opcode::DISABLE_ADAPTIVE => Command::AdaptiveClocking(false),
            other => return Err(CommandError::UnknownOpcode(other)),
        };
        Ok((cmd, cmd.encoded_len()))
    }

    /// Encode this command into a heapless Vec
    pub fn encode_to_vec(&self) -> Vec<u8, MAX_COMMAND_SIZE> {
        let mut buffer = [0u8; MAX_COMMAND_SIZE];
        // MAX_COMMAND_SIZE covers every variant
        let len = self.encode(&mut buffer).unwrap_or(0);
        let mut vec = Vec::new();
        let _ = vec.extend_from_slice(&buffer[..len]);
        vec
    }
}

/// Master clock for the given divide-by-5 setting
pub const fn master_clock_hz(divide_by_5: bool) -> u32 {
    if divide_by_5 {
        DIV5_CLOCK_HZ
    } else {
        BASE_CLOCK_HZ
    }
}

/// SK frequency produced by a clock divisor
///
/// `f = master / ((1 + divisor) * 2)`
pub const fn sck_frequency_hz(divisor: u16, divide_by_5: bool) -> u32 {
    master_clock_hz(divide_by_5) / ((1 + divisor as u32) * 2)
}

/// Smallest divisor whose SK frequency does not exceed `target_hz`
///
/// Returns `None` when even the largest divisor is too fast, or when
/// `target_hz` is zero.
pub fn divisor_for_frequency(target_hz: u32, divide_by_5: bool) -> Option<u16> {
    if target_hz == 0 {
        return None;
    }
    let master = master_clock_hz(divide_by_5);
    // ceil(master / (2 * target)) - 1
    let ticks = master.div_ceil(target_hz.saturating_mul(2)).max(1);
    u16::try_from(ticks - 1).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_set_bits_low() {
        let cmd = Command::SetBitsLow {
            value: 0x02,
            direction: 0x03,
        };
        let mut buffer = [0u8; 4];
        let len = cmd.encode(&mut buffer).unwrap();

        assert_eq!(len, 3);
        assert_eq!(&buffer[..3], &[0x80, 0x02, 0x03]);
    }

    #[test]
    fn test_encode_clock_divisor_little_endian() {
        let bytes = Command::SetClockDivisor(0x1234).encode_to_vec();
        assert_eq!(bytes.as_slice(), &[0x86, 0x34, 0x12]);

        let bytes = Command::SetClockDivisor(0).encode_to_vec();
        assert_eq!(bytes.as_slice(), &[0x86, 0x00, 0x00]);
    }

    #[test]
    fn test_encode_single_byte_commands() {
        assert_eq!(Command::ClockDivideBy5(true).encode_to_vec().as_slice(), &[0x8B]);
        assert_eq!(Command::ClockDivideBy5(false).encode_to_vec().as_slice(), &[0x8A]);
        assert_eq!(Command::SendImmediate.encode_to_vec().as_slice(), &[0x87]);
        assert_eq!(Command::GetBitsLow.encode_to_vec().as_slice(), &[0x81]);
        assert_eq!(Command::Loopback(false).encode_to_vec().as_slice(), &[0x85]);
        assert_eq!(Command::ThreePhaseClocking(false).encode_to_vec().as_slice(), &[0x8D]);
        assert_eq!(Command::AdaptiveClocking(false).encode_to_vec().as_slice(), &[0x97]);
    }

    #[test]
    fn test_encode_buffer_too_small() {
        let cmd = Command::SetClockDivisor(5);
        let mut buffer = [0u8; 2];
        assert_eq!(cmd.encode(&mut buffer), Err(CommandError::BufferTooSmall));
    }

    #[test]
    fn test_decode_stream() {
        let stream = [0x8B, 0x86, 0x00, 0x00, 0x80, 0x01, 0x03, 0x81, 0x87];
        let mut rest = &stream[..];
        let mut decoded = [Command::SendImmediate; 5];
        for slot in decoded.iter_mut() {
            let (cmd, used) = Command::decode(rest).unwrap();
            *slot = cmd;
            rest = &rest[used..];
        }
        assert!(rest.is_empty());
        assert_eq!(
            decoded,
            [
                Command::ClockDivideBy5(true),
                Command::SetClockDivisor(0),
                Command::SetBitsLow {
                    value: 0x01,
                    direction: 0x03
                },
                Command::GetBitsLow,
                Command::SendImmediate,
            ]
        );
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(Command::decode(&[]), Err(CommandError::Incomplete));
        assert_eq!(Command::decode(&[0x80, 0x01]), Err(CommandError::Incomplete));
        assert_eq!(Command::decode(&[0x42]), Err(CommandError::UnknownOpcode(0x42)));
    }

    #[test]
    fn test_reply_len() {
        assert_eq!(Command::GetBitsLow.reply_len(), 1);
        assert_eq!(Command::GetBitsHigh.reply_len(), 1);
        assert_eq!(Command::SendImmediate.reply_len(), 0);
        assert_eq!(
            Command::SetBitsLow {
                value: 0,
                direction: 0
            }
            .reply_len(),
            0
        );
    }

    #[test]
    fn test_sck_frequency() {
        // Divide-by-5 with divisor 0 is the 6 MHz default
        assert_eq!(sck_frequency_hz(0, true), 6_000_000);
        assert_eq!(sck_frequency_hz(0, false), 30_000_000);
        assert_eq!(sck_frequency_hz(29, true), 200_000);
    }

    #[test]
    fn test_divisor_for_frequency() {
        assert_eq!(divisor_for_frequency(6_000_000, true), Some(0));
        assert_eq!(divisor_for_frequency(100_000, true), Some(59));
        assert_eq!(divisor_for_frequency(100_000, false), Some(299));
        // Never faster than requested
        assert_eq!(divisor_for_frequency(7_000_000, true), Some(0));
        assert_eq!(divisor_for_frequency(4_000_000, true), Some(1));
        assert_eq!(divisor_for_frequency(0, true), None);
        assert_eq!(divisor_for_frequency(1, false), None);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn encoded_length_matches_len(value: u8, direction: u8, divisor: u16) {
                for cmd in [
                    Command::SetBitsLow { value, direction },
                    Command::SetBitsHigh { value, direction },
                    Command::SetClockDivisor(divisor),
                    Command::GetBitsLow,
                    Command::SendImmediate,
                ] {
                    let bytes = cmd.encode_to_vec();
                    prop_assert_eq!(bytes.len(), cmd.encoded_len());
                    prop_assert_eq!(bytes[0], cmd.opcode());
                    prop_assert_eq!(Command::decode(&bytes), Ok((cmd, cmd.encoded_len())));
                }
            }

            #[test]
            fn divisor_never_overshoots(target in 1_000u32..=6_000_000) {
                let divisor = divisor_for_frequency(target, true).unwrap();
                prop_assert!(sck_frequency_hz(divisor, true) <= target);
            }
        }
    }
}
