//! Classification of bytes the bridge sends back unasked
//!
//! During a pure write run the bridge should stay silent. Anything that
//! shows up in the receive buffer means the command stream and the bridge
//! have drifted apart. The only structured reply is the bad-command echo:
//! `0xFA` followed by the opcode the engine did not recognise.

use crate::command::opcode;

/// One diagnostic event decoded from the receive stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxEvent {
    /// The bridge rejected this opcode
    BadCommand(u8),
    /// A byte with no known meaning
    Unexpected(u8),
}

/// State machine for classifying received bytes
#[derive(Debug, Clone, Default)]
pub struct RxParser {
    /// Saw `0xFA`, waiting for the rejected opcode
    pending_bad_command: bool,
}

impl RxParser {
    /// Create a new parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a single byte
    ///
    /// Returns `Some(event)` once a byte (or byte pair) is classified.
    pub fn feed(&mut self, byte: u8) -> Option<RxEvent> {
        if self.pending_bad_command {
            self.pending_bad_command = false;
            return Some(RxEvent::BadCommand(byte));
        }
        if byte == opcode::BAD_COMMAND {
            self.pending_bad_command = true;
            return None;
        }
        Some(RxEvent::Unexpected(byte))
    }

    /// Flush a dangling bad-command prefix at end of input
    pub fn finish(&mut self) -> Option<RxEvent> {
        if core::mem::take(&mut self.pending_bad_command) {
            Some(RxEvent::Unexpected(opcode::BAD_COMMAND))
        } else {
            None
        }
    }

    /// Classify a whole buffer, calling `f` for every event
    pub fn feed_bytes<F: FnMut(RxEvent)>(&mut self, bytes: &[u8], mut f: F) {
        for &byte in bytes {
            if let Some(event) = self.feed(byte) {
                f(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::Vec;

    fn classify(bytes: &[u8]) -> Vec<RxEvent, 16> {
        let mut parser = RxParser::new();
        let mut events = Vec::new();
        parser.feed_bytes(bytes, |e| events.push(e).unwrap());
        if let Some(e) = parser.finish() {
            events.push(e).unwrap();
        }
        events
    }

    #[test]
    fn test_bad_command_echo() {
        assert_eq!(classify(&[0xFA, 0xAB]).as_slice(), &[RxEvent::BadCommand(0xAB)]);
    }

    #[test]
    fn test_stray_bytes() {
        assert_eq!(
            classify(&[0x01, 0x7F]).as_slice(),
            &[RxEvent::Unexpected(0x01), RxEvent::Unexpected(0x7F)]
        );
    }

    #[test]
    fn test_mixed_stream() {
        assert_eq!(
            classify(&[0x03, 0xFA, 0x80, 0xFA, 0xFA]).as_slice(),
            &[
                RxEvent::Unexpected(0x03),
                RxEvent::BadCommand(0x80),
                RxEvent::BadCommand(0xFA),
            ]
        );
    }

    #[test]
    fn test_dangling_prefix() {
        assert_eq!(classify(&[0xFA]).as_slice(), &[RxEvent::Unexpected(0xFA)]);
        assert!(classify(&[]).is_empty());
    }
}
