//! In-memory transport for host tests
//!
//! Records every byte sent, can be told to fail on a given send call, and
//! replays queued bytes for receives.

use std::collections::VecDeque;
use std::vec::Vec;

use caminit_hal::transport::{Error, ErrorKind, Transport};
use caminit_hal::PinState;
use caminit_protocol::Command;

use crate::encoder::DIRECTION_DRIVE_BOTH;

/// Failure injected by [`RecordingTransport`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockError {
    /// Injected send failure
    Io,
    /// Receive asked for more bytes than were queued
    Timeout,
}

impl core::fmt::Display for MockError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MockError::Io => f.write_str("injected send failure"),
            MockError::Timeout => f.write_str("receive queue exhausted"),
        }
    }
}

impl std::error::Error for MockError {}

impl Error for MockError {
    fn kind(&self) -> ErrorKind {
        match self {
            MockError::Io => ErrorKind::Io,
            MockError::Timeout => ErrorKind::Timeout,
        }
    }
}

/// Transport that records the command stream
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Vec<u8>,
    send_calls: usize,
    fail_at: Option<usize>,
    rx: VecDeque<u8>,
}

impl RecordingTransport {
    /// Create a fault-free recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a recorder whose `n`th send call (0-based) fails
    pub fn failing_at(n: usize) -> Self {
        Self {
            fail_at: Some(n),
            ..Self::default()
        }
    }

    /// Queue bytes to be returned by later receives
    pub fn queue_rx(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }

    /// Every byte successfully sent so far
    pub fn sent(&self) -> &[u8] {
        &self.sent
    }

    /// Number of send calls attempted, including a failed one
    pub fn send_calls(&self) -> usize {
        self.send_calls
    }

    /// Forget everything recorded so far
    pub fn clear(&mut self) {
        self.sent.clear();
        self.send_calls = 0;
    }

    /// Decode the recorded stream into commands
    ///
    /// Panics on bytes that are not a valid command; the recorder is only
    /// fed by encoders under test.
    pub fn commands(&self) -> Vec<Command> {
        let mut commands = Vec::new();
        let mut rest = self.sent.as_slice();
        while !rest.is_empty() {
            let (cmd, used) = Command::decode(rest).expect("recorded stream is not a command");
            commands.push(cmd);
            rest = &rest[used..];
        }
        commands
    }

    /// The recorded stream as pin states, one per `set_pins` call
    ///
    /// Panics if anything other than a drive-both-lines command was sent.
    pub fn pin_states(&self) -> Vec<PinState> {
        self.commands()
            .into_iter()
            .map(|cmd| match cmd {
                Command::SetBitsLow {
                    value,
                    direction: DIRECTION_DRIVE_BOTH,
                } => PinState::from_bits(value),
                other => panic!("not a set_pins command: {:?}", other),
            })
            .collect()
    }
}

impl Transport for RecordingTransport {
    type Error = MockError;

    fn send(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        let call = self.send_calls;
        self.send_calls += 1;
        if self.fail_at == Some(call) {
            return Err(MockError::Io);
        }
        self.sent.extend_from_slice(data);
        Ok(())
    }

    fn recv(&mut self, buf: &mut [u8]) -> Result<(), Self::Error> {
        if self.rx.len() < buf.len() {
            return Err(MockError::Timeout);
        }
        for slot in buf.iter_mut() {
            *slot = self.rx.pop_front().unwrap_or_default();
        }
        Ok(())
    }

    fn recv_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let count = buf.len().min(self.rx.len());
        for slot in buf[..count].iter_mut() {
            *slot = self.rx.pop_front().unwrap_or_default();
        }
        Ok(count)
    }
}

/// Expand pin levels into a list of states, e.g. `states(&[(1, 1), (0, 1)])`
pub fn states(levels: &[(u8, u8)]) -> Vec<PinState> {
    levels
        .iter()
        .map(|&(sda, scl)| PinState::new(sda != 0, scl != 0))
        .collect()
}
