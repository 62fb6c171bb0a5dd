//! MPSSE bridge device
//!
//! Opening follows the bring-up the bridge needs before it accepts GPIO
//! commands:
//!
//! ```text
//! open(vid, pid, interface) ─► usb reset ─► purge rx/tx
//!     ─► save latency timer ─► latency = 1 ms ─► bitmode 0xFF MPSSE
//! ```
//!
//! The saved latency timer is written back on [`FtdiBridge::close`], or on
//! drop if the bridge was never closed explicitly.

use std::io::{Read, Write};
use std::thread;
use std::time::{Duration, Instant};

use caminit_hal::Transport;
use tracing::{debug, trace, warn};

use crate::error::FtdiError;

/// FTDI vendor id
pub const FTDI_VID: u16 = 0x0403;

/// FT2232H product id
pub const FT2232H_PID: u16 = 0x6010;

/// FT232H product id
pub const FT232H_PID: u16 = 0x6014;

/// Every pin of the low byte under MPSSE control
const MPSSE_BITMASK: u8 = 0xFF;

/// Pause between empty polls while waiting for reply bytes
const POLL_INTERVAL: Duration = Duration::from_micros(100);

/// Bridge interface (channel) on multi-channel parts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interface {
    A,
    #[default]
    B,
    C,
    D,
}

impl Interface {
    fn to_ftdi(self) -> ftdi::Interface {
        match self {
            Interface::A => ftdi::Interface::A,
            Interface::B => ftdi::Interface::B,
            Interface::C => ftdi::Interface::C,
            Interface::D => ftdi::Interface::D,
        }
    }
}

/// Which device to open and how to set it up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// USB vendor id
    pub vid: u16,
    /// Product ids, tried in order
    pub pids: Vec<u16>,
    /// Interface to claim
    pub interface: Interface,
    /// Latency timer while the bridge is open, in ms
    pub latency_ms: u8,
    /// Longest wait for reply bytes
    pub io_timeout: Duration,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            vid: FTDI_VID,
            pids: vec![FT2232H_PID, FT232H_PID],
            interface: Interface::B,
            latency_ms: 1,
            io_timeout: Duration::from_millis(1000),
        }
    }
}

/// An open bridge in MPSSE mode
pub struct FtdiBridge {
    device: ftdi::Device,
    saved_latency: Option<u8>,
    io_timeout: Duration,
}

impl FtdiBridge {
    /// Open the first matching device and put it in MPSSE mode
    pub fn open(config: &DeviceConfig) -> Result<Self, FtdiError> {
        let mut last_error = None;

        for &pid in &config.pids {
            let opened = ftdi::find_by_vid_pid(config.vid, pid)
                .interface(config.interface.to_ftdi())
                .open();
            match opened {
                Ok(device) => {
                    debug!(
                        vid = config.vid,
                        pid,
                        interface = ?config.interface,
                        "opened bridge"
                    );
                    return Self::setup(device, config);
                }
                Err(e) => {
                    debug!(vid = config.vid, pid, error = %e, "device not available");
                    last_error = Some(e);
                }
            }
        }

        Err(FtdiError::NotFound {
            vid: config.vid,
            pids: config.pids.clone(),
            source: last_error,
        })
    }

    fn setup(mut device: ftdi::Device, config: &DeviceConfig) -> Result<Self, FtdiError> {
        device.usb_reset().map_err(FtdiError::config("reset device"))?;
        device
            .usb_purge_buffers()
            .map_err(FtdiError::config("purge buffers"))?;
        let saved = device
            .latency_timer()
            .map_err(FtdiError::config("read latency timer"))?;

        // From here on, dropping the bridge restores the latency timer
        let mut bridge = Self {
            device,
            saved_latency: None,
            io_timeout: config.io_timeout,
        };
        bridge
            .device
            .set_latency_timer(config.latency_ms)
            .map_err(FtdiError::config("set latency timer"))?;
        bridge.saved_latency = Some(saved);
        debug!(saved, latency = config.latency_ms, "latency timer set");

        bridge
            .device
            .set_bitmode(MPSSE_BITMASK, ftdi::BitMode::Mpsse)
            .map_err(FtdiError::config("enter MPSSE mode"))?;

        Ok(bridge)
    }

    /// Restore the latency timer and release the device
    pub fn close(mut self) -> Result<(), FtdiError> {
        self.restore_latency()
    }

    fn restore_latency(&mut self) -> Result<(), FtdiError> {
        if let Some(latency) = self.saved_latency.take() {
            self.device
                .set_latency_timer(latency)
                .map_err(FtdiError::config("restore latency timer"))?;
            debug!(latency, "latency timer restored");
        }
        Ok(())
    }
}

impl Drop for FtdiBridge {
    fn drop(&mut self) {
        if let Err(e) = self.restore_latency() {
            warn!(error = %e, "could not restore latency timer");
        }
    }
}

impl Transport for FtdiBridge {
    type Error = FtdiError;

    fn send(&mut self, data: &[u8]) -> Result<(), FtdiError> {
        let written = self.device.write(data)?;
        if written != data.len() {
            return Err(FtdiError::ShortWrite {
                written,
                expected: data.len(),
            });
        }
        trace!(bytes = ?data, "tx");
        Ok(())
    }

    fn recv(&mut self, buf: &mut [u8]) -> Result<(), FtdiError> {
        let deadline = Instant::now() + self.io_timeout;
        let mut filled = 0;

        while filled < buf.len() {
            let n = self.device.read(&mut buf[filled..])?;
            filled += n;
            if n == 0 {
                if Instant::now() >= deadline {
                    return Err(FtdiError::Timeout {
                        expected: buf.len(),
                        received: filled,
                    });
                }
                thread::sleep(POLL_INTERVAL);
            }
        }

        trace!(bytes = ?buf, "rx");
        Ok(())
    }

    fn recv_available(&mut self, buf: &mut [u8]) -> Result<usize, FtdiError> {
        let n = self.device.read(buf)?;
        if n > 0 {
            trace!(bytes = ?&buf[..n], "rx");
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_device() {
        let config = DeviceConfig::default();
        assert_eq!(config.vid, 0x0403);
        assert_eq!(config.pids, vec![0x6010, 0x6014]);
        assert_eq!(config.interface, Interface::B);
        assert_eq!(config.latency_ms, 1);
    }

    #[test]
    fn test_interface_default_is_b() {
        assert_eq!(Interface::default(), Interface::B);
    }
}
