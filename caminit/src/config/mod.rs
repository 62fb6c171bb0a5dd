//! Configuration loading and parsing
//!
//! The configuration is TOML, read from the command-line path or from the
//! copy embedded at build time.

pub mod loader;

pub use loader::{load, parse, EMBEDDED_CONFIG};

use std::time::Duration;

use caminit_core::{BridgeConfig, RegisterWrite, SensorBusConfig, DEFAULT_SENSOR_ADDRESS};
use caminit_drivers::sensor::{Imx219Config, TestPatternConfig};
use caminit_hal_ftdi::{DeviceConfig, Interface};
use serde::Deserialize;

/// Whole configuration file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaminitConfig {
    pub device: DeviceSection,
    pub bridge: BridgeConfig,
    pub sensor: SensorSection,
}

/// Bridge interface letter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum InterfaceName {
    #[serde(alias = "a")]
    A,
    #[default]
    #[serde(alias = "b")]
    B,
    #[serde(alias = "c")]
    C,
    #[serde(alias = "d")]
    D,
}

impl From<InterfaceName> for Interface {
    fn from(name: InterfaceName) -> Self {
        match name {
            InterfaceName::A => Interface::A,
            InterfaceName::B => Interface::B,
            InterfaceName::C => Interface::C,
            InterfaceName::D => Interface::D,
        }
    }
}

/// `[device]`: which bridge to open
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceSection {
    pub vendor_id: u16,
    pub product_ids: Vec<u16>,
    pub interface: InterfaceName,
    pub latency_ms: u8,
    pub io_timeout_ms: u64,
}

impl Default for DeviceSection {
    fn default() -> Self {
        let device = DeviceConfig::default();
        Self {
            vendor_id: device.vid,
            product_ids: device.pids,
            interface: InterfaceName::B,
            latency_ms: device.latency_ms,
            io_timeout_ms: device.io_timeout.as_millis() as u64,
        }
    }
}

impl DeviceSection {
    pub fn device_config(&self) -> DeviceConfig {
        DeviceConfig {
            vid: self.vendor_id,
            pids: self.product_ids.clone(),
            interface: self.interface.into(),
            latency_ms: self.latency_ms,
            io_timeout: Duration::from_millis(self.io_timeout_ms),
        }
    }
}

/// `[sensor]`: the IMX219 and its bus
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SensorSection {
    pub address: u8,
    pub ack_check: bool,
    pub analog_gain: Option<u8>,
    pub test_pattern: Option<TestPatternConfig>,
    pub extra_writes: Vec<RegisterWrite>,
}

impl Default for SensorSection {
    fn default() -> Self {
        Self {
            address: DEFAULT_SENSOR_ADDRESS,
            ack_check: false,
            analog_gain: None,
            test_pattern: None,
            extra_writes: Vec::new(),
        }
    }
}

impl SensorSection {
    pub fn bus(&self) -> SensorBusConfig {
        SensorBusConfig {
            address: self.address,
            ack_check: self.ack_check,
        }
    }

    pub fn imx219(&self) -> Imx219Config {
        Imx219Config {
            analog_gain: self.analog_gain,
            test_pattern: self.test_pattern,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caminit_drivers::sensor::TestPattern;

    #[test]
    fn test_embedded_matches_defaults() {
        let config = parse(EMBEDDED_CONFIG).unwrap();
        assert_eq!(config, CaminitConfig::default());
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.device.product_ids, vec![0x6010, 0x6014]);
        assert_eq!(config.device.interface, InterfaceName::B);
        assert_eq!(config.sensor.address, 0x10);
        assert!(config.bridge.divide_by_5);
    }

    #[test]
    fn test_device_config_conversion() {
        let config = parse(
            r#"
            [device]
            product_ids = [0x6014]
            interface = "a"
            io_timeout_ms = 250
            "#,
        )
        .unwrap();
        let device = config.device.device_config();
        assert_eq!(device.vid, 0x0403);
        assert_eq!(device.pids, vec![0x6014]);
        assert_eq!(device.interface, Interface::A);
        assert_eq!(device.io_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_sensor_options() {
        let config = parse(
            r#"
            [sensor]
            ack_check = true
            analog_gain = 232

            [sensor.test_pattern]
            pattern = "colour_bars"

            [[sensor.extra_writes]]
            reg = 0x0172
            value = 0x03
            "#,
        )
        .unwrap();

        assert!(config.sensor.bus().ack_check);
        let imx = config.sensor.imx219();
        assert_eq!(imx.analog_gain, Some(232));
        let pattern = imx.test_pattern.unwrap();
        assert_eq!(pattern.pattern, TestPattern::ColourBars);
        assert_eq!(pattern.red, 0x2AA);
        assert_eq!(
            config.sensor.extra_writes,
            vec![RegisterWrite::new(0x0172, 0x03)]
        );
    }

    #[test]
    fn test_bridge_section() {
        let config = parse(
            r#"
            [bridge]
            divide_by_5 = false
            clock_divisor = 299
            disable_adaptive = true
            "#,
        )
        .unwrap();
        assert_eq!(config.bridge.sck_frequency_hz(), 100_000);
        assert_eq!(config.bridge.commands().len(), 3);
    }
}
