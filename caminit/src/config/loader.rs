//! Configuration file loading
//!
//! Reads the file named on the command line, or falls back to the embedded
//! defaults, then checks the values the type system cannot.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use caminit_core::ConfigError;
use tracing::info;

use super::CaminitConfig;

/// Embedded default configuration
/// Edit caminit.toml and rebuild to change the defaults
pub const EMBEDDED_CONFIG: &str = include_str!("../../caminit.toml");

/// Load the configuration from `path`, or the embedded copy
pub fn load(path: Option<&Path>) -> Result<CaminitConfig> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let config =
                parse(&text).with_context(|| format!("invalid config {}", path.display()))?;
            info!(path = %path.display(), "loaded configuration");
            Ok(config)
        }
        None => {
            let config = parse(EMBEDDED_CONFIG).context("invalid embedded config")?;
            info!("using embedded configuration");
            Ok(config)
        }
    }
}

/// Parse and validate configuration text
pub fn parse(text: &str) -> Result<CaminitConfig> {
    let config: CaminitConfig = toml::from_str(text)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &CaminitConfig) -> Result<()> {
    if config.device.product_ids.is_empty() {
        bail!("[device] product_ids cannot be empty");
    }
    if config.device.io_timeout_ms == 0 {
        bail!("[device] io_timeout_ms must be greater than 0");
    }
    match config.sensor.bus().validate() {
        Ok(()) => Ok(()),
        Err(ConfigError::AddressOutOfRange(address)) => {
            bail!("[sensor] address 0x{:02X} does not fit in 7 bits", address)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_wide_address() {
        let err = parse("[sensor]\naddress = 0x90\n").unwrap_err();
        assert!(err.to_string().contains("0x90"));
    }

    #[test]
    fn test_rejects_empty_product_ids() {
        assert!(parse("[device]\nproduct_ids = []\n").is_err());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        assert!(parse("[device]\nio_timeout_ms = 0\n").is_err());
    }

    #[test]
    fn test_rejects_unknown_keys() {
        assert!(parse("[sensor]\nadress = 0x10\n").is_err());
    }

    #[test]
    fn test_rejects_unknown_bridge_key() {
        assert!(parse("[bridge]\nclock_divsor = 299\n").is_err());
    }

    #[test]
    fn test_rejects_unknown_test_pattern_key() {
        assert!(parse("[sensor.test_pattern]\nrde = 0x3FF\n").is_err());
    }

    #[test]
    fn test_rejects_unknown_extra_write_key() {
        let text = "[[sensor.extra_writes]]\nreg = 0x0172\nvalue = 0x03\nmask = 0xFF\n";
        assert!(parse(text).is_err());
    }

    #[test]
    fn test_accepts_bridge_section() {
        let config = parse("[bridge]\nclock_divisor = 299\n").unwrap();
        assert_eq!(config.bridge.clock_divisor, 299);
    }

    #[test]
    fn test_rejects_bad_interface() {
        assert!(parse("[device]\ninterface = \"E\"\n").is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = load(Some(Path::new("/nonexistent/caminit.toml"))).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }

    #[test]
    fn test_load_embedded() {
        assert!(load(None).is_ok());
    }
}
