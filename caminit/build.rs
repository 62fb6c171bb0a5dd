//! Build script for caminit
//!
//! Validates caminit.toml at compile time, since it is embedded as the
//! default configuration.

use std::fs;
use std::path::Path;

mod build_support;

use build_support::format_error_lines;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=build_support.rs");
    validate_config();
}

/// Validate caminit.toml at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=caminit.toml");

    let config_path = Path::new("caminit.toml");

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read caminit.toml                              ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in caminit.toml                      ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                {}\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&e.to_string())
            );
        }
    };

    let mut errors = Vec::new();
    validate_device(&config, &mut errors);
    validate_sensor(&config, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid configuration in caminit.toml                    ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }
}

fn integer_in(value: Option<&toml::Value>, min: i64, max: i64) -> bool {
    match value {
        None => true,
        Some(toml::Value::Integer(n)) => (min..=max).contains(n),
        Some(_) => false,
    }
}

/// Validate the [device] section
fn validate_device(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(device) = config.get("device") else {
        return;
    };

    if !integer_in(device.get("vendor_id"), 0, 0xFFFF) {
        errors.push("[device] vendor_id must be 0x0000-0xFFFF".to_string());
    }

    match device.get("product_ids") {
        None => {}
        Some(toml::Value::Array(pids)) => {
            if pids.is_empty() {
                errors.push("[device] product_ids cannot be empty".to_string());
            }
            for pid in pids {
                if !integer_in(Some(pid), 0, 0xFFFF) {
                    errors.push("[device] product_ids must be 0x0000-0xFFFF".to_string());
                }
            }
        }
        Some(_) => errors.push("[device] product_ids must be an array".to_string()),
    }

    if let Some(interface) = device.get("interface") {
        let valid = interface
            .as_str()
            .is_some_and(|s| ["A", "B", "C", "D", "a", "b", "c", "d"].contains(&s));
        if !valid {
            errors.push("[device] interface must be 'A', 'B', 'C' or 'D'".to_string());
        }
    }

    if !integer_in(device.get("latency_ms"), 1, 255) {
        errors.push("[device] latency_ms must be 1-255".to_string());
    }
    if !integer_in(device.get("io_timeout_ms"), 1, i64::MAX) {
        errors.push("[device] io_timeout_ms must be greater than 0".to_string());
    }
}

/// Validate the [sensor] section
fn validate_sensor(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(sensor) = config.get("sensor") else {
        return;
    };

    if !integer_in(sensor.get("address"), 0, 0x7F) {
        errors.push("[sensor] address must be a 7-bit address (0x00-0x7F)".to_string());
    }
    if !integer_in(sensor.get("analog_gain"), 0, 0xFF) {
        errors.push("[sensor] analog_gain must be 0-255".to_string());
    }

    let Some(writes) = sensor.get("extra_writes") else {
        return;
    };
    let Some(writes) = writes.as_array() else {
        errors.push("[sensor] extra_writes must be an array of tables".to_string());
        return;
    };
    for (i, write) in writes.iter().enumerate() {
        if write.get("reg").is_none() || write.get("value").is_none() {
            errors.push(format!("[sensor] extra_writes[{}] needs 'reg' and 'value'", i));
            continue;
        }
        if !integer_in(write.get("reg"), 0, 0xFFFF) {
            errors.push(format!("[sensor] extra_writes[{}] reg must be 16-bit", i));
        }
        if !integer_in(write.get("value"), 0, 0xFF) {
            errors.push(format!("[sensor] extra_writes[{}] value must be 8-bit", i));
        }
    }
}
