//! Reader for the host's `.cfg` I/O-port description files.
//!
//! A file holds one or more device sections:
//!
//! ```text
//! ; Atmel AVR
//! .default ATmega8
//!
//! .ATmega8
//! RAM=1024
//! area DATA I_SRAM 0x0060:0x0460 Internal SRAM
//! entry RESET 0x0000 External Pin, Power-on Reset
//! PINB   0x16  Input Pins, Port B
//! PINB.PINB0 0
//! ```
//!
//! Everything after a `;` is ignored. Text after the address of a port, area or
//! entry line is kept as its comment.

use crate::models::{DeviceCatalog, DeviceDescription, EntryPoint, MemoryArea, PortEntry};
use camino::{Utf8Path, Utf8PathBuf};
use regex::{Captures, Regex};
use std::collections::HashSet;
use std::fs;
use thiserror::Error;

/// Errors produced while reading a configuration file
#[derive(Error, Debug)]
pub enum CfgParseError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Line {line}: unrecognized directive: {text}")]
    Syntax { line: usize, text: String },

    #[error("Line {line}: invalid number '{value}'")]
    InvalidNumber { line: usize, value: String },

    #[error("Line {line}: '{text}' appears before any device section")]
    OutsideDevice { line: usize, text: String },

    #[error("Line {line}: port '{name}' already defined for device {device}")]
    DuplicatePort {
        line: usize,
        name: String,
        device: String,
    },

    #[error("Line {line}: device {name} defined twice")]
    DuplicateDevice { line: usize, name: String },

    #[error("Line {line}: bit {bit} refers to unknown port '{port}'")]
    UnknownPort {
        line: usize,
        port: String,
        bit: String,
    },

    #[error("Line {line}: bit number {number} is out of range")]
    BitOutOfRange { line: usize, number: u64 },

    #[error("Line {line}: area end {end:#x} is below its start {start:#x}")]
    InvalidArea { line: usize, start: u64, end: u64 },

    #[error("No device sections found")]
    NoDevices,
}

/// Parser for `.cfg` port description files.
///
/// Line patterns are compiled once at construction.
pub struct CfgParser {
    default_pattern: Regex,
    section_pattern: Regex,
    area_pattern: Regex,
    entry_pattern: Regex,
    parameter_pattern: Regex,
    bit_pattern: Regex,
    port_pattern: Regex,
}

impl CfgParser {
    pub fn new() -> Self {
        Self {
            default_pattern: Regex::new(r"^\.default\s+(\S+)$").expect("Invalid default regex"),
            section_pattern: Regex::new(r"^\.(\S+)$").expect("Invalid section regex"),
            area_pattern: Regex::new(r"^area\s+(\S+)\s+(\S+)\s+([^:\s]+):(\S+)(?:\s+(.*))?$")
                .expect("Invalid area regex"),
            entry_pattern: Regex::new(r"^entry\s+(\S+)\s+(\S+)(?:\s+(.*))?$")
                .expect("Invalid entry regex"),
            parameter_pattern: Regex::new(r"^([A-Za-z_]\w*)\s*=\s*(.*)$")
                .expect("Invalid parameter regex"),
            bit_pattern: Regex::new(r"^([^\s.]+)\.(\S+)\s+(\S+)(?:\s+(.*))?$")
                .expect("Invalid bit regex"),
            port_pattern: Regex::new(r"^(\S+)\s+(\S+)(?:\s+(.*))?$").expect("Invalid port regex"),
        }
    }

    /// Read and parse a configuration file.
    pub fn parse_file(&self, path: &Utf8Path) -> Result<DeviceCatalog, CfgParseError> {
        let text = fs::read_to_string(path).map_err(|source| CfgParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let catalog = self.parse_str(&text)?;
        tracing::debug!(
            "Parsed {}: {} device(s), default={:?}",
            path,
            catalog.len(),
            catalog.default_device
        );
        Ok(catalog)
    }

    /// Parse configuration text.
    pub fn parse_str(&self, text: &str) -> Result<DeviceCatalog, CfgParseError> {
        let mut catalog = DeviceCatalog::default();
        let mut current: Option<DeviceDescription> = None;
        let mut port_names: HashSet<String> = HashSet::new();

        for (index, raw_line) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = strip_comment(raw_line);
            if line.is_empty() {
                continue;
            }

            if let Some(caps) = self.default_pattern.captures(line) {
                catalog.default_device = Some(caps[1].to_string());
                continue;
            }

            if let Some(caps) = self.section_pattern.captures(line) {
                let name = caps[1].to_string();
                if catalog.devices.contains_key(&name)
                    || current.as_ref().is_some_and(|d| d.name == name)
                {
                    return Err(CfgParseError::DuplicateDevice {
                        line: line_no,
                        name,
                    });
                }
                if let Some(done) = current.take() {
                    catalog.devices.insert(done.name.clone(), done);
                }
                port_names.clear();
                current = Some(DeviceDescription::new(name));
                continue;
            }

            let Some(device) = current.as_mut() else {
                return Err(CfgParseError::OutsideDevice {
                    line: line_no,
                    text: line.to_string(),
                });
            };

            if let Some(caps) = self.area_pattern.captures(line) {
                let start = number(&caps[3], line_no)?;
                let end = number(&caps[4], line_no)?;
                if end < start {
                    return Err(CfgParseError::InvalidArea {
                        line: line_no,
                        start,
                        end,
                    });
                }
                device.areas.push(MemoryArea {
                    class: caps[1].to_string(),
                    name: caps[2].to_string(),
                    start,
                    end,
                    comment: comment(&caps, 5),
                });
            } else if let Some(caps) = self.entry_pattern.captures(line) {
                device.entries.push(EntryPoint {
                    name: caps[1].to_string(),
                    address: number(&caps[2], line_no)?,
                    comment: comment(&caps, 3),
                });
            } else if let Some(caps) = self.parameter_pattern.captures(line) {
                device
                    .parameters
                    .insert(caps[1].to_string(), caps[2].trim().to_string());
            } else if let Some(caps) = self.bit_pattern.captures(line) {
                let bit_number = number(&caps[3], line_no)?;
                if bit_number > 63 {
                    return Err(CfgParseError::BitOutOfRange {
                        line: line_no,
                        number: bit_number,
                    });
                }
                let Some(port) = device.port_mut(&caps[1]) else {
                    return Err(CfgParseError::UnknownPort {
                        line: line_no,
                        port: caps[1].to_string(),
                        bit: caps[2].to_string(),
                    });
                };
                port.bits.insert(caps[2].to_string(), bit_number as u8);
            } else if let Some(caps) = self.port_pattern.captures(line) {
                let name = caps[1].to_string();
                let address = number(&caps[2], line_no)?;
                if !port_names.insert(name.clone()) {
                    return Err(CfgParseError::DuplicatePort {
                        line: line_no,
                        name,
                        device: device.name.clone(),
                    });
                }
                let mut port = PortEntry::new(name, address);
                port.comment = comment(&caps, 3);
                device.ports.push(port);
            } else {
                return Err(CfgParseError::Syntax {
                    line: line_no,
                    text: line.to_string(),
                });
            }
        }

        if let Some(done) = current.take() {
            catalog.devices.insert(done.name.clone(), done);
        }

        if catalog.is_empty() {
            return Err(CfgParseError::NoDevices);
        }

        if let Some(default) = &catalog.default_device {
            if !catalog.devices.contains_key(default) {
                tracing::warn!("Default device {} has no section in this file", default);
            }
        }

        Ok(catalog)
    }
}

impl Default for CfgParser {
    fn default() -> Self {
        Self::new()
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find(';') {
        Some(pos) => line[..pos].trim(),
        None => line.trim(),
    }
}

fn comment(caps: &Captures<'_>, group: usize) -> Option<String> {
    caps.get(group)
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parse a C-style integer literal (`0x`, `0b`, `0o` prefixes or decimal).
pub fn parse_number(value: &str) -> Option<u64> {
    let lower = value.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        u64::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = lower.strip_prefix("0b") {
        u64::from_str_radix(bin, 2).ok()
    } else if let Some(oct) = lower.strip_prefix("0o") {
        u64::from_str_radix(oct, 8).ok()
    } else {
        lower.parse().ok()
    }
}

fn number(value: &str, line: usize) -> Result<u64, CfgParseError> {
    parse_number(value).ok_or_else(|| CfgParseError::InvalidNumber {
        line,
        value: value.to_string(),
    })
}
