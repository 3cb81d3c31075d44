//! Configuration system for the ARMv6-M simulator.
//!
//! This module defines the configuration structures used to parameterize
//! the simulator. It provides:
//! 1. **Defaults:** Baseline memory map and debugger settings.
//! 2. **Structures:** Hierarchical config for general, memory, and GDB options.
//! 3. **Loading:** JSON deserialization from a string or a file.
//!
//! Configuration is supplied via JSON (`--config`) or `Config::default()`;
//! command-line flags override individual fields afterwards.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::common::ConfigError;
use crate::soc::MemorySim;

/// Default configuration constants for the simulator.
mod defaults {
    /// Base address of the default flash region.
    pub const FLASH_BASE: u32 = 0x0000_0000;

    /// Size of the default flash region (256 KiB).
    pub const FLASH_SIZE: u32 = 256 * 1024;

    /// Base address of the default RAM region.
    pub const RAM_BASE: u32 = 0x2000_0000;

    /// Size of the default RAM region (64 KiB).
    pub const RAM_SIZE: u32 = 64 * 1024;

    /// TCP port the debugger connects to.
    pub const GDB_PORT: u16 = 3333;

    /// Serial line rate when none is given.
    pub const SERIAL_BAUD: u32 = 115_200;

    /// RSP packet buffer capacity in bytes.
    ///
    /// Advertised to GDB through `PacketSize` in the `qSupported` reply.
    pub const PACKET_SIZE: usize = 4096;
}

/// Kind of memory a region models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum RegionKind {
    /// Read-only to the CPU; written by the loader and the debugger.
    Flash,
    /// Read-write memory.
    #[default]
    Ram,
}

/// Root configuration structure containing all simulator settings.
///
/// # Examples
///
/// ```
/// use pinkysim_core::config::{Config, RegionKind};
///
/// let json = r#"{
///     "general": { "trace_instructions": true },
///     "memory": {
///         "regions": [
///             { "base": 0, "size": 65536, "kind": "Flash" },
///             { "base": 536870912, "size": 8192 }
///         ]
///     },
///     "gdb": { "port": 2331 }
/// }"#;
///
/// let config = Config::from_json_str(json).unwrap();
/// assert!(config.general.trace_instructions);
/// assert_eq!(config.memory.regions[0].kind, RegionKind::Flash);
/// assert_eq!(config.memory.regions[1].kind, RegionKind::Ram);
/// assert_eq!(config.gdb.port, 2331);
/// assert_eq!(config.gdb.packet_size, 4096);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// General simulation settings
    #[serde(default)]
    pub general: GeneralConfig,
    /// Simulated memory map
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Debugger transport settings
    #[serde(default)]
    pub gdb: GdbConfig,
}

impl Config {
    /// Parses a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the text is not a valid configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if its contents are invalid.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Builds the memory backend described by [`MemoryConfig::regions`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Memory`] when a region is empty, wraps the
    /// address space, or overlaps another.
    pub fn build_memory(&self) -> Result<MemorySim, ConfigError> {
        let mut memory = MemorySim::new();
        for region in &self.memory.regions {
            memory.add_region(region.base, region.size, region.kind == RegionKind::Flash)?;
        }
        Ok(memory)
    }
}

/// General simulation settings and options.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeneralConfig {
    /// Log every executed instruction at `trace` level
    #[serde(default)]
    pub trace_instructions: bool,

    /// Stop before the first instruction and wait for the debugger
    #[serde(default)]
    pub break_on_start: bool,

    /// Print the instruction mix when the session ends
    #[serde(default)]
    pub print_stats: bool,
}

/// One declared memory region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RegionConfig {
    /// First address of the region
    pub base: u32,
    /// Length in bytes
    pub size: u32,
    /// Flash or RAM
    #[serde(default)]
    pub kind: RegionKind,
}

/// Simulated memory map.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    /// Regions to declare, in any order
    #[serde(default = "MemoryConfig::default_regions")]
    pub regions: Vec<RegionConfig>,
}

impl MemoryConfig {
    /// Returns the default flash and RAM pair.
    fn default_regions() -> Vec<RegionConfig> {
        vec![
            RegionConfig {
                base: defaults::FLASH_BASE,
                size: defaults::FLASH_SIZE,
                kind: RegionKind::Flash,
            },
            RegionConfig {
                base: defaults::RAM_BASE,
                size: defaults::RAM_SIZE,
                kind: RegionKind::Ram,
            },
        ]
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            regions: Self::default_regions(),
        }
    }
}

/// Serial line used instead of TCP.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyUSB0`
    pub device: String,
    /// Line rate
    #[serde(default = "SerialConfig::default_baud")]
    pub baud: u32,
}

impl SerialConfig {
    /// Returns the default line rate.
    const fn default_baud() -> u32 {
        defaults::SERIAL_BAUD
    }
}

/// Debugger transport and protocol settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GdbConfig {
    /// TCP port to listen on
    #[serde(default = "GdbConfig::default_port")]
    pub port: u16,

    /// Use this serial line instead of TCP
    #[serde(default)]
    pub serial: Option<SerialConfig>,

    /// Receive timeout in milliseconds; none blocks forever
    #[serde(default)]
    pub receive_timeout_ms: Option<u64>,

    /// Packet buffer capacity in bytes
    #[serde(default = "GdbConfig::default_packet_size")]
    pub packet_size: usize,
}

impl GdbConfig {
    /// Returns the default TCP port.
    const fn default_port() -> u16 {
        defaults::GDB_PORT
    }

    /// Returns the default packet buffer capacity.
    const fn default_packet_size() -> usize {
        defaults::PACKET_SIZE
    }
}

impl Default for GdbConfig {
    fn default() -> Self {
        Self {
            port: defaults::GDB_PORT,
            serial: None,
            receive_timeout_ms: None,
            packet_size: defaults::PACKET_SIZE,
        }
    }
}
