//! Command-line arguments.
//!
//! Flags override the matching fields of the JSON configuration. Numbers
//! accept `0x`-prefixed hex or decimal.

use std::path::PathBuf;

use clap::Parser;
use pinkysim_core::config::{Config, RegionConfig, RegionKind, SerialConfig};

/// Shown after argument errors.
pub const COPYRIGHT: &str = "pinkysim - ARMv6-M simulator with a GDB remote stub.\n\
Copyright (C) the pinkysim authors. Licensed under MIT OR Apache-2.0.";

#[derive(Parser, Debug)]
#[command(
    name = "pinkysim",
    author,
    version,
    about = "ARMv6-M Thumb simulator with a GDB remote serial protocol server",
    long_about = "Load an ELF or raw binary image and run it under a GDB stub.\n\n\
Without --breakOnStart the image runs until it stops; connect with\n  \
arm-none-eabi-gdb -ex 'target remote :3333' image.elf"
)]
pub struct Cli {
    /// Declare a RAM region (repeatable).
    #[arg(long, num_args = 2, value_names = ["BASE", "SIZE"], value_parser = parse_number)]
    pub ram: Vec<u32>,

    /// Declare a read-only flash region (repeatable).
    #[arg(long, num_args = 2, value_names = ["BASE", "SIZE"], value_parser = parse_number)]
    pub flash: Vec<u32>,

    /// TCP port GDB connects to [default: 3333].
    #[arg(long = "gdbPort", value_name = "PORT")]
    pub gdb_port: Option<u16>,

    /// Talk to GDB over this serial device instead of TCP.
    #[arg(long, value_name = "DEVICE")]
    pub serial: Option<String>,

    /// Serial line rate.
    #[arg(long, value_name = "BAUD")]
    pub baud: Option<u32>,

    /// Stop before the first instruction and wait for GDB.
    #[arg(long = "breakOnStart")]
    pub break_on_start: bool,

    /// JSON configuration file.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log every executed instruction.
    #[arg(long)]
    pub trace: bool,

    /// Print instruction statistics and the final registers at exit.
    #[arg(long)]
    pub stats: bool,

    /// ELF or raw binary image to run.
    pub image: PathBuf,

    /// Arguments passed to the program through semihosting.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl Cli {
    /// Applies the flags on top of `config`.
    ///
    /// Region flags replace the configured memory map as a whole.
    pub fn apply(&self, config: &mut Config) {
        let regions: Vec<RegionConfig> = pairs(&self.flash, RegionKind::Flash)
            .chain(pairs(&self.ram, RegionKind::Ram))
            .collect();
        if !regions.is_empty() {
            config.memory.regions = regions;
        }
        if let Some(port) = self.gdb_port {
            config.gdb.port = port;
        }
        if let Some(device) = &self.serial {
            let baud = self
                .baud
                .or_else(|| config.gdb.serial.as_ref().map(|s| s.baud))
                .unwrap_or(115_200);
            config.gdb.serial = Some(SerialConfig {
                device: device.clone(),
                baud,
            });
        } else if let (Some(baud), Some(serial)) = (self.baud, config.gdb.serial.as_mut()) {
            serial.baud = baud;
        }
        config.general.break_on_start |= self.break_on_start;
        config.general.trace_instructions |= self.trace;
        config.general.print_stats |= self.stats;
    }

    /// Command line seen by the program: the image name followed by its arguments.
    pub fn command_line(&self) -> String {
        std::iter::once(self.image.display().to_string())
            .chain(self.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn pairs(values: &[u32], kind: RegionKind) -> impl Iterator<Item = RegionConfig> + '_ {
    values.chunks_exact(2).map(move |pair| RegionConfig {
        base: pair[0],
        size: pair[1],
        kind,
    })
}

/// Parses `0x`-prefixed hex or decimal.
fn parse_number(text: &str) -> Result<u32, String> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|e| format!("invalid number '{text}': {e}"))
}
