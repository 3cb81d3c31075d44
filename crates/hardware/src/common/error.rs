//! Step results and error definitions.
//!
//! This module defines the outcome and error types shared by the simulator. It provides:
//! 1. **Step Results:** The closed set of outcomes the executor and run loop report.
//! 2. **Bus Errors:** Failed CPU or debugger memory accesses.
//! 3. **Plumbing Errors:** Region setup, image loading, and configuration failures.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::data::AccessType;

/// Outcome of executing one instruction or one run-loop invocation.
///
/// Decode and execute never return `Err`; every architectural event is
/// reported through one of these values instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StepResult {
    /// The instruction completed normally.
    Ok,
    /// The encoding is not a defined ARMv6-M instruction. PC is unchanged.
    Undefined,
    /// The encoding is defined but its operands are UNPREDICTABLE. PC is unchanged.
    Unpredictable,
    /// A fetch, load, or store faulted, or the Thumb bit was clear. PC is unchanged.
    HardFault,
    /// A BKPT instruction was reached. PC still points at it.
    Bkpt,
    /// An architecturally valid instruction this simulator does not model. PC is advanced.
    Unsupported,
    /// An SVC instruction executed. PC is advanced.
    Svc,
    /// The run-loop predicate requested a stop before the next instruction.
    Interrupt,
    /// A watchpoint latched during the previous instruction.
    Watchpoint,
}

impl StepResult {
    /// Returns `true` when the instruction left PC past itself.
    ///
    /// Only SVC and unsupported instructions advance PC while still stopping.
    pub const fn advances_pc(self) -> bool {
        matches!(self, Self::Ok | Self::Svc | Self::Unsupported)
    }

    /// Returns `true` for results produced by a faulting instruction.
    pub const fn is_fault(self) -> bool {
        matches!(
            self,
            Self::Undefined | Self::Unpredictable | Self::HardFault | Self::Unsupported
        )
    }
}

impl fmt::Display for StepResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ok => "ok",
            Self::Undefined => "undefined instruction",
            Self::Unpredictable => "unpredictable instruction",
            Self::HardFault => "hard fault",
            Self::Bkpt => "breakpoint",
            Self::Unsupported => "unsupported instruction",
            Self::Svc => "supervisor call",
            Self::Interrupt => "interrupt",
            Self::Watchpoint => "watchpoint",
        })
    }
}

/// Reason a single memory access failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusFault {
    /// No declared region holds the whole access.
    Unmapped,
    /// The address is not aligned to the access size.
    Misaligned,
    /// A CPU write targeted a read-only region.
    ReadOnly,
    /// A halfword read landed on a breakpoint.
    Breakpoint,
}

/// A failed memory access.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("bus error: {size}-byte {access} at {address:#010x} ({fault:?})")]
pub struct BusError {
    /// Address of the access.
    pub address: u32,
    /// Width of the access in bytes.
    pub size: u32,
    /// Kind of access that failed.
    pub access: AccessType,
    /// Why the access failed.
    pub fault: BusFault,
}

impl BusError {
    /// Creates a bus error for an access of `size` bytes at `address`.
    pub const fn new(address: u32, size: u32, access: AccessType, fault: BusFault) -> Self {
        Self {
            address,
            size,
            access,
            fault,
        }
    }
}

impl From<BusError> for StepResult {
    /// Every bus error seen by the executor is a hard fault.
    fn from(_: BusError) -> Self {
        Self::HardFault
    }
}

/// Errors raised while building memory regions or editing watchpoints.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// A region with no bytes was requested.
    #[error("region at {base:#010x} has zero size")]
    ZeroSize {
        /// Requested base address.
        base: u32,
    },

    /// The region would extend past the end of the 32-bit address space.
    #[error("region at {base:#010x} with size {size:#x} wraps the address space")]
    AddressOverflow {
        /// Requested base address.
        base: u32,
        /// Requested size in bytes.
        size: u32,
    },

    /// The region overlaps one already declared.
    #[error("region {base:#010x}+{size:#x} overlaps region at {existing:#010x}")]
    Overlap {
        /// Requested base address.
        base: u32,
        /// Requested size in bytes.
        size: u32,
        /// Base of the existing region.
        existing: u32,
    },

    /// No region holds the requested address range.
    #[error("no region holds {address:#010x}+{size:#x}")]
    Unmapped {
        /// First address of the range.
        address: u32,
        /// Length of the range in bytes.
        size: u32,
    },

    /// An identical watchpoint is already installed.
    #[error("watchpoint already present at {address:#010x}")]
    AlreadyPresent {
        /// Start address of the watchpoint.
        address: u32,
    },

    /// No matching watchpoint is installed.
    #[error("no watchpoint at {address:#010x}")]
    NotFound {
        /// Start address of the watchpoint.
        address: u32,
    },
}

/// Errors raised while loading a program image.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The image file could not be read.
    #[error("failed to read image '{path}': {source}")]
    Io {
        /// Path to the image.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The ELF headers could not be parsed.
    #[error("malformed ELF image: {0}")]
    Elf(String),

    /// The ELF file targets another architecture or word size.
    #[error("ELF image is not a 32-bit ARM executable (machine {machine})")]
    WrongMachine {
        /// The `e_machine` value found.
        machine: u16,
    },

    /// A segment does not fit the declared memory regions.
    #[error("segment {address:#010x}+{size:#x} is outside simulated memory")]
    SegmentOutsideMemory {
        /// Load address of the segment.
        address: u32,
        /// Size of the segment in bytes.
        size: u32,
    },

    /// The image holds nothing to load.
    #[error("image contains no loadable data")]
    Empty,

    /// No region exists to place a raw binary in.
    #[error("no memory region available for a raw binary")]
    NoRegion,
}

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config '{path}': {source}")]
    Io {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The configuration text is not valid JSON for [`Config`](crate::config::Config).
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configured regions could not be built.
    #[error(transparent)]
    Memory(#[from] MemoryError),
}
