//! Common utilities and types used throughout the ARMv6-M simulator.
//!
//! This module provides fundamental building blocks that are shared across all components
//! of the simulator. It includes:
//! 1. **Constants:** xPSR bit layout, instruction sizes, and semihosting markers.
//! 2. **Memory Access:** Definitions for categorizing memory operations (Fetch/Read/Write).
//! 3. **Error Handling:** Step results for the executor and error enums for the plumbing.

/// Common constants used throughout the simulator.
pub mod constants;

/// Memory access type definitions.
pub mod data;

/// Step results and error types.
pub mod error;

pub use data::AccessType;
pub use error::{BusError, BusFault, ConfigError, LoadError, MemoryError, StepResult};
