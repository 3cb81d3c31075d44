//! ARMv6-M architecture-specific components.
//!
//! This module contains the implementation of core ARMv6-M architectural elements.
//! It includes the following modules:
//! 1. **Context:** The register file (R0-R12, SP, LR, PC), xPSR, and PRIMASK.
//! 2. **PSR:** Condition flag views and the special-register numbering used by MSR/MRS.

/// CPU register context.
pub mod context;

/// Program status register helpers and special-register numbers.
pub mod psr;

pub use context::CpuContext;
pub use psr::Flags;
