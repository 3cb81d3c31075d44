//! Simulation driver, program loading, and semihosting.
//!
//! Provides the [`Simulator`] that bundles CPU context and memory, utilities
//! for loading images and setting the reset state, and the host side of ARM
//! semihosting.

/// Image loading and reset.
pub mod loader;

/// `BKPT #0xAB` host calls.
pub mod semihost;

/// Context, memory, and statistics owner.
pub mod simulator;

pub use self::loader::LoadedImage;
pub use self::semihost::SemihostAction;
pub use self::simulator::Simulator;
