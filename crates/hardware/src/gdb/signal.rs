//! Stop-reason to signal mapping.
//!
//! GDB learns why the target stopped from a POSIX signal number in the stop
//! reply. Faults also carry a short console message forwarded as an `O` packet.

use crate::common::StepResult;
use crate::soc::{WatchKind, WatchpointHit};

/// Interrupted by the debugger.
pub const SIGINT: u8 = 2;
/// Illegal instruction.
pub const SIGILL: u8 = 4;
/// Trace or breakpoint trap.
pub const SIGTRAP: u8 = 5;
/// Invalid memory access.
pub const SIGSEGV: u8 = 11;

/// Why the target last stopped, as reported to GDB.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StopReason {
    /// Signal number for the `T` packet.
    pub signal: u8,
    /// Console text for faults.
    pub message: Option<&'static str>,
    /// The watchpoint that triggered the stop, if any.
    pub watchpoint: Option<WatchpointHit>,
}

impl StopReason {
    /// A plain trap, used for single steps and the initial stop.
    pub const TRAP: Self = Self {
        signal: SIGTRAP,
        message: None,
        watchpoint: None,
    };

    /// Classifies a run-loop or step result.
    ///
    /// # Arguments
    ///
    /// * `result` - What the executor or run loop returned.
    /// * `at_breakpoint` - Whether PC sits on an installed breakpoint.
    /// * `watchpoint` - The latched hit when `result` is [`StepResult::Watchpoint`].
    pub const fn classify(
        result: StepResult,
        at_breakpoint: bool,
        watchpoint: Option<WatchpointHit>,
    ) -> Self {
        let (signal, message) = match result {
            StepResult::Ok | StepResult::Bkpt | StepResult::Watchpoint => (SIGTRAP, None),
            StepResult::Interrupt => (SIGINT, None),
            StepResult::Svc => (SIGTRAP, Some("**SVC Call**")),
            StepResult::Undefined => (SIGILL, Some("**Undefined Instruction**")),
            StepResult::Unpredictable => (SIGILL, Some("**Unpredictable Instruction**")),
            StepResult::Unsupported => (SIGILL, Some("**Unsupported Instruction**")),
            StepResult::HardFault if at_breakpoint => (SIGTRAP, None),
            StepResult::HardFault => (SIGSEGV, Some("**Hard Fault**")),
        };
        let watchpoint = if matches!(result, StepResult::Watchpoint) {
            watchpoint
        } else {
            None
        };
        Self {
            signal,
            message,
            watchpoint,
        }
    }

    /// The stop-reply field name announcing the watchpoint.
    pub const fn watch_field(hit: &WatchpointHit) -> &'static str {
        match hit.kind {
            WatchKind::Write => "watch",
            WatchKind::Read => "rwatch",
            WatchKind::ReadWrite | WatchKind::Breakpoint => "awatch",
        }
    }
}
