//! Instruction Stepping.
//!
//! This module drives one instruction at a time against a [`CpuContext`] and a
//! [`Memory`] backend. It coordinates the following:
//! 1. **Fetch:** Reads one or two halfwords at PC once the Thumb bit is checked.
//! 2. **Execution:** Decodes and applies the instruction.
//! 3. **PC Update:** Advances PC unless the instruction wrote it or stopped without completing.
//! 4. **Run Loop:** Repeats steps until a predicate or an instruction requests a stop.

/// Per-instruction execution.
pub mod execution;

/// Fetch and checked data access.
pub mod memory;

/// The predicate-driven run loop.
pub mod run;

use self::execution::{Flow, execute};
use crate::common::StepResult;
use crate::core::arch::CpuContext;
use crate::isa::Instruction;
use crate::soc::Memory;

pub use self::run::{run, run_observed};

/// Executes exactly one instruction.
///
/// # Returns
///
/// [`StepResult::Ok`] when the instruction completed, otherwise the reason it
/// stopped. PC is unchanged for `Undefined`, `Unpredictable`, `HardFault`, and
/// `Bkpt`, and advanced past the instruction for `Svc` and `Unsupported`.
pub fn step<M: Memory + ?Sized>(ctx: &mut CpuContext, mem: &mut M) -> StepResult {
    step_observed(ctx, mem, |_, _, _| {})
}

/// Executes one instruction and reports it to `observe`.
///
/// `observe` receives the instruction address, the decoded instruction, and
/// the result. It is not called when the fetch itself fails.
pub fn step_observed<M, F>(ctx: &mut CpuContext, mem: &mut M, mut observe: F) -> StepResult
where
    M: Memory + ?Sized,
    F: FnMut(u32, &Instruction, StepResult),
{
    if !ctx.thumb() {
        tracing::debug!(pc = format_args!("{:#010x}", ctx.pc), "thumb bit clear");
        return StepResult::HardFault;
    }
    let pc = ctx.pc;
    let Ok((insn, size)) = memory::fetch(mem, pc) else {
        return StepResult::HardFault;
    };
    let result = match execute(ctx, mem, insn) {
        Ok(Flow::Next) => {
            ctx.pc = pc.wrapping_add(size);
            StepResult::Ok
        }
        Ok(Flow::Jump) => StepResult::Ok,
        Err(stop) => {
            if stop.advances_pc() {
                ctx.pc = pc.wrapping_add(size);
            }
            stop
        }
    };
    observe(pc, &insn, result);
    result
}
