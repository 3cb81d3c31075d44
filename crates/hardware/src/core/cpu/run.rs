//! Run Loop.
//!
//! Alternates a caller-supplied predicate with single steps. The predicate
//! runs before every instruction and is how the debug stub injects
//! interrupt requests and watchpoint stops.

use super::step_observed;
use crate::common::StepResult;
use crate::core::arch::CpuContext;
use crate::isa::Instruction;
use crate::soc::Memory;

/// Runs until `check` or an instruction returns something other than `Ok`.
///
/// # Arguments
///
/// * `ctx` - CPU context.
/// * `mem` - Memory backend.
/// * `check` - Called before every instruction; a non-`Ok` result stops the loop
///   before that instruction executes.
pub fn run<M, C>(ctx: &mut CpuContext, mem: &mut M, check: C) -> StepResult
where
    M: Memory + ?Sized,
    C: FnMut(&mut CpuContext, &mut M) -> StepResult,
{
    run_observed(ctx, mem, check, |_, _, _| {})
}

/// Like [`run`], reporting every executed instruction to `observe`.
pub fn run_observed<M, C, F>(
    ctx: &mut CpuContext,
    mem: &mut M,
    mut check: C,
    mut observe: F,
) -> StepResult
where
    M: Memory + ?Sized,
    C: FnMut(&mut CpuContext, &mut M) -> StepResult,
    F: FnMut(u32, &Instruction, StepResult),
{
    loop {
        let result = check(ctx, mem);
        if result != StepResult::Ok {
            return result;
        }
        let result = step_observed(ctx, mem, &mut observe);
        if result != StepResult::Ok {
            return result;
        }
    }
}
