//! Simulator: owns the CPU context, the memory backend, and statistics side-by-side.
//!
//! The executor works on borrowed context and memory; this type keeps the
//! two together with the host-side semihosting state so the debug stub and
//! the CLI drive one value.

use std::path::Path;

use crate::common::{ConfigError, LoadError, StepResult};
use crate::common::constants::{BKPT_OPCODE, BKPT_OPCODE_MASK, SEMIHOST_BKPT_ENCODING};
use crate::config::Config;
use crate::core::arch::CpuContext;
use crate::core::cpu::{run_observed, step_observed};
use crate::isa::Instruction;
use crate::sim::loader::{self, LoadedImage};
use crate::sim::semihost::{SemihostAction, SemihostHost};
use crate::soc::{Memory, MemorySim};
use crate::stats::SimStats;

/// Top-level simulator: CPU architectural state, memory, and bookkeeping.
#[derive(Debug)]
pub struct Simulator {
    /// CPU registers and flags.
    pub context: CpuContext,
    /// Simulated memory.
    pub memory: MemorySim,
    /// Instruction mix and stop counters.
    pub stats: SimStats,
    host: SemihostHost,
    trace: bool,
}

impl Simulator {
    /// Creates a simulator over `memory` with a reset context.
    pub fn new(memory: MemorySim) -> Self {
        Self {
            context: CpuContext::new(),
            memory,
            stats: SimStats::default(),
            host: SemihostHost::default(),
            trace: false,
        }
    }

    /// Builds the memory map from `config` and applies its general options.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the regions are invalid.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let mut sim = Self::new(config.build_memory()?);
        sim.trace = config.general.trace_instructions;
        Ok(sim)
    }

    /// Enables or disables per-instruction tracing.
    #[must_use]
    pub const fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Sets the command line returned by SYS_GET_CMDLINE.
    #[must_use]
    pub fn with_command_line(mut self, command_line: String) -> Self {
        self.host = SemihostHost::new(command_line);
        self
    }

    /// Loads `data` and resets the CPU from its vector table.
    ///
    /// # Errors
    ///
    /// Propagates [`LoadError`] from the loader.
    pub fn load_image(&mut self, data: &[u8]) -> Result<LoadedImage, LoadError> {
        let image = loader::load_bytes(&mut self.memory, data)?;
        loader::reset(&mut self.context, &mut self.memory, &image);
        Ok(image)
    }

    /// Loads the image at `path` and resets the CPU from its vector table.
    ///
    /// # Errors
    ///
    /// Propagates [`LoadError`] from the loader.
    pub fn load_file(&mut self, path: &Path) -> Result<LoadedImage, LoadError> {
        let image = loader::load_file(&mut self.memory, path)?;
        loader::reset(&mut self.context, &mut self.memory, &image);
        Ok(image)
    }

    /// Executes one instruction.
    pub fn step(&mut self) -> StepResult {
        let Self {
            context,
            memory,
            stats,
            trace,
            ..
        } = self;
        let trace = cfg!(feature = "always-trace") || *trace;
        step_observed(context, memory, |pc, insn, result| {
            observe(stats, trace, pc, insn, result);
        })
    }

    /// Runs until `check` or an instruction returns something other than `Ok`.
    ///
    /// `check` runs before every instruction; see [`run`](crate::core::cpu::run).
    pub fn run<C>(&mut self, check: C) -> StepResult
    where
        C: FnMut(&mut CpuContext, &mut MemorySim) -> StepResult,
    {
        let Self {
            context,
            memory,
            stats,
            trace,
            ..
        } = self;
        let trace = cfg!(feature = "always-trace") || *trace;
        run_observed(context, memory, check, |pc, insn, result| {
            observe(stats, trace, pc, insn, result);
        })
    }

    /// Immediate of the BKPT at PC, if PC points at one.
    ///
    /// Reads through the debug path so installed breakpoints do not interfere.
    pub fn bkpt_immediate(&mut self) -> Option<u8> {
        let hw = self.halfword_at_pc()?;
        (hw & BKPT_OPCODE_MASK == BKPT_OPCODE).then_some(hw as u8)
    }

    /// Returns `true` when PC points at `BKPT #0xAB`.
    pub fn at_semihost_call(&mut self) -> bool {
        self.halfword_at_pc() == Some(SEMIHOST_BKPT_ENCODING)
    }

    fn halfword_at_pc(&mut self) -> Option<u16> {
        let pc = self.context.pc;
        let lo = self.memory.debug_read8(pc).ok()?;
        let hi = self.memory.debug_read8(pc.wrapping_add(1)).ok()?;
        Some(u16::from_le_bytes([lo, hi]))
    }

    /// Services the semihosting call at PC, appending console output to `out`.
    pub fn service_semihost(&mut self, out: &mut Vec<u8>) -> SemihostAction {
        let operation = self.context.r[0];
        let action = self.host.service(&mut self.context, &mut self.memory, out);
        tracing::debug!(operation = format_args!("{operation:#x}"), ?action, "semihosting call");
        action
    }

    /// Returns `true` when PC sits on an installed breakpoint.
    pub fn at_breakpoint(&self) -> bool {
        self.memory.is_breakpoint_at(self.context.pc)
    }
}

fn observe(stats: &mut SimStats, trace: bool, pc: u32, insn: &Instruction, result: StepResult) {
    stats.record(insn, result);
    if trace {
        tracing::trace!("{pc:#010x}: {insn}  [{result}]");
    }
}
