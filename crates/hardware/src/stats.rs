//! Simulation statistics collection and reporting.
//!
//! This module tracks what the simulated program executed. It provides:
//! 1. **Throughput:** Retired instructions, host time, and derived MIPS.
//! 2. **Instruction mix:** Counts by category (ALU, load, store, branch, system).
//! 3. **Stops:** Faults, breakpoints, and semihosting calls seen by the run loop.

use std::time::Instant;

use crate::common::StepResult;
use crate::common::constants::SEMIHOST_BKPT_IMMEDIATE;
use crate::isa::{Instruction, InstructionClass};

/// Simulation statistics structure.
///
/// Updated once per executed instruction by the simulator's observer.
#[derive(Clone, Debug)]
pub struct SimStats {
    start_time: Instant,
    /// Number of instructions that completed.
    pub instructions_retired: u64,

    /// Count of load instructions retired.
    pub inst_load: u64,
    /// Count of store instructions retired.
    pub inst_store: u64,
    /// Count of branch instructions retired.
    pub inst_branch: u64,
    /// Count of data-processing instructions retired.
    pub inst_alu: u64,
    /// Count of system instructions (MSR, MRS, CPS, hints, barriers) retired.
    pub inst_system: u64,

    /// Instructions that stopped with a fault result.
    pub faults: u64,
    /// BKPT instructions reached.
    pub breakpoints: u64,
    /// Semihosting calls serviced.
    pub semihost_calls: u64,
}

impl Default for SimStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            instructions_retired: 0,
            inst_load: 0,
            inst_store: 0,
            inst_branch: 0,
            inst_alu: 0,
            inst_system: 0,
            faults: 0,
            breakpoints: 0,
            semihost_calls: 0,
        }
    }
}

impl SimStats {
    /// Records one executed instruction.
    ///
    /// Only instructions that completed (or advanced PC past themselves)
    /// count towards the mix. A fault is counted once, as a fault, even when
    /// PC moved past it. `BKPT #0xAB` counts as a semihosting call.
    pub const fn record(&mut self, insn: &Instruction, result: StepResult) {
        if result.is_fault() {
            self.faults += 1;
            return;
        }
        match (insn, result) {
            (Instruction::Bkpt { imm }, StepResult::Bkpt) if *imm == SEMIHOST_BKPT_IMMEDIATE => {
                self.semihost_calls += 1;
            }
            (_, StepResult::Bkpt) => self.breakpoints += 1,
            _ => {}
        }
        if !result.advances_pc() {
            return;
        }
        self.instructions_retired += 1;
        match insn.class() {
            InstructionClass::Alu => self.inst_alu += 1,
            InstructionClass::Load => self.inst_load += 1,
            InstructionClass::Store => self.inst_store += 1,
            InstructionClass::Branch => self.inst_branch += 1,
            InstructionClass::System => self.inst_system += 1,
        }
    }

    /// Prints all statistics to stdout.
    pub fn print(&self) {
        let seconds = self.start_time.elapsed().as_secs_f64();
        let instr = self.instructions_retired.max(1) as f64;
        let mips = if seconds > 0.0 {
            (self.instructions_retired as f64 / seconds) / 1_000_000.0
        } else {
            0.0
        };
        let share = |count: u64| (count as f64 / instr) * 100.0;

        println!("\n==========================================================");
        println!("ARMv6-M SIMULATION STATISTICS");
        println!("==========================================================");
        println!("host_seconds             {seconds:.4} s");
        println!("sim_insts                {}", self.instructions_retired);
        println!("sim_mips                 {mips:.2}");
        println!("----------------------------------------------------------");
        println!("INSTRUCTION MIX");
        println!(
            "  op.alu                 {} ({:.2}%)",
            self.inst_alu,
            share(self.inst_alu)
        );
        println!(
            "  op.load                {} ({:.2}%)",
            self.inst_load,
            share(self.inst_load)
        );
        println!(
            "  op.store               {} ({:.2}%)",
            self.inst_store,
            share(self.inst_store)
        );
        println!(
            "  op.branch              {} ({:.2}%)",
            self.inst_branch,
            share(self.inst_branch)
        );
        println!(
            "  op.system              {} ({:.2}%)",
            self.inst_system,
            share(self.inst_system)
        );
        println!("----------------------------------------------------------");
        println!("STOPS");
        println!("  stop.faults            {}", self.faults);
        println!("  stop.breakpoints       {}", self.breakpoints);
        println!("  stop.semihost          {}", self.semihost_calls);
        println!("==========================================================");
    }
}
