//! GDB Remote Serial Protocol stub.
//!
//! This module drives a debug session over a [`Comm`]. It coordinates the following:
//! 1. **Execution:** Runs or single-steps the simulator, polling the debugger for interrupts.
//! 2. **Semihosting:** Services `BKPT #0xAB` host calls in place and resumes.
//! 3. **Monitor:** Reports each stop and serves packets until the debugger resumes, kills, or detaches.

use std::io::{self, Write as _};

use thiserror::Error;

use super::buffer::{Buffer, BufferError};
use super::comm::{Comm, CommError};
use super::commands::{self, BreakpointSpec, Command};
use super::packet::PacketEngine;
use super::registers;
use super::signal::StopReason;
use super::xml;
use crate::common::StepResult;
use crate::common::constants::INSTRUCTION_SIZE_16;
use crate::core::arch::context::SP;
use crate::sim::{SemihostAction, Simulator};
use crate::soc::{Memory, WatchpointHit};

/// Instructions executed between two polls of the debugger channel.
const COMM_POLL_INTERVAL: u32 = 1024;

/// Interrupt request byte sent by GDB while the target runs.
const INTERRUPT: u8 = 0x03;

/// Malformed arguments.
const ERROR_ARGUMENT: &str = "E01";
/// Memory access failed.
const ERROR_MEMORY: &str = "E03";
/// Breakpoint or watchpoint table update failed.
const ERROR_BREAKPOINT: &str = "E04";

/// How a debug session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEnd {
    /// The program terminated through semihosting with this exit code.
    Exited(i32),
    /// The debugger sent `k`.
    Killed,
    /// The debugger sent `D`.
    Detached,
    /// The debugger went away.
    Disconnected,
}

/// Errors that end a session abnormally.
#[derive(Debug, Error)]
pub enum StubError {
    /// The debugger channel failed.
    #[error(transparent)]
    Comm(#[from] CommError),
}

/// How execution resumes after the monitor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Resume {
    Continue,
    Step,
}

/// Outcome of one execution burst.
enum Execution {
    Stopped(StopReason),
    Exited(i32),
}

/// Outcome of one debugger command.
enum Action {
    Reply,
    Resume(Resume),
    Detach,
    Kill,
}

/// Debug stub owning the simulator and the debugger channel.
#[derive(Debug)]
pub struct GdbStub<C: Comm> {
    sim: Simulator,
    comm: C,
    engine: PacketEngine,
    buffer: Buffer,
    last_stop: StopReason,
    break_on_start: bool,
}

impl<C: Comm> GdbStub<C> {
    /// Creates a stub with a packet buffer of `packet_size` bytes.
    ///
    /// # Arguments
    ///
    /// * `sim` - Simulator with the image already loaded.
    /// * `comm` - Channel to the debugger.
    /// * `packet_size` - Largest packet payload accepted or sent.
    pub fn new(sim: Simulator, comm: C, packet_size: usize) -> Self {
        Self {
            sim,
            comm,
            engine: PacketEngine::new(),
            buffer: Buffer::new(packet_size),
            last_stop: StopReason::TRAP,
            break_on_start: false,
        }
    }

    /// Stops before the first instruction instead of running straight away.
    #[must_use]
    pub const fn break_on_start(mut self, enabled: bool) -> Self {
        self.break_on_start = enabled;
        self
    }

    /// The simulator.
    pub const fn simulator(&self) -> &Simulator {
        &self.sim
    }

    /// The simulator, mutably.
    pub const fn simulator_mut(&mut self) -> &mut Simulator {
        &mut self.sim
    }

    /// The debugger channel.
    pub const fn comm(&self) -> &C {
        &self.comm
    }

    /// Packet counters.
    pub const fn engine(&self) -> &PacketEngine {
        &self.engine
    }

    /// The most recent stop reported to the debugger.
    pub const fn last_stop(&self) -> StopReason {
        self.last_stop
    }

    /// Consumes the stub, returning the simulator and the channel.
    pub fn into_parts(self) -> (Simulator, C) {
        (self.sim, self.comm)
    }

    /// Runs the session until the program exits or the debugger leaves.
    ///
    /// # Errors
    ///
    /// Returns [`StubError::Comm`] when the channel fails for any reason other
    /// than the debugger disconnecting, which ends the session normally.
    pub fn run(&mut self) -> Result<SessionEnd, StubError> {
        match self.session() {
            Err(StubError::Comm(CommError::Disconnected)) => Ok(SessionEnd::Disconnected),
            other => other,
        }
    }

    fn session(&mut self) -> Result<SessionEnd, StubError> {
        let mut next = if self.break_on_start {
            None
        } else {
            Some(Resume::Continue)
        };
        loop {
            let reason = match next {
                None => StopReason::TRAP,
                Some(resume) => match self.execute(resume)? {
                    Execution::Stopped(reason) => reason,
                    Execution::Exited(code) => return self.exit(code),
                },
            };
            if self.comm.should_stop_run() {
                return Ok(SessionEnd::Disconnected);
            }
            self.last_stop = reason;
            tracing::debug!(
                signal = reason.signal,
                pc = format_args!("{:#010x}", self.sim.context.pc),
                "target stopped"
            );
            match self.monitor()? {
                Action::Resume(resume) => next = Some(resume),
                Action::Detach => return Ok(SessionEnd::Detached),
                Action::Kill => return Ok(SessionEnd::Killed),
                Action::Reply => {}
            }
        }
    }

    /// Executes until a stop-worthy result, servicing semihosting calls on the way.
    fn execute(&mut self, resume: Resume) -> Result<Execution, StubError> {
        let _ = self.sim.memory.take_watchpoint_hit();
        loop {
            let (result, hit) = match resume {
                Resume::Continue => self.run_until_stop()?,
                Resume::Step => self.single_step(),
            };
            if result == StepResult::Bkpt && self.sim.at_semihost_call() {
                let mut out = Vec::new();
                let action = self.sim.service_semihost(&mut out);
                self.console(&out)?;
                match action {
                    SemihostAction::Exit(code) => return Ok(Execution::Exited(code)),
                    SemihostAction::Resume if resume == Resume::Step => {
                        return Ok(Execution::Stopped(StopReason::TRAP));
                    }
                    SemihostAction::Resume => continue,
                }
            }
            let at_breakpoint = self.sim.at_breakpoint();
            return Ok(Execution::Stopped(StopReason::classify(
                result,
                at_breakpoint,
                hit,
            )));
        }
    }

    fn single_step(&mut self) -> (StepResult, Option<WatchpointHit>) {
        let result = self.sim.step();
        match self.sim.memory.take_watchpoint_hit() {
            Some(hit) if result == StepResult::Ok => (StepResult::Watchpoint, Some(hit)),
            _ => (result, None),
        }
    }

    fn run_until_stop(&mut self) -> Result<(StepResult, Option<WatchpointHit>), StubError> {
        let comm = &mut self.comm;
        let mut hit = None;
        let mut countdown = 0u32;
        let result = self.sim.run(|_, mem| {
            if let Some(latched) = mem.take_watchpoint_hit() {
                hit = Some(latched);
                return StepResult::Watchpoint;
            }
            if countdown == 0 {
                countdown = COMM_POLL_INTERVAL;
                if comm.has_receive_data() || comm.should_stop_run() {
                    return StepResult::Interrupt;
                }
            }
            countdown -= 1;
            StepResult::Ok
        });
        if result == StepResult::Interrupt && !self.comm.should_stop_run() {
            let c = self.comm.receive_char()?;
            if c != INTERRUPT {
                tracing::debug!(byte = c, "discarded input while running");
            }
        }
        Ok((result, hit))
    }

    /// Sends console output as `O` packets, or to stdout with no debugger attached.
    fn console(&mut self, text: &[u8]) -> Result<(), StubError> {
        if text.is_empty() {
            return Ok(());
        }
        if !self.comm.is_gdb_connected() {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(text)
                .and_then(|()| stdout.flush())
                .map_err(CommError::from)?;
            return Ok(());
        }
        let chunk = (self.buffer.capacity().saturating_sub(1) / 2).max(1);
        for part in text.chunks(chunk) {
            self.buffer.reset();
            let written = self
                .buffer
                .write_byte(b'O')
                .and_then(|()| self.buffer.write_as_hex(part));
            if written.is_ok() {
                self.engine.send(&mut self.comm, &mut self.buffer)?;
            }
        }
        Ok(())
    }

    fn exit(&mut self, code: i32) -> Result<SessionEnd, StubError> {
        tracing::info!(code, "program exited");
        if self.comm.is_gdb_connected() {
            self.buffer.reset();
            if self
                .buffer
                .write_byte(b'W')
                .and_then(|()| self.buffer.write_byte_as_hex(code as u8))
                .is_ok()
            {
                self.engine.send(&mut self.comm, &mut self.buffer)?;
            }
        }
        Ok(SessionEnd::Exited(code))
    }

    /// Reports the stop and serves packets until one resumes or ends the session.
    fn monitor(&mut self) -> Result<Action, StubError> {
        if let Some(message) = self.last_stop.message {
            self.console(message.as_bytes())?;
        }
        if self.comm.is_gdb_connected() {
            self.buffer.reset();
            self.reply(Self::write_stop_reply)?;
        }
        loop {
            self.engine.get(&mut self.comm, &mut self.buffer)?;
            let command = if self.buffer.overrun() {
                Err(BufferError::Overrun)
            } else {
                commands::parse(&mut self.buffer)
            };
            self.buffer.reset();
            let action = command.and_then(|c| self.handle(c)).unwrap_or_else(|err| {
                tracing::debug!("malformed command: {err}");
                self.buffer.reset();
                let _ = self.buffer.write_str(ERROR_ARGUMENT);
                Action::Reply
            });
            match action {
                Action::Reply => self.engine.send(&mut self.comm, &mut self.buffer)?,
                Action::Detach => {
                    self.engine.send(&mut self.comm, &mut self.buffer)?;
                    tracing::info!("debugger detached");
                    return Ok(Action::Detach);
                }
                Action::Kill => {
                    tracing::info!("debugger killed the target");
                    return Ok(Action::Kill);
                }
                Action::Resume(_) => return Ok(action),
            }
        }
    }

    /// Builds a reply with `write` and sends it, falling back to `E01` if it does not fit.
    fn reply(&mut self, write: fn(&mut Self) -> Result<(), BufferError>) -> Result<(), StubError> {
        if write(self).is_err() {
            self.buffer.reset();
            let _ = self.buffer.write_str(ERROR_ARGUMENT);
        }
        self.engine.send(&mut self.comm, &mut self.buffer)?;
        Ok(())
    }

    /// `T<sig>[watch:addr;]0d:sp;0e:lr;0f:pc;10:xpsr;`
    fn write_stop_reply(&mut self) -> Result<(), BufferError> {
        let stop = self.last_stop;
        let buffer = &mut self.buffer;
        buffer.write_byte(b'T')?;
        buffer.write_byte_as_hex(stop.signal)?;
        if let Some(hit) = stop.watchpoint {
            buffer.write_str(StopReason::watch_field(&hit))?;
            buffer.write_byte(b':')?;
            buffer.write_u32_as_hex(hit.address)?;
            buffer.write_byte(b';')?;
        }
        let set = registers::snapshot(&self.sim.context);
        for (regnum, &value) in (SP..).zip(&set[usize::from(SP)..]) {
            buffer.write_byte_as_hex(regnum)?;
            buffer.write_byte(b':')?;
            registers::write_word(buffer, value)?;
            buffer.write_byte(b';')?;
        }
        Ok(())
    }

    /// Executes one command, leaving its reply in the buffer.
    fn handle(&mut self, command: Command) -> Result<Action, BufferError> {
        match command {
            Command::HaltReason => self.write_stop_reply()?,
            Command::ReadRegisters => registers::write_all(&mut self.buffer, &self.sim.context)?,
            Command::WriteRegisters(set) => {
                registers::restore(&mut self.sim.context, &set);
                self.buffer.write_str("OK")?;
            }
            Command::ReadRegister(regnum) => match registers::read(&self.sim.context, regnum) {
                Some(value) => registers::write_word(&mut self.buffer, value)?,
                None => self.buffer.write_str(ERROR_ARGUMENT)?,
            },
            Command::WriteRegister { regnum, value } => {
                let reply = if registers::write(&mut self.sim.context, regnum, value) {
                    "OK"
                } else {
                    ERROR_ARGUMENT
                };
                self.buffer.write_str(reply)?;
            }
            Command::ReadMemory { address, length } => self.read_memory(address, length)?,
            Command::WriteMemory { address, data } => {
                let written = (0..).zip(&data).try_for_each(|(offset, &b)| {
                    self.sim.memory.debug_write8(address.wrapping_add(offset), b)
                });
                self.buffer
                    .write_str(if written.is_ok() { "OK" } else { ERROR_MEMORY })?;
            }
            Command::Continue(address) => {
                self.resume_at(address);
                return Ok(Action::Resume(Resume::Continue));
            }
            Command::Step(address) => {
                self.resume_at(address);
                return Ok(Action::Resume(Resume::Step));
            }
            Command::InsertBreakpoint(spec) => {
                let BreakpointSpec {
                    kind,
                    address,
                    size,
                } = spec;
                let done = self.sim.memory.set_watchpoint(kind, address, size);
                self.table_reply(done.is_ok())?;
            }
            Command::RemoveBreakpoint(spec) => {
                let BreakpointSpec {
                    kind,
                    address,
                    size,
                } = spec;
                let done = self.sim.memory.clear_watchpoint(kind, address, size);
                self.table_reply(done.is_ok())?;
            }
            Command::QuerySupported => {
                self.buffer
                    .write_str("qXfer:memory-map:read+;qXfer:features:read+;PacketSize=")?;
                let size = u32::try_from(self.buffer.capacity()).unwrap_or(u32::MAX);
                self.buffer.write_u32_as_hex(size)?;
            }
            Command::ReadFeatures {
                annex,
                offset,
                length,
            } => {
                if annex == "target.xml" {
                    xml::write_chunk(&mut self.buffer, xml::TARGET_XML, offset, length)?;
                } else {
                    self.buffer.write_str(ERROR_ARGUMENT)?;
                }
            }
            Command::ReadMemoryMap { offset, length } => {
                let map = xml::memory_map(self.sim.memory.regions());
                xml::write_chunk(&mut self.buffer, &map, offset, length)?;
            }
            Command::QueryAttached => self.buffer.write_str("1")?,
            Command::QueryCurrentThread => self.buffer.write_str("QC1")?,
            Command::SetThread => self.buffer.write_str("OK")?,
            Command::Kill => return Ok(Action::Kill),
            Command::Detach => {
                self.buffer.write_str("OK")?;
                return Ok(Action::Detach);
            }
            Command::Unknown => {}
        }
        Ok(Action::Reply)
    }

    /// Hex-encodes up to `length` bytes, clamped to what one reply can hold.
    ///
    /// Stops at the first unreadable byte; fails with `E03` if that is the first one.
    fn read_memory(&mut self, address: u32, length: u32) -> Result<(), BufferError> {
        let limit = u32::try_from(self.buffer.capacity() / 2).unwrap_or(u32::MAX);
        let mut read = 0;
        for offset in 0..length.min(limit) {
            let Ok(byte) = self.sim.memory.debug_read8(address.wrapping_add(offset)) else {
                break;
            };
            self.buffer.write_byte_as_hex(byte)?;
            read += 1;
        }
        if read == 0 && length != 0 {
            self.buffer.write_str(ERROR_MEMORY)?;
        }
        Ok(())
    }

    fn table_reply(&mut self, done: bool) -> Result<(), BufferError> {
        self.buffer
            .write_str(if done { "OK" } else { ERROR_BREAKPOINT })
    }

    /// Moves PC to `address`, or past a BKPT compiled into the program at PC.
    ///
    /// A semihosting BKPT stays put so the resumed execution services it.
    fn resume_at(&mut self, address: Option<u32>) {
        match address {
            Some(address) => self.sim.context.pc = address & !1,
            None if self.sim.bkpt_immediate().is_some() && !self.sim.at_semihost_call() => {
                self.sim.context.pc = self.sim.context.pc.wrapping_add(INSTRUCTION_SIZE_16);
            }
            None => {}
        }
    }
}
