use std::collections::BTreeSet;
use std::time::Duration;

use thiserror::Error;

use crate::core::bus::SystemBus;
use crate::core::snapshot::{Snapshot, SnapshotError, SnapshotReader, SnapshotWriter};
use crate::cpu::{Cpu, CpuFault};
use crate::disassembler::Statement;
use crate::memory::{Memory, PortMap};

/// Receives one statement per traced instruction, before it executes,
/// tagged with the index of the core running it.
pub type TraceSink = Box<dyn FnMut(usize, &Statement) + Send>;

/// Invoked once at the end of every tick.
pub type TickCallback = Box<dyn FnMut(&mut Machine) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Stopped,
    Running,
    AtBreakpoint,
    /// A core raised an unrecoverable fault; cleared only by `reset`.
    Trapped(CpuFault),
}

#[derive(Debug, Error)]
pub enum MachineError {
    #[error("machine is already running")]
    AlreadyRunning,
    #[error("operation not allowed while the machine is running")]
    Running,
    #[error("machine trapped: {0}")]
    Trapped(CpuFault),
    #[error("snapshot rejected: {0}")]
    Snapshot(#[from] SnapshotError),
    #[error("no core with index {0}")]
    NoSuchCore(usize),
    #[error("scheduler thread is gone")]
    Disconnected,
}

/// One processor with the address spaces it sees.
pub struct Core {
    cpu: Box<dyn Cpu>,
    memory: Box<dyn Memory>,
    ports: PortMap,
    cycles_per_tick: u64,
    overrun: u64,
    total_cycles: u64,
}

impl Core {
    pub fn cpu(&self) -> &dyn Cpu {
        self.cpu.as_ref()
    }

    pub fn cpu_mut(&mut self) -> &mut dyn Cpu {
        self.cpu.as_mut()
    }

    pub fn memory(&self) -> &dyn Memory {
        self.memory.as_ref()
    }

    pub fn memory_mut(&mut self) -> &mut dyn Memory {
        self.memory.as_mut()
    }

    pub fn ports(&self) -> &PortMap {
        &self.ports
    }

    pub fn ports_mut(&mut self) -> &mut PortMap {
        &mut self.ports
    }

    /// T-states executed per tick at the current interval.
    pub fn cycles_per_tick(&self) -> u64 {
        self.cycles_per_tick
    }

    /// T-states executed since the last reset.
    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    pub fn step(&mut self) -> Result<u32, CpuFault> {
        let mut bus = SystemBus::new(self.memory.as_mut(), &mut self.ports);
        let cycles = self.cpu.step(&mut bus)?;
        self.total_cycles += cycles as u64;
        Ok(cycles)
    }

    /// Disassemble the instruction at the program counter.
    pub fn statement(&self) -> Statement {
        self.cpu.disassemble(self.memory.as_ref(), self.cpu.program_counter())
    }

    fn budget_for(&mut self, interval: Duration) {
        let cycles = self.cpu.clock_rate() as u128 * interval.as_nanos() / 1_000_000_000;
        self.cycles_per_tick = cycles.max(1) as u64;
    }
}

/// Owns the cores of an emulated board and paces them in ticks.
///
/// Each tick runs every core for its cycle budget (derived from the core's
/// clock rate and the tick interval); cycles spent past the budget are
/// carried as debt, and a core owing a whole tick or more skips that tick.
/// Breakpoints are checked on core 0 after every instruction.
pub struct Machine {
    cores: Vec<Core>,
    /// Addresses at which core 0 pauses before executing.
    pub breakpoints: BTreeSet<u16>,
    status: Status,
    tick_interval: Duration,
    ticks: u64,
    trace: Option<TraceSink>,
    on_tick: Option<TickCallback>,
}

impl Machine {
    pub fn new(tick_interval: Duration) -> Self {
        Self {
            cores: Vec::new(),
            breakpoints: BTreeSet::new(),
            status: Status::Stopped,
            tick_interval,
            ticks: 0,
            trace: None,
            on_tick: None,
        }
    }

    /// Add a core and return its index.
    pub fn add_core(&mut self, cpu: Box<dyn Cpu>, memory: Box<dyn Memory>, ports: PortMap) -> usize {
        let mut core = Core {
            cpu,
            memory,
            ports,
            cycles_per_tick: 0,
            overrun: 0,
            total_cycles: 0,
        };
        core.budget_for(self.tick_interval);
        log::debug!(
            "core {} added: {} Hz, {} cycles per tick",
            self.cores.len(),
            core.cpu.clock_rate(),
            core.cycles_per_tick
        );
        self.cores.push(core);
        self.cores.len() - 1
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Ticks completed since the last reset.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn core_count(&self) -> usize {
        self.cores.len()
    }

    pub fn core(&self, index: usize) -> Option<&Core> {
        self.cores.get(index)
    }

    pub fn core_mut(&mut self, index: usize) -> Option<&mut Core> {
        self.cores.get_mut(index)
    }

    fn set_status(&mut self, status: Status) {
        if self.status != status {
            log::debug!("machine: {:?} -> {:?}", self.status, status);
            self.status = status;
        }
    }

    pub fn start(&mut self) -> Result<(), MachineError> {
        match self.status {
            Status::Running => Err(MachineError::AlreadyRunning),
            Status::Trapped(fault) => Err(MachineError::Trapped(fault)),
            Status::Stopped | Status::AtBreakpoint => {
                self.set_status(Status::Running);
                Ok(())
            }
        }
    }

    /// Pause execution. A trapped machine stays trapped.
    pub fn stop(&mut self) {
        if matches!(self.status, Status::Running | Status::AtBreakpoint) {
            self.set_status(Status::Stopped);
        }
    }

    /// Reset every core and return to `Stopped`, clearing any trap.
    pub fn reset(&mut self) {
        for core in &mut self.cores {
            core.cpu.reset();
            core.overrun = 0;
            core.total_cycles = 0;
        }
        self.ticks = 0;
        self.set_status(Status::Stopped);
    }

    pub fn set_tick_interval(&mut self, interval: Duration) {
        self.tick_interval = interval;
        for core in &mut self.cores {
            core.budget_for(interval);
        }
        log::debug!("tick interval set to {interval:?}");
    }

    pub fn set_trace(&mut self, sink: Option<TraceSink>) {
        self.trace = sink;
    }

    pub fn set_on_tick(&mut self, callback: Option<TickCallback>) {
        self.on_tick = callback;
    }

    pub fn raise_interrupt(&mut self, core: usize, vector: u8) -> Result<(), MachineError> {
        let core = self.cores.get_mut(core).ok_or(MachineError::NoSuchCore(core))?;
        core.cpu.raise_interrupt(vector);
        Ok(())
    }

    pub fn raise_nmi(&mut self, core: usize) -> Result<(), MachineError> {
        let core = self.cores.get_mut(core).ok_or(MachineError::NoSuchCore(core))?;
        core.cpu.raise_nmi();
        Ok(())
    }

    /// Run one tick. Does nothing unless the machine is running.
    pub fn tick(&mut self) -> Result<(), MachineError> {
        match self.status {
            Status::Running => {}
            Status::Trapped(fault) => return Err(MachineError::Trapped(fault)),
            Status::Stopped | Status::AtBreakpoint => return Ok(()),
        }

        for index in 0..self.cores.len() {
            let core = &mut self.cores[index];
            // A core still paying off earlier overrun sits this tick out.
            if core.overrun >= core.cycles_per_tick {
                core.overrun -= core.cycles_per_tick;
                continue;
            }
            let budget = core.cycles_per_tick - core.overrun;
            let mut spent = 0u64;
            while spent < budget {
                if let Some(sink) = self.trace.as_mut() {
                    if core.cpu.is_ready() {
                        sink(index, &core.statement());
                    }
                }
                match core.step() {
                    Ok(cycles) => spent += cycles as u64,
                    Err(fault) => {
                        log::warn!(
                            "core {index} trapped at {:#06x}: {fault}",
                            core.cpu.program_counter()
                        );
                        self.set_status(Status::Trapped(fault));
                        return Err(MachineError::Trapped(fault));
                    }
                }
                if index == 0
                    && core.cpu.is_ready()
                    && self.breakpoints.contains(&core.cpu.program_counter())
                {
                    core.overrun = 0;
                    log::debug!("breakpoint hit at {:#06x}", core.cpu.program_counter());
                    self.set_status(Status::AtBreakpoint);
                    return Ok(());
                }
            }
            core.overrun = spent - budget;
        }

        self.ticks += 1;
        if let Some(mut callback) = self.on_tick.take() {
            callback(self);
            if self.on_tick.is_none() {
                self.on_tick = Some(callback);
            }
        }
        Ok(())
    }

    /// Run up to `count` ticks, stopping early if the machine leaves
    /// `Running`. Returns the number of ticks completed.
    pub fn run_ticks(&mut self, count: u64) -> Result<u64, MachineError> {
        let mut done = 0;
        while done < count && self.status == Status::Running {
            self.tick()?;
            if self.status == Status::Running {
                done += 1;
            }
        }
        Ok(done)
    }

    fn capture(&self) -> Vec<u8> {
        let mut out = SnapshotWriter::with_header();
        out.put_u16(self.cores.len() as u16);
        for core in &self.cores {
            core.cpu.save(&mut out);
        }
        for core in &self.cores {
            core.memory.save(&mut out);
        }
        for core in &self.cores {
            core.ports.save(&mut out);
        }
        out.into_bytes()
    }

    fn apply(&mut self, bytes: &[u8]) -> Result<(), SnapshotError> {
        let mut input = SnapshotReader::with_header(bytes)?;
        let count = input.get_u16()? as usize;
        if count != self.cores.len() {
            return Err(SnapshotError::LengthMismatch {
                expected: self.cores.len(),
                actual: count,
            });
        }
        for core in &mut self.cores {
            core.cpu.restore(&mut input)?;
        }
        for core in &mut self.cores {
            core.memory.restore(&mut input)?;
        }
        for core in &mut self.cores {
            core.ports.restore(&mut input)?;
        }
        input.finish()
    }

    /// Serialize registers, interrupt state, memory and port latches of
    /// every core.
    pub fn snapshot(&self) -> Result<Vec<u8>, MachineError> {
        if self.status == Status::Running {
            return Err(MachineError::Running);
        }
        Ok(self.capture())
    }

    /// Replace the machine state with a snapshot. On any validation error
    /// the previous state is put back and the error returned. A trapped
    /// machine stays trapped until `reset`.
    pub fn restore(&mut self, bytes: &[u8]) -> Result<(), MachineError> {
        if self.status == Status::Running {
            return Err(MachineError::Running);
        }
        let backup = self.capture();
        if let Err(err) = self.apply(bytes) {
            if let Err(rollback) = self.apply(&backup) {
                log::error!("failed to roll back rejected snapshot: {rollback}");
            }
            return Err(err.into());
        }
        for core in &mut self.cores {
            core.overrun = 0;
        }
        Ok(())
    }
}
