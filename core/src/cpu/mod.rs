use thiserror::Error;

use crate::core::Bus;
use crate::core::snapshot::Snapshot;
use crate::disassembler::Statement;
use crate::memory::Memory;

/// Unrecoverable condition raised while executing. The owning machine
/// traps and refuses further ticks until reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CpuFault {
    #[error("interrupt mode {0} is not supported")]
    UnsupportedInterruptMode(u8),
}

/// Generic CPU interface
pub trait Cpu: Snapshot + Send {
    /// Execute one instruction, then service any pending interrupt.
    /// Returns the T-states consumed.
    fn step(&mut self, bus: &mut dyn Bus) -> Result<u32, CpuFault>;

    /// Power-on state for the control registers; pending requests are dropped.
    fn reset(&mut self);

    fn program_counter(&self) -> u16;
    fn set_program_counter(&mut self, pc: u16);

    /// False while halted.
    fn is_ready(&self) -> bool;

    /// Latch a maskable request. A newer vector replaces an unserviced one.
    fn raise_interrupt(&mut self, vector: u8);
    fn raise_nmi(&mut self);

    fn register_names(&self) -> &'static [&'static str];
    fn register(&self, name: &str) -> Option<u16>;
    /// Returns false if `name` is not a register of this CPU.
    fn set_register(&mut self, name: &str, value: u16) -> bool;

    /// Clock rate in T-states per second.
    fn clock_rate(&self) -> u64;

    fn disassemble(&self, memory: &dyn Memory, address: u16) -> Statement;
}

// Z80 CPU
pub mod z80;
pub use z80::Z80;
