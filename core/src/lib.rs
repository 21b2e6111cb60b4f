pub mod alu;
pub mod bits;
pub mod config;
pub mod core;
pub mod cpu;
pub mod disassembler;
pub mod memory;

pub mod prelude {
    pub use crate::config::SchedulerConfig;
    pub use crate::core::{Bus, Machine, MachineError, MachineHandle, Snapshot, Status};
    pub use crate::cpu::{Cpu, CpuFault, Z80};
    pub use crate::disassembler::Statement;
    pub use crate::memory::{Masked, Memory, PageMap, PortMap, Ram, Rom};
}
