//! Minimal Z80 board: one CPU, ROM and RAM in the lower 32K (mirrored into
//! the upper half), a handful of port latches and a periodic interrupt.
//!
//! Memory map (after the 0x7FFF address mask):
//!   0x0000 .. rom_size   ROM (program image)
//!   rom_size .. 0x8000   RAM
//!
//! Ports:
//!   0x00  W   interrupt vector latch (IM2 low byte)
//!   0x01  R   input latch, driven by [`set_input`]
//!   0x02  RW  scratch register
//!   0x03  W   interrupt enable; non-zero raises an IRQ every tick

use cabinet_core::config::SchedulerConfig;
use cabinet_core::core::Machine;
use cabinet_core::cpu::Z80;
use cabinet_core::memory::{Masked, PageMap, PortMap, Ram, Rom};

use crate::config::{BoardConfig, BoardError, DECODED_SPACE};
use crate::registry::MachineEntry;

pub const PORT_VECTOR: u8 = 0x00;
pub const PORT_INPUT: u8 = 0x01;
pub const PORT_SCRATCH: u8 = 0x02;
pub const PORT_IRQ_ENABLE: u8 = 0x03;

const ADDRESS_MASK: u16 = (DECODED_SPACE - 1) as u16;

pub fn create(config: &BoardConfig, program: &[u8]) -> Result<Machine, BoardError> {
    config.validate()?;
    if program.len() > config.rom_size {
        return Err(BoardError::ProgramTooLarge {
            len: program.len(),
            rom_size: config.rom_size,
        });
    }

    let mut map = PageMap::new();
    map.insert("rom", 0x0000, Rom::new(config.rom_size, program.to_vec()));
    map.insert("ram", config.rom_size as u16, Ram::new(DECODED_SPACE - config.rom_size));
    let memory = Masked::new(map, ADDRESS_MASK);

    let mut ports = PortMap::new();
    let vector = ports.mapper("vector").write(PORT_VECTOR).id();
    ports.mapper("input").read(PORT_INPUT);
    ports.mapper("scratch").read_write(PORT_SCRATCH);
    let enable = ports.mapper("irq_enable").write(PORT_IRQ_ENABLE).id();
    ports.set_cell(vector, config.irq_vector);

    let mut machine = Machine::new(SchedulerConfig::default().tick_interval());
    let core = machine.add_core(
        Box::new(Z80::with_clock(config.clock_hz)),
        Box::new(memory),
        ports,
    );

    machine.set_on_tick(Some(Box::new(move |machine: &mut Machine| {
        let Some(ports) = machine.core(core).map(|c| c.ports()) else {
            return;
        };
        if ports.cell(enable) == 0 {
            return;
        }
        let vector = ports.cell(vector);
        if let Err(err) = machine.raise_interrupt(core, vector) {
            log::warn!("simplez80: periodic interrupt dropped: {err}");
        }
    })));

    log::info!(
        "simplez80: {} byte program, {:#x} ROM, {} Hz",
        program.len(),
        config.rom_size,
        config.clock_hz
    );
    Ok(machine)
}

/// Drive the input latch on port 0x01.
pub fn set_input(machine: &mut Machine, value: u8) {
    let Some(core) = machine.core_mut(0) else {
        return;
    };
    let ports = core.ports_mut();
    if let Some(cell) = ports.find("input") {
        ports.set_cell(cell, value);
    }
}

inventory::submit! {
    MachineEntry::new(
        "simplez80",
        "Z80 with ROM/RAM, port latches and a per-tick interrupt",
        create,
    )
}
