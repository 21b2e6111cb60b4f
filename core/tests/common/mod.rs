#![allow(dead_code)]

use cabinet_core::core::Bus;
use cabinet_core::cpu::z80::Z80;

/// Minimal bus for testing: flat 64KB read/write memory plus a 256-byte
/// port space that remembers the full address of every I/O access.
pub struct TestBus {
    pub memory: [u8; 0x10000],
    pub ports: [u8; 0x100],
    pub io_reads: Vec<u16>,
    pub io_writes: Vec<(u16, u8)>,
}

impl TestBus {
    pub fn new() -> Self {
        Self {
            memory: [0; 0x10000],
            ports: [0; 0x100],
            io_reads: Vec::new(),
            io_writes: Vec::new(),
        }
    }

    pub fn load(&mut self, addr: u16, data: &[u8]) {
        let start = addr as usize;
        self.memory[start..start + data.len()].copy_from_slice(data);
    }
}

impl Bus for TestBus {
    fn read(&mut self, addr: u16) -> u8 {
        self.memory[addr as usize]
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.memory[addr as usize] = data;
    }

    fn io_read(&mut self, addr: u16) -> u8 {
        self.io_reads.push(addr);
        self.ports[addr as u8 as usize]
    }

    fn io_write(&mut self, addr: u16, data: u8) {
        self.io_writes.push((addr, data));
        self.ports[addr as u8 as usize] = data;
    }
}

/// Execute one instruction and return its T-states.
pub fn run_instruction(cpu: &mut Z80, bus: &mut TestBus) -> u32 {
    cpu.step(bus).expect("instruction faulted")
}
