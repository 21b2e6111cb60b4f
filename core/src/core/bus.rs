use crate::memory::Memory;

/// Memory and I/O address spaces as the executor sees them.
pub trait Bus {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, data: u8);

    /// Read from the I/O port space (separate from memory on Z80).
    fn io_read(&mut self, addr: u16) -> u8;

    /// Write to the I/O port space (separate from memory on Z80).
    fn io_write(&mut self, addr: u16, data: u8);
}

/// Adapts the memory and port regions owned by a machine core into a [`Bus`].
pub struct SystemBus<'a> {
    pub memory: &'a mut dyn Memory,
    pub io: &'a mut dyn Memory,
}

impl<'a> SystemBus<'a> {
    pub fn new(memory: &'a mut dyn Memory, io: &'a mut dyn Memory) -> Self {
        Self { memory, io }
    }
}

impl Bus for SystemBus<'_> {
    fn read(&mut self, addr: u16) -> u8 {
        self.memory.load(addr)
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.memory.store(addr, data)
    }

    fn io_read(&mut self, addr: u16) -> u8 {
        self.io.load(addr)
    }

    fn io_write(&mut self, addr: u16, data: u8) {
        self.io.store(addr, data)
    }
}
