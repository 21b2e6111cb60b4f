use serde::Deserialize;
use thiserror::Error;

use cabinet_core::cpu::z80::DEFAULT_CLOCK_HZ;
use cabinet_core::memory::PAGE_SIZE;

/// Top of the decoded address space; everything above mirrors below it.
pub const DECODED_SPACE: usize = 0x8000;

/// Per-board wiring options, read from the `[board]` table of the
/// front-end's config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// CPU clock in Hz.
    pub clock_hz: u64,
    /// Value the interrupt-vector latch holds at power-on.
    pub irq_vector: u8,
    /// Bytes of ROM at 0x0000; RAM fills the rest of the lower 32K.
    pub rom_size: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            clock_hz: DEFAULT_CLOCK_HZ,
            irq_vector: 0xFF,
            rom_size: 0x4000,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("ROM size {0:#x} must be a non-zero multiple of 0x100 below 0x8000")]
    RomSize(usize),
    #[error("clock rate must be non-zero")]
    Clock,
    #[error("program is {len} bytes but the ROM holds {rom_size}")]
    ProgramTooLarge { len: usize, rom_size: usize },
}

impl BoardConfig {
    /// Reject layouts a board cannot place.
    pub fn validate(&self) -> Result<(), BoardError> {
        if self.rom_size == 0 || self.rom_size % PAGE_SIZE != 0 || self.rom_size >= DECODED_SPACE {
            return Err(BoardError::RomSize(self.rom_size));
        }
        if self.clock_hz == 0 {
            return Err(BoardError::Clock);
        }
        Ok(())
    }
}
