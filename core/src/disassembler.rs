//! Side-effect-free disassembly.
//!
//! Statements are decoded from the same opcode tables the executor runs, and
//! only ever read memory through [`Memory::load`].

use std::fmt;

use crate::cpu::z80::disasm;
use crate::memory::Memory;

/// A single disassembled instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// Address of the first byte (including any prefix).
    pub address: u16,

    /// Every byte the instruction occupies, prefixes included.
    pub bytes: Vec<u8>,

    /// Upper-case mnemonic, e.g. `LD`.
    pub mnemonic: &'static str,

    /// Formatted operands, e.g. `BC,$1234`. Empty for implied forms.
    pub operands: String,
}

impl Statement {
    /// Mnemonic and operands, e.g. `LD BC,$1234`.
    pub fn text(&self) -> String {
        if self.operands.is_empty() {
            self.mnemonic.to_string()
        } else {
            format!("{} {}", self.mnemonic, self.operands)
        }
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Address of the following instruction.
    pub fn next_address(&self) -> u16 {
        self.address.wrapping_add(self.bytes.len() as u16)
    }
}

impl fmt::Display for Statement {
    /// `0000  01 34 12     LD BC,$1234`: address, raw bytes, then text in
    /// fixed columns.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self
            .bytes
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(" ");
        write!(f, "{:04X}  {:<12} {}", self.address, hex, self.text())
    }
}

/// Decode the instruction at `address`.
pub fn disassemble(memory: &dyn Memory, address: u16) -> Statement {
    disasm::disassemble(memory, address)
}

/// Decode `count` consecutive instructions starting at `address`.
pub fn disassemble_range(memory: &dyn Memory, address: u16, count: usize) -> Vec<Statement> {
    let mut statements = Vec::with_capacity(count);
    let mut next = address;
    for _ in 0..count {
        let statement = disassemble(memory, next);
        next = statement.next_address();
        statements.push(statement);
    }
    statements
}
