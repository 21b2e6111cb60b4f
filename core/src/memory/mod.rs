//! Byte-addressed storage regions.
//!
//! Every region speaks the same [`Memory`] contract, so the executor, the
//! disassembler and board wiring code can address RAM, ROM, unmapped space,
//! mirrored space and port registers uniformly. Compositions ([`Masked`],
//! [`PageMap`]) own their parts and delegate; nothing is copied.

pub mod page_map;
pub mod ports;

pub use page_map::{BlockId, PAGE_SIZE, PageMap};
pub use ports::{CellId, PORT_COUNT, PortMap, PortMapper};

use crate::core::snapshot::{Snapshot, SnapshotError, SnapshotReader, SnapshotWriter};

/// Uniform 16-bit addressed byte storage.
///
/// Loads take `&self` so inspection (disassembly, tracing) never mutates.
/// There are no bus errors: out-of-range reads yield zero and out-of-range
/// writes are dropped.
pub trait Memory: Snapshot + Send {
    fn load(&self, address: u16) -> u8;
    fn store(&mut self, address: u16, value: u8);
    /// Size of the region in bytes.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<M: Memory + ?Sized> Memory for Box<M> {
    fn load(&self, address: u16) -> u8 {
        (**self).load(address)
    }

    fn store(&mut self, address: u16, value: u8) {
        (**self).store(address, value)
    }

    fn len(&self) -> usize {
        (**self).len()
    }
}

// ---------------------------------------------------------------------------
// RAM
// ---------------------------------------------------------------------------

/// Read/write backing buffer.
pub struct Ram {
    data: Vec<u8>,
}

impl Ram {
    /// Create zero-filled RAM of `len` bytes.
    pub fn new(len: usize) -> Self {
        Self { data: vec![0; len] }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl Memory for Ram {
    fn load(&self, address: u16) -> u8 {
        self.data.get(address as usize).copied().unwrap_or(0)
    }

    fn store(&mut self, address: u16, value: u8) {
        if let Some(cell) = self.data.get_mut(address as usize) {
            *cell = value;
        }
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}

impl Snapshot for Ram {
    fn save(&self, out: &mut SnapshotWriter) {
        out.put_block(&self.data);
    }

    fn restore(&mut self, input: &mut SnapshotReader<'_>) -> Result<(), SnapshotError> {
        input.get_block_into(&mut self.data)
    }
}

// ---------------------------------------------------------------------------
// ROM
// ---------------------------------------------------------------------------

/// Immutable region. Writes are ignored; reads past the backing data yield
/// zero, so a ROM can be declared larger than the image it was built from.
pub struct Rom {
    data: Vec<u8>,
    len: usize,
}

impl Rom {
    /// Declare a ROM of `len` bytes backed by `bytes` (truncated to `len`).
    pub fn new(len: usize, mut bytes: Vec<u8>) -> Self {
        bytes.truncate(len);
        Self { data: bytes, len }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

impl Memory for Rom {
    fn load(&self, address: u16) -> u8 {
        self.data.get(address as usize).copied().unwrap_or(0)
    }

    fn store(&mut self, _address: u16, _value: u8) {}

    fn len(&self) -> usize {
        self.len
    }
}

impl Snapshot for Rom {
    fn save(&self, _out: &mut SnapshotWriter) {}

    fn restore(&mut self, _input: &mut SnapshotReader<'_>) -> Result<(), SnapshotError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Null
// ---------------------------------------------------------------------------

/// Unconnected address space: reads zero, ignores writes.
pub struct Null {
    len: usize,
}

impl Null {
    pub fn new(len: usize) -> Self {
        Self { len }
    }
}

impl Memory for Null {
    fn load(&self, _address: u16) -> u8 {
        0
    }

    fn store(&mut self, _address: u16, _value: u8) {}

    fn len(&self) -> usize {
        self.len
    }
}

impl Snapshot for Null {
    fn save(&self, _out: &mut SnapshotWriter) {}

    fn restore(&mut self, _input: &mut SnapshotReader<'_>) -> Result<(), SnapshotError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Masked
// ---------------------------------------------------------------------------

/// ANDs every address with `mask` before delegating, modelling address
/// lines that are not connected (e.g. `0x7fff` for a board without A15).
pub struct Masked<M> {
    inner: M,
    mask: u16,
}

impl<M: Memory> Masked<M> {
    pub fn new(inner: M, mask: u16) -> Self {
        Self { inner, mask }
    }
}

impl<M: Memory> Memory for Masked<M> {
    fn load(&self, address: u16) -> u8 {
        self.inner.load(address & self.mask)
    }

    fn store(&mut self, address: u16, value: u8) {
        self.inner.store(address & self.mask, value)
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<M: Memory> Snapshot for Masked<M> {
    fn save(&self, out: &mut SnapshotWriter) {
        self.inner.save(out)
    }

    fn restore(&mut self, input: &mut SnapshotReader<'_>) -> Result<(), SnapshotError> {
        self.inner.restore(input)
    }
}

// ---------------------------------------------------------------------------
// Cursor
// ---------------------------------------------------------------------------

/// Sequential reader over a memory region with an auto-incrementing,
/// wrapping position.
pub struct Cursor<'a> {
    memory: &'a dyn Memory,
    position: u16,
}

impl<'a> Cursor<'a> {
    pub fn new(memory: &'a dyn Memory, position: u16) -> Self {
        Self { memory, position }
    }

    pub fn position(&self) -> u16 {
        self.position
    }

    pub fn peek(&self) -> u8 {
        self.memory.load(self.position)
    }

    /// Read the byte at the cursor and advance.
    pub fn fetch(&mut self) -> u8 {
        let value = self.memory.load(self.position);
        self.position = self.position.wrapping_add(1);
        value
    }

    /// Read a little-endian word and advance by two.
    pub fn fetch_word(&mut self) -> u16 {
        let lo = self.fetch();
        let hi = self.fetch();
        crate::bits::join(hi, lo)
    }
}
