use crate::core::snapshot::{Snapshot, SnapshotError, SnapshotReader, SnapshotWriter};
use crate::memory::{Memory, Null};

/// Granularity of a page map, in bytes.
pub const PAGE_SIZE: usize = 0x100;
const PAGE_COUNT: usize = 0x10000 / PAGE_SIZE;

/// Handle to a block owned by a [`PageMap`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlockId(usize);

struct Block {
    name: String,
    memory: Box<dyn Memory>,
}

#[derive(Copy, Clone)]
struct Page {
    block: BlockId,
    offset: u16,
}

/// A 64K address space composed of named blocks placed on 256-byte page
/// boundaries. Each block is owned once; mirrors point further pages at an
/// already-inserted block.
///
/// Placement mistakes are static wiring errors and panic.
pub struct PageMap {
    blocks: Vec<Block>,
    pages: [Option<Page>; PAGE_COUNT],
    unmapped: Null,
}

impl Default for PageMap {
    fn default() -> Self {
        Self::new()
    }
}

impl PageMap {
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            pages: [None; PAGE_COUNT],
            unmapped: Null::new(PAGE_SIZE),
        }
    }

    /// Place `memory` at `address` under `name` and return its handle.
    ///
    /// # Panics
    /// If `address` is not page-aligned, the block length is zero or not a
    /// whole number of pages, the block runs past 0xFFFF, or any covered page
    /// is already mapped.
    pub fn insert(&mut self, name: &str, address: u16, memory: impl Memory + 'static) -> BlockId {
        let id = BlockId(self.blocks.len());
        let len = memory.len();
        self.blocks.push(Block {
            name: name.to_string(),
            memory: Box::new(memory),
        });
        self.place(name, address, len, id);
        id
    }

    /// Map an existing block a second time at `address`.
    ///
    /// # Panics
    /// Under the same placement rules as [`PageMap::insert`].
    pub fn mirror(&mut self, address: u16, id: BlockId) {
        let block = &self.blocks[id.0];
        let (name, len) = (block.name.clone(), block.memory.len());
        self.place(&name, address, len, id);
    }

    fn place(&mut self, name: &str, address: u16, len: usize, id: BlockId) {
        if address as usize % PAGE_SIZE != 0 {
            panic!("block '{name}' at {address:#06x} is not aligned to a {PAGE_SIZE}-byte page");
        }
        if len == 0 || len % PAGE_SIZE != 0 {
            panic!("block '{name}' length {len:#x} is not a whole number of pages");
        }
        let first = address as usize / PAGE_SIZE;
        let count = len / PAGE_SIZE;
        if first + count > PAGE_COUNT {
            panic!("block '{name}' at {address:#06x} (+{len:#x}) overflows the address space");
        }
        for (n, page) in self.pages[first..first + count].iter_mut().enumerate() {
            if let Some(existing) = page {
                let other = &self.blocks[existing.block.0].name;
                panic!(
                    "block '{name}' overlaps '{other}' at {:#06x}",
                    (first + n) * PAGE_SIZE
                );
            }
            *page = Some(Page {
                block: id,
                offset: (n * PAGE_SIZE) as u16,
            });
        }
    }

    /// Look up a block by name.
    pub fn block(&self, name: &str) -> Option<&dyn Memory> {
        self.blocks
            .iter()
            .find(|b| b.name == name)
            .map(|b| b.memory.as_ref())
    }

    fn resolve(&self, address: u16) -> Option<(BlockId, u16)> {
        self.pages[address as usize / PAGE_SIZE]
            .map(|page| (page.block, page.offset | (address & (PAGE_SIZE as u16 - 1))))
    }
}

impl Memory for PageMap {
    fn load(&self, address: u16) -> u8 {
        match self.resolve(address) {
            Some((id, offset)) => self.blocks[id.0].memory.load(offset),
            None => self.unmapped.load(address),
        }
    }

    fn store(&mut self, address: u16, value: u8) {
        if let Some((id, offset)) = self.resolve(address) {
            self.blocks[id.0].memory.store(offset, value);
        }
    }

    fn len(&self) -> usize {
        PAGE_COUNT * PAGE_SIZE
    }
}

impl Snapshot for PageMap {
    fn save(&self, out: &mut SnapshotWriter) {
        for block in &self.blocks {
            block.memory.save(out);
        }
    }

    fn restore(&mut self, input: &mut SnapshotReader<'_>) -> Result<(), SnapshotError> {
        for block in &mut self.blocks {
            block.memory.restore(input)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{Ram, Rom};

    #[test]
    fn store_then_load_through_block() {
        let mut map = PageMap::new();
        map.insert("ram", 0x4000, Ram::new(0x400));
        map.store(0x4123, 0x5A);
        assert_eq!(map.load(0x4123), 0x5A);
        assert_eq!(map.block("ram").unwrap().load(0x0123), 0x5A);
    }

    #[test]
    fn unmapped_pages_read_zero() {
        let mut map = PageMap::new();
        map.insert("ram", 0x0000, Ram::new(0x100));
        map.store(0x8000, 0xFF);
        assert_eq!(map.load(0x8000), 0);
    }

    #[test]
    fn mirror_shares_contents() {
        let mut map = PageMap::new();
        let ram = map.insert("ram", 0x2000, Ram::new(0x200));
        map.mirror(0xA000, ram);
        map.store(0xA1FF, 0x33);
        assert_eq!(map.load(0x21FF), 0x33);
    }

    #[test]
    fn rom_block_ignores_writes() {
        let mut map = PageMap::new();
        map.insert("rom", 0x0000, Rom::new(0x100, vec![0xC3]));
        map.store(0x0000, 0x00);
        assert_eq!(map.load(0x0000), 0xC3);
    }

    #[test]
    #[should_panic(expected = "not aligned")]
    fn misaligned_block_panics() {
        let mut map = PageMap::new();
        map.insert("ram", 0x1080, Ram::new(0x100));
    }

    #[test]
    #[should_panic(expected = "whole number of pages")]
    fn partial_page_block_panics() {
        let mut map = PageMap::new();
        map.insert("ram", 0x1000, Ram::new(0x80));
    }

    #[test]
    #[should_panic(expected = "overlaps")]
    fn overlapping_blocks_panic() {
        let mut map = PageMap::new();
        map.insert("a", 0x1000, Ram::new(0x200));
        map.insert("b", 0x1100, Ram::new(0x100));
    }

    #[test]
    #[should_panic(expected = "overflows")]
    fn block_past_top_of_memory_panics() {
        let mut map = PageMap::new();
        map.insert("ram", 0xFF00, Ram::new(0x200));
    }

    #[test]
    fn snapshot_covers_blocks_once() {
        let mut map = PageMap::new();
        let ram = map.insert("ram", 0x0000, Ram::new(0x100));
        map.mirror(0x8000, ram);
        map.store(0x0010, 0xAB);

        let mut out = SnapshotWriter::new();
        map.save(&mut out);
        let bytes = out.into_bytes();
        assert_eq!(bytes.len(), 4 + 0x100);

        let mut restored = PageMap::new();
        let id = restored.insert("ram", 0x0000, Ram::new(0x100));
        restored.mirror(0x8000, id);
        let mut input = SnapshotReader::new(&bytes);
        restored.restore(&mut input).unwrap();
        input.finish().unwrap();
        assert_eq!(restored.load(0x8010), 0xAB);
    }
}
