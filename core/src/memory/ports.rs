use crate::core::snapshot::{Snapshot, SnapshotError, SnapshotReader, SnapshotWriter};
use crate::memory::Memory;

/// Number of ports in the I/O space. Ports decode the low address byte only.
pub const PORT_COUNT: usize = 0x100;

/// Index of a latch cell inside a [`PortMap`] register bank.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CellId(usize);

/// Port-mapped I/O region.
///
/// The map owns a bank of byte cells. Each port independently names the
/// cell it reads from and the cell it writes to; an unbound port reads zero
/// and drops writes. Board wiring code binds cells through [`PortMapper`]
/// and later reads or updates them with [`PortMap::cell`] and
/// [`PortMap::set_cell`].
pub struct PortMap {
    cells: Vec<u8>,
    names: Vec<String>,
    read: [Option<CellId>; PORT_COUNT],
    write: [Option<CellId>; PORT_COUNT],
}

impl Default for PortMap {
    fn default() -> Self {
        Self::new()
    }
}

impl PortMap {
    pub fn new() -> Self {
        Self {
            cells: Vec::new(),
            names: Vec::new(),
            read: [None; PORT_COUNT],
            write: [None; PORT_COUNT],
        }
    }

    /// Allocate a new cell and start binding it to ports.
    pub fn mapper(&mut self, name: &str) -> PortMapper<'_> {
        let cell = CellId(self.cells.len());
        self.cells.push(0);
        self.names.push(name.to_string());
        PortMapper { map: self, cell }
    }

    /// Bind further ports to an existing cell.
    pub fn bind(&mut self, cell: CellId) -> PortMapper<'_> {
        PortMapper { map: self, cell }
    }

    pub fn cell(&self, id: CellId) -> u8 {
        self.cells[id.0]
    }

    pub fn set_cell(&mut self, id: CellId, value: u8) {
        self.cells[id.0] = value;
    }

    pub fn find(&self, name: &str) -> Option<CellId> {
        self.names.iter().position(|n| n == name).map(CellId)
    }

    /// Raw view of the register bank, in allocation order.
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }
}

impl Memory for PortMap {
    fn load(&self, address: u16) -> u8 {
        match self.read[address as u8 as usize] {
            Some(id) => self.cells[id.0],
            None => 0,
        }
    }

    fn store(&mut self, address: u16, value: u8) {
        if let Some(id) = self.write[address as u8 as usize] {
            self.cells[id.0] = value;
        }
    }

    fn len(&self) -> usize {
        PORT_COUNT
    }
}

impl Snapshot for PortMap {
    fn save(&self, out: &mut SnapshotWriter) {
        out.put_block(&self.cells);
    }

    fn restore(&mut self, input: &mut SnapshotReader<'_>) -> Result<(), SnapshotError> {
        input.get_block_into(&mut self.cells)
    }
}

/// Builder that binds one cell to one or more ports.
pub struct PortMapper<'a> {
    map: &'a mut PortMap,
    cell: CellId,
}

impl PortMapper<'_> {
    /// Reads of `port` return the cell.
    pub fn read(self, port: u8) -> Self {
        self.map.read[port as usize] = Some(self.cell);
        self
    }

    /// Writes to `port` update the cell.
    pub fn write(self, port: u8) -> Self {
        self.map.write[port as usize] = Some(self.cell);
        self
    }

    pub fn read_write(self, port: u8) -> Self {
        self.read(port).write(port)
    }

    pub fn id(&self) -> CellId {
        self.cell
    }
}
