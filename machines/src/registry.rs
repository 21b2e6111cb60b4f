//! Board registry for automatic front-end discovery.
//!
//! Each board self-registers via [`inventory::submit!`] with a
//! [`MachineEntry`] containing its CLI name, a one-line description and a
//! factory function. The front-end discovers available boards at runtime
//! without any central list.

use cabinet_core::core::Machine;

use crate::{BoardConfig, BoardError};

/// Describes a front-end-capable board.
pub struct MachineEntry {
    /// CLI name used to select this board (e.g., "simplez80").
    pub name: &'static str,
    /// Shown in the list of available boards.
    pub description: &'static str,
    /// Factory: wire up a Machine around a program image.
    pub create: fn(&BoardConfig, &[u8]) -> Result<Machine, BoardError>,
}

impl MachineEntry {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        create: fn(&BoardConfig, &[u8]) -> Result<Machine, BoardError>,
    ) -> Self {
        Self {
            name,
            description,
            create,
        }
    }
}

inventory::collect!(MachineEntry);

/// Return all registered boards, sorted by name.
pub fn all() -> Vec<&'static MachineEntry> {
    let mut entries: Vec<_> = inventory::iter::<MachineEntry>.into_iter().collect();
    entries.sort_by_key(|e| e.name);
    entries
}

/// Look up a board by its CLI name.
pub fn find(name: &str) -> Option<&'static MachineEntry> {
    inventory::iter::<MachineEntry>
        .into_iter()
        .find(|e| e.name == name)
}
