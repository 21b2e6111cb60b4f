pub mod bus;
pub mod machine;
pub mod scheduler;
pub mod snapshot;

pub use bus::{Bus, SystemBus};
pub use machine::{Core, Machine, MachineError, Status, TickCallback, TraceSink};
pub use scheduler::{Control, MachineHandle};
pub use snapshot::{Snapshot, SnapshotError, SnapshotReader, SnapshotWriter};
