pub mod config;
pub mod registry;
pub mod simplez80;

pub use config::{BoardConfig, BoardError};
pub use registry::MachineEntry;
