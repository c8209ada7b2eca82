//! Adapters for the `ContainerStatsSource` port.

pub mod proc_fs;
pub mod scripted;

pub use proc_fs::ProcFsStatsSource;
pub use scripted::ScriptedStatsSource;
