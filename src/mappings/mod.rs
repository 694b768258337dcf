pub mod process_aliases;
pub mod system_processes;

pub use process_aliases::ProcessAliasMap;
pub use system_processes::{SystemDenylist, ENGINE_NAME};
