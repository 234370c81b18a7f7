//! Local session persistence.

pub mod file;
pub mod memory;
pub mod trait_def;

pub use file::FileSessionStorage;
pub use memory::MemorySessionStorage;
pub use trait_def::SessionStorage;
