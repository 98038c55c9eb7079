//! Stores.
//!
//! A [`MemoryStore`] keeps values in memory, and a [`FilesystemStore`] stores each key as a file below a base directory.

mod filesystem_store;
mod memory_store;

pub use filesystem_store::{FilesystemStore, FilesystemStoreCreateError};
pub use memory_store::MemoryStore;
