//! Storage layer: atomic JSON documents behind a key-value facade.

mod atomic_json;
mod local_store;

pub use atomic_json::{AtomicJsonFile, StorageError};
pub use local_store::LocalStore;
