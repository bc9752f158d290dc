//! Object store implementations - hosted storage API and in-memory fallback.

mod memory;

pub use memory::InMemoryObjectStore;

#[cfg(feature = "storage-api")]
mod http;
#[cfg(feature = "storage-api")]
pub use http::{StorageApiConfig, StorageApiObjectStore};
