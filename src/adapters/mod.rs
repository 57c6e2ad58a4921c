// Adapters layer: concrete implementations of the domain ports (storage) and the HTTP surface

pub mod http;
pub mod storage;

pub use storage::MemoryConfigurationStore;
