//! Adapters Layer (Driven Adapters)
//!
//! Implementations of the outbound `LoadedBatchStore` port.
//!
//! ## Adapters
//!
//! - `InMemoryBatchStore` - process-local store with failure injection

pub mod in_memory;

pub use in_memory::InMemoryBatchStore;
