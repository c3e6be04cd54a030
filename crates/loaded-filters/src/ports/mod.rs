//! Ports Layer
//!
//! Defines the interfaces (traits) for:
//! - Driving Ports (inbound) - API the request-serving code calls
//! - Driven Ports (outbound) - the batch store the manager reads from

pub mod inbound;
pub mod outbound;

pub use inbound::LoadedFilterApi;
pub use outbound::LoadedBatchStore;
