//! Service Layer
//!
//! Owns the filter snapshot, talks to the batch store through the outbound
//! port and drives the periodic refresh.

pub mod filter_manager;
pub mod scheduler;

pub use filter_manager::{
    before_last_updated_feature, FilterSnapshot, LoadedFilterManager, RefreshOutcome,
};
pub use scheduler::{spawn_refresh_task, RefreshHandle};
