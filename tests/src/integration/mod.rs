//! # Integration Flows
//!
//! - `refresh_flows`: load, refresh, purge and failure sequences driven
//!   through the manager and the scheduler
//! - `query_flows`: `_lastUpdated` parsing through to result-set answers

pub mod query_flows;
