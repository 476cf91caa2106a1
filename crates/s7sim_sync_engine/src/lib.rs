//! Tick-based reconciliation between the authoritative block store and the
//! transport's external buffer.
//!
//! The engine treats the [`s7sim_core::BlockStore`] as the source of truth
//! and an [`ExternalBuffer`] as the memory remote S7 clients actually touch.
//! Every tick it classifies each block by comparing both sides' checksums
//! against the baselines recorded at the last successful sync:
//!
//! - neither side changed: nothing happens, no transport write is issued
//! - only the external side changed: the bytes are pulled into the store
//! - only the internal side changed: the bytes are pushed to the transport
//! - both sides changed: the internal value wins and is pushed out
//!
//! Transport I/O always happens outside the store lock, and a failure on one
//! block never prevents the others from reconciling in the same tick.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod adapter;
mod config;
mod engine;
mod error;
mod runner;

pub use adapter::{ExternalBuffer, MemoryBuffer};
pub use config::{
    clamp_tick_interval, SyncConfig, DEFAULT_TICK_INTERVAL, MAX_TICK_INTERVAL, MIN_TICK_INTERVAL,
};
pub use engine::{SyncEngine, SyncStats, TickSummary};
pub use error::{SyncError, SyncResult};
pub use runner::SyncRunner;

pub use s7sim_core::SyncDecision;
