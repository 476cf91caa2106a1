//! # s7sim Core
//!
//! Authoritative data-block store for the s7sim PLC simulator.
//!
//! This crate provides:
//! - `BlockStore`: the in-memory table of simulated DBs with checksum and
//!   version bookkeeping under a single lock
//! - Copy-on-read snapshots for lock-free reading by the GUI and scripts
//! - `WriteGateway`: the single entry point for local writes
//! - Field layouts and typed field access through the S7 codec
//! - Definition-file loading and validation
//!
//! ## Key Invariants
//!
//! - A block's checksum always equals the hash of its current bytes
//! - The version counter is strictly increasing per block
//! - Snapshots never change after capture and hold no store reference
//! - Every mutation path goes through the store lock

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod block;
mod checksum;
mod config;
mod error;
mod fields;
mod gateway;
mod snapshot;
mod store;

pub use block::Block;
pub use checksum::block_checksum;
pub use config::{field_value_from_json, DbDefinition, FieldDefinition, SimulatorConfig};
pub use error::{CoreError, CoreResult};
pub use fields::{read_field, DbLayout, FieldSpec, LayoutRegistry};
pub use gateway::WriteGateway;
pub use snapshot::{BlockSnapshot, Snapshot};
pub use store::{BlockStore, Reconciliation, SyncDecision};
