//! Engine subsystem for cairndb
//!
//! Ties the store, indexes, planner, WAL and snapshots together behind one
//! `Engine` value. There is no global state; every instance owns its data.
//!
//! # Invariants
//!
//! - Mutation order: WAL append + fsync, then store, then indexes
//! - A mutation whose WAL append fails is not applied
//! - Recovery completes before the first request is served
//! - A checkpoint clears the WAL only after its snapshot is durable

mod checkpoint;
mod engine;
mod errors;
mod recovery;
mod replay;
mod stats;

pub use checkpoint::write_checkpoint;
pub use engine::Engine;
pub use errors::{EngineError, EngineResult};
pub use recovery::{recover, RecoveredState};
pub use replay::{ReplayStats, StorageApply, WalReplayer};
pub use stats::EngineStats;
