//! cairndb - An embedded, durable document store
//!
//! Schema-less documents with auto-assigned identifiers, single-field
//! secondary indexes, a write-ahead log for crash recovery and JSON
//! snapshots.
//!
//! ```no_run
//! use cairndb::{Document, Engine, EngineConfig, Filter};
//! use serde_json::json;
//!
//! let mut engine = Engine::open(EngineConfig::with_data_dir("/tmp/cairndb"))?;
//! engine.create_index("age")?;
//! engine.insert(Document::from_json(json!({"name": "Alice", "age": 30}))?)?;
//! let adults = engine.query(&Filter::gte("age", 18))?;
//! # Ok::<(), cairndb::EngineError>(())
//! ```

pub mod cli;
pub mod config;
pub mod engine;
pub mod executor;
pub mod index;
pub mod observability;
pub mod planner;
pub mod snapshot;
pub mod store;
pub mod value;
pub mod wal;

pub use config::EngineConfig;
pub use engine::{Engine, EngineError, EngineResult, EngineStats};
pub use index::{IndexInfo, Lookup};
pub use planner::{CompareOp, Filter, QueryPlan};
pub use value::{Document, DocumentId, Value};
