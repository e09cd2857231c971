//! Query executor for cairndb
//!
//! Execution flow (strict order):
//! 1. Obtain candidate ids from the plan's access path (or scan every document)
//! 2. Resolve candidates through the store in ascending id order
//! 3. Evaluate the whole filter against each candidate
//! 4. Stop early once `limit` matches are collected
//!
//! A candidate whose evaluation fails is excluded and counted; the scan
//! continues with the next candidate.

use tracing::debug;

use crate::index::{IndexManager, Lookup};
use crate::planner::{AccessPath, Filter, QueryPlan, ScanType};
use crate::store::DocumentStore;
use crate::value::{Document, DocumentId, Value};

use super::filters::FilterEvaluator;
use super::result::{ExecutionResult, ExecutionStats};

/// Trait for obtaining candidate ids from secondary indexes
pub trait IndexLookup {
    fn candidates_equal(&self, field: &str, value: &Value) -> Lookup;

    fn candidates_range(&self, field: &str, min: Option<&Value>, max: Option<&Value>) -> Lookup;
}

impl IndexLookup for IndexManager {
    fn candidates_equal(&self, field: &str, value: &Value) -> Lookup {
        self.lookup_equal(field, value)
    }

    fn candidates_range(&self, field: &str, min: Option<&Value>, max: Option<&Value>) -> Lookup {
        self.lookup_range(field, min, max)
    }
}

/// Trait for reading documents
pub trait DocumentSource {
    fn document(&self, id: DocumentId) -> Option<&Document>;

    /// Every live document in ascending id order
    fn scan(&self) -> Box<dyn Iterator<Item = &Document> + '_>;
}

impl DocumentSource for DocumentStore {
    fn document(&self, id: DocumentId) -> Option<&Document> {
        self.get_ref(id)
    }

    fn scan(&self) -> Box<dyn Iterator<Item = &Document> + '_> {
        Box::new(self.iter())
    }
}

/// Query executor that processes plans against a document source
pub struct QueryExecutor<'a, I: IndexLookup, S: DocumentSource> {
    index: &'a I,
    source: &'a S,
}

impl<'a, I: IndexLookup, S: DocumentSource> QueryExecutor<'a, I, S> {
    pub fn new(index: &'a I, source: &'a S) -> Self {
        Self { index, source }
    }

    /// Executes a plan, returning matching ids in ascending order.
    ///
    /// Deterministic: same plan and same data yield the same ids.
    pub fn execute(&self, plan: &QueryPlan, filter: &Filter, limit: Option<usize>) -> ExecutionResult {
        let (scan_type, candidates) = self.candidates(plan);
        let mut stats = ExecutionStats::new(scan_type);
        let mut ids = Vec::new();

        for doc in candidates {
            if limit.is_some_and(|l| ids.len() >= l) {
                stats.limit_reached = true;
                break;
            }
            stats.examined += 1;

            match FilterEvaluator::evaluate(doc, filter) {
                Ok(true) => {
                    if let Some(id) = doc.id() {
                        ids.push(id);
                    }
                }
                Ok(false) => {}
                Err(err) => {
                    stats.evaluation_errors += 1;
                    debug!(
                        target: "cairndb::executor",
                        id = ?doc.id(),
                        error = %err,
                        "document excluded after evaluation error"
                    );
                }
            }
        }

        stats.matched = ids.len();
        ExecutionResult { ids, stats }
    }

    /// Candidate documents for the plan's access path.
    ///
    /// Falls back to a full scan if the planned index has disappeared.
    fn candidates(&self, plan: &QueryPlan) -> (ScanType, Box<dyn Iterator<Item = &'a Document> + 'a>) {
        let lookup = match &plan.access {
            AccessPath::IndexEquality { field, value } => self.index.candidates_equal(field, value),
            AccessPath::IndexRange { field, min, max } => {
                self.index.candidates_range(field, min.as_ref(), max.as_ref())
            }
            AccessPath::FullScan => Lookup::Unindexed,
        };

        match lookup.into_ids() {
            Some(ids) => {
                let source = self.source;
                let docs = ids.into_iter().filter_map(move |id| source.document(id));
                (plan.scan_type, Box::new(docs))
            }
            None => (ScanType::FullScan, self.source.scan()),
        }
    }
}
