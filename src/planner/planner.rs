//! Query planner
//!
//! Chooses how candidates are obtained. The chosen access path only narrows
//! candidates; the executor always re-checks the whole filter.
//!
//! Selection priority (strict order):
//! 1. Indexed equality: an `Eq` conjunct on an indexed field with an
//!    indexable (non-null, non-NaN) literal
//! 2. Indexed range: `Gt`/`Gte`/`Lt`/`Lte` conjuncts on one indexed field
//! 3. Full scan
//!
//! Ties are broken lexicographically by field path.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::index::{IndexKey, IndexManager};
use crate::value::Value;

use super::ast::{CompareOp, Filter};
use super::errors::{PlannerError, PlannerResult};

/// Read-only view of which fields are indexed
pub trait IndexCatalog {
    fn is_indexed(&self, field: &str) -> bool;
}

impl IndexCatalog for IndexManager {
    fn is_indexed(&self, field: &str) -> bool {
        self.has_index(field)
    }
}

/// Scan type used by query plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanType {
    /// Hash-bucket equality lookup
    IndexEquality,
    /// Walk of an index's distinct keys within bounds
    IndexRange,
    /// Every document in id order
    FullScan,
}

impl ScanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanType::IndexEquality => "INDEX_EQUALITY",
            ScanType::IndexRange => "INDEX_RANGE",
            ScanType::FullScan => "FULL_SCAN",
        }
    }
}

/// How candidate documents are obtained
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "scan", rename_all = "snake_case")]
pub enum AccessPath {
    IndexEquality {
        field: String,
        value: Value,
    },
    IndexRange {
        field: String,
        min: Option<Value>,
        max: Option<Value>,
    },
    FullScan,
}

/// Immutable query plan (no runtime state)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryPlan {
    /// Scan type
    pub scan_type: ScanType,
    /// Candidate source
    pub access: AccessPath,
    /// Rendered filter, re-evaluated on every candidate
    pub filter: String,
    /// Whether the filter contains an opaque predicate
    pub uses_custom_predicate: bool,
}

impl QueryPlan {
    /// Index field chosen by the plan, if any
    pub fn chosen_index(&self) -> Option<&str> {
        match &self.access {
            AccessPath::IndexEquality { field, .. } | AccessPath::IndexRange { field, .. } => {
                Some(field)
            }
            AccessPath::FullScan => None,
        }
    }

    /// One-line human-readable description
    pub fn describe(&self) -> String {
        let access = match &self.access {
            AccessPath::IndexEquality { field, value } => {
                format!("index '{}' equality on {}", field, value)
            }
            AccessPath::IndexRange { field, min, max } => format!(
                "index '{}' range [{}, {}]",
                field,
                min.as_ref().map_or_else(|| "-inf".to_string(), Value::to_string),
                max.as_ref().map_or_else(|| "+inf".to_string(), Value::to_string),
            ),
            AccessPath::FullScan => "full scan in id order".to_string(),
        };
        format!("{}: {}; filter {}", self.scan_type.as_str(), access, self.filter)
    }
}

/// Query planner that produces deterministic plans
pub struct QueryPlanner<'a, C: IndexCatalog> {
    catalog: &'a C,
}

impl<'a, C: IndexCatalog> QueryPlanner<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self { catalog }
    }

    /// Plans a filter.
    ///
    /// Deterministic: same filter and same index set yield the same plan.
    pub fn plan(&self, filter: &Filter) -> PlannerResult<QueryPlan> {
        validate(filter)?;

        let access = self.select_access(filter);
        let scan_type = match access {
            AccessPath::IndexEquality { .. } => ScanType::IndexEquality,
            AccessPath::IndexRange { .. } => ScanType::IndexRange,
            AccessPath::FullScan => ScanType::FullScan,
        };

        Ok(QueryPlan {
            scan_type,
            access,
            filter: filter.to_string(),
            uses_custom_predicate: filter.has_custom_predicate(),
        })
    }

    fn select_access(&self, filter: &Filter) -> AccessPath {
        let conjuncts = filter.conjuncts();

        // Priority 1: indexed equality, lexicographically smallest field
        let equality = conjuncts
            .iter()
            .filter_map(|c| match c {
                Filter::Compare {
                    path,
                    op: CompareOp::Eq,
                    value,
                } if self.catalog.is_indexed(path) && IndexKey::from_value(value).is_some() => {
                    Some((path, value))
                }
                _ => None,
            })
            .min_by(|a, b| a.0.cmp(b.0));

        if let Some((field, value)) = equality {
            return AccessPath::IndexEquality {
                field: field.clone(),
                value: value.clone(),
            };
        }

        // Priority 2: indexed range, bounds merged per field
        let mut ranges: BTreeMap<&str, (Option<&Value>, Option<&Value>)> = BTreeMap::new();
        for c in &conjuncts {
            if let Filter::Compare { path, op, value } = c {
                if !op.is_range() || !self.catalog.is_indexed(path) {
                    continue;
                }
                let bounds = ranges.entry(path.as_str()).or_default();
                if op.is_lower_bound() {
                    bounds.0 = Some(tighter(bounds.0, value, Ordering::Greater));
                } else {
                    bounds.1 = Some(tighter(bounds.1, value, Ordering::Less));
                }
            }
        }

        if let Some((field, (min, max))) = ranges.into_iter().next() {
            return AccessPath::IndexRange {
                field: field.to_string(),
                min: min.cloned(),
                max: max.cloned(),
            };
        }

        AccessPath::FullScan
    }
}

/// Keeps the tighter of two bounds. Incomparable bounds keep the first one
/// seen; the residual filter rejects every candidate in that case anyway.
fn tighter<'v>(current: Option<&'v Value>, candidate: &'v Value, wins: Ordering) -> &'v Value {
    match current {
        Some(cur) if candidate.compare(cur) != Some(wins) => cur,
        _ => candidate,
    }
}

/// Rejects empty or malformed field paths anywhere in the tree
fn validate(filter: &Filter) -> PlannerResult<()> {
    match filter {
        Filter::Compare { path, .. } | Filter::Exists(path) => {
            if path.is_empty() || path.split('.').any(str::is_empty) {
                return Err(PlannerError::invalid_path(path.clone()));
            }
            Ok(())
        }
        Filter::And(items) | Filter::Or(items) => items.iter().try_for_each(validate),
        Filter::Not(inner) => validate(inner),
        Filter::Custom(_) => Ok(()),
    }
}
