//! JSON filter syntax
//!
//! ```text
//! {"name": "Alice"}                       equality
//! {"age": {"$gte": 18, "$lt": 65}}        operator object
//! {"nick": {"$exists": false}}            presence
//! {"$or": [{...}, {...}]}                 combinators ($and, $or, $not)
//! ```
//!
//! Several keys at one level form an implicit `And`. An empty object
//! matches every document.

use serde_json::{Map, Value as Json};

use super::ast::{CompareOp, Filter};
use super::errors::{PlannerError, PlannerResult};

impl Filter {
    /// Parses the JSON filter syntax.
    pub fn from_json(json: &Json) -> PlannerResult<Filter> {
        let object = json
            .as_object()
            .ok_or_else(|| PlannerError::invalid_filter("filter must be a JSON object"))?;
        parse_object(object)
    }
}

fn parse_object(object: &Map<String, Json>) -> PlannerResult<Filter> {
    let mut clauses = Vec::with_capacity(object.len());
    for (key, value) in object {
        match key.as_str() {
            "$and" => clauses.push(Filter::And(parse_list(key, value)?)),
            "$or" => clauses.push(Filter::Or(parse_list(key, value)?)),
            "$not" => clauses.push(Filter::not(Filter::from_json(value)?)),
            op if op.starts_with('$') => return Err(PlannerError::unknown_operator(op)),
            field => clauses.extend(parse_field(field, value)?),
        }
    }
    Ok(collapse(clauses))
}

fn parse_list(key: &str, value: &Json) -> PlannerResult<Vec<Filter>> {
    value
        .as_array()
        .ok_or_else(|| PlannerError::invalid_filter(format!("{} expects an array", key)))?
        .iter()
        .map(Filter::from_json)
        .collect()
}

fn parse_field(field: &str, value: &Json) -> PlannerResult<Vec<Filter>> {
    let operators = match value {
        Json::Object(map) if is_operator_object(map) => map,
        literal => return Ok(vec![Filter::eq(field, literal.clone())]),
    };

    operators
        .iter()
        .map(|(op, operand)| {
            let compare = match op.as_str() {
                "$eq" => CompareOp::Eq,
                "$ne" => CompareOp::Ne,
                "$gt" => CompareOp::Gt,
                "$gte" => CompareOp::Gte,
                "$lt" => CompareOp::Lt,
                "$lte" => CompareOp::Lte,
                "$exists" => {
                    let present = operand.as_bool().ok_or_else(|| {
                        PlannerError::invalid_filter("$exists expects a boolean")
                    })?;
                    let exists = Filter::exists(field);
                    return Ok(if present { exists } else { Filter::not(exists) });
                }
                other => return Err(PlannerError::unknown_operator(other)),
            };
            Ok(Filter::Compare {
                path: field.to_string(),
                op: compare,
                value: operand.clone().into(),
            })
        })
        .collect()
}

/// An object whose keys are all operators, as opposed to a literal mapping
fn is_operator_object(map: &Map<String, Json>) -> bool {
    !map.is_empty() && map.keys().all(|k| k.starts_with('$'))
}

fn collapse(mut clauses: Vec<Filter>) -> Filter {
    if clauses.len() == 1 {
        clauses.remove(0)
    } else {
        Filter::And(clauses)
    }
}
