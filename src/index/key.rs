//! Hashable index keys derived from field values
//!
//! `Value` holds f64 and so is neither `Eq` nor `Hash`. `IndexKey` is its
//! canonical hashable form: `-0.0` and `0.0` share a key, NaN has no key.

use std::cmp::Ordering;

use crate::value::Value;

/// Canonical, hashable form of a non-null value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndexKey {
    /// Null nested inside a sequence or mapping
    Null,
    /// Boolean value
    Bool(bool),
    /// Number stored as the bit pattern of its normalized f64
    Number(u64),
    /// Text value
    Text(String),
    /// Sequence of keys, order preserved
    Sequence(Vec<IndexKey>),
    /// Mapping entries in key order
    Mapping(Vec<(String, IndexKey)>),
}

impl IndexKey {
    /// Derives the key for a field value.
    ///
    /// Returns `None` for a top-level null and for any value containing NaN;
    /// such values are never indexed.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            other => Self::from_nested(other),
        }
    }

    fn from_nested(value: &Value) -> Option<Self> {
        Some(match value {
            Value::Null => IndexKey::Null,
            Value::Bool(b) => IndexKey::Bool(*b),
            Value::Number(n) => IndexKey::from_number(*n)?,
            Value::Text(s) => IndexKey::Text(s.clone()),
            Value::Sequence(items) => IndexKey::Sequence(
                items.iter().map(Self::from_nested).collect::<Option<Vec<_>>>()?,
            ),
            Value::Mapping(map) => IndexKey::Mapping(
                map.iter()
                    .map(|(k, v)| Self::from_nested(v).map(|key| (k.clone(), key)))
                    .collect::<Option<Vec<_>>>()?,
            ),
        })
    }

    fn from_number(n: f64) -> Option<Self> {
        if n.is_nan() {
            return None;
        }
        // Collapse -0.0 onto 0.0 so equal numbers share a bucket
        let normalized = if n == 0.0 { 0.0 } else { n };
        Some(IndexKey::Number(normalized.to_bits()))
    }

    /// Orders this key against a range bound of the same kind.
    ///
    /// Numbers, text and booleans are comparable with bounds of their own
    /// kind; every other pairing returns `None`.
    pub fn compare_to(&self, bound: &Value) -> Option<Ordering> {
        match (self, bound) {
            (IndexKey::Number(bits), Value::Number(b)) => f64::from_bits(*bits).partial_cmp(b),
            (IndexKey::Text(s), Value::Text(b)) => Some(s.as_str().cmp(b.as_str())),
            (IndexKey::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Returns true if the key lies within the inclusive bounds.
    ///
    /// Absent bounds are unbounded. A key incomparable with a present bound
    /// is outside the range.
    pub fn within(&self, min: Option<&Value>, max: Option<&Value>) -> bool {
        let above_min = min.map_or(true, |m| {
            matches!(self.compare_to(m), Some(Ordering::Greater | Ordering::Equal))
        });
        let below_max = max.map_or(true, |m| {
            matches!(self.compare_to(m), Some(Ordering::Less | Ordering::Equal))
        });
        above_min && below_max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_and_nan_have_no_key() {
        assert_eq!(IndexKey::from_value(&Value::Null), None);
        assert_eq!(IndexKey::from_value(&Value::Number(f64::NAN)), None);
        assert_eq!(
            IndexKey::from_value(&Value::Sequence(vec![Value::Number(f64::NAN)])),
            None
        );
    }

    #[test]
    fn test_negative_zero_shares_key() {
        assert_eq!(
            IndexKey::from_value(&Value::Number(-0.0)),
            IndexKey::from_value(&Value::Number(0.0))
        );
    }

    #[test]
    fn test_composite_values_are_keyed() {
        let a = IndexKey::from_value(&Value::from(json!({"x": [1, null]})));
        let b = IndexKey::from_value(&Value::from(json!({"x": [1, null]})));
        let c = IndexKey::from_value(&Value::from(json!({"x": [1]})));
        assert!(a.is_some());
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_kinds_do_not_collide() {
        assert_ne!(
            IndexKey::from_value(&Value::from(1)),
            IndexKey::from_value(&Value::from("1"))
        );
        assert_ne!(
            IndexKey::from_value(&Value::from(true)),
            IndexKey::from_value(&Value::from(1))
        );
    }

    #[test]
    fn test_within_bounds() {
        let key = IndexKey::from_value(&Value::from(30)).unwrap();
        assert!(key.within(Some(&Value::from(25)), Some(&Value::from(30))));
        assert!(key.within(None, None));
        assert!(!key.within(Some(&Value::from(31)), None));
        assert!(!key.within(Some(&Value::from("a")), None));
    }
}
