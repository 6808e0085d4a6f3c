//! # Value Module
//!
//! Dynamic property values for instance state, defaults, configuration,
//! method arguments and method replies.
//!
//! Design constraints:
//! - Integers only (no floating point anywhere in the workspace)
//! - `BTreeMap` for nested maps so iteration order is deterministic
//! - Untagged serde representation so JSON maps onto values directly

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Property map owned by an instance (and used for defaults and config).
pub type State = BTreeMap<String, Value>;

/// A dynamic property value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Absence of a value.
    #[default]
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// UTF-8 text.
    Text(String),
    /// Ordered sequence.
    List(Vec<Value>),
    /// Nested property map.
    Map(State),
}

impl Value {
    /// Build an empty map value.
    #[must_use]
    pub fn map() -> Self {
        Self::Map(State::new())
    }

    /// Build a map value from `(key, value)` pairs.
    pub fn map_of<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Short name of the variant, used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Text(_) => "text",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&State> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut State> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a dotted path such as `position.x` inside nested maps.
    ///
    /// An empty path returns the value itself.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        if path.is_empty() {
            return Some(self);
        }
        path.split('.')
            .try_fold(self, |current, segment| current.as_map()?.get(segment))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, item)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {item}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

// =============================================================================
// CONVERSIONS
// =============================================================================

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<State> for Value {
    fn from(map: State) -> Self {
        Self::Map(map)
    }
}

/// Build a [`State`] from `(key, value)` pairs.
pub fn state_of<K, V, I>(entries: I) -> State
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    entries
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_nested_maps() {
        let value = Value::map_of([("position", Value::map_of([("x", 3), ("y", 4)]))]);

        assert_eq!(value.lookup("position.x"), Some(&Value::Int(3)));
        assert_eq!(value.lookup("position.z"), None);
        assert_eq!(value.lookup(""), Some(&value));
    }

    #[test]
    fn lookup_stops_at_non_map() {
        let value = Value::map_of([("health", 20)]);
        assert_eq!(value.lookup("health.max"), None);
    }

    #[test]
    fn json_maps_onto_variants() {
        let parsed: Value =
            serde_json::from_str(r#"{"a": null, "b": true, "c": 7, "d": "x", "e": [1, 2]}"#)
                .expect("valid json");

        let map = parsed.as_map().expect("map");
        assert!(map["a"].is_null());
        assert_eq!(map["b"], Value::Bool(true));
        assert_eq!(map["c"], Value::Int(7));
        assert_eq!(map["d"], Value::from("x"));
        assert_eq!(map["e"], Value::from(vec![1, 2]));
    }

    #[test]
    fn fractional_numbers_are_rejected() {
        let parsed: Result<Value, _> = serde_json::from_str("1.5");
        assert!(parsed.is_err());
    }

    #[test]
    fn display_is_compact() {
        let value = Value::map_of([("items", Value::from(vec!["apple", "pear"]))]);
        assert_eq!(value.to_string(), "{items: [apple, pear]}");
    }
}
