//! FILENAME: core/grid-engine/src/row.rs
//! PURPOSE: Field access on caller-owned row records.
//! CONTEXT: Every stage is generic over the row type. A row only needs to
//! answer "what is the value of field X"; computed columns go through a
//! column's value getter instead.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;
use std::rc::Rc;
use std::sync::Arc;

use crate::value::Value;

/// A record addressable by field name.
pub trait Row {
    /// Returns the value stored under `name`, or `None` when the row has no
    /// such field.
    fn field(&self, name: &str) -> Option<Value>;
}

impl Row for BTreeMap<String, Value> {
    fn field(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

impl<S: BuildHasher> Row for HashMap<String, Value, S> {
    fn field(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

impl Row for serde_json::Map<String, serde_json::Value> {
    fn field(&self, name: &str) -> Option<Value> {
        self.get(name).map(Value::from)
    }
}

impl Row for serde_json::Value {
    fn field(&self, name: &str) -> Option<Value> {
        self.as_object().and_then(|obj| obj.field(name))
    }
}

impl<T: Row + ?Sized> Row for &T {
    fn field(&self, name: &str) -> Option<Value> {
        (**self).field(name)
    }
}

impl<T: Row + ?Sized> Row for Box<T> {
    fn field(&self, name: &str) -> Option<Value> {
        (**self).field(name)
    }
}

impl<T: Row + ?Sized> Row for Rc<T> {
    fn field(&self, name: &str) -> Option<Value> {
        (**self).field(name)
    }
}

impl<T: Row + ?Sized> Row for Arc<T> {
    fn field(&self, name: &str) -> Option<Value> {
        (**self).field(name)
    }
}

/// Builds a `BTreeMap` row from `(field, value)` pairs.
pub fn record<K, V, I>(pairs: I) -> BTreeMap<String, Value>
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_rows() {
        let row = record([("make", Value::from("Ford")), ("price", Value::from(100))]);
        assert_eq!(row.field("make"), Some(Value::from("Ford")));
        assert_eq!(row.field("missing"), None);

        let shared = Arc::new(row);
        assert_eq!(shared.field("price"), Some(Value::Number(100.0)));
    }

    #[test]
    fn test_json_rows() {
        let row: serde_json::Value =
            serde_json::from_str(r#"{"make": "VW", "price": 80, "sold": null}"#).unwrap();
        assert_eq!(row.field("make"), Some(Value::from("VW")));
        assert_eq!(row.field("price"), Some(Value::Number(80.0)));
        assert_eq!(row.field("sold"), Some(Value::Null));

        let not_an_object = serde_json::Value::from(3);
        assert_eq!(not_an_object.field("make"), None);
    }
}
