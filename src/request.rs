//! Request construction from a bound parameter set.

use serde_json::{Map, Value};

use crate::operation::OperationDescriptor;
use crate::params::ParameterSet;

/// The request document for one remote call.
///
/// Only supplied parameters are present. Each value sits at its parameter's
/// wire path; dotted paths create nested objects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Request {
    body: Map<String, Value>,
}

impl Request {
    /// Build the request for `desc` from `params`.
    ///
    /// Parameters bound to null are skipped, never defaulted.
    pub fn build(desc: &OperationDescriptor, params: &ParameterSet) -> Self {
        let mut request = Request::default();
        for spec in &desc.params {
            if let Some(value) = params.get(&spec.name) {
                request.set(&spec.wire_path(), value.to_json());
            }
        }
        request
    }

    /// Place `value` at a dotted `path`, creating intermediate objects.
    pub fn set(&mut self, path: &str, value: Value) {
        let mut segments: Vec<&str> = path.split('.').collect();
        let Some(last) = segments.pop() else {
            return;
        };

        let mut node = &mut self.body;
        for segment in segments {
            let entry = node
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            let Value::Object(next) = entry else {
                return;
            };
            node = next;
        }
        node.insert(last.to_string(), value);
    }

    /// Value at a dotted `path`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        lookup(&self.body, path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Number of top-level members.
    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.body.clone())
    }
}

/// Resolve a dotted path inside a JSON object.
pub fn lookup<'a>(root: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = root.get(first)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}
