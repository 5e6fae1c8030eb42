//! JSON rendering of a decoded document, for inspection by other tools.
//!
//! - Strings render as (lossy) UTF-8 text, symbols as `":name"`.
//! - Hash keys become decimal strings.
//! - Objects and special classes carry their class under `"$class"`.
//! - Non-finite floats render as `"nan"`, `"inf"` or `"-inf"`.
//! - Every node is rendered in full only the first time it is reached. Any
//!   later reach (a shared value or a cycle) renders as
//!   `{"$ref": <node index>}`, so output size stays linear in the document.
//!   Anything past the depth cap renders as a reference too.

use crate::document::Document;
use crate::value::{Node, NodeId, Value};
use serde_json::{Map, Number, Value as Json};
use std::collections::HashSet;

/// Rendering stops expanding composites below this depth.
const MAX_RENDER_DEPTH: usize = 256;

impl Document {
    /// Render the whole document starting at its root.
    pub fn to_json(&self) -> Json {
        self.value_to_json(self.root())
    }

    /// Render one value of this document.
    pub fn value_to_json(&self, value: Value) -> Json {
        Renderer {
            doc: self,
            seen: HashSet::new(),
            depth: 0,
        }
        .value(value)
    }
}

struct Renderer<'d> {
    doc: &'d Document,
    /// Nodes already rendered (or being rendered) anywhere in this output.
    seen: HashSet<NodeId>,
    depth: usize,
}

impl Renderer<'_> {
    fn value(&mut self, value: Value) -> Json {
        match value {
            Value::Nil => Json::Null,
            Value::Bool(b) => Json::Bool(b),
            Value::Integer(n) => Json::from(n),
            Value::Float(f) => float(f),
            Value::Symbol(id) => {
                let name = self.doc.symbol(id).unwrap_or_default();
                Json::String(format!(":{}", String::from_utf8_lossy(name)))
            }
            Value::String(id)
            | Value::Array(id)
            | Value::Hash(id)
            | Value::Object(id)
            | Value::Color(id)
            | Value::Table(id)
            | Value::Tone(id) => self.node(id),
        }
    }

    fn node(&mut self, id: NodeId) -> Json {
        if self.depth >= MAX_RENDER_DEPTH || !self.seen.insert(id) {
            return node_ref(id);
        }
        let doc = self.doc;
        let Some(node) = doc.node(id) else {
            return node_ref(id);
        };

        self.depth += 1;
        let out = match node {
            Node::String(bytes) => Json::String(String::from_utf8_lossy(bytes).into_owned()),
            Node::Array(items) => Json::Array(items.iter().map(|v| self.value(*v)).collect()),
            Node::Hash(map) => Json::Object(
                map.iter()
                    .map(|(k, v)| (k.to_string(), self.value(*v)))
                    .collect(),
            ),
            Node::Object(obj) => {
                let class = doc.symbol(obj.class).unwrap_or_default();
                let mut out = class_map(&String::from_utf8_lossy(class));
                for (name, v) in &obj.fields {
                    out.insert(name.clone(), self.value(*v));
                }
                Json::Object(out)
            }
            Node::Color(c) => {
                let mut out = class_map("Color");
                out.insert("red".into(), float(c.red));
                out.insert("green".into(), float(c.green));
                out.insert("blue".into(), float(c.blue));
                out.insert("alpha".into(), float(c.alpha));
                Json::Object(out)
            }
            Node::Tone(t) => {
                let mut out = class_map("Tone");
                out.insert("red".into(), float(t.red));
                out.insert("green".into(), float(t.green));
                out.insert("blue".into(), float(t.blue));
                out.insert("grey".into(), float(t.grey));
                Json::Object(out)
            }
            Node::Table(t) => {
                let mut out = class_map("Table");
                out.insert("x_size".into(), Json::from(t.x_size));
                out.insert("y_size".into(), Json::from(t.y_size));
                out.insert("z_size".into(), Json::from(t.z_size));
                out.insert("data".into(), Json::from(t.data.clone()));
                Json::Object(out)
            }
        };
        self.depth -= 1;
        out
    }
}

fn class_map(class: &str) -> Map<String, Json> {
    let mut map = Map::new();
    map.insert("$class".into(), Json::String(class.to_string()));
    map
}

fn node_ref(id: NodeId) -> Json {
    let mut map = Map::new();
    map.insert("$ref".into(), Json::from(id.index()));
    Json::Object(map)
}

fn float(f: f64) -> Json {
    match Number::from_f64(f) {
        Some(n) => Json::Number(n),
        None if f.is_nan() => Json::String("nan".into()),
        None if f > 0.0 => Json::String("inf".into()),
        None => Json::String("-inf".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_finite_floats_render_as_strings() {
        assert_eq!(float(f64::NAN), Json::String("nan".into()));
        assert_eq!(float(f64::INFINITY), Json::String("inf".into()));
        assert_eq!(float(f64::NEG_INFINITY), Json::String("-inf".into()));
        assert_eq!(float(0.5), serde_json::json!(0.5));
    }
}
