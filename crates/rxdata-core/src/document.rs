//! The result of one decode: a root value plus everything it refers to.

use crate::value::{Color, Node, NodeId, Object, SymbolId, Table, Tone, Value};
use serde::Serialize;
use std::collections::BTreeMap;

/// A fully decoded stream.
///
/// The document owns the node arena and both identity caches in the state
/// the decode left them. All [`Value`] handles obtained from it are only
/// meaningful together with this document.
#[derive(Debug, Clone)]
pub struct Document {
    root: Value,
    nodes: Vec<Node>,
    objects: Vec<Value>,
    symbols: Vec<Vec<u8>>,
    trailing_bytes: usize,
}

/// Summary counts for a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentStats {
    pub strings: usize,
    pub arrays: usize,
    pub hashes: usize,
    pub objects: usize,
    pub colors: usize,
    pub tables: usize,
    pub tones: usize,
    pub object_cache: usize,
    pub symbol_cache: usize,
    /// Instance count per object class name.
    pub classes: BTreeMap<String, usize>,
}

impl Document {
    pub(crate) fn new(
        root: Value,
        nodes: Vec<Node>,
        objects: Vec<Value>,
        symbols: Vec<Vec<u8>>,
        trailing_bytes: usize,
    ) -> Self {
        Self {
            root,
            nodes,
            objects,
            symbols,
            trailing_bytes,
        }
    }

    pub fn root(&self) -> Value {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// The general cache, indexed the way `@` backreferences index it.
    pub fn object_cache(&self) -> &[Value] {
        &self.objects
    }

    /// The symbol cache, indexed the way `;` backreferences index it.
    pub fn symbol_cache(&self) -> &[Vec<u8>] {
        &self.symbols
    }

    /// Bytes left in the input after the root value.
    pub fn trailing_bytes(&self) -> usize {
        self.trailing_bytes
    }

    pub fn symbol(&self, id: SymbolId) -> Option<&[u8]> {
        self.symbols.get(id.index()).map(Vec::as_slice)
    }

    pub fn symbol_str(&self, id: SymbolId) -> Option<&str> {
        std::str::from_utf8(self.symbol(id)?).ok()
    }

    pub fn string(&self, value: Value) -> Option<&[u8]> {
        match (value, self.node(value.node_id()?)?) {
            (Value::String(_), Node::String(bytes)) => Some(bytes),
            _ => None,
        }
    }

    /// String contents when they are valid UTF-8.
    pub fn str(&self, value: Value) -> Option<&str> {
        std::str::from_utf8(self.string(value)?).ok()
    }

    pub fn array(&self, value: Value) -> Option<&[Value]> {
        match (value, self.node(value.node_id()?)?) {
            (Value::Array(_), Node::Array(items)) => Some(items),
            _ => None,
        }
    }

    pub fn hash(&self, value: Value) -> Option<&BTreeMap<i32, Value>> {
        match (value, self.node(value.node_id()?)?) {
            (Value::Hash(_), Node::Hash(map)) => Some(map),
            _ => None,
        }
    }

    pub fn object(&self, value: Value) -> Option<&Object> {
        match (value, self.node(value.node_id()?)?) {
            (Value::Object(_), Node::Object(obj)) => Some(obj),
            _ => None,
        }
    }

    pub fn color(&self, value: Value) -> Option<&Color> {
        match (value, self.node(value.node_id()?)?) {
            (Value::Color(_), Node::Color(c)) => Some(c),
            _ => None,
        }
    }

    pub fn table(&self, value: Value) -> Option<&Table> {
        match (value, self.node(value.node_id()?)?) {
            (Value::Table(_), Node::Table(t)) => Some(t),
            _ => None,
        }
    }

    pub fn tone(&self, value: Value) -> Option<&Tone> {
        match (value, self.node(value.node_id()?)?) {
            (Value::Tone(_), Node::Tone(t)) => Some(t),
            _ => None,
        }
    }

    /// Field of an object value, by name with or without `@`.
    pub fn field(&self, value: Value, name: &str) -> Option<Value> {
        self.object(value)?.field(name)
    }

    /// Class name of an object or special-class value.
    pub fn class_name(&self, value: Value) -> Option<&str> {
        match value {
            Value::Object(_) => self.symbol_str(self.object(value)?.class),
            Value::Color(_) => Some("Color"),
            Value::Table(_) => Some("Table"),
            Value::Tone(_) => Some("Tone"),
            Value::Nil
            | Value::Bool(_)
            | Value::Integer(_)
            | Value::Float(_)
            | Value::String(_)
            | Value::Symbol(_)
            | Value::Array(_)
            | Value::Hash(_) => None,
        }
    }

    pub fn stats(&self) -> DocumentStats {
        let mut stats = DocumentStats {
            object_cache: self.objects.len(),
            symbol_cache: self.symbols.len(),
            ..DocumentStats::default()
        };
        for node in &self.nodes {
            match node {
                Node::String(_) => stats.strings += 1,
                Node::Array(_) => stats.arrays += 1,
                Node::Hash(_) => stats.hashes += 1,
                Node::Object(obj) => {
                    stats.objects += 1;
                    let name = self
                        .symbol(obj.class)
                        .map(|s| String::from_utf8_lossy(s).into_owned())
                        .unwrap_or_default();
                    *stats.classes.entry(name).or_default() += 1;
                }
                Node::Color(_) => stats.colors += 1,
                Node::Table(_) => stats.tables += 1,
                Node::Tone(_) => stats.tones += 1,
            }
        }
        stats
    }
}

