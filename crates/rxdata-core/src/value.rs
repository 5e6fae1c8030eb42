//! Decoded value model.
//!
//! A decoded stream is a graph, not a tree: composites can be shared through
//! backreferences and can contain themselves. [`Value`] is therefore a small
//! `Copy` handle. Scalars are stored inline; composites point into the
//! document's node arena by [`NodeId`], and symbols point into the symbol
//! cache by [`SymbolId`]. Two composite values are the same object exactly
//! when their handles are equal.

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Index of a composite node in a document's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Index of an interned name in a document's symbol cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub(crate) usize);

impl SymbolId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One decoded value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Integer(i32),
    Float(f64),
    String(NodeId),
    Symbol(SymbolId),
    Array(NodeId),
    Hash(NodeId),
    Object(NodeId),
    Color(NodeId),
    Table(NodeId),
    Tone(NodeId),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Nil => ValueKind::Nil,
            Value::Bool(_) => ValueKind::Bool,
            Value::Integer(_) => ValueKind::Integer,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::Symbol(_) => ValueKind::Symbol,
            Value::Array(_) => ValueKind::Array,
            Value::Hash(_) => ValueKind::Hash,
            Value::Object(_) => ValueKind::Object,
            Value::Color(_) => ValueKind::Color,
            Value::Table(_) => ValueKind::Table,
            Value::Tone(_) => ValueKind::Tone,
        }
    }

    /// Arena node backing this value, if it is a composite.
    pub fn node_id(&self) -> Option<NodeId> {
        match *self {
            Value::String(id)
            | Value::Array(id)
            | Value::Hash(id)
            | Value::Object(id)
            | Value::Color(id)
            | Value::Table(id)
            | Value::Tone(id) => Some(id),
            Value::Nil
            | Value::Bool(_)
            | Value::Integer(_)
            | Value::Float(_)
            | Value::Symbol(_) => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i32> {
        match *self {
            Value::Integer(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match *self {
            Value::Float(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<SymbolId> {
        match *self {
            Value::Symbol(id) => Some(id),
            _ => None,
        }
    }
}

/// The kind of a [`Value`], used for diagnostics and statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKind {
    Nil,
    Bool,
    Integer,
    Float,
    String,
    Symbol,
    Array,
    Hash,
    Object,
    Color,
    Table,
    Tone,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Nil => "nil",
            ValueKind::Bool => "bool",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Symbol => "symbol",
            ValueKind::Array => "array",
            ValueKind::Hash => "hash",
            ValueKind::Object => "object",
            ValueKind::Color => "Color",
            ValueKind::Table => "Table",
            ValueKind::Tone => "Tone",
        };
        f.write_str(name)
    }
}

/// Contents of a composite value, owned by the document arena.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    String(Vec<u8>),
    Array(Vec<Value>),
    /// Keys are restricted to integers on the wire this decoder reads.
    Hash(BTreeMap<i32, Value>),
    Object(Object),
    Color(Color),
    Table(Table),
    Tone(Tone),
}

impl Node {
    pub fn kind(&self) -> ValueKind {
        match self {
            Node::String(_) => ValueKind::String,
            Node::Array(_) => ValueKind::Array,
            Node::Hash(_) => ValueKind::Hash,
            Node::Object(_) => ValueKind::Object,
            Node::Color(_) => ValueKind::Color,
            Node::Table(_) => ValueKind::Table,
            Node::Tone(_) => ValueKind::Tone,
        }
    }
}

/// A generic Ruby object: class name plus instance variables in wire order.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    pub class: SymbolId,
    /// Field names keep their leading `@`.
    pub fields: IndexMap<String, Value>,
}

impl Object {
    pub fn new(class: SymbolId) -> Self {
        Self {
            class,
            fields: IndexMap::new(),
        }
    }

    /// Look up a field by name, with or without the leading `@`.
    pub fn field(&self, name: &str) -> Option<Value> {
        match name.strip_prefix('@') {
            Some(_) => self.fields.get(name).copied(),
            None => self.fields.get(&format!("@{name}")).copied(),
        }
    }
}

/// RGBA color with float channels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

/// Color tone adjustment: RGB shift plus greyscale amount.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Tone {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub grey: f64,
}

/// Up to three-dimensional grid of 16-bit cells (tile layers, passability...).
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Table {
    pub x_size: i32,
    pub y_size: i32,
    pub z_size: i32,
    pub data: Vec<i16>,
}

impl Table {
    /// Cell at `(x, y, z)`, laid out x-fastest then y then z.
    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<i16> {
        let xs = usize::try_from(self.x_size).ok()?;
        let ys = usize::try_from(self.y_size).ok()?;
        let zs = usize::try_from(self.z_size).ok()?;
        if x >= xs || y >= ys || z >= zs {
            return None;
        }
        self.data.get(x + y * xs + z * xs * ys).copied()
    }
}
