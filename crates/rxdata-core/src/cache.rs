//! Identity caches and the node arena.
//!
//! A stream numbers its values as they are first produced; later
//! backreferences name them by that number. Symbols and all other values are
//! numbered independently. Both caches are append-only and addressed purely
//! by index, so an entry handed out earlier stays valid while the cache grows.

use crate::error::{MarshalError, Result};
use crate::value::{Node, NodeId, SymbolId, Value};
use std::fmt;

/// Which of the two backreference namespaces an index refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    Object,
    Symbol,
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKind::Object => f.write_str("object"),
            CacheKind::Symbol => f.write_str("symbol"),
        }
    }
}

/// General cache: every value a `@` backreference can name, in stream order.
#[derive(Debug, Default, Clone)]
pub struct ObjectCache {
    entries: Vec<Value>,
}

impl ObjectCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value and return its index.
    pub fn push(&mut self, value: Value) -> usize {
        self.entries.push(value);
        self.entries.len() - 1
    }

    /// Resolve a `@` backreference read at `offset`.
    pub fn resolve(&self, index: i32, offset: usize) -> Result<Value> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.entries.get(i))
            .copied()
            .ok_or(MarshalError::BadBackreference {
                cache: CacheKind::Object,
                index,
                len: self.entries.len(),
                offset,
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.entries
    }

    pub(crate) fn into_vec(self) -> Vec<Value> {
        self.entries
    }
}

/// Symbol cache: interned names in the order they first appeared.
#[derive(Debug, Default, Clone)]
pub struct SymbolCache {
    names: Vec<Vec<u8>>,
}

impl SymbolCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a name. Repeated names still get fresh slots, as on the wire.
    pub fn push(&mut self, name: Vec<u8>) -> SymbolId {
        self.names.push(name);
        SymbolId(self.names.len() - 1)
    }

    /// Resolve a `;` backreference read at `offset`.
    pub fn resolve(&self, index: i32, offset: usize) -> Result<SymbolId> {
        match usize::try_from(index) {
            Ok(i) if i < self.names.len() => Ok(SymbolId(i)),
            _ => Err(MarshalError::BadBackreference {
                cache: CacheKind::Symbol,
                index,
                len: self.names.len(),
                offset,
            }),
        }
    }

    pub fn get(&self, id: SymbolId) -> Option<&[u8]> {
        self.names.get(id.0).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub(crate) fn into_vec(self) -> Vec<Vec<u8>> {
        self.names
    }
}

/// Arena owning the contents of every composite value.
#[derive(Debug, Default, Clone)]
pub struct Heap {
    nodes: Vec<Node>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a node and return its id. Ids are never reused.
    pub fn alloc(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn into_vec(self) -> Vec<Node> {
        self.nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_cache_indexes_from_zero() {
        let mut cache = ObjectCache::new();
        assert_eq!(cache.push(Value::Integer(1)), 0);
        assert_eq!(cache.push(Value::Nil), 1);
        assert_eq!(cache.resolve(0, 0).unwrap(), Value::Integer(1));
        assert_eq!(cache.resolve(1, 0).unwrap(), Value::Nil);
    }

    #[test]
    fn object_cache_rejects_forward_and_negative_indices() {
        let mut cache = ObjectCache::new();
        cache.push(Value::Nil);
        for index in [1, 5, -1] {
            match cache.resolve(index, 9) {
                Err(MarshalError::BadBackreference {
                    cache: CacheKind::Object,
                    len: 1,
                    offset: 9,
                    ..
                }) => {}
                other => panic!("index {index}: unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn symbol_cache_keeps_duplicates_apart() {
        let mut symbols = SymbolCache::new();
        let a = symbols.push(b"id".to_vec());
        let b = symbols.push(b"id".to_vec());
        assert_ne!(a, b);
        assert_eq!(symbols.resolve(1, 0).unwrap(), b);
        assert_eq!(symbols.get(a), Some(&b"id"[..]));
        assert!(matches!(
            symbols.resolve(2, 0),
            Err(MarshalError::BadBackreference {
                cache: CacheKind::Symbol,
                ..
            })
        ));
    }

    #[test]
    fn heap_ids_follow_allocation_order() {
        let mut heap = Heap::new();
        let s = heap.alloc(Node::String(b"x".to_vec()));
        let a = heap.alloc(Node::Array(Vec::new()));
        assert_eq!((s, a), (NodeId(0), NodeId(1)));
        if let Some(Node::Array(items)) = heap.get_mut(a) {
            items.push(Value::String(s));
        }
        assert_eq!(heap.get(a), Some(&Node::Array(vec![Value::String(s)])));
        assert_eq!(heap.len(), 2);
    }
}
