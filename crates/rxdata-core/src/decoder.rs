//! Marshal decoder: turns a tag-prefixed byte stream into a [`Document`].
//!
//! Decoding is a single recursive descent over one cursor. Each call to
//! [`Decoder::decode_value`] reads one tag byte and dispatches on it.
//!
//! # Key design decisions
//!
//! - **Reserve before recursing**: strings, arrays, hashes, objects and the
//!   special classes take their object-cache slot when their identity is
//!   established, before any child is decoded. A child can therefore refer
//!   back to an ancestor that is still being filled, which is how cyclic
//!   graphs are written.
//! - **Handles, not pointers**: cache entries are [`Value`] handles into an
//!   index-addressed arena, so later growth never invalidates an earlier entry.
//! - **Bounded depth**: nesting past [`DecodeOptions::max_depth`] fails with
//!   [`MarshalError::DepthLimitExceeded`] instead of exhausting the stack.
//! - **Fail closed**: tags this decoder does not implement are errors, never
//!   best-effort values.

use crate::cache::{Heap, ObjectCache, SymbolCache};
use crate::cursor::Cursor;
use crate::document::Document;
use crate::error::{MarshalError, Result};
use crate::fixnum::read_fixnum;
use crate::special::SpecialClass;
use crate::value::{Node, NodeId, Object, SymbolId, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, trace, warn};

/// Major format version written by every supported engine.
pub const MAJOR_VERSION: u8 = 4;
/// Highest minor format version this decoder accepts.
pub const MINOR_VERSION: u8 = 8;

/// Default nesting limit for [`DecodeOptions::max_depth`].
pub const DEFAULT_MAX_DEPTH: usize = 256;

mod tag {
    pub const LINK: u8 = b'@';
    pub const NIL: u8 = b'0';
    pub const TRUE: u8 = b'T';
    pub const FALSE: u8 = b'F';
    pub const FIXNUM: u8 = b'i';
    pub const FLOAT: u8 = b'f';
    pub const STRING: u8 = b'"';
    pub const ARRAY: u8 = b'[';
    pub const HASH: u8 = b'{';
    pub const SYMBOL: u8 = b':';
    pub const SYMLINK: u8 = b';';
    pub const IVAR: u8 = b'I';
    pub const USER_DEF: u8 = b'u';
    pub const OBJECT: u8 = b'o';

    /// Tags of the format that are recognized but deliberately not decoded.
    pub fn unsupported(tag: u8) -> Option<&'static str> {
        Some(match tag {
            b'e' => "extended object",
            b'C' => "user class",
            b'l' => "bignum",
            b'/' => "regexp",
            b'}' => "hash with default",
            b'S' => "struct",
            b'U' => "user marshal",
            b'd' => "data object",
            b'M' => "module (old format)",
            b'c' => "class",
            b'm' => "module",
            _ => return None,
        })
    }
}

/// Tunables for a single decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Maximum nesting depth of values.
    pub max_depth: usize,
    /// Whether an `I` wrapper takes its own object-cache slot, aliasing the
    /// wrapped string. Stock Ruby readers do not number the wrapper.
    pub ivar_slot: bool,
    /// Whether a special class must consume exactly its declared payload.
    pub strict_payload: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            ivar_slot: true,
            strict_payload: true,
        }
    }
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_ivar_slot(mut self, ivar_slot: bool) -> Self {
        self.ivar_slot = ivar_slot;
        self
    }

    pub fn with_strict_payload(mut self, strict_payload: bool) -> Self {
        self.strict_payload = strict_payload;
        self
    }
}

/// Decode a bare value (no version header) with default options.
pub fn decode(bytes: &[u8]) -> Result<Document> {
    Decoder::new(bytes).decode()
}

/// Validate and strip the 2-byte version header, then decode the value.
pub fn load(bytes: &[u8]) -> Result<Document> {
    Decoder::new(bytes).load()
}

/// Read a file and [`load`] it.
pub fn load_file(path: impl AsRef<Path>) -> Result<Document> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    debug!(path = %path.display(), len = bytes.len(), "loading marshal file");
    load(&bytes)
}

/// Decoder state for one stream. Caches live exactly as long as the decoder.
pub struct Decoder<'a> {
    cursor: Cursor<'a>,
    objects: ObjectCache,
    symbols: SymbolCache,
    heap: Heap,
    depth: usize,
    options: DecodeOptions,
}

impl<'a> Decoder<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self::with_options(bytes, DecodeOptions::default())
    }

    pub fn with_options(bytes: &'a [u8], options: DecodeOptions) -> Self {
        Self {
            cursor: Cursor::new(bytes),
            objects: ObjectCache::new(),
            symbols: SymbolCache::new(),
            heap: Heap::new(),
            depth: 0,
            options,
        }
    }

    /// Decode the root value, which must start at the current position.
    pub fn decode(mut self) -> Result<Document> {
        let root = self.decode_value()?;
        Ok(self.finish(root))
    }

    /// Read the version header, then decode the root value.
    pub fn load(mut self) -> Result<Document> {
        self.read_header()?;
        self.decode()
    }

    /// Read and validate the `major.minor` version header.
    pub fn read_header(&mut self) -> Result<()> {
        let major = self.cursor.read_u8()?;
        let minor = self.cursor.read_u8()?;
        if major != MAJOR_VERSION || minor > MINOR_VERSION {
            return Err(MarshalError::UnsupportedVersion { major, minor });
        }
        debug!(major, minor, "marshal header");
        Ok(())
    }

    /// Decode one value and everything nested in it.
    pub fn decode_value(&mut self) -> Result<Value> {
        if self.depth >= self.options.max_depth {
            return Err(MarshalError::DepthLimitExceeded {
                limit: self.options.max_depth,
                offset: self.cursor.position(),
            });
        }
        self.depth += 1;
        let result = self.dispatch();
        self.depth -= 1;
        result
    }

    /// General cache as filled so far.
    pub fn objects(&self) -> &ObjectCache {
        &self.objects
    }

    /// Symbol cache as filled so far.
    pub fn symbols(&self) -> &SymbolCache {
        &self.symbols
    }

    fn finish(self, root: Value) -> Document {
        let trailing = self.cursor.remaining();
        if trailing > 0 {
            debug!(trailing, "ignoring bytes after root value");
        }
        Document::new(
            root,
            self.heap.into_vec(),
            self.objects.into_vec(),
            self.symbols.into_vec(),
            trailing,
        )
    }

    fn dispatch(&mut self) -> Result<Value> {
        let offset = self.cursor.position();
        let t = self.cursor.read_u8()?;
        match t {
            tag::LINK => {
                let index = read_fixnum(&mut self.cursor)?;
                self.objects.resolve(index, offset)
            }
            tag::NIL => Ok(Value::Nil),
            tag::TRUE => Ok(Value::Bool(true)),
            tag::FALSE => Ok(Value::Bool(false)),
            tag::FIXNUM => Ok(Value::Integer(read_fixnum(&mut self.cursor)?)),
            tag::FLOAT => self.read_float(),
            tag::STRING => self.read_string(),
            tag::ARRAY => self.read_array(),
            tag::HASH => self.read_hash(),
            tag::SYMBOL => self.read_symbol(),
            tag::SYMLINK => {
                let index = read_fixnum(&mut self.cursor)?;
                Ok(Value::Symbol(self.symbols.resolve(index, offset)?))
            }
            tag::IVAR => self.read_ivar(),
            tag::USER_DEF => self.read_user_def(),
            tag::OBJECT => self.read_object(),
            other => match tag::unsupported(other) {
                Some(name) => Err(MarshalError::UnsupportedFormat {
                    what: format!("{name} (tag '{}')", other as char),
                    offset,
                }),
                None => Err(MarshalError::UnknownTag { tag: other, offset }),
            },
        }
    }

    /// Read a length or count prefix, rejecting negative values.
    fn read_length(&mut self, what: &'static str) -> Result<usize> {
        let offset = self.cursor.position();
        let len = read_fixnum(&mut self.cursor)?;
        usize::try_from(len).map_err(|_| MarshalError::InvalidLength { what, len, offset })
    }

    /// Decode a nested value that must be a symbol.
    fn read_symbol_value(&mut self, context: &'static str) -> Result<SymbolId> {
        let offset = self.cursor.position();
        match self.decode_value()? {
            Value::Symbol(id) => Ok(id),
            other => Err(type_mismatch(context, "symbol", other, offset)),
        }
    }

    fn symbol_name(&self, id: SymbolId) -> &[u8] {
        self.symbols.get(id).unwrap_or_default()
    }

    fn read_float(&mut self) -> Result<Value> {
        let len = self.read_length("float")?;
        let offset = self.cursor.position();
        let bytes = self.cursor.read_bytes(len)?;
        // Older writers append NUL plus binary mantissa bytes after the text.
        let text = bytes.split(|&b| b == 0).next().unwrap_or_default();
        let f = parse_float(text).ok_or_else(|| MarshalError::InvalidFloat {
            text: String::from_utf8_lossy(text).into_owned(),
            offset,
        })?;
        let value = Value::Float(f);
        self.objects.push(value);
        Ok(value)
    }

    fn read_string(&mut self) -> Result<Value> {
        let len = self.read_length("string")?;
        let bytes = self.cursor.read_bytes(len)?.to_vec();
        let value = Value::String(self.heap.alloc(Node::String(bytes)));
        self.objects.push(value);
        Ok(value)
    }

    fn read_array(&mut self) -> Result<Value> {
        let len = self.read_length("array")?;
        let items = Vec::with_capacity(len.min(self.cursor.remaining()));
        let id = self.heap.alloc(Node::Array(items));
        let value = Value::Array(id);
        self.objects.push(value);

        for _ in 0..len {
            let item = self.decode_value()?;
            self.array_mut(id).push(item);
        }
        Ok(value)
    }

    fn read_hash(&mut self) -> Result<Value> {
        let len = self.read_length("hash")?;
        let id = self.heap.alloc(Node::Hash(BTreeMap::new()));
        let value = Value::Hash(id);
        self.objects.push(value);

        for _ in 0..len {
            let key_offset = self.cursor.position();
            let key = match self.decode_value()? {
                Value::Integer(n) => n,
                other => return Err(type_mismatch("hash key", "integer", other, key_offset)),
            };
            let entry = self.decode_value()?;
            self.hash_mut(id).entry(key).or_insert(entry);
        }
        Ok(value)
    }

    fn read_symbol(&mut self) -> Result<Value> {
        let len = self.read_length("symbol")?;
        let name = self.cursor.read_bytes(len)?.to_vec();
        Ok(Value::Symbol(self.symbols.push(name)))
    }

    /// `I`: a string followed by instance variables (usually its encoding).
    fn read_ivar(&mut self) -> Result<Value> {
        let inner_offset = self.cursor.position();
        let inner = self.decode_value()?;
        if !matches!(inner, Value::String(_)) {
            return Err(type_mismatch(
                "instance-variable wrapper payload",
                "string",
                inner,
                inner_offset,
            ));
        }

        let count = self.read_length("instance variable")?;
        if self.options.ivar_slot {
            self.objects.push(inner);
        }

        for _ in 0..count {
            let name = self.read_symbol_value("instance variable name")?;
            let value = self.decode_value()?;
            trace!(
                name = %String::from_utf8_lossy(self.symbol_name(name)),
                ?value,
                "discarding string instance variable"
            );
        }
        Ok(inner)
    }

    /// `u`: a class that dumps itself as a raw byte payload.
    fn read_user_def(&mut self) -> Result<Value> {
        let name_offset = self.cursor.position();
        let name = self.read_symbol_value("user-defined class name")?;
        let len = self.read_length("user-defined payload")?;

        let class_name = self.symbol_name(name);
        let Some(class) = SpecialClass::from_name(class_name) else {
            return Err(MarshalError::UnsupportedFormat {
                what: format!(
                    "user-defined class `{}`",
                    String::from_utf8_lossy(class_name)
                ),
                offset: name_offset,
            });
        };

        let payload_offset = self.cursor.position();
        let mut payload = self.cursor.sub_cursor(len)?;
        let node = class.read(&mut payload)?;
        let leftover = payload.remaining();
        if leftover > 0 {
            if self.options.strict_payload {
                return Err(MarshalError::PayloadLength {
                    class: class.name(),
                    declared: len,
                    consumed: len - leftover,
                    offset: payload_offset,
                });
            }
            warn!(
                class = class.name(),
                leftover,
                offset = payload_offset,
                "skipping unread payload bytes"
            );
        }

        let value = class.handle(self.heap.alloc(node));
        self.objects.push(value);
        Ok(value)
    }

    /// `o`: a generic object with `@`-prefixed instance variables.
    fn read_object(&mut self) -> Result<Value> {
        let class = self.read_symbol_value("object class name")?;
        let count = self.read_length("object field")?;
        let id = self.heap.alloc(Node::Object(Object::new(class)));
        let value = Value::Object(id);
        self.objects.push(value);

        for _ in 0..count {
            let key_offset = self.cursor.position();
            let key = self.read_symbol_value("object field name")?;
            let name = String::from_utf8_lossy(self.symbol_name(key)).into_owned();
            if !name.starts_with('@') {
                return Err(MarshalError::TypeMismatch {
                    context: "object field name",
                    expected: "an instance variable name starting with '@'",
                    found: format!("symbol {name:?}"),
                    offset: key_offset,
                });
            }
            let field = self.decode_value()?;
            self.object_mut(id).fields.entry(name).or_insert(field);
        }
        Ok(value)
    }

    fn array_mut(&mut self, id: NodeId) -> &mut Vec<Value> {
        match self.heap.get_mut(id) {
            Some(Node::Array(items)) => items,
            _ => unreachable!("reserved array slot {id:?} changed kind"),
        }
    }

    fn hash_mut(&mut self, id: NodeId) -> &mut BTreeMap<i32, Value> {
        match self.heap.get_mut(id) {
            Some(Node::Hash(map)) => map,
            _ => unreachable!("reserved hash slot {id:?} changed kind"),
        }
    }

    fn object_mut(&mut self, id: NodeId) -> &mut Object {
        match self.heap.get_mut(id) {
            Some(Node::Object(obj)) => obj,
            _ => unreachable!("reserved object slot {id:?} changed kind"),
        }
    }
}

fn type_mismatch(
    context: &'static str,
    expected: &'static str,
    found: Value,
    offset: usize,
) -> MarshalError {
    MarshalError::TypeMismatch {
        context,
        expected,
        found: found.kind().to_string(),
        offset,
    }
}

fn parse_float(text: &[u8]) -> Option<f64> {
    match text {
        b"nan" => Some(f64::NAN),
        b"inf" => Some(f64::INFINITY),
        b"-inf" => Some(f64::NEG_INFINITY),
        // `f64::from_str` also takes "infinity", "NaN" and a leading '+'.
        [b'+', ..] => None,
        _ if !text.iter().all(|b| b.is_ascii_digit() || b".eE-+".contains(b)) => None,
        _ => std::str::from_utf8(text).ok()?.parse().ok(),
    }
}
