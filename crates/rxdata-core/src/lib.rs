//! # rxdata-core
//!
//! Pure-Rust decoder for **Ruby Marshal** streams as written by RPG Maker
//! style game engines (`.rxdata` files: maps, tilesets, system tables).
//!
//! Decoding produces a [`Document`]: a root [`Value`] plus the arena and
//! identity caches backing it. Values may be shared and may be cyclic, so
//! composites are handles into the document rather than owned trees.
//!
//! ## Quick start
//!
//! ```rust
//! use rxdata_core::{load, Value};
//!
//! // Marshal 4.8 header, then ["abc", <same string again>]
//! let bytes = b"\x04\x08[\x07\"\x08abc@\x06";
//! let doc = load(bytes).unwrap();
//!
//! let items = doc.array(doc.root()).unwrap();
//! assert_eq!(doc.str(items[0]), Some("abc"));
//! assert_eq!(items[0], items[1]); // same string object
//! assert!(matches!(items[0], Value::String(_)));
//! ```
//!
//! ## Modules
//!
//! - [`decoder`]: tag dispatcher, options, `decode`/`load` entry points
//! - [`fixnum`]: variable-length integer codec
//! - [`cursor`]: bounded little-endian reads with absolute offsets
//! - [`cache`]: object and symbol identity caches, node arena
//! - [`special`]: fixed-layout classes (`Color`, `Table`, `Tone`)
//! - [`value`]: value handles and node contents
//! - [`document`]: decode result and accessors
//! - [`json`]: JSON rendering for inspection
//! - [`error`]: error types

pub mod cache;
pub mod cursor;
pub mod decoder;
pub mod document;
pub mod error;
pub mod fixnum;
pub mod json;
pub mod special;
pub mod value;

pub use decoder::{decode, load, load_file, DecodeOptions, Decoder};
pub use document::{Document, DocumentStats};
pub use error::{MarshalError, Result};
pub use value::{Color, Node, NodeId, Object, SymbolId, Table, Tone, Value, ValueKind};
