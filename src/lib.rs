//! BLT: Binary Loyc Tree serialization
//!
//! A compact binary format for forests of a small, uniform node algebra:
//! identifiers, typed literals, and calls, each optionally decorated with
//! attribute nodes. The format deduplicates on three layers — symbols,
//! call/attribute shapes (templates), and whole subtrees — and decodes in a
//! single forward pass with no seeking and no back-patching.
//!
//! # Example
//! ```
//! use blt::{read_nodes, write_nodes, NodeData, Value};
//!
//! // print("hi", 42)
//! let forest = vec![NodeData::call_id(
//!     "print",
//!     vec![
//!         NodeData::literal(Value::string("hi")),
//!         NodeData::literal(Value::i32(42)),
//!     ],
//! )];
//!
//! let mut buf = Vec::new();
//! write_nodes(&mut buf, &forest).unwrap();
//! let back = read_nodes(&mut buf.as_slice(), "example").unwrap();
//! assert_eq!(*back[0], *forest[0]);
//! ```

pub mod encoding;
pub mod node;
mod api;
mod error;

#[cfg(test)]
mod tests;

pub use api::{read_file, read_nodes, write_file, write_nodes, write_nodes_with};
pub use encoding::{BltReader, BltWriter, EncodingKind, NodeTemplate, WriterOptions};
pub use error::{BltError, BltResult, DecodeError, EncodeError};
pub use node::{
    DecimalBits, FloatBits32, FloatBits64, Node, NodeData, NodeFactory, NodeKind, Symbol, Value,
};
