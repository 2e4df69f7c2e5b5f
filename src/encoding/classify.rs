//! Node classification: which run kind a node encodes under
//!
//! The kind tag is the one-byte header of each run in the node table.
//! Classification is a total match over the node shape and literal value,
//! producing the kind and, for templated shapes, the template the node
//! instantiates.

use serde::{Deserialize, Serialize};

use crate::node::{NodeData, NodeKind, Value};

use super::symtab::SymbolTableBuilder;
use super::template::NodeTemplate;

/// One-byte encoding kind tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EncodingKind {
    /// Template instance; the run header carries the template
    Templated = 0,
    /// Identifier, a symbol reference
    Id = 1,
    /// String literal, a symbol reference
    String = 2,
    /// Signed 8-bit integer literal
    Int8 = 3,
    /// Signed 16-bit integer literal
    Int16 = 4,
    /// Signed 32-bit integer literal
    Int32 = 5,
    /// Signed 64-bit integer literal
    Int64 = 6,
    /// Unsigned 8-bit integer literal
    UInt8 = 7,
    /// Unsigned 16-bit integer literal
    UInt16 = 8,
    /// Unsigned 32-bit integer literal
    UInt32 = 9,
    /// Unsigned 64-bit integer literal
    UInt64 = 10,
    /// 32-bit float literal
    Float32 = 11,
    /// 64-bit float literal
    Float64 = 12,
    /// UTF-16 code unit literal
    Char = 13,
    /// Boolean literal
    Bool = 14,
    /// Void literal; zero-byte body
    Void = 15,
    /// Null literal; zero-byte body
    Null = 16,
    /// 128-bit decimal literal
    Decimal = 17,
    /// Arbitrary-precision integer literal
    BigInt = 18,
    /// Template instance with a per-node template reference
    VarTemplated = 19,
}

impl EncodingKind {
    /// The on-disk tag byte
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Parse a tag byte
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Templated),
            1 => Some(Self::Id),
            2 => Some(Self::String),
            3 => Some(Self::Int8),
            4 => Some(Self::Int16),
            5 => Some(Self::Int32),
            6 => Some(Self::Int64),
            7 => Some(Self::UInt8),
            8 => Some(Self::UInt16),
            9 => Some(Self::UInt32),
            10 => Some(Self::UInt64),
            11 => Some(Self::Float32),
            12 => Some(Self::Float64),
            13 => Some(Self::Char),
            14 => Some(Self::Bool),
            15 => Some(Self::Void),
            16 => Some(Self::Null),
            17 => Some(Self::Decimal),
            18 => Some(Self::BigInt),
            19 => Some(Self::VarTemplated),
            _ => None,
        }
    }
}

/// The kind a literal value encodes under
pub fn literal_kind(value: &Value) -> EncodingKind {
    match value {
        Value::Null => EncodingKind::Null,
        Value::Void => EncodingKind::Void,
        Value::Bool(_) => EncodingKind::Bool,
        Value::Int8(_) => EncodingKind::Int8,
        Value::Int16(_) => EncodingKind::Int16,
        Value::Int32(_) => EncodingKind::Int32,
        Value::Int64(_) => EncodingKind::Int64,
        Value::UInt8(_) => EncodingKind::UInt8,
        Value::UInt16(_) => EncodingKind::UInt16,
        Value::UInt32(_) => EncodingKind::UInt32,
        Value::UInt64(_) => EncodingKind::UInt64,
        Value::Float32(_) => EncodingKind::Float32,
        Value::Float64(_) => EncodingKind::Float64,
        Value::Char(_) => EncodingKind::Char,
        Value::String(_) => EncodingKind::String,
        Value::Decimal(_) => EncodingKind::Decimal,
        Value::BigInt(_) => EncodingKind::BigInt,
    }
}

/// Classify a node, interning the target symbol of fixed-target calls.
/// Returns the encoding kind and the template for templated kinds.
pub fn classify(
    symbols: &mut SymbolTableBuilder,
    node: &NodeData,
) -> (EncodingKind, Option<NodeTemplate>) {
    if node.has_attrs() {
        return (
            EncodingKind::Templated,
            Some(NodeTemplate::Attrs {
                attr_count: node.attrs().len() as u32,
            }),
        );
    }
    match node.kind() {
        NodeKind::Call { target, args } => {
            let template = match target.name().filter(|_| target.is_bare_id()) {
                Some(name) => NodeTemplate::CallId {
                    target: symbols.get_index(name),
                    arity: args.len() as u32,
                },
                None => NodeTemplate::Call {
                    arity: args.len() as u32,
                },
            };
            (EncodingKind::Templated, Some(template))
        }
        NodeKind::Id(_) => (EncodingKind::Id, None),
        NodeKind::Literal(value) => (literal_kind(value), None),
    }
}
