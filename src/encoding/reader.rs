//! Single-pass stream decoder
//!
//! Reads the header tables, then reconstructs the flat node table run by
//! run. Every reference resolves against entries already decoded, so one
//! left-to-right pass suffices; a reference at or past the current table
//! length is a forward reference and fatal.

use std::io::Read;

use smallvec::SmallVec;
use tracing::debug;

use crate::error::{BltResult, DecodeError};
use crate::node::{FloatBits32, FloatBits64, Node, NodeFactory, Value};

use super::classify::EncodingKind;
use super::primitives::{
    read_bigint, read_bool, read_decimal, read_i16, read_i32, read_i64, read_i8, read_u16,
    read_u32, read_u64, read_u8,
};
use super::symtab::SymbolTable;
use super::template::{NodeTemplate, TemplateTable};
use super::varint::decode_varint32_from;
use super::{MAGIC, VERSION};

/// Binary stream decoder
#[derive(Debug, Default)]
pub struct BltReader {
    _private: (),
}

/// Immutable decode context after the header parse
struct ReaderState {
    symbols: SymbolTable,
    templates: TemplateTable,
    factory: NodeFactory,
}

impl BltReader {
    /// Create a decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a forest of top-level nodes. `source` is an opaque label the
    /// produced nodes are tagged with; it has no on-disk representation.
    pub fn read<R: Read>(&self, reader: &mut R, source: &str) -> BltResult<Vec<Node>> {
        Ok(self.decode(reader, NodeFactory::new(source))?)
    }

    fn decode<R: Read>(
        &self,
        reader: &mut R,
        factory: NodeFactory,
    ) -> Result<Vec<Node>, DecodeError> {
        let mut magic = [0u8; 3];
        reader.read_exact(&mut magic).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                DecodeError::UnexpectedEof
            } else {
                DecodeError::Io(e)
            }
        })?;
        if magic != MAGIC {
            return Err(DecodeError::BadMagic(magic));
        }

        let version = read_i32(reader)? as u32;
        if version > VERSION as u32 {
            return Err(DecodeError::UnsupportedVersion {
                major: (version >> 16) as u16,
                minor: (version & 0xFFFF) as u16,
            });
        }

        let state = ReaderState {
            symbols: SymbolTable::decode(reader)?,
            templates: TemplateTable::decode(reader)?,
            factory,
        };

        let run_count = decode_varint32_from(reader)?;
        let mut nodes: Vec<Node> = Vec::new();
        for _ in 0..run_count {
            read_run(reader, &state, &mut nodes)?;
        }

        let top_count = decode_varint32_from(reader)? as usize;
        let mut tops = Vec::with_capacity(top_count);
        for _ in 0..top_count {
            tops.push(resolve_ref(reader, &nodes)?.clone());
        }

        debug!(
            symbols = state.symbols.len(),
            templates = state.templates.len(),
            nodes = nodes.len(),
            runs = run_count,
            top_level = tops.len(),
            "decoded BLT stream"
        );
        Ok(tops)
    }
}

/// Read one node reference and resolve it against the populated prefix
fn resolve_ref<'a, R: Read>(
    reader: &mut R,
    nodes: &'a [Node],
) -> Result<&'a Node, DecodeError> {
    let index = decode_varint32_from(reader)?;
    nodes
        .get(index as usize)
        .ok_or(DecodeError::ForwardReference {
            index,
            populated: nodes.len() as u32,
        })
}

/// Decode one run and append its nodes to the flat table
fn read_run<R: Read>(
    reader: &mut R,
    state: &ReaderState,
    nodes: &mut Vec<Node>,
) -> Result<(), DecodeError> {
    let count = decode_varint32_from(reader)? as usize;
    let tag = read_u8(reader)?;
    let kind = EncodingKind::from_u8(tag).ok_or(DecodeError::UnknownKind(tag))?;

    match kind {
        EncodingKind::Templated => {
            let template = state.templates.get(decode_varint32_from(reader)?)?;
            for _ in 0..count {
                let node = instantiate(reader, state, nodes, template)?;
                nodes.push(node);
            }
        }
        EncodingKind::VarTemplated => {
            for _ in 0..count {
                let template = state.templates.get(decode_varint32_from(reader)?)?;
                let node = instantiate(reader, state, nodes, template)?;
                nodes.push(node);
            }
        }
        EncodingKind::Id => {
            for _ in 0..count {
                let name = state.symbols.get(decode_varint32_from(reader)?)?;
                nodes.push(state.factory.id(name));
            }
        }
        _ => {
            for _ in 0..count {
                let value = read_literal_body(reader, state, kind)?;
                nodes.push(state.factory.literal(value));
            }
        }
    }
    Ok(())
}

/// Build one node from a template and its slot references
fn instantiate<R: Read>(
    reader: &mut R,
    state: &ReaderState,
    nodes: &[Node],
    template: NodeTemplate,
) -> Result<Node, DecodeError> {
    let mut slots: SmallVec<[Node; 8]> = SmallVec::new();
    for _ in 0..template.slot_count() {
        slots.push(resolve_ref(reader, nodes)?.clone());
    }

    Ok(match template {
        NodeTemplate::Call { .. } => {
            let mut it = slots.into_iter();
            match it.next() {
                Some(target) => state.factory.call(target, it.collect()),
                // arity + 1 slots, so a target is always present
                None => unreachable!("call template with zero slots"),
            }
        }
        NodeTemplate::CallId { target, .. } => {
            let name = state.symbols.get(target)?;
            state.factory.call(state.factory.id(name), slots.into_vec())
        }
        NodeTemplate::Attrs { .. } => {
            let mut it = slots.into_iter();
            match it.next() {
                Some(base) => state.factory.with_attrs(&base, it.collect()),
                None => unreachable!("attribute template with zero slots"),
            }
        }
    })
}

/// Read one literal body for the given run kind
fn read_literal_body<R: Read>(
    reader: &mut R,
    state: &ReaderState,
    kind: EncodingKind,
) -> Result<Value, DecodeError> {
    Ok(match kind {
        EncodingKind::Null => Value::Null,
        EncodingKind::Void => Value::Void,
        EncodingKind::Bool => Value::Bool(read_bool(reader)?),
        EncodingKind::Int8 => Value::Int8(read_i8(reader)?),
        EncodingKind::Int16 => Value::Int16(read_i16(reader)?),
        EncodingKind::Int32 => Value::Int32(read_i32(reader)?),
        EncodingKind::Int64 => Value::Int64(read_i64(reader)?),
        EncodingKind::UInt8 => Value::UInt8(read_u8(reader)?),
        EncodingKind::UInt16 => Value::UInt16(read_u16(reader)?),
        EncodingKind::UInt32 => Value::UInt32(read_u32(reader)?),
        EncodingKind::UInt64 => Value::UInt64(read_u64(reader)?),
        EncodingKind::Float32 => Value::Float32(FloatBits32(read_u32(reader)?)),
        EncodingKind::Float64 => Value::Float64(FloatBits64(read_u64(reader)?)),
        EncodingKind::Char => Value::Char(read_u16(reader)?),
        EncodingKind::String => Value::String(state.symbols.get(decode_varint32_from(reader)?)?),
        EncodingKind::Decimal => Value::Decimal(read_decimal(reader)?),
        EncodingKind::BigInt => Value::BigInt(read_bigint(reader)?),
        EncodingKind::Templated | EncodingKind::Id | EncodingKind::VarTemplated => {
            // Handled by the caller; not literal kinds.
            return Err(DecodeError::UnknownKind(kind.tag()));
        }
    })
}
