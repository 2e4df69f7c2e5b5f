//! Node templates: reusable skeletons for non-leaf nodes
//!
//! A template captures the shape of a call or attribute wrapper so that
//! every node sharing the shape serializes as bare slot references. The
//! registry collapses structurally equal templates into one table index,
//! the same get-or-append discipline as the symbol table.

use std::io::{Read, Write};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, EncodeError};

use super::primitives::{read_u8, write_u8};
use super::varint::{decode_varint32_from, encode_varint_to};

/// Shape of a non-leaf node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeTemplate {
    /// A call with an arbitrary target node. Slot 0 is the target, the
    /// remaining `arity` slots are the arguments.
    Call {
        /// Number of arguments
        arity: u32,
    },
    /// A call whose target is a fixed symbol. All `arity` slots are
    /// arguments.
    CallId {
        /// Symbol-table index of the target name
        target: u32,
        /// Number of arguments
        arity: u32,
    },
    /// An attribute wrapper. Slot 0 is the attribute-stripped node, the
    /// remaining `attr_count` slots are the attributes.
    Attrs {
        /// Number of attributes
        attr_count: u32,
    },
}

impl NodeTemplate {
    /// One-byte variant tag in the template table
    pub const fn tag(self) -> u8 {
        match self {
            Self::Call { .. } => 0,
            Self::CallId { .. } => 1,
            Self::Attrs { .. } => 2,
        }
    }

    /// Number of node references each instance consumes. Widened so that
    /// a hostile arity of `u32::MAX` cannot overflow.
    pub const fn slot_count(self) -> u64 {
        match self {
            Self::Call { arity } => arity as u64 + 1,
            Self::CallId { arity, .. } => arity as u64,
            Self::Attrs { attr_count } => attr_count as u64 + 1,
        }
    }

    /// Write the tag byte and variant body
    pub fn encode<W: Write>(self, writer: &mut W) -> Result<(), EncodeError> {
        write_u8(writer, self.tag())?;
        match self {
            Self::Call { arity } => encode_varint_to(u64::from(arity), writer),
            Self::CallId { target, arity } => {
                encode_varint_to(u64::from(target), writer)?;
                encode_varint_to(u64::from(arity), writer)
            }
            Self::Attrs { attr_count } => encode_varint_to(u64::from(attr_count), writer),
        }
    }

    /// Read one template entry
    pub fn decode<R: Read>(reader: &mut R) -> Result<Self, DecodeError> {
        let tag = read_u8(reader)?;
        match tag {
            0 => Ok(Self::Call {
                arity: decode_varint32_from(reader)?,
            }),
            1 => Ok(Self::CallId {
                target: decode_varint32_from(reader)?,
                arity: decode_varint32_from(reader)?,
            }),
            2 => Ok(Self::Attrs {
                attr_count: decode_varint32_from(reader)?,
            }),
            _ => Err(DecodeError::UnknownTemplate(tag)),
        }
    }
}

/// Writer-side template registry
#[derive(Debug, Default)]
pub struct TemplateTableBuilder {
    templates: Vec<NodeTemplate>,
    lookup: FxHashMap<NodeTemplate, u32>,
}

impl TemplateTableBuilder {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the template's index, appending it if unseen
    pub fn get_index(&mut self, template: NodeTemplate) -> u32 {
        if let Some(&idx) = self.lookup.get(&template) {
            return idx;
        }
        let idx = self.templates.len() as u32;
        self.templates.push(template);
        self.lookup.insert(template, idx);
        idx
    }

    /// Number of distinct templates
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Write the table: count, then each entry
    pub fn encode<W: Write>(&self, writer: &mut W) -> Result<(), EncodeError> {
        encode_varint_to(self.templates.len() as u64, writer)?;
        for template in &self.templates {
            template.encode(writer)?;
        }
        Ok(())
    }
}

/// Decoded template table
#[derive(Debug)]
pub struct TemplateTable {
    templates: Vec<NodeTemplate>,
}

impl TemplateTable {
    /// Read the table from the stream
    pub fn decode<R: Read>(reader: &mut R) -> Result<Self, DecodeError> {
        let count = decode_varint32_from(reader)? as usize;
        let mut templates = Vec::with_capacity(count);
        for _ in 0..count {
            templates.push(NodeTemplate::decode(reader)?);
        }
        Ok(Self { templates })
    }

    /// Resolve an index to its template
    pub fn get(&self, index: u32) -> Result<NodeTemplate, DecodeError> {
        self.templates
            .get(index as usize)
            .copied()
            .ok_or(DecodeError::InvalidTemplateRef {
                index,
                table_size: self.templates.len() as u32,
            })
    }

    /// Number of templates in the table
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
