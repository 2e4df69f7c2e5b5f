//! Stream emission: magic, version, tables, runs, top-level references
//!
//! The writer drives the builder over the input forest, then serializes the
//! finished tables in one forward pass. Nothing is seekable: every table is
//! count-prefixed and every reference points at an earlier entry.

use std::io::Write;

use smallvec::SmallVec;
use tracing::debug;

use crate::error::{BltResult, EncodeError};
use crate::node::{Node, NodeKind, Value};

use super::builder::{Run, WriterState};
use super::classify::{classify, EncodingKind};
use super::primitives::{
    write_bigint, write_bool, write_decimal, write_i16, write_i32, write_i64, write_i8,
    write_u16, write_u32, write_u64, write_u8,
};
use super::symtab::SymbolTableBuilder;
use super::varint::encode_varint_to;
use super::{MAGIC, VERSION};

/// Encoder knobs
#[derive(Debug, Clone, Copy, Default)]
pub struct WriterOptions {
    /// Emit templated runs with per-node template references instead of
    /// splitting runs on template change. Produces fewer runs when shapes
    /// alternate rapidly, at one varint per node.
    pub variable_templates: bool,
}

/// Binary stream encoder
#[derive(Debug, Default)]
pub struct BltWriter {
    options: WriterOptions,
}

impl BltWriter {
    /// Create an encoder with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an encoder with the given options
    pub fn with_options(options: WriterOptions) -> Self {
        Self { options }
    }

    /// Serialize a forest of top-level nodes to the writer
    pub fn write<W: Write>(&self, writer: &mut W, nodes: &[Node]) -> BltResult<()> {
        let mut state = WriterState::new(self.options.variable_templates);
        state.cluster_leaves(nodes)?;

        let mut tops = Vec::with_capacity(nodes.len());
        for node in nodes {
            tops.push(state.get_index(node)?);
        }

        self.emit(writer, &mut state, &tops)?;
        Ok(())
    }

    fn emit<W: Write>(
        &self,
        writer: &mut W,
        state: &mut WriterState,
        tops: &[u32],
    ) -> Result<(), EncodeError> {
        writer.write_all(&MAGIC).map_err(EncodeError::Io)?;
        writer
            .write_all(&VERSION.to_le_bytes())
            .map_err(EncodeError::Io)?;

        state.symbols.encode(writer)?;
        state.templates.encode(writer)?;

        let runs = state.take_runs();
        encode_varint_to(runs.len() as u64, writer)?;
        for run in &runs {
            self.emit_run(writer, state, run)?;
        }

        encode_varint_to(tops.len() as u64, writer)?;
        for &top in tops {
            encode_varint_to(u64::from(top), writer)?;
        }

        debug!(
            symbols = state.symbols.len(),
            templates = state.templates.len(),
            nodes = state.node_count(),
            runs = runs.len(),
            top_level = tops.len(),
            "encoded BLT stream"
        );
        Ok(())
    }

    fn emit_run<W: Write>(
        &self,
        writer: &mut W,
        state: &mut WriterState,
        run: &Run,
    ) -> Result<(), EncodeError> {
        encode_varint_to(run.nodes.len() as u64, writer)?;
        match run.kind {
            EncodingKind::Templated if self.options.variable_templates => {
                write_u8(writer, EncodingKind::VarTemplated.tag())?;
                for node in &run.nodes {
                    // The template is read back off the node, not the run
                    // header, because the run may mix shapes.
                    let (_, template) = classify(&mut state.symbols, node);
                    let template = template.ok_or_else(|| {
                        EncodeError::InvalidState("templated run holds a leaf node".into())
                    })?;
                    let template_idx = state.templates.get_index(template);
                    encode_varint_to(u64::from(template_idx), writer)?;
                    self.emit_slot_refs(writer, state, node)?;
                }
            }
            EncodingKind::Templated => {
                write_u8(writer, run.kind.tag())?;
                let template_idx = run.template.ok_or_else(|| {
                    EncodeError::InvalidState("templated run without a template".into())
                })?;
                encode_varint_to(u64::from(template_idx), writer)?;
                for node in &run.nodes {
                    self.emit_slot_refs(writer, state, node)?;
                }
            }
            EncodingKind::Id => {
                write_u8(writer, run.kind.tag())?;
                for node in &run.nodes {
                    let name = node.name().ok_or_else(|| {
                        EncodeError::InvalidState("identifier run holds a non-identifier".into())
                    })?;
                    let sym = state.symbols.get_index(name);
                    encode_varint_to(u64::from(sym), writer)?;
                }
            }
            EncodingKind::VarTemplated => {
                // The builder only produces Templated runs; the variable
                // form is an emission choice handled above.
                return Err(EncodeError::InvalidState(
                    "builder produced a variably-templated run".into(),
                ));
            }
            _ => {
                write_u8(writer, run.kind.tag())?;
                for node in &run.nodes {
                    let value = node.value().ok_or_else(|| {
                        EncodeError::InvalidState("literal run holds a non-literal".into())
                    })?;
                    write_literal_body(writer, &mut state.symbols, value)?;
                }
            }
        }
        Ok(())
    }

    /// One backward reference per template slot: the stripped node then the
    /// attributes for decorated nodes; the target (unless folded into the
    /// template as a symbol) then the arguments for calls.
    fn emit_slot_refs<W: Write>(
        &self,
        writer: &mut W,
        state: &mut WriterState,
        node: &Node,
    ) -> Result<(), EncodeError> {
        let mut refs: SmallVec<[u32; 8]> = SmallVec::new();
        if node.has_attrs() {
            refs.push(self.resolve(state, &node.without_attrs())?);
            for attr in node.attrs() {
                refs.push(self.resolve(state, attr)?);
            }
        } else if let NodeKind::Call { target, args } = node.kind() {
            if !target.is_bare_id() {
                refs.push(self.resolve(state, target)?);
            }
            for arg in args {
                refs.push(self.resolve(state, arg)?);
            }
        } else {
            return Err(EncodeError::InvalidState(
                "templated node is neither decorated nor a call".into(),
            ));
        }
        for r in refs {
            encode_varint_to(u64::from(r), writer)?;
        }
        Ok(())
    }

    fn resolve(&self, state: &mut WriterState, node: &Node) -> Result<u32, EncodeError> {
        state.lookup(node).ok_or_else(|| {
            EncodeError::InvalidState("slot reference to an unregistered node".into())
        })
    }
}

/// Write a literal's body; the run's kind tag already identifies the type
fn write_literal_body<W: Write>(
    writer: &mut W,
    symbols: &mut SymbolTableBuilder,
    value: &Value,
) -> Result<(), EncodeError> {
    match value {
        Value::Null | Value::Void => Ok(()),
        Value::Bool(v) => write_bool(writer, *v),
        Value::Int8(v) => write_i8(writer, *v),
        Value::Int16(v) => write_i16(writer, *v),
        Value::Int32(v) => write_i32(writer, *v),
        Value::Int64(v) => write_i64(writer, *v),
        Value::UInt8(v) => write_u8(writer, *v),
        Value::UInt16(v) => write_u16(writer, *v),
        Value::UInt32(v) => write_u32(writer, *v),
        Value::UInt64(v) => write_u64(writer, *v),
        Value::Float32(bits) => write_u32(writer, bits.0),
        Value::Float64(bits) => write_u64(writer, bits.0),
        Value::Char(unit) => write_u16(writer, *unit),
        Value::String(s) => encode_varint_to(u64::from(symbols.get_index(*s)), writer),
        Value::Decimal(d) => write_decimal(writer, *d),
        Value::BigInt(v) => write_bigint(writer, v),
    }
}
