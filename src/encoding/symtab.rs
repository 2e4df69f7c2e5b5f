//! Symbol table: dense index space over interned names
//!
//! The builder assigns each distinct symbol the next free index, in
//! first-sighting order; the decoded table is a flat array resolved by
//! index. Both identifier names and string literal payloads live here.
//!
//! # Encoding Format
//! ```text
//! [count: varint]
//! [symbol1_len: varint][symbol1_bytes: utf8]
//! [symbol2_len: varint][symbol2_bytes: utf8]
//! ...
//! ```

use std::io::{Read, Write};

use rustc_hash::FxHashMap;

use crate::error::{DecodeError, EncodeError};
use crate::node::Symbol;

use super::primitives::{read_string, write_str};
use super::varint::{decode_varint32_from, encode_varint_to};

/// Writer-side symbol table with get-or-append interning
#[derive(Debug, Default)]
pub struct SymbolTableBuilder {
    symbols: Vec<Symbol>,
    lookup: FxHashMap<Symbol, u32>,
}

impl SymbolTableBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the symbol's index, appending it if unseen
    pub fn get_index(&mut self, sym: Symbol) -> u32 {
        if let Some(&idx) = self.lookup.get(&sym) {
            return idx;
        }
        let idx = self.symbols.len() as u32;
        self.symbols.push(sym);
        self.lookup.insert(sym, idx);
        idx
    }

    /// Number of interned symbols
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Write the table: count, then each symbol length-prefixed
    pub fn encode<W: Write>(&self, writer: &mut W) -> Result<(), EncodeError> {
        encode_varint_to(self.symbols.len() as u64, writer)?;
        for sym in &self.symbols {
            write_str(writer, sym.as_str())?;
        }
        Ok(())
    }
}

/// Decoded symbol table, immutable after the header parse
#[derive(Debug)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    /// Read the table from the stream
    pub fn decode<R: Read>(reader: &mut R) -> Result<Self, DecodeError> {
        let count = decode_varint32_from(reader)? as usize;
        let mut symbols = Vec::with_capacity(count);
        for _ in 0..count {
            symbols.push(Symbol::new(&read_string(reader)?));
        }
        Ok(Self { symbols })
    }

    /// Resolve an index to its symbol
    pub fn get(&self, index: u32) -> Result<Symbol, DecodeError> {
        self.symbols
            .get(index as usize)
            .copied()
            .ok_or(DecodeError::InvalidSymbolRef {
                index,
                table_size: self.symbols.len() as u32,
            })
    }

    /// Number of symbols in the table
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
