//! Error types for the BLT engine

use std::io;
use thiserror::Error;

/// Result type alias for BLT operations
pub type BltResult<T> = Result<T, BltError>;

/// Top-level error type
#[derive(Debug, Error)]
pub enum BltError {
    /// I/O error during read/write
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Encoding error
    #[error("encoding error: {0}")]
    Encode(#[from] EncodeError),

    /// Decoding error
    #[error("decoding error: {0}")]
    Decode(#[from] DecodeError),
}

/// Encoding-specific errors
#[derive(Debug, Error)]
pub enum EncodeError {
    /// I/O error during encoding
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No handler is registered for a literal's value kind
    #[error("no literal encoder for value of type {type_name}")]
    UnsupportedLiteral {
        /// Name of the offending runtime type
        type_name: &'static str,
    },

    /// Writer-state invariant violated
    #[error("invalid writer state: {0}")]
    InvalidState(String),
}

/// Decoding-specific errors
#[derive(Debug, Error)]
pub enum DecodeError {
    /// I/O error during decoding
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// First three bytes are not `BLT`
    #[error("bad magic number: expected \"BLT\", got {0:?}")]
    BadMagic([u8; 3]),

    /// File version exceeds what this library understands
    #[error("unsupported format version {major}.{minor}")]
    UnsupportedVersion {
        /// Major half of the file's version word
        major: u16,
        /// Minor half of the file's version word
        minor: u16,
    },

    /// Stream ended in the middle of a value
    #[error("unexpected end of stream")]
    UnexpectedEof,

    /// Varint with a continuation bit but no more data
    #[error("invalid varint encoding")]
    InvalidVarint,

    /// Varint exceeds 64 bits
    #[error("varint overflow: value exceeds 64 bits")]
    VarintOverflow,

    /// Symbol table entry is not valid UTF-8
    #[error("invalid UTF-8 in symbol table: {0}")]
    InvalidUtf8(String),

    /// Unknown encoding kind tag in a run header
    #[error("unknown encoding kind tag {0}")]
    UnknownKind(u8),

    /// Unknown template variant tag in the template table
    #[error("unknown template tag {0}")]
    UnknownTemplate(u8),

    /// Symbol reference beyond the symbol table
    #[error("invalid symbol reference: {index} >= {table_size}")]
    InvalidSymbolRef {
        /// The out-of-range index
        index: u32,
        /// Number of entries in the symbol table
        table_size: u32,
    },

    /// Template reference beyond the template table
    #[error("invalid template reference: {index} >= {table_size}")]
    InvalidTemplateRef {
        /// The out-of-range index
        index: u32,
        /// Number of entries in the template table
        table_size: u32,
    },

    /// Node reference to a position not yet populated
    #[error("forward node reference: {index} >= {populated}")]
    ForwardReference {
        /// The offending reference
        index: u32,
        /// Number of nodes decoded so far
        populated: u32,
    },
}
