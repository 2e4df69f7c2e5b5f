//! Public API for the BLT engine
//!
//! High-level encode/decode over streams and paths. The stream functions
//! take any `Write`/`Read`; the path functions wrap files in buffered
//! streams and release them on every exit path.

use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::encoding::{BltReader, BltWriter, WriterOptions};
use crate::error::BltResult;
use crate::node::Node;

/// Serialize a forest of top-level nodes to a stream
pub fn write_nodes<W: Write>(writer: &mut W, nodes: &[Node]) -> BltResult<()> {
    BltWriter::new().write(writer, nodes)
}

/// Serialize with explicit encoder options
pub fn write_nodes_with<W: Write>(
    writer: &mut W,
    nodes: &[Node],
    options: WriterOptions,
) -> BltResult<()> {
    BltWriter::with_options(options).write(writer, nodes)
}

/// Deserialize a forest of top-level nodes from a stream. `source` is an
/// opaque label the produced nodes are tagged with.
pub fn read_nodes<R: Read>(reader: &mut R, source: &str) -> BltResult<Vec<Node>> {
    BltReader::new().read(reader, source)
}

/// Serialize a forest to a file
pub fn write_file(path: impl AsRef<Path>, nodes: &[Node]) -> BltResult<()> {
    let file = std::fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_nodes(&mut writer, nodes)?;
    writer.flush()?;
    Ok(())
}

/// Deserialize a forest from a file, tagging nodes with the path
pub fn read_file(path: impl AsRef<Path>) -> BltResult<Vec<Node>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    read_nodes(&mut reader, &path.display().to_string())
}
