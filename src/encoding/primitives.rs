//! Fixed-width and length-prefixed primitive codecs
//!
//! Everything below the varint layer: little-endian integers and floats,
//! one-byte booleans, two-byte UTF-16 code units, length-prefixed UTF-8
//! strings and big integers, and the four-lane decimal layout.

use std::io::{Read, Write};

use num_bigint::BigInt;

use crate::error::{DecodeError, EncodeError};
use crate::node::DecimalBits;

use super::varint::{decode_varint32_from, encode_varint_to};

/// Read exactly `buf.len()` bytes, mapping a premature end of stream to
/// [`DecodeError::UnexpectedEof`].
fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<(), DecodeError> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            DecodeError::UnexpectedEof
        } else {
            DecodeError::Io(e)
        }
    })
}

/// Write a single byte
pub fn write_u8<W: Write>(writer: &mut W, v: u8) -> Result<(), EncodeError> {
    writer.write_all(&[v])?;
    Ok(())
}

/// Read a single byte
pub fn read_u8<R: Read>(reader: &mut R) -> Result<u8, DecodeError> {
    let mut buf = [0u8; 1];
    read_exact(reader, &mut buf)?;
    Ok(buf[0])
}

/// Write a bool as one byte (0/1)
pub fn write_bool<W: Write>(writer: &mut W, v: bool) -> Result<(), EncodeError> {
    write_u8(writer, v as u8)
}

/// Read a bool; any nonzero byte is `true`
pub fn read_bool<R: Read>(reader: &mut R) -> Result<bool, DecodeError> {
    Ok(read_u8(reader)? != 0)
}

macro_rules! le_codec {
    ($write:ident, $read:ident, $ty:ty, $len:expr) => {
        #[doc = concat!("Write a `", stringify!($ty), "` little-endian")]
        pub fn $write<W: Write>(writer: &mut W, v: $ty) -> Result<(), EncodeError> {
            writer.write_all(&v.to_le_bytes())?;
            Ok(())
        }

        #[doc = concat!("Read a `", stringify!($ty), "` little-endian")]
        pub fn $read<R: Read>(reader: &mut R) -> Result<$ty, DecodeError> {
            let mut buf = [0u8; $len];
            read_exact(reader, &mut buf)?;
            Ok(<$ty>::from_le_bytes(buf))
        }
    };
}

le_codec!(write_i8, read_i8, i8, 1);
le_codec!(write_i16, read_i16, i16, 2);
le_codec!(write_i32, read_i32, i32, 4);
le_codec!(write_i64, read_i64, i64, 8);
le_codec!(write_u16, read_u16, u16, 2);
le_codec!(write_u32, read_u32, u32, 4);
le_codec!(write_u64, read_u64, u64, 8);

/// Write a length-prefixed UTF-8 string
pub fn write_str<W: Write>(writer: &mut W, s: &str) -> Result<(), EncodeError> {
    let bytes = s.as_bytes();
    encode_varint_to(bytes.len() as u64, writer)?;
    writer.write_all(bytes)?;
    Ok(())
}

/// Read a length-prefixed UTF-8 string
pub fn read_string<R: Read>(reader: &mut R) -> Result<String, DecodeError> {
    let len = decode_varint32_from(reader)? as usize;
    let mut bytes = vec![0u8; len];
    read_exact(reader, &mut bytes)?;
    String::from_utf8(bytes).map_err(|e| DecodeError::InvalidUtf8(e.to_string()))
}

/// Write a big integer as a length-prefixed signed little-endian
/// two's-complement byte sequence
pub fn write_bigint<W: Write>(writer: &mut W, v: &BigInt) -> Result<(), EncodeError> {
    let bytes = v.to_signed_bytes_le();
    encode_varint_to(bytes.len() as u64, writer)?;
    writer.write_all(&bytes)?;
    Ok(())
}

/// Read a length-prefixed signed big integer
pub fn read_bigint<R: Read>(reader: &mut R) -> Result<BigInt, DecodeError> {
    let len = decode_varint32_from(reader)? as usize;
    let mut bytes = vec![0u8; len];
    read_exact(reader, &mut bytes)?;
    Ok(BigInt::from_signed_bytes_le(&bytes))
}

/// Write a decimal as four little-endian 32-bit lanes: low, mid, high
/// mantissa words, then the flags word
pub fn write_decimal<W: Write>(writer: &mut W, d: DecimalBits) -> Result<(), EncodeError> {
    write_u32(writer, d.lo)?;
    write_u32(writer, d.mid)?;
    write_u32(writer, d.hi)?;
    write_u32(writer, d.flags)
}

/// Read a four-lane decimal
pub fn read_decimal<R: Read>(reader: &mut R) -> Result<DecimalBits, DecodeError> {
    Ok(DecimalBits {
        lo: read_u32(reader)?,
        mid: read_u32(reader)?,
        hi: read_u32(reader)?,
        flags: read_u32(reader)?,
    })
}
