//! Component A: big-endian scalar conversion.
//!
//! Every wire integer is most-significant-byte-first (RFC 3954, RFC 7011,
//! and the Cisco v5 spec all agree on this). Floats are transmitted as their
//! IEEE-754 bit pattern, byte-swapped the same way. `u8`/`i8` pass through
//! unchanged since there is nothing to reorder.
//!
//! Built on `byteorder`'s `ReadBytesExt`/`WriteBytesExt`, generic over any
//! `std::io::Read` / `std::io::Write` so the same functions serve the wire
//! codec (Component B) whether the destination is a `Vec<u8>`, a `TcpStream`,
//! or a test fixture's `Cursor`.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

macro_rules! scalar_pair {
    ($read_name:ident, $write_name:ident, $ty:ty, $read_fn:ident, $write_fn:ident) => {
        pub fn $read_name<R: Read + ?Sized>(r: &mut R) -> io::Result<$ty> {
            r.$read_fn::<BigEndian>()
        }

        pub fn $write_name<W: Write + ?Sized>(w: &mut W, value: $ty) -> io::Result<()> {
            w.$write_fn::<BigEndian>(value)
        }
    };
}

pub fn read_u8<R: Read + ?Sized>(r: &mut R) -> io::Result<u8> {
    r.read_u8()
}

pub fn write_u8<W: Write + ?Sized>(w: &mut W, value: u8) -> io::Result<()> {
    w.write_u8(value)
}

pub fn read_i8<R: Read + ?Sized>(r: &mut R) -> io::Result<i8> {
    r.read_i8()
}

pub fn write_i8<W: Write + ?Sized>(w: &mut W, value: i8) -> io::Result<()> {
    w.write_i8(value)
}

scalar_pair!(read_u16, write_u16, u16, read_u16, write_u16);
scalar_pair!(read_i16, write_i16, i16, read_i16, write_i16);
scalar_pair!(read_u32, write_u32, u32, read_u32, write_u32);
scalar_pair!(read_i32, write_i32, i32, read_i32, write_i32);
scalar_pair!(read_u64, write_u64, u64, read_u64, write_u64);
scalar_pair!(read_i64, write_i64, i64, read_i64, write_i64);
scalar_pair!(read_f32, write_f32, f32, read_f32, write_f32);
scalar_pair!(read_f64, write_f64, f64, read_f64, write_f64);

/// Reads a 3-byte unsigned integer (used by a handful of v9/IPFIX elements),
/// left-padded into a `u32`.
pub fn read_u24<R: Read + ?Sized>(r: &mut R) -> io::Result<u32> {
    r.read_uint::<BigEndian>(3).map(|v| v as u32)
}

/// Writes the low 24 bits of `value` as a 3-byte big-endian integer.
pub fn write_u24<W: Write + ?Sized>(w: &mut W, value: u32) -> io::Result<()> {
    w.write_uint::<BigEndian>(value as u64, 3)
}

/// Reads exactly `len` raw bytes, verbatim (no byte-order conversion — used
/// for IP addresses and opaque byte fields).
pub fn read_bytes<R: Read + ?Sized>(r: &mut R, len: usize) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

pub fn write_bytes<W: Write + ?Sized>(w: &mut W, bytes: &[u8]) -> io::Result<()> {
    w.write_all(bytes)
}
