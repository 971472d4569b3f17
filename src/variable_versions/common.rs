//! Shared pieces of the v9/IPFIX domain model: the value representation
//! decoded data-set fields are held in, and the family/candidate-type
//! machinery Component C's lookup tables drive decoding with.

use std::io::{self, Read, Write};
use std::net::{Ipv4Addr, Ipv6Addr};

use serde::{Deserialize, Serialize};

use crate::byteorder;
use crate::error::{NetflowError, Result};

/// The broad type family a v9 `FieldType` or IPFIX `InformationElement` is
/// declared as in the information-element tables (Component C). The
/// concrete width used on the wire is picked from the family based on the
/// field's *observed* declared length (from the template), not a single
/// fixed type — RFC 3954/7011 exporters are free to shrink counters to the
/// smallest width that fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldFamily {
    UnsignedInt,
    SignedInt,
    Float,
    Ipv4,
    Ipv6,
    Bytes,
    Utf8,
}

/// One concrete decode candidate, picked from a [`FieldFamily`] once the
/// field's on-wire length is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateType {
    U8,
    I8,
    U16,
    I16,
    U24,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
    Ipv4,
    Ipv6,
    Bytes,
    Utf8,
}

impl FieldFamily {
    /// Picks the concrete candidate for an observed field length, or `None`
    /// if no width in this family matches — the caller then falls back to
    /// raw bytes, per §4.C.
    pub fn candidate_for_length(self, len: usize) -> Option<CandidateType> {
        use CandidateType::*;
        match (self, len) {
            (FieldFamily::UnsignedInt, 1) => Some(U8),
            (FieldFamily::UnsignedInt, 2) => Some(U16),
            (FieldFamily::UnsignedInt, 3) => Some(U24),
            (FieldFamily::UnsignedInt, 4) => Some(U32),
            (FieldFamily::UnsignedInt, 8) => Some(U64),
            (FieldFamily::SignedInt, 1) => Some(I8),
            (FieldFamily::SignedInt, 2) => Some(I16),
            (FieldFamily::SignedInt, 4) => Some(I32),
            (FieldFamily::SignedInt, 8) => Some(I64),
            (FieldFamily::Float, 4) => Some(F32),
            (FieldFamily::Float, 8) => Some(F64),
            (FieldFamily::Ipv4, 4) => Some(Ipv4),
            (FieldFamily::Ipv6, 16) => Some(Ipv6),
            (FieldFamily::Bytes, _) => Some(Bytes),
            (FieldFamily::Utf8, _) => Some(Utf8),
            _ => None,
        }
    }
}

/// A decoded data-set field value. Tagged sum type over scalar widths, IP
/// addresses, and byte/string sequences — the design note on "mixed value
/// types in a DataSet" calls for exactly this rather than one struct field
/// per possible Cisco/IANA element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U24(u32),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    F32(f32),
    F64(f64),
    Ipv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
    Bytes(Vec<u8>),
    Utf8(String),
}

impl FieldValue {
    /// Decodes a value of `candidate`'s type, consuming exactly `len` bytes
    /// for the byte/string fallback cases.
    pub fn decode<R: Read>(r: &mut R, candidate: CandidateType, len: usize) -> Result<Self> {
        Ok(match candidate {
            CandidateType::U8 => FieldValue::U8(byteorder::read_u8(r)?),
            CandidateType::I8 => FieldValue::I8(byteorder::read_i8(r)?),
            CandidateType::U16 => FieldValue::U16(byteorder::read_u16(r)?),
            CandidateType::I16 => FieldValue::I16(byteorder::read_i16(r)?),
            CandidateType::U24 => FieldValue::U24(byteorder::read_u24(r)?),
            CandidateType::U32 => FieldValue::U32(byteorder::read_u32(r)?),
            CandidateType::I32 => FieldValue::I32(byteorder::read_i32(r)?),
            CandidateType::U64 => FieldValue::U64(byteorder::read_u64(r)?),
            CandidateType::I64 => FieldValue::I64(byteorder::read_i64(r)?),
            CandidateType::F32 => FieldValue::F32(byteorder::read_f32(r)?),
            CandidateType::F64 => FieldValue::F64(byteorder::read_f64(r)?),
            CandidateType::Ipv4 => {
                let b = byteorder::read_bytes(r, 4)?;
                FieldValue::Ipv4(Ipv4Addr::new(b[0], b[1], b[2], b[3]))
            }
            CandidateType::Ipv6 => {
                let b = byteorder::read_bytes(r, 16)?;
                let mut octets = [0u8; 16];
                octets.copy_from_slice(&b);
                FieldValue::Ipv6(Ipv6Addr::from(octets))
            }
            CandidateType::Bytes => FieldValue::Bytes(byteorder::read_bytes(r, len)?),
            CandidateType::Utf8 => {
                let b = byteorder::read_bytes(r, len)?;
                FieldValue::Utf8(String::from_utf8_lossy(&b).into_owned())
            }
        })
    }

    pub fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
        match self {
            FieldValue::U8(v) => byteorder::write_u8(w, *v),
            FieldValue::I8(v) => byteorder::write_i8(w, *v),
            FieldValue::U16(v) => byteorder::write_u16(w, *v),
            FieldValue::I16(v) => byteorder::write_i16(w, *v),
            FieldValue::U24(v) => byteorder::write_u24(w, *v),
            FieldValue::U32(v) => byteorder::write_u32(w, *v),
            FieldValue::I32(v) => byteorder::write_i32(w, *v),
            FieldValue::U64(v) => byteorder::write_u64(w, *v),
            FieldValue::I64(v) => byteorder::write_i64(w, *v),
            FieldValue::F32(v) => byteorder::write_f32(w, *v),
            FieldValue::F64(v) => byteorder::write_f64(w, *v),
            FieldValue::Ipv4(v) => byteorder::write_bytes(w, &v.octets()),
            FieldValue::Ipv6(v) => byteorder::write_bytes(w, &v.octets()),
            FieldValue::Bytes(v) => byteorder::write_bytes(w, v),
            FieldValue::Utf8(v) => byteorder::write_bytes(w, v.as_bytes()),
        }
    }

    /// Exact number of bytes `encode` would write.
    pub fn on_wire_size(&self) -> usize {
        match self {
            FieldValue::U8(_) | FieldValue::I8(_) => 1,
            FieldValue::U16(_) | FieldValue::I16(_) => 2,
            FieldValue::U24(_) => 3,
            FieldValue::U32(_) | FieldValue::I32(_) | FieldValue::F32(_) | FieldValue::Ipv4(_) => 4,
            FieldValue::U64(_) | FieldValue::I64(_) | FieldValue::F64(_) => 8,
            FieldValue::Ipv6(_) => 16,
            FieldValue::Bytes(b) => b.len(),
            FieldValue::Utf8(s) => s.as_bytes().len(),
        }
    }

    /// Checks that this value would serialize to exactly `expected_len`
    /// bytes, as the view layer's `set` operation requires (§4.G).
    pub fn check_length(&self, expected_len: usize) -> Result<()> {
        if self.on_wire_size() == expected_len {
            Ok(())
        } else {
            Err(NetflowError::ArgumentMismatch(format!(
                "value serializes to {} bytes, template field declares {expected_len}",
                self.on_wire_size()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn family_picks_width_by_observed_length() {
        assert_eq!(
            FieldFamily::UnsignedInt.candidate_for_length(8),
            Some(CandidateType::U64)
        );
        assert_eq!(FieldFamily::UnsignedInt.candidate_for_length(5), None);
    }

    #[test]
    fn ipv4_round_trips() {
        let v = FieldValue::Ipv4(Ipv4Addr::new(192, 0, 2, 1));
        let mut buf = Vec::new();
        v.encode(&mut buf).unwrap();
        assert_eq!(buf, vec![192, 0, 2, 1]);
        let mut cur = Cursor::new(buf);
        let decoded = FieldValue::decode(&mut cur, CandidateType::Ipv4, 4).unwrap();
        assert_eq!(decoded, v);
    }

    #[test]
    fn unmatched_length_falls_back_to_bytes() {
        assert_eq!(FieldFamily::Float.candidate_for_length(3), None);
    }

    #[test]
    fn check_length_rejects_mismatch() {
        let v = FieldValue::U32(42);
        assert!(v.check_length(4).is_ok());
        assert!(v.check_length(2).is_err());
    }
}
