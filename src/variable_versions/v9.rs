//! NetFlow v9 domain model (RFC 3954).
//!
//! Templates and data are both carried in flow sets under the same 20-byte
//! packet header. This module implements the per-type wire shapes; the
//! per-observation-domain template registry and the set-id dispatch live on
//! the reader (`crate::reader`).

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

use crate::byteorder;
use crate::error::{NetflowError, Result};
use crate::variable_versions::common::{CandidateType, FieldFamily, FieldValue};
use crate::variable_versions::v9_lookup::{FieldType, Scope};
use crate::wire::{CountingReader, WireDecode, WireEncode};

pub const HEADER_SIZE: usize = 20;
pub const TEMPLATE_SET_ID: u16 = 0;
pub const OPTIONS_TEMPLATE_SET_ID: u16 = 1;
pub const MIN_DATA_SET_ID: u16 = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub count: u16,
    pub system_uptime_ms: u32,
    pub unix_seconds: u32,
    pub sequence_number: u32,
    pub source_id: u32,
}

impl WireEncode for Header {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
        byteorder::write_u16(w, 9)?;
        byteorder::write_u16(w, self.count)?;
        byteorder::write_u32(w, self.system_uptime_ms)?;
        byteorder::write_u32(w, self.unix_seconds)?;
        byteorder::write_u32(w, self.sequence_number)?;
        byteorder::write_u32(w, self.source_id)
    }

    fn on_wire_size(&self) -> usize {
        HEADER_SIZE
    }
}

impl WireDecode for Header {
    fn decode<R: Read>(r: &mut R) -> Result<Self> {
        let version = byteorder::read_u16(r)?;
        if version != 9 {
            return Err(NetflowError::FormatError(format!("expected v9 header version 9, got {version}")));
        }
        Ok(Header {
            count: byteorder::read_u16(r)?,
            system_uptime_ms: byteorder::read_u32(r)?,
            unix_seconds: byteorder::read_u32(r)?,
            sequence_number: byteorder::read_u32(r)?,
            source_id: byteorder::read_u32(r)?,
        })
    }
}

/// `{type: u16, length: u16}` (§3, `Field (v9)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    pub type_id: u16,
    pub length: u16,
}

impl WireEncode for Field {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
        byteorder::write_u16(w, self.type_id)?;
        byteorder::write_u16(w, self.length)
    }

    fn on_wire_size(&self) -> usize {
        4
    }
}

impl WireDecode for Field {
    fn decode<R: Read>(r: &mut R) -> Result<Self> {
        Ok(Field { type_id: byteorder::read_u16(r)?, length: byteorder::read_u16(r)? })
    }
}

/// `{scope: u16 enum, length: u16}` (§3, `Scope (v9)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeField {
    pub scope: Scope,
    pub length: u16,
}

impl WireEncode for ScopeField {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
        byteorder::write_u16(w, self.scope.to_u16())?;
        byteorder::write_u16(w, self.length)
    }

    fn on_wire_size(&self) -> usize {
        4
    }
}

impl WireDecode for ScopeField {
    fn decode<R: Read>(r: &mut R) -> Result<Self> {
        let scope = Scope::from(byteorder::read_u16(r)?);
        let length = byteorder::read_u16(r)?;
        Ok(ScopeField { scope, length })
    }
}

/// `{id: u16 (>= 256), fields: ordered sequence of Field}` (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateRecord {
    pub id: u16,
    pub fields: Vec<Field>,
}

impl TemplateRecord {
    pub fn new(id: u16, fields: Vec<Field>) -> Result<Self> {
        if id < MIN_DATA_SET_ID {
            return Err(NetflowError::ArgumentRange(format!(
                "template id must be >= {MIN_DATA_SET_ID}, got {id}"
            )));
        }
        Ok(TemplateRecord { id, fields })
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Total byte length of one data record under this template.
    pub fn record_length(&self) -> usize {
        self.fields.iter().map(|f| f.length as usize).sum()
    }
}

impl WireEncode for TemplateRecord {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
        byteorder::write_u16(w, self.id)?;
        byteorder::write_u16(w, self.fields.len() as u16)?;
        for field in &self.fields {
            field.encode(w)?;
        }
        Ok(())
    }

    fn on_wire_size(&self) -> usize {
        4 + 4 * self.fields.len()
    }
}

impl WireDecode for TemplateRecord {
    fn decode<R: Read>(r: &mut R) -> Result<Self> {
        let id = byteorder::read_u16(r)?;
        let field_count = byteorder::read_u16(r)?;
        let mut fields = Vec::with_capacity(field_count as usize);
        for _ in 0..field_count {
            fields.push(Field::decode(r)?);
        }
        TemplateRecord::new(id, fields)
    }
}

/// `{id, scopes_length_bytes, options_length_bytes, scopes[], options[]}`
/// (§3, `OptionsTemplateRecord (v9)`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionsTemplateRecord {
    pub id: u16,
    pub scopes: Vec<ScopeField>,
    pub options: Vec<Field>,
}

impl OptionsTemplateRecord {
    pub fn new(id: u16, scopes: Vec<ScopeField>, options: Vec<Field>) -> Result<Self> {
        if id < MIN_DATA_SET_ID {
            return Err(NetflowError::ArgumentRange(format!(
                "options template id must be >= {MIN_DATA_SET_ID}, got {id}"
            )));
        }
        Ok(OptionsTemplateRecord { id, scopes, options })
    }

    pub fn field_count(&self) -> usize {
        self.scopes.len() + self.options.len()
    }

    pub fn record_length(&self) -> usize {
        self.scopes.iter().map(|s| s.length as usize).sum::<usize>()
            + self.options.iter().map(|f| f.length as usize).sum::<usize>()
    }
}

impl WireEncode for OptionsTemplateRecord {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
        byteorder::write_u16(w, self.id)?;
        byteorder::write_u16(w, (self.scopes.len() * 4) as u16)?;
        byteorder::write_u16(w, (self.options.len() * 4) as u16)?;
        for scope in &self.scopes {
            scope.encode(w)?;
        }
        for option in &self.options {
            option.encode(w)?;
        }
        Ok(())
    }

    fn on_wire_size(&self) -> usize {
        6 + 4 * self.scopes.len() + 4 * self.options.len()
    }
}

impl WireDecode for OptionsTemplateRecord {
    fn decode<R: Read>(r: &mut R) -> Result<Self> {
        let id = byteorder::read_u16(r)?;
        let scopes_length_bytes = byteorder::read_u16(r)?;
        let options_length_bytes = byteorder::read_u16(r)?;
        if scopes_length_bytes % 4 != 0 || options_length_bytes % 4 != 0 {
            return Err(NetflowError::FormatError(format!(
                "options template {id}: scopes_length ({scopes_length_bytes}) and options_length ({options_length_bytes}) must be multiples of 4"
            )));
        }
        let mut scopes = Vec::with_capacity((scopes_length_bytes / 4) as usize);
        for _ in 0..(scopes_length_bytes / 4) {
            scopes.push(ScopeField::decode(r)?);
        }
        let mut options = Vec::with_capacity((options_length_bytes / 4) as usize);
        for _ in 0..(options_length_bytes / 4) {
            options.push(Field::decode(r)?);
        }
        OptionsTemplateRecord::new(id, scopes, options)
    }
}

/// Picks a decode candidate for a v9 field given its declared type and
/// observed length, falling back to raw bytes per §4.C.
fn candidate_for(type_id: u16, len: usize) -> CandidateType {
    let (family, _) = FieldType::from(type_id).family_and_length();
    family.candidate_for_length(len).unwrap_or(CandidateType::Bytes)
}

/// Decodes as many whole template records as fit in `body_len` bytes.
pub fn decode_template_set<R: Read>(r: &mut R, body_len: usize) -> Result<Vec<TemplateRecord>> {
    let mut cr = CountingReader::new(r);
    let mut records = Vec::new();
    while cr.count() < body_len {
        records.push(TemplateRecord::decode(&mut cr)?);
    }
    Ok(records)
}

/// Decodes as many whole options-template records as fit in `body_len`
/// bytes.
pub fn decode_options_template_set<R: Read>(
    r: &mut R,
    body_len: usize,
) -> Result<Vec<OptionsTemplateRecord>> {
    let mut cr = CountingReader::new(r);
    let mut records = Vec::new();
    while cr.count() < body_len {
        records.push(OptionsTemplateRecord::decode(&mut cr)?);
    }
    Ok(records)
}

/// Decodes `body_len` bytes of data-set body against `template`, producing
/// a flat list of field values (§4.F "Data-record decoding").
pub fn decode_data_records<R: Read>(
    r: &mut R,
    template: &TemplateRecord,
    body_len: usize,
) -> Result<Vec<FieldValue>> {
    let record_len = template.record_length();
    let mut cr = CountingReader::new(r);
    let mut values = Vec::new();
    while cr.count() + record_len <= body_len {
        for field in &template.fields {
            let candidate = candidate_for(field.type_id, field.length as usize);
            values.push(FieldValue::decode(&mut cr, candidate, field.length as usize)?);
        }
    }
    Ok(values)
}

/// Decodes `body_len` bytes of options-data-set body against `template`:
/// scope values first, then option values, per record — same flat-list
/// layout `decode_data_records` uses for ordinary data sets.
pub fn decode_options_data_records<R: Read>(
    r: &mut R,
    template: &OptionsTemplateRecord,
    body_len: usize,
) -> Result<Vec<FieldValue>> {
    let record_len = template.record_length();
    let mut cr = CountingReader::new(r);
    let mut values = Vec::new();
    while cr.count() + record_len <= body_len {
        for scope in &template.scopes {
            let candidate = FieldFamily::UnsignedInt
                .candidate_for_length(scope.length as usize)
                .unwrap_or(CandidateType::Bytes);
            values.push(FieldValue::decode(&mut cr, candidate, scope.length as usize)?);
        }
        for option in &template.options {
            let candidate = candidate_for(option.type_id, option.length as usize);
            values.push(FieldValue::decode(&mut cr, candidate, option.length as usize)?);
        }
    }
    Ok(values)
}

/// Encodes a flat value list back to the wire, in template field order.
pub fn encode_records<W: Write>(w: &mut W, values: &[FieldValue]) -> io::Result<()> {
    for value in values {
        value.encode(w)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::net::Ipv4Addr;

    fn sample_template() -> TemplateRecord {
        TemplateRecord::new(
            256,
            vec![
                Field { type_id: 8, length: 4 }, // IPV4_SRC_ADDR
                Field { type_id: 2, length: 4 }, // IN_PKTS
            ],
        )
        .unwrap()
    }

    #[test]
    fn template_record_on_wire_size_matches_quantified_invariant() {
        let t = sample_template();
        assert_eq!(t.on_wire_size(), 4 + 4 * t.field_count());
    }

    #[test]
    fn template_id_below_256_is_rejected() {
        assert!(TemplateRecord::new(255, vec![]).is_err());
        assert!(TemplateRecord::new(256, vec![]).is_ok());
    }

    #[test]
    fn template_round_trips() {
        let t = sample_template();
        let mut buf = Vec::new();
        t.encode(&mut buf).unwrap();
        let mut cur = Cursor::new(buf);
        assert_eq!(TemplateRecord::decode(&mut cur).unwrap(), t);
    }

    #[test]
    fn options_template_rejects_misaligned_lengths() {
        let mut buf = Vec::new();
        byteorder::write_u16(&mut buf, 256).unwrap();
        byteorder::write_u16(&mut buf, 3).unwrap(); // not a multiple of 4
        byteorder::write_u16(&mut buf, 0).unwrap();
        let mut cur = Cursor::new(buf);
        assert!(OptionsTemplateRecord::decode(&mut cur).is_err());
    }

    #[test]
    fn decodes_data_record_against_template() {
        let template = sample_template();
        let mut buf = Vec::new();
        byteorder::write_bytes(&mut buf, &Ipv4Addr::new(192, 0, 2, 1).octets()).unwrap();
        byteorder::write_u32(&mut buf, 42).unwrap();
        let mut cur = Cursor::new(buf);
        let values = decode_data_records(&mut cur, &template, 8).unwrap();
        assert_eq!(values, vec![FieldValue::Ipv4(Ipv4Addr::new(192, 0, 2, 1)), FieldValue::U32(42)]);
    }
}
