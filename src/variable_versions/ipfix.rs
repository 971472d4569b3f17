//! IPFIX (NetFlow v10) domain model (RFC 7011).
//!
//! Shaped the same way as `variable_versions::v9`: templates and data share
//! one 16-byte packet header, and the per-observation-domain template
//! registry and set-id dispatch live on the reader (`crate::reader`). The
//! one real structural difference from v9 is the field specifier's
//! enterprise bit (RFC 7011 §3.2).

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

use crate::byteorder;
use crate::error::{NetflowError, Result};
use crate::variable_versions::common::{CandidateType, FieldFamily, FieldValue};
use crate::variable_versions::enterprise_registry::EnterpriseFieldRegistry;
use crate::variable_versions::ipfix_lookup::InformationElement;
use crate::wire::{CountingReader, WireDecode, WireEncode};

pub const HEADER_SIZE: usize = 16;
pub const VERSION: u16 = 0x000a;
pub const TEMPLATE_SET_ID: u16 = 2;
pub const OPTIONS_TEMPLATE_SET_ID: u16 = 3;
pub const MIN_DATA_SET_ID: u16 = 256;

/// High bit of a field specifier's `information_element` that marks it as
/// enterprise-specific (RFC 7011 §3.2).
const ENTERPRISE_BIT: u16 = 0x8000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub length: u16,
    pub export_time: u32,
    pub sequence_number: u32,
    pub observation_domain_id: u32,
}

impl WireEncode for Header {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
        byteorder::write_u16(w, VERSION)?;
        byteorder::write_u16(w, self.length)?;
        byteorder::write_u32(w, self.export_time)?;
        byteorder::write_u32(w, self.sequence_number)?;
        byteorder::write_u32(w, self.observation_domain_id)
    }

    fn on_wire_size(&self) -> usize {
        HEADER_SIZE
    }
}

impl WireDecode for Header {
    fn decode<R: Read>(r: &mut R) -> Result<Self> {
        let version = byteorder::read_u16(r)?;
        if version != VERSION {
            return Err(NetflowError::FormatError(format!(
                "expected IPFIX header version {VERSION:#06x}, got {version:#06x}"
            )));
        }
        Ok(Header {
            length: byteorder::read_u16(r)?,
            export_time: byteorder::read_u32(r)?,
            sequence_number: byteorder::read_u32(r)?,
            observation_domain_id: byteorder::read_u32(r)?,
        })
    }
}

/// `{information_element: u16 (high bit = enterprise flag), length: u16,
/// enterprise_number: Option<u32>}` (§3, `FieldSpecifier (IPFIX)`). Encodes
/// to 4 bytes for a standard element, 8 bytes for an enterprise one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldSpecifier {
    pub information_element: u16,
    pub length: u16,
    pub enterprise_number: Option<u32>,
}

impl FieldSpecifier {
    pub fn standard(information_element: u16, length: u16) -> Self {
        FieldSpecifier { information_element, length, enterprise_number: None }
    }

    pub fn enterprise(information_element: u16, length: u16, enterprise_number: u32) -> Self {
        FieldSpecifier { information_element, length, enterprise_number: Some(enterprise_number) }
    }

    pub fn is_enterprise(&self) -> bool {
        self.enterprise_number.is_some()
    }
}

impl WireEncode for FieldSpecifier {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let mut ie = self.information_element;
        if self.enterprise_number.is_some() {
            ie |= ENTERPRISE_BIT;
        }
        byteorder::write_u16(w, ie)?;
        byteorder::write_u16(w, self.length)?;
        if let Some(enterprise_number) = self.enterprise_number {
            byteorder::write_u32(w, enterprise_number)?;
        }
        Ok(())
    }

    fn on_wire_size(&self) -> usize {
        if self.enterprise_number.is_some() { 8 } else { 4 }
    }
}

impl WireDecode for FieldSpecifier {
    fn decode<R: Read>(r: &mut R) -> Result<Self> {
        let raw_ie = byteorder::read_u16(r)?;
        let length = byteorder::read_u16(r)?;
        let enterprise_flag = raw_ie & ENTERPRISE_BIT != 0;
        let information_element = raw_ie & !ENTERPRISE_BIT;
        let enterprise_number = if enterprise_flag {
            Some(byteorder::read_u32(r)?)
        } else {
            None
        };
        Ok(FieldSpecifier { information_element, length, enterprise_number })
    }
}

/// `{id: u16 (>= 256), fields: ordered sequence of FieldSpecifier}` (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateRecord {
    pub id: u16,
    pub fields: Vec<FieldSpecifier>,
}

impl TemplateRecord {
    pub fn new(id: u16, fields: Vec<FieldSpecifier>) -> Result<Self> {
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
        4 + self.fields.iter().map(|f| f.on_wire_size()).sum::<usize>()
    }
}

impl WireDecode for TemplateRecord {
    fn decode<R: Read>(r: &mut R) -> Result<Self> {
        let id = byteorder::read_u16(r)?;
        let field_count = byteorder::read_u16(r)?;
        let mut fields = Vec::with_capacity(field_count as usize);
        for _ in 0..field_count {
            fields.push(FieldSpecifier::decode(r)?);
        }
        TemplateRecord::new(id, fields)
    }
}

/// `{id, field_count, scope_field_count, field_specifiers[]}` — the first
/// `scope_field_count` entries of `field_specifiers` are scopes, the rest
/// are options (§3, `OptionsTemplateRecord (IPFIX)`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionsTemplateRecord {
    pub id: u16,
    pub scope_field_count: u16,
    pub field_specifiers: Vec<FieldSpecifier>,
}

impl OptionsTemplateRecord {
    pub fn new(id: u16, scope_field_count: u16, field_specifiers: Vec<FieldSpecifier>) -> Result<Self> {
        if id < MIN_DATA_SET_ID {
            return Err(NetflowError::ArgumentRange(format!(
                "options template id must be >= {MIN_DATA_SET_ID}, got {id}"
            )));
        }
        if scope_field_count == 0 {
            return Err(NetflowError::ArgumentRange(format!(
                "options template {id}: scope_field_count must be >= 1, got 0"
            )));
        }
        if scope_field_count as usize > field_specifiers.len() {
            return Err(NetflowError::ArgumentRange(format!(
                "options template {id}: scope_field_count ({scope_field_count}) exceeds field count ({})",
                field_specifiers.len()
            )));
        }
        Ok(OptionsTemplateRecord { id, scope_field_count, field_specifiers })
    }

    pub fn scopes(&self) -> &[FieldSpecifier] {
        &self.field_specifiers[..self.scope_field_count as usize]
    }

    pub fn options(&self) -> &[FieldSpecifier] {
        &self.field_specifiers[self.scope_field_count as usize..]
    }

    pub fn field_count(&self) -> usize {
        self.field_specifiers.len()
    }

    pub fn record_length(&self) -> usize {
        self.field_specifiers.iter().map(|f| f.length as usize).sum()
    }
}

impl WireEncode for OptionsTemplateRecord {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
        byteorder::write_u16(w, self.id)?;
        byteorder::write_u16(w, self.field_specifiers.len() as u16)?;
        byteorder::write_u16(w, self.scope_field_count)?;
        for field in &self.field_specifiers {
            field.encode(w)?;
        }
        Ok(())
    }

    fn on_wire_size(&self) -> usize {
        6 + self.field_specifiers.iter().map(|f| f.on_wire_size()).sum::<usize>()
    }
}

impl WireDecode for OptionsTemplateRecord {
    fn decode<R: Read>(r: &mut R) -> Result<Self> {
        let id = byteorder::read_u16(r)?;
        let field_count = byteorder::read_u16(r)?;
        let scope_field_count = byteorder::read_u16(r)?;
        if scope_field_count == 0 {
            return Err(NetflowError::FormatError(format!(
                "options template {id}: scope_field_count must be >= 1, got 0"
            )));
        }
        if scope_field_count > field_count {
            return Err(NetflowError::FormatError(format!(
                "options template {id}: scope_field_count ({scope_field_count}) exceeds field_count ({field_count})"
            )));
        }
        let mut field_specifiers = Vec::with_capacity(field_count as usize);
        for _ in 0..field_count {
            field_specifiers.push(FieldSpecifier::decode(r)?);
        }
        OptionsTemplateRecord::new(id, scope_field_count, field_specifiers)
    }
}

/// Picks a decode candidate for an IPFIX field specifier, consulting
/// `registry` for enterprise elements and the IANA table otherwise, and
/// falling back to raw bytes per §4.C.
fn candidate_for(field: &FieldSpecifier, registry: &EnterpriseFieldRegistry) -> CandidateType {
    let family = match field.enterprise_number {
        Some(enterprise_number) => registry
            .get(enterprise_number, field.information_element)
            .map(|def| def.family)
            .unwrap_or(FieldFamily::Bytes),
        None => InformationElement::from(field.information_element).family_and_length().0,
    };
    family.candidate_for_length(field.length as usize).unwrap_or(CandidateType::Bytes)
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
/// a flat list of field values (§4.F).
pub fn decode_data_records<R: Read>(
    r: &mut R,
    template: &TemplateRecord,
    body_len: usize,
    registry: &EnterpriseFieldRegistry,
) -> Result<Vec<FieldValue>> {
    let record_len = template.record_length();
    let mut cr = CountingReader::new(r);
    let mut values = Vec::new();
    while cr.count() + record_len <= body_len {
        for field in &template.fields {
            let candidate = candidate_for(field, registry);
            values.push(FieldValue::decode(&mut cr, candidate, field.length as usize)?);
        }
    }
    Ok(values)
}

/// Decodes `body_len` bytes of options-data-set body against `template`:
/// scope values first, then option values, per record — mirrors the v9
/// options-data layout (§4.F, resolved the same way for IPFIX).
pub fn decode_options_data_records<R: Read>(
    r: &mut R,
    template: &OptionsTemplateRecord,
    body_len: usize,
    registry: &EnterpriseFieldRegistry,
) -> Result<Vec<FieldValue>> {
    let record_len = template.record_length();
    let mut cr = CountingReader::new(r);
    let mut values = Vec::new();
    while cr.count() + record_len <= body_len {
        for field in template.scopes() {
            let candidate = candidate_for(field, registry);
            values.push(FieldValue::decode(&mut cr, candidate, field.length as usize)?);
        }
        for field in template.options() {
            let candidate = candidate_for(field, registry);
            values.push(FieldValue::decode(&mut cr, candidate, field.length as usize)?);
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
                FieldSpecifier::standard(8, 4),  // SourceIPv4Address
                FieldSpecifier::standard(2, 4),  // PacketDeltaCount
            ],
        )
        .unwrap()
    }

    #[test]
    fn standard_field_specifier_is_4_bytes() {
        let f = FieldSpecifier::standard(8, 4);
        assert_eq!(f.on_wire_size(), 4);
        assert!(!f.is_enterprise());
    }

    #[test]
    fn enterprise_field_specifier_round_trips_as_8_bytes() {
        let f = FieldSpecifier::enterprise(12, 24, 42);
        assert_eq!(f.on_wire_size(), 8);
        let mut buf = Vec::new();
        f.encode(&mut buf).unwrap();
        assert_eq!(buf.len(), 8);
        assert_eq!(buf[0] & 0x80, 0x80);
        let mut cur = Cursor::new(buf);
        assert_eq!(FieldSpecifier::decode(&mut cur).unwrap(), f);
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
    fn options_template_splits_scopes_and_options() {
        let t = OptionsTemplateRecord::new(
            256,
            1,
            vec![FieldSpecifier::standard(149, 4), FieldSpecifier::standard(1, 4)],
        )
        .unwrap();
        assert_eq!(t.scopes().len(), 1);
        assert_eq!(t.options().len(), 1);
    }

    #[test]
    fn options_template_rejects_scope_count_over_field_count() {
        assert!(OptionsTemplateRecord::new(256, 3, vec![FieldSpecifier::standard(149, 4)]).is_err());
    }

    #[test]
    fn options_template_rejects_zero_scope_field_count() {
        assert!(OptionsTemplateRecord::new(
            256,
            0,
            vec![FieldSpecifier::standard(149, 4), FieldSpecifier::standard(1, 4)],
        )
        .is_err());
    }

    #[test]
    fn decodes_data_record_against_template() {
        let template = sample_template();
        let registry = EnterpriseFieldRegistry::new();
        let mut buf = Vec::new();
        byteorder::write_bytes(&mut buf, &Ipv4Addr::new(192, 0, 2, 1).octets()).unwrap();
        byteorder::write_u32(&mut buf, 42).unwrap();
        let mut cur = Cursor::new(buf);
        let values = decode_data_records(&mut cur, &template, 8, &registry).unwrap();
        assert_eq!(values, vec![FieldValue::Ipv4(Ipv4Addr::new(192, 0, 2, 1)), FieldValue::U32(42)]);
    }

    #[test]
    fn decodes_enterprise_field_using_registry_hint() {
        use crate::variable_versions::enterprise_registry::EnterpriseFieldDef;

        let template = TemplateRecord::new(256, vec![FieldSpecifier::enterprise(1, 4, 42)]).unwrap();
        let mut registry = EnterpriseFieldRegistry::new();
        registry.register(EnterpriseFieldDef::new(42, 1, "customCounter", FieldFamily::UnsignedInt));

        let mut buf = Vec::new();
        byteorder::write_u32(&mut buf, 7).unwrap();
        let mut cur = Cursor::new(buf);
        let values = decode_data_records(&mut cur, &template, 4, &registry).unwrap();
        assert_eq!(values, vec![FieldValue::U32(7)]);
    }
}
