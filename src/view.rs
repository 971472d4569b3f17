//! Component G: the view layer.
//!
//! Random access into a `(template, dataset)` pair, where the dataset is the
//! flat `Vec<FieldValue>` a `decode_data_records`/`decode_options_data_records`
//! call produces. Rust has no concept of a dynamically named property, so the
//! "dynamic record" of the spec becomes [`DynamicRecord`]: a borrowed
//! (field, value) pair list with lookup by position or by element id, plus an
//! iterator ([`View::records`]) over one per logical record.
//!
//! [`View`] owns its fields and values rather than borrowing them, so one
//! [`View`] works uniformly whether it's built over a `TemplateRecord`'s
//! field list or an options-template's combined scope+option list — the
//! small clone is cheaper than threading four lifetime parameters through
//! every accessor.

use crate::error::{NetflowError, Result};
use crate::variable_versions::common::FieldValue;
use crate::variable_versions::{ipfix, v9};

/// A template field description generic enough to drive a [`View`]: its
/// declared on-wire length (for `set`'s length check) and the numeric id
/// that identifies it within the template (a v9 field type, an IPFIX
/// information element, or a v9 scope).
pub trait ViewField: PartialEq + Copy {
    fn declared_length(&self) -> u16;
    fn element_id(&self) -> u16;
}

impl ViewField for v9::Field {
    fn declared_length(&self) -> u16 {
        self.length
    }

    fn element_id(&self) -> u16 {
        self.type_id
    }
}

impl ViewField for ipfix::FieldSpecifier {
    fn declared_length(&self) -> u16 {
        self.length
    }

    fn element_id(&self) -> u16 {
        self.information_element
    }
}

/// A v9 options-template field: either a scope or an ordinary option,
/// carrying its own element id accordingly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum V9OptionsField {
    Scope(v9::ScopeField),
    Option(v9::Field),
}

impl ViewField for V9OptionsField {
    fn declared_length(&self) -> u16 {
        match self {
            V9OptionsField::Scope(s) => s.length,
            V9OptionsField::Option(f) => f.length,
        }
    }

    fn element_id(&self) -> u16 {
        match self {
            V9OptionsField::Scope(s) => s.scope.to_u16(),
            V9OptionsField::Option(f) => f.type_id,
        }
    }
}

/// Indexed, named access into one dataset under one template.
pub struct View<F> {
    fields: Vec<F>,
    values: Vec<FieldValue>,
}

impl<F: ViewField> View<F> {
    /// `values.len()` must be an exact multiple of `fields.len()`; this is
    /// the structural invariant the rest of the view leans on.
    pub fn new(fields: Vec<F>, values: Vec<FieldValue>) -> Result<Self> {
        if fields.is_empty() {
            return Err(NetflowError::ArgumentRange("a view requires at least one template field".into()));
        }
        if values.len() % fields.len() != 0 {
            return Err(NetflowError::ArgumentRange(format!(
                "dataset length {} is not an exact multiple of the template's field count {}",
                values.len(),
                fields.len()
            )));
        }
        Ok(Self { fields, values })
    }

    /// Number of complete records in the dataset.
    pub fn count(&self) -> usize {
        self.values.len() / self.fields.len()
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    fn index_of(&self, record_idx: usize, field_idx: usize) -> Result<usize> {
        if record_idx >= self.count() {
            return Err(NetflowError::ArgumentRange(format!(
                "record index {record_idx} out of range (dataset has {} records)",
                self.count()
            )));
        }
        if field_idx >= self.fields.len() {
            return Err(NetflowError::ArgumentRange(format!(
                "field index {field_idx} out of range (template has {} fields)",
                self.fields.len()
            )));
        }
        Ok(record_idx * self.fields.len() + field_idx)
    }

    /// `get(record_idx, field_idx)`.
    pub fn get(&self, record_idx: usize, field_idx: usize) -> Result<&FieldValue> {
        let i = self.index_of(record_idx, field_idx)?;
        Ok(&self.values[i])
    }

    /// `set(record_idx, field_idx, value)`. Fails if `value` doesn't
    /// serialize to the field's declared byte length.
    pub fn set(&mut self, record_idx: usize, field_idx: usize, value: FieldValue) -> Result<()> {
        let i = self.index_of(record_idx, field_idx)?;
        let declared = self.fields[field_idx].declared_length();
        value.check_length(declared as usize)?;
        self.values[i] = value;
        Ok(())
    }

    fn field_index_for_element(&self, element_id: u16) -> Result<usize> {
        self.fields.iter().position(|f| f.element_id() == element_id).ok_or_else(|| {
            NetflowError::ArgumentMismatch(format!("no template field with element id {element_id}"))
        })
    }

    /// `get(record_idx, information_element)`: the first template field
    /// carrying that element id.
    pub fn get_by_element(&self, record_idx: usize, element_id: u16) -> Result<&FieldValue> {
        let field_idx = self.field_index_for_element(element_id)?;
        self.get(record_idx, field_idx)
    }

    /// `get(record_idx, field_specifier)`: exact match on the field
    /// descriptor, including length (and enterprise number, for IPFIX).
    pub fn get_by_field(&self, record_idx: usize, field: &F) -> Result<&FieldValue> {
        let field_idx = self
            .fields
            .iter()
            .position(|f| f == field)
            .ok_or_else(|| NetflowError::ArgumentMismatch("no template field matches the given field specifier".into()))?;
        self.get(record_idx, field_idx)
    }

    /// `get(record_idx)`: a dynamic record exposing this record's values by
    /// position or element id.
    pub fn record(&self, record_idx: usize) -> Result<DynamicRecord<'_, F>> {
        if record_idx >= self.count() {
            return Err(NetflowError::ArgumentRange(format!(
                "record index {record_idx} out of range (dataset has {} records)",
                self.count()
            )));
        }
        let start = record_idx * self.fields.len();
        let end = start + self.fields.len();
        Ok(DynamicRecord { fields: &self.fields, values: &self.values[start..end] })
    }

    /// An iterator over every record as a [`DynamicRecord`].
    pub fn records(&self) -> RecordsIter<'_, F> {
        RecordsIter { fields: &self.fields, values: &self.values, pos: 0, total: self.count() }
    }

    pub fn into_values(self) -> Vec<FieldValue> {
        self.values
    }

    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }
}

impl View<v9::Field> {
    pub fn for_v9_template(template: &v9::TemplateRecord, values: Vec<FieldValue>) -> Result<Self> {
        View::new(template.fields.clone(), values)
    }
}

impl View<ipfix::FieldSpecifier> {
    pub fn for_ipfix_template(template: &ipfix::TemplateRecord, values: Vec<FieldValue>) -> Result<Self> {
        View::new(template.fields.clone(), values)
    }

    pub fn for_ipfix_options(template: &ipfix::OptionsTemplateRecord, values: Vec<FieldValue>) -> Result<Self> {
        View::new(template.field_specifiers.clone(), values)
    }
}

impl View<V9OptionsField> {
    pub fn for_v9_options(template: &v9::OptionsTemplateRecord, values: Vec<FieldValue>) -> Result<Self> {
        let fields = template
            .scopes
            .iter()
            .copied()
            .map(V9OptionsField::Scope)
            .chain(template.options.iter().copied().map(V9OptionsField::Option))
            .collect();
        View::new(fields, values)
    }
}

/// One record's worth of field values, addressable by position or element
/// id — the view layer's answer to a "dynamic record" with no dynamic
/// properties to lean on.
pub struct DynamicRecord<'a, F> {
    fields: &'a [F],
    values: &'a [FieldValue],
}

impl<'a, F: ViewField> DynamicRecord<'a, F> {
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field_idx: usize) -> Option<&FieldValue> {
        self.values.get(field_idx)
    }

    pub fn get_by_element(&self, element_id: u16) -> Option<&FieldValue> {
        let idx = self.fields.iter().position(|f| f.element_id() == element_id)?;
        self.values.get(idx)
    }

    /// Every `(element_id, value)` pair in this record, in template order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &FieldValue)> + '_ {
        self.fields.iter().map(|f| f.element_id()).zip(self.values.iter())
    }
}

pub struct RecordsIter<'a, F> {
    fields: &'a [F],
    values: &'a [FieldValue],
    pos: usize,
    total: usize,
}

impl<'a, F: ViewField> Iterator for RecordsIter<'a, F> {
    type Item = DynamicRecord<'a, F>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.total {
            return None;
        }
        let start = self.pos * self.fields.len();
        let end = start + self.fields.len();
        self.pos += 1;
        Some(DynamicRecord { fields: self.fields, values: &self.values[start..end] })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total - self.pos;
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn sample_template() -> v9::TemplateRecord {
        v9::TemplateRecord::new(
            256,
            vec![v9::Field { type_id: 8, length: 4 }, v9::Field { type_id: 2, length: 4 }],
        )
        .unwrap()
    }

    fn sample_values() -> Vec<FieldValue> {
        vec![
            FieldValue::Ipv4(Ipv4Addr::new(192, 0, 2, 1)),
            FieldValue::U32(10),
            FieldValue::Ipv4(Ipv4Addr::new(192, 0, 2, 2)),
            FieldValue::U32(20),
        ]
    }

    #[test]
    fn count_divides_dataset_by_field_count() {
        let view = View::for_v9_template(&sample_template(), sample_values()).unwrap();
        assert_eq!(view.count(), 2);
    }

    #[test]
    fn rejects_dataset_not_a_multiple_of_field_count() {
        let mut values = sample_values();
        values.pop();
        assert!(View::for_v9_template(&sample_template(), values).is_err());
    }

    #[test]
    fn get_and_get_by_element_agree() {
        let view = View::for_v9_template(&sample_template(), sample_values()).unwrap();
        assert_eq!(view.get(1, 0).unwrap(), view.get_by_element(1, 8).unwrap());
        assert_eq!(*view.get(1, 1).unwrap(), FieldValue::U32(20));
    }

    #[test]
    fn out_of_range_record_index_is_an_error() {
        let view = View::for_v9_template(&sample_template(), sample_values()).unwrap();
        assert!(view.get(2, 0).is_err());
    }

    #[test]
    fn set_rejects_length_mismatch() {
        let mut view = View::for_v9_template(&sample_template(), sample_values()).unwrap();
        assert!(view.set(0, 0, FieldValue::U16(1)).is_err());
        assert!(view.set(0, 0, FieldValue::Ipv4(Ipv4Addr::new(10, 0, 0, 1))).is_ok());
    }

    #[test]
    fn records_iterator_yields_every_record_in_order() {
        let view = View::for_v9_template(&sample_template(), sample_values()).unwrap();
        let seen: Vec<_> = view.records().map(|r| r.get_by_element(2).cloned()).collect();
        assert_eq!(seen, vec![Some(FieldValue::U32(10)), Some(FieldValue::U32(20))]);
    }

    #[test]
    fn get_by_field_requires_exact_match() {
        let view = View::for_v9_template(&sample_template(), sample_values()).unwrap();
        let field = v9::Field { type_id: 8, length: 4 };
        assert!(view.get_by_field(0, &field).is_ok());
        let wrong_length = v9::Field { type_id: 8, length: 16 };
        assert!(view.get_by_field(0, &wrong_length).is_err());
    }
}
