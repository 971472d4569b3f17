//! Registry for user-registered IPFIX enterprise fields.
//!
//! `InformationElement` (`ipfix_lookup.rs`) only covers IANA standard
//! elements (enterprise number 0). Vendor-specific elements carried under a
//! nonzero enterprise number have no fixed table here; a caller can
//! register a decode hint for `(enterprise_number, field_number)` so the
//! reader doesn't have to fall back to raw bytes for fields it actually
//! knows about.

use std::collections::HashMap;

use crate::variable_versions::common::FieldFamily;

/// A user-supplied decode hint for one vendor field.
#[derive(Debug, Clone, PartialEq)]
pub struct EnterpriseFieldDef {
    pub enterprise_number: u32,
    pub field_number: u16,
    pub name: String,
    pub family: FieldFamily,
}

impl EnterpriseFieldDef {
    pub fn new(
        enterprise_number: u32,
        field_number: u16,
        name: impl Into<String>,
        family: FieldFamily,
    ) -> Self {
        Self {
            enterprise_number,
            field_number,
            name: name.into(),
            family,
        }
    }
}

/// Registry for storing user-defined enterprise field definitions, keyed by
/// `(enterprise_number, field_number)`. Consulted by the reader before it
/// falls back to raw bytes for an enterprise field specifier (§4.C).
#[derive(Debug, Clone, Default)]
pub struct EnterpriseFieldRegistry {
    fields: HashMap<(u32, u16), EnterpriseFieldDef>,
}

impl EnterpriseFieldRegistry {
    pub fn new() -> Self {
        Self { fields: HashMap::new() }
    }

    /// Registers a single field definition, replacing any existing entry
    /// for the same `(enterprise_number, field_number)`.
    pub fn register(&mut self, def: EnterpriseFieldDef) {
        self.fields.insert((def.enterprise_number, def.field_number), def);
    }

    pub fn register_many(&mut self, defs: impl IntoIterator<Item = EnterpriseFieldDef>) {
        for def in defs {
            self.register(def);
        }
    }

    pub fn get(&self, enterprise_number: u32, field_number: u16) -> Option<&EnterpriseFieldDef> {
        self.fields.get(&(enterprise_number, field_number))
    }

    pub fn contains(&self, enterprise_number: u32, field_number: u16) -> bool {
        self.fields.contains_key(&(enterprise_number, field_number))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }
}
