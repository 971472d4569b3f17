//! Component F: the reader state machine.
//!
//! Mirrors the writer (`crate::writer`): `ExpectHeader -> ExpectSets(remaining)
//! -> ExpectHeader`, cycling once per packet rather than terminating, since a
//! stream may carry many packets back to back. The reader owns a
//! per-observation-domain [`TemplateRegistry`] that templates register into
//! as they're seen and data sets are decoded against.
//!
//! v9 and IPFIX get separate reader types ([`V9Reader`], [`IpfixReader`])
//! rather than one generic implementation — their set framing, header shape,
//! and options-template layout diverge enough (design note on "keep the two
//! readers separate") that sharing one state machine invites exactly the
//! cross-protocol bugs that note warns about. Both share the same shape,
//! though, so the pattern is easy to read across the two.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use crate::byteorder;
use crate::error::{NetflowError, Result};
use crate::variable_versions::common::FieldValue;
use crate::variable_versions::enterprise_registry::EnterpriseFieldRegistry;
use crate::variable_versions::{ipfix, v9};

/// A decoded flow set, generic over the per-protocol template/options-template
/// record types. `Unknown` covers any set id the protocol doesn't assign a
/// meaning to (§3: "Other values ⇒ unknown; skip by length").
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedSet<T, O> {
    Template(Vec<T>),
    OptionsTemplate(Vec<O>),
    Data { id: u16, values: Vec<FieldValue> },
    OptionsData { id: u16, values: Vec<FieldValue> },
    Unknown { id: u16 },
}

/// Per-observation-domain template registry (design note: "a two-level map
/// `OID -> (id -> TemplateRecord)` plus `OID -> (id -> OptionsTemplateRecord)`,
/// ... templates are values, not references to shared state"). A new
/// template with an existing id replaces the old one (last-write-wins); there
/// is no eviction — entries live for the registry's lifetime.
#[derive(Debug, Clone)]
pub struct TemplateRegistry<T, O> {
    data_templates: HashMap<u32, HashMap<u16, T>>,
    option_templates: HashMap<u32, HashMap<u16, O>>,
}

impl<T, O> Default for TemplateRegistry<T, O> {
    fn default() -> Self {
        Self { data_templates: HashMap::new(), option_templates: HashMap::new() }
    }
}

impl<T, O> TemplateRegistry<T, O> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_template(&mut self, observation_domain_id: u32, id: u16, template: T) {
        self.data_templates.entry(observation_domain_id).or_default().insert(id, template);
    }

    pub fn register_options_template(&mut self, observation_domain_id: u32, id: u16, template: O) {
        self.option_templates.entry(observation_domain_id).or_default().insert(id, template);
    }

    pub fn get_template(&self, observation_domain_id: u32, id: u16) -> Option<&T> {
        self.data_templates.get(&observation_domain_id)?.get(&id)
    }

    pub fn get_options_template(&self, observation_domain_id: u32, id: u16) -> Option<&O> {
        self.option_templates.get(&observation_domain_id)?.get(&id)
    }

    /// Template ids currently registered for `observation_domain_id`. Empty
    /// until at least one template-set has been seen for that domain —
    /// templates registered under a different domain are never visible here
    /// (cross-observation-domain isolation).
    pub fn data_template_ids(&self, observation_domain_id: u32) -> Vec<u16> {
        self.data_templates
            .get(&observation_domain_id)
            .map(|m| m.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn options_template_ids(&self, observation_domain_id: u32) -> Vec<u16> {
        self.option_templates
            .get(&observation_domain_id)
            .map(|m| m.keys().copied().collect())
            .unwrap_or_default()
    }
}

/// Constructor options shared by both readers (§6 "Configuration surface").
pub struct ReaderOptions<T, O> {
    /// Whether disposing the reader closes the underlying stream.
    pub leave_open: bool,
    /// Pre-populated registry, for resuming a stream whose templates were
    /// observed earlier.
    pub known_templates: Option<TemplateRegistry<T, O>>,
}

impl<T, O> Default for ReaderOptions<T, O> {
    fn default() -> Self {
        Self { leave_open: false, known_templates: None }
    }
}

/// Reads exactly `body_len` bytes into a buffer before any interior parsing
/// begins. This is what makes a malformed set body recoverable: the set's
/// `{id, length}` framing is consumed up front, so whatever a decoder does
/// with the buffer, the stream position for the *next* set is already
/// correct.
fn read_set_body<R: Read>(r: &mut R, body_len: usize) -> Result<Vec<u8>> {
    byteorder::read_bytes(r, body_len).map_err(NetflowError::from)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum V9ReaderState {
    ExpectHeader,
    ExpectSets { remaining_sets: u16 },
}

/// Stateful NetFlow v9 reader over any [`Read`] stream.
pub struct V9Reader<R> {
    stream: Option<R>,
    state: V9ReaderState,
    leave_open: bool,
    current_header: Option<v9::Header>,
    templates: TemplateRegistry<v9::TemplateRecord, v9::OptionsTemplateRecord>,
}

/// One fully-read v9 packet: its header plus every set decoded from it.
#[derive(Debug, Clone, PartialEq)]
pub struct V9Packet {
    pub header: v9::Header,
    pub sets: Vec<DecodedSet<v9::TemplateRecord, v9::OptionsTemplateRecord>>,
}

impl<R: Read> V9Reader<R> {
    pub fn new(stream: R) -> Self {
        Self::with_options(stream, ReaderOptions::default())
    }

    pub fn with_options(
        stream: R,
        options: ReaderOptions<v9::TemplateRecord, v9::OptionsTemplateRecord>,
    ) -> Self {
        Self {
            stream: Some(stream),
            state: V9ReaderState::ExpectHeader,
            leave_open: options.leave_open,
            current_header: None,
            templates: options.known_templates.unwrap_or_default(),
        }
    }

    pub fn templates(&self) -> &TemplateRegistry<v9::TemplateRecord, v9::OptionsTemplateRecord> {
        &self.templates
    }

    fn stream_mut(&mut self) -> Result<&mut R> {
        self.stream.as_mut().ok_or(NetflowError::UseAfterClose)
    }

    /// Consumes the 20-byte v9 packet header and transitions to `ExpectSets`.
    pub fn read_packet_header(&mut self) -> Result<v9::Header> {
        if !matches!(self.state, V9ReaderState::ExpectHeader) {
            return Err(NetflowError::StateViolation(
                "read_packet_header called outside ExpectHeader".into(),
            ));
        }
        let header = v9::Header::decode(self.stream_mut()?)?;
        self.state = if header.count == 0 {
            V9ReaderState::ExpectHeader
        } else {
            V9ReaderState::ExpectSets { remaining_sets: header.count }
        };
        self.current_header = Some(header);
        Ok(header)
    }

    /// Reads one flow set and dispatches on its id. Recoverable errors
    /// (`FormatError`, `MissingTemplate`) are returned to the caller but the
    /// reader's internal state has already advanced past the set, so the
    /// next call proceeds normally.
    pub fn read_set(&mut self) -> Result<DecodedSet<v9::TemplateRecord, v9::OptionsTemplateRecord>> {
        let remaining_sets = match self.state {
            V9ReaderState::ExpectSets { remaining_sets } => remaining_sets,
            V9ReaderState::ExpectHeader => {
                return Err(NetflowError::StateViolation("read_set called outside ExpectSets".into()));
            }
        };

        let stream = self.stream_mut()?;
        let id = byteorder::read_u16(stream)?;
        let length = byteorder::read_u16(stream)?;
        let malformed_length = (length as usize) < 4;
        let body_len = (length as usize).saturating_sub(4);
        let body = read_set_body(stream, body_len)?;

        self.state = if remaining_sets <= 1 {
            V9ReaderState::ExpectHeader
        } else {
            V9ReaderState::ExpectSets { remaining_sets: remaining_sets - 1 }
        };

        if malformed_length {
            log::warn!("v9 set {id}: length {length} is smaller than the 4-byte set header, skipping");
            return Err(NetflowError::FormatError(format!(
                "set length {length} is smaller than the 4-byte set header"
            )));
        }

        let observation_domain_id = self.current_header.as_ref().expect("header read before sets").source_id;
        let mut cursor = Cursor::new(body);

        match id {
            v9::TEMPLATE_SET_ID => {
                let records = v9::decode_template_set(&mut cursor, body_len)?;
                for record in &records {
                    self.templates.register_template(observation_domain_id, record.id, record.clone());
                }
                Ok(DecodedSet::Template(records))
            }
            v9::OPTIONS_TEMPLATE_SET_ID => {
                let records = v9::decode_options_template_set(&mut cursor, body_len)?;
                for record in &records {
                    self.templates.register_options_template(observation_domain_id, record.id, record.clone());
                }
                Ok(DecodedSet::OptionsTemplate(records))
            }
            id if id >= v9::MIN_DATA_SET_ID => {
                if let Some(template) = self.templates.get_template(observation_domain_id, id) {
                    let values = v9::decode_data_records(&mut cursor, template, body_len)?;
                    Ok(DecodedSet::Data { id, values })
                } else if let Some(template) = self.templates.get_options_template(observation_domain_id, id) {
                    let values = v9::decode_options_data_records(&mut cursor, template, body_len)?;
                    Ok(DecodedSet::OptionsData { id, values })
                } else {
                    log::debug!("v9 data set {id}: no template registered for observation domain {observation_domain_id}");
                    Err(NetflowError::MissingTemplate { observation_domain_id, template_id: id })
                }
            }
            other => {
                log::debug!("v9 set {other}: unrecognized id, skipping {body_len} bytes");
                Ok(DecodedSet::Unknown { id: other })
            }
        }
    }

    /// Reads one full packet: the header plus every set it declares.
    /// Recoverable set errors are swallowed (the reader has already advanced
    /// past them); only a stream-level error aborts the whole read.
    pub fn read_packet(&mut self) -> Result<V9Packet> {
        let header = self.read_packet_header()?;
        let mut sets = Vec::new();
        while matches!(self.state, V9ReaderState::ExpectSets { .. }) {
            match self.read_set() {
                Ok(set) => sets.push(set),
                Err(e) if e.is_recoverable() => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(V9Packet { header, sets })
    }

    /// Closes the reader. Returns the underlying stream when `leave_open`
    /// was set at construction; otherwise drops it.
    pub fn close(mut self) -> Option<R> {
        let stream = self.stream.take();
        if self.leave_open { stream } else { drop(stream); None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IpfixReaderState {
    ExpectHeader,
    ExpectSets { remaining_bytes: usize },
}

/// Stateful IPFIX reader over any [`Read`] stream.
pub struct IpfixReader<R> {
    stream: Option<R>,
    state: IpfixReaderState,
    leave_open: bool,
    current_header: Option<ipfix::Header>,
    templates: TemplateRegistry<ipfix::TemplateRecord, ipfix::OptionsTemplateRecord>,
    enterprise_registry: EnterpriseFieldRegistry,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IpfixPacket {
    pub header: ipfix::Header,
    pub sets: Vec<DecodedSet<ipfix::TemplateRecord, ipfix::OptionsTemplateRecord>>,
}

impl<R: Read> IpfixReader<R> {
    pub fn new(stream: R) -> Self {
        Self::with_options(stream, ReaderOptions::default(), EnterpriseFieldRegistry::new())
    }

    pub fn with_options(
        stream: R,
        options: ReaderOptions<ipfix::TemplateRecord, ipfix::OptionsTemplateRecord>,
        enterprise_registry: EnterpriseFieldRegistry,
    ) -> Self {
        Self {
            stream: Some(stream),
            state: IpfixReaderState::ExpectHeader,
            leave_open: options.leave_open,
            current_header: None,
            templates: options.known_templates.unwrap_or_default(),
            enterprise_registry,
        }
    }

    pub fn templates(&self) -> &TemplateRegistry<ipfix::TemplateRecord, ipfix::OptionsTemplateRecord> {
        &self.templates
    }

    fn stream_mut(&mut self) -> Result<&mut R> {
        self.stream.as_mut().ok_or(NetflowError::UseAfterClose)
    }

    /// Consumes the 16-byte IPFIX message header and transitions to
    /// `ExpectSets`, with `remaining_bytes = header.length - header_size`.
    pub fn read_packet_header(&mut self) -> Result<ipfix::Header> {
        if !matches!(self.state, IpfixReaderState::ExpectHeader) {
            return Err(NetflowError::StateViolation(
                "read_packet_header called outside ExpectHeader".into(),
            ));
        }
        let header = ipfix::Header::decode(self.stream_mut()?)?;
        let remaining_bytes = (header.length as usize).saturating_sub(ipfix::HEADER_SIZE);
        self.state = if remaining_bytes == 0 {
            IpfixReaderState::ExpectHeader
        } else {
            IpfixReaderState::ExpectSets { remaining_bytes }
        };
        self.current_header = Some(header);
        Ok(header)
    }

    pub fn read_set(
        &mut self,
    ) -> Result<DecodedSet<ipfix::TemplateRecord, ipfix::OptionsTemplateRecord>> {
        let remaining_bytes = match self.state {
            IpfixReaderState::ExpectSets { remaining_bytes } => remaining_bytes,
            IpfixReaderState::ExpectHeader => {
                return Err(NetflowError::StateViolation("read_set called outside ExpectSets".into()));
            }
        };

        let stream = self.stream_mut()?;
        let id = byteorder::read_u16(stream)?;
        let length = byteorder::read_u16(stream)?;
        let malformed_length = (length as usize) < 4;
        let body_len = (length as usize).saturating_sub(4);
        let body = read_set_body(stream, body_len)?;

        let consumed = length as usize;
        self.state = if consumed >= remaining_bytes {
            IpfixReaderState::ExpectHeader
        } else {
            IpfixReaderState::ExpectSets { remaining_bytes: remaining_bytes - consumed }
        };

        if malformed_length {
            log::warn!("IPFIX set {id}: length {length} is smaller than the 4-byte set header, skipping");
            return Err(NetflowError::FormatError(format!(
                "set length {length} is smaller than the 4-byte set header"
            )));
        }

        let observation_domain_id =
            self.current_header.as_ref().expect("header read before sets").observation_domain_id;
        let mut cursor = Cursor::new(body);

        match id {
            ipfix::TEMPLATE_SET_ID => {
                let records = ipfix::decode_template_set(&mut cursor, body_len)?;
                for record in &records {
                    self.templates.register_template(observation_domain_id, record.id, record.clone());
                }
                Ok(DecodedSet::Template(records))
            }
            ipfix::OPTIONS_TEMPLATE_SET_ID => {
                let records = ipfix::decode_options_template_set(&mut cursor, body_len)?;
                for record in &records {
                    self.templates.register_options_template(observation_domain_id, record.id, record.clone());
                }
                Ok(DecodedSet::OptionsTemplate(records))
            }
            id if id >= ipfix::MIN_DATA_SET_ID => {
                if let Some(template) = self.templates.get_template(observation_domain_id, id) {
                    let values =
                        ipfix::decode_data_records(&mut cursor, template, body_len, &self.enterprise_registry)?;
                    Ok(DecodedSet::Data { id, values })
                } else if let Some(template) = self.templates.get_options_template(observation_domain_id, id) {
                    let values = ipfix::decode_options_data_records(
                        &mut cursor,
                        template,
                        body_len,
                        &self.enterprise_registry,
                    )?;
                    Ok(DecodedSet::OptionsData { id, values })
                } else {
                    log::debug!(
                        "IPFIX data set {id}: no template registered for observation domain {observation_domain_id}"
                    );
                    Err(NetflowError::MissingTemplate { observation_domain_id, template_id: id })
                }
            }
            other => {
                log::debug!("IPFIX set {other}: unrecognized id, skipping {body_len} bytes");
                Ok(DecodedSet::Unknown { id: other })
            }
        }
    }

    pub fn read_packet(&mut self) -> Result<IpfixPacket> {
        let header = self.read_packet_header()?;
        let mut sets = Vec::new();
        while matches!(self.state, IpfixReaderState::ExpectSets { .. }) {
            match self.read_set() {
                Ok(set) => sets.push(set),
                Err(e) if e.is_recoverable() => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(IpfixPacket { header, sets })
    }

    pub fn close(mut self) -> Option<R> {
        let stream = self.stream.take();
        if self.leave_open { stream } else { drop(stream); None }
    }
}
