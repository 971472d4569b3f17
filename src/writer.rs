//! Component E: the writer state machine.
//!
//! Two shapes, matching the two families of protocol covered by this crate:
//!
//! - v9/IPFIX: `ExpectHeader -> ExpectSets(remaining_bytes) -> Done`. The
//!   header declares a total packet length up front; each set consumes a
//!   chunk of it (including its own padding) until none remains.
//! - v5/v7: `ExpectHeader -> ExpectRecords(remaining_records) -> Done`. No
//!   templates, no sets — the header's record count is the only budget to
//!   track.
//!
//! Both are one-shot: unlike the reader, a writer doesn't cycle back to
//! `ExpectHeader` for a second packet. Build a new writer (or reuse the
//! stream with a fresh one) per packet.
//!
//! Any operation attempted in the wrong state is a [`NetflowError::StateViolation`].
//! Closing a writer that's still in the middle of `ExpectSets`/`ExpectRecords`
//! is not an error — the caller may deliberately truncate a packet.

use std::io::{self, Write};

use crate::byteorder;
use crate::error::{NetflowError, Result};
use crate::static_versions::{v5, v7};
use crate::variable_versions::common::FieldValue;
use crate::variable_versions::{ipfix, v9};
use crate::wire::{padded_len, write_padding, WireEncode, ALIGNMENT};

/// Constructor options shared by every writer in this module (§6
/// "Configuration surface").
#[derive(Debug, Clone, Copy, Default)]
pub struct WriterOptions {
    /// Whether disposing the writer closes the underlying stream.
    pub leave_open: bool,
}

/// Writes `id`/`length` framing plus `body`, padded to 4-byte alignment, and
/// returns the total bytes written (the figure the byte-counting writers
/// decrement their remaining budget by).
fn write_set_framed<W: Write>(w: &mut W, id: u16, body: &[u8]) -> io::Result<usize> {
    let unpadded = 4 + body.len();
    let total = padded_len(unpadded, ALIGNMENT);
    byteorder::write_u16(w, id)?;
    byteorder::write_u16(w, total as u16)?;
    w.write_all(body)?;
    write_padding(w, unpadded, ALIGNMENT)?;
    Ok(total)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum V9WriterState {
    ExpectHeader,
    ExpectSets { remaining_sets: u16 },
    Done,
}

/// Stateful NetFlow v9 writer over any [`Write`] stream. One writer covers
/// exactly one packet.
pub struct V9Writer<W> {
    stream: Option<W>,
    state: V9WriterState,
    leave_open: bool,
}

impl<W: Write> V9Writer<W> {
    pub fn new(stream: W) -> Self {
        Self::with_options(stream, WriterOptions::default())
    }

    pub fn with_options(stream: W, options: WriterOptions) -> Self {
        Self { stream: Some(stream), state: V9WriterState::ExpectHeader, leave_open: options.leave_open }
    }

    fn stream_mut(&mut self) -> Result<&mut W> {
        self.stream.as_mut().ok_or(NetflowError::UseAfterClose)
    }

    /// Writes the packet header. `header.count` becomes the number of sets
    /// this writer expects before it reaches `Done`.
    pub fn write_header(&mut self, header: &v9::Header) -> Result<()> {
        if !matches!(self.state, V9WriterState::ExpectHeader) {
            return Err(NetflowError::StateViolation("write_header called outside ExpectHeader".into()));
        }
        header.encode(self.stream_mut()?)?;
        self.state = if header.count == 0 {
            V9WriterState::Done
        } else {
            V9WriterState::ExpectSets { remaining_sets: header.count }
        };
        Ok(())
    }

    fn advance_after_set(&mut self) -> Result<()> {
        let remaining_sets = match self.state {
            V9WriterState::ExpectSets { remaining_sets } => remaining_sets,
            _ => unreachable!("advance_after_set called outside ExpectSets"),
        };
        self.state = if remaining_sets <= 1 {
            V9WriterState::Done
        } else {
            V9WriterState::ExpectSets { remaining_sets: remaining_sets - 1 }
        };
        Ok(())
    }

    fn require_expect_sets(&self) -> Result<()> {
        if !matches!(self.state, V9WriterState::ExpectSets { .. }) {
            return Err(NetflowError::StateViolation("set written outside ExpectSets".into()));
        }
        Ok(())
    }

    pub fn write_template_set(&mut self, records: &[v9::TemplateRecord]) -> Result<()> {
        self.require_expect_sets()?;
        let mut body = Vec::new();
        for record in records {
            record.encode(&mut body)?;
        }
        write_set_framed(self.stream_mut()?, v9::TEMPLATE_SET_ID, &body)?;
        self.advance_after_set()
    }

    pub fn write_options_template_set(&mut self, records: &[v9::OptionsTemplateRecord]) -> Result<()> {
        self.require_expect_sets()?;
        let mut body = Vec::new();
        for record in records {
            record.encode(&mut body)?;
        }
        write_set_framed(self.stream_mut()?, v9::OPTIONS_TEMPLATE_SET_ID, &body)?;
        self.advance_after_set()
    }

    /// Writes a data set with flow-set id `id` (>= 256). The caller is
    /// responsible for supplying `values` in the same flat, template-field
    /// order that `v9::decode_data_records` would produce.
    pub fn write_data_set(&mut self, id: u16, values: &[FieldValue]) -> Result<()> {
        if id < v9::MIN_DATA_SET_ID {
            return Err(NetflowError::ArgumentRange(format!(
                "data set id must be >= {}, got {id}",
                v9::MIN_DATA_SET_ID
            )));
        }
        self.require_expect_sets()?;
        let mut body = Vec::new();
        v9::encode_records(&mut body, values)?;
        write_set_framed(self.stream_mut()?, id, &body)?;
        self.advance_after_set()
    }

    pub fn close(mut self) -> Option<W> {
        let stream = self.stream.take();
        if self.leave_open { stream } else { drop(stream); None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IpfixWriterState {
    ExpectHeader,
    ExpectSets { remaining_bytes: usize },
    Done,
}

/// Stateful IPFIX writer over any [`Write`] stream. One writer covers
/// exactly one message.
pub struct IpfixWriter<W> {
    stream: Option<W>,
    state: IpfixWriterState,
    leave_open: bool,
}

impl<W: Write> IpfixWriter<W> {
    pub fn new(stream: W) -> Self {
        Self::with_options(stream, WriterOptions::default())
    }

    pub fn with_options(stream: W, options: WriterOptions) -> Self {
        Self { stream: Some(stream), state: IpfixWriterState::ExpectHeader, leave_open: options.leave_open }
    }

    fn stream_mut(&mut self) -> Result<&mut W> {
        self.stream.as_mut().ok_or(NetflowError::UseAfterClose)
    }

    /// Writes the message header. `header.length` must already account for
    /// every set this writer will go on to write — it is not recomputed
    /// afterward, so an undersized `length` surfaces as an error from the
    /// first `write_*_set` call that would overrun it.
    pub fn write_header(&mut self, header: &ipfix::Header) -> Result<()> {
        if !matches!(self.state, IpfixWriterState::ExpectHeader) {
            return Err(NetflowError::StateViolation("write_header called outside ExpectHeader".into()));
        }
        let remaining_bytes = (header.length as usize)
            .checked_sub(ipfix::HEADER_SIZE)
            .ok_or_else(|| {
                NetflowError::ArgumentRange(format!(
                    "header.length ({}) is smaller than the header itself ({})",
                    header.length,
                    ipfix::HEADER_SIZE
                ))
            })?;
        header.encode(self.stream_mut()?)?;
        self.state = if remaining_bytes == 0 {
            IpfixWriterState::Done
        } else {
            IpfixWriterState::ExpectSets { remaining_bytes }
        };
        Ok(())
    }

    fn advance_after_set(&mut self, total_written: usize) -> Result<()> {
        let remaining_bytes = match self.state {
            IpfixWriterState::ExpectSets { remaining_bytes } => remaining_bytes,
            _ => unreachable!("advance_after_set called outside ExpectSets"),
        };
        if total_written > remaining_bytes {
            return Err(NetflowError::ArgumentRange(format!(
                "set of {total_written} bytes exceeds the {remaining_bytes} bytes left in the declared packet length"
            )));
        }
        self.state = if total_written == remaining_bytes {
            IpfixWriterState::Done
        } else {
            IpfixWriterState::ExpectSets { remaining_bytes: remaining_bytes - total_written }
        };
        Ok(())
    }

    fn require_expect_sets(&self) -> Result<()> {
        if !matches!(self.state, IpfixWriterState::ExpectSets { .. }) {
            return Err(NetflowError::StateViolation("set written outside ExpectSets".into()));
        }
        Ok(())
    }

    pub fn write_template_set(&mut self, records: &[ipfix::TemplateRecord]) -> Result<()> {
        self.require_expect_sets()?;
        let mut body = Vec::new();
        for record in records {
            record.encode(&mut body)?;
        }
        let total = write_set_framed(self.stream_mut()?, ipfix::TEMPLATE_SET_ID, &body)?;
        self.advance_after_set(total)
    }

    pub fn write_options_template_set(&mut self, records: &[ipfix::OptionsTemplateRecord]) -> Result<()> {
        self.require_expect_sets()?;
        let mut body = Vec::new();
        for record in records {
            record.encode(&mut body)?;
        }
        let total = write_set_framed(self.stream_mut()?, ipfix::OPTIONS_TEMPLATE_SET_ID, &body)?;
        self.advance_after_set(total)
    }

    pub fn write_data_set(&mut self, id: u16, values: &[FieldValue]) -> Result<()> {
        if id < ipfix::MIN_DATA_SET_ID {
            return Err(NetflowError::ArgumentRange(format!(
                "data set id must be >= {}, got {id}",
                ipfix::MIN_DATA_SET_ID
            )));
        }
        self.require_expect_sets()?;
        let mut body = Vec::new();
        ipfix::encode_records(&mut body, values)?;
        let total = write_set_framed(self.stream_mut()?, id, &body)?;
        self.advance_after_set(total)
    }

    pub fn close(mut self) -> Option<W> {
        let stream = self.stream.take();
        if self.leave_open { stream } else { drop(stream); None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FixedFormatWriterState {
    ExpectHeader,
    ExpectRecords { remaining_records: u16 },
    Done,
}

/// Stateful NetFlow v5 writer. v5 has no sets or templates, so the budget is
/// a record count rather than a byte count.
pub struct V5Writer<W> {
    stream: Option<W>,
    state: FixedFormatWriterState,
    leave_open: bool,
}

impl<W: Write> V5Writer<W> {
    pub fn new(stream: W) -> Self {
        Self::with_options(stream, WriterOptions::default())
    }

    pub fn with_options(stream: W, options: WriterOptions) -> Self {
        Self { stream: Some(stream), state: FixedFormatWriterState::ExpectHeader, leave_open: options.leave_open }
    }

    fn stream_mut(&mut self) -> Result<&mut W> {
        self.stream.as_mut().ok_or(NetflowError::UseAfterClose)
    }

    pub fn write_header(&mut self, header: &v5::Header) -> Result<()> {
        if !matches!(self.state, FixedFormatWriterState::ExpectHeader) {
            return Err(NetflowError::StateViolation("write_header called outside ExpectHeader".into()));
        }
        header.encode(self.stream_mut()?)?;
        self.state = if header.count == 0 {
            FixedFormatWriterState::Done
        } else {
            FixedFormatWriterState::ExpectRecords { remaining_records: header.count }
        };
        Ok(())
    }

    pub fn write_record(&mut self, record: &v5::FlowRecord) -> Result<()> {
        let remaining_records = match self.state {
            FixedFormatWriterState::ExpectRecords { remaining_records } => remaining_records,
            _ => return Err(NetflowError::StateViolation("write_record called outside ExpectRecords".into())),
        };
        record.encode(self.stream_mut()?)?;
        self.state = if remaining_records <= 1 {
            FixedFormatWriterState::Done
        } else {
            FixedFormatWriterState::ExpectRecords { remaining_records: remaining_records - 1 }
        };
        Ok(())
    }

    pub fn close(mut self) -> Option<W> {
        let stream = self.stream.take();
        if self.leave_open { stream } else { drop(stream); None }
    }
}

/// Stateful NetFlow v7 writer; identical shape to [`V5Writer`], over v7's
/// record type.
pub struct V7Writer<W> {
    stream: Option<W>,
    state: FixedFormatWriterState,
    leave_open: bool,
}

impl<W: Write> V7Writer<W> {
    pub fn new(stream: W) -> Self {
        Self::with_options(stream, WriterOptions::default())
    }

    pub fn with_options(stream: W, options: WriterOptions) -> Self {
        Self { stream: Some(stream), state: FixedFormatWriterState::ExpectHeader, leave_open: options.leave_open }
    }

    fn stream_mut(&mut self) -> Result<&mut W> {
        self.stream.as_mut().ok_or(NetflowError::UseAfterClose)
    }

    pub fn write_header(&mut self, header: &v7::Header) -> Result<()> {
        if !matches!(self.state, FixedFormatWriterState::ExpectHeader) {
            return Err(NetflowError::StateViolation("write_header called outside ExpectHeader".into()));
        }
        header.encode(self.stream_mut()?)?;
        self.state = if header.count == 0 {
            FixedFormatWriterState::Done
        } else {
            FixedFormatWriterState::ExpectRecords { remaining_records: header.count }
        };
        Ok(())
    }

    pub fn write_record(&mut self, record: &v7::FlowRecord) -> Result<()> {
        let remaining_records = match self.state {
            FixedFormatWriterState::ExpectRecords { remaining_records } => remaining_records,
            _ => return Err(NetflowError::StateViolation("write_record called outside ExpectRecords".into())),
        };
        record.encode(self.stream_mut()?)?;
        self.state = if remaining_records <= 1 {
            FixedFormatWriterState::Done
        } else {
            FixedFormatWriterState::ExpectRecords { remaining_records: remaining_records - 1 }
        };
        Ok(())
    }

    pub fn close(mut self) -> Option<W> {
        let stream = self.stream.take();
        if self.leave_open { stream } else { drop(stream); None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::net::Ipv4Addr;

    #[test]
    fn v9_writer_rejects_set_before_header() {
        let mut writer = V9Writer::new(Vec::<u8>::new());
        let err = writer.write_template_set(&[]).unwrap_err();
        assert!(matches!(err, NetflowError::StateViolation(_)));
    }

    #[test]
    fn v9_writer_reaches_done_after_declared_set_count() {
        let header = v9::Header { count: 1, system_uptime_ms: 0, unix_seconds: 0, sequence_number: 0, source_id: 1 };
        let mut writer = V9Writer::new(Vec::<u8>::new());
        writer.write_header(&header).unwrap();
        let template = v9::TemplateRecord::new(256, vec![v9::Field { type_id: 8, length: 4 }]).unwrap();
        writer.write_template_set(&[template]).unwrap();
        let err = writer.write_template_set(&[]).unwrap_err();
        assert!(matches!(err, NetflowError::StateViolation(_)));
    }

    #[test]
    fn v9_round_trips_through_the_reader() {
        let header = v9::Header {
            count: 1,
            system_uptime_ms: 100,
            unix_seconds: 200,
            sequence_number: 1,
            source_id: 9,
        };
        let template =
            v9::TemplateRecord::new(256, vec![v9::Field { type_id: 8, length: 4 }]).unwrap();

        let mut writer = V9Writer::new(Vec::<u8>::new());
        writer.write_header(&header).unwrap();
        writer.write_template_set(&[template.clone()]).unwrap();
        let buf = writer.close().unwrap();

        let mut reader = crate::reader::V9Reader::new(Cursor::new(buf));
        let decoded_header = reader.read_packet_header().unwrap();
        assert_eq!(decoded_header, header);
        let set = reader.read_set().unwrap();
        match set {
            crate::reader::DecodedSet::Template(records) => assert_eq!(records, vec![template]),
            other => panic!("expected Template, got {other:?}"),
        }
    }

    #[test]
    fn ipfix_writer_rejects_header_length_smaller_than_header() {
        let header = ipfix::Header { length: 4, export_time: 0, sequence_number: 0, observation_domain_id: 0 };
        let mut writer = IpfixWriter::new(Vec::<u8>::new());
        assert!(writer.write_header(&header).is_err());
    }

    #[test]
    fn ipfix_writer_rejects_set_overrunning_declared_length() {
        let header = ipfix::Header {
            length: (ipfix::HEADER_SIZE + 4) as u16,
            export_time: 0,
            sequence_number: 0,
            observation_domain_id: 0,
        };
        let mut writer = IpfixWriter::new(Vec::<u8>::new());
        writer.write_header(&header).unwrap();
        let template =
            ipfix::TemplateRecord::new(256, vec![ipfix::FieldSpecifier::standard(8, 4)]).unwrap();
        let err = writer.write_template_set(&[template]).unwrap_err();
        assert!(matches!(err, NetflowError::ArgumentRange(_)));
    }

    #[test]
    fn v5_writer_tracks_record_count_and_closes_clean() {
        let header = v5::Header {
            count: 1,
            system_uptime_ms: 0,
            unix_seconds: 0,
            unix_nanos: 0,
            sequence_number: 0,
            engine_type: 0,
            engine_id: 0,
            sampling_interval: 0,
        };
        let record = v5::FlowRecord {
            src: Ipv4Addr::new(1, 2, 3, 4),
            dst: Ipv4Addr::new(5, 6, 7, 8),
            next_hop: Ipv4Addr::new(0, 0, 0, 0),
            input: 0,
            output: 0,
            packets: 0,
            octets: 0,
            start: 0,
            end: 0,
            src_port: 0,
            dst_port: 0,
            tcp_flags: 0,
            proto: crate::protocol::ProtocolTypes::TCP,
            tos: 0,
            src_as: 0,
            dst_as: 0,
            src_mask: 0,
            dst_mask: 0,
        };
        let mut writer = V5Writer::new(Vec::<u8>::new());
        writer.write_header(&header).unwrap();
        writer.write_record(&record).unwrap();
        assert!(writer.write_record(&record).is_err());
        let buf = writer.close().unwrap();
        assert_eq!(buf.len(), v5::HEADER_SIZE + v5::RECORD_SIZE);
    }
}
