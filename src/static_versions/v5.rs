//! NetFlow v5 — fixed-format flow records.
//!
//! <https://www.cisco.com/en/US/technologies/tk648/tk362/technologies_white_paper09186a00800a3db9.html>
//!
//! Unlike v9/IPFIX, v5 has no templates: the header and record shapes are
//! fixed by the protocol version, so this module implements [`WireEncode`]/
//! [`WireDecode`] directly rather than going through a template + field
//! table.

use std::io::{self, Read, Write};
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use crate::byteorder;
use crate::error::Result;
use crate::protocol::ProtocolTypes;
use crate::wire::{WireDecode, WireEncode};

/// On-wire size of the v5 packet header.
pub const HEADER_SIZE: usize = 24;
/// On-wire size of a single v5 flow record.
pub const RECORD_SIZE: usize = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub count: u16,
    pub system_uptime_ms: u32,
    pub unix_seconds: u32,
    pub unix_nanos: u32,
    pub sequence_number: u32,
    pub engine_type: u8,
    pub engine_id: u8,
    pub sampling_interval: u16,
}

impl WireEncode for Header {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
        byteorder::write_u16(w, 5)?;
        byteorder::write_u16(w, self.count)?;
        byteorder::write_u32(w, self.system_uptime_ms)?;
        byteorder::write_u32(w, self.unix_seconds)?;
        byteorder::write_u32(w, self.unix_nanos)?;
        byteorder::write_u32(w, self.sequence_number)?;
        byteorder::write_u8(w, self.engine_type)?;
        byteorder::write_u8(w, self.engine_id)?;
        byteorder::write_u16(w, self.sampling_interval)
    }

    fn on_wire_size(&self) -> usize {
        HEADER_SIZE
    }
}

impl WireDecode for Header {
    fn decode<R: Read>(r: &mut R) -> Result<Self> {
        let version = byteorder::read_u16(r)?;
        if version != 5 {
            return Err(crate::error::NetflowError::FormatError(format!(
                "expected v5 header version 5, got {version}"
            )));
        }
        Ok(Header {
            count: byteorder::read_u16(r)?,
            system_uptime_ms: byteorder::read_u32(r)?,
            unix_seconds: byteorder::read_u32(r)?,
            unix_nanos: byteorder::read_u32(r)?,
            sequence_number: byteorder::read_u32(r)?,
            engine_type: byteorder::read_u8(r)?,
            engine_id: byteorder::read_u8(r)?,
            sampling_interval: byteorder::read_u16(r)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowRecord {
    pub src: Ipv4Addr,
    pub dst: Ipv4Addr,
    pub next_hop: Ipv4Addr,
    pub input: u16,
    pub output: u16,
    pub packets: u32,
    pub octets: u32,
    pub start: u32,
    pub end: u32,
    pub src_port: u16,
    pub dst_port: u16,
    pub tcp_flags: u8,
    pub proto: ProtocolTypes,
    pub tos: u8,
    pub src_as: u16,
    pub dst_as: u16,
    pub src_mask: u8,
    pub dst_mask: u8,
}

impl WireEncode for FlowRecord {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
        byteorder::write_bytes(w, &self.src.octets())?;
        byteorder::write_bytes(w, &self.dst.octets())?;
        byteorder::write_bytes(w, &self.next_hop.octets())?;
        byteorder::write_u16(w, self.input)?;
        byteorder::write_u16(w, self.output)?;
        byteorder::write_u32(w, self.packets)?;
        byteorder::write_u32(w, self.octets)?;
        byteorder::write_u32(w, self.start)?;
        byteorder::write_u32(w, self.end)?;
        byteorder::write_u16(w, self.src_port)?;
        byteorder::write_u16(w, self.dst_port)?;
        byteorder::write_u8(w, 0)?; // pad1
        byteorder::write_u8(w, self.tcp_flags)?;
        self.proto.encode(w)?;
        byteorder::write_u8(w, self.tos)?;
        byteorder::write_u16(w, self.src_as)?;
        byteorder::write_u16(w, self.dst_as)?;
        byteorder::write_u8(w, self.src_mask)?;
        byteorder::write_u8(w, self.dst_mask)?;
        byteorder::write_u16(w, 0) // pad2
    }

    fn on_wire_size(&self) -> usize {
        RECORD_SIZE
    }
}

impl WireDecode for FlowRecord {
    fn decode<R: Read>(r: &mut R) -> Result<Self> {
        let src = byteorder::read_bytes(r, 4)?;
        let dst = byteorder::read_bytes(r, 4)?;
        let next_hop = byteorder::read_bytes(r, 4)?;
        let input = byteorder::read_u16(r)?;
        let output = byteorder::read_u16(r)?;
        let packets = byteorder::read_u32(r)?;
        let octets = byteorder::read_u32(r)?;
        let start = byteorder::read_u32(r)?;
        let end = byteorder::read_u32(r)?;
        let src_port = byteorder::read_u16(r)?;
        let dst_port = byteorder::read_u16(r)?;
        byteorder::read_u8(r)?; // pad1
        let tcp_flags = byteorder::read_u8(r)?;
        let proto = ProtocolTypes::decode(r)?;
        let tos = byteorder::read_u8(r)?;
        let src_as = byteorder::read_u16(r)?;
        let dst_as = byteorder::read_u16(r)?;
        let src_mask = byteorder::read_u8(r)?;
        let dst_mask = byteorder::read_u8(r)?;
        byteorder::read_u16(r)?; // pad2
        Ok(FlowRecord {
            src: Ipv4Addr::new(src[0], src[1], src[2], src[3]),
            dst: Ipv4Addr::new(dst[0], dst[1], dst[2], dst[3]),
            next_hop: Ipv4Addr::new(next_hop[0], next_hop[1], next_hop[2], next_hop[3]),
            input,
            output,
            packets,
            octets,
            start,
            end,
            src_port,
            dst_port,
            tcp_flags,
            proto,
            tos,
            src_as,
            dst_as,
            src_mask,
            dst_mask,
        })
    }
}

/// A full v5 packet: header plus its flow records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    pub header: Header,
    pub records: Vec<FlowRecord>,
}

impl WireEncode for Packet {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
        self.header.encode(w)?;
        for record in &self.records {
            record.encode(w)?;
        }
        Ok(())
    }

    fn on_wire_size(&self) -> usize {
        HEADER_SIZE + self.records.len() * RECORD_SIZE
    }
}

impl WireDecode for Packet {
    fn decode<R: Read>(r: &mut R) -> Result<Self> {
        let header = Header::decode(r)?;
        let mut records = Vec::with_capacity(header.count as usize);
        for _ in 0..header.count {
            records.push(FlowRecord::decode(r)?);
        }
        Ok(Packet { header, records })
    }
}
