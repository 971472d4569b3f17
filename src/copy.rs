//! Component H: packet copy.
//!
//! Streams one packet from a source to a destination without fully decoding
//! it — useful for a relay/proxy that needs to forward NetFlow/IPFIX traffic
//! untouched. Each protocol peeks just enough of its own framing to know how
//! many more bytes belong to the packet, then copies the rest verbatim.

use std::io::{Read, Write};

use crate::byteorder;
use crate::error::Result;
use crate::static_versions::{v5, v7};
use crate::variable_versions::{ipfix, v9};

/// Smallest buffer size any copy routine here will accept — the size of the
/// largest header it must peek in one shot (the v9 header, at 20 bytes).
pub const MIN_COPY_BUFFER_SIZE: usize = v9::HEADER_SIZE;

fn copy_n<R: Read, W: Write>(src: &mut R, dst: &mut W, mut remaining: usize, buffer_size: usize) -> Result<()> {
    let mut buf = vec![0u8; buffer_size.max(1)];
    while remaining > 0 {
        let chunk = remaining.min(buf.len());
        let slice = &mut buf[..chunk];
        src.read_exact(slice)?;
        dst.write_all(slice)?;
        remaining -= chunk;
    }
    Ok(())
}

/// Copies one v5 packet: a fixed `HEADER_SIZE + count * RECORD_SIZE` bytes.
/// v5 carries its record count in the header, so the header itself must be
/// peeked to know the total length, unlike v7 (identical shape, handled by
/// [`copy_v7_packet`]).
pub fn copy_v5_packet<R: Read, W: Write>(src: &mut R, dst: &mut W, buffer_size: usize) -> Result<()> {
    let mut header_buf = vec![0u8; v5::HEADER_SIZE];
    src.read_exact(&mut header_buf)?;
    let count = u16::from_be_bytes([header_buf[2], header_buf[3]]);
    dst.write_all(&header_buf)?;
    copy_n(src, dst, count as usize * v5::RECORD_SIZE, buffer_size)
}

/// Copies one v7 packet: `HEADER_SIZE + count * RECORD_SIZE` bytes, same
/// header layout as v5 for the count field.
pub fn copy_v7_packet<R: Read, W: Write>(src: &mut R, dst: &mut W, buffer_size: usize) -> Result<()> {
    let mut header_buf = vec![0u8; v7::HEADER_SIZE];
    src.read_exact(&mut header_buf)?;
    let count = u16::from_be_bytes([header_buf[2], header_buf[3]]);
    dst.write_all(&header_buf)?;
    copy_n(src, dst, count as usize * v7::RECORD_SIZE, buffer_size)
}

/// Copies one IPFIX message: peeks the 4-byte version+length prefix, then
/// streams `length - 4` more bytes.
pub fn copy_ipfix_packet<R: Read, W: Write>(src: &mut R, dst: &mut W, buffer_size: usize) -> Result<()> {
    let mut prefix = [0u8; 4];
    src.read_exact(&mut prefix)?;
    let length = u16::from_be_bytes([prefix[2], prefix[3]]) as usize;
    dst.write_all(&prefix)?;
    copy_n(src, dst, length.saturating_sub(4), buffer_size.max(4))
}

/// Copies one v9 packet: peeks the 20-byte header for the set count, then
/// loops peeking each set's 4-byte `{id, length}` prefix and streaming
/// `length - 4` more bytes.
pub fn copy_v9_packet<R: Read, W: Write>(src: &mut R, dst: &mut W, buffer_size: usize) -> Result<()> {
    let mut header_buf = vec![0u8; v9::HEADER_SIZE];
    src.read_exact(&mut header_buf)?;
    // count lives at header bytes 2..4 (version occupies bytes 0..2).
    let set_count = u16::from_be_bytes([header_buf[2], header_buf[3]]);
    dst.write_all(&header_buf)?;

    for _ in 0..set_count {
        let mut set_prefix = [0u8; 4];
        src.read_exact(&mut set_prefix)?;
        let length = u16::from_be_bytes([set_prefix[2], set_prefix[3]]) as usize;
        dst.write_all(&set_prefix)?;
        copy_n(src, dst, length.saturating_sub(4), buffer_size)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::WireEncode;
    use std::io::Cursor;
    use std::net::Ipv4Addr;

    #[test]
    fn copies_a_v5_packet_byte_for_byte() {
        let header = v5::Header {
            count: 1,
            system_uptime_ms: 1,
            unix_seconds: 2,
            unix_nanos: 3,
            sequence_number: 4,
            engine_type: 5,
            engine_id: 6,
            sampling_interval: 7,
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
        let packet = v5::Packet { header, records: vec![record] };
        let mut src = Vec::new();
        packet.encode(&mut src).unwrap();

        let mut dst = Vec::new();
        copy_v5_packet(&mut Cursor::new(src.clone()), &mut dst, 16).unwrap();
        assert_eq!(dst, src);
    }

    #[test]
    fn copies_an_ipfix_message_byte_for_byte() {
        let header = ipfix::Header {
            length: (ipfix::HEADER_SIZE + 8) as u16,
            export_time: 1,
            sequence_number: 2,
            observation_domain_id: 3,
        };
        let mut src = Vec::new();
        header.encode(&mut src).unwrap();
        src.extend_from_slice(&[0xAA; 8]);

        let mut dst = Vec::new();
        copy_ipfix_packet(&mut Cursor::new(src.clone()), &mut dst, 8).unwrap();
        assert_eq!(dst, src);
    }

    #[test]
    fn copies_a_v9_packet_with_two_sets() {
        let header = v9::Header {
            count: 2,
            system_uptime_ms: 1,
            unix_seconds: 2,
            sequence_number: 3,
            source_id: 4,
        };
        let mut src = Vec::new();
        header.encode(&mut src).unwrap();
        // set 1: id 0, length 8, 4 bytes body
        byteorder::write_u16(&mut src, 0).unwrap();
        byteorder::write_u16(&mut src, 8).unwrap();
        src.extend_from_slice(&[1, 2, 3, 4]);
        // set 2: id 1, length 4, empty body
        byteorder::write_u16(&mut src, 1).unwrap();
        byteorder::write_u16(&mut src, 4).unwrap();

        let mut dst = Vec::new();
        copy_v9_packet(&mut Cursor::new(src.clone()), &mut dst, 16).unwrap();
        assert_eq!(dst, src);
    }
}
