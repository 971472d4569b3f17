#![doc = include_str!("../README.md")]

pub mod byteorder;
pub mod copy;
pub mod error;
pub mod protocol;
pub mod reader;
pub mod static_versions;
pub mod variable_versions;
pub mod view;
pub mod wire;
pub mod writer;

pub use error::{NetflowError, Result};

use static_versions::{v5, v7};

/// One decoded packet, tagged by protocol.
///
/// v5 and v7 packets come from a single `WireDecode::decode` call (no
/// templates involved); v9 and IPFIX packets come from
/// [`reader::V9Reader::read_packet`] / [`reader::IpfixReader::read_packet`]
/// and already carry every set the packet declared, decoded against
/// whatever templates the reader had registered at the time.
///
/// ```rust
/// use netflow_codec::NetflowPacket;
/// # use netflow_codec::static_versions::v5;
/// # let header = v5::Header { count: 0, system_uptime_ms: 0, unix_seconds: 0, unix_nanos: 0, sequence_number: 0, engine_type: 0, engine_id: 0, sampling_interval: 0 };
/// let packet = NetflowPacket::V5(v5::Packet { header, records: vec![] });
/// assert!(packet.is_v5());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum NetflowPacket {
    V5(v5::Packet),
    V7(v7::Packet),
    V9(reader::V9Packet),
    IPFix(reader::IpfixPacket),
}

impl NetflowPacket {
    pub fn is_v5(&self) -> bool {
        matches!(self, Self::V5(_))
    }

    pub fn is_v7(&self) -> bool {
        matches!(self, Self::V7(_))
    }

    pub fn is_v9(&self) -> bool {
        matches!(self, Self::V9(_))
    }

    pub fn is_ipfix(&self) -> bool {
        matches!(self, Self::IPFix(_))
    }
}
