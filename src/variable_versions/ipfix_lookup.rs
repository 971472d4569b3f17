//! Component C (IPFIX half): the static registry mapping an IPFIX
//! `InformationElement` number (RFC 7011, IANA "IPFIX Information
//! Elements" registry) to its canonical byte length and decode family.
//!
//! Mirrors [`crate::variable_versions::v9_lookup`] in shape but is kept in
//! its own file — the two protocols' options-template parsing diverges
//! enough (design note §9) that sharing one lookup module between them
//! invites exactly the kind of cross-protocol bug that note warns about.

use serde::{Deserialize, Serialize};

use crate::variable_versions::common::FieldFamily;

/// An IPFIX information element. Named variants cover the elements used by
/// the RFC 7011 §3.4.2 reference packet plus the most common traffic
/// fields; anything else is preserved as [`InformationElement::Unknown`]
/// with its numeric id intact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InformationElement {
    OctetDeltaCount = 1,
    PacketDeltaCount = 2,
    DeltaFlowCount = 3,
    ProtocolIdentifier = 4,
    IpClassOfService = 5,
    TcpControlBits = 6,
    SourceTransportPort = 7,
    SourceIPv4Address = 8,
    SourceIPv4PrefixLength = 9,
    IngressInterface = 10,
    DestinationTransportPort = 11,
    DestinationIPv4Address = 12,
    DestinationIPv4PrefixLength = 13,
    EgressInterface = 14,
    IPNextHopIPv4Address = 15,
    BgpSourceAsNumber = 16,
    BgpDestinationAsNumber = 17,
    BgpNextHopIPv4Address = 18,
    PostMCastPacketDeltaCount = 19,
    PostMCastOctetDeltaCount = 20,
    FlowEndSysUpTime = 21,
    FlowStartSysUpTime = 22,
    PostOctetDeltaCount = 23,
    PostPacketDeltaCount = 24,
    MinimumIpTotalLength = 25,
    MaximumIpTotalLength = 26,
    SourceIPv6Address = 27,
    DestinationIPv6Address = 28,
    SourceIPv6PrefixLength = 29,
    DestinationIPv6PrefixLength = 30,
    FlowLabelIPv6 = 31,
    IcmpTypeCodeIPv4 = 32,
    OctetTotalCount = 85,
    PacketTotalCount = 86,
    FlowStartSeconds = 150,
    FlowEndSeconds = 151,
    FlowStartMilliseconds = 152,
    FlowEndMilliseconds = 153,
    LineCardId = 141,
    PortId = 142,
    MeteringProcessId = 143,
    ExportingProcessId = 144,
    TemplateId = 145,
    WlanChannelId = 146,
    WlanSSID = 147,
    FlowId = 148,
    ObservationDomainId = 149,
    ApplicationDescription = 94,
    ApplicationId = 95,
    ApplicationName = 96,
    ExportedMessageTotalCount = 171,
    ExportedFlowRecordTotalCount = 172,
    ExportedOctetTotalCount = 173,
    Unknown(u16),
}

impl InformationElement {
    /// `(family, canonical_length)`, advisory only — see
    /// [`crate::variable_versions::v9_lookup::FieldType::family_and_length`].
    pub fn family_and_length(self) -> (FieldFamily, Option<u16>) {
        use InformationElement::*;
        match self {
            OctetDeltaCount | PacketDeltaCount | DeltaFlowCount | PostMCastPacketDeltaCount
            | PostMCastOctetDeltaCount | PostOctetDeltaCount | PostPacketDeltaCount
            | OctetTotalCount | PacketTotalCount | ExportedOctetTotalCount
            | FlowEndSysUpTime | FlowStartSysUpTime | FlowStartSeconds | FlowEndSeconds
            | FlowStartMilliseconds | FlowEndMilliseconds | FlowId | ObservationDomainId
            | MeteringProcessId | ExportingProcessId | LineCardId => {
                (FieldFamily::UnsignedInt, Some(4))
            }
            ProtocolIdentifier | IpClassOfService | TcpControlBits => {
                (FieldFamily::UnsignedInt, Some(1))
            }
            SourceTransportPort | DestinationTransportPort | IngressInterface | EgressInterface
            | BgpSourceAsNumber | BgpDestinationAsNumber | SourceIPv4PrefixLength
            | DestinationIPv4PrefixLength | SourceIPv6PrefixLength
            | DestinationIPv6PrefixLength | IcmpTypeCodeIPv4 | MinimumIpTotalLength
            | MaximumIpTotalLength | PortId | TemplateId | WlanChannelId
            | ExportedMessageTotalCount | ExportedFlowRecordTotalCount | ApplicationId => {
                (FieldFamily::UnsignedInt, Some(2))
            }
            SourceIPv4Address | DestinationIPv4Address | IPNextHopIPv4Address
            | BgpNextHopIPv4Address => (FieldFamily::Ipv4, Some(4)),
            SourceIPv6Address | DestinationIPv6Address => (FieldFamily::Ipv6, Some(16)),
            FlowLabelIPv6 => (FieldFamily::UnsignedInt, Some(4)),
            WlanSSID | ApplicationDescription | ApplicationName => (FieldFamily::Utf8, None),
            Unknown(_) => (FieldFamily::Bytes, None),
        }
    }
}

impl From<u16> for InformationElement {
    fn from(value: u16) -> Self {
        use InformationElement::*;
        match value {
            1 => OctetDeltaCount,
            2 => PacketDeltaCount,
            3 => DeltaFlowCount,
            4 => ProtocolIdentifier,
            5 => IpClassOfService,
            6 => TcpControlBits,
            7 => SourceTransportPort,
            8 => SourceIPv4Address,
            9 => SourceIPv4PrefixLength,
            10 => IngressInterface,
            11 => DestinationTransportPort,
            12 => DestinationIPv4Address,
            13 => DestinationIPv4PrefixLength,
            14 => EgressInterface,
            15 => IPNextHopIPv4Address,
            16 => BgpSourceAsNumber,
            17 => BgpDestinationAsNumber,
            18 => BgpNextHopIPv4Address,
            19 => PostMCastPacketDeltaCount,
            20 => PostMCastOctetDeltaCount,
            21 => FlowEndSysUpTime,
            22 => FlowStartSysUpTime,
            23 => PostOctetDeltaCount,
            24 => PostPacketDeltaCount,
            25 => MinimumIpTotalLength,
            26 => MaximumIpTotalLength,
            27 => SourceIPv6Address,
            28 => DestinationIPv6Address,
            29 => SourceIPv6PrefixLength,
            30 => DestinationIPv6PrefixLength,
            31 => FlowLabelIPv6,
            32 => IcmpTypeCodeIPv4,
            85 => OctetTotalCount,
            86 => PacketTotalCount,
            94 => ApplicationDescription,
            95 => ApplicationId,
            96 => ApplicationName,
            141 => LineCardId,
            142 => PortId,
            143 => MeteringProcessId,
            144 => ExportingProcessId,
            145 => TemplateId,
            146 => WlanChannelId,
            147 => WlanSSID,
            148 => FlowId,
            149 => ObservationDomainId,
            150 => FlowStartSeconds,
            151 => FlowEndSeconds,
            152 => FlowStartMilliseconds,
            153 => FlowEndMilliseconds,
            171 => ExportedMessageTotalCount,
            172 => ExportedFlowRecordTotalCount,
            173 => ExportedOctetTotalCount,
            other => Unknown(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_packet_elements_resolve() {
        assert_eq!(
            InformationElement::SourceIPv4Address.family_and_length(),
            (FieldFamily::Ipv4, Some(4))
        );
        assert_eq!(
            InformationElement::from(171u16),
            InformationElement::ExportedMessageTotalCount
        );
    }

    #[test]
    fn unknown_element_keeps_its_number() {
        assert_eq!(InformationElement::from(40000u16), InformationElement::Unknown(40000));
    }
}
