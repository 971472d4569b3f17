//! Component C (v9 half): the static registry mapping a NetFlow v9
//! `FieldType` number to its canonical byte length and decode family.
//!
//! `Field.type_id` (§3) stays a plain `u16` on the wire — this table exists
//! purely so the reader can pick a decode candidate for it (§4.C). Vendor
//! field numbers not listed here fall back to [`FieldType::Unknown`], which
//! still carries the numeric id so it round-trips instead of being thrown
//! away.

use serde::{Deserialize, Serialize};

use crate::variable_versions::common::FieldFamily;

/// The "scope" of an options-template scope field (§3, `Scope`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    System,
    Interface,
    LineCard,
    NetFlowCache,
    Template,
    Unknown(u16),
}

impl Scope {
    pub fn to_u16(self) -> u16 {
        match self {
            Scope::System => 1,
            Scope::Interface => 2,
            Scope::LineCard => 3,
            Scope::NetFlowCache => 4,
            Scope::Template => 5,
            Scope::Unknown(v) => v,
        }
    }
}

impl From<u16> for Scope {
    fn from(value: u16) -> Self {
        match value {
            1 => Scope::System,
            2 => Scope::Interface,
            3 => Scope::LineCard,
            4 => Scope::NetFlowCache,
            5 => Scope::Template,
            other => Scope::Unknown(other),
        }
    }
}

/// A Cisco NetFlow v9 field type (RFC 3954 §8). Named variants cover the
/// fields commonly seen on the wire; anything else is preserved as
/// [`FieldType::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    InBytes = 1,
    InPkts = 2,
    Flows = 3,
    Protocol = 4,
    SrcTos = 5,
    TcpFlags = 6,
    L4SrcPort = 7,
    Ipv4SrcAddr = 8,
    SrcMask = 9,
    InputSnmp = 10,
    L4DstPort = 11,
    Ipv4DstAddr = 12,
    DstMask = 13,
    OutputSnmp = 14,
    Ipv4NextHop = 15,
    SrcAs = 16,
    DstAs = 17,
    BgpIpv4NextHop = 18,
    MulDstPkts = 19,
    MulDstBytes = 20,
    LastSwitched = 21,
    FirstSwitched = 22,
    OutBytes = 23,
    OutPkts = 24,
    MinPktLength = 25,
    MaxPktLength = 26,
    Ipv6SrcAddr = 27,
    Ipv6DstAddr = 28,
    Ipv6SrcMask = 29,
    Ipv6DstMask = 30,
    Ipv6FlowLabel = 31,
    IcmpType = 32,
    SamplingInterval = 34,
    SamplingAlgorithm = 35,
    FlowActiveTimeout = 36,
    FlowInactiveTimeout = 37,
    EngineType = 38,
    EngineId = 39,
    TotalBytesExp = 40,
    TotalPktsExp = 41,
    TotalFlowsExp = 42,
    Ipv4SrcPrefix = 44,
    Ipv4DstPrefix = 45,
    MplsTopLabelType = 46,
    MplsTopLabelIpAddr = 47,
    FlowSamplerId = 48,
    FlowSamplerMode = 49,
    FlowSamplerRandomInterval = 50,
    MinTtl = 52,
    MaxTtl = 53,
    Ipv4Ident = 54,
    DstTos = 55,
    InSrcMac = 56,
    OutDstMac = 57,
    SrcVlan = 58,
    DstVlan = 59,
    IpProtocolVersion = 60,
    Direction = 61,
    Ipv6NextHop = 62,
    BgpIpv6NextHop = 63,
    Ipv6OptionHeaders = 64,
    MplsLabel1 = 70,
    MplsLabel2 = 71,
    MplsLabel3 = 72,
    InDstMac = 80,
    OutSrcMac = 81,
    Ipv4NetMask = 98,
    ApplicationDescription = 94,
    ApplicationTag = 95,
    ApplicationName = 96,
    WlanSsid = 147,
    Unknown(u16),
}

impl FieldType {
    /// `(family, canonical_length)`. `canonical_length` is advisory — the
    /// decoder always picks the concrete width from the *observed*
    /// template-declared length via [`FieldFamily::candidate_for_length`].
    pub fn family_and_length(self) -> (FieldFamily, Option<u16>) {
        use FieldType::*;
        match self {
            InBytes | InPkts | Flows | OutBytes | OutPkts | TotalBytesExp | TotalPktsExp
            | TotalFlowsExp | MulDstPkts | MulDstBytes => (FieldFamily::UnsignedInt, Some(4)),
            Protocol | SrcTos | TcpFlags | IcmpType | SrcMask | DstMask | EngineType | EngineId
            | SamplingAlgorithm | DstTos | Direction | IpProtocolVersion | MplsTopLabelType
            | Ipv6SrcMask | Ipv6DstMask | MinTtl | MaxTtl | FlowSamplerMode => {
                (FieldFamily::UnsignedInt, Some(1))
            }
            L4SrcPort | L4DstPort | InputSnmp | OutputSnmp | SrcAs | DstAs | MinPktLength
            | MaxPktLength | SrcVlan | DstVlan | FlowSamplerId | FlowSamplerRandomInterval
            | WlanSsid => (FieldFamily::UnsignedInt, Some(2)),
            Ipv4SrcAddr | Ipv4DstAddr | Ipv4NextHop | BgpIpv4NextHop | MplsTopLabelIpAddr
            | Ipv4NetMask => (FieldFamily::Ipv4, Some(4)),
            Ipv6SrcAddr | Ipv6DstAddr | Ipv6NextHop | BgpIpv6NextHop => {
                (FieldFamily::Ipv6, Some(16))
            }
            LastSwitched | FirstSwitched | SamplingInterval | FlowActiveTimeout
            | FlowInactiveTimeout | Ipv4Ident | Ipv6FlowLabel | MplsLabel1 | MplsLabel2
            | MplsLabel3 | Ipv4SrcPrefix | Ipv4DstPrefix | Ipv6OptionHeaders => {
                (FieldFamily::UnsignedInt, Some(4))
            }
            InSrcMac | OutDstMac | InDstMac | OutSrcMac => (FieldFamily::Bytes, Some(6)),
            ApplicationDescription | ApplicationTag | ApplicationName => (FieldFamily::Utf8, None),
            Unknown(_) => (FieldFamily::Bytes, None),
        }
    }
}

impl From<u16> for FieldType {
    fn from(value: u16) -> Self {
        use FieldType::*;
        match value {
            1 => InBytes,
            2 => InPkts,
            3 => Flows,
            4 => Protocol,
            5 => SrcTos,
            6 => TcpFlags,
            7 => L4SrcPort,
            8 => Ipv4SrcAddr,
            9 => SrcMask,
            10 => InputSnmp,
            11 => L4DstPort,
            12 => Ipv4DstAddr,
            13 => DstMask,
            14 => OutputSnmp,
            15 => Ipv4NextHop,
            16 => SrcAs,
            17 => DstAs,
            18 => BgpIpv4NextHop,
            19 => MulDstPkts,
            20 => MulDstBytes,
            21 => LastSwitched,
            22 => FirstSwitched,
            23 => OutBytes,
            24 => OutPkts,
            25 => MinPktLength,
            26 => MaxPktLength,
            27 => Ipv6SrcAddr,
            28 => Ipv6DstAddr,
            29 => Ipv6SrcMask,
            30 => Ipv6DstMask,
            31 => Ipv6FlowLabel,
            32 => IcmpType,
            34 => SamplingInterval,
            35 => SamplingAlgorithm,
            36 => FlowActiveTimeout,
            37 => FlowInactiveTimeout,
            38 => EngineType,
            39 => EngineId,
            40 => TotalBytesExp,
            41 => TotalPktsExp,
            42 => TotalFlowsExp,
            44 => Ipv4SrcPrefix,
            45 => Ipv4DstPrefix,
            46 => MplsTopLabelType,
            47 => MplsTopLabelIpAddr,
            48 => FlowSamplerId,
            49 => FlowSamplerMode,
            50 => FlowSamplerRandomInterval,
            52 => MinTtl,
            53 => MaxTtl,
            54 => Ipv4Ident,
            55 => DstTos,
            56 => InSrcMac,
            57 => OutDstMac,
            58 => SrcVlan,
            59 => DstVlan,
            60 => IpProtocolVersion,
            61 => Direction,
            62 => Ipv6NextHop,
            63 => BgpIpv6NextHop,
            64 => Ipv6OptionHeaders,
            70 => MplsLabel1,
            71 => MplsLabel2,
            72 => MplsLabel3,
            80 => InDstMac,
            81 => OutSrcMac,
            94 => ApplicationDescription,
            95 => ApplicationTag,
            96 => ApplicationName,
            98 => Ipv4NetMask,
            147 => WlanSsid,
            other => Unknown(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_field_round_trips_through_u16() {
        assert_eq!(FieldType::from(8u16), FieldType::Ipv4SrcAddr);
        assert_eq!(
            FieldType::Ipv4SrcAddr.family_and_length(),
            (FieldFamily::Ipv4, Some(4))
        );
    }

    #[test]
    fn unknown_field_keeps_its_number() {
        assert_eq!(FieldType::from(9001u16), FieldType::Unknown(9001));
    }

    #[test]
    fn scope_round_trips() {
        assert_eq!(Scope::from(3u16), Scope::LineCard);
        assert_eq!(Scope::LineCard.to_u16(), 3);
        assert_eq!(Scope::from(999u16), Scope::Unknown(999));
    }
}
