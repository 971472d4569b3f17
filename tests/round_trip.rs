//! End-to-end scenarios from the wire-format specification this crate
//! implements: the RFC 7011 §3.4.2 reference packet and the NetFlow v5
//! single-record scenario, each checked against its exact expected byte
//! lengths.

use std::net::Ipv4Addr;

use netflow_codec::protocol::ProtocolTypes;
use netflow_codec::reader::{DecodedSet, IpfixReader};
use netflow_codec::static_versions::v5;
use netflow_codec::variable_versions::common::FieldValue;
use netflow_codec::variable_versions::ipfix;
use netflow_codec::variable_versions::enterprise_registry::EnterpriseFieldRegistry;
use netflow_codec::wire::WireEncode;
use netflow_codec::writer::{IpfixWriter, WriterOptions};

fn ipv4_flow(src: [u8; 4], next_hop: [u8; 4], dst: [u8; 4], packets: u32, octets: u32) -> Vec<FieldValue> {
    vec![
        FieldValue::Ipv4(Ipv4Addr::from(src)),
        FieldValue::Ipv4(Ipv4Addr::from(dst)),
        FieldValue::Ipv4(Ipv4Addr::from(next_hop)),
        FieldValue::U32(packets),
        FieldValue::U32(octets),
    ]
}

#[test]
fn rfc7011_section_3_4_2_reference_packet_round_trips_with_exact_set_lengths() {
    let data_template = ipfix::TemplateRecord::new(
        256,
        vec![
            ipfix::FieldSpecifier::standard(8, 4),  // sourceIPv4Address
            ipfix::FieldSpecifier::standard(12, 4), // destinationIPv4Address
            ipfix::FieldSpecifier::standard(15, 4), // ipNextHopIPv4Address
            ipfix::FieldSpecifier::standard(2, 4),  // packetDeltaCount
            ipfix::FieldSpecifier::standard(1, 4),  // octetDeltaCount
        ],
    )
    .unwrap();

    let options_template = ipfix::OptionsTemplateRecord::new(
        258,
        1,
        vec![
            ipfix::FieldSpecifier::standard(141, 4), // lineCardId (scope)
            ipfix::FieldSpecifier::standard(171, 2), // exportedMessageTotalCount
            ipfix::FieldSpecifier::standard(172, 2), // exportedFlowRecordTotalCount
        ],
    )
    .unwrap();

    assert_eq!(data_template.on_wire_size(), 24);
    assert_eq!(options_template.on_wire_size(), 18);

    let data_values = [
        ipv4_flow([192, 0, 2, 12], [192, 0, 2, 1], [192, 0, 2, 254], 5009, 5344385),
        ipv4_flow([192, 0, 2, 27], [192, 0, 2, 2], [192, 0, 2, 23], 748, 388934),
        ipv4_flow([192, 0, 2, 56], [192, 0, 2, 3], [192, 0, 2, 65], 5, 6534),
    ]
    .concat();

    let options_values = vec![
        FieldValue::U32(1),
        FieldValue::U16(345),
        FieldValue::U16(10201),
        FieldValue::U32(2),
        FieldValue::U16(690),
        FieldValue::U16(20402),
    ];

    let header = ipfix::Header { length: 152, export_time: 0, sequence_number: 0, observation_domain_id: 42 };

    let mut buf = Vec::new();
    let mut writer = IpfixWriter::with_options(&mut buf, WriterOptions { leave_open: true });
    writer.write_header(&header).unwrap();
    writer.write_template_set(&[data_template.clone()]).unwrap();
    writer.write_options_template_set(&[options_template.clone()]).unwrap();
    writer.write_data_set(256, &data_values).unwrap();
    writer.write_data_set(258, &options_values).unwrap();
    writer.close();

    assert_eq!(buf.len(), 152);

    let mut reader = IpfixReader::new(buf.as_slice());
    let decoded_header = reader.read_packet_header().unwrap();
    assert_eq!(decoded_header, header);

    let template_set = reader.read_set().unwrap();
    assert!(matches!(template_set, DecodedSet::Template(ref r) if r == &[data_template.clone()]));

    let options_template_set = reader.read_set().unwrap();
    assert!(matches!(
        options_template_set,
        DecodedSet::OptionsTemplate(ref r) if r == &[options_template.clone()]
    ));

    let data_set = reader.read_set().unwrap();
    match data_set {
        DecodedSet::Data { id: 256, values } => assert_eq!(values, data_values),
        other => panic!("expected Data{{id: 256, ..}}, got {other:?}"),
    }

    let options_data_set = reader.read_set().unwrap();
    match options_data_set {
        DecodedSet::OptionsData { id: 258, values } => assert_eq!(values, options_values),
        other => panic!("expected OptionsData{{id: 258, ..}}, got {other:?}"),
    }
}

#[test]
fn netflow_v5_single_record_is_72_bytes_and_round_trips() {
    let header = v5::Header {
        count: 1,
        system_uptime_ms: 0,
        unix_seconds: 0,
        unix_nanos: 0,
        sequence_number: 0,
        engine_type: 42,
        engine_id: 43,
        sampling_interval: 12345,
    };
    let record = v5::FlowRecord {
        src: Ipv4Addr::new(10, 5, 12, 13),
        dst: Ipv4Addr::new(192, 168, 1, 12),
        next_hop: Ipv4Addr::new(10, 5, 12, 254),
        input: 741,
        output: 21478,
        packets: 5009,
        octets: 5344385,
        start: 369,
        end: 963,
        src_port: 80,
        dst_port: 81,
        tcp_flags: 12,
        proto: ProtocolTypes::TCP,
        tos: 33,
        src_as: 12,
        dst_as: 13,
        src_mask: 8,
        dst_mask: 16,
    };
    let packet = v5::Packet { header, records: vec![record] };

    let mut buf = Vec::new();
    packet.encode(&mut buf).unwrap();
    assert_eq!(buf.len(), 72);

    use netflow_codec::wire::WireDecode;
    let decoded = v5::Packet::decode(&mut buf.as_slice()).unwrap();
    assert_eq!(v5::Packet { header, records: vec![record] }, decoded);
}

#[test]
fn enterprise_field_specifier_round_trips_and_is_found_via_registry() {
    use netflow_codec::variable_versions::enterprise_registry::EnterpriseFieldDef;
    use netflow_codec::variable_versions::common::FieldFamily;

    let spec = ipfix::FieldSpecifier::enterprise(12, 24, 42);
    assert_eq!(spec.on_wire_size(), 8);
    let mut buf = Vec::new();
    spec.encode(&mut buf).unwrap();
    assert_eq!(buf[0] & 0x80, 0x80);
    assert_eq!(buf.len(), 8);

    let template = ipfix::TemplateRecord::new(300, vec![spec]).unwrap();
    let mut registry = EnterpriseFieldRegistry::new();
    registry.register(EnterpriseFieldDef::new(42, 12, "enterpriseThing", FieldFamily::Bytes));

    let mut body = Vec::new();
    body.extend_from_slice(&[0xAA; 24]);
    let values =
        ipfix::decode_data_records(&mut body.as_slice(), &template, 24, &registry).unwrap();
    assert_eq!(values, vec![FieldValue::Bytes(vec![0xAA; 24])]);
}
