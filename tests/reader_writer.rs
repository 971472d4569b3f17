//! Reader/writer state-machine edge cases and the template-replacement and
//! cross-observation-domain isolation scenarios.

use std::io::Cursor;
use std::net::Ipv4Addr;

use netflow_codec::error::NetflowError;
use netflow_codec::reader::{DecodedSet, V9Reader};
use netflow_codec::variable_versions::common::FieldValue;
use netflow_codec::variable_versions::v9;
use netflow_codec::writer::{V9Writer, WriterOptions};

fn template_set_bytes(template: &v9::TemplateRecord) -> Vec<u8> {
    use netflow_codec::wire::WireEncode;
    let mut body = Vec::new();
    template.encode(&mut body).unwrap();
    let mut out = Vec::new();
    netflow_codec::byteorder::write_u16(&mut out, v9::TEMPLATE_SET_ID).unwrap();
    netflow_codec::byteorder::write_u16(&mut out, (4 + body.len()) as u16).unwrap();
    out.extend_from_slice(&body);
    out
}

fn data_set_bytes(id: u16, values: &[FieldValue]) -> Vec<u8> {
    let mut body = Vec::new();
    v9::encode_records(&mut body, values).unwrap();
    let mut out = Vec::new();
    netflow_codec::byteorder::write_u16(&mut out, id).unwrap();
    netflow_codec::byteorder::write_u16(&mut out, (4 + body.len()) as u16).unwrap();
    out.extend_from_slice(&body);
    out
}

/// A later template with the same id replaces the earlier one: a data set
/// decoded afterward uses the new field list, not the old one (last-write-wins,
/// no versioning).
#[test]
fn same_template_id_replaces_the_earlier_template_within_one_domain() {
    use netflow_codec::wire::WireEncode;

    let narrow = v9::TemplateRecord::new(256, vec![v9::Field { type_id: 8, length: 4 }]).unwrap();
    let wide = v9::TemplateRecord::new(
        256,
        vec![v9::Field { type_id: 8, length: 4 }, v9::Field { type_id: 2, length: 4 }],
    )
    .unwrap();

    // One packet: the narrow template, then the wide template, then a data
    // set matching the wide shape.
    let header = v9::Header { count: 3, system_uptime_ms: 0, unix_seconds: 0, sequence_number: 0, source_id: 1 };
    let mut stream = Vec::new();
    header.encode(&mut stream).unwrap();
    stream.extend(template_set_bytes(&narrow));
    stream.extend(template_set_bytes(&wide));
    stream.extend(data_set_bytes(256, &[FieldValue::Ipv4(Ipv4Addr::new(1, 2, 3, 4)), FieldValue::U32(99)]));

    let mut reader = V9Reader::new(Cursor::new(stream));
    reader.read_packet_header().unwrap();

    let first = reader.read_set().unwrap();
    assert!(matches!(first, DecodedSet::Template(ref r) if r[0].field_count() == 1));
    assert_eq!(reader.templates().get_template(1, 256).unwrap().field_count(), 1);

    let second = reader.read_set().unwrap();
    assert!(matches!(second, DecodedSet::Template(ref r) if r[0].field_count() == 2));
    assert_eq!(reader.templates().get_template(1, 256).unwrap().field_count(), 2);

    let data_set = reader.read_set().unwrap();
    match data_set {
        DecodedSet::Data { id: 256, values } => {
            assert_eq!(values, vec![FieldValue::Ipv4(Ipv4Addr::new(1, 2, 3, 4)), FieldValue::U32(99)]);
        }
        other => panic!("expected Data{{id: 256, ..}}, got {other:?}"),
    }
}

#[test]
fn templates_registered_for_one_observation_domain_are_invisible_to_another() {
    let template = v9::TemplateRecord::new(256, vec![v9::Field { type_id: 8, length: 4 }]).unwrap();
    let mut registry: netflow_codec::reader::TemplateRegistry<v9::TemplateRecord, v9::OptionsTemplateRecord> =
        netflow_codec::reader::TemplateRegistry::new();
    registry.register_template(1, 256, template);

    use netflow_codec::wire::WireEncode;
    let header_domain_2 = v9::Header { count: 1, system_uptime_ms: 0, unix_seconds: 0, sequence_number: 0, source_id: 2 };
    let mut stream = Vec::new();
    header_domain_2.encode(&mut stream).unwrap();
    stream.extend(data_set_bytes(256, &[FieldValue::Ipv4(Ipv4Addr::new(9, 9, 9, 9))]));

    let mut reader = V9Reader::with_options(
        Cursor::new(stream),
        netflow_codec::reader::ReaderOptions { leave_open: false, known_templates: Some(registry) },
    );
    reader.read_packet_header().unwrap();
    let err = reader.read_set().unwrap_err();
    assert!(matches!(err, NetflowError::MissingTemplate { observation_domain_id: 2, template_id: 256 }));
}

#[test]
fn writer_refuses_a_set_before_the_header_in_expect_header() {
    let mut writer = V9Writer::new(Vec::<u8>::new());
    let err = writer.write_data_set(256, &[]).unwrap_err();
    assert!(matches!(err, NetflowError::StateViolation(_)));
}

#[test]
fn writer_refuses_a_second_header_while_in_expect_sets() {
    let header = v9::Header { count: 1, system_uptime_ms: 0, unix_seconds: 0, sequence_number: 0, source_id: 1 };
    let mut writer = V9Writer::new(Vec::<u8>::new());
    writer.write_header(&header).unwrap();
    let err = writer.write_header(&header).unwrap_err();
    assert!(matches!(err, NetflowError::StateViolation(_)));
}

#[test]
fn writer_refuses_any_write_once_done() {
    let header = v9::Header { count: 1, system_uptime_ms: 0, unix_seconds: 0, sequence_number: 0, source_id: 1 };
    let template = v9::TemplateRecord::new(256, vec![v9::Field { type_id: 8, length: 4 }]).unwrap();
    let mut writer = V9Writer::with_options(Vec::<u8>::new(), WriterOptions { leave_open: false });
    writer.write_header(&header).unwrap();
    writer.write_template_set(&[template]).unwrap();

    let header_err = writer.write_header(&header).unwrap_err();
    assert!(matches!(header_err, NetflowError::StateViolation(_)));
    let set_err = writer.write_data_set(256, &[]).unwrap_err();
    assert!(matches!(set_err, NetflowError::StateViolation(_)));
}

#[test]
fn reader_refuses_read_set_before_any_header_and_read_header_while_mid_sets() {
    let header = v9::Header { count: 1, system_uptime_ms: 0, unix_seconds: 0, sequence_number: 0, source_id: 1 };
    use netflow_codec::wire::WireEncode;
    let mut stream = Vec::new();
    header.encode(&mut stream).unwrap();
    let mut reader = V9Reader::new(Cursor::new(stream));

    reader.read_packet_header().unwrap();
    let err = reader.read_packet_header().unwrap_err();
    assert!(matches!(err, NetflowError::StateViolation(_)));
}
