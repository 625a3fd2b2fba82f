use pretty_assertions::assert_eq;
use test_case::test_case;
use wow_cdbc::{DbcFile, DbcHeader, DbcWriter, Error, FlagTable, MapEntry, Value, read_maps};

fn area_table() -> Vec<u8> {
    let mut writer = DbcWriter::new(5);
    for (id, flags) in [(12u32, 0x40u32), (1519, 0x3D), (40, 0x0)] {
        writer
            .push_record(&[
                Value::UInt32(id),
                Value::UInt32(0),
                Value::UInt32(0),
                Value::UInt32(flags),
                "unused".into(),
            ])
            .unwrap();
    }
    writer.to_bytes().unwrap()
}

#[test]
fn maps_are_sorted_with_directories() {
    let mut writer = DbcWriter::new(3);
    writer
        .push_record(&[Value::UInt32(1), "Kalimdor".into(), Value::Float32(1.5)])
        .unwrap();
    writer
        .push_record(&[Value::UInt32(0), "Azeroth".into(), Value::Int32(-1)])
        .unwrap();
    let bytes = writer.to_bytes().unwrap();
    let dbc = DbcFile::parse(&bytes).unwrap();

    assert_eq!(
        read_maps(&dbc).unwrap(),
        vec![
            MapEntry {
                id: 0,
                directory: "Azeroth".to_string()
            },
            MapEntry {
                id: 1,
                directory: "Kalimdor".to_string()
            },
        ]
    );
    assert_eq!(dbc.record(0).unwrap().get_f32(2).unwrap(), 1.5);
    assert_eq!(dbc.record(1).unwrap().get_i32(2).unwrap(), -1);
}

#[test]
fn area_flags_by_id() {
    let bytes = area_table();
    let dbc = DbcFile::parse(&bytes).unwrap();
    let areas = FlagTable::area_table(&dbc).unwrap();
    assert_eq!(areas.len(), 3);
    assert_eq!(areas.get(1519), Some(0x3D));
    assert_eq!(areas.get(13), None);
    assert_eq!(areas.max_id(), 1519);
}

#[test]
fn strings_are_shared() {
    let mut writer = DbcWriter::new(2);
    writer.push_record(&[Value::UInt32(1), "same".into()]).unwrap();
    writer.push_record(&[Value::UInt32(2), "same".into()]).unwrap();
    writer.push_record(&[Value::UInt32(3), "".into()]).unwrap();
    let bytes = writer.to_bytes().unwrap();
    let dbc = DbcFile::parse(&bytes).unwrap();
    assert_eq!(dbc.header().string_block_size, 6);
    assert_eq!(dbc.record(2).unwrap().get_u32(1).unwrap(), 0);
}

#[test]
fn record_size_must_match_field_count() {
    let mut bytes = area_table();
    bytes[12..16].copy_from_slice(&24u32.to_le_bytes());
    assert!(matches!(DbcFile::parse(&bytes), Err(Error::InvalidHeader(_))));
}

#[test_case(0 ; "empty")]
#[test_case(19 ; "short header")]
#[test_case(60 ; "records cut")]
fn truncated_files_are_rejected(len: usize) {
    let bytes = area_table();
    let err = DbcFile::parse(&bytes[..len]).unwrap_err();
    assert!(err.is_format_error());
}

#[test]
fn bad_magic() {
    let mut bytes = area_table();
    bytes[..4].copy_from_slice(b"WDB2");
    assert!(matches!(DbcFile::parse(&bytes), Err(Error::InvalidHeader(_))));
}

#[test]
fn out_of_range_access() {
    let bytes = area_table();
    let dbc = DbcFile::parse(&bytes).unwrap();
    assert!(matches!(dbc.record(3), Err(Error::OutOfBounds(_))));
    assert!(matches!(
        dbc.record(0).unwrap().get_u32(5),
        Err(Error::InvalidRecord(_))
    ));
    assert_eq!(dbc.records().count(), 3);
    assert_eq!(bytes.len() as u64, dbc.header().total_size());
    assert_eq!(DbcHeader::SIZE, 20);
}

#[test]
fn writer_checks_arity() {
    let mut writer = DbcWriter::new(2);
    assert!(writer.push_record(&[Value::UInt32(1)]).is_err());
}
