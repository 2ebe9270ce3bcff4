use std::io::Cursor;

use super::builder::Builder;
use crate::error::{Error, Result};
use crate::{Compound, Compression, NbtReader, NbtWriter, Tag, Value};

fn reader_for(bytes: Vec<u8>) -> NbtReader<Cursor<Vec<u8>>> {
    NbtReader::open(Cursor::new(bytes), Compression::None).unwrap()
}

fn to_bytes(name: &str, value: &Value) -> Result<Vec<u8>> {
    let mut writer = NbtWriter::open(Vec::new(), false);
    writer.write_tree(name, value)?;
    writer.finish()
}

#[test]
fn hello_world_compound() -> Result<()> {
    // Compound "hello" { String "name" = "Banana" }
    let bytes = vec![
        0x0A, 0x00, 0x05, b'h', b'e', b'l', b'l', b'o', // Compound "hello"
        0x08, 0x00, 0x04, b'n', b'a', b'm', b'e', // String "name"
        0x00, 0x06, b'B', b'a', b'n', b'a', b'n', b'a', // "Banana"
        0x00, // End
    ];

    let root = reader_for(bytes.clone()).read_tree(true)?;
    assert_eq!(root.name.as_deref(), Some("hello"));

    let compound = root.value.as_compound().unwrap();
    assert_eq!(compound.len(), 1);
    assert_eq!(
        compound.get("name"),
        Some(&Value::String("Banana".to_owned()))
    );

    // Writing the decoded tree back must produce the identical bytes.
    assert_eq!(to_bytes("hello", &root.value)?, bytes);
    Ok(())
}

#[test]
fn empty_list_roundtrip() -> Result<()> {
    // List named "", content kind End, length 0.
    let bytes = vec![0x09, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];

    let root = reader_for(bytes.clone()).read_tree(true)?;
    assert_eq!(root.name.as_deref(), Some(""));
    assert_eq!(root.value, Value::List(Tag::End, vec![]));

    assert_eq!(to_bytes("", &root.value)?, bytes);
    Ok(())
}

#[test]
fn empty_list_with_int8_content_kind_is_preserved() -> Result<()> {
    // Some encoders write (Int8, 0) for empty lists; re-emitting must not
    // rewrite the content byte.
    let bytes = Builder::new().start_list("", Tag::Int8, 0).build();

    let root = reader_for(bytes.clone()).read_tree(true)?;
    assert_eq!(root.value, Value::List(Tag::Int8, vec![]));
    assert_eq!(to_bytes("", &root.value)?, bytes);
    Ok(())
}

#[test]
fn all_kinds_roundtrip() -> Result<()> {
    let mut inner = Compound::new();
    inner.insert("x", 42i32);
    inner.insert("y", 7i32);

    let mut root = Compound::new();
    root.insert("int8", -5i8);
    root.insert("int16", 1234i16);
    root.insert("int32", 50345i32);
    root.insert("int64", i32::MAX as i64 + 1);
    root.insert("float32", 1.23f32);
    root.insert("float64", 1.23456f64);
    root.insert("string", "something");
    root.insert("bytes", vec![1i8, -2, 3]);
    root.insert("ints", vec![1i32, -2, 3]);
    root.insert("longs", vec![1i64, -2, i64::MIN, i64::MAX]);
    root.insert(
        "list",
        Value::List(
            Tag::Int32,
            vec![Value::Int32(1), Value::Int32(2), Value::Int32(3)],
        ),
    );
    root.insert("nested", inner);
    let root = Value::Compound(root);

    let bytes = to_bytes("", &root)?;
    let decoded = reader_for(bytes.clone()).read_tree(true)?;
    assert_eq!(decoded.value, root);

    // And the second encoding is byte-identical.
    assert_eq!(to_bytes("", &decoded.value)?, bytes);
    Ok(())
}

#[test]
fn list_of_compounds_roundtrip() -> Result<()> {
    let bytes = Builder::new()
        .start_compound("")
        .start_list("things", Tag::Compound, 2)
        .int8("a", 1)
        .end_compound()
        .int8("b", 2)
        .end_compound()
        .end_compound()
        .build();

    let root = reader_for(bytes.clone()).read_tree(true)?;
    let things = root.value.as_compound().unwrap().get("things").unwrap();
    match things {
        Value::List(Tag::Compound, items) => assert_eq!(items.len(), 2),
        other => panic!("expected list of compounds, got {:?}", other),
    }

    assert_eq!(to_bytes("", &root.value)?, bytes);
    Ok(())
}

#[test]
fn int32_is_big_endian_on_the_wire() -> Result<()> {
    let bytes = to_bytes("n", &Value::Int32(0x01020304))?;
    assert_eq!(
        bytes,
        vec![0x03, 0x00, 0x01, b'n', 0x01, 0x02, 0x03, 0x04]
    );
    Ok(())
}

#[test]
fn unnamed_root_roundtrip() -> Result<()> {
    let mut writer = NbtWriter::open(Vec::new(), false);
    writer.write_bare_tree(&Value::Int16(-300))?;
    let bytes = writer.finish()?;
    assert_eq!(bytes, vec![0x02, 0xFE, 0xD4]);

    let root = reader_for(bytes).read_tree(false)?;
    assert_eq!(root.name, None);
    assert_eq!(root.value, Value::Int16(-300));
    Ok(())
}

#[test]
fn duplicate_compound_name_fails() {
    let bytes = Builder::new()
        .start_compound("")
        .int32("x", 1)
        .int32("x", 2)
        .end_compound()
        .build();

    let err = reader_for(bytes).read_tree(true).unwrap_err();
    assert!(matches!(err, Error::DuplicateName(name) if name == "x"));
}

#[test]
fn end_content_list_with_nonzero_length_fails() {
    let bytes = Builder::new().start_list("", Tag::End, 1).build();
    let err = reader_for(bytes).read_tree(true).unwrap_err();
    assert!(matches!(err, Error::ListContentMismatch));
}

#[test]
fn unknown_tag_kind_fails() {
    let bytes = Builder::new().raw_bytes(&[13, 0, 0]).build();
    let err = reader_for(bytes).read_tree(true).unwrap_err();
    assert!(matches!(err, Error::InvalidTagKind(13)));
}

#[test]
fn end_tag_as_root_fails() {
    let bytes = Builder::new().tag(Tag::End).build();
    let err = reader_for(bytes).read_tree(true).unwrap_err();
    assert!(matches!(err, Error::Format(_)));
}

#[test]
fn negative_array_length_fails() {
    let bytes = Builder::new()
        .tag(Tag::Int32Array)
        .name("a")
        .int32_payload(-1)
        .build();
    let err = reader_for(bytes).read_tree(true).unwrap_err();
    assert!(matches!(err, Error::ValueOutOfRange(_)));
}

#[test]
fn negative_list_length_fails() {
    let bytes = Builder::new().start_list("", Tag::Int8, -4).build();
    let err = reader_for(bytes).read_tree(true).unwrap_err();
    assert!(matches!(err, Error::ValueOutOfRange(_)));
}

#[test]
fn truncated_stream_fails_with_unexpected_end() {
    let bytes = Builder::new()
        .tag(Tag::Int64)
        .name("n")
        .int32_payload(1) // only four of the eight payload bytes
        .build();
    let err = reader_for(bytes).read_tree(true).unwrap_err();
    assert!(matches!(err, Error::UnexpectedEnd));
}

#[test]
fn write_refuses_heterogeneous_list() {
    let list = Value::List(Tag::Int32, vec![Value::Int32(1), Value::Int8(2)]);
    let err = to_bytes("", &list).unwrap_err();
    assert!(matches!(err, Error::ListContentMismatch));
}

#[test]
fn write_refuses_end_content_list_with_elements() {
    let list = Value::List(Tag::End, vec![Value::Int8(1)]);
    let err = to_bytes("", &list).unwrap_err();
    assert!(matches!(err, Error::ListContentMismatch));
}

#[test]
fn write_refuses_oversized_string() {
    // 66,000 ASCII bytes encode 1:1, past the u16 length prefix.
    let long = "a".repeat(66_000);
    let err = to_bytes("", &Value::String(long)).unwrap_err();
    assert!(matches!(err, Error::ValueOutOfRange(_)));
}

#[test]
fn oversized_name_also_refused() {
    let long = "a".repeat(66_000);
    let err = to_bytes(&long, &Value::Int8(1)).unwrap_err();
    assert!(matches!(err, Error::ValueOutOfRange(_)));
}

#[test]
fn invalid_string_bytes_fail_with_invalid_encoding() {
    let bytes = Builder::new()
        .tag(Tag::String)
        .name("s")
        .raw_str_len(3)
        .raw_bytes(&[0xFF, 0xFF, 0xFF])
        .build();
    let err = reader_for(bytes).read_tree(true).unwrap_err();
    assert!(matches!(err, Error::InvalidEncoding(_)));
}

#[test]
fn builder_and_writer_agree() -> Result<()> {
    let bytes = Builder::new()
        .start_compound("")
        .int16("i16", -2)
        .int64_array("longs", &[1, -1])
        .end_compound()
        .build();

    let mut c = Compound::new();
    c.insert("i16", -2i16);
    c.insert("longs", vec![1i64, -1]);
    assert_eq!(to_bytes("", &Value::Compound(c))?, bytes);
    Ok(())
}

#[test]
fn compound_insert_replaces_in_place() {
    let mut c = Compound::new();
    c.insert("a", 1i8);
    c.insert("b", 2i8);
    let old = c.insert("a", 3i8);

    assert_eq!(old, Some(Value::Int8(1)));
    assert_eq!(c.len(), 2);
    let names: Vec<_> = c.iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert_eq!(c.get("a"), Some(&Value::Int8(3)));
}

#[test]
fn list_of_helper_enforces_homogeneity() {
    assert_eq!(Value::list_of(vec![]), Some(Value::List(Tag::End, vec![])));
    assert_eq!(
        Value::list_of(vec![Value::Int8(1), Value::Int8(2)]),
        Some(Value::List(Tag::Int8, vec![Value::Int8(1), Value::Int8(2)]))
    );
    assert_eq!(Value::list_of(vec![Value::Int8(1), Value::Int16(2)]), None);
}
