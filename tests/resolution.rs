// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Schema resolution between writer and reader schemas: identity,
//! projection, defaults, promotions, enum remapping, unions and field
//! ordering.

use avro_codec::{
    BinaryDecoder, BinaryEncoder, Datum, Decoder, ErrorKind, GenericReader, GenericWriter,
    ResolvingDecoder, ValidSchema,
};
use pretty_assertions::assert_eq;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn encode_with(schema: &ValidSchema, datum: &Datum) -> Vec<u8> {
    let mut buffer = Vec::new();
    GenericWriter::new(schema)
        .write(datum, &mut BinaryEncoder::new(&mut buffer))
        .unwrap();
    buffer
}

fn resolve_read(writer: &str, reader: &str, datum: &Datum) -> Result<Datum, avro_codec::Error> {
    let writer = ValidSchema::parse_str(writer)?;
    let reader_schema = ValidSchema::parse_str(reader)?;
    let buffer = encode_with(&writer, datum);
    let mut decoder =
        ResolvingDecoder::new(&writer, &reader_schema, BinaryDecoder::new(&buffer[..]))?;
    GenericReader::new(&reader_schema).read(&mut decoder)
}

#[test]
fn test_identity_matches_plain_decoding() -> TestResult {
    let schema_text = r#"{"type":"record","name":"R","fields":[
        {"name":"n","type":"long"},
        {"name":"tags","type":{"type":"array","items":"string"}},
        {"name":"choice","type":["null","double"]}]}"#;
    let datum = Datum::Record(vec![
        ("n".into(), Datum::Long(-3)),
        (
            "tags".into(),
            Datum::Array(vec![Datum::String("t1".into()), Datum::String("t2".into())]),
        ),
        ("choice".into(), Datum::Union(1, Box::new(Datum::Double(0.25)))),
    ]);

    let schema = ValidSchema::parse_str(schema_text)?;
    let buffer = encode_with(&schema, &datum);
    let plain = GenericReader::new(&schema).read(&mut BinaryDecoder::new(&buffer[..]))?;
    let resolved = resolve_read(schema_text, schema_text, &datum)?;
    assert_eq!(plain, resolved);
    assert_eq!(resolved, datum);
    Ok(())
}

#[test]
fn test_projection_keeps_exact_values() -> TestResult {
    let writer = r#"{"type":"record","name":"R","fields":[
        {"name":"keep1","type":"int"},
        {"name":"drop1","type":{"type":"map","values":"string"}},
        {"name":"keep2","type":"double"},
        {"name":"drop2","type":["null","bytes"]}]}"#;
    let reader = r#"{"type":"record","name":"R","fields":[
        {"name":"keep1","type":"int"},
        {"name":"keep2","type":"double"}]}"#;
    let datum = Datum::Record(vec![
        ("keep1".into(), Datum::Int(11)),
        (
            "drop1".into(),
            Datum::Map(vec![("k".into(), Datum::String("v".into()))]),
        ),
        ("keep2".into(), Datum::Double(6.5)),
        ("drop2".into(), Datum::Union(1, Box::new(Datum::Bytes(vec![9])))),
    ]);
    assert_eq!(
        resolve_read(writer, reader, &datum)?,
        Datum::Record(vec![
            ("keep1".into(), Datum::Int(11)),
            ("keep2".into(), Datum::Double(6.5)),
        ])
    );
    Ok(())
}

#[test]
fn test_default_equals_decode_of_encoded_default() -> TestResult {
    let writer_text = r#"{"type":"record","name":"R","fields":[
        {"name":"a","type":"int"}]}"#;
    let reader_text = r#"{"type":"record","name":"R","fields":[
        {"name":"a","type":"int"},
        {"name":"b","type":"float","default":1.5},
        {"name":"m","type":{"type":"map","values":"long"},"default":{"k":3}},
        {"name":"u","type":["null","string"],"default":null}]}"#;
    let datum = Datum::Record(vec![("a".into(), Datum::Int(1))]);
    let read = resolve_read(writer_text, reader_text, &datum)?;
    assert_eq!(
        read,
        Datum::Record(vec![
            ("a".into(), Datum::Int(1)),
            ("b".into(), Datum::Float(1.5)),
            ("m".into(), Datum::Map(vec![("k".into(), Datum::Long(3))])),
            ("u".into(), Datum::Union(0, Box::new(Datum::Null))),
        ])
    );
    Ok(())
}

#[test]
fn test_all_numeric_promotions() -> TestResult {
    for (writer, reader, datum, expected) in [
        (r#""int""#, r#""long""#, Datum::Int(150), Datum::Long(150)),
        (r#""int""#, r#""float""#, Datum::Int(-2), Datum::Float(-2.0)),
        (r#""int""#, r#""double""#, Datum::Int(7), Datum::Double(7.0)),
        (r#""long""#, r#""float""#, Datum::Long(1 << 20), Datum::Float((1u32 << 20) as f32)),
        (r#""long""#, r#""double""#, Datum::Long(-9), Datum::Double(-9.0)),
        (r#""float""#, r#""double""#, Datum::Float(2.5), Datum::Double(2.5)),
    ] {
        assert_eq!(resolve_read(writer, reader, &datum)?, expected);
    }
    Ok(())
}

#[test]
fn test_promotion_inside_record() -> TestResult {
    let writer = r#"{"type":"record","name":"R","fields":[
        {"name":"v","type":"int"}]}"#;
    let reader = r#"{"type":"record","name":"R","fields":[
        {"name":"v","type":"double"}]}"#;
    let datum = Datum::Record(vec![("v".into(), Datum::Int(1000))]);
    assert_eq!(
        resolve_read(writer, reader, &datum)?,
        Datum::Record(vec![("v".into(), Datum::Double(1000.0))])
    );
    Ok(())
}

#[test]
fn test_enum_resolution() -> TestResult {
    let writer = r#"{"type":"enum","name":"E","symbols":["X","Y","Z"]}"#;
    let reader = r#"{"type":"enum","name":"E","symbols":["Y","Z"]}"#;

    // Writer writes Y (its index 1); the reader sees index 0.
    assert_eq!(resolve_read(writer, reader, &Datum::Enum(1))?, Datum::Enum(0));

    // Writer writes X, which the reader does not declare: the failure is
    // raised at decode time, not at grammar generation.
    let err = resolve_read(writer, reader, &Datum::Enum(0)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Resolution);
    Ok(())
}

#[test]
fn test_writer_union_reader_scalar() -> TestResult {
    let writer = r#"["int","string"]"#;
    let reader = r#""string""#;

    let foo = Datum::Union(1, Box::new(Datum::String("foo".into())));
    assert_eq!(
        resolve_read(writer, reader, &foo)?,
        Datum::String("foo".into())
    );

    let five = Datum::Union(0, Box::new(Datum::Int(5)));
    let err = resolve_read(writer, reader, &five).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Resolution);
    Ok(())
}

#[test]
fn test_scalar_writer_union_reader_picks_best_branch() -> TestResult {
    // Exact type match wins.
    assert_eq!(
        resolve_read(r#""string""#, r#"["null","string"]"#, &Datum::String("s".into()))?,
        Datum::Union(1, Box::new(Datum::String("s".into())))
    );
    // No exact match: the first branch the writer promotes into.
    assert_eq!(
        resolve_read(r#""int""#, r#"["string","double","float"]"#, &Datum::Int(3))?,
        Datum::Union(1, Box::new(Datum::Double(3.0)))
    );
    assert_eq!(
        resolve_read(r#""long""#, r#"["null","float"]"#, &Datum::Long(8))?,
        Datum::Union(1, Box::new(Datum::Float(8.0)))
    );
    Ok(())
}

#[test]
fn test_union_to_union_resolution() -> TestResult {
    let writer = r#"["null","int"]"#;
    let reader = r#"["null","long"]"#;
    assert_eq!(
        resolve_read(writer, reader, &Datum::Union(1, Box::new(Datum::Int(12))))?,
        Datum::Union(1, Box::new(Datum::Long(12)))
    );
    assert_eq!(
        resolve_read(writer, reader, &Datum::Union(0, Box::new(Datum::Null)))?,
        Datum::Union(0, Box::new(Datum::Null))
    );
    Ok(())
}

#[test]
fn test_field_order_follows_the_wire() -> TestResult {
    // Writer and reader list the same fields in different orders; the
    // resolving decoder reports reader indices in the writer's order.
    let writer = ValidSchema::parse_str(
        r#"{"type":"record","name":"R","fields":[
            {"name":"c","type":"string"},
            {"name":"a","type":"int"},
            {"name":"b","type":"boolean"}]}"#,
    )?;
    let reader = ValidSchema::parse_str(
        r#"{"type":"record","name":"R","fields":[
            {"name":"a","type":"int"},
            {"name":"b","type":"boolean"},
            {"name":"c","type":"string"}]}"#,
    )?;
    let datum = Datum::Record(vec![
        ("c".into(), Datum::String("see".into())),
        ("a".into(), Datum::Int(1)),
        ("b".into(), Datum::Boolean(true)),
    ]);
    let buffer = encode_with(&writer, &datum);
    let mut decoder = ResolvingDecoder::new(&writer, &reader, BinaryDecoder::new(&buffer[..]))?;
    assert_eq!(decoder.field_order()?, Some(vec![2, 0, 1]));
    assert_eq!(decoder.decode_string()?, "see");
    assert_eq!(decoder.decode_int()?, 1);
    assert!(decoder.decode_bool()?);

    // The generic reader places each value at its reader position.
    let mut decoder = ResolvingDecoder::new(&writer, &reader, BinaryDecoder::new(&buffer[..]))?;
    let read = GenericReader::new(&reader).read(&mut decoder)?;
    assert_eq!(
        read,
        Datum::Record(vec![
            ("a".into(), Datum::Int(1)),
            ("b".into(), Datum::Boolean(true)),
            ("c".into(), Datum::String("see".into())),
        ])
    );
    Ok(())
}

#[test]
fn test_spec_scenario_added_field_with_default() -> TestResult {
    let writer = ValidSchema::parse_str(
        r#"{"type":"record","name":"R","fields":[{"name":"a","type":"int"}]}"#,
    )?;
    let reader = ValidSchema::parse_str(
        r#"{"type":"record","name":"R","fields":[
            {"name":"a","type":"int"},
            {"name":"b","type":"int","default":99}]}"#,
    )?;
    let buffer = encode_with(&writer, &Datum::Record(vec![("a".into(), Datum::Int(7))]));
    let mut decoder = ResolvingDecoder::new(&writer, &reader, BinaryDecoder::new(&buffer[..]))?;
    assert_eq!(decoder.field_order()?, Some(vec![0, 1]));
    assert_eq!(decoder.decode_int()?, 7);
    assert_eq!(decoder.decode_int()?, 99);
    Ok(())
}

#[test]
fn test_missing_default_fails_generation() -> TestResult {
    let writer = ValidSchema::parse_str(
        r#"{"type":"record","name":"R","fields":[{"name":"a","type":"int"}]}"#,
    )?;
    let reader = ValidSchema::parse_str(
        r#"{"type":"record","name":"R","fields":[
            {"name":"a","type":"int"},
            {"name":"b","type":"string"}]}"#,
    )?;
    let err = ResolvingDecoder::new(&writer, &reader, BinaryDecoder::new(&[][..])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Resolution);
    Ok(())
}

#[test]
fn test_resolution_inside_containers() -> TestResult {
    let writer = r#"{"type":"map","values":{"type":"record","name":"P","fields":[
        {"name":"x","type":"int"},
        {"name":"gone","type":"string"}]}}"#;
    let reader = r#"{"type":"map","values":{"type":"record","name":"P","fields":[
        {"name":"x","type":"long"}]}}"#;
    let datum = Datum::Map(vec![
        (
            "first".into(),
            Datum::Record(vec![
                ("x".into(), Datum::Int(1)),
                ("gone".into(), Datum::String("a".into())),
            ]),
        ),
        (
            "second".into(),
            Datum::Record(vec![
                ("x".into(), Datum::Int(2)),
                ("gone".into(), Datum::String("b".into())),
            ]),
        ),
    ]);
    assert_eq!(
        resolve_read(writer, reader, &datum)?,
        Datum::Map(vec![
            ("first".into(), Datum::Record(vec![("x".into(), Datum::Long(1))])),
            ("second".into(), Datum::Record(vec![("x".into(), Datum::Long(2))])),
        ])
    );
    Ok(())
}

#[test]
fn test_recursive_record_resolution() -> TestResult {
    let writer = r#"{"type":"record","name":"Node","fields":[
        {"name":"value","type":"int"},
        {"name":"next","type":["null","Node"]}]}"#;
    let reader = r#"{"type":"record","name":"Node","fields":[
        {"name":"value","type":"long"},
        {"name":"next","type":["null","Node"]}]}"#;
    let datum = Datum::Record(vec![
        ("value".into(), Datum::Int(1)),
        (
            "next".into(),
            Datum::Union(
                1,
                Box::new(Datum::Record(vec![
                    ("value".into(), Datum::Int(2)),
                    ("next".into(), Datum::Union(0, Box::new(Datum::Null))),
                ])),
            ),
        ),
    ]);
    assert_eq!(
        resolve_read(writer, reader, &datum)?,
        Datum::Record(vec![
            ("value".into(), Datum::Long(1)),
            (
                "next".into(),
                Datum::Union(
                    1,
                    Box::new(Datum::Record(vec![
                        ("value".into(), Datum::Long(2)),
                        ("next".into(), Datum::Union(0, Box::new(Datum::Null))),
                    ])),
                ),
            ),
        ])
    );
    Ok(())
}

#[test]
fn test_fixed_resolution_requires_name_and_size() -> TestResult {
    let matching = r#"{"type":"fixed","name":"F","size":2}"#;
    assert_eq!(
        resolve_read(matching, matching, &Datum::Fixed(vec![1, 2]))?,
        Datum::Fixed(vec![1, 2])
    );

    let other_size = r#"{"type":"fixed","name":"F","size":3}"#;
    let err = resolve_read(matching, other_size, &Datum::Fixed(vec![1, 2])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Resolution);
    Ok(())
}

#[test]
fn test_incompatible_branch_fails_only_when_reached() -> TestResult {
    // string-vs-int inside a union is only an error for data that takes
    // that branch.
    let writer = r#"["string","int"]"#;
    let reader = r#""int""#;
    assert_eq!(
        resolve_read(writer, reader, &Datum::Union(1, Box::new(Datum::Int(3))))?,
        Datum::Int(3)
    );
    let err = resolve_read(
        writer,
        reader,
        &Datum::Union(0, Box::new(Datum::String("boom".into()))),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Resolution);
    Ok(())
}

#[test]
fn test_enum_default_for_added_field() -> TestResult {
    let writer = r#"{"type":"record","name":"test","fields":[
        {"name":"a","type":"long"},
        {"name":"b","type":"string"}]}"#;
    let reader = r#"{"type":"record","name":"test","fields":[
        {"name":"a","type":"long"},
        {"name":"b","type":"string"},
        {"name":"c","type":{"type":"enum","name":"suit",
            "symbols":["diamonds","spades","clubs","hearts"]},
         "default":"spades"}]}"#;
    let datum = Datum::Record(vec![
        ("a".into(), Datum::Long(27)),
        ("b".into(), Datum::String("foo".into())),
    ]);
    assert_eq!(
        resolve_read(writer, reader, &datum)?,
        Datum::Record(vec![
            ("a".into(), Datum::Long(27)),
            ("b".into(), Datum::String("foo".into())),
            ("c".into(), Datum::Enum(1)),
        ])
    );
    Ok(())
}

#[test]
fn test_record_default_for_added_field() -> TestResult {
    // The spliced default is itself a record, exercising the sub-decoder
    // across a compound value.
    let writer = r#"{"type":"record","name":"R","fields":[
        {"name":"a","type":"int"}]}"#;
    let reader = r#"{"type":"record","name":"R","fields":[
        {"name":"a","type":"int"},
        {"name":"pos","type":{"type":"record","name":"Point","fields":[
            {"name":"x","type":"int"},
            {"name":"y","type":"int"}]},
         "default":{"x":4,"y":5}}]}"#;
    let datum = Datum::Record(vec![("a".into(), Datum::Int(1))]);
    assert_eq!(
        resolve_read(writer, reader, &datum)?,
        Datum::Record(vec![
            ("a".into(), Datum::Int(1)),
            (
                "pos".into(),
                Datum::Record(vec![
                    ("x".into(), Datum::Int(4)),
                    ("y".into(), Datum::Int(5)),
                ])
            ),
        ])
    );
    Ok(())
}
