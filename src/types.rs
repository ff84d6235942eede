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

//! The dynamically typed value representation.

use crate::{
    AvroResult,
    schema::{Names, Schema, resolve_ref},
};
use strum::{Display, EnumDiscriminants};

/// A dynamically typed value carrying its own Avro type tag.
///
/// `Datum` is the value form used by [`GenericReader`](crate::GenericReader)
/// and [`GenericWriter`](crate::GenericWriter); the schema travels
/// separately.
///
/// Equality is structural, with floats and doubles compared **bit-wise**
/// (`to_bits`): NaN payloads and the sign of zero are significant. This is
/// the equality under which a binary round-trip reproduces its input
/// exactly. Map entries keep the order in which they were inserted, but
/// two maps compare equal whenever their key sets and values match.
#[derive(Clone, Debug, EnumDiscriminants, Display)]
#[strum_discriminants(name(DatumKind), derive(Display, Hash, Ord, PartialOrd))]
pub enum Datum {
    /// A `null` value.
    Null,
    /// A `boolean` value.
    Boolean(bool),
    /// A 32-bit signed `int`.
    Int(i32),
    /// A 64-bit signed `long`.
    Long(i64),
    /// A `float` single-precision value.
    Float(f32),
    /// A `double` double-precision value.
    Double(f64),
    /// A sequence of bytes.
    Bytes(Vec<u8>),
    /// A UTF-8 string.
    String(String),
    /// A `fixed` value; the length is declared by its schema.
    Fixed(Vec<u8>),
    /// An `enum` value as the index into the schema's symbol list.
    Enum(usize),
    /// A `union` value: the selected branch index and the value itself.
    Union(usize, Box<Datum>),
    /// An `array` of homogeneously typed values.
    Array(Vec<Datum>),
    /// A `map` of string keys to homogeneously typed values, in insertion
    /// order.
    Map(Vec<(String, Datum)>),
    /// A `record`: one (field name, value) pair per field, in schema order.
    Record(Vec<(String, Datum)>),
}

impl Datum {
    /// Construct a datum conforming to `schema`, initialized to the
    /// per-type default: zero for numbers, empty for strings, bytes and
    /// containers, symbol 0 for enums, branch 0 for unions (recursively
    /// defaulted), zero-filled for fixed, and recursively defaulted
    /// fields for records.
    pub fn from_schema(schema: &Schema, names: &Names) -> AvroResult<Datum> {
        let schema = resolve_ref(schema, names)?;
        Ok(match schema {
            Schema::Null => Datum::Null,
            Schema::Boolean => Datum::Boolean(false),
            Schema::Int => Datum::Int(0),
            Schema::Long => Datum::Long(0),
            Schema::Float => Datum::Float(0.0),
            Schema::Double => Datum::Double(0.0),
            Schema::Bytes => Datum::Bytes(Vec::new()),
            Schema::String => Datum::String(String::new()),
            Schema::Fixed(fixed) => Datum::Fixed(vec![0; fixed.size]),
            Schema::Enum(_) => Datum::Enum(0),
            Schema::Array(_) => Datum::Array(Vec::new()),
            Schema::Map(_) => Datum::Map(Vec::new()),
            Schema::Union(union) => {
                let first = union
                    .variants()
                    .first()
                    .expect("unions have at least one branch");
                Datum::Union(0, Box::new(Datum::from_schema(first, names)?))
            }
            Schema::Record(record) => {
                let mut fields = Vec::with_capacity(record.fields.len());
                for field in &record.fields {
                    fields.push((field.name.clone(), Datum::from_schema(&field.schema, names)?));
                }
                Datum::Record(fields)
            }
            Schema::Ref { .. } => unreachable!("references are resolved above"),
        })
    }

    /// The field of a record datum, by name.
    pub fn field(&self, name: &str) -> Option<&Datum> {
        match self {
            Datum::Record(fields) => fields
                .iter()
                .find(|(field_name, _)| field_name == name)
                .map(|(_, datum)| datum),
            _ => None,
        }
    }
}

impl PartialEq for Datum {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Datum::Null, Datum::Null) => true,
            (Datum::Boolean(a), Datum::Boolean(b)) => a == b,
            (Datum::Int(a), Datum::Int(b)) => a == b,
            (Datum::Long(a), Datum::Long(b)) => a == b,
            (Datum::Float(a), Datum::Float(b)) => a.to_bits() == b.to_bits(),
            (Datum::Double(a), Datum::Double(b)) => a.to_bits() == b.to_bits(),
            (Datum::Bytes(a), Datum::Bytes(b)) => a == b,
            (Datum::String(a), Datum::String(b)) => a == b,
            (Datum::Fixed(a), Datum::Fixed(b)) => a == b,
            (Datum::Enum(a), Datum::Enum(b)) => a == b,
            (Datum::Union(ai, av), Datum::Union(bi, bv)) => ai == bi && av == bv,
            (Datum::Array(a), Datum::Array(b)) => a == b,
            (Datum::Map(a), Datum::Map(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(key, value)| {
                        b.iter().any(|(other_key, other_value)| {
                            key == other_key && value == other_value
                        })
                    })
            }
            (Datum::Record(a), Datum::Record(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Datum {
    fn from(value: bool) -> Self {
        Datum::Boolean(value)
    }
}

impl From<i32> for Datum {
    fn from(value: i32) -> Self {
        Datum::Int(value)
    }
}

impl From<i64> for Datum {
    fn from(value: i64) -> Self {
        Datum::Long(value)
    }
}

impl From<f32> for Datum {
    fn from(value: f32) -> Self {
        Datum::Float(value)
    }
}

impl From<f64> for Datum {
    fn from(value: f64) -> Self {
        Datum::Double(value)
    }
}

impl From<&str> for Datum {
    fn from(value: &str) -> Self {
        Datum::String(value.to_string())
    }
}

impl From<String> for Datum {
    fn from(value: String) -> Self {
        Datum::String(value)
    }
}

impl From<Vec<u8>> for Datum {
    fn from(value: Vec<u8>) -> Self {
        Datum::Bytes(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ValidSchema;
    use pretty_assertions::assert_eq;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_float_equality_is_bitwise() {
        assert_eq!(Datum::Float(f32::NAN), Datum::Float(f32::NAN));
        assert_ne!(Datum::Float(0.0), Datum::Float(-0.0));
        assert_eq!(Datum::Double(f64::INFINITY), Datum::Double(f64::INFINITY));
    }

    #[test]
    fn test_map_equality_ignores_order() {
        let a = Datum::Map(vec![
            ("x".into(), Datum::Int(1)),
            ("y".into(), Datum::Int(2)),
        ]);
        let b = Datum::Map(vec![
            ("y".into(), Datum::Int(2)),
            ("x".into(), Datum::Int(1)),
        ]);
        assert_eq!(a, b);

        let c = Datum::Map(vec![("x".into(), Datum::Int(3))]);
        assert_ne!(a, c);
    }

    #[test]
    fn test_from_schema_defaults() -> TestResult {
        let schema = ValidSchema::parse_str(
            r#"{"type":"record","name":"R","fields":[
                {"name":"i","type":"int"},
                {"name":"u","type":["null","string"]},
                {"name":"fx","type":{"type":"fixed","name":"F","size":3}},
                {"name":"items","type":{"type":"array","items":"long"}}]}"#,
        )?;
        let datum = Datum::from_schema(schema.root(), schema.names())?;
        assert_eq!(
            datum,
            Datum::Record(vec![
                ("i".into(), Datum::Int(0)),
                ("u".into(), Datum::Union(0, Box::new(Datum::Null))),
                ("fx".into(), Datum::Fixed(vec![0, 0, 0])),
                ("items".into(), Datum::Array(vec![])),
            ])
        );
        Ok(())
    }

    #[test]
    fn test_recursive_schema_default_terminates() -> TestResult {
        let schema = ValidSchema::parse_str(
            r#"{"type":"record","name":"Node","fields":[
                {"name":"next","type":["null","Node"]}]}"#,
        )?;
        let datum = Datum::from_schema(schema.root(), schema.names())?;
        assert_eq!(
            datum,
            Datum::Record(vec![(
                "next".into(),
                Datum::Union(0, Box::new(Datum::Null))
            )])
        );
        Ok(())
    }
}
