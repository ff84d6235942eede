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

//! Reading and writing [`Datum`]s through any decoder or encoder.

use crate::{
    AvroResult,
    decode::Decoder,
    encode::Encoder,
    error::Details,
    schema::{Names, Schema, SchemaKind, ValidSchema, resolve_ref},
    types::{Datum, DatumKind},
};

/// Reads dynamically typed data, dispatching on a reader schema.
///
/// When the supplied decoder resolves a writer schema against the reader
/// schema, record fields are read in the order the decoder dictates (the
/// writer's on-the-wire order) and placed at their reader positions.
pub struct GenericReader {
    schema: ValidSchema,
}

impl GenericReader {
    pub fn new(schema: &ValidSchema) -> Self {
        Self {
            schema: schema.clone(),
        }
    }

    /// Read one datum from the decoder.
    pub fn read<D: Decoder + ?Sized>(&self, decoder: &mut D) -> AvroResult<Datum> {
        read_datum(self.schema.root(), self.schema.names(), decoder)
    }
}

/// Writes dynamically typed data, dispatching on the writer schema.
pub struct GenericWriter {
    schema: ValidSchema,
}

impl GenericWriter {
    pub fn new(schema: &ValidSchema) -> Self {
        Self {
            schema: schema.clone(),
        }
    }

    /// Write one datum to the encoder.
    pub fn write<E: Encoder + ?Sized>(&self, datum: &Datum, encoder: &mut E) -> AvroResult<()> {
        write_datum(datum, self.schema.root(), self.schema.names(), encoder)
    }
}

pub(crate) fn read_datum<D: Decoder + ?Sized>(
    schema: &Schema,
    names: &Names,
    decoder: &mut D,
) -> AvroResult<Datum> {
    let schema = resolve_ref(schema, names)?;
    Ok(match schema {
        Schema::Null => {
            decoder.decode_null()?;
            Datum::Null
        }
        Schema::Boolean => Datum::Boolean(decoder.decode_bool()?),
        Schema::Int => Datum::Int(decoder.decode_int()?),
        Schema::Long => Datum::Long(decoder.decode_long()?),
        Schema::Float => Datum::Float(decoder.decode_float()?),
        Schema::Double => Datum::Double(decoder.decode_double()?),
        Schema::String => Datum::String(decoder.decode_string()?),
        Schema::Bytes => Datum::Bytes(decoder.decode_bytes()?),
        Schema::Fixed(fixed) => Datum::Fixed(decoder.decode_fixed(fixed.size)?),
        Schema::Enum(_) => Datum::Enum(decoder.decode_enum()?),
        Schema::Union(union) => {
            let index = decoder.decode_union_index()?;
            let branch = union.variants().get(index).ok_or_else(|| {
                crate::Error::from(Details::BranchIndexOutOfRange {
                    index,
                    count: union.variants().len(),
                })
            })?;
            Datum::Union(index, Box::new(read_datum(branch, names, decoder)?))
        }
        Schema::Array(array) => {
            let mut items = Vec::new();
            let mut count = decoder.array_start()?;
            while count != 0 {
                for _ in 0..count {
                    items.push(read_datum(&array.items, names, decoder)?);
                }
                count = decoder.array_next()?;
            }
            Datum::Array(items)
        }
        Schema::Map(map) => {
            let mut entries = Vec::new();
            let mut count = decoder.map_start()?;
            while count != 0 {
                for _ in 0..count {
                    let key = decoder.decode_string()?;
                    entries.push((key, read_datum(&map.values, names, decoder)?));
                }
                count = decoder.map_next()?;
            }
            Datum::Map(entries)
        }
        Schema::Record(record) => {
            let field_count = record.fields.len();
            let mut values: Vec<Option<Datum>> = (0..field_count).map(|_| None).collect();
            match decoder.field_order()? {
                // A resolving decoder prescribes the wire order.
                Some(order) => {
                    for index in order {
                        if index >= field_count {
                            return Err(Details::BranchIndexOutOfRange {
                                index,
                                count: field_count,
                            }
                            .into());
                        }
                        values[index] =
                            Some(read_datum(&record.fields[index].schema, names, decoder)?);
                    }
                }
                None => {
                    for (index, field) in record.fields.iter().enumerate() {
                        values[index] = Some(read_datum(&field.schema, names, decoder)?);
                    }
                }
            }
            let fields = record
                .fields
                .iter()
                .zip(values)
                .map(|(field, value)| {
                    let value = value.expect("field order covers every reader field");
                    (field.name.clone(), value)
                })
                .collect();
            Datum::Record(fields)
        }
        Schema::Ref { .. } => unreachable!("references are resolved above"),
    })
}

pub(crate) fn write_datum<E: Encoder + ?Sized>(
    datum: &Datum,
    schema: &Schema,
    names: &Names,
    encoder: &mut E,
) -> AvroResult<()> {
    let schema = resolve_ref(schema, names)?;
    let mismatch = || {
        crate::Error::from(Details::EncodeDatumAsSchemaError {
            datum: DatumKind::from(datum),
            schema: SchemaKind::from(schema),
        })
    };
    match (datum, schema) {
        (Datum::Null, Schema::Null) => encoder.encode_null(),
        (Datum::Boolean(b), Schema::Boolean) => encoder.encode_bool(*b),
        (Datum::Int(i), Schema::Int) => encoder.encode_int(*i),
        (Datum::Long(l), Schema::Long) => encoder.encode_long(*l),
        (Datum::Float(f), Schema::Float) => encoder.encode_float(*f),
        (Datum::Double(d), Schema::Double) => encoder.encode_double(*d),
        (Datum::String(s), Schema::String) => encoder.encode_string(s),
        (Datum::Bytes(b), Schema::Bytes) => encoder.encode_bytes(b),
        (Datum::Fixed(b), Schema::Fixed(fixed)) => {
            if b.len() != fixed.size {
                return Err(Details::FixedSizeMismatch {
                    expected: fixed.size,
                    found: b.len(),
                }
                .into());
            }
            encoder.encode_fixed(b)
        }
        (Datum::Enum(index), Schema::Enum(_)) => encoder.encode_enum(*index),
        (Datum::Union(index, value), Schema::Union(union)) => {
            let branch = union.variants().get(*index).ok_or_else(|| {
                crate::Error::from(Details::BranchIndexOutOfRange {
                    index: *index,
                    count: union.variants().len(),
                })
            })?;
            encoder.encode_union_index(*index)?;
            write_datum(value, branch, names, encoder)
        }
        (Datum::Array(items), Schema::Array(array)) => {
            encoder.array_start()?;
            if !items.is_empty() {
                encoder.set_item_count(items.len())?;
                for item in items {
                    encoder.start_item()?;
                    write_datum(item, &array.items, names, encoder)?;
                }
            }
            encoder.array_end()
        }
        (Datum::Map(entries), Schema::Map(map)) => {
            encoder.map_start()?;
            if !entries.is_empty() {
                encoder.set_item_count(entries.len())?;
                for (key, value) in entries {
                    encoder.start_item()?;
                    encoder.encode_string(key)?;
                    write_datum(value, &map.values, names, encoder)?;
                }
            }
            encoder.map_end()
        }
        (Datum::Record(values), Schema::Record(record)) => {
            if values.len() != record.fields.len() {
                return Err(mismatch());
            }
            for (field, (_, value)) in record.fields.iter().zip(values) {
                write_datum(value, &field.schema, names, encoder)?;
            }
            Ok(())
        }
        _ => Err(mismatch()),
    }
}
