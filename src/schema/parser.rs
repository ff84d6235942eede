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

use crate::error::Details;
use crate::schema::{
    ArraySchema, EnumSchema, FixedSchema, MapSchema, Name, Names, NamespaceRef, RecordField,
    RecordSchema, Schema, SchemaKind, UnionSchema, ValidSchema,
};
use crate::types::Datum;
use crate::util::MapHelper;
use crate::validator::validate_enum_symbol_name;
use crate::{AvroResult, Error};
use log::debug;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

/// Compiles JSON schema text into a [`ValidSchema`].
///
/// Named definitions are collected in a symbol table keyed by fullname.
/// A record inserts a placeholder entry *before* compiling its fields, so
/// a field may refer back to the record under compilation; such references
/// become [`Schema::Ref`] nodes and close the only cycles a schema graph
/// can have.
#[derive(Default)]
pub(crate) struct Parser {
    /// `None` marks a record whose fields are still being compiled.
    symbol_table: HashMap<Name, Option<Schema>>,
}

impl Parser {
    /// Create a `ValidSchema` from a string representing a JSON Avro schema.
    pub(super) fn parse_str(&mut self, input: &str) -> AvroResult<ValidSchema> {
        let value = serde_json::from_str(input).map_err(Details::ParseSchemaJson)?;
        let root = self.parse(&value, None)?;

        let mut names = Names::with_capacity(self.symbol_table.len());
        for (name, schema) in self.symbol_table.drain() {
            let schema = schema.expect("record placeholder was never completed");
            names.insert(name, schema);
        }
        Ok(ValidSchema::new(root, names))
    }

    /// Create a `Schema` from a `serde_json::Value` representing a JSON Avro schema.
    fn parse(&mut self, value: &Value, enclosing_namespace: NamespaceRef) -> AvroResult<Schema> {
        match *value {
            Value::String(ref t) => self.parse_known_schema(t.as_str(), enclosing_namespace),
            Value::Object(ref data) => self.parse_complex(data, enclosing_namespace),
            Value::Array(ref data) => self.parse_union(data, enclosing_namespace),
            _ => Err(Details::ParseSchemaFromValidJson(value.to_string()).into()),
        }
    }

    /// Parse a string as a primitive type or a reference to a named type
    /// defined earlier in the document.
    fn parse_known_schema(
        &mut self,
        name: &str,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        match name {
            "null" => Ok(Schema::Null),
            "boolean" => Ok(Schema::Boolean),
            "int" => Ok(Schema::Int),
            "long" => Ok(Schema::Long),
            "double" => Ok(Schema::Double),
            "float" => Ok(Schema::Float),
            "bytes" => Ok(Schema::Bytes),
            "string" => Ok(Schema::String),
            _ => {
                let fully_qualified_name =
                    Name::new_with_enclosing_namespace(name, enclosing_namespace)?;
                if self.symbol_table.contains_key(&fully_qualified_name) {
                    Ok(Schema::Ref {
                        name: fully_qualified_name,
                    })
                } else {
                    Err(Details::UnknownType(fully_qualified_name.to_string()).into())
                }
            }
        }
    }

    /// Parse a JSON array as a union.
    fn parse_union(
        &mut self,
        branches: &[Value],
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        let variants = branches
            .iter()
            .map(|branch| self.parse(branch, enclosing_namespace))
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(Schema::Union(UnionSchema::new(variants)?))
    }

    /// Parse a JSON object with a `type` field.
    fn parse_complex(
        &mut self,
        complex: &Map<String, Value>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        let type_name = complex
            .string("type")
            .ok_or_else(|| Details::GetTypeField(Value::Object(complex.clone()).to_string()))?;
        match type_name.as_str() {
            // Extra attributes on a primitive are ignored.
            "null" | "boolean" | "int" | "long" | "double" | "float" | "bytes" | "string" => {
                self.parse_known_schema(&type_name, enclosing_namespace)
            }
            // `error` is a synonym of `record`.
            "record" | "error" => self.parse_record(complex, enclosing_namespace),
            "enum" => self.parse_enum(complex, enclosing_namespace),
            "array" => self.parse_array(complex, enclosing_namespace),
            "map" => self.parse_map(complex, enclosing_namespace),
            "fixed" => self.parse_fixed(complex, enclosing_namespace),
            _ => Err(Details::UnknownTypeDefinition(type_name).into()),
        }
    }

    fn check_new_name(&self, name: &Name) -> AvroResult<()> {
        if self.symbol_table.contains_key(name) {
            Err(Details::DuplicateSchemaName(name.to_string()).into())
        } else {
            Ok(())
        }
    }

    fn parse_record(
        &mut self,
        complex: &Map<String, Value>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        let fully_qualified_name = Name::parse(complex, enclosing_namespace)?;
        self.check_new_name(&fully_qualified_name)?;

        // The placeholder admits recursive references from the fields.
        debug!("Inserting placeholder for record {fully_qualified_name}");
        self.symbol_table.insert(fully_qualified_name.clone(), None);

        let fields_json = complex
            .get("fields")
            .and_then(|v| v.as_array())
            .ok_or(Details::GetRecordFields)?;

        let mut fields = Vec::with_capacity(fields_json.len());
        let mut seen_names = HashSet::with_capacity(fields_json.len());
        for field in fields_json {
            let field = field.as_object().ok_or(Details::GetRecordFields)?;
            let field_name = field.name().ok_or(Details::GetNameField)?;
            if !seen_names.insert(field_name.clone()) {
                return Err(Details::DuplicateFieldName(
                    field_name,
                    fully_qualified_name.to_string(),
                )
                .into());
            }
            let field_type = field
                .get("type")
                .ok_or_else(|| Details::GetTypeField(Value::Object(field.clone()).to_string()))?;
            let schema = self.parse(field_type, fully_qualified_name.namespace())?;
            let default = match field.get("default") {
                Some(entity) => Some(self.parse_default(&schema, entity, &field_name)?),
                None => None,
            };
            fields.push(RecordField {
                name: field_name,
                schema,
                default,
            });
        }

        let record = Schema::Record(RecordSchema {
            name: fully_qualified_name.clone(),
            fields,
        });
        // Fill the placeholder; later references now see the completed record.
        self.symbol_table
            .insert(fully_qualified_name, Some(record.clone()));
        Ok(record)
    }

    fn parse_enum(
        &mut self,
        complex: &Map<String, Value>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        let fully_qualified_name = Name::parse(complex, enclosing_namespace)?;
        self.check_new_name(&fully_qualified_name)?;

        let symbols_json = complex
            .get("symbols")
            .and_then(|v| v.as_array())
            .ok_or(Details::GetEnumSymbols)?;
        if symbols_json.is_empty() {
            return Err(Details::EmptyEnumSymbols.into());
        }
        let mut symbols = Vec::with_capacity(symbols_json.len());
        let mut seen = HashSet::with_capacity(symbols_json.len());
        for symbol in symbols_json {
            let symbol = symbol.as_str().ok_or(Details::GetEnumSymbols)?;
            validate_enum_symbol_name(symbol)?;
            if !seen.insert(symbol) {
                return Err(Details::DuplicateEnumSymbol(symbol.to_string()).into());
            }
            symbols.push(symbol.to_string());
        }

        let schema = Schema::Enum(EnumSchema {
            name: fully_qualified_name.clone(),
            symbols,
        });
        self.symbol_table
            .insert(fully_qualified_name, Some(schema.clone()));
        Ok(schema)
    }

    fn parse_array(
        &mut self,
        complex: &Map<String, Value>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        let items = complex.get("items").ok_or(Details::GetArrayItemsField)?;
        Ok(Schema::Array(ArraySchema {
            items: Box::new(self.parse(items, enclosing_namespace)?),
        }))
    }

    fn parse_map(
        &mut self,
        complex: &Map<String, Value>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        let values = complex.get("values").ok_or(Details::GetMapValuesField)?;
        Ok(Schema::Map(MapSchema {
            values: Box::new(self.parse(values, enclosing_namespace)?),
        }))
    }

    fn parse_fixed(
        &mut self,
        complex: &Map<String, Value>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        let fully_qualified_name = Name::parse(complex, enclosing_namespace)?;
        self.check_new_name(&fully_qualified_name)?;

        let size = complex
            .get("size")
            .and_then(|v| v.as_u64())
            .ok_or(Details::GetFixedSizeField)?;

        let schema = Schema::Fixed(FixedSchema {
            name: fully_qualified_name.clone(),
            size: size as usize,
        });
        self.symbol_table
            .insert(fully_qualified_name, Some(schema.clone()));
        Ok(schema)
    }

    /// Resolve a [`Schema::Ref`] against the symbol table during default
    /// parsing. An in-flight placeholder cannot be used as a default type.
    fn deref_for_default<'a>(&'a self, schema: &'a Schema) -> AvroResult<&'a Schema> {
        match schema {
            Schema::Ref { name } => match self.symbol_table.get(name) {
                Some(Some(definition)) => Ok(definition),
                Some(None) => Err(Details::DefaultRecursive(name.to_string()).into()),
                None => Err(Details::SchemaResolutionError(name.clone()).into()),
            },
            _ => Ok(schema),
        }
    }

    /// Convert a default-value JSON entity into a [`Datum`] of the target
    /// type, per the Avro rules for field defaults: a default for a union
    /// applies to the union's first branch, bytes and fixed defaults carry
    /// one byte per code point, and enum defaults name a symbol.
    fn parse_default(&self, schema: &Schema, entity: &Value, field: &str) -> AvroResult<Datum> {
        let schema = self.deref_for_default(schema)?;
        let mismatch = |expected: SchemaKind| {
            Error::from(Details::DefaultValueType {
                field: field.to_string(),
                expected,
                found: entity.to_string(),
            })
        };
        match schema {
            Schema::Null => match entity {
                Value::Null => Ok(Datum::Null),
                _ => Err(mismatch(SchemaKind::Null)),
            },
            Schema::Boolean => entity
                .as_bool()
                .map(Datum::Boolean)
                .ok_or_else(|| mismatch(SchemaKind::Boolean)),
            Schema::Int => {
                let n = entity.as_i64().ok_or_else(|| mismatch(SchemaKind::Int))?;
                i32::try_from(n)
                    .map(Datum::Int)
                    .map_err(|_| Details::DefaultIntRange(field.to_string(), n).into())
            }
            Schema::Long => entity
                .as_i64()
                .map(Datum::Long)
                .ok_or_else(|| mismatch(SchemaKind::Long)),
            Schema::Float => entity
                .as_f64()
                .map(|v| Datum::Float(v as f32))
                .ok_or_else(|| mismatch(SchemaKind::Float)),
            Schema::Double => entity
                .as_f64()
                .map(Datum::Double)
                .ok_or_else(|| mismatch(SchemaKind::Double)),
            Schema::String => entity
                .as_str()
                .map(|s| Datum::String(s.to_string()))
                .ok_or_else(|| mismatch(SchemaKind::String)),
            Schema::Bytes => entity
                .as_str()
                .map(|s| Datum::Bytes(string_to_bytes(s)))
                .ok_or_else(|| mismatch(SchemaKind::Bytes)),
            Schema::Fixed(fixed) => {
                let s = entity.as_str().ok_or_else(|| mismatch(SchemaKind::Fixed))?;
                let bytes = string_to_bytes(s);
                if bytes.len() != fixed.size {
                    return Err(Details::DefaultFixedSize(
                        field.to_string(),
                        fixed.size,
                        bytes.len(),
                    )
                    .into());
                }
                Ok(Datum::Fixed(bytes))
            }
            Schema::Enum(inner) => {
                let s = entity.as_str().ok_or_else(|| mismatch(SchemaKind::Enum))?;
                inner
                    .symbol_index(s)
                    .map(Datum::Enum)
                    .ok_or_else(|| {
                        Details::DefaultEnumSymbol(field.to_string(), s.to_string()).into()
                    })
            }
            Schema::Array(inner) => {
                let items = entity
                    .as_array()
                    .ok_or_else(|| mismatch(SchemaKind::Array))?;
                let items = items
                    .iter()
                    .map(|item| self.parse_default(&inner.items, item, field))
                    .collect::<Result<Vec<_>, Error>>()?;
                Ok(Datum::Array(items))
            }
            Schema::Map(inner) => {
                let entries = entity
                    .as_object()
                    .ok_or_else(|| mismatch(SchemaKind::Map))?;
                let entries = entries
                    .iter()
                    .map(|(key, value)| {
                        self.parse_default(&inner.values, value, field)
                            .map(|datum| (key.clone(), datum))
                    })
                    .collect::<Result<Vec<_>, Error>>()?;
                Ok(Datum::Map(entries))
            }
            Schema::Record(inner) => {
                let object = entity
                    .as_object()
                    .ok_or_else(|| mismatch(SchemaKind::Record))?;
                let mut fields = Vec::with_capacity(inner.fields.len());
                for record_field in &inner.fields {
                    let value = object
                        .get(&record_field.name)
                        .ok_or_else(|| Details::DefaultRecordField(record_field.name.clone()))?;
                    let datum = self.parse_default(&record_field.schema, value, field)?;
                    fields.push((record_field.name.clone(), datum));
                }
                Ok(Datum::Record(fields))
            }
            // A default for a union applies to its first branch.
            Schema::Union(inner) => {
                let first = inner.variants().first().ok_or_else(|| {
                    Error::from(Details::DefaultValueType {
                        field: field.to_string(),
                        expected: SchemaKind::Union,
                        found: entity.to_string(),
                    })
                })?;
                let datum = self.parse_default(first, entity, field)?;
                Ok(Datum::Union(0, Box::new(datum)))
            }
            Schema::Ref { .. } => unreachable!("references are resolved above"),
        }
    }
}

/// Map each character's low 8 bits to a byte, the representation Avro uses
/// for `bytes` and `fixed` values in JSON.
pub(crate) fn string_to_bytes(s: &str) -> Vec<u8> {
    s.chars().map(|c| (c as u32) as u8).collect()
}
