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

//! Logic for parsing and interacting with schemas in Avro format.

mod name;
mod parser;

pub use crate::schema::name::{Name, Names, Namespace, NamespaceRef};
pub(crate) use crate::schema::parser::string_to_bytes;
use crate::{
    AvroResult,
    error::Details,
    schema::parser::Parser,
    types::Datum,
};
use serde_json::{Map, Value as JsonValue, json};
use std::collections::HashSet;
use std::fmt;
use strum::{Display, EnumDiscriminants};

/// Represents any valid Avro schema.
///
/// More information about Avro schemas can be found in the
/// [Avro Specification](https://avro.apache.org/docs/++version++/specification/#schema-declaration).
#[derive(Clone, Debug, PartialEq, EnumDiscriminants, Display)]
#[strum_discriminants(name(SchemaKind), derive(Display, Hash, Ord, PartialOrd))]
pub enum Schema {
    /// A `null` Avro schema.
    Null,
    /// A `boolean` Avro schema.
    Boolean,
    /// An `int` Avro schema.
    Int,
    /// A `long` Avro schema.
    Long,
    /// A `float` Avro schema.
    Float,
    /// A `double` Avro schema.
    Double,
    /// A `bytes` Avro schema.
    ///
    /// `Bytes` represents a sequence of 8-bit unsigned bytes.
    Bytes,
    /// A `string` Avro schema.
    ///
    /// `String` represents a unicode character sequence.
    String,
    /// An `array` Avro schema.
    ///
    /// All items will have the same schema.
    Array(ArraySchema),
    /// A `map` Avro schema.
    ///
    /// Keys are always strings and all values will have the same schema.
    Map(MapSchema),
    /// A `union` Avro schema.
    Union(UnionSchema),
    /// A `record` Avro schema.
    Record(RecordSchema),
    /// An `enum` Avro schema.
    Enum(EnumSchema),
    /// A `fixed` Avro schema.
    Fixed(FixedSchema),
    /// A reference to another schema definition, by fullname.
    ///
    /// This is how a named type is mentioned after (or, for recursive
    /// records, during) its definition; it resolves through the symbol
    /// table owned by the enclosing [`ValidSchema`].
    Ref { name: Name },
}

impl Schema {
    /// The name of this schema, if it is a named type or a reference.
    pub fn name(&self) -> Option<&Name> {
        match self {
            Schema::Record(RecordSchema { name, .. })
            | Schema::Enum(EnumSchema { name, .. })
            | Schema::Fixed(FixedSchema { name, .. })
            | Schema::Ref { name } => Some(name),
            _ => None,
        }
    }

    /// The display name used for JSON union branches: the fullname for
    /// named types, the lowercase type name otherwise.
    pub(crate) fn branch_name(&self) -> String {
        match self.name() {
            Some(name) => name.fullname().to_string(),
            None => match self {
                Schema::Null => "null".to_string(),
                Schema::Boolean => "boolean".to_string(),
                Schema::Int => "int".to_string(),
                Schema::Long => "long".to_string(),
                Schema::Float => "float".to_string(),
                Schema::Double => "double".to_string(),
                Schema::Bytes => "bytes".to_string(),
                Schema::String => "string".to_string(),
                Schema::Array(_) => "array".to_string(),
                Schema::Map(_) => "map".to_string(),
                Schema::Union(_) => "union".to_string(),
                _ => unreachable!("named types are handled above"),
            },
        }
    }
}

impl SchemaKind {
    pub fn is_primitive(self) -> bool {
        matches!(
            self,
            SchemaKind::Null
                | SchemaKind::Boolean
                | SchemaKind::Int
                | SchemaKind::Long
                | SchemaKind::Float
                | SchemaKind::Double
                | SchemaKind::Bytes
                | SchemaKind::String
        )
    }

    pub fn is_named(self) -> bool {
        matches!(
            self,
            SchemaKind::Record | SchemaKind::Enum | SchemaKind::Fixed | SchemaKind::Ref
        )
    }
}

/// An `array` Avro schema.
#[derive(Clone, Debug, PartialEq)]
pub struct ArraySchema {
    pub items: Box<Schema>,
}

/// A `map` Avro schema. Keys are implicitly strings.
#[derive(Clone, Debug, PartialEq)]
pub struct MapSchema {
    pub values: Box<Schema>,
}

/// A `union` Avro schema.
///
/// The construction invariants of the Avro specification are enforced by
/// [`UnionSchema::new`]: no two unnamed branches of the same kind, no two
/// named branches with the same fullname, and no union directly inside a
/// union.
#[derive(Clone, Debug, PartialEq)]
pub struct UnionSchema {
    variants: Vec<Schema>,
}

impl UnionSchema {
    pub fn new(variants: Vec<Schema>) -> AvroResult<Self> {
        let mut kinds = HashSet::new();
        let mut names = HashSet::new();
        for variant in &variants {
            let kind = SchemaKind::from(variant);
            if kind == SchemaKind::Union {
                return Err(Details::GetNestedUnion.into());
            }
            if kind.is_named() {
                let fullname = variant
                    .name()
                    .expect("named kinds carry a name")
                    .fullname()
                    .to_string();
                if !names.insert(fullname.clone()) {
                    return Err(Details::GetUnionDuplicateName(fullname).into());
                }
            } else if !kinds.insert(kind) {
                return Err(Details::GetUnionDuplicate(kind).into());
            }
        }
        Ok(Self { variants })
    }

    pub fn variants(&self) -> &[Schema] {
        &self.variants
    }
}

/// A `record` Avro schema.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordSchema {
    pub name: Name,
    pub fields: Vec<RecordField>,
}

impl RecordSchema {
    /// The index of the field with the given name, if present.
    pub fn field_index(&self, field_name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == field_name)
    }
}

/// A field of a [`RecordSchema`].
#[derive(Clone, Debug, PartialEq)]
pub struct RecordField {
    pub name: String,
    pub schema: Schema,
    /// The parsed default value, `None` when the schema declares none.
    /// `Some(Datum::Null)` is a declared `null` default, which is distinct.
    pub default: Option<Datum>,
}

/// An `enum` Avro schema.
#[derive(Clone, Debug, PartialEq)]
pub struct EnumSchema {
    pub name: Name,
    pub symbols: Vec<String>,
}

impl EnumSchema {
    /// The index of the given symbol, if declared.
    pub fn symbol_index(&self, symbol: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }
}

/// A `fixed` Avro schema.
#[derive(Clone, Debug, PartialEq)]
pub struct FixedSchema {
    pub name: Name,
    pub size: usize,
}

/// A compiled, validated schema: the root [`Schema`] plus the symbol table
/// owning every named definition reachable from it.
///
/// The symbol table keeps named definitions alive for the life of the
/// `ValidSchema`, so every [`Schema::Ref`] inside the graph is guaranteed
/// to resolve. A `ValidSchema` is immutable and may be shared freely.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidSchema {
    root: Schema,
    names: Names,
}

impl ValidSchema {
    /// Create a `ValidSchema` from a string representing a JSON Avro schema.
    pub fn parse_str(input: &str) -> AvroResult<Self> {
        let mut parser = Parser::default();
        parser.parse_str(input)
    }

    pub(crate) fn new(root: Schema, names: Names) -> Self {
        Self { root, names }
    }

    pub fn root(&self) -> &Schema {
        &self.root
    }

    pub fn names(&self) -> &Names {
        &self.names
    }

    /// Look up a named definition.
    pub fn get(&self, name: &Name) -> Option<&Schema> {
        self.names.get(name)
    }

    /// Render the schema back to its JSON form.
    pub fn to_json(&self) -> JsonValue {
        let mut seen = HashSet::new();
        schema_to_json(&self.root, &self.names, &mut seen)
    }
}

impl fmt::Display for ValidSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

/// Follow a [`Schema::Ref`] to its definition; other schemas are returned
/// unchanged. Failure to resolve is fatal.
pub(crate) fn resolve_ref<'a>(schema: &'a Schema, names: &'a Names) -> AvroResult<&'a Schema> {
    match schema {
        Schema::Ref { name } => names
            .get(name)
            .ok_or_else(|| Details::SchemaResolutionError(name.clone()).into()),
        _ => Ok(schema),
    }
}

fn schema_to_json(schema: &Schema, names: &Names, seen: &mut HashSet<Name>) -> JsonValue {
    match schema {
        Schema::Null => json!("null"),
        Schema::Boolean => json!("boolean"),
        Schema::Int => json!("int"),
        Schema::Long => json!("long"),
        Schema::Float => json!("float"),
        Schema::Double => json!("double"),
        Schema::Bytes => json!("bytes"),
        Schema::String => json!("string"),
        Schema::Array(inner) => json!({
            "type": "array",
            "items": schema_to_json(&inner.items, names, seen),
        }),
        Schema::Map(inner) => json!({
            "type": "map",
            "values": schema_to_json(&inner.values, names, seen),
        }),
        Schema::Union(inner) => JsonValue::Array(
            inner
                .variants()
                .iter()
                .map(|v| schema_to_json(v, names, seen))
                .collect(),
        ),
        Schema::Record(inner) => {
            if !seen.insert(inner.name.clone()) {
                return json!(inner.name.fullname());
            }
            let fields: Vec<JsonValue> = inner
                .fields
                .iter()
                .map(|f| {
                    let mut field = Map::new();
                    field.insert("name".into(), json!(f.name));
                    field.insert("type".into(), schema_to_json(&f.schema, names, seen));
                    if let Some(default) = &f.default {
                        field.insert("default".into(), default_to_json(default, &f.schema, names));
                    }
                    JsonValue::Object(field)
                })
                .collect();
            json!({
                "type": "record",
                "name": inner.name.fullname(),
                "fields": fields,
            })
        }
        Schema::Enum(inner) => {
            if !seen.insert(inner.name.clone()) {
                return json!(inner.name.fullname());
            }
            json!({
                "type": "enum",
                "name": inner.name.fullname(),
                "symbols": inner.symbols,
            })
        }
        Schema::Fixed(inner) => {
            if !seen.insert(inner.name.clone()) {
                return json!(inner.name.fullname());
            }
            json!({
                "type": "fixed",
                "name": inner.name.fullname(),
                "size": inner.size,
            })
        }
        Schema::Ref { name } => match names.get(name) {
            Some(definition) if !seen.contains(name) => schema_to_json(definition, names, seen),
            _ => json!(name.fullname()),
        },
    }
}

/// Render a parsed default value back to its JSON form: a union default
/// stands for the first branch, bytes and fixed carry one byte per code
/// point, and enum defaults name their symbol.
fn default_to_json(datum: &Datum, schema: &Schema, names: &Names) -> JsonValue {
    let schema = resolve_ref(schema, names).unwrap_or(schema);
    match (datum, schema) {
        (Datum::Null, _) => JsonValue::Null,
        (Datum::Boolean(b), _) => json!(b),
        (Datum::Int(i), _) => json!(i),
        (Datum::Long(l), _) => json!(l),
        (Datum::Float(f), _) => json!(f),
        (Datum::Double(d), _) => json!(d),
        (Datum::String(s), _) => json!(s),
        (Datum::Bytes(bytes) | Datum::Fixed(bytes), _) => {
            json!(bytes.iter().map(|&b| b as char).collect::<String>())
        }
        (Datum::Enum(index), Schema::Enum(inner)) => json!(inner.symbols.get(*index)),
        (Datum::Union(_, value), Schema::Union(inner)) => match inner.variants().first() {
            Some(first) => default_to_json(value, first, names),
            None => JsonValue::Null,
        },
        (Datum::Array(items), Schema::Array(inner)) => JsonValue::Array(
            items
                .iter()
                .map(|item| default_to_json(item, &inner.items, names))
                .collect(),
        ),
        (Datum::Map(entries), Schema::Map(inner)) => JsonValue::Object(
            entries
                .iter()
                .map(|(key, value)| (key.clone(), default_to_json(value, &inner.values, names)))
                .collect(),
        ),
        (Datum::Record(values), Schema::Record(inner)) => JsonValue::Object(
            inner
                .fields
                .iter()
                .zip(values)
                .map(|(field, (_, value))| {
                    (field.name.clone(), default_to_json(value, &field.schema, names))
                })
                .collect(),
        ),
        _ => JsonValue::Null,
    }
}
