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

//! Errors reported by schema compilation, grammar generation and the codecs.

use crate::{
    parsing::SymbolKind,
    schema::{Name, SchemaKind},
    types::DatumKind,
};

/// Errors encountered while compiling schemas or encoding/decoding data.
///
/// To inspect the details of the error use [`details`](Self::details) or
/// [`into_details`](Self::into_details) to get a [`Details`] which contains
/// more precise error information, or [`kind`](Self::kind) for the coarse
/// classification.
#[derive(thiserror::Error, Debug)]
#[repr(transparent)]
#[error(transparent)]
pub struct Error {
    details: Box<Details>,
}

impl Error {
    pub fn new(details: Details) -> Self {
        Self {
            details: Box::new(details),
        }
    }

    pub fn details(&self) -> &Details {
        &self.details
    }

    pub fn into_details(self) -> Details {
        *self.details
    }

    /// The coarse classification of this error.
    pub fn kind(&self) -> ErrorKind {
        self.details.kind()
    }
}

impl From<Details> for Error {
    fn from(details: Details) -> Self {
        Self::new(details)
    }
}

/// Coarse classification of an [`Error`], independent of the exact detail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The schema JSON was malformed or violated a schema invariant.
    SchemaParse,
    /// No resolution exists between a writer schema and a reader schema,
    /// or an unresolvable spot was reached while decoding.
    Resolution,
    /// A codec call sequence violated the schema grammar.
    Validation,
    /// The input data was malformed.
    Decode,
    /// The underlying byte stream failed.
    Io,
}

/// The precise error detail. See [`Error`].
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Details {
    // Schema compilation
    #[error("Failed to parse schema from JSON")]
    ParseSchemaJson(#[source] serde_json::Error),

    #[error("Must be a JSON string, object or array: {0}")]
    ParseSchemaFromValidJson(String),

    #[error("Unknown type: {0}")]
    UnknownType(String),

    #[error("Unknown type definition: {0}")]
    UnknownTypeDefinition(String),

    #[error("No `name` field")]
    GetNameField,

    #[error("Invalid name {0}, expected a match of {1}")]
    InvalidSchemaName(String, &'static str),

    #[error("Invalid namespace {0}, expected a match of {1}")]
    InvalidNamespace(String, &'static str),

    #[error("Invalid enum symbol name {0}")]
    EnumSymbolName(String),

    #[error("Two schemas with the same fullname were given: {0}")]
    DuplicateSchemaName(String),

    #[error("Duplicate field name {0} in record {1}")]
    DuplicateFieldName(String, String),

    #[error("Duplicate enum symbol {0}")]
    DuplicateEnumSymbol(String),

    #[error("No `type` field or `type` is not a JSON string: {0}")]
    GetTypeField(String),

    #[error("No `fields` in record or `fields` is not a JSON array")]
    GetRecordFields,

    #[error("No `symbols` in enum or `symbols` is not an array of strings")]
    GetEnumSymbols,

    #[error("An enum must declare at least one symbol")]
    EmptyEnumSymbols,

    #[error("No `items` in array")]
    GetArrayItemsField,

    #[error("No `values` in map")]
    GetMapValuesField,

    #[error("No `size` in fixed or `size` is not a non-negative integer")]
    GetFixedSizeField,

    #[error("Unions may not directly contain a union")]
    GetNestedUnion,

    #[error("Unions cannot contain duplicate types: {0}")]
    GetUnionDuplicate(SchemaKind),

    #[error("Unions cannot contain two named types with the same fullname: {0}")]
    GetUnionDuplicateName(String),

    #[error("Default value for field {field} is not a {expected}: {found}")]
    DefaultValueType {
        field: String,
        expected: SchemaKind,
        found: String,
    },

    #[error("Default value for int field {0} is out of range: {1}")]
    DefaultIntRange(String, i64),

    #[error("Default value for enum field {0} is not a symbol: {1}")]
    DefaultEnumSymbol(String, String),

    #[error("Default value for fixed field {0} must have length {1}, got {2}")]
    DefaultFixedSize(String, usize, usize),

    #[error("No value found in default for field {0}")]
    DefaultRecordField(String),

    #[error("Default value for recursive type {0} cannot be parsed while {0} is incomplete")]
    DefaultRecursive(String),

    #[error("Failed to resolve schema reference: {0}")]
    SchemaResolutionError(Name),

    // Schema resolution
    #[error("Reader field {0} is missing from the writer schema and has no default")]
    MissingDefault(String),

    #[error("Writer schema {writer} cannot be resolved to reader schema {reader}")]
    NoResolution { writer: String, reader: String },

    #[error("Writer enum symbol {0} is not present in the reader schema")]
    ResolveEnumSymbol(String),

    // Grammar validation
    #[error("Invalid operation: expected {expected}, got {found}")]
    ExpectedSymbol {
        expected: SymbolKind,
        found: SymbolKind,
    },

    #[error("start_item called when not at an item boundary")]
    NotAtItemBoundary,

    #[error("Array or map ended with {0} items outstanding")]
    BlockItemsRemaining(usize),

    #[error("Fixed value must have length {expected}, got {found}")]
    FixedSizeMismatch { expected: usize, found: usize },

    #[error("Index {index} out of range; only {count} alternatives")]
    BranchIndexOutOfRange { index: usize, count: usize },

    #[error("Unknown enum symbol: {0}")]
    GetEnumSymbol(String),

    #[error("Unknown union branch name: {0}")]
    GetUnionBranchName(String),

    #[error("Value does not match schema: a {datum} cannot be encoded as {schema}")]
    EncodeDatumAsSchemaError { datum: DatumKind, schema: SchemaKind },

    // Binary decoding
    #[error("Integer overflow when decoding a variable-length integer")]
    IntegerOverflow,

    #[error("Cannot convert {1} to a 32-bit int")]
    ZagI32(#[source] std::num::TryFromIntError, i64),

    #[error("Expected a non-negative length or count, got {0}")]
    NegativeLength(i64),

    #[error("Invalid u8 for bool: {0}")]
    BoolValue(u8),

    #[error("Invalid utf-8 string")]
    ConvertToUtf8(#[source] std::string::FromUtf8Error),

    #[error("Unable to allocate {desired} bytes (maximum allowed: {maximum})")]
    MemoryAllocation { desired: usize, maximum: usize },

    #[error("Failed to read bytes of a variable-length integer: {0}")]
    ReadVariableIntegerBytes(#[source] std::io::Error),

    #[error("Failed to read boolean byte: {0}")]
    ReadBoolean(#[source] std::io::Error),

    #[error("Failed to read bytes: {0}")]
    ReadBytes(#[source] std::io::Error),

    #[error("Failed to read string: {0}")]
    ReadString(#[source] std::io::Error),

    #[error("Failed to read float: {0}")]
    ReadFloat(#[source] std::io::Error),

    #[error("Failed to read double: {0}")]
    ReadDouble(#[source] std::io::Error),

    #[error("Failed to read fixed number of bytes {1}: {0}")]
    ReadFixed(#[source] std::io::Error, usize),

    #[error("Failed to skip {1} bytes: {0}")]
    SkipBytes(#[source] std::io::Error, u64),

    // JSON decoding
    #[error("Failed to parse JSON datum")]
    ParseDatumJson(#[source] serde_json::Error),

    #[error("Expected JSON {expected}, got {found}")]
    JsonTokenExpected {
        expected: &'static str,
        found: String,
    },

    #[error("Incorrect field: expected {expected}, got {found}")]
    JsonFieldName { expected: String, found: String },

    #[error("Value out of range for int: {0}")]
    JsonIntRange(i64),

    // Output stream
    #[error("Failed to write bytes: {0}")]
    WriteBytes(#[source] std::io::Error),

    #[error("Failed to flush the output stream: {0}")]
    FlushWriter(#[source] std::io::Error),
}

impl Details {
    /// Classify this detail. Truncated-input io errors surface as
    /// [`ErrorKind::Decode`] since they indicate malformed data rather
    /// than a failing stream.
    pub fn kind(&self) -> ErrorKind {
        use Details::*;
        match self {
            ParseSchemaJson(_)
            | ParseSchemaFromValidJson(_)
            | UnknownType(_)
            | UnknownTypeDefinition(_)
            | GetNameField
            | InvalidSchemaName(..)
            | InvalidNamespace(..)
            | EnumSymbolName(_)
            | DuplicateSchemaName(_)
            | DuplicateFieldName(..)
            | DuplicateEnumSymbol(_)
            | GetTypeField(_)
            | GetRecordFields
            | GetEnumSymbols
            | EmptyEnumSymbols
            | GetArrayItemsField
            | GetMapValuesField
            | GetFixedSizeField
            | GetNestedUnion
            | GetUnionDuplicate(_)
            | GetUnionDuplicateName(_)
            | DefaultValueType { .. }
            | DefaultIntRange(..)
            | DefaultEnumSymbol(..)
            | DefaultFixedSize(..)
            | DefaultRecordField(_)
            | DefaultRecursive(_)
            | SchemaResolutionError(_) => ErrorKind::SchemaParse,
            MissingDefault(_) | NoResolution { .. } | ResolveEnumSymbol(_) => ErrorKind::Resolution,
            ExpectedSymbol { .. }
            | NotAtItemBoundary
            | BlockItemsRemaining(_)
            | FixedSizeMismatch { .. }
            | BranchIndexOutOfRange { .. }
            | GetEnumSymbol(_)
            | GetUnionBranchName(_)
            | EncodeDatumAsSchemaError { .. } => ErrorKind::Validation,
            IntegerOverflow
            | ZagI32(..)
            | NegativeLength(_)
            | BoolValue(_)
            | ConvertToUtf8(_)
            | MemoryAllocation { .. }
            | ParseDatumJson(_)
            | JsonTokenExpected { .. }
            | JsonFieldName { .. }
            | JsonIntRange(_) => ErrorKind::Decode,
            ReadVariableIntegerBytes(e)
            | ReadBoolean(e)
            | ReadBytes(e)
            | ReadString(e)
            | ReadFloat(e)
            | ReadDouble(e)
            | ReadFixed(e, _)
            | SkipBytes(e, _) => {
                if e.kind() == std::io::ErrorKind::UnexpectedEof {
                    ErrorKind::Decode
                } else {
                    ErrorKind::Io
                }
            }
            WriteBytes(_) | FlushWriter(_) => ErrorKind::Io,
        }
    }
}
