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

//! Schema-driven encoding and decoding for the
//! **[Apache Avro](https://avro.apache.org/)** data format.
//!
//! A [`ValidSchema`] is compiled from JSON schema text. Data conforming to
//! it is read and written through stackable codecs:
//!
//! - [`BinaryEncoder`] / [`BinaryDecoder`] speak the compact binary wire
//!   format over any [`std::io::Write`] / [`std::io::Read`].
//! - [`JsonEncoder`] / [`JsonDecoder`] speak the equivalent JSON form.
//! - [`ValidatingEncoder`] / [`ValidatingDecoder`] wrap a base codec and
//!   reject any call sequence that does not fit the schema, before a
//!   single byte moves.
//! - [`ResolvingDecoder`] reads data written with one schema (the
//!   *writer*) and presents it shaped like another (the *reader*),
//!   skipping removed fields, filling added fields from their defaults
//!   and widening numeric types.
//!
//! Values can be handled dynamically through [`Datum`] with
//! [`GenericReader`] and [`GenericWriter`], or by invoking the codec
//! operations directly from statically shaped code.
//!
//! ```
//! use avro_codec::{
//!     BinaryDecoder, BinaryEncoder, Datum, GenericReader, GenericWriter, ValidSchema,
//! };
//!
//! let schema = ValidSchema::parse_str(
//!     r#"{"type":"record","name":"Test","fields":[{"name":"n","type":"long"}]}"#,
//! )?;
//! let datum = Datum::Record(vec![("n".to_string(), Datum::Long(42))]);
//!
//! let mut buffer = Vec::new();
//! GenericWriter::new(&schema).write(&datum, &mut BinaryEncoder::new(&mut buffer))?;
//! let read = GenericReader::new(&schema).read(&mut BinaryDecoder::new(&buffer[..]))?;
//! assert_eq!(read, datum);
//! # Ok::<(), avro_codec::Error>(())
//! ```
//!
//! Validation and resolution are driven by a grammar compiled from the
//! schema (or schema pair): each codec operation advances a stack machine
//! whose terminals mirror the operations and whose actions encode
//! structure and resolution decisions.
//!
//! # MSRV
//!
//! The current MSRV is 1.88.0.

mod decode;
mod encode;
mod generic;
mod json;
mod parsing;
mod validator;

pub mod error;
pub mod schema;
pub mod types;
pub mod util;

pub use decode::{BinaryDecoder, Decoder};
pub use encode::{BinaryEncoder, Encoder};
pub use error::{Error, ErrorKind};
pub use generic::{GenericReader, GenericWriter};
pub use json::{JsonDecoder, JsonEncoder};
pub use parsing::{ResolvingDecoder, SymbolKind, ValidatingDecoder, ValidatingEncoder};
pub use schema::ValidSchema;
pub use types::Datum;

/// A convenience type alias for `Result`s with `Error`s.
pub type AvroResult<T> = Result<T, Error>;
