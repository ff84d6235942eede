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

//! The grammar machinery driving validation and schema resolution.
//!
//! A schema (or a writer/reader schema pair) compiles into a grammar of
//! productions over typed symbols. Codecs advance the grammar once per
//! operation; the grammar rejects out-of-order calls and, for resolution,
//! splices in skip, promote and default actions.

mod resolving;
mod symbol;
mod validating;

pub use symbol::SymbolKind;
pub(crate) use symbol::{Grammar, GrammarBuilder, Parser, ParserHandler, Symbol};

pub use resolving::ResolvingDecoder;
pub use validating::{ValidatingDecoder, ValidatingEncoder};
