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

use crate::{
    AvroResult,
    decode::Decoder,
    encode::Encoder,
    error::Details,
    parsing::symbol::{Grammar, GrammarBuilder, NoHandler, Parser, Symbol, SymbolKind},
    schema::{Name, Names, Schema, ValidSchema, resolve_ref},
};
use std::collections::HashMap;
use std::sync::Arc;

/// Compiles a single schema into a grammar whose terminals describe the
/// exact sequence of codec calls a correct user must make.
pub(crate) struct ValidatingGrammarGenerator<'a> {
    builder: &'a mut GrammarBuilder,
    names: &'a Names,
    memo: &'a mut HashMap<Name, usize>,
}

impl ValidatingGrammarGenerator<'_> {
    /// Generate the complete grammar for a schema.
    pub(crate) fn generate(schema: &ValidSchema) -> AvroResult<Arc<Grammar>> {
        let mut builder = GrammarBuilder::new();
        let mut memo = HashMap::new();
        let root = {
            let mut generator = ValidatingGrammarGenerator::new(&mut builder, schema.names(), &mut memo);
            generator.generate_node(schema.root())?
        };
        Ok(builder.build(root))
    }
}

impl<'a> ValidatingGrammarGenerator<'a> {
    pub(crate) fn new(
        builder: &'a mut GrammarBuilder,
        names: &'a Names,
        memo: &'a mut HashMap<Name, usize>,
    ) -> Self {
        Self {
            builder,
            names,
            memo,
        }
    }

    /// The symbols for one schema node, in grammar order, suitable for
    /// inlining into an enclosing production.
    pub(crate) fn generate_node(&mut self, schema: &Schema) -> AvroResult<Vec<Symbol>> {
        let schema = resolve_ref(schema, self.names)?;
        Ok(match schema {
            Schema::Null => vec![Symbol::Null],
            Schema::Boolean => vec![Symbol::Bool],
            Schema::Int => vec![Symbol::Int],
            Schema::Long => vec![Symbol::Long],
            Schema::Float => vec![Symbol::Float],
            Schema::Double => vec![Symbol::Double],
            Schema::String => vec![Symbol::String],
            Schema::Bytes => vec![Symbol::Bytes],
            Schema::Fixed(fixed) => vec![Symbol::Fixed, Symbol::SizeCheck { size: fixed.size }],
            Schema::Enum(inner) => vec![
                Symbol::Enum,
                Symbol::SizeCheck {
                    size: inner.symbols.len(),
                },
            ],
            Schema::Record(record) => {
                // Records are always reached through an arena slot, which
                // is reserved before the fields are generated so that a
                // recursive reference finds it.
                if let Some(&slot) = self.memo.get(&record.name) {
                    return Ok(vec![Symbol::Indirect { production: slot }]);
                }
                let slot = self.builder.reserve();
                self.memo.insert(record.name.clone(), slot);
                let mut symbols = Vec::new();
                for field in &record.fields {
                    symbols.extend(self.generate_node(&field.schema)?);
                }
                self.builder.fill(slot, symbols);
                vec![Symbol::Indirect { production: slot }]
            }
            Schema::Array(inner) => {
                let body_symbols = self.generate_node(&inner.items)?;
                let body = self.builder.add(body_symbols);
                vec![
                    Symbol::ArrayStart,
                    Symbol::Repeater {
                        body,
                        backup: body,
                        count: 0,
                    },
                    Symbol::ArrayEnd,
                ]
            }
            Schema::Map(inner) => {
                // A map item is a string key followed by a value.
                let mut body_symbols = vec![Symbol::String];
                body_symbols.extend(self.generate_node(&inner.values)?);
                let body = self.builder.add(body_symbols);
                vec![
                    Symbol::MapStart,
                    Symbol::Repeater {
                        body,
                        backup: body,
                        count: 0,
                    },
                    Symbol::MapEnd,
                ]
            }
            Schema::Union(union) => {
                let mut branches = Vec::with_capacity(union.variants().len());
                for variant in union.variants() {
                    let symbols = self.generate_node(variant)?;
                    branches.push(self.builder.add(symbols));
                }
                vec![
                    Symbol::Union,
                    Symbol::Alternative {
                        branches: Arc::from(branches),
                    },
                ]
            }
            Schema::Ref { .. } => unreachable!("references are resolved above"),
        })
    }

    /// The production for one schema node, registered in the arena. Used
    /// for repeater bodies, union branches and writer-side skips.
    pub(crate) fn production_for(&mut self, schema: &Schema) -> AvroResult<usize> {
        let symbols = self.generate_node(schema)?;
        Ok(self.builder.add(symbols))
    }
}

/// An [`Encoder`] that validates the call sequence against a schema before
/// delegating to a base encoder. A call that violates the grammar fails
/// before any byte is written.
pub struct ValidatingEncoder<E> {
    base: E,
    parser: Parser,
}

impl<E: Encoder> ValidatingEncoder<E> {
    pub fn new(schema: &ValidSchema, base: E) -> AvroResult<Self> {
        let grammar = ValidatingGrammarGenerator::generate(schema)?;
        Ok(Self {
            base,
            parser: Parser::new(grammar),
        })
    }

    /// Consume the wrapper and return the base encoder.
    pub fn into_inner(self) -> E {
        self.base
    }
}

impl<E: Encoder> Encoder for ValidatingEncoder<E> {
    fn encode_null(&mut self) -> AvroResult<()> {
        self.parser.advance(SymbolKind::Null, &mut NoHandler)?;
        self.base.encode_null()
    }

    fn encode_bool(&mut self, b: bool) -> AvroResult<()> {
        self.parser.advance(SymbolKind::Bool, &mut NoHandler)?;
        self.base.encode_bool(b)
    }

    fn encode_int(&mut self, i: i32) -> AvroResult<()> {
        self.parser.advance(SymbolKind::Int, &mut NoHandler)?;
        self.base.encode_int(i)
    }

    fn encode_long(&mut self, l: i64) -> AvroResult<()> {
        self.parser.advance(SymbolKind::Long, &mut NoHandler)?;
        self.base.encode_long(l)
    }

    fn encode_float(&mut self, f: f32) -> AvroResult<()> {
        self.parser.advance(SymbolKind::Float, &mut NoHandler)?;
        self.base.encode_float(f)
    }

    fn encode_double(&mut self, d: f64) -> AvroResult<()> {
        self.parser.advance(SymbolKind::Double, &mut NoHandler)?;
        self.base.encode_double(d)
    }

    fn encode_string(&mut self, s: &str) -> AvroResult<()> {
        self.parser.advance(SymbolKind::String, &mut NoHandler)?;
        self.base.encode_string(s)
    }

    fn encode_bytes(&mut self, bytes: &[u8]) -> AvroResult<()> {
        self.parser.advance(SymbolKind::Bytes, &mut NoHandler)?;
        self.base.encode_bytes(bytes)
    }

    fn encode_fixed(&mut self, bytes: &[u8]) -> AvroResult<()> {
        self.parser.advance(SymbolKind::Fixed, &mut NoHandler)?;
        self.parser.assert_size(bytes.len())?;
        self.base.encode_fixed(bytes)
    }

    fn encode_enum(&mut self, index: usize) -> AvroResult<()> {
        self.parser.advance(SymbolKind::Enum, &mut NoHandler)?;
        self.parser.assert_less_than_size(index)?;
        self.base.encode_enum(index)
    }

    fn array_start(&mut self) -> AvroResult<()> {
        self.parser.advance(SymbolKind::ArrayStart, &mut NoHandler)?;
        self.base.array_start()
    }

    fn array_end(&mut self) -> AvroResult<()> {
        self.parser.pop_repeater()?;
        self.parser.advance(SymbolKind::ArrayEnd, &mut NoHandler)?;
        self.base.array_end()
    }

    fn map_start(&mut self) -> AvroResult<()> {
        self.parser.advance(SymbolKind::MapStart, &mut NoHandler)?;
        self.base.map_start()
    }

    fn map_end(&mut self) -> AvroResult<()> {
        self.parser.pop_repeater()?;
        self.parser.advance(SymbolKind::MapEnd, &mut NoHandler)?;
        self.base.map_end()
    }

    fn set_item_count(&mut self, count: usize) -> AvroResult<()> {
        self.parser.set_repeat_count(count)?;
        self.base.set_item_count(count)
    }

    fn start_item(&mut self) -> AvroResult<()> {
        if self.parser.top_kind() != SymbolKind::Repeater {
            return Err(Details::NotAtItemBoundary.into());
        }
        self.base.start_item()
    }

    fn encode_union_index(&mut self, index: usize) -> AvroResult<()> {
        self.parser.advance(SymbolKind::Union, &mut NoHandler)?;
        self.parser.select_branch(index)?;
        self.base.encode_union_index(index)
    }

    fn flush(&mut self) -> AvroResult<()> {
        self.base.flush()
    }
}

/// A [`Decoder`] that validates the call sequence against a schema before
/// delegating to a base decoder.
pub struct ValidatingDecoder<D> {
    base: D,
    parser: Parser,
}

impl<D: Decoder> ValidatingDecoder<D> {
    pub fn new(schema: &ValidSchema, base: D) -> AvroResult<Self> {
        let grammar = ValidatingGrammarGenerator::generate(schema)?;
        Ok(Self {
            base,
            parser: Parser::new(grammar),
        })
    }

    /// Consume the wrapper and return the base decoder.
    pub fn into_inner(self) -> D {
        self.base
    }

    fn block_boundary(&mut self, count: usize, end: SymbolKind) -> AvroResult<usize> {
        if count == 0 {
            self.parser.pop_repeater()?;
            self.parser.advance(end, &mut NoHandler)?;
        } else {
            self.parser.set_repeat_count(count)?;
        }
        Ok(count)
    }
}

impl<D: Decoder> Decoder for ValidatingDecoder<D> {
    fn decode_null(&mut self) -> AvroResult<()> {
        self.parser.advance(SymbolKind::Null, &mut NoHandler)?;
        self.base.decode_null()
    }

    fn decode_bool(&mut self) -> AvroResult<bool> {
        self.parser.advance(SymbolKind::Bool, &mut NoHandler)?;
        self.base.decode_bool()
    }

    fn decode_int(&mut self) -> AvroResult<i32> {
        self.parser.advance(SymbolKind::Int, &mut NoHandler)?;
        self.base.decode_int()
    }

    fn decode_long(&mut self) -> AvroResult<i64> {
        self.parser.advance(SymbolKind::Long, &mut NoHandler)?;
        self.base.decode_long()
    }

    fn decode_float(&mut self) -> AvroResult<f32> {
        self.parser.advance(SymbolKind::Float, &mut NoHandler)?;
        self.base.decode_float()
    }

    fn decode_double(&mut self) -> AvroResult<f64> {
        self.parser.advance(SymbolKind::Double, &mut NoHandler)?;
        self.base.decode_double()
    }

    fn decode_string(&mut self) -> AvroResult<String> {
        self.parser.advance(SymbolKind::String, &mut NoHandler)?;
        self.base.decode_string()
    }

    fn skip_string(&mut self) -> AvroResult<()> {
        self.parser.advance(SymbolKind::String, &mut NoHandler)?;
        self.base.skip_string()
    }

    fn decode_bytes(&mut self) -> AvroResult<Vec<u8>> {
        self.parser.advance(SymbolKind::Bytes, &mut NoHandler)?;
        self.base.decode_bytes()
    }

    fn skip_bytes(&mut self) -> AvroResult<()> {
        self.parser.advance(SymbolKind::Bytes, &mut NoHandler)?;
        self.base.skip_bytes()
    }

    fn decode_fixed(&mut self, len: usize) -> AvroResult<Vec<u8>> {
        self.parser.advance(SymbolKind::Fixed, &mut NoHandler)?;
        self.parser.assert_size(len)?;
        self.base.decode_fixed(len)
    }

    fn skip_fixed(&mut self, len: usize) -> AvroResult<()> {
        self.parser.advance(SymbolKind::Fixed, &mut NoHandler)?;
        self.parser.assert_size(len)?;
        self.base.skip_fixed(len)
    }

    fn decode_enum(&mut self) -> AvroResult<usize> {
        self.parser.advance(SymbolKind::Enum, &mut NoHandler)?;
        let index = self.base.decode_enum()?;
        self.parser.assert_less_than_size(index)?;
        Ok(index)
    }

    fn array_start(&mut self) -> AvroResult<usize> {
        self.parser.advance(SymbolKind::ArrayStart, &mut NoHandler)?;
        let count = self.base.array_start()?;
        self.block_boundary(count, SymbolKind::ArrayEnd)
    }

    fn array_next(&mut self) -> AvroResult<usize> {
        let count = self.base.array_next()?;
        self.block_boundary(count, SymbolKind::ArrayEnd)
    }

    fn skip_array(&mut self) -> AvroResult<usize> {
        self.parser.advance(SymbolKind::ArrayStart, &mut NoHandler)?;
        self.parser.skip_open_block(&mut self.base, true)?;
        Ok(0)
    }

    fn map_start(&mut self) -> AvroResult<usize> {
        self.parser.advance(SymbolKind::MapStart, &mut NoHandler)?;
        let count = self.base.map_start()?;
        self.block_boundary(count, SymbolKind::MapEnd)
    }

    fn map_next(&mut self) -> AvroResult<usize> {
        let count = self.base.map_next()?;
        self.block_boundary(count, SymbolKind::MapEnd)
    }

    fn skip_map(&mut self) -> AvroResult<usize> {
        self.parser.advance(SymbolKind::MapStart, &mut NoHandler)?;
        self.parser.skip_open_block(&mut self.base, false)?;
        Ok(0)
    }

    fn decode_union_index(&mut self) -> AvroResult<usize> {
        self.parser.advance(SymbolKind::Union, &mut NoHandler)?;
        let index = self.base.decode_union_index()?;
        self.parser.select_branch(index)?;
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        decode::BinaryDecoder,
        encode::BinaryEncoder,
        error::ErrorKind,
    };
    use pretty_assertions::assert_eq;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    const RECORD_SCHEMA: &str = r#"{"type":"record","name":"R","fields":[
        {"name":"i","type":"int"},
        {"name":"s","type":"string"}]}"#;

    #[test]
    fn test_encoder_transparency() -> TestResult {
        let schema = ValidSchema::parse_str(RECORD_SCHEMA)?;

        let mut plain = Vec::new();
        {
            let mut encoder = BinaryEncoder::new(&mut plain);
            encoder.encode_int(150)?;
            encoder.encode_string("hi")?;
        }

        let mut validated = Vec::new();
        {
            let mut encoder = ValidatingEncoder::new(&schema, BinaryEncoder::new(&mut validated))?;
            encoder.encode_int(150)?;
            encoder.encode_string("hi")?;
        }

        assert_eq!(plain, validated);
        assert_eq!(validated, [0xac, 0x02, 0x04, 0x68, 0x69]);
        Ok(())
    }

    #[test]
    fn test_encoder_rejects_wrong_call_before_any_byte_moves() -> TestResult {
        let schema = ValidSchema::parse_str(RECORD_SCHEMA)?;
        let mut buffer = Vec::new();
        let mut encoder = ValidatingEncoder::new(&schema, BinaryEncoder::new(&mut buffer))?;
        let err = encoder.encode_string("out of order").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        drop(encoder);
        assert!(buffer.is_empty());
        Ok(())
    }

    #[test]
    fn test_decoder_round_trip() -> TestResult {
        let schema = ValidSchema::parse_str(RECORD_SCHEMA)?;
        let data: &[u8] = &[0xac, 0x02, 0x04, 0x68, 0x69];
        let mut decoder = ValidatingDecoder::new(&schema, BinaryDecoder::new(data))?;
        assert_eq!(decoder.decode_int()?, 150);
        assert_eq!(decoder.decode_string()?, "hi");
        Ok(())
    }

    #[test]
    fn test_fixed_length_mismatch() -> TestResult {
        let schema = ValidSchema::parse_str(r#"{"type":"fixed","name":"F","size":4}"#)?;
        let mut buffer = Vec::new();
        let mut encoder = ValidatingEncoder::new(&schema, BinaryEncoder::new(&mut buffer))?;
        assert!(encoder.encode_fixed(b"abc").is_err());
        Ok(())
    }

    #[test]
    fn test_enum_index_out_of_range() -> TestResult {
        let schema =
            ValidSchema::parse_str(r#"{"type":"enum","name":"E","symbols":["X","Y","Z"]}"#)?;
        let mut buffer = Vec::new();
        let mut encoder = ValidatingEncoder::new(&schema, BinaryEncoder::new(&mut buffer))?;
        assert!(encoder.encode_enum(3).is_err());

        // The decoder checks the decoded index the same way.
        let data: &[u8] = &[0x08]; // index 4
        let mut decoder = ValidatingDecoder::new(&schema, BinaryDecoder::new(data))?;
        assert!(decoder.decode_enum().is_err());
        Ok(())
    }

    #[test]
    fn test_array_protocol() -> TestResult {
        let schema = ValidSchema::parse_str(r#"{"type":"array","items":"int"}"#)?;
        let mut buffer = Vec::new();
        {
            let mut encoder = ValidatingEncoder::new(&schema, BinaryEncoder::new(&mut buffer))?;
            encoder.array_start()?;
            encoder.set_item_count(3)?;
            for i in [1, 2, 3] {
                encoder.start_item()?;
                encoder.encode_int(i)?;
            }
            encoder.array_end()?;
        }
        assert_eq!(buffer, [0x06, 0x02, 0x04, 0x06, 0x00]);

        let mut decoder = ValidatingDecoder::new(&schema, BinaryDecoder::new(&buffer[..]))?;
        let mut items = Vec::new();
        let mut count = decoder.array_start()?;
        while count != 0 {
            for _ in 0..count {
                items.push(decoder.decode_int()?);
            }
            count = decoder.array_next()?;
        }
        assert_eq!(items, [1, 2, 3]);
        Ok(())
    }

    #[test]
    fn test_array_end_with_outstanding_items() -> TestResult {
        let schema = ValidSchema::parse_str(r#"{"type":"array","items":"int"}"#)?;
        let mut buffer = Vec::new();
        let mut encoder = ValidatingEncoder::new(&schema, BinaryEncoder::new(&mut buffer))?;
        encoder.array_start()?;
        encoder.set_item_count(2)?;
        encoder.start_item()?;
        encoder.encode_int(1)?;
        assert!(encoder.array_end().is_err());
        Ok(())
    }

    #[test]
    fn test_union_branch_selection() -> TestResult {
        let schema = ValidSchema::parse_str(r#"["null","string"]"#)?;
        let mut buffer = Vec::new();
        {
            let mut encoder = ValidatingEncoder::new(&schema, BinaryEncoder::new(&mut buffer))?;
            encoder.encode_union_index(1)?;
            encoder.encode_string("foo")?;
        }
        assert_eq!(buffer, [0x02, 0x06, 0x66, 0x6f, 0x6f]);

        let mut decoder = ValidatingDecoder::new(&schema, BinaryDecoder::new(&buffer[..]))?;
        assert_eq!(decoder.decode_union_index()?, 1);
        assert_eq!(decoder.decode_string()?, "foo");
        Ok(())
    }

    #[test]
    fn test_skip_array_leaves_stream_aligned() -> TestResult {
        let schema = ValidSchema::parse_str(
            r#"{"type":"record","name":"R","fields":[
                {"name":"a","type":{"type":"array","items":"string"}},
                {"name":"tail","type":"long"}]}"#,
        )?;
        let mut buffer = Vec::new();
        {
            let mut encoder = ValidatingEncoder::new(&schema, BinaryEncoder::new(&mut buffer))?;
            encoder.array_start()?;
            encoder.set_item_count(2)?;
            encoder.start_item()?;
            encoder.encode_string("a")?;
            encoder.start_item()?;
            encoder.encode_string("bc")?;
            encoder.array_end()?;
            encoder.encode_long(7)?;
        }
        let mut decoder = ValidatingDecoder::new(&schema, BinaryDecoder::new(&buffer[..]))?;
        assert_eq!(decoder.skip_array()?, 0);
        assert_eq!(decoder.decode_long()?, 7);
        Ok(())
    }

    #[test]
    fn test_recursive_schema_grammar() -> TestResult {
        let schema = ValidSchema::parse_str(
            r#"{"type":"record","name":"Node","fields":[
                {"name":"next","type":["null","Node"]}]}"#,
        )?;
        let mut buffer = Vec::new();
        {
            let mut encoder = ValidatingEncoder::new(&schema, BinaryEncoder::new(&mut buffer))?;
            // Two nodes deep, then null.
            encoder.encode_union_index(1)?;
            encoder.encode_union_index(1)?;
            encoder.encode_union_index(0)?;
            encoder.encode_null()?;
        }
        assert_eq!(buffer, [0x02, 0x02, 0x00]);
        Ok(())
    }
}
