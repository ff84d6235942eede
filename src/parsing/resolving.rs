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
    decode::{BinaryDecoder, Decoder},
    encode::BinaryEncoder,
    error::Details,
    generic::write_datum,
    parsing::symbol::{Grammar, GrammarBuilder, Parser, ParserHandler, Symbol, SymbolKind},
    parsing::validating::ValidatingGrammarGenerator,
    schema::{Name, Names, Schema, SchemaKind, UnionSchema, ValidSchema, resolve_ref},
};
use log::warn;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

/// Which symbol table resolves references on the writer side of a pair.
///
/// The main grammar resolves the writer against the writer's table; the
/// sub-grammars spliced in for reader defaults resolve the reader schema
/// against itself, so both sides use the reader's table there.
type Side = bool;
const WRITER_SIDE: Side = false;
const READER_SIDE: Side = true;

/// Compiles a (writer, reader) schema pair into one grammar whose
/// terminals match the writer's bytes while its actions shape the output
/// like the reader: numeric promotions, writer-only skips, spliced
/// defaults, enum translation and union adjustment.
pub(crate) struct ResolvingGrammarGenerator<'a> {
    builder: GrammarBuilder,
    writer_names: &'a Names,
    reader_names: &'a Names,
    /// Memoized record pairs; reserved before the fields are resolved so
    /// recursive pairs find the slot in flight.
    pair_memo: HashMap<(Name, Name, Side), usize>,
    /// Memoized writer-only skip productions, per symbol table.
    writer_skip_memo: HashMap<Name, usize>,
    reader_skip_memo: HashMap<Name, usize>,
}

impl<'a> ResolvingGrammarGenerator<'a> {
    pub(crate) fn generate(
        writer: &'a ValidSchema,
        reader: &'a ValidSchema,
    ) -> AvroResult<Arc<Grammar>> {
        let mut generator = Self {
            builder: GrammarBuilder::new(),
            writer_names: writer.names(),
            reader_names: reader.names(),
            pair_memo: HashMap::new(),
            writer_skip_memo: HashMap::new(),
            reader_skip_memo: HashMap::new(),
        };
        let root = generator.generate_pair(writer.root(), reader.root(), WRITER_SIDE)?;
        Ok(generator.builder.build(root))
    }

    fn writer_table(&self, side: Side) -> &'a Names {
        if side == READER_SIDE {
            self.reader_names
        } else {
            self.writer_names
        }
    }

    /// The writer-side validating production for `schema`: identical to
    /// the single-schema grammar, used where writer bytes are consumed
    /// without reader output (skipped fields, block skips).
    fn writer_production(&mut self, schema: &Schema, side: Side) -> AvroResult<usize> {
        let names = self.writer_table(side);
        let memo = if side == READER_SIDE {
            &mut self.reader_skip_memo
        } else {
            &mut self.writer_skip_memo
        };
        ValidatingGrammarGenerator::new(&mut self.builder, names, memo).production_for(schema)
    }

    /// The symbols resolving one writer/reader pair, in grammar order.
    fn generate_pair(
        &mut self,
        writer: &Schema,
        reader: &Schema,
        side: Side,
    ) -> AvroResult<Vec<Symbol>> {
        let writer = resolve_ref(writer, self.writer_table(side))?;
        let reader = resolve_ref(reader, self.reader_names)?;
        let writer_kind = SchemaKind::from(writer);
        let reader_kind = SchemaKind::from(reader);

        if writer_kind == reader_kind {
            match (writer, reader) {
                (Schema::Null, _) => return Ok(vec![Symbol::Null]),
                (Schema::Boolean, _) => return Ok(vec![Symbol::Bool]),
                (Schema::Int, _) => return Ok(vec![Symbol::Int]),
                (Schema::Long, _) => return Ok(vec![Symbol::Long]),
                (Schema::Float, _) => return Ok(vec![Symbol::Float]),
                (Schema::Double, _) => return Ok(vec![Symbol::Double]),
                (Schema::String, _) => return Ok(vec![Symbol::String]),
                (Schema::Bytes, _) => return Ok(vec![Symbol::Bytes]),
                (Schema::Fixed(w), Schema::Fixed(r)) => {
                    if w.name == r.name && w.size == r.size {
                        return Ok(vec![Symbol::Fixed, Symbol::SizeCheck { size: r.size }]);
                    }
                }
                (Schema::Record(w), Schema::Record(r)) => {
                    if w.name == r.name {
                        let key = (w.name.clone(), r.name.clone(), side);
                        if let Some(&slot) = self.pair_memo.get(&key) {
                            return Ok(vec![Symbol::Indirect { production: slot }]);
                        }
                        let slot = self.builder.reserve();
                        self.pair_memo.insert(key, slot);
                        let symbols = self.resolve_records(writer, reader, side)?;
                        self.builder.fill(slot, symbols);
                        return Ok(vec![Symbol::Indirect { production: slot }]);
                    }
                }
                (Schema::Enum(w), Schema::Enum(r)) => {
                    if w.name == r.name {
                        let mapping: Vec<Result<usize, String>> = w
                            .symbols
                            .iter()
                            .map(|symbol| r.symbol_index(symbol).ok_or_else(|| symbol.clone()))
                            .collect();
                        return Ok(vec![
                            Symbol::Enum,
                            Symbol::EnumAdjust {
                                mapping: Arc::from(mapping),
                            },
                        ]);
                    }
                }
                (Schema::Array(w), Schema::Array(r)) => {
                    let body_symbols = self.generate_pair(&w.items, &r.items, side)?;
                    let body = self.builder.add(body_symbols);
                    let backup = self.writer_production(&w.items, side)?;
                    return Ok(vec![
                        Symbol::ArrayStart,
                        Symbol::Repeater {
                            body,
                            backup,
                            count: 0,
                        },
                        Symbol::ArrayEnd,
                    ]);
                }
                (Schema::Map(w), Schema::Map(r)) => {
                    let mut body_symbols = vec![Symbol::String];
                    body_symbols.extend(self.generate_pair(&w.values, &r.values, side)?);
                    let body = self.builder.add(body_symbols);

                    let mut backup_symbols = vec![Symbol::String];
                    let values_backup = self.writer_production(&w.values, side)?;
                    backup_symbols.push(Symbol::Indirect {
                        production: values_backup,
                    });
                    let backup = self.builder.add(backup_symbols);
                    return Ok(vec![
                        Symbol::MapStart,
                        Symbol::Repeater {
                            body,
                            backup,
                            count: 0,
                        },
                        Symbol::MapEnd,
                    ]);
                }
                (Schema::Union(w), _) => {
                    return self.resolve_union(w, reader, side);
                }
                _ => {}
            }
        } else if let Schema::Union(w) = writer {
            return self.resolve_union(w, reader, side);
        } else {
            match (writer_kind, reader) {
                (SchemaKind::Int, Schema::Long) => {
                    return Ok(vec![Symbol::Resolve {
                        writer: SymbolKind::Int,
                        reader: SymbolKind::Long,
                    }]);
                }
                (SchemaKind::Int | SchemaKind::Long, Schema::Float) => {
                    return Ok(vec![Symbol::Resolve {
                        writer: terminal_for(writer_kind),
                        reader: SymbolKind::Float,
                    }]);
                }
                (SchemaKind::Int | SchemaKind::Long | SchemaKind::Float, Schema::Double) => {
                    return Ok(vec![Symbol::Resolve {
                        writer: terminal_for(writer_kind),
                        reader: SymbolKind::Double,
                    }]);
                }
                (_, Schema::Union(r)) => {
                    if let Some(branch) = self.best_branch(writer, r)? {
                        let symbols =
                            self.generate_pair(writer, &r.variants()[branch], side)?;
                        let production = self.builder.add(symbols);
                        return Ok(vec![
                            Symbol::Union,
                            Symbol::UnionAdjust { branch, production },
                        ]);
                    }
                }
                _ => {}
            }
        }

        let writer_name = writer.branch_name();
        let reader_name = reader.branch_name();
        warn!("No resolution from writer {writer_name} to reader {reader_name}");
        Ok(vec![Symbol::Error {
            writer: Arc::from(writer_name),
            reader: Arc::from(reader_name),
        }])
    }

    /// Writer is a union: one alternative per writer branch, selected at
    /// decode time by the writer's branch index.
    fn resolve_union(
        &mut self,
        writer: &UnionSchema,
        reader: &Schema,
        side: Side,
    ) -> AvroResult<Vec<Symbol>> {
        let mut branches = Vec::with_capacity(writer.variants().len());
        for branch in writer.variants() {
            let symbols = self.generate_pair(branch, reader, side)?;
            branches.push(self.builder.add(symbols));
        }
        Ok(vec![
            Symbol::WriterUnion,
            Symbol::Alternative {
                branches: Arc::from(branches),
            },
        ])
    }

    /// The first reader branch the writer resolves into: an exact type
    /// (and, for named types, name) match wins, then the first branch the
    /// writer promotes into.
    fn best_branch(
        &self,
        writer: &Schema,
        reader: &UnionSchema,
    ) -> AvroResult<Option<usize>> {
        let writer_kind = SchemaKind::from(writer);
        for (index, branch) in reader.variants().iter().enumerate() {
            let branch = resolve_ref(branch, self.reader_names)?;
            if SchemaKind::from(branch) == writer_kind {
                match branch.name() {
                    Some(name) => {
                        if Some(name) == writer.name() {
                            return Ok(Some(index));
                        }
                    }
                    None => return Ok(Some(index)),
                }
            }
        }
        for (index, branch) in reader.variants().iter().enumerate() {
            let branch_kind = SchemaKind::from(resolve_ref(branch, self.reader_names)?);
            let promotes = match writer_kind {
                SchemaKind::Int => matches!(
                    branch_kind,
                    SchemaKind::Long | SchemaKind::Float | SchemaKind::Double
                ),
                SchemaKind::Long => {
                    matches!(branch_kind, SchemaKind::Float | SchemaKind::Double)
                }
                SchemaKind::Float => branch_kind == SchemaKind::Double,
                _ => false,
            };
            if promotes {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    /// Resolve two records with the same name, field by field: matched
    /// fields recurse, writer-only fields are skipped, reader-only fields
    /// are filled from their pre-encoded defaults, and the resulting
    /// reader field order is recorded for [`Decoder::field_order`].
    fn resolve_records(
        &mut self,
        writer: &Schema,
        reader: &Schema,
        side: Side,
    ) -> AvroResult<Vec<Symbol>> {
        let (Schema::Record(writer), Schema::Record(reader)) = (writer, reader) else {
            unreachable!("resolve_records is only called for record pairs");
        };

        let mut field_symbols = Vec::new();
        let mut field_order = Vec::with_capacity(reader.fields.len());
        let mut matched = vec![false; reader.fields.len()];

        for writer_field in &writer.fields {
            match reader.field_index(&writer_field.name) {
                Some(reader_index) => {
                    field_symbols.extend(self.generate_pair(
                        &writer_field.schema,
                        &reader.fields[reader_index].schema,
                        side,
                    )?);
                    field_order.push(reader_index);
                    matched[reader_index] = true;
                }
                None => {
                    // No reader counterpart: consume the writer bytes.
                    let production = self.writer_production(&writer_field.schema, side)?;
                    field_symbols.push(Symbol::SkipStart);
                    field_symbols.push(self.single_symbol_or_indirect(production));
                }
            }
        }

        for (reader_index, reader_field) in reader.fields.iter().enumerate() {
            if matched[reader_index] {
                continue;
            }
            let default = reader_field
                .default
                .as_ref()
                .ok_or_else(|| Details::MissingDefault(reader_field.name.clone()))?;

            // Pre-encode the default once; at run time the parser splices
            // in a binary sub-decoder over these bytes.
            let mut data = Vec::new();
            write_datum(
                default,
                &reader_field.schema,
                self.reader_names,
                &mut BinaryEncoder::new(&mut data),
            )?;

            field_symbols.push(Symbol::DefaultStart {
                data: Arc::from(data),
            });
            // Reader resolved against itself, so the sub-decoder and the
            // grammar agree on the default bytes.
            field_symbols.extend(self.generate_pair(
                &reader_field.schema,
                &reader_field.schema,
                READER_SIDE,
            )?);
            field_symbols.push(Symbol::DefaultEnd);
            field_order.push(reader_index);
        }

        let mut symbols = vec![
            Symbol::Record,
            Symbol::SizeList {
                order: Arc::from(field_order),
            },
        ];
        symbols.extend(field_symbols);
        Ok(symbols)
    }

    /// A one-symbol production is inlined after [`Symbol::SkipStart`];
    /// anything longer is reached through an indirection so the skip
    /// consumes exactly one top-of-stack item.
    fn single_symbol_or_indirect(&self, production: usize) -> Symbol {
        match self.builder.single_symbol(production) {
            Some(symbol) => symbol,
            None => Symbol::Indirect { production },
        }
    }
}

fn terminal_for(kind: SchemaKind) -> SymbolKind {
    match kind {
        SchemaKind::Int => SymbolKind::Int,
        SchemaKind::Long => SymbolKind::Long,
        SchemaKind::Float => SymbolKind::Float,
        _ => unreachable!("only numeric writers are promoted"),
    }
}

/// The byte source of a [`ResolvingDecoder`]: the caller's base decoder,
/// temporarily shadowed by a binary sub-decoder while a spliced default
/// value is being read.
#[derive(Debug)]
struct Source<D> {
    base: D,
    default_decoder: Option<BinaryDecoder<Cursor<Arc<[u8]>>>>,
}

impl<D: Decoder> Source<D> {
    fn current(&mut self) -> &mut dyn Decoder {
        match &mut self.default_decoder {
            Some(decoder) => decoder,
            None => &mut self.base,
        }
    }
}

impl<D: Decoder> ParserHandler for Source<D> {
    fn handle(&mut self, symbol: &Symbol) -> AvroResult<usize> {
        match symbol {
            Symbol::WriterUnion => self.current().decode_union_index(),
            Symbol::DefaultStart { data } => {
                debug_assert!(self.default_decoder.is_none(), "default splices do not nest");
                self.default_decoder = Some(BinaryDecoder::new(Cursor::new(Arc::clone(data))));
                Ok(0)
            }
            Symbol::DefaultEnd => {
                self.default_decoder = None;
                Ok(0)
            }
            _ => Ok(0),
        }
    }

    fn skip_decoder(&mut self) -> Option<&mut dyn Decoder> {
        Some(self.current())
    }
}

/// A [`Decoder`] that reads data written with a writer schema and presents
/// it shaped like a reader schema.
///
/// Use it exactly as the reader schema dictates; writer-only fields are
/// skipped, reader-only fields materialize from their defaults, numeric
/// promotions widen transparently, and [`field_order`](Decoder::field_order)
/// tells record consumers which reader field comes next on the wire.
#[derive(Debug)]
pub struct ResolvingDecoder<D> {
    source: Source<D>,
    parser: Parser,
}

impl<D: Decoder> ResolvingDecoder<D> {
    /// Build the resolving grammar for the pair and wrap `base`.
    ///
    /// Fails with a resolution error if a reader field is missing from the
    /// writer and has no default; incompatibilities that depend on the
    /// data (mismatched branches, missing enum symbols) fail only when
    /// actually decoded.
    pub fn new(writer: &ValidSchema, reader: &ValidSchema, base: D) -> AvroResult<Self> {
        let grammar = ResolvingGrammarGenerator::generate(writer, reader)?;
        Ok(Self {
            source: Source {
                base,
                default_decoder: None,
            },
            parser: Parser::new(grammar),
        })
    }

    /// Consume the wrapper and return the base decoder.
    pub fn into_inner(self) -> D {
        self.source.base
    }

    fn block_boundary(&mut self, count: usize, end: SymbolKind) -> AvroResult<usize> {
        if count == 0 {
            self.parser.pop_repeater()?;
            self.parser.advance(end, &mut self.source)?;
        } else {
            self.parser.set_repeat_count(count)?;
        }
        Ok(count)
    }
}

impl<D: Decoder> Decoder for ResolvingDecoder<D> {
    fn decode_null(&mut self) -> AvroResult<()> {
        self.parser.advance(SymbolKind::Null, &mut self.source)?;
        self.source.current().decode_null()
    }

    fn decode_bool(&mut self) -> AvroResult<bool> {
        self.parser.advance(SymbolKind::Bool, &mut self.source)?;
        self.source.current().decode_bool()
    }

    fn decode_int(&mut self) -> AvroResult<i32> {
        self.parser.advance(SymbolKind::Int, &mut self.source)?;
        self.source.current().decode_int()
    }

    fn decode_long(&mut self) -> AvroResult<i64> {
        let on_wire = self.parser.advance(SymbolKind::Long, &mut self.source)?;
        match on_wire {
            SymbolKind::Int => self.source.current().decode_int().map(i64::from),
            _ => self.source.current().decode_long(),
        }
    }

    fn decode_float(&mut self) -> AvroResult<f32> {
        let on_wire = self.parser.advance(SymbolKind::Float, &mut self.source)?;
        match on_wire {
            SymbolKind::Int => self.source.current().decode_int().map(|v| v as f32),
            SymbolKind::Long => self.source.current().decode_long().map(|v| v as f32),
            _ => self.source.current().decode_float(),
        }
    }

    fn decode_double(&mut self) -> AvroResult<f64> {
        let on_wire = self.parser.advance(SymbolKind::Double, &mut self.source)?;
        match on_wire {
            SymbolKind::Int => self.source.current().decode_int().map(f64::from),
            SymbolKind::Long => self.source.current().decode_long().map(|v| v as f64),
            SymbolKind::Float => self.source.current().decode_float().map(f64::from),
            _ => self.source.current().decode_double(),
        }
    }

    fn decode_string(&mut self) -> AvroResult<String> {
        self.parser.advance(SymbolKind::String, &mut self.source)?;
        self.source.current().decode_string()
    }

    fn skip_string(&mut self) -> AvroResult<()> {
        self.parser.advance(SymbolKind::String, &mut self.source)?;
        self.source.current().skip_string()
    }

    fn decode_bytes(&mut self) -> AvroResult<Vec<u8>> {
        self.parser.advance(SymbolKind::Bytes, &mut self.source)?;
        self.source.current().decode_bytes()
    }

    fn skip_bytes(&mut self) -> AvroResult<()> {
        self.parser.advance(SymbolKind::Bytes, &mut self.source)?;
        self.source.current().skip_bytes()
    }

    fn decode_fixed(&mut self, len: usize) -> AvroResult<Vec<u8>> {
        self.parser.advance(SymbolKind::Fixed, &mut self.source)?;
        self.parser.assert_size(len)?;
        self.source.current().decode_fixed(len)
    }

    fn skip_fixed(&mut self, len: usize) -> AvroResult<()> {
        self.parser.advance(SymbolKind::Fixed, &mut self.source)?;
        self.parser.assert_size(len)?;
        self.source.current().skip_fixed(len)
    }

    fn decode_enum(&mut self) -> AvroResult<usize> {
        self.parser.advance(SymbolKind::Enum, &mut self.source)?;
        let index = self.source.current().decode_enum()?;
        self.parser.enum_adjust(index)
    }

    fn array_start(&mut self) -> AvroResult<usize> {
        self.parser
            .advance(SymbolKind::ArrayStart, &mut self.source)?;
        let count = self.source.current().array_start()?;
        self.block_boundary(count, SymbolKind::ArrayEnd)
    }

    fn array_next(&mut self) -> AvroResult<usize> {
        self.parser.process_implicit_actions(&mut self.source)?;
        let count = self.source.current().array_next()?;
        self.block_boundary(count, SymbolKind::ArrayEnd)
    }

    fn skip_array(&mut self) -> AvroResult<usize> {
        self.parser
            .advance(SymbolKind::ArrayStart, &mut self.source)?;
        let decoder = self.source.current();
        self.parser.skip_open_block(decoder, true)?;
        Ok(0)
    }

    fn map_start(&mut self) -> AvroResult<usize> {
        self.parser.advance(SymbolKind::MapStart, &mut self.source)?;
        let count = self.source.current().map_start()?;
        self.block_boundary(count, SymbolKind::MapEnd)
    }

    fn map_next(&mut self) -> AvroResult<usize> {
        self.parser.process_implicit_actions(&mut self.source)?;
        let count = self.source.current().map_next()?;
        self.block_boundary(count, SymbolKind::MapEnd)
    }

    fn skip_map(&mut self) -> AvroResult<usize> {
        self.parser.advance(SymbolKind::MapStart, &mut self.source)?;
        let decoder = self.source.current();
        self.parser.skip_open_block(decoder, false)?;
        Ok(0)
    }

    fn decode_union_index(&mut self) -> AvroResult<usize> {
        self.parser.advance(SymbolKind::Union, &mut self.source)?;
        self.parser.union_adjust()
    }

    fn field_order(&mut self) -> AvroResult<Option<Vec<usize>>> {
        self.parser.advance(SymbolKind::Record, &mut self.source)?;
        self.parser.size_list().map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        encode::Encoder,
        error::ErrorKind,
    };
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::io::Read;
    use std::rc::Rc;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    /// A reader that shares the count of bytes handed out, for observing
    /// stream positions mid-decode.
    struct CountingReader<R> {
        inner: R,
        count: Rc<Cell<u64>>,
    }

    impl<R: Read> Read for CountingReader<R> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = self.inner.read(buf)?;
            self.count.set(self.count.get() + n as u64);
            Ok(n)
        }
    }

    fn resolving<'a>(
        writer: &str,
        reader: &str,
        data: &'a [u8],
    ) -> AvroResult<ResolvingDecoder<BinaryDecoder<&'a [u8]>>> {
        let writer = ValidSchema::parse_str(writer).unwrap();
        let reader = ValidSchema::parse_str(reader).unwrap();
        ResolvingDecoder::new(&writer, &reader, BinaryDecoder::new(data))
    }

    #[test]
    fn test_identity_resolution() -> TestResult {
        let schema = r#"{"type":"record","name":"R","fields":[
            {"name":"i","type":"int"},{"name":"s","type":"string"}]}"#;
        let data: &[u8] = &[0xac, 0x02, 0x04, 0x68, 0x69];
        let mut decoder = resolving(schema, schema, data)?;
        assert_eq!(decoder.field_order()?, Some(vec![0, 1]));
        assert_eq!(decoder.decode_int()?, 150);
        assert_eq!(decoder.decode_string()?, "hi");
        Ok(())
    }

    #[test]
    fn test_int_to_long_promotion() -> TestResult {
        let data: &[u8] = &[0x54]; // int 42
        let mut decoder = resolving(r#""int""#, r#""long""#, data)?;
        assert_eq!(decoder.decode_long()?, 42);
        Ok(())
    }

    #[test]
    fn test_long_to_double_promotion() -> TestResult {
        let mut data = Vec::new();
        BinaryEncoder::new(&mut data).encode_long(1 << 40)?;
        let mut decoder = resolving(r#""long""#, r#""double""#, &data)?;
        assert_eq!(decoder.decode_double()?, (1u64 << 40) as f64);
        Ok(())
    }

    #[test]
    fn test_projection_skips_writer_field() -> TestResult {
        let writer = r#"{"type":"record","name":"R","fields":[
            {"name":"a","type":"int"},
            {"name":"dropped","type":"string"},
            {"name":"b","type":"long"}]}"#;
        let reader = r#"{"type":"record","name":"R","fields":[
            {"name":"a","type":"int"},
            {"name":"b","type":"long"}]}"#;
        let mut data = Vec::new();
        {
            let mut encoder = BinaryEncoder::new(&mut data);
            encoder.encode_int(7)?;
            encoder.encode_string("gone")?;
            encoder.encode_long(9)?;
        }
        let mut decoder = resolving(writer, reader, &data)?;
        assert_eq!(decoder.field_order()?, Some(vec![0, 1]));
        assert_eq!(decoder.decode_int()?, 7);
        assert_eq!(decoder.decode_long()?, 9);
        Ok(())
    }

    #[test]
    fn test_reader_default_is_spliced() -> TestResult {
        let writer = r#"{"type":"record","name":"R","fields":[
            {"name":"a","type":"int"}]}"#;
        let reader = r#"{"type":"record","name":"R","fields":[
            {"name":"a","type":"int"},
            {"name":"b","type":"int","default":99}]}"#;
        let data: &[u8] = &[0x0e]; // a = 7
        let mut decoder = resolving(writer, reader, data)?;
        assert_eq!(decoder.field_order()?, Some(vec![0, 1]));
        assert_eq!(decoder.decode_int()?, 7);
        assert_eq!(decoder.decode_int()?, 99);
        Ok(())
    }

    #[test]
    fn test_missing_default_fails_at_generation() {
        let writer = r#"{"type":"record","name":"R","fields":[
            {"name":"a","type":"int"}]}"#;
        let reader = r#"{"type":"record","name":"R","fields":[
            {"name":"a","type":"int"},
            {"name":"b","type":"int"}]}"#;
        let err = resolving(writer, reader, &[]).map(|_| ()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Resolution);
    }

    #[test]
    fn test_enum_adjustment() -> TestResult {
        let writer = r#"{"type":"enum","name":"E","symbols":["X","Y","Z"]}"#;
        let reader = r#"{"type":"enum","name":"E","symbols":["Y","Z"]}"#;

        // The writer wrote Y (index 1); the reader sees its own index 0.
        let data: &[u8] = &[0x02];
        let mut decoder = resolving(writer, reader, data)?;
        assert_eq!(decoder.decode_enum()?, 0);

        // The writer wrote X, which the reader does not declare.
        let data: &[u8] = &[0x00];
        let mut decoder = resolving(writer, reader, data)?;
        let err = decoder.decode_enum().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Resolution);
        Ok(())
    }

    #[test]
    fn test_writer_union_to_scalar_reader() -> TestResult {
        let writer = r#"["int","string"]"#;
        let reader = r#""string""#;

        let mut data = Vec::new();
        {
            let mut encoder = BinaryEncoder::new(&mut data);
            encoder.encode_union_index(1)?;
            encoder.encode_string("foo")?;
        }
        let mut decoder = resolving(writer, reader, &data)?;
        assert_eq!(decoder.decode_string()?, "foo");

        // Branch 0 (int) cannot resolve to a string reader.
        let mut data = Vec::new();
        {
            let mut encoder = BinaryEncoder::new(&mut data);
            encoder.encode_union_index(0)?;
            encoder.encode_int(5)?;
        }
        let mut decoder = resolving(writer, reader, &data)?;
        let err = decoder.decode_string().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Resolution);
        Ok(())
    }

    #[test]
    fn test_scalar_writer_to_union_reader() -> TestResult {
        let writer = r#""string""#;
        let reader = r#"["null","string"]"#;
        let mut data = Vec::new();
        BinaryEncoder::new(&mut data).encode_string("pick me")?;
        let mut decoder = resolving(writer, reader, &data)?;
        assert_eq!(decoder.decode_union_index()?, 1);
        assert_eq!(decoder.decode_string()?, "pick me");
        Ok(())
    }

    #[test]
    fn test_best_branch_promotes_long_to_float() -> TestResult {
        let writer = r#""long""#;
        let reader = r#"["string","float"]"#;
        let mut data = Vec::new();
        BinaryEncoder::new(&mut data).encode_long(12)?;
        let mut decoder = resolving(writer, reader, &data)?;
        assert_eq!(decoder.decode_union_index()?, 1);
        assert_eq!(decoder.decode_float()?, 12.0);
        Ok(())
    }

    #[test]
    fn test_array_item_promotion() -> TestResult {
        let writer = r#"{"type":"array","items":"int"}"#;
        let reader = r#"{"type":"array","items":"double"}"#;
        let data: &[u8] = &[0x06, 0x02, 0x04, 0x06, 0x00];
        let mut decoder = resolving(writer, reader, data)?;
        let mut items = Vec::new();
        let mut count = decoder.array_start()?;
        while count != 0 {
            for _ in 0..count {
                items.push(decoder.decode_double()?);
            }
            count = decoder.array_next()?;
        }
        assert_eq!(items, [1.0, 2.0, 3.0]);
        Ok(())
    }

    #[test]
    fn test_trailing_skipped_field_is_drained() -> TestResult {
        // The skipped writer field comes after the last reader field, so
        // it is consumed when the next datum begins. The counting reader
        // observes exactly when its bytes leave the stream.
        let writer = r#"{"type":"record","name":"R","fields":[
            {"name":"a","type":"int"},
            {"name":"tail","type":"string"}]}"#;
        let reader = r#"{"type":"record","name":"R","fields":[
            {"name":"a","type":"int"}]}"#;
        let mut data = Vec::new();
        {
            let mut encoder = BinaryEncoder::new(&mut data);
            // Two consecutive data on one stream; each "tail" value takes
            // nine bytes (one length byte plus eight characters).
            encoder.encode_int(1)?;
            encoder.encode_string("skip one")?;
            encoder.encode_int(2)?;
            encoder.encode_string("skip two")?;
        }

        let writer = ValidSchema::parse_str(writer)?;
        let reader_schema = ValidSchema::parse_str(reader)?;
        let position = Rc::new(Cell::new(0));
        let stream = CountingReader {
            inner: &data[..],
            count: Rc::clone(&position),
        };
        let mut decoder =
            ResolvingDecoder::new(&writer, &reader_schema, BinaryDecoder::new(stream))?;

        assert_eq!(decoder.field_order()?, Some(vec![0]));
        assert_eq!(decoder.decode_int()?, 1);
        assert_eq!(position.get(), 1);

        // Starting the second datum drains the first one's trailing field.
        assert_eq!(decoder.field_order()?, Some(vec![0]));
        assert_eq!(position.get(), 10);
        assert_eq!(decoder.decode_int()?, 2);
        assert_eq!(position.get(), 11);

        // The last datum's trailing field likewise drains when the next
        // datum boundary is reached, leaving the stream fully consumed.
        assert_eq!(decoder.field_order()?, Some(vec![0]));
        assert_eq!(position.get(), data.len() as u64);
        Ok(())
    }
}
