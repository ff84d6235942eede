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

//! The JSON codec: a human-readable rendition of the same data the binary
//! codec carries, driven by the same grammar family.
//!
//! Records become objects in schema field order, arrays become arrays,
//! maps become objects, enums become symbol-name strings, bytes and fixed
//! become strings carrying one byte per code point, and a non-null union
//! branch becomes a single-key object named after the branch. The
//! structural tokens JSON needs beyond the binary form are contributed by
//! action symbols in the JSON grammar.

use crate::{
    AvroResult,
    decode::Decoder,
    encode::Encoder,
    error::Details,
    parsing::{Grammar, GrammarBuilder, Parser, ParserHandler, Symbol, SymbolKind},
    schema::{Name, Names, Schema, ValidSchema, resolve_ref, string_to_bytes},
};
use serde_json::Value as JsonValue;
use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::sync::Arc;

/// One token of a flattened JSON document.
#[derive(Clone, Debug, PartialEq)]
enum Token {
    Null,
    Bool(bool),
    Long(i64),
    Double(f64),
    String(String),
    ArrayStart,
    ArrayEnd,
    ObjectStart,
    ObjectEnd,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Null => "null".to_string(),
            Token::Bool(b) => b.to_string(),
            Token::Long(i) => i.to_string(),
            Token::Double(d) => d.to_string(),
            Token::String(s) => format!("{s:?}"),
            Token::ArrayStart => "[".to_string(),
            Token::ArrayEnd => "]".to_string(),
            Token::ObjectStart => "{".to_string(),
            Token::ObjectEnd => "}".to_string(),
        }
    }
}

/// A peekable stream of tokens over a parsed JSON document. Object keys
/// surface as plain string tokens, which is exactly what the map grammar
/// expects.
struct TokenReader {
    tokens: VecDeque<Token>,
}

impl TokenReader {
    fn new(document: &JsonValue) -> Self {
        let mut tokens = VecDeque::new();
        flatten(document, &mut tokens);
        Self { tokens }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.front()
    }

    fn next(&mut self) -> AvroResult<Token> {
        self.tokens.pop_front().ok_or_else(|| {
            Details::JsonTokenExpected {
                expected: "more input",
                found: "end of input".to_string(),
            }
            .into()
        })
    }

    fn expect(&mut self, expected: &'static str, token: &Token) -> AvroResult<()> {
        let found = self.next()?;
        if found == *token {
            Ok(())
        } else {
            Err(Details::JsonTokenExpected {
                expected,
                found: found.describe(),
            }
            .into())
        }
    }

    fn next_string(&mut self) -> AvroResult<String> {
        match self.next()? {
            Token::String(s) => Ok(s),
            other => Err(Details::JsonTokenExpected {
                expected: "string",
                found: other.describe(),
            }
            .into()),
        }
    }
}

fn flatten(value: &JsonValue, out: &mut VecDeque<Token>) {
    match value {
        JsonValue::Null => out.push_back(Token::Null),
        JsonValue::Bool(b) => out.push_back(Token::Bool(*b)),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => out.push_back(Token::Long(i)),
            None => out.push_back(Token::Double(n.as_f64().unwrap_or(f64::NAN))),
        },
        JsonValue::String(s) => out.push_back(Token::String(s.clone())),
        JsonValue::Array(items) => {
            out.push_back(Token::ArrayStart);
            for item in items {
                flatten(item, out);
            }
            out.push_back(Token::ArrayEnd);
        }
        JsonValue::Object(entries) => {
            out.push_back(Token::ObjectStart);
            for (key, entry) in entries {
                out.push_back(Token::String(key.clone()));
                flatten(entry, out);
            }
            out.push_back(Token::ObjectEnd);
        }
    }
}

#[derive(Clone, Copy)]
enum Context {
    Array { first: bool },
    Object { first: bool, expect_key: bool },
}

/// A token-level JSON emitter with optional pretty-printing.
///
/// Strings inside objects are written as keys or values depending on the
/// writer's position, so the grammar can feed map keys through the
/// ordinary string operation.
struct JsonWriter<W> {
    out: W,
    pretty: bool,
    stack: Vec<Context>,
}

impl<W: Write> JsonWriter<W> {
    fn new(out: W, pretty: bool) -> Self {
        Self {
            out,
            pretty,
            stack: Vec::new(),
        }
    }

    fn write(&mut self, text: &str) -> AvroResult<()> {
        self.out
            .write_all(text.as_bytes())
            .map_err(|e| Details::WriteBytes(e).into())
    }

    fn newline_indent(&mut self, depth: usize) -> AvroResult<()> {
        self.write("\n")?;
        for _ in 0..depth {
            self.write("  ")?;
        }
        Ok(())
    }

    /// Separators and indentation before a value (or an array item).
    fn before_value(&mut self) -> AvroResult<()> {
        let pretty = self.pretty;
        let depth = self.stack.len();
        match self.stack.last_mut() {
            Some(Context::Array { first }) => {
                let was_first = *first;
                *first = false;
                if !was_first {
                    self.write(",")?;
                }
                if pretty {
                    self.newline_indent(depth)?;
                }
            }
            // Inside an object the separator was written with the key.
            Some(Context::Object { .. }) | None => {}
        }
        Ok(())
    }

    /// A value has been completed; an enclosing object expects a key next.
    fn after_value(&mut self) {
        if let Some(Context::Object { expect_key, .. }) = self.stack.last_mut() {
            *expect_key = true;
        }
    }

    fn scalar(&mut self, text: &str) -> AvroResult<()> {
        self.before_value()?;
        self.write(text)?;
        self.after_value();
        Ok(())
    }

    fn null(&mut self) -> AvroResult<()> {
        self.scalar("null")
    }

    fn boolean(&mut self, b: bool) -> AvroResult<()> {
        self.scalar(if b { "true" } else { "false" })
    }

    fn long(&mut self, i: i64) -> AvroResult<()> {
        self.scalar(&i.to_string())
    }

    fn float(&mut self, f: f32) -> AvroResult<()> {
        self.scalar(&f.to_string())
    }

    fn double(&mut self, d: f64) -> AvroResult<()> {
        self.scalar(&d.to_string())
    }

    /// Write a string, as a key when the enclosing object expects one.
    fn string(&mut self, s: &str) -> AvroResult<()> {
        self.escaped_string(s, false)
    }

    /// Write bytes/fixed data as a string with one byte per code point;
    /// everything outside printable ASCII is escaped as `\u00XX`.
    fn byte_string(&mut self, bytes: &[u8]) -> AvroResult<()> {
        let text: String = bytes.iter().map(|&b| b as char).collect();
        self.escaped_string(&text, true)
    }

    fn escaped_string(&mut self, s: &str, escape_non_ascii: bool) -> AvroResult<()> {
        let escaped = escape(s, escape_non_ascii);
        let pretty = self.pretty;
        let depth = self.stack.len();
        match self.stack.last_mut() {
            Some(Context::Object { first, expect_key }) if *expect_key => {
                let was_first = *first;
                *first = false;
                *expect_key = false;
                if !was_first {
                    self.write(",")?;
                }
                if pretty {
                    self.newline_indent(depth)?;
                }
                self.write(&escaped)?;
                self.write(if pretty { ": " } else { ":" })?;
                Ok(())
            }
            _ => self.scalar(&escaped),
        }
    }

    fn array_start(&mut self) -> AvroResult<()> {
        self.before_value()?;
        self.write("[")?;
        self.stack.push(Context::Array { first: true });
        Ok(())
    }

    fn array_end(&mut self) -> AvroResult<()> {
        let context = self.stack.pop();
        if self.pretty
            && let Some(Context::Array { first: false }) = context
        {
            self.newline_indent(self.stack.len())?;
        }
        self.write("]")?;
        self.after_value();
        Ok(())
    }

    fn object_start(&mut self) -> AvroResult<()> {
        self.before_value()?;
        self.write("{")?;
        self.stack.push(Context::Object {
            first: true,
            expect_key: true,
        });
        Ok(())
    }

    fn object_end(&mut self) -> AvroResult<()> {
        let context = self.stack.pop();
        if self.pretty
            && let Some(Context::Object { first: false, .. }) = context
        {
            self.newline_indent(self.stack.len())?;
        }
        self.write("}")?;
        self.after_value();
        Ok(())
    }

    fn flush(&mut self) -> AvroResult<()> {
        self.out.flush().map_err(|e| Details::FlushWriter(e).into())
    }
}

fn escape(s: &str, escape_non_ascii: bool) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || (escape_non_ascii && (c as u32) > 0x7f) => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// The JSON grammar: the validating grammar plus the structural action
/// symbols JSON needs (object boundaries, field names, enum and union
/// name lists).
struct JsonGrammarGenerator<'a> {
    builder: GrammarBuilder,
    names: &'a Names,
    memo: HashMap<Name, usize>,
}

impl<'a> JsonGrammarGenerator<'a> {
    fn generate(schema: &'a ValidSchema) -> AvroResult<Arc<Grammar>> {
        let mut generator = Self {
            builder: GrammarBuilder::new(),
            names: schema.names(),
            memo: HashMap::new(),
        };
        let root = generator.generate_node(schema.root())?;
        Ok(generator.builder.build(root))
    }

    fn generate_node(&mut self, schema: &Schema) -> AvroResult<Vec<Symbol>> {
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
                Symbol::NameList {
                    names: Arc::from(inner.symbols.clone()),
                },
            ],
            Schema::Record(record) => {
                if let Some(&slot) = self.memo.get(&record.name) {
                    return Ok(vec![Symbol::Indirect { production: slot }]);
                }
                let slot = self.builder.reserve();
                self.memo.insert(record.name.clone(), slot);
                let mut symbols = vec![Symbol::RecordStart];
                for field in &record.fields {
                    symbols.push(Symbol::Field {
                        name: Arc::from(field.name.as_str()),
                    });
                    symbols.extend(self.generate_node(&field.schema)?);
                }
                symbols.push(Symbol::RecordEnd);
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
                let mut branch_names = Vec::with_capacity(union.variants().len());
                let mut branches = Vec::with_capacity(union.variants().len());
                for variant in union.variants() {
                    branch_names.push(variant.branch_name());
                    let mut symbols = self.generate_node(variant)?;
                    // A non-null branch is wrapped in a single-key object;
                    // the closing brace is an action after the value.
                    if !matches!(resolve_ref(variant, self.names)?, Schema::Null) {
                        symbols.push(Symbol::RecordEnd);
                    }
                    branches.push(self.builder.add(symbols));
                }
                vec![
                    Symbol::Union,
                    Symbol::NameList {
                        names: Arc::from(branch_names),
                    },
                    Symbol::Alternative {
                        branches: Arc::from(branches),
                    },
                ]
            }
            Schema::Ref { .. } => unreachable!("references are resolved above"),
        })
    }
}

struct JsonWriteHandler<'a, W> {
    out: &'a mut JsonWriter<W>,
}

impl<W: Write> ParserHandler for JsonWriteHandler<'_, W> {
    fn handle(&mut self, symbol: &Symbol) -> AvroResult<usize> {
        match symbol {
            Symbol::RecordStart => self.out.object_start()?,
            Symbol::RecordEnd => self.out.object_end()?,
            Symbol::Field { name } => self.out.string(name.as_ref())?,
            _ => {}
        }
        Ok(0)
    }
}

/// An [`Encoder`] producing the JSON form of the data, compact or pretty.
pub struct JsonEncoder<W> {
    out: JsonWriter<W>,
    parser: Parser,
}

impl<W: Write> JsonEncoder<W> {
    pub fn new(schema: &ValidSchema, writer: W) -> AvroResult<Self> {
        Self::with_pretty(schema, writer, false)
    }

    /// An encoder that pretty-prints with two-space indentation.
    pub fn pretty(schema: &ValidSchema, writer: W) -> AvroResult<Self> {
        Self::with_pretty(schema, writer, true)
    }

    fn with_pretty(schema: &ValidSchema, writer: W, pretty: bool) -> AvroResult<Self> {
        let grammar = JsonGrammarGenerator::generate(schema)?;
        Ok(Self {
            out: JsonWriter::new(writer, pretty),
            parser: Parser::new(grammar),
        })
    }

    /// Consume the encoder and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.out.out
    }

    fn advance(&mut self, kind: SymbolKind) -> AvroResult<SymbolKind> {
        self.parser.advance(kind, &mut JsonWriteHandler { out: &mut self.out })
    }
}

impl<W: Write> Encoder for JsonEncoder<W> {
    fn encode_null(&mut self) -> AvroResult<()> {
        self.advance(SymbolKind::Null)?;
        self.out.null()
    }

    fn encode_bool(&mut self, b: bool) -> AvroResult<()> {
        self.advance(SymbolKind::Bool)?;
        self.out.boolean(b)
    }

    fn encode_int(&mut self, i: i32) -> AvroResult<()> {
        self.advance(SymbolKind::Int)?;
        self.out.long(i64::from(i))
    }

    fn encode_long(&mut self, l: i64) -> AvroResult<()> {
        self.advance(SymbolKind::Long)?;
        self.out.long(l)
    }

    fn encode_float(&mut self, f: f32) -> AvroResult<()> {
        self.advance(SymbolKind::Float)?;
        if f.is_infinite() {
            self.out.string(if f > 0.0 { "Infinity" } else { "-Infinity" })
        } else if f.is_nan() {
            self.out.string("NaN")
        } else {
            self.out.float(f)
        }
    }

    fn encode_double(&mut self, d: f64) -> AvroResult<()> {
        self.advance(SymbolKind::Double)?;
        if d.is_infinite() {
            self.out.string(if d > 0.0 { "Infinity" } else { "-Infinity" })
        } else if d.is_nan() {
            self.out.string("NaN")
        } else {
            self.out.double(d)
        }
    }

    fn encode_string(&mut self, s: &str) -> AvroResult<()> {
        self.advance(SymbolKind::String)?;
        self.out.string(s)
    }

    fn encode_bytes(&mut self, bytes: &[u8]) -> AvroResult<()> {
        self.advance(SymbolKind::Bytes)?;
        self.out.byte_string(bytes)
    }

    fn encode_fixed(&mut self, bytes: &[u8]) -> AvroResult<()> {
        self.advance(SymbolKind::Fixed)?;
        self.parser.assert_size(bytes.len())?;
        self.out.byte_string(bytes)
    }

    fn encode_enum(&mut self, index: usize) -> AvroResult<()> {
        self.advance(SymbolKind::Enum)?;
        let name = self.parser.name_for_index(index)?;
        self.out.string(&name)
    }

    fn array_start(&mut self) -> AvroResult<()> {
        self.advance(SymbolKind::ArrayStart)?;
        self.out.array_start()
    }

    fn array_end(&mut self) -> AvroResult<()> {
        self.parser
            .process_implicit_actions(&mut JsonWriteHandler { out: &mut self.out })?;
        self.parser.pop_repeater()?;
        self.advance(SymbolKind::ArrayEnd)?;
        self.out.array_end()
    }

    fn map_start(&mut self) -> AvroResult<()> {
        self.advance(SymbolKind::MapStart)?;
        self.out.object_start()
    }

    fn map_end(&mut self) -> AvroResult<()> {
        self.parser
            .process_implicit_actions(&mut JsonWriteHandler { out: &mut self.out })?;
        self.parser.pop_repeater()?;
        self.advance(SymbolKind::MapEnd)?;
        self.out.object_end()
    }

    fn set_item_count(&mut self, count: usize) -> AvroResult<()> {
        self.parser.set_repeat_count(count)
    }

    fn start_item(&mut self) -> AvroResult<()> {
        self.parser
            .process_implicit_actions(&mut JsonWriteHandler { out: &mut self.out })?;
        if self.parser.top_kind() != SymbolKind::Repeater {
            return Err(Details::NotAtItemBoundary.into());
        }
        Ok(())
    }

    fn encode_union_index(&mut self, index: usize) -> AvroResult<()> {
        self.advance(SymbolKind::Union)?;
        let name = self.parser.name_for_index(index)?;
        if name != "null" {
            self.out.object_start()?;
            self.out.string(&name)?;
        }
        self.parser.select_branch(index)
    }

    fn flush(&mut self) -> AvroResult<()> {
        self.parser
            .process_implicit_actions(&mut JsonWriteHandler { out: &mut self.out })?;
        self.out.flush()
    }
}

struct JsonReadHandler<'a> {
    tokens: &'a mut TokenReader,
}

impl ParserHandler for JsonReadHandler<'_> {
    fn handle(&mut self, symbol: &Symbol) -> AvroResult<usize> {
        match symbol {
            Symbol::RecordStart => self.tokens.expect("{", &Token::ObjectStart)?,
            Symbol::RecordEnd => self.tokens.expect("}", &Token::ObjectEnd)?,
            Symbol::Field { name } => {
                let found = self.tokens.next_string()?;
                if found != **name {
                    return Err(Details::JsonFieldName {
                        expected: name.to_string(),
                        found,
                    }
                    .into());
                }
            }
            _ => {}
        }
        Ok(0)
    }
}

/// A [`Decoder`] reading the JSON form of the data.
pub struct JsonDecoder {
    tokens: TokenReader,
    parser: Parser,
}

impl JsonDecoder {
    pub fn new(schema: &ValidSchema, input: &str) -> AvroResult<Self> {
        let document: JsonValue =
            serde_json::from_str(input).map_err(Details::ParseDatumJson)?;
        let grammar = JsonGrammarGenerator::generate(schema)?;
        Ok(Self {
            tokens: TokenReader::new(&document),
            parser: Parser::new(grammar),
        })
    }

    fn advance(&mut self, kind: SymbolKind) -> AvroResult<SymbolKind> {
        self.parser.advance(
            kind,
            &mut JsonReadHandler {
                tokens: &mut self.tokens,
            },
        )
    }

    fn next_number(&mut self, expected: &'static str) -> AvroResult<f64> {
        match self.tokens.next()? {
            Token::Long(i) => Ok(i as f64),
            Token::Double(d) => Ok(d),
            Token::String(s) => match s.as_str() {
                "Infinity" => Ok(f64::INFINITY),
                "-Infinity" => Ok(f64::NEG_INFINITY),
                "NaN" => Ok(f64::NAN),
                _ => Err(Details::JsonTokenExpected {
                    expected,
                    found: format!("{s:?}"),
                }
                .into()),
            },
            other => Err(Details::JsonTokenExpected {
                expected,
                found: other.describe(),
            }
            .into()),
        }
    }

    fn container_next(
        &mut self,
        end_token: Token,
        end_symbol: SymbolKind,
    ) -> AvroResult<usize> {
        self.parser.process_implicit_actions(&mut JsonReadHandler {
            tokens: &mut self.tokens,
        })?;
        if self.tokens.peek() == Some(&end_token) {
            self.tokens.next()?;
            self.parser.pop_repeater()?;
            self.advance(end_symbol)?;
            Ok(0)
        } else {
            // JSON carries no counts; items arrive one at a time.
            self.parser.set_repeat_count(1)?;
            Ok(1)
        }
    }

    /// Discard tokens up to and including the end of the current composite.
    fn skip_composite(&mut self) -> AvroResult<()> {
        let mut level = 0usize;
        loop {
            match self.tokens.next()? {
                Token::ArrayStart | Token::ObjectStart => level += 1,
                Token::ArrayEnd | Token::ObjectEnd => {
                    if level == 0 {
                        return Ok(());
                    }
                    level -= 1;
                }
                _ => {}
            }
        }
    }
}

impl Decoder for JsonDecoder {
    fn decode_null(&mut self) -> AvroResult<()> {
        self.advance(SymbolKind::Null)?;
        self.tokens.expect("null", &Token::Null)
    }

    fn decode_bool(&mut self) -> AvroResult<bool> {
        self.advance(SymbolKind::Bool)?;
        match self.tokens.next()? {
            Token::Bool(b) => Ok(b),
            other => Err(Details::JsonTokenExpected {
                expected: "boolean",
                found: other.describe(),
            }
            .into()),
        }
    }

    fn decode_int(&mut self) -> AvroResult<i32> {
        self.advance(SymbolKind::Int)?;
        match self.tokens.next()? {
            Token::Long(i) => i32::try_from(i).map_err(|_| Details::JsonIntRange(i).into()),
            other => Err(Details::JsonTokenExpected {
                expected: "integer",
                found: other.describe(),
            }
            .into()),
        }
    }

    fn decode_long(&mut self) -> AvroResult<i64> {
        self.advance(SymbolKind::Long)?;
        match self.tokens.next()? {
            Token::Long(i) => Ok(i),
            other => Err(Details::JsonTokenExpected {
                expected: "integer",
                found: other.describe(),
            }
            .into()),
        }
    }

    fn decode_float(&mut self) -> AvroResult<f32> {
        self.advance(SymbolKind::Float)?;
        self.next_number("number for float").map(|d| d as f32)
    }

    fn decode_double(&mut self) -> AvroResult<f64> {
        self.advance(SymbolKind::Double)?;
        self.next_number("number for double")
    }

    fn decode_string(&mut self) -> AvroResult<String> {
        self.advance(SymbolKind::String)?;
        self.tokens.next_string()
    }

    fn skip_string(&mut self) -> AvroResult<()> {
        self.advance(SymbolKind::String)?;
        self.tokens.next_string().map(|_| ())
    }

    fn decode_bytes(&mut self) -> AvroResult<Vec<u8>> {
        self.advance(SymbolKind::Bytes)?;
        Ok(string_to_bytes(&self.tokens.next_string()?))
    }

    fn skip_bytes(&mut self) -> AvroResult<()> {
        self.advance(SymbolKind::Bytes)?;
        self.tokens.next_string().map(|_| ())
    }

    fn decode_fixed(&mut self, len: usize) -> AvroResult<Vec<u8>> {
        self.advance(SymbolKind::Fixed)?;
        self.parser.assert_size(len)?;
        let bytes = string_to_bytes(&self.tokens.next_string()?);
        if bytes.len() != len {
            return Err(Details::FixedSizeMismatch {
                expected: len,
                found: bytes.len(),
            }
            .into());
        }
        Ok(bytes)
    }

    fn skip_fixed(&mut self, len: usize) -> AvroResult<()> {
        self.decode_fixed(len).map(|_| ())
    }

    fn decode_enum(&mut self) -> AvroResult<usize> {
        self.advance(SymbolKind::Enum)?;
        let symbol = self.tokens.next_string()?;
        self.parser
            .index_for_name(&symbol)
            .ok_or_else(|| Details::GetEnumSymbol(symbol).into())
    }

    fn array_start(&mut self) -> AvroResult<usize> {
        self.advance(SymbolKind::ArrayStart)?;
        self.tokens.expect("[", &Token::ArrayStart)?;
        self.container_next(Token::ArrayEnd, SymbolKind::ArrayEnd)
    }

    fn array_next(&mut self) -> AvroResult<usize> {
        self.container_next(Token::ArrayEnd, SymbolKind::ArrayEnd)
    }

    fn skip_array(&mut self) -> AvroResult<usize> {
        self.advance(SymbolKind::ArrayStart)?;
        self.tokens.expect("[", &Token::ArrayStart)?;
        self.skip_composite()?;
        self.parser.discard_block(SymbolKind::ArrayEnd)?;
        Ok(0)
    }

    fn map_start(&mut self) -> AvroResult<usize> {
        self.advance(SymbolKind::MapStart)?;
        self.tokens.expect("{", &Token::ObjectStart)?;
        self.container_next(Token::ObjectEnd, SymbolKind::MapEnd)
    }

    fn map_next(&mut self) -> AvroResult<usize> {
        self.container_next(Token::ObjectEnd, SymbolKind::MapEnd)
    }

    fn skip_map(&mut self) -> AvroResult<usize> {
        self.advance(SymbolKind::MapStart)?;
        self.tokens.expect("{", &Token::ObjectStart)?;
        self.skip_composite()?;
        self.parser.discard_block(SymbolKind::MapEnd)?;
        Ok(0)
    }

    fn decode_union_index(&mut self) -> AvroResult<usize> {
        self.advance(SymbolKind::Union)?;
        let index = if self.tokens.peek() == Some(&Token::Null) {
            self.parser
                .index_for_name("null")
                .ok_or_else(|| crate::Error::from(Details::GetUnionBranchName("null".into())))?
        } else {
            self.tokens.expect("{", &Token::ObjectStart)?;
            let name = self.tokens.next_string()?;
            self.parser
                .index_for_name(&name)
                .ok_or_else(|| crate::Error::from(Details::GetUnionBranchName(name)))?
        };
        self.parser.select_branch(index)?;
        Ok(index)
    }
}
