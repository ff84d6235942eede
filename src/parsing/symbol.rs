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

use crate::{AvroResult, decode::Decoder, error::Details};
use std::sync::Arc;
use strum::EnumDiscriminants;

/// One symbol of a compiled grammar.
///
/// Terminals are matched against the operation the codec user invokes.
/// Non-terminals expand into further symbols when reached. Explicit
/// actions are consumed by dedicated parser helpers (`assert_size`,
/// `enum_adjust`, ...); implicit actions are serviced through the
/// [`ParserHandler`] callback without a matching user call.
#[derive(Clone, Debug, EnumDiscriminants)]
#[strum_discriminants(name(SymbolKind), vis(pub), derive(strum::Display, Hash))]
pub(crate) enum Symbol {
    // Terminals, one per codec operation.
    Null,
    Bool,
    Int,
    Long,
    Float,
    Double,
    String,
    Bytes,
    Fixed,
    Enum,
    ArrayStart,
    ArrayEnd,
    MapStart,
    MapEnd,
    Union,

    // Non-terminals, expanded on advance.
    /// The bottom-of-stack symbol. It is never popped; whenever it
    /// surfaces it re-expands its main production, so one parser carries
    /// any number of consecutive data.
    Root { main: usize },
    /// Expands into another production; how recursion re-enters a
    /// production already in the arena.
    Indirect { production: usize },
    /// A list of productions, one selected by branch index.
    Alternative { branches: Arc<[usize]> },
    /// Zero or more repetitions of a body production, `count` at a time.
    /// `backup` is the writer-side production used when skipping.
    Repeater {
        body: usize,
        backup: usize,
        count: usize,
    },

    // Explicit actions.
    /// Declared size of a fixed, or symbol count of an enum.
    SizeCheck { size: usize },
    /// Enum symbol or union branch names for the JSON codec.
    NameList { names: Arc<[std::string::String]> },
    /// Writer-to-reader enum symbol translation. A missing reader symbol
    /// errors only when actually decoded.
    EnumAdjust {
        mapping: Arc<[Result<usize, std::string::String>]>,
    },
    /// Reader-union adjustment: the branch to report and the production
    /// resolving the writer against that branch.
    UnionAdjust { branch: usize, production: usize },
    /// Reader-field indices in the writer's on-the-wire order.
    SizeList { order: Arc<[usize]> },

    // Implicit actions.
    /// JSON object start (records and non-null union branches).
    RecordStart,
    /// JSON object end.
    RecordEnd,
    /// JSON field name.
    Field { name: Arc<str> },
    /// Record boundary during resolution; precedes [`Symbol::SizeList`].
    Record,
    /// Ask the decoder for the writer's union branch index and select the
    /// matching alternative.
    WriterUnion,
    /// The following production covers a writer-only field: consume its
    /// bytes, materialize nothing.
    SkipStart,
    /// Splice in a binary sub-decoder over the pre-encoded default value.
    DefaultStart { data: Arc<[u8]> },
    /// Restore the real base decoder.
    DefaultEnd,
    /// Numeric promotion: match `reader` against the user call, decode as
    /// `writer`.
    Resolve {
        writer: SymbolKind,
        reader: SymbolKind,
    },
    /// No resolution exists between the two schemas; fails when reached.
    Error { writer: Arc<str>, reader: Arc<str> },
}

impl Symbol {
    pub(crate) fn kind(&self) -> SymbolKind {
        SymbolKind::from(self)
    }
}

impl SymbolKind {
    pub(crate) fn is_implicit_action(self) -> bool {
        matches!(
            self,
            SymbolKind::RecordStart
                | SymbolKind::RecordEnd
                | SymbolKind::Field
                | SymbolKind::Record
                | SymbolKind::WriterUnion
                | SymbolKind::DefaultStart
                | SymbolKind::DefaultEnd
        )
    }
}

/// An ordered sequence of symbols, stored reversed so that appending it to
/// the parser stack consumes the grammar left-to-right.
pub(crate) type Production = Vec<Symbol>;

/// The arena owning every production of one compiled grammar.
///
/// Productions reference each other by index, so recursion needs no
/// shared-pointer cycles and the whole grammar is immutable once built.
#[derive(Debug)]
pub(crate) struct Grammar {
    productions: Vec<Production>,
    root: usize,
}

impl Grammar {
    fn production(&self, index: usize) -> &[Symbol] {
        &self.productions[index]
    }
}

/// Builds a [`Grammar`]. Generators reserve a slot *before* generating a
/// recursive production into it, so back-references are ordinary indices;
/// [`GrammarBuilder::build`] asserts that every reserved slot was filled.
#[derive(Default)]
pub(crate) struct GrammarBuilder {
    productions: Vec<Option<Production>>,
}

impl GrammarBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Reserve a slot for a production that is about to be generated.
    pub(crate) fn reserve(&mut self) -> usize {
        self.productions.push(None);
        self.productions.len() - 1
    }

    /// Fill a reserved slot. `symbols` is in grammar order; it is stored
    /// reversed.
    pub(crate) fn fill(&mut self, index: usize, mut symbols: Vec<Symbol>) {
        debug_assert!(self.productions[index].is_none(), "slot filled twice");
        symbols.reverse();
        self.productions[index] = Some(symbols);
    }

    /// Add a complete production; returns its index.
    pub(crate) fn add(&mut self, symbols: Vec<Symbol>) -> usize {
        let index = self.reserve();
        self.fill(index, symbols);
        index
    }

    /// The sole symbol of a one-symbol production, if it is one.
    pub(crate) fn single_symbol(&self, index: usize) -> Option<Symbol> {
        match &self.productions[index] {
            Some(production) if production.len() == 1 => Some(production[0].clone()),
            _ => None,
        }
    }

    /// Finish with the given root production (in grammar order).
    pub(crate) fn build(mut self, root: Vec<Symbol>) -> Arc<Grammar> {
        let root = self.add(root);
        let productions = self
            .productions
            .into_iter()
            .map(|p| p.expect("reserved production slot was never filled"))
            .collect();
        Arc::new(Grammar { productions, root })
    }
}

/// Services action symbols on behalf of a codec during [`Parser::advance`].
pub(crate) trait ParserHandler {
    /// Handle an action symbol. The return value parameterizes the
    /// expansion; only [`Symbol::WriterUnion`] uses it (the branch index).
    fn handle(&mut self, symbol: &Symbol) -> AvroResult<usize>;

    /// The decoder to discard writer data with, for skip paths reached
    /// through [`Symbol::SkipStart`].
    fn skip_decoder(&mut self) -> Option<&mut dyn Decoder> {
        None
    }
}

/// A handler for grammars without action symbols requiring state.
pub(crate) struct NoHandler;

impl ParserHandler for NoHandler {
    fn handle(&mut self, _symbol: &Symbol) -> AvroResult<usize> {
        Ok(0)
    }
}

/// The stack machine that advances a compiled grammar.
///
/// Single-threaded; one instance drives exactly one encoder or decoder.
#[derive(Debug)]
pub(crate) struct Parser {
    grammar: Arc<Grammar>,
    stack: Vec<Symbol>,
}

impl Parser {
    pub(crate) fn new(grammar: Arc<Grammar>) -> Self {
        let root = Symbol::Root { main: grammar.root };
        Self {
            grammar,
            stack: vec![root],
        }
    }

    fn append(&mut self, production: usize) {
        let grammar = Arc::clone(&self.grammar);
        self.stack.extend_from_slice(grammar.production(production));
    }

    fn pop(&mut self) -> Symbol {
        self.stack.pop().expect("the root symbol is never popped")
    }

    fn top(&self) -> &Symbol {
        self.stack.last().expect("the root symbol is never popped")
    }

    pub(crate) fn top_kind(&self) -> SymbolKind {
        self.top().kind()
    }

    fn mismatch(expected: SymbolKind, found: SymbolKind) -> crate::Error {
        Details::ExpectedSymbol { expected, found }.into()
    }

    /// Advance the grammar up to and including the expected terminal.
    ///
    /// Non-terminals on the way are expanded, implicit actions are handed
    /// to `handler`, and skip productions are consumed against the
    /// handler's decoder. The returned kind differs from `expected` only
    /// for numeric promotions, where it names the writer type actually on
    /// the wire.
    pub(crate) fn advance<H: ParserHandler + ?Sized>(
        &mut self,
        expected: SymbolKind,
        handler: &mut H,
    ) -> AvroResult<SymbolKind> {
        loop {
            let top = self.top().clone();
            if top.kind() == expected {
                self.pop();
                return Ok(expected);
            }
            match top {
                Symbol::Root { main } => {
                    // Re-expand without popping: the next datum begins.
                    self.append(main);
                }
                Symbol::Indirect { production } => {
                    self.pop();
                    self.append(production);
                }
                Symbol::Repeater { body, count, .. } => {
                    if count == 0 {
                        return Err(Self::mismatch(expected, SymbolKind::Repeater));
                    }
                    match self.stack.last_mut() {
                        Some(Symbol::Repeater { count, .. }) => *count -= 1,
                        _ => unreachable!("top was just observed to be a repeater"),
                    }
                    self.append(body);
                }
                Symbol::Resolve { writer, reader } => {
                    if reader == expected {
                        self.pop();
                        return Ok(writer);
                    }
                    return Err(Self::mismatch(expected, reader));
                }
                Symbol::SkipStart => {
                    self.pop();
                    let decoder = handler
                        .skip_decoder()
                        .expect("skip symbols only occur in decoding grammars");
                    self.skip(decoder)?;
                }
                Symbol::Error { writer, reader } => {
                    return Err(Details::NoResolution {
                        writer: writer.to_string(),
                        reader: reader.to_string(),
                    }
                    .into());
                }
                ref symbol if symbol.kind().is_implicit_action() => {
                    let branch = handler.handle(symbol)?;
                    let is_writer_union = symbol.kind() == SymbolKind::WriterUnion;
                    self.pop();
                    if is_writer_union {
                        self.select_branch(branch)?;
                    }
                }
                // A different terminal or an unconsumed explicit action:
                // the call sequence does not fit the schema.
                other => return Err(Self::mismatch(expected, other.kind())),
            }
        }
    }

    /// Drain implicit actions (and writer-only skips) off the top of the
    /// stack without consuming a terminal. Called on array/map boundaries
    /// and before flushing.
    pub(crate) fn process_implicit_actions<H: ParserHandler + ?Sized>(
        &mut self,
        handler: &mut H,
    ) -> AvroResult<()> {
        loop {
            let top = self.top().clone();
            match top {
                Symbol::SkipStart => {
                    self.pop();
                    let decoder = handler
                        .skip_decoder()
                        .expect("skip symbols only occur in decoding grammars");
                    self.skip(decoder)?;
                }
                ref symbol if symbol.kind().is_implicit_action() => {
                    let branch = handler.handle(symbol)?;
                    let is_writer_union = symbol.kind() == SymbolKind::WriterUnion;
                    self.pop();
                    if is_writer_union {
                        self.select_branch(branch)?;
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// Pop the current alternative and expand its `index`-th branch.
    pub(crate) fn select_branch(&mut self, index: usize) -> AvroResult<()> {
        match self.top() {
            Symbol::Alternative { branches } => {
                if index >= branches.len() {
                    return Err(Details::BranchIndexOutOfRange {
                        index,
                        count: branches.len(),
                    }
                    .into());
                }
                let production = branches[index];
                self.pop();
                self.append(production);
                Ok(())
            }
            other => Err(Self::mismatch(SymbolKind::Alternative, other.kind())),
        }
    }

    /// Pop the current reader-union adjustment, expand its production and
    /// report the reader branch index.
    pub(crate) fn union_adjust(&mut self) -> AvroResult<usize> {
        match self.top() {
            &Symbol::UnionAdjust { branch, production } => {
                self.pop();
                self.append(production);
                Ok(branch)
            }
            other => Err(Self::mismatch(SymbolKind::UnionAdjust, other.kind())),
        }
    }

    /// Translate a writer enum index through the current adjustment table.
    pub(crate) fn enum_adjust(&mut self, index: usize) -> AvroResult<usize> {
        match self.top() {
            Symbol::EnumAdjust { mapping } => {
                let entry = mapping.get(index).cloned().ok_or_else(|| {
                    crate::Error::from(Details::BranchIndexOutOfRange {
                        index,
                        count: mapping.len(),
                    })
                })?;
                match entry {
                    Ok(reader_index) => {
                        self.pop();
                        Ok(reader_index)
                    }
                    Err(symbol) => Err(Details::ResolveEnumSymbol(symbol).into()),
                }
            }
            other => Err(Self::mismatch(SymbolKind::EnumAdjust, other.kind())),
        }
    }

    /// Add `count` pending items to the current repeater.
    pub(crate) fn set_repeat_count(&mut self, count: usize) -> AvroResult<()> {
        match self.stack.last_mut() {
            Some(Symbol::Repeater { count: current, .. }) => {
                *current += count;
                Ok(())
            }
            Some(other) => Err(Self::mismatch(SymbolKind::Repeater, other.kind())),
            None => unreachable!("the root symbol is never popped"),
        }
    }

    /// Pop the current repeater; every promised item must be consumed.
    pub(crate) fn pop_repeater(&mut self) -> AvroResult<()> {
        match self.top() {
            &Symbol::Repeater { count, .. } => {
                if count != 0 {
                    return Err(Details::BlockItemsRemaining(count).into());
                }
                self.pop();
                Ok(())
            }
            other => Err(Self::mismatch(SymbolKind::Repeater, other.kind())),
        }
    }

    /// Check a fixed length against the current size check.
    pub(crate) fn assert_size(&mut self, size: usize) -> AvroResult<()> {
        match self.top() {
            &Symbol::SizeCheck { size: expected } => {
                if expected != size {
                    return Err(Details::FixedSizeMismatch {
                        expected,
                        found: size,
                    }
                    .into());
                }
                self.pop();
                Ok(())
            }
            other => Err(Self::mismatch(SymbolKind::SizeCheck, other.kind())),
        }
    }

    /// Check an enum index against the current size check.
    pub(crate) fn assert_less_than_size(&mut self, index: usize) -> AvroResult<()> {
        match self.top() {
            &Symbol::SizeCheck { size } => {
                if index >= size {
                    return Err(Details::BranchIndexOutOfRange { index, count: size }.into());
                }
                self.pop();
                Ok(())
            }
            other => Err(Self::mismatch(SymbolKind::SizeCheck, other.kind())),
        }
    }

    fn pop_size_check(&mut self) -> AvroResult<usize> {
        match self.top() {
            &Symbol::SizeCheck { size } => {
                self.pop();
                Ok(size)
            }
            other => Err(Self::mismatch(SymbolKind::SizeCheck, other.kind())),
        }
    }

    /// The name at `index` in the current name list (JSON enums/unions).
    pub(crate) fn name_for_index(&mut self, index: usize) -> AvroResult<String> {
        match self.top() {
            Symbol::NameList { names } => {
                let name = names.get(index).cloned().ok_or_else(|| {
                    crate::Error::from(Details::BranchIndexOutOfRange {
                        index,
                        count: names.len(),
                    })
                })?;
                self.pop();
                Ok(name)
            }
            other => Err(Self::mismatch(SymbolKind::NameList, other.kind())),
        }
    }

    /// The index of `name` in the current name list, if declared.
    pub(crate) fn index_for_name(&mut self, name: &str) -> Option<usize> {
        match self.top() {
            Symbol::NameList { names } => {
                let index = names.iter().position(|n| n == name)?;
                self.pop();
                Some(index)
            }
            _ => None,
        }
    }

    /// The field order recorded by the current size list.
    pub(crate) fn size_list(&mut self) -> AvroResult<Vec<usize>> {
        match self.top() {
            Symbol::SizeList { order } => {
                let order = order.to_vec();
                self.pop();
                Ok(order)
            }
            other => Err(Self::mismatch(SymbolKind::SizeList, other.kind())),
        }
    }

    /// Drop an array or map scaffold whose contents were consumed outside
    /// the grammar (token-level skips): the repeater on top, then the end
    /// terminal.
    pub(crate) fn discard_block(&mut self, end: SymbolKind) -> AvroResult<()> {
        match self.pop() {
            Symbol::Repeater { .. } => {}
            other => return Err(Self::mismatch(SymbolKind::Repeater, other.kind())),
        }
        let top = self.pop();
        if top.kind() != end {
            return Err(Self::mismatch(end, top.kind()));
        }
        Ok(())
    }

    /// Consume the value production on top of the stack, discarding the
    /// corresponding writer data from `decoder`.
    pub(crate) fn skip(&mut self, decoder: &mut dyn Decoder) -> AvroResult<()> {
        let depth = self.stack.len();
        self.skip_to(depth, decoder)
    }

    /// Consume an array or map whose start terminal was just advanced:
    /// the repeater is on top of the stack, the end terminal below it.
    pub(crate) fn skip_open_block(
        &mut self,
        decoder: &mut dyn Decoder,
        is_array: bool,
    ) -> AvroResult<()> {
        let backup = match self.pop() {
            Symbol::Repeater { backup, .. } => backup,
            other => return Err(Self::mismatch(SymbolKind::Repeater, other.kind())),
        };
        let mut count = if is_array {
            decoder.skip_array()?
        } else {
            decoder.skip_map()?
        };
        while count != 0 {
            for _ in 0..count {
                let depth = self.stack.len() + 1;
                self.append(backup);
                self.skip_to(depth, decoder)?;
            }
            count = if is_array {
                decoder.skip_array()?
            } else {
                decoder.skip_map()?
            };
        }
        let end = if is_array {
            SymbolKind::ArrayEnd
        } else {
            SymbolKind::MapEnd
        };
        let top = self.pop();
        if top.kind() != end {
            return Err(Self::mismatch(end, top.kind()));
        }
        Ok(())
    }

    fn skip_to(&mut self, depth: usize, decoder: &mut dyn Decoder) -> AvroResult<()> {
        while self.stack.len() >= depth {
            match self.pop() {
                Symbol::Null => decoder.decode_null()?,
                Symbol::Bool => {
                    decoder.decode_bool()?;
                }
                Symbol::Int => {
                    decoder.decode_int()?;
                }
                Symbol::Long => {
                    decoder.decode_long()?;
                }
                Symbol::Float => {
                    decoder.decode_float()?;
                }
                Symbol::Double => {
                    decoder.decode_double()?;
                }
                Symbol::String => decoder.skip_string()?,
                Symbol::Bytes => decoder.skip_bytes()?,
                Symbol::Fixed => {
                    let size = self.pop_size_check()?;
                    decoder.skip_fixed(size)?;
                }
                Symbol::Enum => {
                    let size = self.pop_size_check()?;
                    let index = decoder.decode_enum()?;
                    if index >= size {
                        return Err(Details::BranchIndexOutOfRange { index, count: size }.into());
                    }
                }
                Symbol::Union => {
                    let index = decoder.decode_union_index()?;
                    self.select_branch(index)?;
                }
                Symbol::ArrayStart => self.skip_open_block(decoder, true)?,
                Symbol::MapStart => self.skip_open_block(decoder, false)?,
                Symbol::Indirect { production } => self.append(production),
                other => {
                    return Err(Self::mismatch(SymbolKind::Indirect, other.kind()));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Details, ErrorKind};
    use pretty_assertions::assert_eq;

    fn scalar_grammar(symbols: Vec<Symbol>) -> Parser {
        let builder = GrammarBuilder::new();
        Parser::new(builder.build(symbols))
    }

    #[test]
    fn test_advance_matches_terminals_in_order() {
        let mut parser = scalar_grammar(vec![Symbol::Int, Symbol::String]);
        assert_eq!(
            parser.advance(SymbolKind::Int, &mut NoHandler).unwrap(),
            SymbolKind::Int
        );
        assert_eq!(
            parser.advance(SymbolKind::String, &mut NoHandler).unwrap(),
            SymbolKind::String
        );
    }

    #[test]
    fn test_advance_rejects_out_of_order_calls() {
        let mut parser = scalar_grammar(vec![Symbol::Int, Symbol::String]);
        let err = parser.advance(SymbolKind::String, &mut NoHandler).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        match err.into_details() {
            Details::ExpectedSymbol { expected, found } => {
                assert_eq!(expected, SymbolKind::String);
                assert_eq!(found, SymbolKind::Int);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_root_re_expands_for_consecutive_data() {
        let mut parser = scalar_grammar(vec![Symbol::Long]);
        for _ in 0..3 {
            parser.advance(SymbolKind::Long, &mut NoHandler).unwrap();
        }
    }

    #[test]
    fn test_repeater_counts_items() {
        let mut builder = GrammarBuilder::new();
        let body = builder.add(vec![Symbol::Int]);
        let mut parser = Parser::new(builder.build(vec![
            Symbol::ArrayStart,
            Symbol::Repeater {
                body,
                backup: body,
                count: 0,
            },
            Symbol::ArrayEnd,
        ]));

        parser.advance(SymbolKind::ArrayStart, &mut NoHandler).unwrap();
        parser.set_repeat_count(2).unwrap();
        parser.advance(SymbolKind::Int, &mut NoHandler).unwrap();
        parser.advance(SymbolKind::Int, &mut NoHandler).unwrap();
        // A third item exceeds the promised count.
        assert!(parser.advance(SymbolKind::Int, &mut NoHandler).is_err());
        parser.pop_repeater().unwrap();
        parser.advance(SymbolKind::ArrayEnd, &mut NoHandler).unwrap();
    }

    #[test]
    fn test_pop_repeater_with_outstanding_items() {
        let mut builder = GrammarBuilder::new();
        let body = builder.add(vec![Symbol::Int]);
        let mut parser = Parser::new(builder.build(vec![
            Symbol::ArrayStart,
            Symbol::Repeater {
                body,
                backup: body,
                count: 0,
            },
            Symbol::ArrayEnd,
        ]));
        parser.advance(SymbolKind::ArrayStart, &mut NoHandler).unwrap();
        parser.set_repeat_count(2).unwrap();
        parser.advance(SymbolKind::Int, &mut NoHandler).unwrap();
        match parser.pop_repeater().map_err(crate::Error::into_details) {
            Err(Details::BlockItemsRemaining(1)) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_alternative_selection() {
        let mut builder = GrammarBuilder::new();
        let branch0 = builder.add(vec![Symbol::Null]);
        let branch1 = builder.add(vec![Symbol::Int]);
        let mut parser = Parser::new(builder.build(vec![
            Symbol::Union,
            Symbol::Alternative {
                branches: Arc::from(vec![branch0, branch1]),
            },
        ]));
        parser.advance(SymbolKind::Union, &mut NoHandler).unwrap();
        parser.select_branch(1).unwrap();
        parser.advance(SymbolKind::Int, &mut NoHandler).unwrap();
    }

    #[test]
    fn test_select_branch_out_of_range() {
        let mut builder = GrammarBuilder::new();
        let branch0 = builder.add(vec![Symbol::Null]);
        let mut parser = Parser::new(builder.build(vec![
            Symbol::Union,
            Symbol::Alternative {
                branches: Arc::from(vec![branch0]),
            },
        ]));
        parser.advance(SymbolKind::Union, &mut NoHandler).unwrap();
        assert!(parser.select_branch(3).is_err());
    }

    #[test]
    fn test_resolve_symbol_reports_writer_kind() {
        let mut parser = scalar_grammar(vec![Symbol::Resolve {
            writer: SymbolKind::Int,
            reader: SymbolKind::Long,
        }]);
        assert_eq!(
            parser.advance(SymbolKind::Long, &mut NoHandler).unwrap(),
            SymbolKind::Int
        );
    }

    #[test]
    fn test_size_check() {
        let mut parser = scalar_grammar(vec![Symbol::Fixed, Symbol::SizeCheck { size: 4 }]);
        parser.advance(SymbolKind::Fixed, &mut NoHandler).unwrap();
        assert!(parser.assert_size(4).is_ok());

        let mut parser = scalar_grammar(vec![Symbol::Fixed, Symbol::SizeCheck { size: 4 }]);
        parser.advance(SymbolKind::Fixed, &mut NoHandler).unwrap();
        match parser.assert_size(5).map_err(crate::Error::into_details) {
            Err(Details::FixedSizeMismatch { expected: 4, found: 5 }) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
