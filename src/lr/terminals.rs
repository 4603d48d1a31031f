//! Terminal readers for the LR driver
//!
//! The driver asks for the next terminal out of a candidate set; a
//! `TerminalParsers` value answers with zero or more `(symbol, state,
//! tree)` matches. The driver requires exactly one, so compositions choose
//! between concatenating every child's matches (`or_terminal_parsers`) and
//! taking the first child that matches at all
//! (`or_greedy_terminal_parsers`). Both are deterministic in child order.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::grammar::SymbolId;
use crate::combinators::{Parser, ParseState, ResultLabel};
use crate::text::model::TextModel;
use crate::tree::ResultTree;

/// One recognized terminal
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalMatch<S, T> {
    pub symbol: SymbolId,
    pub state: S,
    pub tree: ResultTree<T>,
}

type TerminalFn<S, T> =
    dyn Fn(&BTreeSet<SymbolId>, &S, &TextModel, usize, usize) -> Vec<TerminalMatch<S, T>>
        + Send
        + Sync;

/// A reader producing candidate terminals out of a requested set
pub struct TerminalParsers<S, T> {
    read: Arc<TerminalFn<S, T>>,
}

impl<S, T> Clone for TerminalParsers<S, T> {
    fn clone(&self) -> Self {
        Self {
            read: Arc::clone(&self.read),
        }
    }
}

impl<S, T> TerminalParsers<S, T> {
    pub fn new(
        f: impl Fn(&BTreeSet<SymbolId>, &S, &TextModel, usize, usize) -> Vec<TerminalMatch<S, T>>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self { read: Arc::new(f) }
    }

    pub fn read(
        &self,
        wanted: &BTreeSet<SymbolId>,
        state: &S,
        model: &TextModel,
        line: usize,
        col: usize,
    ) -> Vec<TerminalMatch<S, T>> {
        (self.read)(wanted, state, model, line, col)
    }
}

/// Lift a combinator parser into a reader for one terminal symbol
///
/// The parser runs only when its symbol is in the requested set.
pub fn terminal<S: ParseState, T: ResultLabel>(
    symbol: SymbolId,
    parser: Parser<S, T>,
) -> TerminalParsers<S, T> {
    TerminalParsers::new(move |wanted, state: &S, model, line, col| {
        if !wanted.contains(&symbol) {
            return Vec::new();
        }
        parser
            .parse(state.clone(), model, line, col)
            .map(|parsed| TerminalMatch {
                symbol,
                state: parsed.state,
                tree: parsed.tree,
            })
            .into_iter()
            .collect()
    })
}

/// Concatenate every child's matches, in child order
pub fn or_terminal_parsers<S: ParseState, T: ResultLabel>(
    parsers: Vec<TerminalParsers<S, T>>,
) -> TerminalParsers<S, T> {
    TerminalParsers::new(move |wanted, state, model, line, col| {
        parsers
            .iter()
            .flat_map(|p| p.read(wanted, state, model, line, col))
            .collect()
    })
}

/// The first child producing any match wins; no match yields the empty list
pub fn or_greedy_terminal_parsers<S: ParseState, T: ResultLabel>(
    parsers: Vec<TerminalParsers<S, T>>,
) -> TerminalParsers<S, T> {
    TerminalParsers::new(move |wanted, state, model, line, col| {
        parsers
            .iter()
            .map(|p| p.read(wanted, state, model, line, col))
            .find(|matches| !matches.is_empty())
            .unwrap_or_default()
    })
}
