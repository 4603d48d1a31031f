//! Parser combinators over line-addressable text
//!
//! A `Parser<S, T>` is a pure function from `(state, model, line, col)` to
//! an optional updated state plus a [`ResultTree`] whose span starts at the
//! entry position. `None` is the ordinary parse-failure return, composed by
//! `or` and `opt`; it is never an exceptional condition. State is threaded
//! by value through every combinator and returned on success.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use unicode_normalization::UnicodeNormalization;

use crate::position::Position;
use crate::text::model::TextModel;
use crate::tree::{join, NodeKind, ResultTree};

/// Bounds required of user state threaded through parsers
pub trait ParseState: Clone + Send + Sync + 'static {}
impl<S: Clone + Send + Sync + 'static> ParseState for S {}

/// Bounds required of result-tree labels
pub trait ResultLabel: Clone + Send + Sync + 'static {}
impl<T: Clone + Send + Sync + 'static> ResultLabel for T {}

/// A successful parse: the updated state and the produced tree
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<S, T> {
    pub state: S,
    pub tree: ResultTree<T>,
}

type ParserFn<S, T> = dyn Fn(S, &TextModel, usize, usize) -> Option<Parsed<S, T>> + Send + Sync;

/// A composable parser producing a [`ResultTree`]
///
/// Cloning is cheap; the underlying function is shared.
pub struct Parser<S, T> {
    run: Arc<ParserFn<S, T>>,
}

impl<S, T> Clone for Parser<S, T> {
    fn clone(&self) -> Self {
        Self {
            run: Arc::clone(&self.run),
        }
    }
}

impl<S, T> Parser<S, T> {
    pub fn new(
        f: impl Fn(S, &TextModel, usize, usize) -> Option<Parsed<S, T>> + Send + Sync + 'static,
    ) -> Self {
        Self { run: Arc::new(f) }
    }

    /// Run the parser at `(line, col)`
    ///
    /// The entry position is asserted before dispatch, so every parser
    /// inherits the entry contract. On success the result's span starts at
    /// the entry position.
    pub fn parse(&self, state: S, model: &TextModel, line: usize, col: usize) -> Option<Parsed<S, T>> {
        model.assert_pos(line, col);
        (self.run)(state, model, line, col)
    }
}

/// Succeeds with a zero-length structural node
pub fn empty<S: ParseState, T: ResultLabel>() -> Parser<S, T> {
    Parser::new(|state, _model, line, col| {
        Some(Parsed {
            state,
            tree: ResultTree::point(NodeKind::Structural, Position::new(line, col)),
        })
    })
}

/// Always fails
pub fn fail<S: ParseState, T: ResultLabel>() -> Parser<S, T> {
    Parser::new(|_state, _model, _line, _col| None)
}

/// One character satisfying `pred`, as a discarded node
pub fn char_if<S: ParseState, T: ResultLabel>(
    pred: impl Fn(char) -> bool + Send + Sync + 'static,
) -> Parser<S, T> {
    Parser::new(move |state, model, line, col| {
        if line < model.line_count() && col < model.line_at(line).len() && pred(model.char_at(line, col))
        {
            Some(Parsed {
                state,
                tree: ResultTree::leaf(
                    NodeKind::Discarded,
                    crate::position::Span::new(
                        Position::new(line, col),
                        Position::new(line, col + 1),
                    ),
                ),
            })
        } else {
            None
        }
    })
}

/// Any single character
pub fn any_char<S: ParseState, T: ResultLabel>() -> Parser<S, T> {
    char_if(|_| true)
}

/// The line transition at the end of a non-last line
///
/// Deliberately fails at the end of the last line; `eol` covers that case
/// through `eof`.
pub fn newline<S: ParseState, T: ResultLabel>() -> Parser<S, T> {
    Parser::new(|state, model, line, col| {
        if line + 1 < model.line_count() && col == model.line_at(line).len() {
            Some(Parsed {
                state,
                tree: ResultTree::leaf(
                    NodeKind::Discarded,
                    crate::position::Span::new(Position::new(line, col), Position::new(line + 1, 0)),
                ),
            })
        } else {
            None
        }
    })
}

/// Zero-length success at the end of input
pub fn eof<S: ParseState, T: ResultLabel>() -> Parser<S, T> {
    Parser::new(|state, model, line, col| {
        if model.at_eof(line, col) {
            Some(Parsed {
                state,
                tree: ResultTree::point(NodeKind::Discarded, Position::new(line, col)),
            })
        } else {
            None
        }
    })
}

/// Zero-length success at column zero of an existing line
pub fn bol<S: ParseState, T: ResultLabel>() -> Parser<S, T> {
    Parser::new(|state, model, line, col| {
        if col == 0 && line < model.line_count() {
            Some(Parsed {
                state,
                tree: ResultTree::point(NodeKind::Discarded, Position::new(line, col)),
            })
        } else {
            None
        }
    })
}

/// End of line: end of input or a line transition
pub fn eol<S: ParseState, T: ResultLabel>() -> Parser<S, T> {
    or(vec![eof(), newline()])
}

/// Succeeds exactly when `p` fails; consumes nothing
///
/// The caller's state is returned unchanged on both branches.
pub fn not<S: ParseState, T: ResultLabel>(p: Parser<S, T>) -> Parser<S, T> {
    Parser::new(move |state: S, model, line, col| {
        match p.parse(state.clone(), model, line, col) {
            Some(_) => None,
            None => Some(Parsed {
                state,
                tree: ResultTree::point(NodeKind::Discarded, Position::new(line, col)),
            }),
        }
    })
}

/// Succeeds exactly when `p` succeeds; consumes nothing
///
/// The inner parser's state changes are dropped.
pub fn lookahead<S: ParseState, T: ResultLabel>(p: Parser<S, T>) -> Parser<S, T> {
    Parser::new(move |state: S, model, line, col| {
        p.parse(state.clone(), model, line, col)?;
        Some(Parsed {
            state,
            tree: ResultTree::point(NodeKind::Discarded, Position::new(line, col)),
        })
    })
}

/// Run parsers in sequence, threading state and cursor
///
/// Zero parsers is `empty`; one parser is that parser unchanged. Otherwise
/// the results are assembled into a structural node spanning the entry
/// position to the last child's end.
pub fn seq<S: ParseState, T: ResultLabel>(parsers: Vec<Parser<S, T>>) -> Parser<S, T> {
    match parsers.len() {
        0 => empty(),
        1 => parsers.into_iter().next().unwrap(),
        _ => Parser::new(move |state: S, model, line, col| {
            let entry = Position::new(line, col);
            let mut state = state;
            let mut cursor = entry;
            let mut children = Vec::with_capacity(parsers.len());
            for p in &parsers {
                let step = p.parse(state, model, cursor.line, cursor.column)?;
                state = step.state;
                cursor = step.tree.span.end;
                children.push(step.tree);
            }
            Some(Parsed {
                state,
                tree: join(children, NodeKind::Structural, Some(entry), Some(cursor)),
            })
        }),
    }
}

/// Try parsers in order; the first success wins
///
/// There is no backtracking inside the chosen branch.
pub fn or<S: ParseState, T: ResultLabel>(parsers: Vec<Parser<S, T>>) -> Parser<S, T> {
    Parser::new(move |state: S, model, line, col| {
        parsers
            .iter()
            .find_map(|p| p.parse(state.clone(), model, line, col))
    })
}

/// The sequence, or a zero-length structural node
pub fn opt<S: ParseState, T: ResultLabel>(parsers: Vec<Parser<S, T>>) -> Parser<S, T> {
    or(vec![seq(parsers), empty()])
}

/// Greedy repetition of the sequence; always succeeds
///
/// Iteration stops when the sequence fails, and also after an iteration
/// that consumed no input (a zero-length inner parser would otherwise
/// never terminate; its result is kept once).
pub fn rep<S: ParseState, T: ResultLabel>(parsers: Vec<Parser<S, T>>) -> Parser<S, T> {
    let inner = seq(parsers);
    Parser::new(move |state: S, model, line, col| {
        let entry = Position::new(line, col);
        let mut state = state;
        let mut cursor = entry;
        let mut children = Vec::new();
        while let Some(step) = inner.parse(state.clone(), model, cursor.line, cursor.column) {
            let end = step.tree.span.end;
            state = step.state;
            children.push(step.tree);
            let progressed = end != cursor;
            cursor = end;
            if !progressed {
                break;
            }
        }
        Some(Parsed {
            state,
            tree: join(children, NodeKind::Structural, Some(entry), Some(cursor)),
        })
    })
}

/// One or more repetitions of the sequence
pub fn rep1<S: ParseState, T: ResultLabel>(parsers: Vec<Parser<S, T>>) -> Parser<S, T> {
    seq(vec![seq(parsers.clone()), rep(parsers)])
}

/// `elem` separated by `sep`: `seq(elem, rep(sep, elem))`
pub fn join_sep<S: ParseState, T: ResultLabel>(
    elem: Parser<S, T>,
    sep: Parser<S, T>,
) -> Parser<S, T> {
    seq(vec![elem.clone(), rep(vec![sep, elem])])
}

/// Defer construction of a parser until first use
///
/// Required for recursive grammars. The thunk runs at most once; the built
/// parser is cached.
pub fn lazy<S: ParseState, T: ResultLabel>(
    thunk: impl Fn() -> Parser<S, T> + Send + Sync + 'static,
) -> Parser<S, T> {
    let cell: Arc<OnceCell<Parser<S, T>>> = Arc::new(OnceCell::new());
    Parser::new(move |state, model, line, col| {
        cell.get_or_init(&thunk).parse(state, model, line, col)
    })
}

/// Match `text` character by character, producing a node of `kind`
///
/// The text is NFC-normalized the same way model lines are, so a literal
/// always compares in normal form.
pub fn literal<S: ParseState, T: ResultLabel>(text: &str, kind: NodeKind<T>) -> Parser<S, T> {
    let chars: Vec<char> = text.nfc().collect();
    let matcher = seq(
        chars
            .into_iter()
            .map(|expected| char_if(move |c| c == expected))
            .collect(),
    );
    set_kind(matcher, kind)
}

/// The first of several literals to match
pub fn literals<S: ParseState, T: ResultLabel>(texts: &[&str]) -> Parser<S, T> {
    or(texts
        .iter()
        .map(|&t| literal(t, NodeKind::Structural))
        .collect())
}

/// Post-process a success; returning `None` turns it into a failure
pub fn modify_result<S: ParseState, T: ResultLabel>(
    p: Parser<S, T>,
    f: impl Fn(Parsed<S, T>) -> Option<Parsed<S, T>> + Send + Sync + 'static,
) -> Parser<S, T> {
    Parser::new(move |state, model, line, col| p.parse(state, model, line, col).and_then(&f))
}

/// Recompute the kind of a successful result's root node
pub fn modify_kind<S: ParseState, T: ResultLabel>(
    p: Parser<S, T>,
    f: impl Fn(&ResultTree<T>) -> NodeKind<T> + Send + Sync + 'static,
) -> Parser<S, T> {
    modify_result(p, move |mut parsed| {
        parsed.tree.kind = f(&parsed.tree);
        Some(parsed)
    })
}

/// Replace the kind of a successful result's root node
pub fn set_kind<S: ParseState, T: ResultLabel>(p: Parser<S, T>, kind: NodeKind<T>) -> Parser<S, T> {
    modify_kind(p, move |_| kind.clone())
}
