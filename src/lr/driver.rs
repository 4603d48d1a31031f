//! The table-driven LR runtime
//!
//! `build_lr_parsers` turns a grammar plus terminal readers into two
//! ordinary [`Parser`] values sharing one set of read-only tables:
//!
//! - **maximum-valid**: on error, truncate the input at the last position
//!   where end-of-input would have been accepted and reparse that prefix
//!   with the non-restarting driver
//! - **maximum-invalid**: on error, emit a best-effort partial tree under
//!   the `invalid` label (or fail plainly when no label was given)
//!
//! The runtime keeps a queue of tokens that have been read but not yet
//! shifted, with a user-state snapshot per token. Consecutive `Read` steps
//! along one decision path examine successive queued tokens; a `Shift`
//! with munch k consumes the first k of them as one child and rolls the
//! committed cursor and user state to the snapshot after token k, leaving
//! later speculative tokens queued.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::Arc;

use super::construction::build_graph;
use super::grammar::{Grammar, Lookahead, Rule, SymbolId};
use super::plan::{synthesize, ActionPlan};
use super::terminals::TerminalParsers;
use crate::combinators::{Parsed, Parser, ParseState, ResultLabel};
use crate::position::Position;
use crate::text::model::TextModel;
use crate::tree::{join, NodeKind, ResultTree};

/// The parsers derived from one grammar, plus its conflict report
pub struct LrParsers<S, T> {
    pub maximum_valid: Parser<S, T>,
    pub maximum_invalid: Parser<S, T>,
    /// Left-hand sides of reduce rules involved in table conflicts; the
    /// parsers stay callable but conflicted lookaheads error at runtime
    pub conflicts: BTreeSet<SymbolId>,
}

/// Read-only tables shared by both derived parsers
struct Tables<T> {
    rules: Vec<Rule>,
    transitions: HashMap<(usize, SymbolId), usize>,
    plans: Vec<ActionPlan>,
    labels: HashMap<SymbolId, T>,
    final_states: HashSet<usize>,
}

/// A token that has been read but not yet bound to the LR stack
struct PendingToken<S, T> {
    symbol: Lookahead,
    tree: ResultTree<T>,
    state_after: S,
}

/// Everything recovery needs when the driver stalls
struct Stalled<S, T> {
    state: S,
    children: Vec<ResultTree<T>>,
    pending: VecDeque<PendingToken<S, T>>,
    cursor: Position,
    last_valid: Option<Position>,
}

fn stalled<S, T>(
    state: S,
    children: Vec<ResultTree<T>>,
    pending: VecDeque<PendingToken<S, T>>,
    committed: Position,
    last_valid: Option<Position>,
) -> Stalled<S, T> {
    let cursor = pending.back().map(|p| p.tree.span.end).unwrap_or(committed);
    Stalled {
        state,
        children,
        pending,
        cursor,
        last_valid,
    }
}

/// Build the maximum-valid and maximum-invalid parsers for a grammar
///
/// `nonterminal_labels` names the nodes produced by reductions; unlisted
/// nonterminals reduce to structural nodes. `invalid`, when given, labels
/// the partial tree emitted on failure.
pub fn build_lr_parsers<S: ParseState, T: ResultLabel>(
    grammar: &Grammar,
    nonterminal_labels: HashMap<SymbolId, T>,
    terminal_parsers: TerminalParsers<S, T>,
    invalid: Option<T>,
) -> LrParsers<S, T> {
    let graph = build_graph(grammar);
    let mut conflicts = BTreeSet::new();
    let plans: Vec<ActionPlan> = graph
        .actions
        .iter()
        .map(|row| {
            let (plan, row_conflicts) = synthesize(row, &graph.rules);
            conflicts.extend(row_conflicts);
            plan
        })
        .collect();
    let final_states = graph
        .actions
        .iter()
        .enumerate()
        .filter(|(_, row)| row.contains_key(&None))
        .map(|(state, _)| state)
        .collect();

    let tables = Arc::new(Tables {
        rules: graph.rules,
        transitions: graph.transitions,
        plans,
        labels: nonterminal_labels,
        final_states,
    });

    let maximum_valid = {
        let tables = Arc::clone(&tables);
        let terminals = terminal_parsers.clone();
        let invalid = invalid.clone();
        Parser::new(move |state, model, line, col| {
            run(&tables, &terminals, &invalid, true, state, model, line, col)
        })
    };
    let maximum_invalid = {
        let tables = Arc::clone(&tables);
        let terminals = terminal_parsers;
        Parser::new(move |state, model, line, col| {
            run(&tables, &terminals, &invalid, false, state, model, line, col)
        })
    };

    LrParsers {
        maximum_valid,
        maximum_invalid,
        conflicts,
    }
}

#[allow(clippy::too_many_arguments)]
fn run<S: ParseState, T: ResultLabel>(
    tables: &Arc<Tables<T>>,
    terminals: &TerminalParsers<S, T>,
    invalid: &Option<T>,
    allow_restart: bool,
    state: S,
    model: &TextModel,
    line: usize,
    col: usize,
) -> Option<Parsed<S, T>> {
    match drive(tables, terminals, state.clone(), model, line, col) {
        Ok(parsed) => Some(parsed),
        Err(stall) => {
            if allow_restart {
                if let Some(valid) = stall.last_valid {
                    tracing::debug!(last_valid = %valid, "parse stalled; reparsing the valid prefix");
                    let truncated = model.until(valid.line, valid.column);
                    return run(
                        tables, terminals, invalid, false, state, &truncated, line, col,
                    );
                }
            }
            let label = invalid.clone()?;
            let entry = Position::new(line, col);
            let mut parts = stall.children;
            parts.extend(stall.pending.into_iter().map(|p| p.tree));
            let tree = join(parts, NodeKind::Labeled(label), Some(entry), Some(stall.cursor));
            Some(Parsed {
                state: stall.state,
                tree,
            })
        }
    }
}

fn drive<S: ParseState, T: ResultLabel>(
    tables: &Tables<T>,
    terminals: &TerminalParsers<S, T>,
    entry_state: S,
    model: &TextModel,
    entry_line: usize,
    entry_col: usize,
) -> Result<Parsed<S, T>, Stalled<S, T>> {
    let mut states = vec![0usize];
    let mut children: Vec<ResultTree<T>> = Vec::new();
    let mut pending: VecDeque<PendingToken<S, T>> = VecDeque::new();
    let mut committed_state = entry_state;
    let mut committed = Position::new(entry_line, entry_col);
    let mut last_valid: Option<Position> = None;

    'automaton: loop {
        let state_id = *states.last().expect("state stack never empty");
        if tables.final_states.contains(&state_id) {
            last_valid = Some(committed);
        }

        // walk the state's plan; reads along the way examine successive
        // pending tokens without consuming them
        let mut read_index = 0usize;
        let mut plan = &tables.plans[state_id];
        loop {
            match plan {
                ActionPlan::Error => {
                    return Err(stalled(
                        committed_state,
                        children,
                        pending,
                        committed,
                        last_valid,
                    ));
                }

                ActionPlan::Accept => {
                    if children.len() != 1 {
                        panic!(
                            "internal error: accept with {} buffered trees",
                            children.len()
                        );
                    }
                    let tree = children.pop().expect("length checked above");
                    tracing::trace!(span = %tree.span, "accept");
                    return Ok(Parsed {
                        state: committed_state,
                        tree,
                    });
                }

                ActionPlan::Reduce(rule_index) => {
                    let rule = &tables.rules[*rule_index];
                    let arity = rule.rhs.len();
                    if states.len() <= arity || children.len() < arity {
                        return Err(stalled(
                            committed_state,
                            children,
                            pending,
                            committed,
                            last_valid,
                        ));
                    }
                    let uncovered = states[states.len() - 1 - arity];
                    let Some(&target) = tables.transitions.get(&(uncovered, rule.lhs)) else {
                        return Err(stalled(
                            committed_state,
                            children,
                            pending,
                            committed,
                            last_valid,
                        ));
                    };
                    states.truncate(states.len() - arity);
                    let popped = children.split_off(children.len() - arity);
                    let kind = match tables.labels.get(&rule.lhs) {
                        Some(label) => NodeKind::Labeled(label.clone()),
                        None => NodeKind::Structural,
                    };
                    let tree = if arity == 0 {
                        join(popped, kind, Some(committed), Some(committed))
                    } else {
                        join(popped, kind, None, None)
                    };
                    states.push(target);
                    children.push(tree);
                    continue 'automaton;
                }

                ActionPlan::Shift(target, munch) => {
                    let munch = *munch;
                    assert!(
                        munch >= 1 && munch <= pending.len(),
                        "internal error: shift consuming {} of {} pending tokens",
                        munch,
                        pending.len()
                    );
                    let taken: Vec<PendingToken<S, T>> = pending.drain(..munch).collect();
                    {
                        let last = taken.last().expect("munch is at least one");
                        committed_state = last.state_after.clone();
                        committed = last.tree.span.end;
                    }
                    let tree = if munch == 1 {
                        taken.into_iter().next().expect("munch is one").tree
                    } else {
                        join(
                            taken.into_iter().map(|p| p.tree).collect(),
                            NodeKind::Structural,
                            None,
                            None,
                        )
                    };
                    states.push(*target);
                    children.push(tree);
                    continue 'automaton;
                }

                ActionPlan::Read(options) => {
                    if read_index >= pending.len() {
                        let wanted: BTreeSet<SymbolId> = options
                            .iter()
                            .flat_map(|o| o.terminals.iter().copied().flatten())
                            .collect();
                        let eof_wanted = options.iter().any(|o| o.terminals.contains(&None));
                        let (cursor, cursor_state) = match pending.back() {
                            Some(p) => (p.tree.span.end, p.state_after.clone()),
                            None => (committed, committed_state.clone()),
                        };
                        let mut matches =
                            terminals.read(&wanted, &cursor_state, model, cursor.line, cursor.column);
                        let token = if matches.len() == 1 {
                            let m = matches.pop().expect("length checked above");
                            PendingToken {
                                symbol: Some(m.symbol),
                                tree: m.tree,
                                state_after: m.state,
                            }
                        } else if matches.is_empty()
                            && eof_wanted
                            && model.at_eof(cursor.line, cursor.column)
                        {
                            PendingToken {
                                symbol: None,
                                tree: ResultTree::point(NodeKind::Discarded, cursor),
                                state_after: cursor_state,
                            }
                        } else {
                            // zero or several candidates; both mask a
                            // grammar/lexer mismatch, so fail loudly
                            tracing::trace!(candidates = matches.len(), at = %cursor, "terminal read not unique");
                            return Err(stalled(
                                committed_state,
                                children,
                                pending,
                                committed,
                                last_valid,
                            ));
                        };
                        pending.push_back(token);
                    }
                    let symbol = pending[read_index].symbol;
                    read_index += 1;
                    match options.iter().find(|o| o.terminals.contains(&symbol)) {
                        Some(option) => plan = &option.plan,
                        None => {
                            return Err(stalled(
                                committed_state,
                                children,
                                pending,
                                committed,
                                last_valid,
                            ));
                        }
                    }
                }
            }
        }
    }
}
