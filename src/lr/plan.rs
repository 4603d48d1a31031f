//! Per-state action plans
//!
//! A plan is the control program the driver executes in one LR state.
//! Synthesis turns a state's raw action row into a plan: a state whose
//! every lookahead reduces by the same rule reduces without reading;
//! every other non-empty state reads one terminal and dispatches on it.
//! Lookaheads whose raw actions conflict degrade to an `Error`
//! continuation and the involved reduce rules' left-hand sides are
//! reported, so conflicted grammars stay callable.

use std::collections::{BTreeMap, BTreeSet};

use super::construction::RawAction;
use super::grammar::{Lookahead, Rule, SymbolId};

/// The control program of one LR state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionPlan {
    /// No viable action
    Error,
    /// The buffered tree is the parse result
    Accept,
    /// Reduce by a rule without consulting the input
    Reduce(usize),
    /// Enter a state, consuming `munch` buffered tokens as one child
    Shift(usize, usize),
    /// Read one terminal and follow the option listing it
    Read(Vec<ReadOption>),
}

/// One dispatch arm of a `Read`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOption {
    pub terminals: Vec<Lookahead>,
    pub plan: ActionPlan,
}

/// Synthesize the plan for one state from its raw action row
///
/// Returns the plan plus the left-hand sides of reduce rules involved in
/// conflicts on this state.
pub(crate) fn synthesize(
    actions: &BTreeMap<Lookahead, BTreeSet<RawAction>>,
    rules: &[Rule],
) -> (ActionPlan, BTreeSet<SymbolId>) {
    let mut conflicts = BTreeSet::new();
    if actions.is_empty() {
        return (ActionPlan::Error, conflicts);
    }

    // resolve each lookahead; a conflicted lookahead resolves to None
    let mut resolved: BTreeMap<Lookahead, Option<RawAction>> = BTreeMap::new();
    for (la, set) in actions {
        if set.len() == 1 {
            resolved.insert(*la, set.iter().next().copied());
        } else {
            for action in set {
                if let RawAction::Reduce(rule) = action {
                    conflicts.insert(rules[*rule].lhs);
                }
            }
            resolved.insert(*la, None);
        }
    }

    // a state that reduces the same rule under every lookahead needs no read
    if conflicts.is_empty() {
        let mut reduces = resolved.values().map(|a| match a {
            Some(RawAction::Reduce(rule)) => Some(*rule),
            _ => None,
        });
        if let Some(Some(rule)) = reduces.next() {
            if reduces.all(|r| r == Some(rule)) {
                return (ActionPlan::Reduce(rule), conflicts);
            }
        }
    }

    // group lookaheads by their resolved action
    let mut groups: BTreeMap<Option<RawAction>, Vec<Lookahead>> = BTreeMap::new();
    for (la, action) in resolved {
        groups.entry(action).or_default().push(la);
    }
    let options = groups
        .into_iter()
        .map(|(action, terminals)| {
            let plan = match action {
                Some(RawAction::Shift(target)) => ActionPlan::Shift(target, 1),
                Some(RawAction::Reduce(rule)) => ActionPlan::Reduce(rule),
                Some(RawAction::Accept) => ActionPlan::Accept,
                None => ActionPlan::Error,
            };
            ReadOption { terminals, plan }
        })
        .collect();
    (ActionPlan::Read(options), conflicts)
}
