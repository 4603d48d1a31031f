//! Canonical LR(1) state graph construction
//!
//! Builds the numbered state set, the transition map, and the raw
//! shift/reduce/accept action table the driver's plans are synthesized
//! from. The grammar is augmented internally with a fresh start rule so
//! acceptance is the completion of rule 0 under the end-of-input
//! lookahead.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use super::grammar::{Grammar, Lookahead, Rule, SymbolId};

/// The hidden left-hand side of the augmented start rule
pub(crate) const AUGMENTED_START: SymbolId = SymbolId(u32::MAX);

/// One entry of the raw action table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum RawAction {
    Shift(usize),
    Reduce(usize),
    Accept,
}

/// The finished LR(1) graph the driver consumes
#[derive(Debug)]
pub(crate) struct LrGraph {
    /// Augmented rule list; rule 0 is `<start> -> start`
    pub rules: Vec<Rule>,
    /// Terminal shifts and nonterminal gotos, keyed by (state, symbol)
    pub transitions: HashMap<(usize, SymbolId), usize>,
    /// Per state: lookahead -> possible actions (more than one is a conflict)
    pub actions: Vec<BTreeMap<Lookahead, BTreeSet<RawAction>>>,
}

/// An LR(1) item: a rule, a dot position, and one lookahead
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct Item {
    rule: usize,
    dot: usize,
    la: Lookahead,
}

pub(crate) fn build_graph(grammar: &Grammar) -> LrGraph {
    let mut rules = vec![Rule {
        lhs: AUGMENTED_START,
        rhs: vec![grammar.start()],
    }];
    rules.extend(grammar.rules().iter().cloned());

    let by_lhs: HashMap<SymbolId, Vec<usize>> = {
        let mut map: HashMap<SymbolId, Vec<usize>> = HashMap::new();
        for (i, rule) in rules.iter().enumerate() {
            map.entry(rule.lhs).or_default().push(i);
        }
        map
    };
    let nullable = nullable_set(&rules);
    let first = first_sets(grammar, &rules, &nullable);

    let ctx = Ctx {
        grammar,
        rules: &rules,
        by_lhs: &by_lhs,
        nullable: &nullable,
        first: &first,
    };

    // canonical collection, breadth first
    let start_state = ctx.closure(BTreeSet::from([Item {
        rule: 0,
        dot: 0,
        la: None,
    }]));
    let mut states = vec![start_state.clone()];
    let mut index: HashMap<BTreeSet<Item>, usize> = HashMap::from([(start_state, 0)]);
    let mut transitions: HashMap<(usize, SymbolId), usize> = HashMap::new();
    let mut queue = VecDeque::from([0usize]);

    while let Some(s) = queue.pop_front() {
        let mut kernels: BTreeMap<SymbolId, BTreeSet<Item>> = BTreeMap::new();
        for item in &states[s] {
            let rule = &ctx.rules[item.rule];
            if let Some(&next) = rule.rhs.get(item.dot) {
                kernels.entry(next).or_default().insert(Item {
                    rule: item.rule,
                    dot: item.dot + 1,
                    la: item.la,
                });
            }
        }
        for (sym, kernel) in kernels {
            let target_set = ctx.closure(kernel);
            let target = match index.get(&target_set) {
                Some(&t) => t,
                None => {
                    let t = states.len();
                    states.push(target_set.clone());
                    index.insert(target_set, t);
                    queue.push_back(t);
                    t
                }
            };
            transitions.insert((s, sym), target);
        }
    }

    // raw action table
    let actions = states
        .iter()
        .enumerate()
        .map(|(s, items)| {
            let mut row: BTreeMap<Lookahead, BTreeSet<RawAction>> = BTreeMap::new();
            for item in items {
                let rule = &ctx.rules[item.rule];
                match rule.rhs.get(item.dot) {
                    Some(&next) if grammar.is_terminal(next) => {
                        let target = transitions[&(s, next)];
                        row.entry(Some(next))
                            .or_default()
                            .insert(RawAction::Shift(target));
                    }
                    Some(_) => {}
                    None if item.rule == 0 => {
                        row.entry(None).or_default().insert(RawAction::Accept);
                    }
                    None => {
                        row.entry(item.la)
                            .or_default()
                            .insert(RawAction::Reduce(item.rule));
                    }
                }
            }
            row
        })
        .collect();

    tracing::debug!(states = states.len(), "LR(1) graph built");
    LrGraph {
        rules,
        transitions,
        actions,
    }
}

struct Ctx<'a> {
    grammar: &'a Grammar,
    rules: &'a [Rule],
    by_lhs: &'a HashMap<SymbolId, Vec<usize>>,
    nullable: &'a BTreeSet<SymbolId>,
    first: &'a HashMap<SymbolId, BTreeSet<SymbolId>>,
}

impl Ctx<'_> {
    /// FIRST of a symbol sequence followed by a lookahead
    fn first_of(&self, seq: &[SymbolId], la: Lookahead) -> BTreeSet<Lookahead> {
        let mut out = BTreeSet::new();
        for sym in seq {
            if let Some(set) = self.first.get(sym) {
                out.extend(set.iter().map(|&t| Some(t)));
            }
            if !self.nullable.contains(sym) {
                return out;
            }
        }
        out.insert(la);
        out
    }

    fn closure(&self, items: BTreeSet<Item>) -> BTreeSet<Item> {
        let mut set = items;
        let mut queue: VecDeque<Item> = set.iter().copied().collect();
        while let Some(item) = queue.pop_front() {
            let rule = &self.rules[item.rule];
            let Some(&next) = rule.rhs.get(item.dot) else {
                continue;
            };
            if self.grammar.is_terminal(next) {
                continue;
            }
            let rest = &rule.rhs[item.dot + 1..];
            for la in self.first_of(rest, item.la) {
                for &ri in self.by_lhs.get(&next).into_iter().flatten() {
                    let new = Item {
                        rule: ri,
                        dot: 0,
                        la,
                    };
                    if set.insert(new) {
                        queue.push_back(new);
                    }
                }
            }
        }
        set
    }
}

fn nullable_set(rules: &[Rule]) -> BTreeSet<SymbolId> {
    let mut nullable = BTreeSet::new();
    loop {
        let mut changed = false;
        for rule in rules {
            if !nullable.contains(&rule.lhs) && rule.rhs.iter().all(|s| nullable.contains(s)) {
                nullable.insert(rule.lhs);
                changed = true;
            }
        }
        if !changed {
            return nullable;
        }
    }
}

fn first_sets(
    grammar: &Grammar,
    rules: &[Rule],
    nullable: &BTreeSet<SymbolId>,
) -> HashMap<SymbolId, BTreeSet<SymbolId>> {
    let mut first: HashMap<SymbolId, BTreeSet<SymbolId>> = grammar
        .symbols()
        .map(|sym| {
            let set = if grammar.is_terminal(sym) {
                BTreeSet::from([sym])
            } else {
                BTreeSet::new()
            };
            (sym, set)
        })
        .collect();
    first.insert(AUGMENTED_START, BTreeSet::new());

    loop {
        let mut changed = false;
        for rule in rules {
            let mut gained: BTreeSet<SymbolId> = BTreeSet::new();
            for sym in &rule.rhs {
                if let Some(set) = first.get(sym) {
                    gained.extend(set.iter().copied());
                }
                if !nullable.contains(sym) {
                    break;
                }
            }
            let target = first.entry(rule.lhs).or_default();
            let before = target.len();
            target.extend(gained);
            changed |= target.len() != before;
        }
        if !changed {
            return first;
        }
    }
}
