//! The parse-tree value produced by every parser
//!
//! A `ResultTree` node is labeled, structural, or discarded. Discarded
//! nodes are transient: the `join` helper filters them out when a parent is
//! assembled, so they never survive into a finished tree. Structural nodes
//! group children without naming them and are collapsed by `prune`.

pub mod printer;

use crate::position::{Position, Span};
use crate::text::model::TextModel;
use crate::text::Text;

/// The three kinds of parse-tree nodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind<T> {
    /// A node carrying a user-defined label
    Labeled(T),
    /// An unlabeled grouping node, collapsed by `prune`
    Structural,
    /// A transient node, removed by `join` before a tree is finished
    Discarded,
}

impl<T> NodeKind<T> {
    pub fn label(&self) -> Option<&T> {
        match self {
            NodeKind::Labeled(label) => Some(label),
            _ => None,
        }
    }

    pub fn is_discarded(&self) -> bool {
        matches!(self, NodeKind::Discarded)
    }
}

/// A parse-tree node with a source span and ordered children
///
/// Invariants: children's spans are in non-decreasing order, each child's
/// span lies within the parent's, and no child is discarded once the node
/// has been assembled by [`join`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultTree<T> {
    pub kind: NodeKind<T>,
    pub span: Span,
    pub children: Vec<ResultTree<T>>,
}

impl<T> ResultTree<T> {
    /// A childless node over a span
    pub fn leaf(kind: NodeKind<T>, span: Span) -> Self {
        Self {
            kind,
            span,
            children: Vec::new(),
        }
    }

    /// A zero-length node at a single position
    pub fn point(kind: NodeKind<T>, at: Position) -> Self {
        Self::leaf(kind, Span::point(at))
    }

    pub fn label(&self) -> Option<&T> {
        self.kind.label()
    }
}

/// Assemble a parent node from ordered children
///
/// The node's span is the first child's start to the last child's end
/// unless overridden. Discarded children are filtered out of the produced
/// node; labeled and structural children are retained.
///
/// Panics when `children` is empty with no override to take a bound from
/// (invalid arguments), or when children overlap, run backwards, or escape
/// the computed span (invalid layout). Both are programmer errors.
pub fn join<T>(
    children: Vec<ResultTree<T>>,
    kind: NodeKind<T>,
    start_override: Option<Position>,
    end_override: Option<Position>,
) -> ResultTree<T> {
    let start = start_override
        .or_else(|| children.first().map(|c| c.span.start))
        .unwrap_or_else(|| panic!("invalid arguments: join of no children and no start bound"));
    let end = end_override
        .or_else(|| children.last().map(|c| c.span.end))
        .unwrap_or_else(|| panic!("invalid arguments: join of no children and no end bound"));
    if start > end {
        panic!("invalid layout: join span runs backwards ({}..{})", start, end);
    }

    let mut cursor = start;
    for child in &children {
        if cursor > child.span.start {
            panic!(
                "invalid layout: child at {} begins before cursor {}",
                child.span, cursor
            );
        }
        cursor = child.span.end;
    }
    if cursor > end {
        panic!(
            "invalid layout: children end at {} past the span end {}",
            cursor, end
        );
    }

    ResultTree {
        kind,
        span: Span::new(start, end),
        children: children
            .into_iter()
            .filter(|c| !c.kind.is_discarded())
            .collect(),
    }
}

/// Reduce a tree to its labeled skeleton
///
/// Labeled nodes are kept with their children pruned recursively;
/// structural nodes are collapsed by promoting their pruned children;
/// discarded nodes vanish. Idempotent.
pub fn prune<T: Clone>(tree: &ResultTree<T>) -> Vec<ResultTree<T>> {
    match &tree.kind {
        NodeKind::Labeled(label) => vec![ResultTree {
            kind: NodeKind::Labeled(label.clone()),
            span: tree.span,
            children: tree.children.iter().flat_map(prune).collect(),
        }],
        NodeKind::Structural => tree.children.iter().flat_map(prune).collect(),
        NodeKind::Discarded => Vec::new(),
    }
}

/// The topmost labeled nodes matching `pred`
///
/// Structural nodes are entered transparently; a labeled node stops the
/// descent whether or not it matches.
pub fn select<'a, T>(
    tree: &'a ResultTree<T>,
    pred: &dyn Fn(&T) -> bool,
) -> Vec<&'a ResultTree<T>> {
    match &tree.kind {
        NodeKind::Labeled(label) => {
            if pred(label) {
                vec![tree]
            } else {
                Vec::new()
            }
        }
        NodeKind::Structural => tree.children.iter().flat_map(|c| select(c, pred)).collect(),
        NodeKind::Discarded => Vec::new(),
    }
}

/// Every labeled node matching `pred`, at any depth
pub fn collect<'a, T>(
    tree: &'a ResultTree<T>,
    pred: &dyn Fn(&T) -> bool,
) -> Vec<&'a ResultTree<T>> {
    let mut found = Vec::new();
    match &tree.kind {
        NodeKind::Labeled(label) => {
            if pred(label) {
                found.push(tree);
            }
        }
        NodeKind::Discarded => return found,
        NodeKind::Structural => {}
    }
    for child in &tree.children {
        found.extend(collect(child, pred));
    }
    found
}

/// Like [`select`], but panics unless exactly one node matches
pub fn select_unique<'a, T>(
    tree: &'a ResultTree<T>,
    pred: &dyn Fn(&T) -> bool,
) -> &'a ResultTree<T> {
    let found = select(tree, pred);
    match found.as_slice() {
        [single] => single,
        _ => panic!("ambiguous selection: {} nodes matched", found.len()),
    }
}

/// Like [`collect`], but panics unless exactly one node matches
pub fn collect_unique<'a, T>(
    tree: &'a ResultTree<T>,
    pred: &dyn Fn(&T) -> bool,
) -> &'a ResultTree<T> {
    let found = collect(tree, pred);
    match found.as_slice() {
        [single] => single,
        _ => panic!("ambiguous selection: {} nodes matched", found.len()),
    }
}

/// The source text covered by a node's span
pub fn text_of<T>(model: &TextModel, tree: &ResultTree<T>) -> String {
    model.slice(tree.span)
}

/// The per-line source slices covered by a node's span
pub fn textlines_of<T>(model: &TextModel, tree: &ResultTree<T>) -> Vec<Text> {
    model.lines_in(tree.span)
}
