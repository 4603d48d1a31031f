//! One-line-per-node rendering of pruned result trees
//!
//! Each node prints as `[LL:CC to LL:CC[` followed by four spaces of indent
//! per depth level, three spaces, and the node's name. Childless labeled
//! nodes that sit on a single line and are not opaque also print their
//! source text. Coordinates are zero-padded to two digits and widen
//! uniformly beyond 99.

use std::fmt::Write;

use crate::text::model::TextModel;
use crate::tree::{prune, ResultTree};

/// Render `tree` into `out`, pruning it first
pub fn print_result<T: Clone>(
    model: &TextModel,
    tree: &ResultTree<T>,
    name_of: &dyn Fn(&T) -> String,
    is_opaque: &dyn Fn(&T) -> bool,
    out: &mut String,
) {
    for root in prune(tree) {
        print_node(model, &root, name_of, is_opaque, 0, out);
    }
}

fn print_node<T>(
    model: &TextModel,
    node: &ResultTree<T>,
    name_of: &dyn Fn(&T) -> String,
    is_opaque: &dyn Fn(&T) -> bool,
    depth: usize,
    out: &mut String,
) {
    // pruned trees contain labeled nodes only
    let label = node
        .label()
        .expect("internal error: unlabeled node survived prune");
    let name = name_of(label);

    let _ = write!(
        out,
        "[{:02}:{:02} to {:02}:{:02}[",
        node.span.start.line, node.span.start.column, node.span.end.line, node.span.end.column
    );
    for _ in 0..depth {
        out.push_str("    ");
    }
    out.push_str("   ");
    out.push_str(&name);

    let atomic = node.children.is_empty() && node.span.single_line();
    if atomic && !is_opaque(label) {
        let _ = write!(out, " = \"{}\"", model.slice(node.span));
    }
    out.push('\n');

    for child in &node.children {
        print_node(model, child, name_of, is_opaque, depth + 1, out);
    }
}
