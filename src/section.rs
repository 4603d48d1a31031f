//! The re-indentation combinator
//!
//! A section is a bullet line followed by an indented body and an optional
//! trailing element:
//!
//! ```text
//! <bullet>
//!     <body lines, each behind an indentation prefix>
//! <after>
//! ```
//!
//! The body parser runs inside a `CutOut` window whose column zero is the
//! body's logical start, so body grammars never see the indentation. The
//! body's spans are shifted back to source coordinates before the section
//! node is assembled, so consumers downstream see uniform spans.

use crate::combinators::{Parsed, Parser, ParseState, ResultLabel};
use crate::lexers::Lexer;
use crate::position::{Position, Span};
use crate::text::model::TextModel;
use crate::tree::{join, NodeKind, ResultTree};

/// Build a section parser
///
/// Protocol at entry `(line, 0)` (a nonzero entry column fails):
///
/// 1. run `bullet` on a `CutOff` view that ends after the first line whose
///    `spaces` prefix is empty;
/// 2. anchor a `CutOut` window at the bullet's end, skipping `spaces` on
///    the first continuation and `indentation` on every later line;
/// 3. obtain the body parser from `body_of(source, state, bullet_tree)`
///    and run it at the window's `(0, 0)`;
/// 4. shift the body's spans back to source coordinates;
/// 5. optionally run `after` at the post-body position - its failure is
///    non-fatal and simply omits the branch.
pub fn section<S: ParseState, T: ResultLabel>(
    bullet: Parser<S, T>,
    body_of: impl Fn(&TextModel, &S, &ResultTree<T>) -> Parser<S, T> + Send + Sync + 'static,
    spaces: Lexer,
    indentation: Lexer,
    after: Option<Parser<S, T>>,
) -> Parser<S, T> {
    Parser::new(move |state: S, model, line, col| {
        if col != 0 {
            return None;
        }

        let spaces_probe = spaces.clone();
        let bounded = model.cut_off(line, &move |t| spaces_probe(t, 0) > 0);
        let bullet_out = bullet.parse(state, &bounded, line, 0)?;
        let bullet_end = bullet_out.tree.span.end;
        tracing::trace!(bullet = %bullet_out.tree.span, "section bullet matched");

        let window = model.cut_out(bullet_end.line, bullet_end.column, &*spaces, &*indentation);
        let body_parser = body_of(model, &bullet_out.state, &bullet_out.tree);
        let body_out = body_parser.parse(bullet_out.state, &window, 0, 0)?;

        let mut body_tree = body_out.tree;
        shift_tree(&mut body_tree, &window);
        let body_end = body_tree.span.end;

        let mut state = body_out.state;
        let mut end = body_end;
        let mut children = vec![bullet_out.tree, body_tree];
        if let Some(after_parser) = &after {
            if let Some(after_out) =
                after_parser.parse(state.clone(), model, body_end.line, body_end.column)
            {
                state = after_out.state;
                end = after_out.tree.span.end;
                children.push(after_out.tree);
            }
        }

        Some(Parsed {
            state,
            tree: join(
                children,
                NodeKind::Structural,
                Some(Position::new(line, col)),
                Some(end),
            ),
        })
    })
}

/// Translate every span in a windowed tree back into the window's base
fn shift_tree<T>(tree: &mut ResultTree<T>, window: &TextModel) {
    let start = window.shift(tree.span.start.line, tree.span.start.column);
    let end = window.shift(tree.span.end.line, tree.span.end.column);
    tree.span = Span::new(start, end);
    for child in &mut tree.children {
        shift_tree(child, window);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinators::{char_if, eol, literal, rep, rep1, seq};
    use crate::lexers::{indent_lexer, spaces_lexer};

    type P = Parser<(), &'static str>;

    /// one body item per line: a run of non-space characters, then eol
    fn body_lines() -> P {
        rep(vec![seq(vec![
            crate::combinators::set_kind(
                rep1(vec![char_if(|c| c != ' ')]),
                NodeKind::Labeled("Item"),
            ),
            eol(),
        ])])
    }

    #[test]
    fn test_section_shape() {
        let model = TextModel::of("- x\n    a\n    b\nend");
        let parser: P = section(
            literal("- x", NodeKind::Labeled("Bullet")),
            |_, _, _| body_lines(),
            spaces_lexer(),
            indent_lexer(4),
            None,
        );
        let out = parser.parse((), &model, 0, 0).unwrap();
        assert_eq!(
            out.tree.span,
            Span::new(Position::new(0, 0), Position::new(2, 5))
        );
        let bullet = &out.tree.children[0];
        assert_eq!(
            bullet.span,
            Span::new(Position::new(0, 0), Position::new(0, 3))
        );
        let body = &out.tree.children[1];
        assert_eq!(
            body.span,
            Span::new(Position::new(1, 4), Position::new(2, 5))
        );
    }

    #[test]
    fn test_section_requires_column_zero() {
        let model = TextModel::of(" - x");
        let parser: P = section(
            literal("- x", NodeKind::Labeled("Bullet")),
            |_, _, _| body_lines(),
            spaces_lexer(),
            indent_lexer(4),
            None,
        );
        assert!(parser.parse((), &model, 0, 1).is_none());
    }

    #[test]
    fn test_shift_restores_source_text() {
        let model = TextModel::of("- x\n    a\n    b\nend");
        let parser: P = section(
            literal("- x", NodeKind::Labeled("Bullet")),
            |_, _, _| body_lines(),
            spaces_lexer(),
            indent_lexer(4),
            None,
        );
        let out = parser.parse((), &model, 0, 0).unwrap();
        let items = crate::tree::collect(&out.tree, &|l| *l == "Item");
        let texts: Vec<String> = items
            .iter()
            .map(|item| crate::tree::text_of(&model, item))
            .collect();
        assert_eq!(texts, ["a", "b"]);
    }

    #[test]
    fn test_after_branch_is_optional() {
        // the body window ends before the source newline, so an after
        // parser picks up at the end of the last body line
        let model = TextModel::of("- x\n    a\nend");
        let with_after: P = section(
            literal("- x", NodeKind::Labeled("Bullet")),
            |_, _, _| body_lines(),
            spaces_lexer(),
            indent_lexer(4),
            Some(seq(vec![eol(), literal("end", NodeKind::Labeled("After"))])),
        );
        let out = with_after.parse((), &model, 0, 0).unwrap();
        assert_eq!(out.tree.children.len(), 3);
        assert_eq!(
            out.tree.span,
            Span::new(Position::new(0, 0), Position::new(2, 3))
        );

        // a failing after parser is simply omitted
        let missing_after: P = section(
            literal("- x", NodeKind::Labeled("Bullet")),
            |_, _, _| body_lines(),
            spaces_lexer(),
            indent_lexer(4),
            Some(seq(vec![eol(), literal("nope", NodeKind::Labeled("After"))])),
        );
        let out = missing_after.parse((), &model, 0, 0).unwrap();
        assert_eq!(out.tree.children.len(), 2);
    }
}
