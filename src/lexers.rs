//! Lexers and the parser-to-lexer bridge
//!
//! A `Lexer` examines one line at a column and answers how many columns it
//! consumes; a negative answer means no match. Lexers drive the window
//! construction of the section parser, where running a full parser per
//! line would be overkill.

use std::sync::Arc;

use crate::combinators::{Parsed, Parser, ParseState, ResultLabel};
use crate::text::model::TextModel;
use crate::text::Text;

/// `(line, col) -> columns consumed`, negative for no match
pub type Lexer = Arc<dyn Fn(&Text, usize) -> isize + Send + Sync>;

/// Wrap a plain function as a [`Lexer`]
pub fn lexer(f: impl Fn(&Text, usize) -> isize + Send + Sync + 'static) -> Lexer {
    Arc::new(f)
}

/// Lift a stateless parser into a lexer
///
/// The parser runs against a one-line model built from the given line; the
/// lexer answers the number of columns the parser consumed, or -1.
pub fn parser_lexer<T: ResultLabel>(p: Parser<(), T>) -> Lexer {
    Arc::new(move |text: &Text, col: usize| {
        if col > text.len() {
            return -1;
        }
        let model = TextModel::from_lines(vec![text.clone()]);
        match p.parse((), &model, 0, col) {
            Some(parsed) => (parsed.tree.span.end.column - col) as isize,
            None => -1,
        }
    })
}

/// Erase a stateful parser by threading a fixed initial state
///
/// The returned parser feeds `initial` to `p` on every call and discards
/// the state `p` hands back.
pub fn null_parser<S: ParseState, T: ResultLabel>(p: Parser<S, T>, initial: S) -> Parser<(), T> {
    Parser::new(move |_state, model, line, col| {
        p.parse(initial.clone(), model, line, col).map(|parsed| Parsed {
            state: (),
            tree: parsed.tree,
        })
    })
}

/// A run of spaces (possibly empty)
pub fn spaces_lexer() -> Lexer {
    Arc::new(|text: &Text, col: usize| {
        let mut n = 0;
        while col + n < text.len() && text.char_at(col + n) == ' ' {
            n += 1;
        }
        n as isize
    })
}

/// Exactly `width` leading spaces; deeper runs consume only `width`
pub fn indent_lexer(width: usize) -> Lexer {
    let spaces = spaces_lexer();
    Arc::new(move |text: &Text, col: usize| {
        if spaces(text, col) >= width as isize {
            width as isize
        } else {
            -1
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinators::{char_if, rep1};

    #[test]
    fn test_spaces_lexer() {
        let spaces = spaces_lexer();
        assert_eq!(spaces(&Text::new("   x"), 0), 3);
        assert_eq!(spaces(&Text::new("x"), 0), 0);
        assert_eq!(spaces(&Text::new("a  b"), 1), 2);
    }

    #[test]
    fn test_indent_lexer() {
        let indent = indent_lexer(4);
        assert_eq!(indent(&Text::new("    a"), 0), 4);
        assert_eq!(indent(&Text::new("        a"), 0), 4);
        assert_eq!(indent(&Text::new("  a"), 0), -1);
    }

    #[test]
    fn test_parser_lexer_reports_consumed_columns() {
        let digits: Parser<(), &str> = rep1(vec![char_if(|c| c.is_ascii_digit())]);
        let lex = parser_lexer(digits);
        assert_eq!(lex(&Text::new("123ab"), 0), 3);
        assert_eq!(lex(&Text::new("12"), 1), 1);
        assert_eq!(lex(&Text::new("ab"), 0), -1);
        assert_eq!(lex(&Text::new("ab"), 2), -1);
    }

    #[test]
    fn test_null_parser_discards_state() {
        let counting: Parser<u32, &str> = crate::combinators::modify_result(
            char_if(|c| c == 'x'),
            |mut parsed| {
                parsed.state += 1;
                Some(parsed)
            },
        );
        let erased = null_parser(counting, 0);
        let model = TextModel::of("x");
        let out = erased.parse((), &model, 0, 0).unwrap();
        assert_eq!(out.state, ());
    }
}
