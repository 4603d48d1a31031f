//! Line-addressable text models and window views
//!
//! A `TextModel` is an immutable, cheaply clonable handle over a sequence
//! of lines. Besides the root model there are three derived views:
//!
//! 1. `CutOff` - restricts the line count to the line following the first
//!    non-indented line after a given line (used to bound bullet parsing)
//! 2. `CutOut` - re-anchors `(0, 0)` at a position inside the source and
//!    trims a per-line indentation prefix, so indented bodies parse as if
//!    they started at column zero; `shift` translates window coordinates
//!    back into the base model
//! 3. `Until` - truncates the model at an end position (used by the
//!    maximum-valid restart)
//!
//! Views hold a reference to their base plus per-line column offsets; line
//! content is never copied.

use std::fmt;
use std::sync::Arc;

use crate::position::{Position, Span};
use crate::text::{split_lines, Text, TextChar};

#[derive(Debug)]
enum Model {
    Root {
        lines: Vec<Text>,
    },
    CutOff {
        base: TextModel,
        line_count: usize,
    },
    CutOut {
        base: TextModel,
        anchor: Position,
        /// Per window line: the base line index and the first base column
        starts: Vec<(usize, usize)>,
    },
    Until {
        base: TextModel,
        end: Position,
    },
}

/// An immutable, line-addressable view of text
#[derive(Clone, Debug)]
pub struct TextModel {
    inner: Arc<Model>,
}

impl TextModel {
    /// Build a root model from a document string
    ///
    /// Lines are split on `\r\n`, `\n`, or `\r` and NFC-normalized.
    pub fn of(source: &str) -> Self {
        Self::from_lines(split_lines(source))
    }

    /// Build a root model from prepared lines
    pub fn from_lines(lines: Vec<Text>) -> Self {
        Self::wrap(Model::Root { lines })
    }

    fn wrap(model: Model) -> Self {
        Self {
            inner: Arc::new(model),
        }
    }

    pub fn line_count(&self) -> usize {
        match &*self.inner {
            Model::Root { lines } => lines.len(),
            Model::CutOff { line_count, .. } => *line_count,
            Model::CutOut { starts, .. } => starts.len(),
            Model::Until { base, end } => {
                let full = if end.column > 0 { end.line + 1 } else { end.line };
                full.min(base.line_count())
            }
        }
    }

    /// The line at `line`; panics when out of range
    pub fn line_at(&self, line: usize) -> Text {
        assert!(
            line < self.line_count(),
            "line {} out of range for model of {} lines",
            line,
            self.line_count()
        );
        match &*self.inner {
            Model::Root { lines } => lines[line].clone(),
            Model::CutOff { base, .. } => base.line_at(line),
            Model::CutOut { base, starts, .. } => {
                let (src, col) = starts[line];
                base.line_at(src).slice_from(col)
            }
            Model::Until { base, end } => {
                let text = base.line_at(line);
                if line == end.line {
                    text.slice(0, end.column)
                } else {
                    text
                }
            }
        }
    }

    /// The character at `(line, col)`; panics when out of range
    pub fn char_at(&self, line: usize, col: usize) -> TextChar {
        self.line_at(line).char_at(col)
    }

    /// True when `(line, col)` is on a line, at a line end, or at the
    /// end-of-input transition `(line_count, 0)`
    pub fn valid(&self, line: usize, col: usize) -> bool {
        if line < self.line_count() {
            col <= self.line_at(line).len()
        } else {
            line == self.line_count() && col == 0
        }
    }

    /// Fail fast on positions that are not addressable in this model
    pub fn assert_pos(&self, line: usize, col: usize) {
        if !self.valid(line, col) {
            panic!(
                "invalid position {}:{} in model of {} lines",
                line,
                col,
                self.line_count()
            );
        }
    }

    /// True at the end of the last line or at the end-of-input transition
    pub fn at_eof(&self, line: usize, col: usize) -> bool {
        let count = self.line_count();
        if line == count && col == 0 {
            return true;
        }
        count > 0 && line == count - 1 && col == self.line_at(line).len()
    }

    /// Translate a window coordinate one hop into the base model
    ///
    /// Identity for every model except `CutOut`. The end-of-window position
    /// `(line_count, 0)` maps to the line transition after the last window
    /// line, or to the anchor for an empty window.
    pub fn shift(&self, line: usize, col: usize) -> Position {
        self.assert_pos(line, col);
        match &*self.inner {
            Model::CutOut { anchor, starts, .. } => {
                if line < starts.len() {
                    let (src, start) = starts[line];
                    Position::new(src, start + col)
                } else {
                    match starts.last() {
                        Some(&(last, _)) => Position::new(last + 1, 0),
                        None => *anchor,
                    }
                }
            }
            _ => Position::new(line, col),
        }
    }

    /// Translate a coordinate to the outermost source model
    pub fn absolute(&self, line: usize, col: usize) -> Position {
        let shifted = self.shift(line, col);
        match &*self.inner {
            Model::Root { .. } => shifted,
            Model::CutOff { base, .. } | Model::CutOut { base, .. } | Model::Until { base, .. } => {
                base.absolute(shifted.line, shifted.column)
            }
        }
    }

    /// The text covered by `span`, with line transitions rendered as `\n`
    pub fn slice(&self, span: Span) -> String {
        self.assert_pos(span.start.line, span.start.column);
        self.assert_pos(span.end.line, span.end.column);
        assert!(span.start <= span.end, "slice of inverted span {}", span);

        let mut out = String::new();
        let mut line = span.start.line;
        let mut col = span.start.column;
        while line < span.end.line {
            let text = self.line_at(line);
            out.push_str(&text.slice(col, text.len()).as_string());
            out.push('\n');
            line += 1;
            col = 0;
        }
        if span.end.column > 0 || line == span.start.line {
            let text = self.line_at(line);
            out.push_str(&text.slice(col, span.end.column).as_string());
        }
        out
    }

    /// The per-line slices covered by `span`
    pub fn lines_in(&self, span: Span) -> Vec<Text> {
        self.assert_pos(span.start.line, span.start.column);
        self.assert_pos(span.end.line, span.end.column);
        assert!(span.start <= span.end, "slice of inverted span {}", span);

        let mut out = Vec::new();
        let mut line = span.start.line;
        let mut col = span.start.column;
        while line < span.end.line {
            let text = self.line_at(line);
            out.push(text.slice(col, text.len()));
            line += 1;
            col = 0;
        }
        if span.end.column > 0 || line == span.start.line {
            let text = self.line_at(line);
            out.push(text.slice(col, span.end.column));
        }
        out
    }

    /// Restrict the model to the lines up to and including the first
    /// non-indented line after `line`
    pub fn cut_off(&self, line: usize, is_indented: &dyn Fn(&Text) -> bool) -> TextModel {
        let count = self.line_count();
        let mut l = line + 1;
        while l < count && is_indented(&self.line_at(l)) {
            l += 1;
        }
        let line_count = if l < count { l + 1 } else { count };
        Self::wrap(Model::CutOff {
            base: self.clone(),
            line_count,
        })
    }

    /// Build a re-anchored window whose `(0, 0)` sits just after `(line, col)`
    ///
    /// When `col` is strictly inside its line, window line 0 is the suffix
    /// of that line starting at `col + skip_first(..)`; when `col` is at the
    /// line end, the first continuation is the next source line with
    /// `skip_first` applied at column 0. Each later line is trimmed by
    /// `skip_rest` and the window ends at the first line where `skip_rest`
    /// is negative. A negative `skip_first`, or an anchor with nothing
    /// after it, yields the empty window.
    pub fn cut_out(
        &self,
        line: usize,
        col: usize,
        skip_first: &dyn Fn(&Text, usize) -> isize,
        skip_rest: &dyn Fn(&Text, usize) -> isize,
    ) -> TextModel {
        self.assert_pos(line, col);
        let count = self.line_count();
        let mut starts = Vec::new();

        let inside = line < count && col < self.line_at(line).len();
        let (first_line, first_col) = if inside { (line, col) } else { (line + 1, 0) };

        if first_line < count {
            let text = self.line_at(first_line);
            let skip = skip_first(&text, first_col);
            if skip >= 0 {
                let start = first_col + skip as usize;
                assert!(
                    start <= text.len(),
                    "skip_first consumed past line end ({} > {})",
                    start,
                    text.len()
                );
                starts.push((first_line, start));
                let mut l = first_line + 1;
                while l < count {
                    let text = self.line_at(l);
                    let skip = skip_rest(&text, 0);
                    if skip < 0 {
                        break;
                    }
                    let start = skip as usize;
                    assert!(
                        start <= text.len(),
                        "skip_rest consumed past line end ({} > {})",
                        start,
                        text.len()
                    );
                    starts.push((l, start));
                    l += 1;
                }
            }
        }

        tracing::trace!(
            anchor = %Position::new(line, col),
            lines = starts.len(),
            "cut_out window"
        );
        Self::wrap(Model::CutOut {
            base: self.clone(),
            anchor: Position::new(line, col),
            starts,
        })
    }

    /// Truncate the model at `(line, col)` exclusive
    pub fn until(&self, line: usize, col: usize) -> TextModel {
        self.assert_pos(line, col);
        Self::wrap(Model::Until {
            base: self.clone(),
            end: Position::new(line, col),
        })
    }
}

impl fmt::Display for TextModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in 0..self.line_count() {
            if line > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", self.line_at(line))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spaces(text: &Text, col: usize) -> isize {
        let mut n = 0;
        while col + n < text.len() && text.char_at(col + n) == ' ' {
            n += 1;
        }
        n as isize
    }

    fn exactly_four(text: &Text, col: usize) -> isize {
        if spaces(text, col) >= 4 {
            4
        } else {
            -1
        }
    }

    #[test]
    fn test_root_addressing() {
        let model = TextModel::of("ab\ncd");
        assert_eq!(model.line_count(), 2);
        assert_eq!(model.char_at(1, 0), 'c');
        assert!(model.valid(0, 2));
        assert!(model.valid(2, 0));
        assert!(!model.valid(2, 1));
        assert!(model.at_eof(1, 2));
    }

    #[test]
    #[should_panic(expected = "invalid position")]
    fn test_assert_pos_fails_fast() {
        TextModel::of("ab").assert_pos(0, 3);
    }

    #[test]
    fn test_slice_multiline() {
        let model = TextModel::of("abc\ndef\nghi");
        let span = Span::new(Position::new(0, 1), Position::new(2, 2));
        assert_eq!(model.slice(span), "bc\ndef\ngh");
        let lines = model.lines_in(span);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].as_string(), "bc");
    }

    #[test]
    fn test_slice_to_line_transition() {
        let model = TextModel::of("abc\ndef");
        let span = Span::new(Position::new(0, 0), Position::new(1, 0));
        assert_eq!(model.slice(span), "abc\n");
    }

    #[test]
    fn test_cut_off_stops_after_first_unindented() {
        let model = TextModel::of("- x\n  a\n  b\nend\ntail");
        let view = model.cut_off(0, &|t| spaces(t, 0) > 0);
        assert_eq!(view.line_count(), 4);
        assert_eq!(view.line_at(3).as_string(), "end");
    }

    #[test]
    fn test_cut_off_runs_to_end() {
        let model = TextModel::of("- x\n  a\n  b");
        let view = model.cut_off(0, &|t| spaces(t, 0) > 0);
        assert_eq!(view.line_count(), 3);
    }

    #[test]
    fn test_cut_out_mid_line_anchor() {
        let model = TextModel::of("head: tail\n    more\ndone");
        let view = model.cut_out(0, 5, &spaces, &exactly_four);
        assert_eq!(view.line_count(), 2);
        assert_eq!(view.line_at(0).as_string(), "tail");
        assert_eq!(view.line_at(1).as_string(), "more");
        assert_eq!(view.shift(0, 0), Position::new(0, 6));
        assert_eq!(view.shift(1, 2), Position::new(1, 6));
    }

    #[test]
    fn test_cut_out_line_end_anchor_starts_next_line() {
        let model = TextModel::of("- x\n    a\n    b\nend");
        let view = model.cut_out(0, 3, &spaces, &exactly_four);
        assert_eq!(view.line_count(), 2);
        assert_eq!(view.line_at(0).as_string(), "a");
        assert_eq!(view.shift(0, 0), Position::new(1, 4));
        assert_eq!(view.shift(1, 1), Position::new(2, 5));
        assert_eq!(view.shift(2, 0), Position::new(3, 0));
    }

    #[test]
    fn test_cut_out_empty_window() {
        let model = TextModel::of("last");
        let view = model.cut_out(0, 4, &spaces, &exactly_four);
        assert_eq!(view.line_count(), 0);
        assert!(view.valid(0, 0));
        assert_eq!(view.shift(0, 0), Position::new(0, 4));
    }

    #[test]
    fn test_cut_out_absolute_chains_to_root() {
        let model = TextModel::of("- x\n    a");
        let view = model.cut_out(0, 3, &spaces, &exactly_four);
        let nested = view.cut_out(0, 0, &spaces, &|t, c| spaces(t, c));
        assert_eq!(nested.absolute(0, 0), Position::new(1, 4));
    }

    #[test]
    fn test_until_truncates() {
        let model = TextModel::of("1+2+\nrest");
        let view = model.until(0, 3);
        assert_eq!(view.line_count(), 1);
        assert_eq!(view.line_at(0).as_string(), "1+2");
        assert!(view.at_eof(0, 3));
    }

    #[test]
    fn test_until_at_column_zero_drops_line() {
        let model = TextModel::of("ab\ncd");
        let view = model.until(1, 0);
        assert_eq!(view.line_count(), 1);
        assert_eq!(view.line_at(0).as_string(), "ab");
    }
}
