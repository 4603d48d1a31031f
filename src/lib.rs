//! # dent
//!
//! A toolkit for building parsers over indentation-structured text.
//!
//! Parsers are pure functions over a line-addressable [`text::model::TextModel`],
//! producing [`tree::ResultTree`] values with `(line, column)` spans. The
//! [`section::section`] combinator re-anchors indented bodies at column
//! zero through a window view, and the [`lr`] module layers a table-driven
//! LR(1) engine over the same terminal shape, with a maximum-valid restart
//! on failure.

pub mod combinators;
pub mod lexers;
pub mod lr;
pub mod position;
pub mod section;
pub mod text;
pub mod tree;
