//! LR(1) parsing over combinator-shaped terminals
//!
//! The driver consumes a finished state graph and per-state action plans,
//! reading terminals through user-supplied [`terminals::TerminalParsers`]
//! so lexing stays in combinator land. Construction of the graph and the
//! plans happens once, in [`driver::build_lr_parsers`]; everything derived
//! is read-only and shared by the returned parsers.

pub(crate) mod construction;
pub mod driver;
pub mod grammar;
pub mod plan;
pub mod terminals;
