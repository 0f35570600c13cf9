pub use crate::cursor::{Cursor, Position};
pub use crate::diagnostics::{InternalError, ParseResult, SyntaxError};
pub use crate::grammar::{Grammar, GrammarError};
pub use crate::rule::{Rule, RuleKind};
pub use crate::term::{Bounds, Predicate, Term, TermKind};

pub mod cli;
pub mod cursor;
pub mod diagnostics;
pub mod grammar;
pub mod rule;
pub mod term;
