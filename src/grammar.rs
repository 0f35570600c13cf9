//! The top-level grammar driver.
//!
//! Walks a whole source file rule by rule, resynchronizing after each failed
//! rule so every top-level definition gets a chance to report its problems,
//! then checks sibling groups for duplicate names. The outcome is all or
//! nothing: a complete tree with no diagnostics, or no tree and a non-empty
//! diagnostics list.

use std::collections::HashSet;
use std::fmt;

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

use crate::cursor::Cursor;
use crate::diagnostics::{InternalError, SyntaxError};
use crate::rule::{Rule, RuleKind};

/// Why a grammar failed to parse.
#[derive(Debug, Error, Diagnostic)]
pub enum GrammarError {
    /// The source was malformed; every independently recoverable problem
    /// found during the pass is listed.
    #[error("grammar contains {} syntax error(s)", .0.len())]
    #[diagnostic(code(pegma::parse::failed))]
    Syntax(#[related] Vec<SyntaxError>),

    /// The parser hit a state it guarantees unreachable; nothing about the
    /// input can be trusted past this point.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Internal(#[from] InternalError),
}

impl GrammarError {
    /// The collected diagnostics, empty for an internal abort.
    pub fn diagnostics(&self) -> &[SyntaxError] {
        match self {
            GrammarError::Syntax(errors) => errors,
            GrammarError::Internal(_) => &[],
        }
    }
}

/// A fully parsed grammar: the ordered list of top-level rules.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grammar {
    pub rules: Vec<Rule>,
}

impl Grammar {
    /// Parses a whole grammar source.
    ///
    /// Succeeds only when every rule parsed cleanly and no name is defined
    /// twice within its sibling group; otherwise every diagnostic gathered
    /// during the pass is returned, in discovery order.
    pub fn parse(source: &str) -> Result<Grammar, GrammarError> {
        let mut cursor = Cursor::new(source);
        let mut errors = Vec::new();
        let mut rules = Vec::new();
        let mut errors_found = false;

        loop {
            cursor.skip_whitespace();
            if cursor.end_reached() {
                break;
            }

            match Rule::parse(&mut cursor, &mut errors, 0)? {
                Some(rule) => {
                    if !cursor.end_reached() && !cursor.peek_char('\n') {
                        return Err(InternalError::new("incomplete rule parse", &cursor).into());
                    }
                    rules.push(rule);
                }
                // The rule parser doesn't always resynchronize (header-level
                // indentation failures leave the cursor untouched), so the
                // driver skips the block itself before trying the next rule.
                None => {
                    errors_found = true;
                    cursor.skip_block();
                }
            }
        }

        if detect_duplicates(&rules, &mut errors) || errors_found {
            return Err(GrammarError::Syntax(errors));
        }
        Ok(Grammar { rules })
    }
}

// Flags every repeated name within one sibling group, recursing into each
// name-extended rule's children. One diagnostic per extra occurrence, at that
// occurrence's header.
fn detect_duplicates(rules: &[Rule], errors: &mut Vec<SyntaxError>) -> bool {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut duplicates_found = false;

    for rule in rules {
        if !seen.insert(rule.name.as_str()) {
            errors.push(SyntaxError::at(
                format!("redefinition of rule '{}'", rule.name),
                rule.position,
            ));
            duplicates_found = true;
        }

        if let RuleKind::NonTerminal(children) = &rule.kind {
            duplicates_found |= detect_duplicates(children, errors);
        }
    }

    duplicates_found
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rule in &self.rules {
            writeln!(f, "{rule}")?;
        }
        Ok(())
    }
}
