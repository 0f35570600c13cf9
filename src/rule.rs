//! Rules: the named productions of a grammar, and the indentation-sensitive
//! recursive-descent parser that builds them.
//!
//! A rule is either *terminal* (`name: <pattern-expression>`) or
//! *name-extended* (`name...` followed by child rules indented exactly one
//! step deeper). The parser recovers from malformed rules where it can, so a
//! single pass reports as many independent problems as possible; a subtree
//! with any error in it is discarded wholesale, though its diagnostics stay.

use std::fmt;

use serde::Serialize;

use crate::cursor::{Cursor, Position, INDENT_WIDTH};
use crate::diagnostics::{InternalError, ParseResult, SyntaxError};
use crate::term::Term;

// ============================================================================
// DATA MODEL
// ============================================================================

/// The two shapes a rule can take. Exactly one applies to any rule; a
/// non-terminal's child list is never empty in a returned tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RuleKind {
    /// Binds the rule's name to one pattern-expression.
    Terminal(Term),
    /// Groups one or more child rules beneath the name as a namespace.
    NonTerminal(Vec<Rule>),
}

/// One named production in the grammar tree.
///
/// `scope` lists the names of every enclosing rule, nearest first; its length
/// always equals the rule's nesting depth. Rules are immutable once parsing
/// completes; only the parse itself appends scope entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    pub name: String,
    pub position: Position,
    pub scope: Vec<String>,
    pub kind: RuleKind,
}

impl Rule {
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, RuleKind::Terminal(_))
    }

    /// The children of a name-extended rule, if this is one.
    pub fn children(&self) -> Option<&[Rule]> {
        match &self.kind {
            RuleKind::NonTerminal(children) => Some(children),
            RuleKind::Terminal(_) => None,
        }
    }

    // Recursively appends an ancestor to the scope chain of this rule and
    // every rule below it. Each ancestor calls this once, just after
    // accepting the subtree, so nearer ancestors always land first.
    fn add_parent_scope(&mut self, parent: &str) {
        self.scope.push(parent.to_string());
        if let RuleKind::NonTerminal(children) = &mut self.kind {
            for child in children {
                child.add_parent_scope(parent);
            }
        }
    }
}

// ============================================================================
// PARSING
// ============================================================================

impl Rule {
    /// Parses one rule whose header is expected at nesting depth `depth`.
    ///
    /// `Ok(None)` marks a malformed rule; at least one diagnostic has been
    /// appended and the cursor may have been resynchronized past the rule's
    /// block. The caller owns any further recovery.
    pub fn parse(
        cursor: &mut Cursor,
        errors: &mut Vec<SyntaxError>,
        depth: usize,
    ) -> ParseResult<Rule> {
        let position = cursor.position();

        // The header line must sit exactly at this nesting level. No
        // block-skip here: a header this malformed leaves nothing coherent
        // to skip over.
        let indentation = cursor.indentation();
        if indentation % INDENT_WIDTH != 0 {
            errors.push(SyntaxError::new("invalid indentation level", cursor));
            return Ok(None);
        } else if indentation != depth * INDENT_WIDTH {
            errors.push(SyntaxError::new("unexpected indentation increase", cursor));
            return Ok(None);
        }

        let mut name = String::new();
        while let Some(character) = cursor.peek() {
            if character.is_ascii_lowercase() || character == '_' {
                name.push(character);
                cursor.read();
            } else {
                break;
            }
        }
        if name.is_empty() {
            // The indentation check already proved this line has content.
            return Err(InternalError::new("no rule found", cursor));
        }

        cursor.skip_space(false);

        // Terminal form: a name bound to a pattern-expression.
        if cursor.read_char(':') {
            cursor.skip_space(true);
            let Some(term) = Term::parse(cursor, errors, true)? else {
                // The term parser has already diagnosed its own failure.
                cursor.skip_block();
                return Ok(None);
            };
            return Ok(Some(Rule {
                name,
                position,
                scope: Vec::new(),
                kind: RuleKind::Terminal(term),
            }));
        }

        // Name-extended form: children indented one step deeper.
        if cursor.read_str("...") {
            cursor.skip_space(true);
            let mut errors_found = false;
            if !cursor.end_reached() && !cursor.peek_char('\n') {
                errors.push(SyntaxError::new("trailing characters after '...'", cursor));

                // Not fatal yet; the children are still scanned for their
                // own diagnostics, but this node can no longer succeed.
                errors_found = true;
                cursor.skip_line();
            }

            let mut children = Vec::new();
            loop {
                let delta = cursor.indentation_delta(position.line);
                if delta <= 0 {
                    break;
                } else if delta != INDENT_WIDTH as isize {
                    cursor.skip_whitespace();
                    errors.push(SyntaxError::new("unexpected indentation increase", cursor));
                    cursor.skip_block();
                    return Ok(None);
                }
                cursor.skip_whitespace();

                match Rule::parse(cursor, errors, depth + 1)? {
                    // A bad child doesn't end the scan; skipping its block
                    // lets the remaining siblings report their own problems.
                    None => {
                        cursor.skip_block();
                        errors_found = true;
                    }
                    Some(mut child) => {
                        if !cursor.end_reached() && !cursor.peek_char('\n') {
                            return Err(InternalError::new("incomplete rule parse", cursor));
                        }
                        child.add_parent_scope(&name);
                        children.push(child);
                    }
                }
            }

            if errors_found {
                return Ok(None);
            } else if children.is_empty() {
                cursor.restore(position);
                errors.push(SyntaxError::new(
                    format!("no children found for name-extended rule '{name}'"),
                    cursor,
                ));
                return Ok(None);
            }

            return Ok(Some(Rule {
                name,
                position,
                scope: Vec::new(),
                kind: RuleKind::NonTerminal(children),
            }));
        }

        errors.push(SyntaxError::new("expected ':' or '...'", cursor));
        cursor.skip_block();
        Ok(None)
    }
}

// ============================================================================
// RENDERING
// ============================================================================

impl fmt::Display for Rule {
    /// Debug rendering of a completed subtree. Indentation comes from the
    /// scope chain's length, one step per enclosing rule; a line break
    /// follows each terminal child so sibling groups stay readable.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.scope.len() {
            write!(f, "    ")?;
        }

        match &self.kind {
            RuleKind::Terminal(term) => write!(f, "{}: {}", self.name, term),
            RuleKind::NonTerminal(children) => {
                writeln!(f, "{}...", self.name)?;
                for child in children {
                    write!(f, "{child}")?;
                    if child.is_terminal() {
                        writeln!(f)?;
                    }
                }
                Ok(())
            }
        }
    }
}
