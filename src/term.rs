//! Pattern-expressions: the matchable right-hand side of a terminal rule.
//!
//! A term is a constant, a character range, a reference to another rule, or a
//! choice/sequence of smaller terms, optionally wrapped in a lookahead
//! predicate (`&`/`!`) or a silencing hint (`$`) and suffixed with instance
//! bounds (`?`, `*`, `+`, `{n}`, `{n:}`, `{:n}`, `{n : m}`).
//!
//! Parsing follows the same convention as the rule parser: malformed input
//! appends to the shared diagnostics list and yields `Ok(None)`; impossible
//! states abort the pass through [`InternalError`].

use std::fmt;

use serde::Serialize;

use crate::cursor::{Cursor, Position};
use crate::diagnostics::{InternalError, ParseResult, SyntaxError};

// ============================================================================
// DATA MODEL
// ============================================================================

/// A lookahead predicate prefix: `&` matches without consuming, `!` inverts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Predicate {
    And,
    Not,
}

/// Instance bounds on a term; `None` stands for "unbounded" on either side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bounds {
    pub minimum: Option<usize>,
    pub maximum: Option<usize>,
}

impl Bounds {
    /// Exactly one instance; the default when no bound syntax is present.
    pub const ONE: Bounds = Bounds {
        minimum: Some(1),
        maximum: Some(1),
    };
    /// `?` — zero or one.
    pub const OPTIONAL: Bounds = Bounds {
        minimum: Some(0),
        maximum: Some(1),
    };
    /// `*` — zero or more.
    pub const ANY: Bounds = Bounds {
        minimum: Some(0),
        maximum: None,
    };
    /// `+` — one or more.
    pub const MANY: Bounds = Bounds {
        minimum: Some(1),
        maximum: None,
    };
}

/// The shape of a term.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TermKind {
    /// A quoted literal, e.g. `'while'`.
    Constant(String),
    /// An inclusive character range, e.g. `['a' - 'z']`.
    Range(char, char),
    /// The name of another rule.
    Reference(String),
    /// Two or more alternatives separated by `|`.
    Choice(Vec<Term>),
    /// Two or more juxtaposed terms.
    Sequence(Vec<Term>),
}

/// One pattern-expression node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Term {
    pub kind: TermKind,
    pub bounds: Bounds,
    pub predicate: Option<Predicate>,
    pub silenced: bool,
    pub position: Position,
}

impl Term {
    fn with_kind(kind: TermKind, position: Position) -> Self {
        Term {
            kind,
            bounds: Bounds::ONE,
            predicate: None,
            silenced: false,
            position,
        }
    }
}

// ============================================================================
// PARSING
// ============================================================================

impl Term {
    /// Parses one pattern-expression. With `root` set the whole remainder of
    /// the logical line is consumed as a sequence; otherwise one prefixed,
    /// bounded atom (or parenthesized group) is read.
    pub fn parse(cursor: &mut Cursor, errors: &mut Vec<SyntaxError>, root: bool) -> ParseResult<Term> {
        if root {
            return Self::parse_sequence(cursor, errors);
        }

        let position = cursor.position();

        let predicate = if cursor.read_char('&') {
            Some(Predicate::And)
        } else if cursor.read_char('!') {
            Some(Predicate::Not)
        } else {
            None
        };

        cursor.skip_space(false);
        let mut silenced = false;
        if cursor.read_char('$') {
            cursor.skip_space(false);
            // `$!` is deliberately not special-cased here; it falls through
            // to the ordinary "expected a term" diagnostic below.
            if cursor.peek_char('&') || cursor.peek_char('|') || predicate.is_some() {
                errors.push(SyntaxError::at(
                    "unneccessarily silenced and predicated term",
                    position,
                ));
                return Ok(None);
            }
            silenced = true;
        }

        cursor.skip_space(false);
        let enclosed = cursor.read_char('(');
        let parsed = if enclosed {
            Self::parse_sequence(cursor, errors)?
        } else {
            match cursor.peek() {
                Some('\'') => Self::parse_constant(cursor, errors)?,
                Some('[') => Self::parse_range(cursor, errors)?,
                Some(character) if character.is_ascii_lowercase() || character == '_' => {
                    Self::parse_reference(cursor)?
                }
                _ => {
                    errors.push(SyntaxError::new("expected a term", cursor));
                    return Ok(None);
                }
            }
        };
        let Some(mut term) = parsed else {
            return Ok(None);
        };

        cursor.skip_space(false);
        if enclosed && !cursor.read_char(')') {
            errors.push(SyntaxError::new("expected ')'", cursor));
            return Ok(None);
        }

        cursor.skip_space(false);
        let Some(bounds) = Self::parse_bounds(cursor, errors)? else {
            return Ok(None);
        };

        term.predicate = predicate;
        term.silenced = silenced;
        term.bounds = bounds;
        Ok(Some(term))
    }

    // A sequence runs until the end of the logical line, end of input, or a
    // closing parenthesis. Single-element sequences collapse.
    fn parse_sequence(cursor: &mut Cursor, errors: &mut Vec<SyntaxError>) -> ParseResult<Term> {
        let position = cursor.position();

        let mut values = Vec::new();
        loop {
            let Some(value) = Self::parse_choice(cursor, errors)? else {
                return Ok(None);
            };
            values.push(value);

            cursor.skip_space(true);
            if cursor.end_reached() || cursor.peek_char('\n') || cursor.peek_char(')') {
                break;
            }
        }

        if values.len() == 1 {
            return Ok(values.pop());
        }
        Ok(Some(Term::with_kind(TermKind::Sequence(values), position)))
    }

    // Alternatives bind tighter than juxtaposition: `a | b c` groups as
    // `(a | b) c`. Single-element choices collapse.
    fn parse_choice(cursor: &mut Cursor, errors: &mut Vec<SyntaxError>) -> ParseResult<Term> {
        let position = cursor.position();

        let mut values = Vec::new();
        loop {
            let Some(value) = Self::parse(cursor, errors, false)? else {
                return Ok(None);
            };
            values.push(value);

            cursor.skip_space(true);
            if !cursor.read_char('|') {
                break;
            }

            // The operator commits us to another alternative.
            cursor.skip_space(true);
            let message = if cursor.end_reached() {
                Some("unexpected end-of-file after choice operator")
            } else if cursor.peek_char('\n') {
                Some("unexpected end-of-line after choice operator")
            } else if cursor.peek_char(')') {
                Some("unexpected ')' after choice operator")
            } else {
                None
            };
            if let Some(message) = message {
                errors.push(SyntaxError::new(message, cursor));
                return Ok(None);
            }
        }

        if values.len() == 1 {
            return Ok(values.pop());
        }
        Ok(Some(Term::with_kind(TermKind::Choice(values), position)))
    }

    fn parse_constant(cursor: &mut Cursor, errors: &mut Vec<SyntaxError>) -> ParseResult<Term> {
        let position = cursor.position();
        if !cursor.read_char('\'') {
            return Err(InternalError::new("no constant found", cursor));
        }

        let mut value = String::new();
        loop {
            if cursor.read_char('\'') {
                break;
            }
            match cursor.peek() {
                None => {
                    errors.push(SyntaxError::new("unexpected end-of-file in constant", cursor));
                    return Ok(None);
                }
                Some('\n') => {
                    errors.push(SyntaxError::new("unexpected end-of-line in constant", cursor));
                    return Ok(None);
                }
                Some('\t') | Some('\r') => {
                    errors.push(SyntaxError::new("invalid character in constant", cursor));
                    return Ok(None);
                }
                Some('\\') => match parse_escape_code(cursor)? {
                    Some(code) => value.push(code),
                    None => {
                        errors.push(SyntaxError::new(
                            "invalid escape character in constant",
                            cursor,
                        ));
                        return Ok(None);
                    }
                },
                Some(character) => {
                    value.push(character);
                    cursor.read();
                }
            }
        }

        if value.is_empty() {
            errors.push(SyntaxError::at("empty constant", position));
            return Ok(None);
        }
        Ok(Some(Term::with_kind(TermKind::Constant(value), position)))
    }

    fn parse_range(cursor: &mut Cursor, errors: &mut Vec<SyntaxError>) -> ParseResult<Term> {
        let position = cursor.position();
        if !cursor.read_char('[') {
            return Err(InternalError::new("no range found", cursor));
        }

        cursor.skip_space(false);
        let Some(start) = Self::parse_range_endpoint(cursor, errors)? else {
            return Ok(None);
        };

        cursor.skip_space(false);
        if !cursor.read_char('-') {
            errors.push(SyntaxError::new("expected '-'", cursor));
            return Ok(None);
        }

        cursor.skip_space(false);
        let Some(end) = Self::parse_range_endpoint(cursor, errors)? else {
            return Ok(None);
        };

        cursor.skip_space(false);
        if !cursor.read_char(']') {
            errors.push(SyntaxError::new("expected ']'", cursor));
            return Ok(None);
        }

        if start >= end {
            errors.push(SyntaxError::at("illogical range values", position));
            return Ok(None);
        }
        Ok(Some(Term::with_kind(TermKind::Range(start, end), position)))
    }

    // One quoted endpoint of a range. Escaped endpoints must land on a
    // printable ASCII character.
    fn parse_range_endpoint(
        cursor: &mut Cursor,
        errors: &mut Vec<SyntaxError>,
    ) -> ParseResult<char> {
        if !cursor.read_char('\'') {
            errors.push(SyntaxError::new("expected '\\''", cursor));
            return Ok(None);
        }

        let value = if cursor.peek_char('\\') {
            match parse_escape_code(cursor)? {
                Some(code) if (' '..='~').contains(&code) => code,
                _ => {
                    errors.push(SyntaxError::new("invalid escape character", cursor));
                    return Ok(None);
                }
            }
        } else {
            match cursor.read() {
                Some(character) => character,
                None => {
                    errors.push(SyntaxError::new("expected '\\''", cursor));
                    return Ok(None);
                }
            }
        };

        if !cursor.read_char('\'') {
            errors.push(SyntaxError::new("expected '\\''", cursor));
            return Ok(None);
        }
        Ok(Some(value))
    }

    fn parse_reference(cursor: &mut Cursor) -> ParseResult<Term> {
        let position = cursor.position();

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
            return Err(InternalError::new("no reference found", cursor));
        }
        Ok(Some(Term::with_kind(TermKind::Reference(name), position)))
    }

    fn parse_bounds(cursor: &mut Cursor, errors: &mut Vec<SyntaxError>) -> ParseResult<Bounds> {
        let position = cursor.position();

        if cursor.read_char('?') {
            return Ok(Some(Bounds::OPTIONAL));
        } else if cursor.read_char('*') {
            return Ok(Some(Bounds::ANY));
        } else if cursor.read_char('+') {
            return Ok(Some(Bounds::MANY));
        } else if !cursor.read_char('{') {
            return Ok(Some(Bounds::ONE));
        }

        cursor.skip_space(false);
        let mut start_value = None;
        if matches!(cursor.peek(), Some(character) if character.is_ascii_digit()) {
            match scan_integer(cursor)? {
                Some(value) => start_value = Some(value),
                None => {
                    errors.push(SyntaxError::new("invalid instance bound start value", cursor));
                    return Ok(None);
                }
            }
        }

        cursor.skip_space(false);
        let colon_present = cursor.read_char(':');

        cursor.skip_space(false);
        let mut end_value = None;
        if matches!(cursor.peek(), Some(character) if character.is_ascii_digit()) {
            match scan_integer(cursor)? {
                Some(value) => end_value = Some(value),
                None => {
                    errors.push(SyntaxError::new("invalid instance bound end value", cursor));
                    return Ok(None);
                }
            }
        }

        cursor.skip_space(false);
        if !cursor.read_char('}') {
            errors.push(SyntaxError::new("expected '}' at end of instance bound", cursor));
            return Ok(None);
        }

        match (start_value, end_value, colon_present) {
            // Exactly n instances.
            (Some(n), None, false) => {
                if n == 0 {
                    errors.push(SyntaxError::at("zero-valued instance bound", position));
                    return Ok(None);
                }
                Ok(Some(Bounds {
                    minimum: Some(n),
                    maximum: Some(n),
                }))
            }
            // n or more.
            (Some(n), None, true) => Ok(Some(Bounds {
                minimum: Some(n),
                maximum: None,
            })),
            // Up to n.
            (None, Some(n), true) => {
                if n == 0 {
                    errors.push(SyntaxError::at("up-to-zero instance bound", position));
                    return Ok(None);
                }
                Ok(Some(Bounds {
                    minimum: None,
                    maximum: Some(n),
                }))
            }
            // Between n and m.
            (Some(n), Some(m), true) => {
                if m < n {
                    errors.push(SyntaxError::at("invalid instance bound", position));
                    return Ok(None);
                }
                if n == 0 && m == 0 {
                    errors.push(SyntaxError::at("zero-instance bound", position));
                    return Ok(None);
                }
                Ok(Some(Bounds {
                    minimum: Some(n),
                    maximum: Some(m),
                }))
            }
            _ => {
                errors.push(SyntaxError::at("malformed instance bounds", position));
                Ok(None)
            }
        }
    }
}

// Consumes `\\` plus one code character; `Ok(None)` for an unknown code.
fn parse_escape_code(cursor: &mut Cursor) -> ParseResult<char> {
    if !cursor.read_char('\\') {
        return Err(InternalError::new("escape scan called with no code", cursor));
    }
    let code = match cursor.read() {
        Some('\'') => '\'',
        Some('"') => '"',
        Some('\\') => '\\',
        Some('b') => '\u{0008}',
        Some('n') => '\n',
        Some('r') => '\r',
        Some('t') => '\t',
        _ => return Ok(None),
    };
    Ok(Some(code))
}

// Scans a run of ASCII digits; `Ok(None)` when the value overflows.
fn scan_integer(cursor: &mut Cursor) -> ParseResult<usize> {
    let mut text = String::new();
    while let Some(character) = cursor.peek() {
        if character.is_ascii_digit() {
            text.push(character);
            cursor.read();
        } else {
            break;
        }
    }

    if text.is_empty() {
        return Err(InternalError::new("integer scan called with no digits", cursor));
    }
    Ok(text.parse::<usize>().ok())
}

// ============================================================================
// RENDERING
// ============================================================================

fn escape(character: char) -> Option<&'static str> {
    match character {
        '\n' => Some("\\n"),
        '\r' => Some("\\r"),
        '\u{0008}' => Some("\\b"),
        '\t' => Some("\\t"),
        '\\' => Some("\\\\"),
        '"' => Some("\\\""),
        '\'' => Some("\\'"),
        _ => None,
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, character: char) -> fmt::Result {
    match escape(character) {
        Some(code) => write!(f, "{code}"),
        None => write!(f, "{character}"),
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.predicate {
            Some(Predicate::And) => write!(f, "&")?,
            Some(Predicate::Not) => write!(f, "!")?,
            None => {
                if self.silenced {
                    write!(f, "$")?;
                }
            }
        }

        match &self.kind {
            TermKind::Constant(value) => {
                write!(f, "'")?;
                for character in value.chars() {
                    write_escaped(f, character)?;
                }
                write!(f, "'")?;
            }

            TermKind::Range(start, end) => {
                write!(f, "['")?;
                write_escaped(f, *start)?;
                write!(f, "' - '")?;
                write_escaped(f, *end)?;
                write!(f, "']")?;
            }

            TermKind::Reference(name) => write!(f, "{name}")?,

            TermKind::Choice(values) | TermKind::Sequence(values) => {
                let is_choice = matches!(self.kind, TermKind::Choice(_));
                let enclosed = self.bounds != Bounds::ONE;
                if enclosed {
                    write!(f, "(")?;
                }

                for (index, value) in values.iter().enumerate() {
                    // Sequences inside a choice need their grouping made
                    // explicit to survive a re-parse.
                    let child_enclosed = is_choice && matches!(value.kind, TermKind::Sequence(_));
                    if child_enclosed {
                        write!(f, "(")?;
                    }
                    write!(f, "{value}")?;
                    if child_enclosed {
                        write!(f, ")")?;
                    }

                    if index + 1 < values.len() {
                        if is_choice {
                            write!(f, " | ")?;
                        } else {
                            write!(f, " ")?;
                        }
                    }
                }

                if enclosed {
                    write!(f, ")")?;
                }
            }
        }

        write!(f, "{}", self.bounds)
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.minimum, self.maximum) {
            (Some(1), Some(1)) => Ok(()),
            (Some(0), Some(1)) => write!(f, "?"),
            (Some(0), None) => write!(f, "*"),
            (Some(1), None) => write!(f, "+"),
            (Some(n), Some(m)) if n == m => write!(f, "{{{n}}}"),
            (None, Some(n)) => write!(f, "{{:{n}}}"),
            (Some(n), None) => write!(f, "{{{n}:}}"),
            (Some(n), Some(m)) => write!(f, "{{{n} : {m}}}"),
            (None, None) => Ok(()),
        }
    }
}
