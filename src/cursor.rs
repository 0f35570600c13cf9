//! Character-level source cursor with line, column, and indentation tracking.
//!
//! The cursor owns every low-level text concern the parsers rely on: single
//! character lookahead and consumption, literal matching, whitespace and
//! comment skipping, per-line indentation measurement, and the block-skip
//! recovery used to resynchronize after a malformed rule.

use serde::Serialize;

/// Width of one indentation step, in columns.
pub const INDENT_WIDTH: usize = 4;

/// How much deeper than its block a line must be indented to count as a
/// continuation of the previous line rather than a new statement.
const CONTINUATION_DEPTH: usize = 2 * INDENT_WIDTH;

/// A snapshot of the cursor's location, cheap to copy and restore.
///
/// Positions are only ever produced by a [`Cursor`]; `line` and `column` are
/// 1-based, `index` counts characters and `offset` counts bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    #[serde(skip)]
    pub index: usize,
    #[serde(skip)]
    pub offset: usize,
    pub line: usize,
    pub column: usize,

    // Indentation of the first line of the current logical block; drives the
    // continuation-line rule in `skip_space`.
    #[serde(skip)]
    block_indentation: usize,
}

/// A forward-only (but restorable) cursor over grammar source text.
pub struct Cursor<'src> {
    source: &'src str,
    chars: Vec<char>,
    line_indentations: Vec<usize>,
    position: Position,
}

impl<'src> Cursor<'src> {
    pub fn new(source: &'src str) -> Self {
        let chars: Vec<char> = source.chars().collect();

        // Precompute each line's indentation width; tabs count as a full step.
        let mut line_indentations = Vec::new();
        let mut index = 0;
        while index < chars.len() {
            let mut indentation = 0;
            while index < chars.len() {
                match chars[index] {
                    ' ' => indentation += 1,
                    '\t' => indentation += INDENT_WIDTH,
                    _ => break,
                }
                index += 1;
            }
            line_indentations.push(indentation);

            while index < chars.len() && chars[index] != '\n' {
                index += 1;
            }
            if index < chars.len() {
                index += 1;
            }
        }

        let block_indentation = line_indentations.first().copied().unwrap_or(0);
        Cursor {
            source,
            chars,
            line_indentations,
            position: Position {
                index: 0,
                offset: 0,
                line: 1,
                column: 1,
                block_indentation,
            },
        }
    }

    // ========================================================================
    // POSITION - Snapshot and restore
    // ========================================================================

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn restore(&mut self, position: Position) {
        self.position = position;
    }

    pub fn end_reached(&self) -> bool {
        self.position.index >= self.chars.len()
    }

    // ========================================================================
    // READING - Lookahead and consumption
    // ========================================================================

    pub fn peek(&self) -> Option<char> {
        self.chars.get(self.position.index).copied()
    }

    pub fn peek_char(&self, expected: char) -> bool {
        self.peek() == Some(expected)
    }

    pub fn peek_str(&self, expected: &str) -> bool {
        let mut index = self.position.index;
        for character in expected.chars() {
            if self.chars.get(index) != Some(&character) {
                return false;
            }
            index += 1;
        }
        true
    }

    pub fn read(&mut self) -> Option<char> {
        let character = self.peek()?;
        self.advance(character);
        Some(character)
    }

    /// Consumes the expected character if it is next, reporting whether it was.
    pub fn read_char(&mut self, expected: char) -> bool {
        if self.peek_char(expected) {
            self.read();
            return true;
        }
        false
    }

    /// Consumes the expected string only when it matches in full.
    pub fn read_str(&mut self, expected: &str) -> bool {
        if self.peek_str(expected) {
            for _ in expected.chars() {
                self.read();
            }
            return true;
        }
        false
    }

    fn advance(&mut self, character: char) {
        self.position.index += 1;
        self.position.offset += character.len_utf8();
        match character {
            '\n' => {
                let next_line = self.position.line + 1;
                let indentation = self.line_indentation(next_line);
                if indentation < self.position.block_indentation + CONTINUATION_DEPTH {
                    self.position.block_indentation = indentation;
                }
                self.position.line = next_line;
                self.position.column = 1;
            }
            '\t' => {
                let column = self.position.column;
                self.position.column = column + INDENT_WIDTH - (column - 1) % INDENT_WIDTH;
            }
            '\r' => {}
            _ => self.position.column += 1,
        }
    }

    // ========================================================================
    // INDENTATION - Line metrics
    // ========================================================================

    /// Indentation of the line the cursor currently sits on.
    pub fn indentation(&self) -> usize {
        self.line_indentation(self.position.line)
    }

    /// Indentation of the given 1-based line, 0 past the end of input.
    pub fn line_indentation(&self, line: usize) -> usize {
        if line == 0 || line > self.line_indentations.len() {
            return 0;
        }
        self.line_indentations[line - 1]
    }

    /// The text of the given 1-based line, without its line break.
    pub fn line_text(&self, line: usize) -> Option<&'src str> {
        self.source.lines().nth(line.checked_sub(1)?)
    }

    /// Indentation difference between the next content line and the given
    /// reference line. Returns 0 when no content follows, so callers treat a
    /// non-positive delta as the end of the current block. Does not move the
    /// cursor.
    pub fn indentation_delta(&mut self, reference_line: usize) -> isize {
        if reference_line > self.line_indentations.len() {
            return 0;
        }

        let snapshot = self.position;
        self.skip_whitespace();
        let next_line = self.position.line;
        let end = self.end_reached();
        self.position = snapshot;

        if end {
            return 0;
        }
        self.line_indentation(next_line) as isize - self.line_indentation(reference_line) as isize
    }

    // ========================================================================
    // SKIPPING - Whitespace, comments, recovery
    // ========================================================================

    /// Skips spaces, tabs, carriage returns, and comments. Line breaks are
    /// crossed only when `overflow` is set and the following line is indented
    /// deeply enough to read as a continuation of the current block.
    pub fn skip_space(&mut self, overflow: bool) {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\r') => {
                    self.read();
                }
                Some('\n') if overflow && self.next_line_continues() => {
                    self.read();
                }
                Some('#') => self.skip_comment(),
                _ => return,
            }
        }
    }

    /// Skips all whitespace, including line breaks, plus comments.
    pub fn skip_whitespace(&mut self) {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\r') | Some('\n') => {
                    self.read();
                }
                Some('#') => self.skip_comment(),
                _ => return,
            }
        }
    }

    /// Skips the remainder of the current line, consuming its line break.
    pub fn skip_line(&mut self) {
        while let Some(character) = self.read() {
            if character == '\n' {
                return;
            }
        }
    }

    fn next_line_continues(&self) -> bool {
        let next_line = self.position.line + 1;
        next_line <= self.line_indentations.len()
            && self.line_indentation(next_line)
                >= self.position.block_indentation + CONTINUATION_DEPTH
    }

    // A comment runs from '#' to the end of the line; the break itself is
    // left for the caller to see.
    fn skip_comment(&mut self) {
        while let Some(character) = self.peek() {
            if character == '\n' {
                return;
            }
            self.read();
        }
    }

    /// Block-skip recovery: abandons the remainder of a malformed block.
    ///
    /// Takes the current line's indentation as the block's reference level and
    /// advances past every following line indented more deeply, stopping at
    /// the line break before the first content line at or below the reference
    /// level (or at end of input).
    pub fn skip_block(&mut self) {
        let reference = self.indentation();
        loop {
            while let Some(character) = self.peek() {
                if character == '\n' {
                    break;
                }
                self.read();
            }
            if self.end_reached() {
                return;
            }

            let snapshot = self.position;
            self.skip_whitespace();
            let landed = self.position.line;
            let done = self.end_reached() || self.line_indentation(landed) <= reference;
            self.position = snapshot;
            if done {
                return;
            }

            // Step onto the over-indented line and discard it too.
            self.read();
        }
    }
}
