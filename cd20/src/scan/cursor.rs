//! Character cursor with line and column tracking.
use itertools::{multipeek, MultiPeek};
use std::str::Chars;

/// Returned when peeking past the end of the source.
pub const EOF_CHAR: char = '\0';

pub struct Cursor<'a> {
    chars: MultiPeek<Chars<'a>>,
    /// Byte offset of the next character to be consumed.
    offset: usize,
    /// Line of the next character, starting at 1.
    line: u32,
    /// Column of the next character, starting at 1.
    column: u32,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            chars: multipeek(source.chars()),
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn line(&self) -> u32 {
        self.line
    }

    #[inline]
    pub fn column(&self) -> u32 {
        self.column
    }

    /// Consume the next character, updating the position.
    pub fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Look at the next character without consuming it.
    #[inline]
    pub fn peek(&mut self) -> char {
        self.peek_nth(0)
    }

    /// Look ahead `n` characters past the next one.
    pub fn peek_nth(&mut self, n: usize) -> char {
        self.chars.reset_peek();
        let mut c = EOF_CHAR;
        for _ in 0..=n {
            c = self.chars.peek().copied().unwrap_or(EOF_CHAR);
        }
        self.chars.reset_peek();
        c
    }

    /// Whether the next characters equal the given pattern.
    pub fn lookahead(&mut self, pattern: &str) -> bool {
        self.chars.reset_peek();
        let is_match = pattern.chars().all(|expected| self.chars.peek() == Some(&expected));
        self.chars.reset_peek();
        is_match
    }

    /// Consume characters while the predicate holds.
    pub fn bump_while(&mut self, predicate: impl Fn(char) -> bool) {
        while !self.at_end() && predicate(self.peek()) {
            self.bump();
        }
    }

    /// Indicates whether all characters have been consumed.
    pub fn at_end(&mut self) -> bool {
        self.chars.reset_peek();
        let at_end = self.chars.peek().is_none();
        self.chars.reset_peek();
        at_end
    }
}
