//! Lexical analysis
use super::{
    cursor::{Cursor, EOF_CHAR},
    tokens::{Keyword, Token, TokenKind},
    TokenSource,
};

pub struct Lexer<'a> {
    /// Character scanner
    cursor: Cursor<'a>,
    /// Keep reference to the source so tokens can
    /// slice their lexemes from it.
    original: &'a str,
    /// Byte offset where the current token starts.
    start_pos: usize,
    start_line: u32,
    start_column: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(source_code: &'a str) -> Self {
        Self {
            cursor: Cursor::new(source_code),
            original: source_code,
            start_pos: 0,
            start_line: 1,
            start_column: 1,
        }
    }

    /// Original source code that was passed in during construction.
    pub fn source_code(&self) -> &'a str {
        self.original
    }

    /// Scan the source characters and construct the next token.
    ///
    /// Leading whitespace and comments are discarded. Once the
    /// source is exhausted, every call returns an [`TokenKind::Eof`].
    pub fn next_token(&mut self) -> Token {
        use TokenKind as TK;

        self.skip_trivia();
        self.start_token();

        let c = match self.cursor.bump() {
            Some(c) => c,
            None => return self.make_token(TK::Eof),
        };

        match c {
            ',' => self.make_token(TK::Comma),
            '[' => self.make_token(TK::LeftBracket),
            ']' => self.make_token(TK::RightBracket),
            '(' => self.make_token(TK::LeftParen),
            ')' => self.make_token(TK::RightParen),
            '%' => self.make_token(TK::Percent),
            '^' => self.make_token(TK::Caret),
            ':' => self.make_token(TK::Colon),
            ';' => self.make_token(TK::Semicolon),
            '.' => self.make_token(TK::Dot),
            '=' => self.make_compound(TK::Assign, TK::EqEq),
            '+' => self.make_compound(TK::Plus, TK::PlusEq),
            '-' => self.make_compound(TK::Minus, TK::MinusEq),
            '*' => self.make_compound(TK::Star, TK::StarEq),
            '/' => self.make_compound(TK::Slash, TK::SlashEq),
            '<' => self.make_compound(TK::Less, TK::LessEq),
            '>' => self.make_compound(TK::Greater, TK::GreaterEq),
            '!' => self.make_compound(TK::Bang, TK::NotEq),
            '"' => self.consume_string(),
            c if is_digit(c) => self.consume_number(),
            c if is_letter(c) => self.consume_ident(),
            _ => self.consume_undefined(),
        }
    }

    /// Indicates whether the lexer is at the end of the source.
    pub fn at_end(&mut self) -> bool {
        self.cursor.at_end()
    }

    fn fragment(&self) -> &'a str {
        &self.original[self.start_pos..self.cursor.offset()]
    }

    /// Primes the lexer to consume the next token.
    fn start_token(&mut self) {
        self.start_pos = self.cursor.offset();
        self.start_line = self.cursor.line();
        self.start_column = self.cursor.column();
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.start_line, self.start_column)
    }

    /// Build a token that carries its source text.
    fn make_lexeme_token(&self, kind: TokenKind, lexeme: &str) -> Token {
        Token::with_lexeme(kind, lexeme, self.start_line, self.start_column)
    }

    /// Operators that become a compound operator when followed by `=`.
    fn make_compound(&mut self, single: TokenKind, compound: TokenKind) -> Token {
        if self.cursor.peek() == '=' {
            self.cursor.bump();
            self.make_token(compound)
        } else {
            self.make_token(single)
        }
    }
}

/// Trivia
impl<'a> Lexer<'a> {
    fn skip_trivia(&mut self) {
        loop {
            if self.cursor.at_end() {
                return;
            }

            if self.cursor.peek().is_whitespace() {
                self.cursor.bump();
            } else if self.cursor.lookahead("/--") {
                self.erase_comment_line();
            } else if self.cursor.lookahead("/**") {
                self.erase_comment_block();
            } else {
                return;
            }
        }
    }

    /// Erase comment line, including the trailing newline.
    fn erase_comment_line(&mut self) {
        self.cursor.bump_while(|c| c != '\n');
        self.cursor.bump();
    }

    /// Erase a block comment up to and including the closing `**/`.
    ///
    /// An unterminated block runs to the end of the source.
    fn erase_comment_block(&mut self) {
        for _ in 0..3 {
            self.cursor.bump();
        }

        while !self.cursor.at_end() && !self.cursor.lookahead("**/") {
            self.cursor.bump();
        }

        for _ in 0..3 {
            self.cursor.bump();
        }
    }
}

/// Specialised tokens.
impl<'a> Lexer<'a> {
    /// Make an identifier or keyword token.
    fn consume_ident(&mut self) -> Token {
        self.cursor.bump_while(is_letter_or_digit);

        let fragment = self.fragment();
        match Keyword::parse(fragment) {
            Some(keyword) => self.make_token(TokenKind::Keyword(keyword)),
            None => self.make_lexeme_token(TokenKind::Ident, fragment),
        }
    }

    /// Make an integer or real literal token.
    ///
    /// A real requires at least one digit after the decimal point,
    /// otherwise the dot is left for the next token.
    fn consume_number(&mut self) -> Token {
        self.cursor.bump_while(is_digit);

        let kind = if self.cursor.peek() == '.' && is_digit(self.cursor.peek_nth(1)) {
            self.cursor.bump();
            self.cursor.bump_while(is_digit);
            TokenKind::Real
        } else {
            TokenKind::Integer
        };

        self.make_lexeme_token(kind, self.fragment())
    }

    /// Make a string literal token.
    ///
    /// Strings may not span lines. An unterminated string
    /// becomes an undefined token.
    fn consume_string(&mut self) -> Token {
        let start = self.cursor.offset();

        loop {
            match self.cursor.peek() {
                '"' => {
                    let text = &self.original[start..self.cursor.offset()];
                    self.cursor.bump();
                    return self.make_lexeme_token(TokenKind::String, text);
                }
                '\n' => break,
                EOF_CHAR if self.cursor.at_end() => break,
                _ => {
                    self.cursor.bump();
                }
            }
        }

        self.make_lexeme_token(TokenKind::Undefined, self.fragment())
    }

    /// Consume a run of characters that can't start any token.
    fn consume_undefined(&mut self) -> Token {
        self.cursor
            .bump_while(|c| !c.is_whitespace() && !c.is_alphanumeric() && !is_special(c));
        self.make_lexeme_token(TokenKind::Undefined, self.fragment())
    }
}

impl<'a> TokenSource for Lexer<'a> {
    #[inline]
    fn next_token(&mut self) -> Token {
        Lexer::next_token(self)
    }

    #[inline]
    fn is_exhausted(&mut self) -> bool {
        self.at_end()
    }
}

#[allow(clippy::manual_is_ascii_check)] // consistency with other functions
fn is_digit(c: char) -> bool {
    matches!(c, '0'..='9')
}

fn is_letter(c: char) -> bool {
    c.is_alphabetic()
}

fn is_letter_or_digit(c: char) -> bool {
    c.is_alphanumeric()
}

/// Characters that start a token of their own.
fn is_special(c: char) -> bool {
    matches!(
        c,
        ',' | '[' | ']' | '(' | ')' | '=' | '+' | '-' | '*' | '/' | '%' | '^' | '<' | '>' | ':' | '!' | ';' | '.' | '"'
    )
}

impl<'a> IntoIterator for Lexer<'a> {
    type Item = Token;
    type IntoIter = LexerIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        LexerIter {
            lexer: self,
            done: false,
        }
    }
}

/// Convenience iterator that wraps the lexer.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct LexerIter<'a> {
    // Track end so an EOF token is emitted once.
    done: bool,
    lexer: Lexer<'a>,
}

impl<'a> Iterator for LexerIter<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let token = self.lexer.next_token();
        if token.kind == TokenKind::Eof {
            self.done = true;
        }
        Some(token)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use TokenKind as TK;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source).into_iter().map(|token| token.kind).collect()
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("+= + == = != <= < >= > -= *= /= / ^ %"),
            vec![
                TK::PlusEq,
                TK::Plus,
                TK::EqEq,
                TK::Assign,
                TK::NotEq,
                TK::LessEq,
                TK::Less,
                TK::GreaterEq,
                TK::Greater,
                TK::MinusEq,
                TK::StarEq,
                TK::SlashEq,
                TK::Slash,
                TK::Caret,
                TK::Percent,
                TK::Eof,
            ]
        );
    }

    #[test]
    fn test_positions() {
        let tokens: Vec<Token> = Lexer::new("CD20 prog\n  main").into_iter().collect();
        assert_eq!(tokens[0].kind, TK::Keyword(Keyword::Cd20));
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!(tokens[1].kind, TK::Ident);
        assert_eq!(tokens[1].text(), "prog");
        assert_eq!((tokens[1].line, tokens[1].column), (1, 6));
        assert_eq!(tokens[2].kind, TK::Keyword(Keyword::Main));
        assert_eq!((tokens[2].line, tokens[2].column), (2, 3));
    }

    #[test]
    fn test_numbers() {
        let tokens: Vec<Token> = Lexer::new("42 3.14 7.").into_iter().collect();
        assert_eq!(tokens[0].kind, TK::Integer);
        assert_eq!(tokens[0].text(), "42");
        assert_eq!(tokens[1].kind, TK::Real);
        assert_eq!(tokens[1].text(), "3.14");
        assert_eq!(tokens[2].kind, TK::Integer);
        assert_eq!(tokens[3].kind, TK::Dot);
    }

    #[test]
    fn test_strings() {
        let tokens: Vec<Token> = Lexer::new("\"hello world\" \"broken\nx").into_iter().collect();
        assert_eq!(tokens[0].kind, TK::String);
        assert_eq!(tokens[0].text(), "hello world");
        assert_eq!(tokens[1].kind, TK::Undefined);
        assert_eq!(tokens[2].kind, TK::Ident);
        assert_eq!(tokens[2].line, 2);
    }

    #[test]
    fn test_comments() {
        let source = "/-- line comment\nbegin /** block\n comment **/ end";
        assert_eq!(
            kinds(source),
            vec![TK::Keyword(Keyword::Begin), TK::Keyword(Keyword::End), TK::Eof]
        );
    }

    #[test]
    fn test_undefined() {
        let tokens: Vec<Token> = Lexer::new("a @# b").into_iter().collect();
        assert_eq!(tokens[1].kind, TK::Undefined);
        assert_eq!(tokens[1].text(), "@#");
        assert_eq!(tokens[2].text(), "b");
    }

    #[test]
    fn test_repeated_eof() {
        let mut lexer = Lexer::new("x");
        assert_eq!(lexer.next_token().kind, TK::Ident);
        assert_eq!(lexer.next_token().kind, TK::Eof);
        assert_eq!(lexer.next_token().kind, TK::Eof);
        assert!(lexer.is_exhausted());
    }
}
