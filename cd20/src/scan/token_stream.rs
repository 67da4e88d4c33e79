//! Token stream with one token of look ahead.
use super::{Keyword, Token, TokenKind, TokenSource};
use crate::error::{ParseError, ParseResult};

/// Buffered stream of tokens.
///
/// Holds exactly one current token. Consuming it pulls
/// the next one from the source.
pub struct TokenStream<S> {
    source: S,
    current: Token,
}

impl<S: TokenSource> TokenStream<S> {
    pub fn new(mut source: S) -> Self {
        let current = source.next_token();
        Self { source, current }
    }

    /// The current token, not yet consumed.
    #[inline]
    pub fn peek(&self) -> &Token {
        &self.current
    }

    #[inline]
    pub fn peek_kind(&self) -> TokenKind {
        self.current.kind
    }

    /// Consumes the current token regardless of type.
    pub fn next_token(&mut self) -> Token {
        let next = self.source.next_token();
        std::mem::replace(&mut self.current, next)
    }

    #[inline]
    pub fn is(&self, token_kind: TokenKind) -> bool {
        self.current.kind == token_kind
    }

    #[inline]
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.current.kind.is_keyword(keyword)
    }

    #[inline]
    pub fn at_end(&self) -> bool {
        self.current.kind == TokenKind::Eof
    }

    /// Consumes the current token if it matches the given token kind.
    ///
    /// Returns true when matched. Does not consume the token
    /// if the types do not match.
    pub fn match_token(&mut self, token_kind: TokenKind) -> bool {
        let is_match = self.is(token_kind);
        if is_match {
            let _ = self.next_token(); // discard
        }
        is_match
    }

    pub fn match_keyword(&mut self, keyword: Keyword) -> bool {
        self.match_token(TokenKind::Keyword(keyword))
    }

    /// Return the current token and advance the stream.
    ///
    /// The consumed token must match the given token type, otherwise
    /// a syntax error is returned and the stream is not advanced.
    pub fn consume(&mut self, token_kind: TokenKind) -> ParseResult<Token> {
        if self.is(token_kind) {
            Ok(self.next_token())
        } else {
            Err(self.unexpected(&token_kind.describe()))
        }
    }

    #[inline]
    pub fn consume_keyword(&mut self, keyword: Keyword) -> ParseResult<Token> {
        self.consume(TokenKind::Keyword(keyword))
    }

    /// Syntax error at the current token.
    pub fn unexpected(&self, expected: &str) -> ParseError {
        let token = &self.current;
        match token.kind {
            TokenKind::Undefined => ParseError::syntax(token, format!("unknown token {}", token.describe())),
            _ => ParseError::syntax(token, format!("expected {}, found {}", expected, token.describe())),
        }
    }

    pub fn is_exhausted(&mut self) -> bool {
        self.at_end() && self.source.is_exhausted()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::scan::Lexer;

    #[test]
    fn test_consume() {
        let mut stream = TokenStream::new(Lexer::new("CD20 prog main"));
        assert!(stream.consume_keyword(Keyword::Cd20).is_ok());
        let ident = stream.consume(TokenKind::Ident).unwrap();
        assert_eq!(ident.text(), "prog");

        let err = stream.consume(TokenKind::Semicolon).unwrap_err();
        assert!(err.is_syntax());
        assert_eq!(err.message, "expected ';', found 'main'");
        assert!(stream.is_keyword(Keyword::Main));
    }

    #[test]
    fn test_match_token() {
        let tokens = vec![
            Token::new(TokenKind::Comma, 1, 1),
            Token::with_lexeme(TokenKind::Ident, "x", 1, 2),
        ];
        let mut stream = TokenStream::new(tokens.into_iter());
        assert!(!stream.match_token(TokenKind::Semicolon));
        assert!(stream.match_token(TokenKind::Comma));
        assert!(stream.is(TokenKind::Ident));
        stream.next_token();
        assert!(stream.at_end());
        assert!(stream.is_exhausted());
    }

    #[test]
    fn test_unknown_token() {
        let stream = TokenStream::new(Lexer::new("@"));
        let err = stream.unexpected("an identifier");
        assert_eq!(err.message, "unknown token '@'");
    }
}
