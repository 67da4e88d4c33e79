//! Token source
mod cursor;
mod lexer;
mod token_stream;
mod tokens;

pub use self::{
    lexer::{Lexer, LexerIter},
    token_stream::TokenStream,
    tokens::{Keyword, Token, TokenKind},
};

/// Sequential producer of tokens consumed by the parser.
pub trait TokenSource {
    /// Produce the next token.
    ///
    /// Must keep returning [`TokenKind::Eof`] once the input is exhausted.
    fn next_token(&mut self) -> Token;

    fn is_exhausted(&mut self) -> bool;
}

/// Replays a prepared sequence of tokens.
impl TokenSource for std::vec::IntoIter<Token> {
    fn next_token(&mut self) -> Token {
        match self.next() {
            Some(token) => token,
            None => Token::new(TokenKind::Eof, 0, 0),
        }
    }

    fn is_exhausted(&mut self) -> bool {
        self.len() == 0
    }
}
