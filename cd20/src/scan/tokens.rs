//! Tokens

use smol_str::SmolStr;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text for identifiers, literals and undefined input.
    pub lexeme: Option<SmolStr>,
    /// Line number, starting at 1.
    pub line: u32,
    /// Column number, starting at 1.
    pub column: u32,
}

impl Token {
    pub fn new(kind: TokenKind, line: u32, column: u32) -> Self {
        Self {
            kind,
            lexeme: None,
            line,
            column,
        }
    }

    pub fn with_lexeme(kind: TokenKind, lexeme: impl Into<SmolStr>, line: u32, column: u32) -> Self {
        Self {
            kind,
            lexeme: Some(lexeme.into()),
            line,
            column,
        }
    }

    /// Lexeme text, or an empty string for tokens that carry none.
    #[inline]
    pub fn text(&self) -> &str {
        self.lexeme.as_deref().unwrap_or("")
    }

    /// Approximate width of the token in the source.
    ///
    /// Used to size the underline of an annotation.
    pub fn width(&self) -> u32 {
        match (&self.kind, &self.lexeme) {
            (TokenKind::Eof, _) => 1,
            (TokenKind::String, Some(lexeme)) => lexeme.chars().count() as u32 + 2,
            (_, Some(lexeme)) => lexeme.chars().count().max(1) as u32,
            (TokenKind::Keyword(keyword), None) => keyword.to_string().len() as u32,
            _ => self.kind.to_string().len().max(1) as u32,
        }
    }

    /// Description of the token suitable for error messages.
    pub fn describe(&self) -> String {
        match &self.lexeme {
            Some(lexeme) => format!("'{lexeme}'"),
            None => self.kind.describe(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[rustfmt::skip]
pub enum TokenKind {
    // Simple
    Comma,          // ,
    LeftBracket,    // [
    RightBracket,   // ]
    LeftParen,      // (
    RightParen,     // )
    Assign,         // =
    Plus,           // +
    Minus,          // -
    Star,           // *
    Slash,          // /
    Percent,        // %
    Caret,          // ^
    Less,           // <
    Greater,        // >
    Colon,          // :
    Bang,           // !
    Semicolon,      // ;
    Dot,            // .

    // Compound
    LessEq,         // <=
    GreaterEq,      // >=
    NotEq,          // !=
    EqEq,           // ==
    PlusEq,         // +=
    MinusEq,        // -=
    StarEq,         // *=
    SlashEq,        // /=

    // ------------------------------------------------------------------------
    // Complex
    Ident,
    /// Reserved identifiers
    Keyword(Keyword),
    /// Integer literal
    Integer,
    /// Real number literal
    Real,
    /// String literal, lexeme excludes the quotes.
    String,

    // ------------------------------------------------------------------------
    // Special
    /// Unsupported input which should be treated as an error
    Undefined,
    /// End-of-file
    Eof,
}

impl TokenKind {
    #[inline]
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        matches!(self, TokenKind::Keyword(k) if *k == keyword)
    }

    /// Human readable description used in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Self::Ident => "an identifier".to_string(),
            Self::Integer => "an integer literal".to_string(),
            Self::Real => "a real literal".to_string(),
            Self::String => "a string literal".to_string(),
            Self::Undefined => "an undefined token".to_string(),
            Self::Eof => "end of file".to_string(),
            other => format!("'{other}'"),
        }
    }
}

impl fmt::Display for TokenKind {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Comma        => write!(f, ","),
            Self::LeftBracket  => write!(f, "["),
            Self::RightBracket => write!(f, "]"),
            Self::LeftParen    => write!(f, "("),
            Self::RightParen   => write!(f, ")"),
            Self::Assign       => write!(f, "="),
            Self::Plus         => write!(f, "+"),
            Self::Minus        => write!(f, "-"),
            Self::Star         => write!(f, "*"),
            Self::Slash        => write!(f, "/"),
            Self::Percent      => write!(f, "%"),
            Self::Caret        => write!(f, "^"),
            Self::Less         => write!(f, "<"),
            Self::Greater      => write!(f, ">"),
            Self::Colon        => write!(f, ":"),
            Self::Bang         => write!(f, "!"),
            Self::Semicolon    => write!(f, ";"),
            Self::Dot          => write!(f, "."),
            Self::LessEq       => write!(f, "<="),
            Self::GreaterEq    => write!(f, ">="),
            Self::NotEq        => write!(f, "!="),
            Self::EqEq         => write!(f, "=="),
            Self::PlusEq       => write!(f, "+="),
            Self::MinusEq      => write!(f, "-="),
            Self::StarEq       => write!(f, "*="),
            Self::SlashEq      => write!(f, "/="),
            Self::Ident        => write!(f, "identifier"),
            Self::Keyword(k)   => write!(f, "{k}"),
            Self::Integer      => write!(f, "integer"),
            Self::Real         => write!(f, "real"),
            Self::String       => write!(f, "string"),
            Self::Undefined    => write!(f, "undefined"),
            Self::Eof          => write!(f, "EOF"),
        }
    }
}

/// Reserved keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[rustfmt::skip]
pub enum Keyword {
    Cd20,       // CD20
    Constants,  // constants
    Types,      // types
    Is,         // is
    Arrays,     // arrays
    Main,       // main
    Begin,      // begin
    End,        // end
    Array,      // array
    Of,         // of
    Func,       // func
    Void,       // void
    Const,      // const
    Int,        // int
    Real,       // real
    Bool,       // bool
    For,        // for
    Repeat,     // repeat
    Until,      // until
    If,         // if
    Else,       // else
    Input,      // input
    Print,      // print
    Println,    // println
    Return,     // return
    Not,        // not
    And,        // and
    Or,         // or
    Xor,        // xor
    True,       // true
    False,      // false
}

impl Keyword {
    /// Keywords are matched case insensitively.
    #[rustfmt::skip]
    pub fn parse(text: impl AsRef<str>) -> Option<Self> {
        match text.as_ref().to_ascii_lowercase().as_str() {
            "cd20"      => Some(Self::Cd20),
            "constants" => Some(Self::Constants),
            "types"     => Some(Self::Types),
            "is"        => Some(Self::Is),
            "arrays"    => Some(Self::Arrays),
            "main"      => Some(Self::Main),
            "begin"     => Some(Self::Begin),
            "end"       => Some(Self::End),
            "array"     => Some(Self::Array),
            "of"        => Some(Self::Of),
            "func"      => Some(Self::Func),
            "void"      => Some(Self::Void),
            "const"     => Some(Self::Const),
            "int"       => Some(Self::Int),
            "real"      => Some(Self::Real),
            "bool"      => Some(Self::Bool),
            "for"       => Some(Self::For),
            "repeat"    => Some(Self::Repeat),
            "until"     => Some(Self::Until),
            "if"        => Some(Self::If),
            "else"      => Some(Self::Else),
            "input"     => Some(Self::Input),
            "print"     => Some(Self::Print),
            "println"   => Some(Self::Println),
            "return"    => Some(Self::Return),
            "not"       => Some(Self::Not),
            "and"       => Some(Self::And),
            "or"        => Some(Self::Or),
            "xor"       => Some(Self::Xor),
            "true"      => Some(Self::True),
            "false"     => Some(Self::False),
            _ => None,
        }
    }
}

impl fmt::Display for Keyword {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Cd20      => write!(f, "CD20"),
            Self::Constants => write!(f, "constants"),
            Self::Types     => write!(f, "types"),
            Self::Is        => write!(f, "is"),
            Self::Arrays    => write!(f, "arrays"),
            Self::Main      => write!(f, "main"),
            Self::Begin     => write!(f, "begin"),
            Self::End       => write!(f, "end"),
            Self::Array     => write!(f, "array"),
            Self::Of        => write!(f, "of"),
            Self::Func      => write!(f, "func"),
            Self::Void      => write!(f, "void"),
            Self::Const     => write!(f, "const"),
            Self::Int       => write!(f, "int"),
            Self::Real      => write!(f, "real"),
            Self::Bool      => write!(f, "bool"),
            Self::For       => write!(f, "for"),
            Self::Repeat    => write!(f, "repeat"),
            Self::Until     => write!(f, "until"),
            Self::If        => write!(f, "if"),
            Self::Else      => write!(f, "else"),
            Self::Input     => write!(f, "input"),
            Self::Print     => write!(f, "print"),
            Self::Println   => write!(f, "println"),
            Self::Return    => write!(f, "return"),
            Self::Not       => write!(f, "not"),
            Self::And       => write!(f, "and"),
            Self::Or        => write!(f, "or"),
            Self::Xor       => write!(f, "xor"),
            Self::True      => write!(f, "true"),
            Self::False     => write!(f, "false"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_keyword_case_insensitive() {
        assert_eq!(Keyword::parse("CD20"), Some(Keyword::Cd20));
        assert_eq!(Keyword::parse("cd20"), Some(Keyword::Cd20));
        assert_eq!(Keyword::parse("PrintLn"), Some(Keyword::Println));
        assert_eq!(Keyword::parse("printer"), None);
    }

    #[test]
    fn test_token_width() {
        let ident = Token::with_lexeme(TokenKind::Ident, "counter", 1, 1);
        assert_eq!(ident.width(), 7);

        let string = Token::with_lexeme(TokenKind::String, "hi", 1, 1);
        assert_eq!(string.width(), 4);

        let keyword = Token::new(TokenKind::Keyword(Keyword::False), 1, 1);
        assert_eq!(keyword.width(), 5);

        let op = Token::new(TokenKind::PlusEq, 1, 1);
        assert_eq!(op.width(), 2);
    }
}
