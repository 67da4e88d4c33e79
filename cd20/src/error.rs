//! Result and errors.
use std::fmt::{self, Display, Formatter};

use crate::{diagnostic::Annotation, scan::Token};

pub type Cd20Result<T> = std::result::Result<T, Cd20Error>;

#[derive(Debug)]
pub enum Cd20Error {
    /// The translation unit failed to compile.
    ///
    /// The annotations explain why. No module is produced.
    Compile(Vec<Annotation>),
    /// A pipeline invariant was broken.
    ///
    /// Never caused by user input.
    Internal(String),
    Fmt(fmt::Error),
}

impl Cd20Error {
    pub fn internal(msg: impl ToString) -> Self {
        Cd20Error::Internal(msg.to_string())
    }
}

impl Display for Cd20Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compile(annotations) => {
                write!(f, "compilation failed")?;
                for annotation in annotations {
                    write!(f, "\n  {}", annotation)?;
                }
                Ok(())
            }
            Self::Internal(msg) => write!(f, "internal compiler error: {}", msg),
            Self::Fmt(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Cd20Error {}

impl From<fmt::Error> for Cd20Error {
    fn from(err: fmt::Error) -> Self {
        Cd20Error::Fmt(err)
    }
}

pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Unrecoverable error raised while parsing.
///
/// Unwinds the parse to the top level, where it is turned into
/// exactly one error [`Annotation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    pub line: u32,
    pub column: u32,
    pub length: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Wrong token where a specific one was mandatory.
    Syntax,
    /// Well formed, but meaningless.
    Semantic,
}

impl ParseError {
    pub fn syntax(token: &Token, message: impl ToString) -> Self {
        Self::at(ParseErrorKind::Syntax, token, message)
    }

    pub fn semantic(token: &Token, message: impl ToString) -> Self {
        Self::at(ParseErrorKind::Semantic, token, message)
    }

    fn at(kind: ParseErrorKind, token: &Token, message: impl ToString) -> Self {
        Self {
            kind,
            message: message.to_string(),
            line: token.line,
            column: token.column,
            length: token.width(),
        }
    }

    #[inline]
    pub fn is_syntax(&self) -> bool {
        self.kind == ParseErrorKind::Syntax
    }

    #[inline]
    pub fn is_semantic(&self) -> bool {
        self.kind == ParseErrorKind::Semantic
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ParseErrorKind::Syntax => "syntax error",
            ParseErrorKind::Semantic => "semantic error",
        };
        write!(f, "{}: {} ({}:{})", kind, self.message, self.line, self.column)
    }
}

impl std::error::Error for ParseError {}
