//! Diagnostics and source listing.
use std::fmt::{self, Display, Formatter};

use crate::{error::ParseError, scan::Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "Error"),
            Severity::Warning => write!(f, "Warning"),
        }
    }
}

/// Message attached to a span of source code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub severity: Severity,
    pub line: u32,
    pub column: u32,
    /// Number of characters to underline.
    pub length: u32,
    pub message: String,
}

impl Annotation {
    pub fn error(token: &Token, message: impl ToString) -> Self {
        Self::from_token(Severity::Error, token, message)
    }

    pub fn warning(token: &Token, message: impl ToString) -> Self {
        Self::from_token(Severity::Warning, token, message)
    }

    fn from_token(severity: Severity, token: &Token, message: impl ToString) -> Self {
        Self {
            severity,
            line: token.line,
            column: token.column,
            length: token.width(),
            message: message.to_string(),
        }
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    #[inline]
    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl Display for Annotation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({}:{})", self.severity, self.message, self.line, self.column)
    }
}

impl From<ParseError> for Annotation {
    fn from(err: ParseError) -> Self {
        Self {
            severity: Severity::Error,
            line: err.line,
            column: err.column,
            length: err.length,
            message: err.message,
        }
    }
}

/// Receiver of diagnostics produced during compilation.
pub trait DiagnosticSink {
    fn annotate(&mut self, annotation: Annotation);
}

impl DiagnosticSink for Vec<Annotation> {
    fn annotate(&mut self, annotation: Annotation) {
        self.push(annotation);
    }
}

/// Numbered source listing with annotations interleaved
/// below the lines they point to.
///
/// ```text
/// 1 | CD20 t main begin x = 1; end CD20 t
///                       ^
///                       Error: undefined identifier 'x' (1:19)
/// ```
pub struct Listing<'a> {
    source: &'a str,
    annotations: &'a [Annotation],
}

impl<'a> Listing<'a> {
    pub fn new(source: &'a str, annotations: &'a [Annotation]) -> Self {
        Self { source, annotations }
    }

    fn write_annotation(f: &mut Formatter<'_>, width: usize, annotation: &Annotation) -> fmt::Result {
        let indent = " ".repeat(width + annotation.column as usize + 2);
        let underline = "^".repeat(annotation.length.max(1) as usize);
        writeln!(f, "{indent}{underline}")?;
        writeln!(f, "{indent}{annotation}")
    }
}

impl<'a> Display for Listing<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let lines: Vec<&str> = self.source.lines().collect();
        let width = lines.len().max(1).to_string().len();

        // Stable sort keeps annotations on the same position in emission order.
        let mut annotations: Vec<&Annotation> = self.annotations.iter().collect();
        annotations.sort_by_key(|a| (a.line, a.column));
        let mut pending = annotations.into_iter().peekable();

        for (index, line) in lines.iter().enumerate() {
            let number = index as u32 + 1;
            writeln!(f, "{number:>width$} | {line}")?;

            while let Some(annotation) = pending.next_if(|a| a.line <= number) {
                Self::write_annotation(f, width, annotation)?;
            }
        }

        // Annotations pointing past the last line, like a missing end of program.
        for annotation in pending {
            Self::write_annotation(f, width, annotation)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::scan::TokenKind;

    #[test]
    fn test_listing_underline() {
        let source = "CD20 t\nmain begin\nend CD20 t\n";
        let token = Token::with_lexeme(TokenKind::Ident, "begin", 2, 6);
        let annotations = vec![Annotation::error(&token, "unexpected 'begin'")];

        let listing = Listing::new(source, &annotations).to_string();
        let expected = "\
1 | CD20 t
2 | main begin
         ^^^^^
         Error: unexpected 'begin' (2:6)
3 | end CD20 t
";
        assert_eq!(listing, expected);
    }

    #[test]
    fn test_listing_trailing_annotation() {
        let source = "CD20 t";
        let token = Token::new(TokenKind::Eof, 2, 1);
        let annotations = vec![Annotation::warning(&token, "missing end")];

        let listing = Listing::new(source, &annotations).to_string();
        assert!(listing.starts_with("1 | CD20 t\n"));
        assert!(listing.ends_with("Warning: missing end (2:1)\n"));
    }

    #[test]
    fn test_vec_sink() {
        let mut sink: Vec<Annotation> = Vec::new();
        let token = Token::new(TokenKind::Semicolon, 1, 4);
        sink.annotate(Annotation::warning(&token, "missing ';'"));
        assert_eq!(sink.len(), 1);
        assert!(sink[0].is_warning());
        assert_eq!(sink[0].length, 1);
    }
}
