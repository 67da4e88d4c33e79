//! Recursive descent parser.
//!
//! Builds the syntax tree in a single pass while resolving scopes,
//! binding symbols and checking types as each production completes.
mod expr;
mod program;
mod stmts;

use crate::{
    ast::Node,
    diagnostic::{Annotation, DiagnosticSink},
    error::{ParseError, ParseResult},
    scan::{Keyword, Token, TokenKind, TokenSource, TokenStream},
    symbols::{Attribute, BaseRegister, Symbol, SymbolId, SymbolKind, SymbolTableManager},
    types::DataType,
};

pub struct Parser<'a, S, D> {
    stream: TokenStream<S>,
    symbols: &'a mut SymbolTableManager,
    diagnostics: &'a mut D,
    /// Function whose body is being parsed. `None` in main.
    function: Option<SymbolId>,
    /// Open parentheses around the expression being parsed.
    depth: usize,
}

impl<'a, S, D> Parser<'a, S, D>
where
    S: TokenSource,
    D: DiagnosticSink,
{
    pub fn new(source: S, symbols: &'a mut SymbolTableManager, diagnostics: &'a mut D) -> Self {
        Self {
            stream: TokenStream::new(source),
            symbols,
            diagnostics,
            function: None,
            depth: 0,
        }
    }

    /// Parse a whole program.
    ///
    /// Returns `None` when the program is invalid. The reason is
    /// reported to the diagnostics sink as exactly one error.
    pub fn parse(mut self) -> Option<Node> {
        match self.parse_program() {
            Ok(node) => Some(node),
            Err(err) => {
                log::debug!("{}", err);
                self.diagnostics.annotate(Annotation::from(err));
                None
            }
        }
    }
}

/// Helpers shared by the productions.
impl<'a, S, D> Parser<'a, S, D>
where
    S: TokenSource,
    D: DiagnosticSink,
{
    /// Record a recoverable problem and carry on.
    fn warn(&mut self, token: &Token, message: impl ToString) {
        let annotation = Annotation::warning(token, message);
        log::warn!("{}", annotation);
        self.diagnostics.annotate(annotation);
    }

    #[inline(never)]
    #[cold]
    fn semantic_error(&self, token: &Token, message: impl ToString) -> ParseError {
        ParseError::semantic(token, message)
    }

    /// Consume an optional separator, warning when it's missing.
    fn consume_or_insert(&mut self, token_kind: TokenKind) {
        if !self.stream.match_token(token_kind) {
            let token = self.stream.peek().clone();
            self.warn(
                &token,
                format!("expected {}, will try continuing anyway", token_kind.describe()),
            );
        }
    }

    #[inline]
    fn peek_token(&self) -> Token {
        self.stream.peek().clone()
    }

    #[inline]
    fn is_keyword(&self, keyword: Keyword) -> bool {
        self.stream.is_keyword(keyword)
    }

    /// Type of the value an expression node produces.
    fn type_of(&self, node: &Node) -> DataType {
        node.symbol
            .map(|id| self.symbols.value_type(id))
            .unwrap_or(DataType::Void)
    }

    /// Attach a typed temporary to a node that computes a value.
    fn typed(&mut self, node: Node, data_type: DataType, token: &Token) -> Node {
        let id = self.symbols.create_temporary(data_type, token.line, token.column);
        node.with_symbol(id)
    }

    /// Name for a statement scope, unique within its parent.
    fn statement_scope(&self, construct: &str, token: &Token) -> String {
        format!(
            "{}::{}@{}:{}",
            self.symbols.current_scope().unwrap_or("global"),
            construct,
            token.line,
            token.column
        )
    }

    /// Declare a name in the current scope, rejecting duplicates.
    fn declare(&mut self, token: &Token, symbol: Symbol, region: Option<BaseRegister>) -> ParseResult<SymbolId> {
        if self.symbols.contains_in_current_scope(token.text()) {
            return Err(self.semantic_error(token, format!("duplicate identifier '{}'", token.text())));
        }
        Ok(self.symbols.insert_symbol(symbol, region))
    }

    /// Intern a literal in the constant pool.
    fn intern(&mut self, key: &str, token: &Token, kind: SymbolKind, data_type: DataType, value: Attribute) -> SymbolId {
        if let Some(id) = self.symbols.resolve_constant(key) {
            return id;
        }

        let symbol = Symbol::new(kind, key, token.line, token.column)
            .with_attribute(value)
            .with_attribute(Attribute::DataType(data_type));
        self.symbols.insert_constant(key, symbol)
    }
}
