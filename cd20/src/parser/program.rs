//! Program structure and declarations.
use super::Parser;
use crate::{
    ast::{Node, NodeKind},
    diagnostic::DiagnosticSink,
    error::ParseResult,
    scan::{Keyword, TokenKind, TokenSource},
    symbols::{Attribute, BaseRegister, Symbol, SymbolKind},
    types::DataType,
};

impl<'a, S, D> Parser<'a, S, D>
where
    S: TokenSource,
    D: DiagnosticSink,
{
    /// `CD20 <id> <globals> <funcs> <mainbody>`
    pub(super) fn parse_program(&mut self) -> ParseResult<Node> {
        self.symbols.create_scope("global");

        self.stream.consume_keyword(Keyword::Cd20)?;
        let name = self.stream.consume(TokenKind::Ident)?;

        let globals = self.parse_globals()?;
        let functions = self.parse_functions()?;
        let main = self.parse_main()?;

        self.stream.consume_keyword(Keyword::Cd20)?;
        let end_name = self.stream.consume(TokenKind::Ident)?;
        if end_name.text() != name.text() {
            return Err(self.semantic_error(
                &end_name,
                format!(
                    "program ends with '{}' but is named '{}'",
                    end_name.text(),
                    name.text()
                ),
            ));
        }

        if !self.stream.at_end() {
            let token = self.peek_token();
            self.warn(&token, "unexpected input after end of program, ignoring it");
        }

        self.symbols.leave_scope();

        Ok(Node::branch(NodeKind::Program, Some(globals), functions, Some(main)).with_value(name.text()))
    }

    /// `[constants <initlist>] [types <typelist>] [arrays <arrdecls>]`
    fn parse_globals(&mut self) -> ParseResult<Node> {
        let constants = if self.stream.match_keyword(Keyword::Constants) {
            self.parse_init_list()?
        } else {
            None
        };

        let types = if self.stream.match_keyword(Keyword::Types) {
            self.parse_type_list()?
        } else {
            None
        };

        let arrays = if self.stream.match_keyword(Keyword::Arrays) {
            self.parse_array_decls()?
        } else {
            None
        };

        Ok(Node::branch(NodeKind::Globals, constants, types, arrays))
    }

    fn parse_init_list(&mut self) -> ParseResult<Option<Node>> {
        let mut items = vec![self.parse_init()?];
        while self.stream.match_token(TokenKind::Comma) {
            items.push(self.parse_init()?);
        }
        Ok(Node::list(NodeKind::InitList, items))
    }

    /// `<id> = <expr>`
    ///
    /// Named constants live in the globals region and are initialised
    /// before main runs.
    fn parse_init(&mut self) -> ParseResult<Node> {
        let token = self.stream.consume(TokenKind::Ident)?;
        if self.symbols.contains_in_current_scope(token.text()) {
            return Err(self.semantic_error(&token, format!("duplicate identifier '{}'", token.text())));
        }

        self.stream.consume(TokenKind::Assign)?;
        let value = self.parse_expr()?;
        let data_type = self.type_of(&value);

        let symbol = Symbol::new(SymbolKind::constant(&data_type), token.text(), token.line, token.column)
            .with_attribute(Attribute::DataType(data_type))
            .with_attribute(Attribute::Immutable);
        let id = self.declare(&token, symbol, Some(BaseRegister::Globals))?;

        Ok(Node::unary(NodeKind::Init, value).with_value(token.text()).with_symbol(id))
    }

    fn parse_type_list(&mut self) -> ParseResult<Option<Node>> {
        let mut items = vec![self.parse_type()?];
        while self.stream.is(TokenKind::Ident) {
            items.push(self.parse_type()?);
        }
        Ok(Node::list(NodeKind::TypeList, items))
    }

    /// `<structid> is <fields> end` or `<typeid> is array [ <expr> ] of <structid>`
    fn parse_type(&mut self) -> ParseResult<Node> {
        let name = self.stream.consume(TokenKind::Ident)?;
        self.stream.consume_keyword(Keyword::Is)?;

        if self.stream.match_keyword(Keyword::Array) {
            self.stream.consume(TokenKind::LeftBracket)?;
            let length_token = self.peek_token();
            let length = self.parse_expr()?;
            if self.type_of(&length) != DataType::Int {
                return Err(self.semantic_error(&length_token, "array length must be an integer"));
            }
            self.stream.consume(TokenKind::RightBracket)?;
            self.stream.consume_keyword(Keyword::Of)?;

            let element = self.stream.consume(TokenKind::Ident)?;
            let element_id = self
                .symbols
                .resolve(element.text())
                .filter(|id| {
                    let symbol = self.symbols.symbol(*id);
                    symbol.kind == SymbolKind::TypeName && symbol.data_type().map(DataType::is_struct).unwrap_or(false)
                })
                .ok_or_else(|| self.semantic_error(&element, format!("undefined struct type '{}'", element.text())))?;

            let symbol = Symbol::new(SymbolKind::TypeName, name.text(), name.line, name.column)
                .with_attribute(Attribute::DataType(DataType::Array(name.text().into())));
            let id = self.declare(&name, symbol, None)?;

            let element_type = Node::leaf(NodeKind::TypeId)
                .with_value(element.text())
                .with_symbol(element_id);
            return Ok(Node::branch(NodeKind::ArrayDef, Some(length), None, Some(element_type))
                .with_value(name.text())
                .with_symbol(id));
        }

        let symbol = Symbol::new(SymbolKind::TypeName, name.text(), name.line, name.column)
            .with_attribute(Attribute::DataType(DataType::Struct(name.text().into())));
        let id = self.declare(&name, symbol, None)?;

        // Fields get their own namespace so they can't clash with globals.
        self.symbols.create_scope(format!("__struct__{}", name.text()));
        let mut fields = vec![self.parse_decl(None, false)?];
        while self.stream.match_token(TokenKind::Comma) {
            fields.push(self.parse_decl(None, false)?);
        }
        self.stream.consume_keyword(Keyword::End)?;
        self.symbols.leave_scope();

        Ok(Node::branch(NodeKind::StructDef, Node::list(NodeKind::StructFields, fields), None, None)
            .with_value(name.text())
            .with_symbol(id))
    }

    fn parse_array_decls(&mut self) -> ParseResult<Option<Node>> {
        let mut items = vec![self.parse_array_decl()?];
        while self.stream.match_token(TokenKind::Comma) {
            items.push(self.parse_array_decl()?);
        }
        Ok(Node::list(NodeKind::ArrayDecls, items))
    }

    /// `<id> : <typeid>`
    fn parse_array_decl(&mut self) -> ParseResult<Node> {
        let token = self.stream.consume(TokenKind::Ident)?;
        self.consume_or_insert(TokenKind::Colon);
        let type_token = self.stream.consume(TokenKind::Ident)?;

        let is_array_type = self
            .symbols
            .resolve(type_token.text())
            .map(|id| {
                let symbol = self.symbols.symbol(id);
                symbol.kind == SymbolKind::TypeName && symbol.data_type().map(DataType::is_array).unwrap_or(false)
            })
            .unwrap_or(false);
        if !is_array_type {
            return Err(self.semantic_error(
                &type_token,
                format!("undefined array type '{}'", type_token.text()),
            ));
        }

        let symbol = Symbol::new(SymbolKind::StructOrArrayVariable, token.text(), token.line, token.column)
            .with_attribute(Attribute::DataType(DataType::Array(type_token.text().into())));
        let id = self.declare(&token, symbol, None)?;

        Ok(Node::leaf(NodeKind::ArrayDecl).with_value(token.text()).with_symbol(id))
    }

    fn parse_functions(&mut self) -> ParseResult<Option<Node>> {
        let mut items = Vec::new();
        while self.is_keyword(Keyword::Func) {
            items.push(self.parse_function()?);
        }
        Ok(Node::list(NodeKind::Functions, items))
    }

    /// `func <id> ( <plist> ) : <rtype> <dlist> begin <stats> end`
    fn parse_function(&mut self) -> ParseResult<Node> {
        self.stream.consume_keyword(Keyword::Func)?;
        let name = self.stream.consume(TokenKind::Ident)?;

        // Declared before the body so the function can call itself.
        let symbol = Symbol::new(SymbolKind::Function, name.text(), name.line, name.column);
        let function = self.declare(&name, symbol, None)?;

        self.symbols.create_scope(format!("__function__{}", name.text()));

        self.stream.consume(TokenKind::LeftParen)?;
        let mut params = Vec::new();
        if !self.stream.is(TokenKind::RightParen) {
            params.push(self.parse_decl(Some(BaseRegister::Declarations), true)?);
            while self.stream.match_token(TokenKind::Comma) {
                params.push(self.parse_decl(Some(BaseRegister::Declarations), true)?);
            }
        }
        self.stream.consume(TokenKind::RightParen)?;

        for param in params.iter().filter_map(|node| node.symbol) {
            self.symbols
                .symbol_mut(function)
                .add_attribute(Attribute::ParameterOf(param));
        }

        self.consume_or_insert(TokenKind::Colon);
        let return_type = if self.stream.match_keyword(Keyword::Void) {
            DataType::Void
        } else {
            self.parse_stype()?
        };
        self.symbols
            .symbol_mut(function)
            .add_attribute(Attribute::ReturnType(return_type));

        let locals = self.parse_decl_list(BaseRegister::Declarations)?;

        self.stream.consume_keyword(Keyword::Begin)?;
        let outer = self.function.replace(function);
        let body = self.parse_statements()?;
        self.function = outer;
        self.stream.consume_keyword(Keyword::End)?;

        self.symbols.leave_scope();

        Ok(Node::branch(
            NodeKind::FunctionDef,
            Node::list(NodeKind::ParamList, params),
            locals,
            body,
        )
        .with_value(name.text())
        .with_symbol(function))
    }

    /// `main <slist> begin <stats> end`
    fn parse_main(&mut self) -> ParseResult<Node> {
        self.stream.consume_keyword(Keyword::Main)?;
        self.symbols.create_scope("main");

        // Main's variables live as long as the program.
        let decls = self.parse_decl_list(BaseRegister::Globals)?;

        self.stream.consume_keyword(Keyword::Begin)?;
        let body = self.parse_statements()?;
        self.stream.consume_keyword(Keyword::End)?;

        self.symbols.leave_scope();

        Ok(Node::branch(NodeKind::Main, decls, None, body).with_value("main"))
    }

    /// Comma separated declarations, possibly none.
    fn parse_decl_list(&mut self, region: BaseRegister) -> ParseResult<Option<Node>> {
        let mut items = Vec::new();
        if self.stream.is(TokenKind::Ident) {
            items.push(self.parse_decl(Some(region), false)?);
            while self.stream.match_token(TokenKind::Comma) {
                items.push(self.parse_decl(Some(region), false)?);
            }
        }
        Ok(Node::list(NodeKind::DeclList, items))
    }

    /// `<id> : <stype>`
    fn parse_decl(&mut self, region: Option<BaseRegister>, is_parameter: bool) -> ParseResult<Node> {
        let token = self.stream.consume(TokenKind::Ident)?;
        self.consume_or_insert(TokenKind::Colon);
        let data_type = self.parse_stype()?;

        let mut symbol = Symbol::new(SymbolKind::variable(&data_type), token.text(), token.line, token.column)
            .with_attribute(Attribute::DataType(data_type));
        if is_parameter {
            symbol.add_attribute(Attribute::IsParameter);
        }
        let id = self.declare(&token, symbol, region)?;

        Ok(Node::leaf(NodeKind::Decl).with_value(token.text()).with_symbol(id))
    }

    /// `int | real | bool`
    fn parse_stype(&mut self) -> ParseResult<DataType> {
        let token = self.peek_token();
        let data_type = match token.kind {
            TokenKind::Keyword(Keyword::Int) => DataType::Int,
            TokenKind::Keyword(Keyword::Real) => DataType::Real,
            TokenKind::Keyword(Keyword::Bool) => DataType::Bool,
            TokenKind::Ident => {
                return Err(self.semantic_error(
                    &token,
                    format!("user defined type '{}' can't be used here", token.text()),
                ))
            }
            _ => return Err(self.stream.unexpected("'int', 'real' or 'bool'")),
        };
        self.stream.next_token();
        Ok(data_type)
    }
}
