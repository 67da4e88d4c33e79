//! Statements.
use super::Parser;
use crate::{
    ast::{Node, NodeKind},
    diagnostic::DiagnosticSink,
    error::ParseResult,
    scan::{Keyword, Token, TokenKind, TokenSource},
    symbols::{Attribute, SymbolKind},
    types::DataType,
};

impl<'a, S, D> Parser<'a, S, D>
where
    S: TokenSource,
    D: DiagnosticSink,
{
    /// One or more statements up to the keyword that closes the block.
    ///
    /// An empty block is accepted with a warning.
    pub(super) fn parse_statements(&mut self) -> ParseResult<Option<Node>> {
        if self.at_block_end() {
            let token = self.peek_token();
            self.warn(&token, "expected at least one statement, will try continuing anyway");
            return Ok(None);
        }

        let mut items = Vec::new();
        loop {
            items.push(self.parse_statement()?);
            if self.at_block_end() || self.stream.at_end() {
                break;
            }
        }

        Ok(Node::list(NodeKind::Statements, items))
    }

    fn at_block_end(&self) -> bool {
        self.is_keyword(Keyword::End) || self.is_keyword(Keyword::Else) || self.is_keyword(Keyword::Until)
    }

    fn parse_statement(&mut self) -> ParseResult<Node> {
        match self.stream.peek_kind() {
            TokenKind::Keyword(Keyword::For) => self.parse_for(),
            TokenKind::Keyword(Keyword::If) => self.parse_if(),
            _ => {
                let statement = self.parse_inline_statement()?;
                self.consume_or_insert(TokenKind::Semicolon);
                Ok(statement)
            }
        }
    }

    fn parse_inline_statement(&mut self) -> ParseResult<Node> {
        match self.stream.peek_kind() {
            TokenKind::Keyword(Keyword::Repeat) => self.parse_repeat(),
            TokenKind::Keyword(Keyword::Input) => self.parse_input(),
            TokenKind::Keyword(Keyword::Print) => self.parse_print(NodeKind::Print),
            TokenKind::Keyword(Keyword::Println) => self.parse_print(NodeKind::Println),
            TokenKind::Keyword(Keyword::Return) => self.parse_return(),
            TokenKind::Ident => {
                let ident = self.stream.next_token();
                if self.stream.is(TokenKind::LeftParen) {
                    self.parse_call(&ident, NodeKind::CallStatement)
                } else {
                    self.parse_assignment(&ident)
                }
            }
            _ => Err(self.stream.unexpected("a statement")),
        }
    }

    /// `for ( [<asgnlist>] ; <bool> ) <stats> end`
    fn parse_for(&mut self) -> ParseResult<Node> {
        let token = self.stream.consume_keyword(Keyword::For)?;
        let scope = self.statement_scope("for", &token);
        self.symbols.create_scope(scope.as_str());

        self.stream.consume(TokenKind::LeftParen)?;
        let assignments = if self.stream.is(TokenKind::Semicolon) {
            None
        } else {
            self.parse_assign_list()?
        };
        self.stream.consume(TokenKind::Semicolon)?;
        let condition = self.parse_condition()?;
        self.stream.consume(TokenKind::RightParen)?;

        let body = self.parse_statements()?;
        self.stream.consume_keyword(Keyword::End)?;
        self.symbols.leave_scope();

        Ok(Node::branch(NodeKind::For, assignments, Some(condition), body).with_value(scope))
    }

    /// `if ( <bool> ) <stats> [else <stats>] end`
    fn parse_if(&mut self) -> ParseResult<Node> {
        let token = self.stream.consume_keyword(Keyword::If)?;
        let scope = self.statement_scope("if", &token);
        self.symbols.create_scope(scope.as_str());

        self.stream.consume(TokenKind::LeftParen)?;
        let condition = self.parse_condition()?;
        self.stream.consume(TokenKind::RightParen)?;

        let body = self.parse_statements()?;
        let node = if self.stream.match_keyword(Keyword::Else) {
            let else_body = self.parse_statements()?;
            Node::branch(NodeKind::IfElse, Some(condition), body, else_body)
        } else {
            Node::branch(NodeKind::If, Some(condition), body, None)
        };

        self.stream.consume_keyword(Keyword::End)?;
        self.symbols.leave_scope();

        Ok(node.with_value(scope))
    }

    /// `repeat ( [<asgnlist>] ) <stats> until <bool>`
    fn parse_repeat(&mut self) -> ParseResult<Node> {
        let token = self.stream.consume_keyword(Keyword::Repeat)?;
        let scope = self.statement_scope("repeat", &token);
        self.symbols.create_scope(scope.as_str());

        self.stream.consume(TokenKind::LeftParen)?;
        let assignments = if self.stream.is(TokenKind::RightParen) {
            None
        } else {
            self.parse_assign_list()?
        };
        self.stream.consume(TokenKind::RightParen)?;

        let body = self.parse_statements()?;
        self.stream.consume_keyword(Keyword::Until)?;
        let condition = self.parse_condition()?;
        self.symbols.leave_scope();

        Ok(Node::branch(NodeKind::Repeat, assignments, body, Some(condition)).with_value(scope))
    }

    /// Boolean expression guarding a control flow statement.
    fn parse_condition(&mut self) -> ParseResult<Node> {
        let token = self.peek_token();
        let condition = self.parse_bool()?;
        let data_type = self.type_of(&condition);
        if !data_type.is_boolean() {
            return Err(self.semantic_error(&token, format!("condition must be bool, found {}", data_type)));
        }
        Ok(condition)
    }

    fn parse_assign_list(&mut self) -> ParseResult<Option<Node>> {
        let mut items = Vec::new();
        loop {
            let ident = self.stream.consume(TokenKind::Ident)?;
            items.push(self.parse_assignment(&ident)?);
            if !self.stream.match_token(TokenKind::Comma) {
                break;
            }
        }
        Ok(Node::list(NodeKind::AssignList, items))
    }

    /// `<var> (= | += | -= | *= | /=) <bool>`
    ///
    /// The target identifier has already been consumed.
    fn parse_assignment(&mut self, ident: &Token) -> ParseResult<Node> {
        let target = self.parse_variable(ident)?;

        let op = self.peek_token();
        let kind = match op.kind {
            TokenKind::Assign => NodeKind::Assign,
            TokenKind::PlusEq => NodeKind::AddAssign,
            TokenKind::MinusEq => NodeKind::SubAssign,
            TokenKind::StarEq => NodeKind::MulAssign,
            TokenKind::SlashEq => NodeKind::DivAssign,
            _ => return Err(self.stream.unexpected("an assignment operator")),
        };
        self.stream.next_token();

        let target_id = match target.symbol {
            Some(id) => id,
            None => return Err(self.semantic_error(ident, format!("undefined identifier '{}'", ident.text()))),
        };
        if self.symbols.symbol(target_id).is_immutable() {
            return Err(self.semantic_error(ident, format!("cannot assign to constant '{}'", ident.text())));
        }

        let value_token = self.peek_token();
        let value = self.parse_bool()?;
        let target_type = self.type_of(&target);
        let value_type = self.type_of(&value);

        if kind != NodeKind::Assign && !(target_type.is_numeric() && value_type.is_numeric()) {
            return Err(self.semantic_error(
                &op,
                format!(
                    "compound assignment needs numeric operands, found {} and {}",
                    target_type, value_type
                ),
            ));
        }
        if !value_type.is_assignable_to(&target_type) {
            return Err(self.semantic_error(
                &value_token,
                format!(
                    "cannot assign {} to {} variable '{}'",
                    value_type,
                    target_type,
                    ident.text()
                ),
            ));
        }

        Ok(Node::binary(kind, target, value).with_symbol(target_id))
    }

    /// `input <vlist>`
    fn parse_input(&mut self) -> ParseResult<Node> {
        self.stream.consume_keyword(Keyword::Input)?;

        let mut items = Vec::new();
        loop {
            let ident = self.stream.consume(TokenKind::Ident)?;
            let variable = self.parse_variable(&ident)?;
            if let Some(id) = variable.symbol {
                if self.symbols.symbol(id).is_immutable() {
                    return Err(self.semantic_error(&ident, format!("cannot input into constant '{}'", ident.text())));
                }
            }
            if !self.type_of(&variable).is_numeric() {
                return Err(self.semantic_error(
                    &ident,
                    format!("input target '{}' must be int or real", ident.text()),
                ));
            }
            items.push(variable);

            if !self.stream.match_token(TokenKind::Comma) {
                break;
            }
        }

        Ok(Node::branch(NodeKind::Input, Node::list(NodeKind::VariableList, items), None, None))
    }

    /// `(print | println) <prlist>`
    fn parse_print(&mut self, kind: NodeKind) -> ParseResult<Node> {
        self.stream.next_token();

        let mut items = Vec::new();
        loop {
            let entry = if self.stream.is(TokenKind::String) {
                let token = self.stream.next_token();
                let key = format!("\"{}\"", token.text());
                let id = self.intern(
                    &key,
                    &token,
                    SymbolKind::StringConstant,
                    DataType::String,
                    Attribute::StringConstant(token.text().into()),
                );
                Node::leaf(NodeKind::String).with_value(token.text()).with_symbol(id)
            } else {
                self.parse_bool()?
            };
            items.push(entry);

            if !self.stream.match_token(TokenKind::Comma) {
                break;
            }
        }

        Ok(Node::branch(kind, Node::list(NodeKind::PrintList, items), None, None))
    }

    /// `return [<bool>]`
    fn parse_return(&mut self) -> ParseResult<Node> {
        let token = self.stream.consume_keyword(Keyword::Return)?;

        let value = if self.stream.is(TokenKind::Semicolon) || self.at_block_end() {
            None
        } else {
            let value_token = self.peek_token();
            Some((value_token, self.parse_bool()?))
        };

        match self.function {
            None => {
                if let Some((value_token, _)) = &value {
                    return Err(self.semantic_error(value_token, "main can't return a value"));
                }
            }
            Some(function) => {
                let symbol = self.symbols.symbol(function);
                let name = symbol.name.clone();
                let return_type = symbol.return_type().cloned().unwrap_or(DataType::Void);

                match &value {
                    Some((value_token, _)) if return_type.is_void() => {
                        return Err(self.semantic_error(
                            value_token,
                            format!("void function '{}' can't return a value", name),
                        ));
                    }
                    Some((value_token, node)) => {
                        let value_type = self.type_of(node);
                        if !value_type.is_assignable_to(&return_type) {
                            return Err(self.semantic_error(
                                value_token,
                                format!(
                                    "cannot return {} from function '{}' returning {}",
                                    value_type, name, return_type
                                ),
                            ));
                        }
                    }
                    None if !return_type.is_void() => {
                        return Err(self.semantic_error(
                            &token,
                            format!("function '{}' must return a value of type {}", name, return_type),
                        ));
                    }
                    None => {}
                }
            }
        }

        Ok(Node::branch(NodeKind::Return, value.map(|(_, node)| node), None, None))
    }
}
