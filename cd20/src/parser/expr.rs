//! Expressions, from lowest to highest precedence.
use super::Parser;
use crate::{
    ast::{Node, NodeKind},
    constants::MAX_NESTING_DEPTH,
    diagnostic::DiagnosticSink,
    error::{ParseError, ParseResult},
    scan::{Keyword, Token, TokenKind, TokenSource},
    symbols::{Attribute, SymbolId, SymbolKind},
    types::DataType,
};

impl<'a, S, D> Parser<'a, S, D>
where
    S: TokenSource,
    D: DiagnosticSink,
{
    /// `<rel> {(and | or | xor) <rel>}`
    pub(super) fn parse_bool(&mut self) -> ParseResult<Node> {
        let token = self.peek_token();
        let mut left = self.parse_rel()?;

        loop {
            let kind = match self.stream.peek_kind() {
                TokenKind::Keyword(Keyword::And) => NodeKind::And,
                TokenKind::Keyword(Keyword::Or) => NodeKind::Or,
                TokenKind::Keyword(Keyword::Xor) => NodeKind::Xor,
                _ => break,
            };
            let op = self.stream.next_token();
            let right_token = self.peek_token();
            let right = self.parse_rel()?;

            self.expect_boolean(&left, &token)?;
            self.expect_boolean(&right, &right_token)?;
            left = self.typed(Node::binary(kind, left, right), DataType::Bool, &op);
        }

        Ok(left)
    }

    /// `[not] <expr> [<relop> <expr>]`
    fn parse_rel(&mut self) -> ParseResult<Node> {
        let not = if self.is_keyword(Keyword::Not) {
            Some(self.stream.next_token())
        } else {
            None
        };

        let token = self.peek_token();
        let left = self.parse_expr()?;

        let kind = match self.stream.peek_kind() {
            TokenKind::EqEq => Some(NodeKind::Equal),
            TokenKind::NotEq => Some(NodeKind::NotEqual),
            TokenKind::Greater => Some(NodeKind::Greater),
            TokenKind::GreaterEq => Some(NodeKind::GreaterEq),
            TokenKind::Less => Some(NodeKind::Less),
            TokenKind::LessEq => Some(NodeKind::LessEq),
            _ => None,
        };

        let relation = match kind {
            Some(kind) => {
                let op = self.stream.next_token();
                let right = self.parse_expr()?;
                let left_type = self.type_of(&left);
                let right_type = self.type_of(&right);

                let both_numeric = left_type.is_numeric() && right_type.is_numeric();
                let both_boolean = left_type.is_boolean() && right_type.is_boolean();
                let comparable = match kind {
                    NodeKind::Equal | NodeKind::NotEqual => both_numeric || both_boolean,
                    _ => both_numeric,
                };
                if !comparable {
                    return Err(self.semantic_error(
                        &op,
                        format!("cannot compare {} with {}", left_type, right_type),
                    ));
                }

                self.typed(Node::binary(kind, left, right), DataType::Bool, &op)
            }
            None => left,
        };

        match not {
            Some(not) => {
                self.expect_boolean(&relation, &token)?;
                Ok(self.typed(Node::unary(NodeKind::Not, relation), DataType::Bool, &not))
            }
            None => Ok(relation),
        }
    }

    /// `<term> {(+ | -) <term>}`
    pub(super) fn parse_expr(&mut self) -> ParseResult<Node> {
        let token = self.peek_token();
        let mut left = self.parse_term()?;

        loop {
            let kind = match self.stream.peek_kind() {
                TokenKind::Plus => NodeKind::Add,
                TokenKind::Minus => NodeKind::Subtract,
                _ => break,
            };
            let op = self.stream.next_token();
            let right_token = self.peek_token();
            let right = self.parse_term()?;
            left = self.arithmetic(kind, left, right, &token, &right_token, &op)?;
        }

        Ok(left)
    }

    /// `<fact> {(* | / | %) <fact>}`
    fn parse_term(&mut self) -> ParseResult<Node> {
        let token = self.peek_token();
        let mut left = self.parse_fact()?;

        loop {
            let kind = match self.stream.peek_kind() {
                TokenKind::Star => NodeKind::Multiply,
                TokenKind::Slash => NodeKind::Divide,
                TokenKind::Percent => NodeKind::Modulo,
                _ => break,
            };
            let op = self.stream.next_token();
            let right_token = self.peek_token();
            let right = self.parse_fact()?;
            left = self.arithmetic(kind, left, right, &token, &right_token, &op)?;
        }

        Ok(left)
    }

    /// `<exponent> [^ <fact>]`, right associative.
    fn parse_fact(&mut self) -> ParseResult<Node> {
        let token = self.peek_token();
        let base = self.parse_exponent()?;

        if self.stream.is(TokenKind::Caret) {
            let op = self.stream.next_token();
            let right_token = self.peek_token();
            let power = self.parse_fact()?;
            return self.arithmetic(NodeKind::Power, base, power, &token, &right_token, &op);
        }

        Ok(base)
    }

    /// Literals, variables, calls and parenthesised expressions.
    fn parse_exponent(&mut self) -> ParseResult<Node> {
        let negative = self.stream.match_token(TokenKind::Minus);
        let token = self.peek_token();

        match token.kind {
            TokenKind::Integer => {
                self.stream.next_token();
                let key = literal_key(&token, negative);
                let value: i64 = key
                    .parse()
                    .map_err(|_| self.semantic_error(&token, format!("integer literal {} is out of range", key)))?;
                let id = self.intern(
                    &key,
                    &token,
                    SymbolKind::IntConstant,
                    DataType::Int,
                    Attribute::IntegerConstant(value),
                );
                return Ok(Node::leaf(NodeKind::IntLiteral).with_value(key).with_symbol(id));
            }
            TokenKind::Real => {
                self.stream.next_token();
                let key = literal_key(&token, negative);
                let value: f64 = key
                    .parse()
                    .map_err(|_| self.semantic_error(&token, format!("invalid real literal {}", key)))?;
                let id = self.intern(
                    &key,
                    &token,
                    SymbolKind::RealConstant,
                    DataType::Real,
                    Attribute::FloatConstant(value),
                );
                return Ok(Node::leaf(NodeKind::RealLiteral).with_value(key).with_symbol(id));
            }
            _ => {}
        }

        if negative {
            self.warn(
                &token,
                format!("cannot negate {}, will try continuing without the minus sign", token.describe()),
            );
        }

        match token.kind {
            TokenKind::Keyword(Keyword::True) => {
                self.stream.next_token();
                Ok(self.typed(Node::leaf(NodeKind::True), DataType::Bool, &token))
            }
            TokenKind::Keyword(Keyword::False) => {
                self.stream.next_token();
                Ok(self.typed(Node::leaf(NodeKind::False), DataType::Bool, &token))
            }
            TokenKind::LeftParen => {
                if self.depth >= MAX_NESTING_DEPTH {
                    return Err(ParseError::syntax(
                        &token,
                        format!("expression nested more than {} levels deep", MAX_NESTING_DEPTH),
                    ));
                }
                self.stream.next_token();

                self.depth += 1;
                let inner = self.parse_bool();
                self.depth -= 1;

                let inner = inner?;
                self.stream.consume(TokenKind::RightParen)?;
                Ok(inner)
            }
            TokenKind::Ident => {
                self.stream.next_token();
                if self.stream.is(TokenKind::LeftParen) {
                    let call = self.parse_call(&token, NodeKind::Call)?;
                    if self.type_of(&call).is_void() {
                        return Err(self.semantic_error(
                            &token,
                            format!("void function '{}' has no value", token.text()),
                        ));
                    }
                    Ok(call)
                } else {
                    self.parse_variable(&token)
                }
            }
            _ => Err(self.stream.unexpected("an expression")),
        }
    }

    /// `<id> ( [<elist>] )`
    ///
    /// The function name has already been consumed.
    pub(super) fn parse_call(&mut self, ident: &Token, kind: NodeKind) -> ParseResult<Node> {
        let function = self
            .symbols
            .resolve(ident.text())
            .ok_or_else(|| self.semantic_error(ident, format!("undefined function '{}'", ident.text())))?;
        if !self.symbols.symbol(function).kind.is_function() {
            return Err(self.semantic_error(ident, format!("'{}' is not a function", ident.text())));
        }

        self.stream.consume(TokenKind::LeftParen)?;
        let mut args = Vec::new();
        if !self.stream.is(TokenKind::RightParen) {
            loop {
                let token = self.peek_token();
                args.push((token, self.parse_bool()?));
                if !self.stream.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.stream.consume(TokenKind::RightParen)?;

        let params: Vec<SymbolId> = self.symbols.symbol(function).parameters().collect();
        if params.len() != args.len() {
            return Err(self.semantic_error(
                ident,
                format!(
                    "function '{}' takes {} argument(s) but {} were given",
                    ident.text(),
                    params.len(),
                    args.len()
                ),
            ));
        }

        for ((token, arg), param) in args.iter().zip(params) {
            let param = self.symbols.symbol(param);
            let param_type = param.data_type().cloned().unwrap_or(DataType::Void);
            let arg_type = self.type_of(arg);
            if !arg_type.is_assignable_to(&param_type) {
                return Err(self.semantic_error(
                    token,
                    format!(
                        "cannot pass {} as parameter '{}' of type {}",
                        arg_type, param.name, param_type
                    ),
                ));
            }
        }

        let args = args.into_iter().map(|(_, node)| node).collect();
        Ok(Node::branch(kind, Node::list(NodeKind::ExpressionList, args), None, None)
            .with_value(ident.text())
            .with_symbol(function))
    }

    /// Scalar variable or named constant.
    ///
    /// The identifier has already been consumed.
    pub(super) fn parse_variable(&mut self, ident: &Token) -> ParseResult<Node> {
        if self.stream.is(TokenKind::LeftBracket) {
            return Err(self.semantic_error(ident, "array element access is not supported"));
        }

        let id = self
            .symbols
            .resolve(ident.text())
            .ok_or_else(|| self.semantic_error(ident, format!("undefined identifier '{}'", ident.text())))?;

        match self.symbols.symbol(id).kind {
            SymbolKind::Function => Err(self.semantic_error(
                ident,
                format!("function '{}' can't be used as a variable", ident.text()),
            )),
            SymbolKind::TypeName => Err(self.semantic_error(
                ident,
                format!("type '{}' can't be used as a variable", ident.text()),
            )),
            SymbolKind::StructOrArrayVariable => Err(self.semantic_error(
                ident,
                format!("array '{}' can't be used as a value", ident.text()),
            )),
            _ => Ok(Node::leaf(NodeKind::Variable).with_value(ident.text()).with_symbol(id)),
        }
    }

    /// Type check both operands of an arithmetic operator and build the node.
    ///
    /// Mixing int and real yields real.
    fn arithmetic(
        &mut self,
        kind: NodeKind,
        left: Node,
        right: Node,
        left_token: &Token,
        right_token: &Token,
        op: &Token,
    ) -> ParseResult<Node> {
        let left_type = self.type_of(&left);
        let right_type = self.type_of(&right);
        if !left_type.is_numeric() {
            return Err(self.semantic_error(left_token, format!("expected a numeric operand, found {}", left_type)));
        }
        if !right_type.is_numeric() {
            return Err(self.semantic_error(
                right_token,
                format!("expected a numeric operand, found {}", right_type),
            ));
        }

        let data_type = if left_type == DataType::Real || right_type == DataType::Real {
            DataType::Real
        } else {
            DataType::Int
        };
        Ok(self.typed(Node::binary(kind, left, right), data_type, op))
    }

    fn expect_boolean(&self, node: &Node, token: &Token) -> ParseResult<()> {
        let data_type = self.type_of(node);
        if !data_type.is_boolean() {
            return Err(self.semantic_error(token, format!("expected a bool operand, found {}", data_type)));
        }
        Ok(())
    }
}

/// Constant pool key of a numeric literal.
fn literal_key(token: &Token, negative: bool) -> String {
    if negative {
        format!("-{}", token.text())
    } else {
        token.text().to_string()
    }
}
