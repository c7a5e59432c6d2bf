use std::{collections::BTreeMap, mem};

use crate::{
    ast::{AttributePath, BoolOp, CmpOp, Expr, Function, Literal, Subscript, Token},
    error::SyntaxError,
    lexer::Lexer,
};

/// Maximum number of nested groups and `not` prefixes in one filter.
pub const MAX_NESTING_DEPTH: usize = 100;

pub struct Parser {
    lexer: Lexer,
    current_token: Token,
    current_offset: usize,
    depth: usize,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Result<Self, SyntaxError> {
        let current_token = lexer.next_token()?;
        let current_offset = lexer.token_start();
        Ok(Parser {
            lexer,
            current_token,
            current_offset,
            depth: 0,
        })
    }

    fn enter(&mut self) -> Result<(), SyntaxError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(SyntaxError::parse(
                self.current_offset,
                "expression nested too deeply",
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn advance(&mut self) -> Result<(), SyntaxError> {
        self.current_token = self.lexer.next_token()?;
        self.current_offset = self.lexer.token_start();
        Ok(())
    }

    fn expect(&mut self, expected: Token) -> Result<(), SyntaxError> {
        if !self.check(&expected) {
            return Err(self.unexpected(&format!("expected {}", expected.describe())));
        }
        self.advance()
    }

    fn check(&self, token: &Token) -> bool {
        mem::discriminant(&self.current_token) == mem::discriminant(token)
    }

    fn unexpected(&self, context: &str) -> SyntaxError {
        SyntaxError::parse(
            self.current_offset,
            format!("{context}, got {}", self.current_token.describe()),
        )
    }

    fn expect_identifier(&mut self) -> Result<String, SyntaxError> {
        match mem::replace(&mut self.current_token, Token::Eof) {
            Token::Identifier(name) => {
                self.advance()?;
                Ok(name)
            }
            token => {
                self.current_token = token;
                Err(self.unexpected("expected identifier"))
            }
        }
    }

    /// Parse a literal constant
    fn parse_literal(&mut self) -> Result<Literal, SyntaxError> {
        let literal = match &self.current_token {
            Token::String(s) => Literal::String(s.clone()),
            Token::Integer(n) => Literal::Integer(*n),
            Token::Float(n) => Literal::Float(*n),
            Token::Boolean(b) => Literal::Boolean(*b),
            Token::None => Literal::None,
            _ => return Err(self.unexpected("expected literal")),
        };
        self.advance()?;
        Ok(literal)
    }

    /// Parse operands (atoms): literals, lists, attribute paths, calls, '(' expr ')'
    fn parse_operand(&mut self) -> Result<Expr, SyntaxError> {
        match &self.current_token {
            Token::String(_) | Token::Integer(_) | Token::Float(_) | Token::Boolean(_) | Token::None => {
                Ok(Expr::Literal(self.parse_literal()?))
            }
            Token::LBracket => {
                self.advance()?;
                self.parse_list()
            }
            Token::LParen => {
                self.enter()?;
                self.advance()?;
                let expr = self.parse_expression()?;
                self.expect(Token::RParen)?;
                self.leave();
                Ok(expr)
            }
            Token::Identifier(_) => self.parse_path_or_call(),
            Token::LBrace => Err(SyntaxError::parse(
                self.current_offset,
                "dict literals are only allowed inside a metric subscript",
            )),
            _ => Err(self.unexpected("expected expression")),
        }
    }

    fn parse_list(&mut self) -> Result<Expr, SyntaxError> {
        let mut elements = vec![];

        while !self.check(&Token::RBracket) {
            elements.push(self.parse_literal()?);

            if !self.check(&Token::RBracket) {
                self.expect(Token::Comma)?;
            }
        }

        self.expect(Token::RBracket)?;
        Ok(Expr::List(elements))
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expr>, SyntaxError> {
        self.expect(Token::LParen)?;
        let mut args = vec![];

        while !self.check(&Token::RParen) {
            args.push(self.parse_expression()?);

            if !self.check(&Token::RParen) {
                self.expect(Token::Comma)?;
            }
        }

        self.expect(Token::RParen)?;
        Ok(args)
    }

    /// Parse `entity.field[subscript].member`, `attr.method(...)` or `re.fn(...)`
    fn parse_path_or_call(&mut self) -> Result<Expr, SyntaxError> {
        let offset = self.current_offset;
        let entity = self.expect_identifier()?;

        if self.check(&Token::LParen) {
            return Err(SyntaxError::parse(
                offset,
                format!("unsupported function {entity}()"),
            ));
        }
        if !self.check(&Token::Dot) {
            return Err(self.unexpected(&format!("expected '.' after {entity}")));
        }
        self.advance()?;
        let field = self.expect_identifier()?;

        if entity == "re" {
            let function = match field.as_str() {
                "match" => Function::ReMatch,
                "search" => Function::ReSearch,
                _ => {
                    return Err(SyntaxError::unknown_attribute(
                        offset,
                        format!("unsupported re function {field:?}"),
                    ));
                }
            };
            let args = self.parse_arguments()?;
            self.reject_postfix()?;
            return Ok(Expr::Call {
                function,
                args,
                offset,
            });
        }

        let subscript = if self.check(&Token::LBracket) {
            Some(self.parse_subscript()?)
        } else {
            None
        };

        let mut path = AttributePath {
            entity,
            field,
            subscript,
            member: None,
            offset,
        };

        while self.check(&Token::Dot) {
            self.advance()?; // consume '.'
            let name = self.expect_identifier()?;

            if self.check(&Token::LParen) {
                let function = match name.as_str() {
                    "startswith" => Function::StartsWith,
                    "endswith" => Function::EndsWith,
                    _ => {
                        return Err(SyntaxError::parse(
                            offset,
                            format!("unsupported method {}.{name}()", path.dotted()),
                        ));
                    }
                };
                let mut args = vec![Expr::Attribute(path)];
                args.extend(self.parse_arguments()?);
                self.reject_postfix()?;
                return Ok(Expr::Call {
                    function,
                    args,
                    offset,
                });
            }

            if path.member.is_some() {
                return Err(SyntaxError::unknown_attribute(
                    offset,
                    format!("unsupported attribute {}.{name}", path.dotted()),
                ));
            }
            path.member = Some(name);
        }

        self.reject_postfix()?;
        Ok(Expr::Attribute(path))
    }

    /// Anything that could continue a path once it is complete is an error.
    fn reject_postfix(&self) -> Result<(), SyntaxError> {
        match self.current_token {
            Token::LBracket => Err(SyntaxError::parse(
                self.current_offset,
                "only one subscript is allowed, directly after the field",
            )),
            Token::LParen => Err(SyntaxError::parse(
                self.current_offset,
                "unsupported function call",
            )),
            Token::Dot => Err(self.unexpected("unexpected attribute access")),
            _ => Ok(()),
        }
    }

    /// Parse `["name"]` or `["name", {"key": "value", ...}]`
    fn parse_subscript(&mut self) -> Result<Subscript, SyntaxError> {
        let offset = self.current_offset;
        self.advance()?; // Consume '['

        let name = match &self.current_token {
            Token::String(s) => s.clone(),
            Token::LBrace => {
                return Err(SyntaxError::malformed_subscript(
                    offset,
                    "the metric name must be the first subscript element",
                ));
            }
            token => {
                return Err(SyntaxError::malformed_subscript(
                    offset,
                    format!("subscript must start with a string name, got {}", token.describe()),
                ));
            }
        };
        self.advance()?;

        let mut context = None;
        if self.check(&Token::Comma) {
            self.advance()?;
            if self.check(&Token::LBrace) {
                context = Some(self.parse_context()?);
                if self.check(&Token::Comma) {
                    self.advance()?;
                }
            } else if !self.check(&Token::RBracket) {
                return Err(SyntaxError::malformed_subscript(
                    offset,
                    format!(
                        "second subscript element must be a context dict, got {}",
                        self.current_token.describe()
                    ),
                ));
            }
        }

        if !self.check(&Token::RBracket) {
            return Err(SyntaxError::malformed_subscript(
                offset,
                "subscript takes a name and at most one context dict",
            ));
        }
        self.advance()?;

        Ok(Subscript { name, context })
    }

    fn parse_context(&mut self) -> Result<BTreeMap<String, String>, SyntaxError> {
        self.advance()?; // Consume '{'
        let mut pairs = BTreeMap::new();

        while !self.check(&Token::RBrace) {
            let key = match &self.current_token {
                Token::String(s) => s.clone(),
                token => {
                    return Err(SyntaxError::malformed_subscript(
                        self.current_offset,
                        format!("context keys must be strings, got {}", token.describe()),
                    ));
                }
            };
            self.advance()?;
            self.expect(Token::Colon)?;

            let value = match &self.current_token {
                Token::String(s) => s.clone(),
                token => {
                    return Err(SyntaxError::malformed_subscript(
                        self.current_offset,
                        format!("context values must be strings, got {}", token.describe()),
                    ));
                }
            };
            self.advance()?;
            pairs.insert(key, value);

            if !self.check(&Token::RBrace) {
                self.expect(Token::Comma)?;
            }
        }

        self.expect(Token::RBrace)?;
        Ok(pairs)
    }

    fn comparison_operator(&mut self) -> Result<Option<CmpOp>, SyntaxError> {
        let op = match &self.current_token {
            Token::EqEq => CmpOp::Equal,
            Token::NotEq => CmpOp::NotEqual,
            Token::Lt => CmpOp::LessThan,
            Token::Gt => CmpOp::GreaterThan,
            Token::LtEq => CmpOp::LessEqual,
            Token::GtEq => CmpOp::GreaterEqual,
            Token::In => CmpOp::In,
            Token::Is => {
                self.advance()?;
                if !self.check(&Token::Not) {
                    return Ok(Some(CmpOp::Equal));
                }
                CmpOp::NotEqual
            }
            Token::Not => {
                self.advance()?;
                if !self.check(&Token::In) {
                    return Err(self.unexpected("expected 'in' after 'not'"));
                }
                CmpOp::NotIn
            }
            _ => return Ok(None),
        };
        self.advance()?;
        Ok(Some(op))
    }

    fn parse_comparison(&mut self) -> Result<Expr, SyntaxError> {
        let mut offset = self.current_offset;
        let mut left = self.parse_operand()?;
        let mut comparisons = vec![];

        // a < b < c is (a < b) and (b < c)
        while let Some(op) = self.comparison_operator()? {
            let right_offset = self.current_offset;
            let right = self.parse_operand()?;
            let previous = mem::replace(&mut left, right.clone());

            comparisons.push(Expr::Comparison {
                left: Box::new(previous),
                op,
                right: Box::new(right),
                offset,
            });
            offset = right_offset;
        }

        match comparisons.len() {
            0 => Ok(left),
            1 => Ok(comparisons.remove(0)),
            _ => Ok(Expr::and(comparisons)),
        }
    }

    fn parse_not(&mut self) -> Result<Expr, SyntaxError> {
        if self.check(&Token::Not) {
            self.enter()?;
            self.advance()?;
            let operand = self.parse_not()?;
            self.leave();
            return Ok(Expr::not(operand));
        }
        self.parse_comparison()
    }

    fn parse_and(&mut self) -> Result<Expr, SyntaxError> {
        let first = self.parse_not()?;
        let mut children = vec![];

        while self.check(&Token::And) {
            self.advance()?;
            children.push(self.parse_not()?);
        }

        if children.is_empty() {
            return Ok(first);
        }
        children.insert(0, first);
        Ok(Expr::Boolean {
            op: BoolOp::And,
            children,
        })
    }

    fn parse_or(&mut self) -> Result<Expr, SyntaxError> {
        let first = self.parse_and()?;
        let mut children = vec![];

        while self.check(&Token::Or) {
            self.advance()?;
            children.push(self.parse_and()?);
        }

        if children.is_empty() {
            return Ok(first);
        }
        children.insert(0, first);
        Ok(Expr::Boolean {
            op: BoolOp::Or,
            children,
        })
    }

    pub fn parse_expression(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_or()
    }

    /// Parse a complete filter. Empty input parses to `None` (match everything).
    pub fn parse(&mut self) -> Result<Option<Expr>, SyntaxError> {
        if self.check(&Token::Eof) {
            return Ok(None);
        }
        let expr = self.parse_expression()?;
        if !self.check(&Token::Eof) {
            return Err(self.unexpected("expected end of expression"));
        }
        Ok(Some(expr))
    }
}

/// Parse `input` into a syntax tree, attaching `input` to any error.
pub fn parse(input: &str) -> Result<Option<Expr>, SyntaxError> {
    Parser::new(Lexer::new(input))
        .and_then(|mut parser| parser.parse())
        .map_err(|e| e.in_statement(input))
}
