// File: src/parser.rs
//
// Recursive descent + precedence-climbing parser for the mini language.
// Pulls tokens from the lexer and builds a `Program` of top-level
// expression nodes.
//
// All infix operators share one binding-power table. Calls `f(...)`,
// indexing `x[...]` and member access `a.b` are treated as infix operators
// whose right operand has a special shape, so they chain naturally with
// the arithmetic operators. Every operator is left-associative.
//
// Comments are swallowed here; the most recent one is remembered and
// attached to the next assignment as its doc comment.
//
// There is no error recovery: the first unexpected token aborts the parse
// with a syntax error carrying its line:column.

use crate::ast::{Atomic, BinaryOp, Node, Program, UnaryOp};
use crate::errors::{MiniError, SourceLocation};
use crate::lexer::{Lexer, Token, TokenKind};
use std::collections::HashSet;
use std::rc::Rc;

/// Binding power of call, index and member access
const POSTFIX_PRECEDENCE: u8 = 150;

/// Binding power of every infix operator (higher binds tighter)
pub fn precedence(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Dot => 160,
        BinaryOp::Call | BinaryOp::Index => POSTFIX_PRECEDENCE,
        BinaryOp::Power => 140,
        BinaryOp::Multiply | BinaryOp::Divide | BinaryOp::Modulo => 120,
        BinaryOp::Plus | BinaryOp::Minus => 110,
        BinaryOp::Less
        | BinaryOp::LessEqual
        | BinaryOp::Greater
        | BinaryOp::GreaterEqual
        | BinaryOp::NotEqual
        | BinaryOp::Equal => 60,
        BinaryOp::PlusEqual
        | BinaryOp::MinusEqual
        | BinaryOp::TimesEqual
        | BinaryOp::DivEqual
        | BinaryOp::ModEqual
        | BinaryOp::PowEqual => 50,
        BinaryOp::And => 40,
        BinaryOp::Or => 30,
        BinaryOp::Assignment => 20,
    }
}

/// The infix operator a token introduces, if any
fn binary_operator(kind: &TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::Dot => BinaryOp::Dot,
        TokenKind::LParen => BinaryOp::Call,
        TokenKind::LBracket => BinaryOp::Index,
        TokenKind::Power => BinaryOp::Power,
        TokenKind::Multiply => BinaryOp::Multiply,
        TokenKind::Divide => BinaryOp::Divide,
        TokenKind::Modulo => BinaryOp::Modulo,
        TokenKind::Plus => BinaryOp::Plus,
        TokenKind::Minus => BinaryOp::Minus,
        TokenKind::Less => BinaryOp::Less,
        TokenKind::LessEqual => BinaryOp::LessEqual,
        TokenKind::Greater => BinaryOp::Greater,
        TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
        TokenKind::NotEqual => BinaryOp::NotEqual,
        TokenKind::Equal => BinaryOp::Equal,
        TokenKind::PlusEqual => BinaryOp::PlusEqual,
        TokenKind::MinusEqual => BinaryOp::MinusEqual,
        TokenKind::TimesEqual => BinaryOp::TimesEqual,
        TokenKind::DivEqual => BinaryOp::DivEqual,
        TokenKind::ModEqual => BinaryOp::ModEqual,
        TokenKind::PowEqual => BinaryOp::PowEqual,
        TokenKind::And => BinaryOp::And,
        TokenKind::Or => BinaryOp::Or,
        TokenKind::Assignment => BinaryOp::Assignment,
        _ => return None,
    };
    Some(op)
}

/// Normalized form of a literal map key, used to reject duplicates
fn literal_key(atomic: &Atomic) -> Option<String> {
    match atomic {
        Atomic::Identifier(name) | Atomic::Str(name) => Some(format!("s:{}", name)),
        Atomic::Number(n) => Some(format!("n:{}", n)),
        Atomic::Bool(_) => None,
    }
}

/// Parses a whole source string
pub fn parse(source: &str) -> Result<Program, MiniError> {
    Parser::new(Lexer::new(source)).parse()
}

/// Parser state: the token source plus the last comment seen
pub struct Parser {
    lexer: Lexer,
    pending_comment: Option<String>,
}

impl Parser {
    pub fn new(lexer: Lexer) -> Self {
        Parser { lexer, pending_comment: None }
    }

    /// Parse the entire token stream into a program
    pub fn parse(&mut self) -> Result<Program, MiniError> {
        let mut program = Program::default();
        loop {
            self.skip_semicolons()?;
            if self.peek()?.kind == TokenKind::Eof {
                break;
            }
            program.exprs.push(self.parse_expression()?);
        }
        Ok(program)
    }

    fn skip_comments(&mut self) -> Result<(), MiniError> {
        loop {
            let text = match &self.lexer.peek_token()?.kind {
                TokenKind::Comment(text) => text.clone(),
                _ => return Ok(()),
            };
            self.pending_comment = Some(text);
            self.lexer.next_token()?;
        }
    }

    fn skip_semicolons(&mut self) -> Result<(), MiniError> {
        while self.peek()?.kind == TokenKind::Semicolon {
            self.advance()?;
        }
        Ok(())
    }

    /// Peek at the next non-comment token without consuming it
    fn peek(&mut self) -> Result<&Token, MiniError> {
        self.skip_comments()?;
        self.lexer.peek_token()
    }

    /// Consume and return the next non-comment token
    fn advance(&mut self) -> Result<Token, MiniError> {
        self.skip_comments()?;
        self.lexer.next_token()
    }

    fn peek_operator(&mut self) -> Result<Option<BinaryOp>, MiniError> {
        Ok(binary_operator(&self.peek()?.kind))
    }

    fn peek_is(&mut self, kind: &TokenKind) -> Result<bool, MiniError> {
        Ok(&self.peek()?.kind == kind)
    }

    fn peek_keyword(&mut self, keyword: &str) -> Result<bool, MiniError> {
        Ok(matches!(&self.peek()?.kind, TokenKind::Keyword(k) if k == keyword))
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, MiniError> {
        let token = self.advance()?;
        if token.kind == kind {
            Ok(token)
        } else {
            Err(unexpected(&token, kind.name()))
        }
    }

    fn parse_expression(&mut self) -> Result<Node, MiniError> {
        self.skip_comments()?;
        let doc = self.pending_comment.take();
        let lhs = self.parse_primary()?;
        self.parse_binary(lhs, 0, doc)
    }

    /// Precedence climbing over the operator table
    ///
    /// Consumes operators binding at least as tight as `min_precedence`.
    /// After each right operand, any following operator that binds tighter
    /// than the one just consumed is folded into that operand first.
    fn parse_binary(
        &mut self,
        mut lhs: Node,
        min_precedence: u8,
        mut doc: Option<String>,
    ) -> Result<Node, MiniError> {
        while let Some(op) = self.peek_operator()? {
            let op_precedence = precedence(op);
            if op_precedence < min_precedence {
                break;
            }
            self.advance()?;

            let mut rhs = match op {
                BinaryOp::Call => Node::Tuple(self.parse_list_of_expressions(TokenKind::RParen)?),
                BinaryOp::Index => {
                    let index = self.parse_expression()?;
                    self.expect(TokenKind::RBracket)?;
                    index
                }
                BinaryOp::Dot => {
                    let token = self.advance()?;
                    match token.kind {
                        TokenKind::Identifier(name) => Node::identifier(name),
                        _ => return Err(unexpected(&token, "member name")),
                    }
                }
                _ => self.parse_primary()?,
            };

            while let Some(next) = self.peek_operator()? {
                let next_precedence = precedence(next);
                if next_precedence <= op_precedence {
                    break;
                }
                rhs = self.parse_binary(rhs, next_precedence, None)?;
            }

            let doc = if op == BinaryOp::Assignment { doc.take() } else { None };
            lhs = Node::Binary { op, left: Box::new(lhs), right: Box::new(rhs), doc };
        }
        Ok(lhs)
    }

    fn parse_primary(&mut self) -> Result<Node, MiniError> {
        let token = self.advance()?;
        let location = token.location();
        match token.kind {
            TokenKind::Identifier(name) if name == "not" => self.parse_unary(UnaryOp::Not),
            TokenKind::Identifier(name) => {
                if self.peek_is(&TokenKind::RightArrow)? {
                    self.advance()?;
                    let body = self.parse_expression()?;
                    return Ok(Node::Lambda { params: vec![name], body: Rc::new(body) });
                }
                Ok(Node::identifier(name))
            }
            TokenKind::Str(s) => Ok(Node::Atomic(Atomic::Str(s))),
            TokenKind::Number(n) => Ok(Node::Atomic(Atomic::Number(n))),
            TokenKind::Bool(b) => Ok(Node::Atomic(Atomic::Bool(b))),
            TokenKind::Keyword(keyword) if keyword == "if" => self.parse_if(),
            TokenKind::Keyword(keyword) => Err(MiniError::syntax_error(
                format!("Keyword '{}' is not supported", keyword),
                location,
            )),
            TokenKind::LParen => {
                let elements = self.parse_list_of_expressions(TokenKind::RParen)?;
                if self.peek_is(&TokenKind::RightArrow)? {
                    let arrow = self.advance()?;
                    let params = lambda_params(elements, arrow.location())?;
                    let body = self.parse_expression()?;
                    return Ok(Node::Lambda { params, body: Rc::new(body) });
                }
                Ok(Node::Tuple(elements))
            }
            TokenKind::LBracket => {
                Ok(Node::List(self.parse_list_of_expressions(TokenKind::RBracket)?))
            }
            TokenKind::HashBrace => self.parse_map(),
            TokenKind::LBrace => self.parse_block(),
            TokenKind::Minus => self.parse_unary(UnaryOp::Negate),
            TokenKind::Not => self.parse_unary(UnaryOp::Not),
            _ => Err(MiniError::syntax_error(
                format!("Expected primary expression but got {}", token.kind.name()),
                location,
            )),
        }
    }

    /// Prefix operators apply to a primary plus its call/index/member chain
    fn parse_unary(&mut self, op: UnaryOp) -> Result<Node, MiniError> {
        let primary = self.parse_primary()?;
        let operand = self.parse_binary(primary, POSTFIX_PRECEDENCE, None)?;
        Ok(Node::Unary { op, operand: Box::new(operand) })
    }

    /// Comma-separated expressions up to `end` (already past the opener).
    /// A trailing comma is tolerated.
    fn parse_list_of_expressions(&mut self, end: TokenKind) -> Result<Vec<Node>, MiniError> {
        let mut items = Vec::new();
        loop {
            if self.peek_is(&end)? {
                self.advance()?;
                return Ok(items);
            }
            items.push(self.parse_expression()?);
            let token = self.advance()?;
            if token.kind == end {
                return Ok(items);
            }
            if token.kind != TokenKind::Comma {
                return Err(unexpected(&token, &format!("COMMA or {}", end.name())));
            }
        }
    }

    fn parse_map(&mut self) -> Result<Node, MiniError> {
        let mut pairs = Vec::new();
        let mut seen = HashSet::new();
        loop {
            if self.peek_is(&TokenKind::RBrace)? {
                self.advance()?;
                break;
            }
            let key_location = self.peek()?.location();
            let key = self.parse_primary()?;
            if let Node::Atomic(atomic) = &key {
                if let Some(normalized) = literal_key(atomic) {
                    if !seen.insert(normalized) {
                        return Err(MiniError::syntax_error(
                            format!("Duplicate key '{}' in map literal", atomic),
                            key_location,
                        ));
                    }
                }
            }
            self.expect(TokenKind::Colon)?;
            let value = self.parse_expression()?;
            pairs.push((key, value));

            let token = self.advance()?;
            match token.kind {
                TokenKind::Comma => {}
                TokenKind::RBrace => break,
                _ => return Err(unexpected(&token, "COMMA or RBRACE")),
            }
        }
        Ok(Node::Map(pairs))
    }

    fn parse_block(&mut self) -> Result<Node, MiniError> {
        let mut exprs = Vec::new();
        loop {
            self.skip_semicolons()?;
            if self.peek_is(&TokenKind::RBrace)? {
                self.advance()?;
                return Ok(Node::Block(exprs));
            }
            exprs.push(self.parse_expression()?);
        }
    }

    /// `if` has already been consumed
    fn parse_if(&mut self) -> Result<Node, MiniError> {
        let condition = self.parse_expression()?;
        let then_body = self.parse_expression()?;
        let mut else_ifs = Vec::new();
        let mut else_body = None;

        while self.peek_keyword("else")? {
            self.advance()?;
            if self.peek_keyword("if")? {
                self.advance()?;
                let cond = self.parse_expression()?;
                let body = self.parse_expression()?;
                else_ifs.push((cond, body));
            } else {
                else_body = Some(Box::new(self.parse_expression()?));
                break;
            }
        }

        Ok(Node::If {
            condition: Box::new(condition),
            then_body: Box::new(then_body),
            else_ifs,
            else_body,
        })
    }
}

fn unexpected(token: &Token, expected: &str) -> MiniError {
    MiniError::syntax_error(
        format!("Expected {} but got {}", expected, token.kind.name()),
        token.location(),
    )
}

fn lambda_params(elements: Vec<Node>, location: SourceLocation) -> Result<Vec<String>, MiniError> {
    elements
        .into_iter()
        .map(|element| match element {
            Node::Atomic(Atomic::Identifier(name)) => Ok(name),
            other => Err(MiniError::syntax_error(
                format!("Lambda parameter '{}' is not an identifier", other),
                location,
            )),
        })
        .collect()
}
