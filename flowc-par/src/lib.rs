//! flowc-par - recursive-descent parser for the flowc source language.
//!
//! Consumes the token stream produced by [`flowc_lex::Lexer`] and builds the
//! [`ast`] tree. Binary operators are parsed with Pratt-style precedence
//! climbing (see [`Parser::parse_binary`]). Parse errors recover at the next
//! statement boundary (the next `;` or `}`) so a single run can report more
//! than one syntax error.

pub mod ast;

#[cfg(test)]
mod tests;

use flowc_lex::{Lexer, Token};
use flowc_util::{DiagnosticCode, Handler, Span, Symbol};
use thiserror::Error;

pub use ast::*;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("parse error: {message}")]
    Syntax { message: String, span: Span },
}

/// Parses a full source file. Returns the AST on success; on failure returns
/// the count of syntax errors already reported to `handler`.
pub fn parse(source: &str, handler: &mut Handler) -> Result<Ast, usize> {
    let mut parser = Parser::new(source, handler);
    let ast = parser.parse_program();
    if parser.error_count > 0 {
        Err(parser.error_count)
    } else {
        Ok(ast)
    }
}

struct Parser<'a> {
    tokens: Vec<(Token, Span)>,
    pos: usize,
    handler: &'a mut Handler,
    error_count: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, handler: &'a mut Handler) -> Self {
        let mut tokens = Vec::new();
        {
            // The lexer wants its own `&mut Handler`; collect its
            // diagnostics and forward them to the parser's handler.
            let mut lexer_handler = Handler::new();
            let mut lexer = Lexer::new(source, &mut lexer_handler);
            loop {
                let tok = lexer.next_token();
                let span = lexer.current_span();
                let is_eof = tok == Token::Eof;
                tokens.push((tok, span));
                if is_eof {
                    break;
                }
            }
            for diag in lexer_handler.diagnostics() {
                handler.emit_diagnostic(diag);
            }
        }
        Self {
            tokens,
            pos: 0,
            handler,
            error_count: 0,
        }
    }

    fn peek(&self) -> Token {
        self.tokens[self.pos].0
    }

    fn peek_span(&self) -> Span {
        self.tokens[self.pos].1
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].0;
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, tok: &Token) -> bool {
        self.peek() == *tok
    }

    fn eat(&mut self, tok: &Token) -> bool {
        if self.check(tok) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, tok: Token) -> Result<Span, ()> {
        let span = self.peek_span();
        if self.check(&tok) {
            self.advance();
            Ok(span)
        } else {
            self.error(
                format!("expected {}, found {}", tok.describe(), self.peek().describe()),
                span,
            );
            Err(())
        }
    }

    fn expect_ident(&mut self) -> Result<(Symbol, Span), ()> {
        let span = self.peek_span();
        if let Token::Ident(sym) = self.peek() {
            self.advance();
            Ok((sym, span))
        } else {
            self.error(
                format!("expected identifier, found {}", self.peek().describe()),
                span,
            );
            Err(())
        }
    }

    fn error(&mut self, message: impl Into<String>, span: Span) {
        self.error_count += 1;
        self.handler
            .build_error(span, message)
            .code(DiagnosticCode::E_PARSER_EXPECTED_TOKEN)
            .emit(self.handler);
    }

    /// Skips tokens until past the next `;` or `}`, or EOF. Lets later
    /// statements still be parsed and checked after a syntax error.
    fn recover_to_stmt_boundary(&mut self) {
        loop {
            match self.peek() {
                Token::Semicolon => {
                    self.advance();
                    return;
                }
                Token::RBrace | Token::Eof => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn parse_program(&mut self) -> Ast {
        let mut items = Vec::new();
        while !self.check(&Token::Eof) {
            match self.parse_fn_item() {
                Ok(item) => items.push(item),
                Err(()) => self.recover_to_stmt_boundary(),
            }
        }
        items
    }

    fn parse_fn_item(&mut self) -> Result<FnItem, ()> {
        let start = self.peek_span();
        self.expect(Token::Func)?;
        let (name, _) = self.expect_ident()?;
        self.expect(Token::LParen)?;
        let mut params = Vec::new();
        if !self.check(&Token::RParen) {
            loop {
                let pspan = self.peek_span();
                let (pname, _) = self.expect_ident()?;
                let ty = self.parse_type()?;
                params.push(Param {
                    name: pname,
                    ty,
                    span: pspan,
                });
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(Token::RParen)?;
        let ret_type = if self.eat(&Token::Arrow) {
            Some(self.parse_type()?)
        } else {
            None
        };
        let body = self.parse_block()?;
        Ok(FnItem {
            name,
            params,
            ret_type,
            body,
            span: start,
        })
    }

    /// `int` | `[` IntLit `]` { `[` IntLit `]` } `int`
    fn parse_type(&mut self) -> Result<Type, ()> {
        if self.eat(&Token::Int) {
            return Ok(Type::Int);
        }
        let mut dims = Vec::new();
        while self.check(&Token::LBracket) {
            self.advance();
            let span = self.peek_span();
            let size = match self.peek() {
                Token::IntLit(v) if v >= 0 => v as usize,
                _ => {
                    self.error("expected a non-negative integer array size", span);
                    return Err(());
                }
            };
            self.advance();
            self.expect(Token::RBracket)?;
            dims.push(size);
        }
        if dims.is_empty() {
            let span = self.peek_span();
            self.error(format!("expected a type, found {}", self.peek().describe()), span);
            return Err(());
        }
        self.expect(Token::Int)?;
        Ok(Type::Array(Box::new(Type::Int), dims))
    }

    fn parse_block(&mut self) -> Result<Block, ()> {
        self.expect(Token::LBrace)?;
        let mut stmts = Vec::new();
        while !self.check(&Token::RBrace) && !self.check(&Token::Eof) {
            match self.parse_stmt() {
                Ok(stmt) => stmts.push(stmt),
                Err(()) => self.recover_to_stmt_boundary(),
            }
        }
        self.expect(Token::RBrace)?;
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ()> {
        match self.peek() {
            Token::Let => self.parse_let(),
            Token::If => self.parse_if(),
            Token::For => self.parse_for(),
            Token::Break => {
                let span = self.peek_span();
                self.advance();
                self.expect(Token::Semicolon)?;
                Ok(Stmt::Break { span })
            }
            Token::Continue => {
                let span = self.peek_span();
                self.advance();
                self.expect(Token::Semicolon)?;
                Ok(Stmt::Continue { span })
            }
            Token::Return => {
                let span = self.peek_span();
                self.advance();
                let value = if self.check(&Token::Semicolon) {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.expect(Token::Semicolon)?;
                Ok(Stmt::Return { value, span })
            }
            Token::LBrace => Ok(Stmt::Block(self.parse_block()?)),
            Token::Ident(_) => self.parse_assign_or_expr_stmt(),
            _ => {
                let span = self.peek_span();
                self.error(
                    format!("expected a statement, found {}", self.peek().describe()),
                    span,
                );
                Err(())
            }
        }
    }

    fn parse_let(&mut self) -> Result<Stmt, ()> {
        let span = self.peek_span();
        self.advance();
        let (name, _) = self.expect_ident()?;
        let ty = self.parse_type()?;
        self.expect(Token::Eq)?;
        let init = self.parse_let_init(&ty)?;
        self.expect(Token::Semicolon)?;
        Ok(Stmt::Let { name, ty, init, span })
    }

    fn parse_let_init(&mut self, ty: &Type) -> Result<Expr, ()> {
        if ty.is_array() && self.check(&Token::LBrace) {
            let span = self.peek_span();
            self.advance();
            self.expect(Token::RBrace)?;
            return Ok(Expr::ArrayLit { span });
        }
        self.parse_expr()
    }

    fn parse_if(&mut self) -> Result<Stmt, ()> {
        let span = self.peek_span();
        self.advance();
        self.expect(Token::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(Token::RParen)?;
        let then_block = self.parse_block()?;
        let else_block = if self.eat(&Token::Else) {
            if self.check(&Token::If) {
                Some(vec![self.parse_if()?])
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then_block,
            else_block,
            span,
        })
    }

    /// `for { body }` or `for (init; cond; step) body`.
    fn parse_for(&mut self) -> Result<Stmt, ()> {
        let span = self.peek_span();
        self.advance();
        if self.check(&Token::LBrace) {
            let body = self.parse_block()?;
            return Ok(Stmt::Loop { body, span });
        }
        self.expect(Token::LParen)?;
        let init = self.parse_for_init()?;
        self.expect(Token::Semicolon)?;
        let cond = self.parse_expr()?;
        self.expect(Token::Semicolon)?;
        let step = self.parse_assign_stmt_no_semi()?;
        self.expect(Token::RParen)?;
        let body = self.parse_block()?;
        Ok(Stmt::For {
            init: Box::new(init),
            cond,
            step: Box::new(step),
            body,
            span,
        })
    }

    fn parse_for_init(&mut self) -> Result<Stmt, ()> {
        if self.check(&Token::Let) {
            let span = self.peek_span();
            self.advance();
            let (name, _) = self.expect_ident()?;
            let ty = self.parse_type()?;
            self.expect(Token::Eq)?;
            let init = self.parse_let_init(&ty)?;
            Ok(Stmt::Let { name, ty, init, span })
        } else {
            self.parse_assign_stmt_no_semi()
        }
    }

    fn parse_assign_stmt_no_semi(&mut self) -> Result<Stmt, ()> {
        let span = self.peek_span();
        let place = self.parse_place()?;
        self.expect(Token::Eq)?;
        let value = self.parse_expr()?;
        Ok(Stmt::Assign { place, value, span })
    }

    fn parse_assign_or_expr_stmt(&mut self) -> Result<Stmt, ()> {
        let start = self.pos;
        let span = self.peek_span();
        // Try a place + `=`; fall back to a general expression statement
        // (e.g. a bare call) if no `=` follows.
        if let Ok(place) = self.parse_place() {
            if self.check(&Token::Eq) {
                self.advance();
                let value = self.parse_expr()?;
                self.expect(Token::Semicolon)?;
                return Ok(Stmt::Assign { place, value, span });
            }
        }
        self.pos = start;
        let expr = self.parse_expr()?;
        self.expect(Token::Semicolon)?;
        Ok(Stmt::Expr(expr))
    }

    fn parse_place(&mut self) -> Result<Place, ()> {
        let span = self.peek_span();
        let (name, _) = self.expect_ident()?;
        if self.check(&Token::LBracket) {
            let mut indices = Vec::new();
            while self.eat(&Token::LBracket) {
                indices.push(self.parse_expr()?);
                self.expect(Token::RBracket)?;
            }
            Ok(Place::Index { name, indices, span })
        } else {
            Ok(Place::Var { name, span })
        }
    }

    // ---- Expressions: Pratt-style precedence climbing ----

    fn parse_expr(&mut self) -> Result<Expr, ()> {
        self.parse_binary(0)
    }

    fn binding_power(op: BinOp) -> u8 {
        match op {
            BinOp::Or => 1,
            BinOp::And => 2,
            BinOp::Eq | BinOp::Ne => 3,
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => 4,
            BinOp::Add | BinOp::Sub => 5,
            BinOp::Mul | BinOp::Div | BinOp::Mod => 6,
        }
    }

    fn peek_binop(&self) -> Option<BinOp> {
        Some(match self.peek() {
            Token::Plus => BinOp::Add,
            Token::Minus => BinOp::Sub,
            Token::Star => BinOp::Mul,
            Token::Slash => BinOp::Div,
            Token::Percent => BinOp::Mod,
            Token::EqEq => BinOp::Eq,
            Token::NotEq => BinOp::Ne,
            Token::Lt => BinOp::Lt,
            Token::Le => BinOp::Le,
            Token::Gt => BinOp::Gt,
            Token::Ge => BinOp::Ge,
            Token::AndAnd => BinOp::And,
            Token::OrOr => BinOp::Or,
            _ => return None,
        })
    }

    fn parse_binary(&mut self, min_bp: u8) -> Result<Expr, ()> {
        let mut lhs = self.parse_unary()?;
        while let Some(op) = self.peek_binop() {
            let bp = Self::binding_power(op);
            if bp < min_bp {
                break;
            }
            let span = self.peek_span();
            self.advance();
            let rhs = self.parse_binary(bp + 1)?;
            lhs = Expr::Binary {
                op,
                left: Box::new(lhs),
                right: Box::new(rhs),
                span,
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ()> {
        let span = self.peek_span();
        match self.peek() {
            Token::Minus => {
                self.advance();
                let expr = self.parse_unary()?;
                Ok(Expr::Unary {
                    op: UnOp::Neg,
                    expr: Box::new(expr),
                    span,
                })
            }
            Token::Bang => {
                self.advance();
                let expr = self.parse_unary()?;
                Ok(Expr::Unary {
                    op: UnOp::Not,
                    expr: Box::new(expr),
                    span,
                })
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ()> {
        let span = self.peek_span();
        match self.peek() {
            Token::IntLit(value) => {
                self.advance();
                Ok(Expr::Literal { value, span })
            }
            Token::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Token::Ident(name) => {
                self.advance();
                if self.eat(&Token::LParen) {
                    let mut args = Vec::new();
                    if !self.check(&Token::RParen) {
                        loop {
                            args.push(self.parse_expr()?);
                            if !self.eat(&Token::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(Token::RParen)?;
                    Ok(Expr::Call { callee: name, args, span })
                } else if self.check(&Token::LBracket) {
                    let mut indices = Vec::new();
                    while self.eat(&Token::LBracket) {
                        indices.push(self.parse_expr()?);
                        self.expect(Token::RBracket)?;
                    }
                    Ok(Expr::Index { name, indices, span })
                } else {
                    Ok(Expr::Var { name, span })
                }
            }
            _ => {
                self.error(
                    format!("expected an expression, found {}", self.peek().describe()),
                    span,
                );
                Err(())
            }
        }
    }
}
