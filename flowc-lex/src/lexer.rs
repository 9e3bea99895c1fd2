//! Hand-written lexer for the flowc source language.
//!
//! The lexer is a direct-coded scanner driven by a [`Cursor`]: whitespace
//! and `//` line comments are skipped between tokens, identifiers are
//! classified against the keyword table, and multi-character operators are
//! recognized with one character of lookahead.

use flowc_util::{DiagnosticBuilder, Handler, Span};

use crate::cursor::Cursor;
use crate::token::{keyword_from_ident, Token};

/// Scans a source string into a stream of [`Token`]s.
pub struct Lexer<'a> {
    cursor: Cursor<'a>,
    handler: &'a mut Handler,
    token_start: usize,
    token_start_line: u32,
    token_start_column: u32,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer over `source`, reporting lexical errors to `handler`.
    pub fn new(source: &'a str, handler: &'a mut Handler) -> Self {
        Self {
            cursor: Cursor::new(source),
            handler,
            token_start: 0,
            token_start_line: 1,
            token_start_column: 1,
        }
    }

    /// Returns the span of the token most recently returned by `next_token`.
    pub fn current_span(&self) -> Span {
        Span::new(
            self.token_start,
            self.cursor.position(),
            self.token_start_line,
            self.token_start_column,
        )
    }

    /// Scans and returns the next token, or `Token::Eof` at end of input.
    pub fn next_token(&mut self) -> Token {
        self.skip_trivia();

        self.token_start = self.cursor.position();
        self.token_start_line = self.cursor.line();
        self.token_start_column = self.cursor.column();

        if self.cursor.is_at_end() {
            return Token::Eof;
        }

        let c = self.cursor.current_char();
        match c {
            '(' => self.single(Token::LParen),
            ')' => self.single(Token::RParen),
            '{' => self.single(Token::LBrace),
            '}' => self.single(Token::RBrace),
            '[' => self.single(Token::LBracket),
            ']' => self.single(Token::RBracket),
            ',' => self.single(Token::Comma),
            ';' => self.single(Token::Semicolon),
            '+' => self.single(Token::Plus),
            '*' => self.single(Token::Star),
            '/' => self.single(Token::Slash),
            '%' => self.single(Token::Percent),
            '-' => {
                self.cursor.advance();
                if self.cursor.match_char('>') {
                    Token::Arrow
                } else {
                    Token::Minus
                }
            }
            '=' => {
                self.cursor.advance();
                if self.cursor.match_char('=') {
                    Token::EqEq
                } else {
                    Token::Eq
                }
            }
            '!' => {
                self.cursor.advance();
                if self.cursor.match_char('=') {
                    Token::NotEq
                } else {
                    Token::Bang
                }
            }
            '<' => {
                self.cursor.advance();
                if self.cursor.match_char('=') {
                    Token::Le
                } else {
                    Token::Lt
                }
            }
            '>' => {
                self.cursor.advance();
                if self.cursor.match_char('=') {
                    Token::Ge
                } else {
                    Token::Gt
                }
            }
            '&' => {
                self.cursor.advance();
                if self.cursor.match_char('&') {
                    Token::AndAnd
                } else {
                    self.report_unexpected('&');
                    self.next_token()
                }
            }
            '|' => {
                self.cursor.advance();
                if self.cursor.match_char('|') {
                    Token::OrOr
                } else {
                    self.report_unexpected('|');
                    self.next_token()
                }
            }
            c if c.is_ascii_digit() => self.lex_number(),
            c if c.is_ascii_alphabetic() || c == '_' => self.lex_ident_or_keyword(),
            other => {
                self.report_unexpected(other);
                self.cursor.advance();
                self.next_token()
            }
        }
    }

    fn single(&mut self, tok: Token) -> Token {
        self.cursor.advance();
        tok
    }

    fn lex_number(&mut self) -> Token {
        let start = self.cursor.position();
        while self.cursor.current_char().is_ascii_digit() {
            self.cursor.advance();
        }
        let text = self.cursor.slice_from(start);
        match text.parse::<i64>() {
            Ok(v) => Token::IntLit(v),
            Err(_) => {
                let span = self.current_span();
                DiagnosticBuilder::error(format!("integer literal `{}` out of range", text))
                    .span(span)
                    .emit(self.handler);
                Token::IntLit(0)
            }
        }
    }

    fn lex_ident_or_keyword(&mut self) -> Token {
        let start = self.cursor.position();
        while {
            let c = self.cursor.current_char();
            c.is_ascii_alphanumeric() || c == '_'
        } {
            self.cursor.advance();
        }
        let text = self.cursor.slice_from(start);
        keyword_from_ident(text).unwrap_or_else(|| Token::Ident(flowc_util::Symbol::intern(text)))
    }

    fn skip_trivia(&mut self) {
        loop {
            while !self.cursor.is_at_end() && self.cursor.current_char().is_whitespace() {
                self.cursor.advance();
            }
            if self.cursor.current_char() == '/' && self.cursor.peek_char(1) == '/' {
                while !self.cursor.is_at_end() && self.cursor.current_char() != '\n' {
                    self.cursor.advance();
                }
                continue;
            }
            break;
        }
    }

    fn report_unexpected(&mut self, c: char) {
        let span = self.current_span();
        DiagnosticBuilder::error(format!("unexpected character '{}'", c))
            .span(span)
            .emit(self.handler);
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        match self.next_token() {
            Token::Eof => None,
            tok => Some(tok),
        }
    }
}
