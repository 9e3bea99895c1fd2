//! Token definitions for the flowc source language.
//!
//! The language is a small C-like procedural grammar: `func` declarations,
//! `int` scalars, fixed-size integer arrays, `if`/`else`, two `for` forms,
//! `break`/`continue`/`return`, and the usual arithmetic/comparison/logical
//! operators. There are no strings, floats, chars, structs, or generics.

use flowc_util::Symbol;

/// A lexical token together with its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Token {
    // Keywords
    /// `func`
    Func,
    /// `let`
    Let,
    /// `int`
    Int,
    /// `if`
    If,
    /// `else`
    Else,
    /// `for`
    For,
    /// `return`
    Return,
    /// `break`
    Break,
    /// `continue`
    Continue,

    /// Identifier.
    Ident(Symbol),
    /// Integer literal. The language only has 64-bit signed integers.
    IntLit(i64),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Bang,
    Eq,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Arrow,

    /// End of input.
    Eof,
}

impl Token {
    /// A short, stable label used in parser error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Func => "`func`".into(),
            Token::Let => "`let`".into(),
            Token::Int => "`int`".into(),
            Token::If => "`if`".into(),
            Token::Else => "`else`".into(),
            Token::For => "`for`".into(),
            Token::Return => "`return`".into(),
            Token::Break => "`break`".into(),
            Token::Continue => "`continue`".into(),
            Token::Ident(s) => format!("identifier `{}`", s.as_str()),
            Token::IntLit(v) => format!("integer literal `{}`", v),
            Token::Plus => "`+`".into(),
            Token::Minus => "`-`".into(),
            Token::Star => "`*`".into(),
            Token::Slash => "`/`".into(),
            Token::Percent => "`%`".into(),
            Token::EqEq => "`==`".into(),
            Token::NotEq => "`!=`".into(),
            Token::Lt => "`<`".into(),
            Token::Le => "`<=`".into(),
            Token::Gt => "`>`".into(),
            Token::Ge => "`>=`".into(),
            Token::AndAnd => "`&&`".into(),
            Token::OrOr => "`||`".into(),
            Token::Bang => "`!`".into(),
            Token::Eq => "`=`".into(),
            Token::LParen => "`(`".into(),
            Token::RParen => "`)`".into(),
            Token::LBrace => "`{`".into(),
            Token::RBrace => "`}`".into(),
            Token::LBracket => "`[`".into(),
            Token::RBracket => "`]`".into(),
            Token::Comma => "`,`".into(),
            Token::Semicolon => "`;`".into(),
            Token::Arrow => "`->`".into(),
            Token::Eof => "end of input".into(),
        }
    }
}

/// Resolves an identifier's text to a keyword token, if it is one.
pub fn keyword_from_ident(text: &str) -> Option<Token> {
    Some(match text {
        "func" => Token::Func,
        "let" => Token::Let,
        "int" => Token::Int,
        "if" => Token::If,
        "else" => Token::Else,
        "for" => Token::For,
        "return" => Token::Return,
        "break" => Token::Break,
        "continue" => Token::Continue,
        _ => return None,
    })
}
