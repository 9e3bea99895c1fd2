//! flowc-lex - lexical analysis for the flowc source language.
//!
//! Turns a source string into a stream of [`Token`]s via [`Lexer`]. The
//! lexer is hand-written and single-pass; [`Cursor`] tracks raw byte/char
//! position, line and column.

pub mod cursor;
pub mod edge_cases;
pub mod lexer;
pub mod proptests;
pub mod token;

pub use cursor::Cursor;
pub use lexer::Lexer;
pub use token::Token;
