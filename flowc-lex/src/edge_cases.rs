//! Edge case tests for flowc-lex

#[cfg(test)]
mod tests {
    use crate::{Lexer, Token};
    use flowc_util::Handler;

    fn lex_all(source: &str) -> Vec<Token> {
        let mut handler = Handler::new();
        let mut lexer = Lexer::new(source, &mut handler);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            if token == Token::Eof {
                break;
            }
            tokens.push(token);
        }
        tokens
    }

    // ==================== EDGE CASES ====================

    #[test]
    fn test_edge_empty_source() {
        assert!(lex_all("").is_empty());
    }

    #[test]
    fn test_edge_single_char_ident() {
        let t = lex_all("x");
        assert_eq!(t[0], Token::Ident(flowc_util::Symbol::intern("x")));
    }

    #[test]
    fn test_edge_long_identifier() {
        let name = "a".repeat(10000);
        let t = lex_all(&format!("let {} = 1;", name));
        assert!(t.contains(&Token::Ident(flowc_util::Symbol::intern(&name))));
    }

    #[test]
    fn test_edge_keywords_not_idents() {
        let t = lex_all("func let if");
        assert_eq!(t[0], Token::Func);
        assert_eq!(t[1], Token::Let);
        assert_eq!(t[2], Token::If);
    }

    #[test]
    fn test_edge_all_keywords() {
        let t = lex_all("func let int if else for return break continue");
        assert_eq!(
            t,
            vec![
                Token::Func,
                Token::Let,
                Token::Int,
                Token::If,
                Token::Else,
                Token::For,
                Token::Return,
                Token::Break,
                Token::Continue,
            ]
        );
    }

    #[test]
    fn test_edge_all_operators() {
        let t = lex_all("+ - * / % == != < > <= >= && || ! =");
        assert_eq!(
            t,
            vec![
                Token::Plus,
                Token::Minus,
                Token::Star,
                Token::Slash,
                Token::Percent,
                Token::EqEq,
                Token::NotEq,
                Token::Lt,
                Token::Gt,
                Token::Le,
                Token::Ge,
                Token::AndAnd,
                Token::OrOr,
                Token::Bang,
                Token::Eq,
            ]
        );
    }

    #[test]
    fn test_edge_all_delimiters() {
        let t = lex_all("( ) { } [ ] , ; ->");
        assert_eq!(
            t,
            vec![
                Token::LParen,
                Token::RParen,
                Token::LBrace,
                Token::RBrace,
                Token::LBracket,
                Token::RBracket,
                Token::Comma,
                Token::Semicolon,
                Token::Arrow,
            ]
        );
    }

    #[test]
    fn test_edge_nested_delimiters() {
        let t = lex_all("((()))");
        assert_eq!(t.iter().filter(|x| **x == Token::LParen).count(), 3);
    }

    #[test]
    fn test_edge_case_sensitivity() {
        let t = lex_all("Func func");
        assert_eq!(t[0], Token::Ident(flowc_util::Symbol::intern("Func")));
        assert_eq!(t[1], Token::Func);
    }

    #[test]
    fn test_edge_max_int() {
        let t = lex_all("9223372036854775807");
        assert_eq!(t[0], Token::IntLit(9223372036854775807));
    }

    #[test]
    fn test_edge_leading_zeros() {
        let t = lex_all("007");
        assert_eq!(t[0], Token::IntLit(7));
    }

    #[test]
    fn test_edge_line_comment_to_eol() {
        let t = lex_all("let x = 1; // trailing comment\nlet y = 2;");
        assert_eq!(t.iter().filter(|tok| **tok == Token::Let).count(), 2);
    }

    #[test]
    fn test_edge_comment_only_source() {
        assert!(lex_all("// just a comment").is_empty());
    }

    #[test]
    fn test_edge_minus_vs_arrow() {
        let t = lex_all("a - b -> c");
        assert_eq!(t[1], Token::Minus);
        assert_eq!(t[3], Token::Arrow);
    }

    #[test]
    fn test_edge_whitespace_variations() {
        let t = lex_all("let\tx\n=\n1");
        assert!(t.contains(&Token::Let));
        assert!(t.contains(&Token::IntLit(1)));
    }

    #[test]
    fn test_edge_consecutive_idents_need_whitespace() {
        let t = lex_all("a b");
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_edge_underscore_in_ident() {
        let t = lex_all("my_var_1");
        assert_eq!(t[0], Token::Ident(flowc_util::Symbol::intern("my_var_1")));
    }

    // ==================== ERROR CASES ====================

    #[test]
    fn test_err_invalid_chars() {
        let mut h = Handler::new();
        let mut lex = Lexer::new("@#$", &mut h);
        while lex.next_token() != Token::Eof {}
        assert!(h.has_errors());
    }

    #[test]
    fn test_err_mixed_valid_invalid() {
        let mut h = Handler::new();
        let mut lex = Lexer::new("let x = ~ 1;", &mut h);
        while lex.next_token() != Token::Eof {}
        assert!(h.has_errors());
    }

    #[test]
    fn test_err_lone_ampersand() {
        let mut h = Handler::new();
        let mut lex = Lexer::new("a & b", &mut h);
        while lex.next_token() != Token::Eof {}
        assert!(h.has_errors());
    }

    #[test]
    fn test_err_lone_pipe() {
        let mut h = Handler::new();
        let mut lex = Lexer::new("a | b", &mut h);
        while lex.next_token() != Token::Eof {}
        assert!(h.has_errors());
    }

    #[test]
    fn test_err_overflowing_int_literal_recovers() {
        let mut h = Handler::new();
        let mut lex = Lexer::new("99999999999999999999999", &mut h);
        let t = lex.next_token();
        assert_eq!(t, Token::IntLit(0));
        assert!(h.has_errors());
    }
}
