//! Property tests for the lexer.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::{Lexer, Token};
    use flowc_util::Handler;

    proptest! {
        /// No arbitrary byte soup, valid UTF-8 or not, ever panics the
        /// scanner — every character is either part of a token or reported
        /// as an error through `handler`, and `next_token` always reaches
        /// `Token::Eof` in at most `source.len()` calls.
        #[test]
        fn lexer_never_panics_and_always_terminates(source in ".{0,200}") {
            let mut handler = Handler::new();
            let mut lexer = Lexer::new(&source, &mut handler);
            let mut steps = 0usize;
            loop {
                let tok = lexer.next_token();
                steps += 1;
                if tok == Token::Eof {
                    break;
                }
                prop_assert!(steps <= source.len() + 1);
            }
        }

        /// Every non-negative `i64` round-trips through its decimal text:
        /// lexing `n.to_string()` yields a single `IntLit(n)` with no
        /// lexical errors.
        #[test]
        fn int_literal_round_trips(n in 0i64..=i64::MAX) {
            let text = n.to_string();
            let mut handler = Handler::new();
            let mut lexer = Lexer::new(&text, &mut handler);
            let tok = lexer.next_token();
            prop_assert_eq!(tok, Token::IntLit(n));
            prop_assert_eq!(lexer.next_token(), Token::Eof);
            prop_assert!(!handler.has_errors());
        }
    }
}
