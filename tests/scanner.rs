#[cfg(test)]
mod scanner_tests {
    use rox::error::{ErrorReporter, LoxError};
    use rox::scanner::*;
    use rox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source);
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn two_character_operators_take_longest_match() {
        assert_token_sequence(
            "!= == <= >= ! = < > /",
            &[
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::BANG, "!"),
                (TokenType::EQUAL, "="),
                (TokenType::LESS, "<"),
                (TokenType::GREATER, ">"),
                (TokenType::SLASH, "/"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_token_sequence(
            "class fun orchid _x1 break nil this",
            &[
                (TokenType::CLASS, "class"),
                (TokenType::FUN, "fun"),
                (TokenType::IDENTIFIER, "orchid"),
                (TokenType::IDENTIFIER, "_x1"),
                (TokenType::BREAK, "break"),
                (TokenType::NIL, "nil"),
                (TokenType::THIS, "this"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn numbers_have_no_leading_or_trailing_dot() {
        let tokens: Vec<_> = Scanner::new("12.5 7. .5")
            .filter_map(Result::ok)
            .map(|t| t.token_type)
            .collect();

        assert_eq!(
            tokens,
            vec![
                TokenType::NUMBER(12.5),
                TokenType::NUMBER(7.0),
                TokenType::DOT,
                TokenType::DOT,
                TokenType::NUMBER(5.0),
                TokenType::EOF,
            ]
        );

        let first = Scanner::new("12.5").next();
        assert!(matches!(
            first,
            Some(Ok(Token { token_type: TokenType::NUMBER(n), .. })) if n == 12.5
        ));
    }

    #[test]
    fn comments_are_skipped() {
        assert_token_sequence(
            "a // line comment\n/* block\n comment */ b /**/ c",
            &[
                (TokenType::IDENTIFIER, "a"),
                (TokenType::IDENTIFIER, "b"),
                (TokenType::IDENTIFIER, "c"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn string_literal_value_and_span() {
        let source = "x = \"hi\nthere\";";
        let tokens: Vec<_> = Scanner::new(source).filter_map(Result::ok).collect();

        let string = &tokens[2];
        assert_eq!(string.token_type, TokenType::STRING(String::new()));
        assert!(matches!(&string.token_type, TokenType::STRING(s) if s == "hi\nthere"));
        assert_eq!(string.span, Span::new(4, 14));
        assert_eq!(string.span.location(source), Location { line: 1, col: 4 });
        assert_eq!(tokens[3].span.location(source), Location { line: 2, col: 6 });
    }

    #[test]
    fn eof_points_at_end_of_input() {
        let tokens: Vec<_> = Scanner::new("a  ").filter_map(Result::ok).collect();
        let eof = tokens.last().map(|t| t.span);

        assert_eq!(eof, Some(Span::point(3)));
    }

    #[test]
    fn lexemes_reassemble_source_without_whitespace() {
        let source = "var greeting = \"hi\"; // trailing\nprint greeting + \"!\";";

        let rebuilt: String = Scanner::new(source)
            .filter_map(Result::ok)
            .map(|t| t.lexeme)
            .collect();

        let expected: String = "var greeting = \"hi\"; \nprint greeting + \"!\";"
            .split_whitespace()
            .collect();

        assert_eq!(rebuilt, expected);
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let source = ",.$(#";
        let results: Vec<_> = Scanner::new(source).collect();

        // 0: COMMA ','
        // 1: DOT '.'
        // 2: Error for '$'
        // 3: LEFT_PAREN '('
        // 4: Error for '#'
        // 5: EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[5], TokenType::EOF, "");

        let errors: Vec<&LoxError> = results.iter().filter_map(|r| r.as_ref().err()).collect();
        assert_eq!(errors.len(), 2, "Expected 2 error messages");

        for err in errors {
            assert!(
                err.message().contains("Unexpected character"),
                "got: {}",
                err
            );
        }

        fn assert_token_matches(
            result: &Result<Token, LoxError>,
            expected_type: TokenType,
            expected_lexeme: &str,
        ) {
            match result {
                Ok(token) => {
                    assert_eq!(token.token_type, expected_type);
                    assert_eq!(token.lexeme, expected_lexeme);
                }
                Err(e) => panic!("Expected token but got error: {}", e),
            }
        }
    }

    #[test]
    fn non_ascii_character_is_one_error() {
        let mut reporter = ErrorReporter::new();
        let tokens = scan_tokens("a é b", &mut reporter);

        assert_eq!(reporter.static_errors().len(), 1);
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].lexeme, "b");
    }

    #[test]
    fn unterminated_string_is_reported() {
        let mut reporter = ErrorReporter::new();
        let tokens = scan_tokens("print \"oops", &mut reporter);

        assert_eq!(tokens.len(), 2); // PRINT, EOF
        assert_eq!(reporter.static_errors()[0].message(), "Unterminated string.");
    }

    #[test]
    fn unterminated_block_comment_stops_at_end_of_input() {
        let mut reporter = ErrorReporter::new();
        let tokens = scan_tokens("a /* never closed *", &mut reporter);

        assert_eq!(tokens.len(), 2); // IDENTIFIER, EOF
        let err = &reporter.static_errors()[0];
        assert_eq!(err.message(), "Unterminated comment.");
        assert_eq!(err.span(), Some(Span::new(2, 4)));
    }
}
