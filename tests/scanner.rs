use rox::scanner::Scanner;
use rox::token::{Token, TokenType};

fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
    let scanner = Scanner::new(source);
    let tokens: Vec<Token> = scanner.filter_map(Result::ok).collect();

    assert_eq!(tokens.len(), expected.len());

    for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
        assert_eq!(actual.token_type, *expected_type);
        assert_eq!(actual.lexeme, *expected_lexeme);
    }
}

#[test]
fn symbols() {
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
fn one_and_two_char_operators() {
    assert_token_sequence(
        "! != = == < <= > >= / //comment",
        &[
            (TokenType::BANG, "!"),
            (TokenType::BANG_EQUAL, "!="),
            (TokenType::EQUAL, "="),
            (TokenType::EQUAL_EQUAL, "=="),
            (TokenType::LESS, "<"),
            (TokenType::LESS_EQUAL, "<="),
            (TokenType::GREATER, ">"),
            (TokenType::GREATER_EQUAL, ">="),
            (TokenType::SLASH, "/"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn keywords_scan_as_keywords_and_identifiers_as_identifiers() {
    // Every reserved word, plus lookalikes that must stay identifiers.
    let cases: &[(&str, TokenType)] = &[
        ("and", TokenType::AND),
        ("class", TokenType::CLASS),
        ("else", TokenType::ELSE),
        ("false", TokenType::FALSE),
        ("fun", TokenType::FUN),
        ("for", TokenType::FOR),
        ("if", TokenType::IF),
        ("nil", TokenType::NIL),
        ("or", TokenType::OR),
        ("print", TokenType::PRINT),
        ("return", TokenType::RETURN),
        ("super", TokenType::SUPER),
        ("this", TokenType::THIS),
        ("true", TokenType::TRUE),
        ("var", TokenType::VAR),
        ("while", TokenType::WHILE),
        ("classy", TokenType::IDENTIFIER),
        ("_var", TokenType::IDENTIFIER),
        ("whiles", TokenType::IDENTIFIER),
        ("x_1", TokenType::IDENTIFIER),
    ];

    for (word, kind) in cases {
        assert_token_sequence(
            &format!("{};", word),
            &[
                (kind.clone(), word),
                (TokenType::SEMICOLON, ";"),
                (TokenType::EOF, ""),
            ],
        );
    }
}

#[test]
fn string_literal_carries_its_contents() {
    let tokens: Vec<Token> = Scanner::new("\"hello world\"")
        .filter_map(Result::ok)
        .collect();

    assert_eq!(tokens[0].token_type, TokenType::STRING(String::new()));
    assert_eq!(tokens[0].lexeme, "\"hello world\"");

    match &tokens[0].token_type {
        TokenType::STRING(s) => assert_eq!(s, "hello world"),
        other => panic!("expected string token, got {:?}", other),
    }
}

#[test]
fn numbers_parse_as_doubles_and_trailing_dot_is_not_consumed() {
    let tokens: Vec<Token> = Scanner::new("12 3.5 4.")
        .filter_map(Result::ok)
        .collect();

    match &tokens[0].token_type {
        TokenType::NUMBER(n) => assert_eq!(*n, 12.0),
        other => panic!("expected number, got {:?}", other),
    }

    match &tokens[1].token_type {
        TokenType::NUMBER(n) => assert_eq!(*n, 3.5),
        other => panic!("expected number, got {:?}", other),
    }

    // "4." scans as the number 4 followed by a dot.
    assert_eq!(tokens[2].token_type, TokenType::NUMBER(0.0));
    assert_eq!(tokens[2].lexeme, "4");
    assert_eq!(tokens[3].token_type, TokenType::DOT);
}

#[test]
fn newlines_and_multiline_strings_advance_the_line_counter() {
    let tokens: Vec<Token> = Scanner::new("a\nb\n\"two\nlines\"\nc")
        .filter_map(Result::ok)
        .collect();

    assert_eq!(tokens[0].line, 1); // a
    assert_eq!(tokens[1].line, 2); // b
    assert_eq!(tokens[2].line, 3); // the string begins on line 3
    assert_eq!(tokens[3].line, 5); // c

    // EOF reports the final line of input.
    assert_eq!(tokens.last().unwrap().line, 5);
}

#[test]
fn comments_run_to_end_of_line() {
    assert_token_sequence(
        "a // the rest is ignored ;;;\nb",
        &[
            (TokenType::IDENTIFIER, "a"),
            (TokenType::IDENTIFIER, "b"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn unexpected_characters_report_and_scanning_continues() {
    let results: Vec<_> = Scanner::new(",.$(#").collect();

    // COMMA, DOT, error, LEFT_PAREN, error, EOF.
    assert_eq!(results.len(), 6);

    let error_count = results.iter().filter(|r| r.is_err()).count();
    assert_eq!(error_count, 2);

    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(
            err.to_string().contains("Unexpected character"),
            "unexpected message: {}",
            err
        );
    }

    let kinds: Vec<TokenType> = results
        .iter()
        .filter_map(|r| r.as_ref().ok())
        .map(|t| t.token_type.clone())
        .collect();

    assert_eq!(
        kinds,
        vec![
            TokenType::COMMA,
            TokenType::DOT,
            TokenType::LEFT_PAREN,
            TokenType::EOF,
        ]
    );
}

#[test]
fn unterminated_string_reports_the_opening_line() {
    let results: Vec<_> = Scanner::new("a;\n\"never closed").collect();

    let err = results
        .iter()
        .find_map(|r| r.as_ref().err())
        .expect("expected an error");

    let message = err.to_string();
    assert!(message.contains("Unterminated string."));
    assert!(message.contains("[line 2]"));
}

#[test]
fn eof_is_emitted_exactly_once() {
    let mut scanner = Scanner::new("1;");

    let mut eof_count = 0;
    for item in &mut scanner {
        if let Ok(token) = item {
            if token.token_type == TokenType::EOF {
                eof_count += 1;
            }
        }
    }

    assert_eq!(eof_count, 1);
    assert!(scanner.next().is_none());
}
