// tests/lexer_tests.rs

use runql::SyntaxErrorKind;
use runql::ast::Token;
use runql::lexer::{Lexer, tokenize};

// ============================================================================
// Single Character Tokens
// ============================================================================

#[test]
fn test_single_char_tokens() {
    let test_cases = vec![
        ("(", Token::LParen),
        (")", Token::RParen),
        ("[", Token::LBracket),
        ("]", Token::RBracket),
        ("{", Token::LBrace),
        ("}", Token::RBrace),
        (".", Token::Dot),
        (",", Token::Comma),
        (":", Token::Colon),
        ("<", Token::Lt),
        (">", Token::Gt),
    ];

    for (input, expected) in test_cases {
        let mut lexer = Lexer::new(input);
        let token = lexer.next_token().unwrap();
        assert_eq!(token, expected, "Failed for input: {}", input);
        assert_eq!(lexer.next_token().unwrap(), Token::Eof);
    }
}

// ============================================================================
// Two Character Tokens
// ============================================================================

#[test]
fn test_two_char_tokens() {
    let test_cases = vec![
        ("==", Token::EqEq),
        ("!=", Token::NotEq),
        ("<=", Token::LtEq),
        (">=", Token::GtEq),
    ];

    for (input, expected) in test_cases {
        let mut lexer = Lexer::new(input);
        assert_eq!(lexer.next_token().unwrap(), expected, "Failed for input: {}", input);
        assert_eq!(lexer.next_token().unwrap(), Token::Eof);
    }
}

#[test]
fn test_two_char_vs_single_char() {
    let tokens = tokenize("a<b<=c").unwrap();
    assert_eq!(
        tokens,
        vec![
            Token::Identifier("a".to_string()),
            Token::Lt,
            Token::Identifier("b".to_string()),
            Token::LtEq,
            Token::Identifier("c".to_string()),
            Token::Eof,
        ]
    );
}

#[test]
fn test_bare_equals_is_invalid() {
    let err = Lexer::new("=").next_token().unwrap_err();
    assert_eq!(err.kind, SyntaxErrorKind::Tokenize);
    assert!(err.message.contains("=="));

    let err = Lexer::new("!x").next_token().unwrap_err();
    assert_eq!(err.kind, SyntaxErrorKind::Tokenize);
}

// ============================================================================
// Keywords
// ============================================================================

#[test]
fn test_keywords_vs_identifiers() {
    let test_cases = vec![
        ("and", Token::And),
        ("android", Token::Identifier("android".to_string())),
        ("or", Token::Or),
        ("order", Token::Identifier("order".to_string())),
        ("not", Token::Not),
        ("note", Token::Identifier("note".to_string())),
        ("in", Token::In),
        ("is", Token::Is),
        ("island", Token::Identifier("island".to_string())),
        ("index", Token::Identifier("index".to_string())),
        ("True", Token::Boolean(true)),
        ("true", Token::Boolean(true)),
        ("False", Token::Boolean(false)),
        ("None", Token::None),
        ("none", Token::Identifier("none".to_string())),
    ];

    for (input, expected) in test_cases {
        let mut lexer = Lexer::new(input);
        assert_eq!(lexer.next_token().unwrap(), expected, "Failed for input: {}", input);
    }
}

// ============================================================================
// Numbers
// ============================================================================

#[test]
fn test_integers() {
    let test_cases = vec![("0", 0), ("42", 42), ("-1", -1), ("12345678", 12345678)];

    for (input, expected) in test_cases {
        let mut lexer = Lexer::new(input);
        assert_eq!(lexer.next_token().unwrap(), Token::Integer(expected));
    }
}

#[test]
fn test_floats() {
    let test_cases = vec![
        ("0.5", 0.5),
        ("-1.0", -1.0),
        ("1e3", 1000.0),
        ("2.5E-2", 0.025),
    ];

    for (input, expected) in test_cases {
        let mut lexer = Lexer::new(input);
        assert_eq!(lexer.next_token().unwrap(), Token::Float(expected), "Failed for input: {}", input);
    }
}

#[test]
fn test_integer_and_float_stay_distinct() {
    assert_eq!(tokenize("-1").unwrap()[0], Token::Integer(-1));
    assert_eq!(tokenize("-1.0").unwrap()[0], Token::Float(-1.0));
}

#[test]
fn test_integer_overflow() {
    let err = tokenize("99999999999999999999").unwrap_err();
    assert_eq!(err.kind, SyntaxErrorKind::Tokenize);
}

#[test]
fn test_dot_after_integer_is_member_access() {
    assert_eq!(
        tokenize("1.x").unwrap(),
        vec![
            Token::Integer(1),
            Token::Dot,
            Token::Identifier("x".to_string()),
            Token::Eof,
        ]
    );
}

// ============================================================================
// Strings
// ============================================================================

#[test]
fn test_strings() {
    assert_eq!(tokenize("'run'").unwrap()[0], Token::String("run".to_string()));
    assert_eq!(tokenize("\"run name\"").unwrap()[0], Token::String("run name".to_string()));
    assert_eq!(tokenize("\"it's\"").unwrap()[0], Token::String("it's".to_string()));
    assert_eq!(tokenize("''").unwrap()[0], Token::String(String::new()));
}

#[test]
fn test_unterminated_string() {
    let err = tokenize("run.name == 'abc").unwrap_err();
    assert_eq!(err.kind, SyntaxErrorKind::Tokenize);
    assert_eq!(err.offset, 12);
}

// ============================================================================
// Offsets
// ============================================================================

#[test]
fn test_token_offsets() {
    let mut lexer = Lexer::new("  run.name");
    lexer.next_token().unwrap();
    assert_eq!(lexer.token_start(), 2);
    lexer.next_token().unwrap();
    assert_eq!(lexer.token_start(), 5);
    lexer.next_token().unwrap();
    assert_eq!(lexer.token_start(), 6);
}

#[test]
fn test_unexpected_character_offset() {
    let err = tokenize("run.name == 'x' $").unwrap_err();
    assert_eq!(err.kind, SyntaxErrorKind::Tokenize);
    assert_eq!(err.offset, 16);
}

#[test]
fn test_empty_input() {
    assert_eq!(tokenize("").unwrap(), vec![Token::Eof]);
    assert_eq!(tokenize(" \t\n").unwrap(), vec![Token::Eof]);
}
