use super::*;

fn kinds(input: &str) -> Vec<TokenKind> {
    let mut lexer = Lexer::new();
    lexer
        .tokenize(input)
        .unwrap()
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

#[test]
fn test_select_statement() {
    let tokens = kinds("SELECT Id, Account.Name FROM Contact");

    assert_eq!(
        tokens,
        vec![
            TokenKind::Dml,
            TokenKind::Identifier("Id".into()),
            TokenKind::Comma,
            TokenKind::Identifier("Account.Name".into()),
            TokenKind::Keyword("FROM".into()),
            TokenKind::Identifier("Contact".into()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_keywords_are_case_insensitive() {
    let tokens = kinds("select id from contact where name like 'A%'");

    assert_eq!(tokens[0], TokenKind::Dml);
    assert!(tokens[2].is_keyword("from"));
    assert!(tokens[4].is_keyword("WHERE"));
    assert!(tokens[6].is_keyword("LIKE"));
    assert_eq!(tokens[7], TokenKind::String("A%".into()));
}

#[test]
fn test_keyword_word_boundaries() {
    // "Order" and "OrderId" are field names, not the start of ORDER BY
    let tokens = kinds("Order OrderId Origin Nullable FromDate");
    for token in &tokens[..5] {
        assert!(matches!(token, TokenKind::Identifier(_)), "{token:?}");
    }
}

#[test]
fn test_two_word_keywords() {
    let tokens = kinds("ORDER   BY Name group by Type");
    assert_eq!(tokens[0], TokenKind::Keyword("ORDER BY".into()));
    assert_eq!(tokens[1], TokenKind::Identifier("Name".into()));
    assert_eq!(tokens[2], TokenKind::Keyword("GROUP BY".into()));
}

#[test]
fn test_longer_keyword_wins_over_prefix() {
    let tokens = kinds("NULLS LAST INCLUDES");
    assert_eq!(tokens[0], TokenKind::Keyword("NULLS".into()));
    assert_eq!(tokens[1], TokenKind::Keyword("LAST".into()));
    assert_eq!(tokens[2], TokenKind::Keyword("INCLUDES".into()));
}

#[test]
fn test_date_literals() {
    let tokens = kinds("CreatedDate > 2019-04-01T00:00:00Z AND CloseDate = 2019-05-01");

    assert_eq!(tokens[1], TokenKind::Operator(">".into()));
    assert_eq!(tokens[2], TokenKind::Date("2019-04-01T00:00:00Z".into()));
    assert_eq!(tokens[6], TokenKind::Date("2019-05-01".into()));
}

#[test]
fn test_date_literal_with_offset() {
    let tokens = kinds("2019-04-01T00:00:00.000+0000");
    assert_eq!(tokens[0], TokenKind::Date("2019-04-01T00:00:00.000+0000".into()));
}

#[test]
fn test_numbers_and_operators() {
    let tokens = kinds("Amount >= 10.5 AND Amount != 3");
    assert_eq!(tokens[1], TokenKind::Operator(">=".into()));
    assert_eq!(tokens[2], TokenKind::Number("10.5".into()));
    assert_eq!(tokens[5], TokenKind::Operator("!=".into()));
}

#[test]
fn test_escaped_quote_in_string() {
    let tokens = kinds(r"Name = 'O\'Brien'");
    assert_eq!(tokens[2], TokenKind::String(r"O\'Brien".into()));
}

#[test]
fn test_comments_are_skipped() {
    let tokens = kinds("SELECT Id -- trailing\n/* block */ FROM Lead");
    assert_eq!(tokens.len(), 5);
    assert!(tokens[2].is_keyword("FROM"));
}

#[test]
fn test_bind_variables_and_semicolons() {
    let tokens = kinds("Id = :recordId;");
    assert_eq!(tokens[2], TokenKind::Other(":".into()));
    assert_eq!(tokens[3], TokenKind::Identifier("recordId".into()));
    assert_eq!(tokens[4], TokenKind::Semicolon);
}

#[test]
fn test_unterminated_string_fails() {
    let mut lexer = Lexer::new();
    let err = lexer.tokenize("SELECT Id FROM Contact WHERE Name = 'Acme").unwrap_err();
    let LexerError::ParseError { line, .. } = &err;
    assert_eq!(*line, 1);
    assert!(err.format_error().contains('^'));
}

#[test]
fn test_token_positions() {
    let mut lexer = Lexer::new();
    let tokens = lexer.tokenize("SELECT Id\nFROM Contact").unwrap();

    assert_eq!(tokens[2].line, 2);
    assert_eq!(tokens[2].column, 1);
    assert_eq!(tokens[3].span, (15, 22));
}
