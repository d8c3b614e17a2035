use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
    pub column: usize,
    pub span: (usize, usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Statement verb (SELECT)
    Dml,

    // Reserved words, upper-cased with inner whitespace collapsed ("ORDER BY")
    Keyword(String),

    // Field, relationship or object names; dotted paths stay one token
    Identifier(String),

    // Literals
    String(String),
    Number(String),
    Date(String),

    Operator(String),

    // Delimiters
    Comma,      // ,
    LeftParen,  // (
    RightParen, // )
    Semicolon,  // ;

    Other(String),

    // Special
    Eof,
}

impl TokenKind {
    pub fn is_keyword(&self, name: &str) -> bool {
        matches!(self, TokenKind::Keyword(k) if k.eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Dml => write!(f, "SELECT"),
            TokenKind::Keyword(k) => write!(f, "{}", k),
            TokenKind::Identifier(s) => write!(f, "{}", s),
            TokenKind::String(s) => write!(f, "'{}'", s),
            TokenKind::Number(n) => write!(f, "{}", n),
            TokenKind::Date(d) => write!(f, "{}", d),
            TokenKind::Operator(op) => write!(f, "{}", op),
            TokenKind::Comma => write!(f, ","),
            TokenKind::LeftParen => write!(f, "("),
            TokenKind::RightParen => write!(f, ")"),
            TokenKind::Semicolon => write!(f, ";"),
            TokenKind::Other(s) => write!(f, "{}", s),
            TokenKind::Eof => write!(f, "EOF"),
        }
    }
}
