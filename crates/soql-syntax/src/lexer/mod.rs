use crate::{
    lexer::{
        error::LexerError,
        token::{Token, TokenKind},
    },
    parser::{Rule, SoqlParser},
};
use pest::{Parser, iterators::Pair};

pub mod error;
pub mod token;

pub struct Lexer {
    tokens: Vec<Token>,
}

impl Lexer {
    pub fn new() -> Self {
        Lexer { tokens: Vec::new() }
    }

    pub fn tokenize(&mut self, input: &str) -> Result<Vec<Token>, LexerError> {
        self.tokens.clear();

        let pairs =
            SoqlParser::parse(Rule::program, input).map_err(LexerError::from_pest_error)?;

        for pair in pairs {
            self.process_pair(pair);
        }

        // Add EOF token
        self.tokens.push(Token {
            kind: TokenKind::Eof,
            lexeme: String::new(),
            line: input.lines().count(),
            column: input.lines().last().map(|l| l.len()).unwrap_or(0),
            span: (input.len(), input.len()),
        });

        Ok(self.tokens.clone())
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    fn process_pair(&mut self, pair: Pair<Rule>) {
        let rule = pair.as_rule();
        let lexeme = pair.as_str().to_string();

        let kind = match rule {
            Rule::dml => TokenKind::Dml,
            Rule::keyword => TokenKind::Keyword(normalize_keyword(&lexeme)),
            Rule::ident => TokenKind::Identifier(lexeme.clone()),

            // Literals
            Rule::string_lit => {
                let inner = lexeme
                    .strip_prefix('\'')
                    .and_then(|s| s.strip_suffix('\''))
                    .unwrap_or(&lexeme);
                TokenKind::String(inner.to_string())
            }
            Rule::number_lit => TokenKind::Number(lexeme.clone()),
            Rule::date_lit => TokenKind::Date(lexeme.clone()),

            Rule::operator => TokenKind::Operator(lexeme.clone()),

            // Delimiters
            Rule::comma => TokenKind::Comma,
            Rule::lparen => TokenKind::LeftParen,
            Rule::rparen => TokenKind::RightParen,
            Rule::semicolon => TokenKind::Semicolon,

            Rule::other => TokenKind::Other(lexeme.clone()),

            Rule::EOI => return,

            // Recursively process other rules
            _ => {
                for inner_pair in pair.into_inner() {
                    self.process_pair(inner_pair);
                }
                return;
            }
        };

        let span = pair.as_span();
        let (line, column) = span.start_pos().line_col();
        self.add_token(kind, lexeme, line, column, span.start(), span.end());
    }

    fn add_token(
        &mut self,
        kind: TokenKind,
        lexeme: String,
        line: usize,
        column: usize,
        start: usize,
        end: usize,
    ) {
        self.tokens.push(Token {
            kind,
            lexeme,
            line,
            column,
            span: (start, end),
        });
    }
}

impl Default for Lexer {
    fn default() -> Self {
        Lexer { tokens: vec![] }
    }
}

/// Upper-cases a keyword and collapses inner whitespace ("order   by" -> "ORDER BY").
fn normalize_keyword(lexeme: &str) -> String {
    lexeme
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

#[cfg(test)]
mod tests;
