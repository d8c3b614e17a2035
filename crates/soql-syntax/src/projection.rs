//! Recovers the source table and the projected field list from one statement.
//!
//! The lexer yields a flat token stream. Tokens are then grouped into
//! top-level elements, each tagged with a [`TokenClass`]:
//!
//! - parenthesised groups and function calls become one `Other` element,
//! - everything from the first trailing clause keyword (`WHERE`, `ORDER BY`,
//!   `LIMIT`, ...) to the end of the statement becomes one `Other` element,
//! - comma separated runs become one `IdentifierList` element.
//!
//! The identifier list supplies the projection; every standalone identifier or
//! keyword element is a table candidate and the last one wins.

use crate::{
    error::SoqlError,
    lexer::{
        Lexer,
        token::{Token, TokenKind},
    },
};
use serde::Serialize;
use tracing::warn;

/// Keywords opening a clause that follows the source table.
const TRAILING_CLAUSES: &[&str] = &[
    "WHERE", "ORDER BY", "GROUP BY", "HAVING", "LIMIT", "OFFSET", "USING", "WITH", "FOR",
    "UPDATE",
];

/// Bare words kept in a projection even when they do not classify as an identifier.
const FIELD_KEYWORDS: &[&str] = &["type", "alias"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenClass {
    Identifier,
    IdentifierList,
    Keyword,
    Other,
}

/// A top-level element of a statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    pub class: TokenClass,
    pub text: String,
    /// Byte range of the element in the query text.
    pub span: (usize, usize),
    /// Members of an `IdentifierList`; empty for every other class.
    pub members: Vec<Element>,
}

impl Element {
    fn leaf(class: TokenClass, text: impl Into<String>, span: (usize, usize)) -> Self {
        Element {
            class,
            text: text.into(),
            span,
            members: Vec::new(),
        }
    }

    fn is_trailing_clause(&self) -> bool {
        if self.class != TokenClass::Keyword {
            return false;
        }
        let normalized = self.text.split_whitespace().collect::<Vec<_>>().join(" ");
        TRAILING_CLAUSES
            .iter()
            .any(|kw| normalized.eq_ignore_ascii_case(kw))
    }

    /// Whether a member of an identifier list names a projected field.
    fn is_projected(&self) -> bool {
        matches!(self.class, TokenClass::Identifier | TokenClass::Keyword)
            || FIELD_KEYWORDS
                .iter()
                .any(|kw| self.text.eq_ignore_ascii_case(kw))
    }
}

/// Table and projected identifiers of a statement, in declared order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedProjection {
    pub table: String,
    pub identifiers: Vec<String>,
}

/// Parses the first statement of `query`.
///
/// Further statements are ignored with a warning.
pub fn parse(query: &str) -> Result<ParsedProjection, SoqlError> {
    let elements = top_level(query)?;

    let mut table: Option<String> = None;
    let mut identifiers = Vec::new();

    for element in elements {
        match element.class {
            TokenClass::IdentifierList => {
                identifiers.extend(
                    element
                        .members
                        .into_iter()
                        .filter(Element::is_projected)
                        .map(|m| m.text),
                );
            }
            TokenClass::Identifier | TokenClass::Keyword => table = Some(element.text),
            TokenClass::Other => {}
        }
    }

    let table =
        table.ok_or_else(|| SoqlError::MalformedQuery("no source table found".to_string()))?;

    Ok(ParsedProjection { table, identifiers })
}

/// Tokenizes `query` and groups the first statement into top-level elements.
pub fn top_level(query: &str) -> Result<Vec<Element>, SoqlError> {
    let mut lexer = Lexer::new();
    let tokens = lexer.tokenize(query)?;

    let statement = first_statement(&tokens)?;
    let pieces = group_parens(query, statement)?;
    let pieces = group_trailing_clause(query, pieces);
    Ok(group_identifier_lists(pieces))
}

fn first_statement(tokens: &[Token]) -> Result<&[Token], SoqlError> {
    let mut statements = tokens
        .split(|t| matches!(t.kind, TokenKind::Semicolon | TokenKind::Eof))
        .filter(|s| !s.is_empty());

    let first = statements
        .next()
        .ok_or_else(|| SoqlError::MalformedQuery("empty statement".to_string()))?;

    let ignored = statements.count();
    if ignored > 0 {
        warn!(ignored, "Only the first statement is parsed; ignoring the rest");
    }

    Ok(first)
}

/// Intermediate grouping unit: an element or a list separator.
#[derive(Debug, Clone, PartialEq)]
enum Piece {
    Elem(Element),
    Comma((usize, usize)),
}

impl Piece {
    fn is_comma(&self) -> bool {
        matches!(self, Piece::Comma(_))
    }
}

fn group_parens(query: &str, tokens: &[Token]) -> Result<Vec<Piece>, SoqlError> {
    let mut pieces: Vec<Piece> = Vec::with_capacity(tokens.len());
    let mut idx = 0;

    while idx < tokens.len() {
        let token = &tokens[idx];
        match &token.kind {
            TokenKind::LeftParen => {
                let end = matching_paren(tokens, idx)?;
                let span = (token.span.0, tokens[end].span.1);

                // A name directly followed by a group is a function call
                match pieces.last_mut() {
                    Some(Piece::Elem(prev)) if prev.class == TokenClass::Identifier => {
                        prev.class = TokenClass::Other;
                        prev.span.1 = span.1;
                        prev.text = query[prev.span.0..prev.span.1].to_string();
                    }
                    _ => pieces.push(Piece::Elem(Element::leaf(
                        TokenClass::Other,
                        &query[span.0..span.1],
                        span,
                    ))),
                }
                idx = end + 1;
                continue;
            }
            TokenKind::RightParen => {
                return Err(SoqlError::MalformedQuery(format!(
                    "unbalanced ')' at line {}, column {}",
                    token.line, token.column
                )));
            }
            TokenKind::Comma => pieces.push(Piece::Comma(token.span)),
            TokenKind::Identifier(name) => pieces.push(Piece::Elem(Element::leaf(
                TokenClass::Identifier,
                name.clone(),
                token.span,
            ))),
            TokenKind::Keyword(_) => pieces.push(Piece::Elem(Element::leaf(
                TokenClass::Keyword,
                token.lexeme.clone(),
                token.span,
            ))),
            _ => pieces.push(Piece::Elem(Element::leaf(
                TokenClass::Other,
                token.lexeme.clone(),
                token.span,
            ))),
        }
        idx += 1;
    }

    Ok(pieces)
}

fn matching_paren(tokens: &[Token], open: usize) -> Result<usize, SoqlError> {
    let mut depth = 0usize;
    for (offset, token) in tokens[open..].iter().enumerate() {
        match token.kind {
            TokenKind::LeftParen => depth += 1,
            TokenKind::RightParen => {
                depth -= 1;
                if depth == 0 {
                    return Ok(open + offset);
                }
            }
            _ => {}
        }
    }

    let token = &tokens[open];
    Err(SoqlError::MalformedQuery(format!(
        "unclosed '(' at line {}, column {}",
        token.line, token.column
    )))
}

fn group_trailing_clause(query: &str, mut pieces: Vec<Piece>) -> Vec<Piece> {
    let start = pieces.iter().position(|p| match p {
        Piece::Elem(e) => e.is_trailing_clause(),
        Piece::Comma(_) => false,
    });

    if let Some(start) = start {
        let spans: Vec<(usize, usize)> = pieces
            .drain(start..)
            .map(|p| match p {
                Piece::Elem(e) => e.span,
                Piece::Comma(span) => span,
            })
            .collect();
        let span = (spans[0].0, spans[spans.len() - 1].1);
        pieces.push(Piece::Elem(Element::leaf(
            TokenClass::Other,
            &query[span.0..span.1],
            span,
        )));
    }

    pieces
}

fn group_identifier_lists(pieces: Vec<Piece>) -> Vec<Element> {
    let mut elements: Vec<Element> = Vec::new();
    let mut iter = pieces.into_iter().peekable();

    while let Some(piece) = iter.next() {
        let first = match piece {
            Piece::Elem(e) => e,
            // A separator with nothing in front of it carries no field
            Piece::Comma(_) => continue,
        };

        if !iter.peek().is_some_and(Piece::is_comma) {
            elements.push(first);
            continue;
        }

        let mut members = vec![first];
        while iter.peek().is_some_and(Piece::is_comma) {
            iter.next();
            match iter.peek() {
                Some(Piece::Elem(_)) => {
                    if let Some(Piece::Elem(member)) = iter.next() {
                        members.push(member);
                    }
                }
                _ => break,
            }
        }

        let span = (members[0].span.0, members[members.len() - 1].span.1);
        let text = members
            .iter()
            .map(|m| m.text.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        elements.push(Element {
            class: TokenClass::IdentifierList,
            text,
            span,
            members,
        });
    }

    elements
}
