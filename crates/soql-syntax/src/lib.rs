pub mod columns;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod projection;
pub mod statement;
