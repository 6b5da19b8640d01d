//! DDL generation and parsing.

mod dialect;
mod generator;
mod lexer;
mod parser;
mod types;

pub use dialect::{BracketStyle, CommentStyle, Dialect};
pub use generator::{
    GenerateOptions, Generated, SkipReason, SkippedStatement, generate, generate_report,
};
pub use parser::{
    Diagnostic, DiagnosticKind, IdSource, Parsed, SequentialIds, SqlParseError, parse,
    parse_with_ids,
};
pub use types::TypeCatalog;
