//! SQL dialect detection and per-dialect formatting choices.

use serde::{Deserialize, Serialize};

/// SQL dialect variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Auto-detect from DDL content
    Auto,
    /// PostgreSQL
    #[default]
    #[serde(alias = "postgres")]
    PostgreSQL,
    /// MySQL
    MySQL,
}

/// How table and column comments are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    /// Separate `COMMENT ON TABLE/COLUMN ... IS '...'` statements.
    Statement,
    /// `COMMENT '...'` inside the column line and after the table body.
    Inline,
}

impl Dialect {
    /// Parse dialect from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "postgres" | "postgresql" | "pg" => Some(Self::PostgreSQL),
            "mysql" => Some(Self::MySQL),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::PostgreSQL => "postgresql",
            Self::MySQL => "mysql",
        }
    }

    /// Detect dialect from SQL content. Falls back to PostgreSQL.
    pub fn detect(content: &str) -> Self {
        let lower = content.to_lowercase();

        // Check header comments
        if lower.contains("postgresql database dump")
            || lower.contains("pg_dump")
            || lower.contains("-- postgres")
        {
            return Self::PostgreSQL;
        }
        if lower.contains("mysql dump") || lower.contains("mysqldump") || lower.contains("-- mysql")
        {
            return Self::MySQL;
        }

        // Check keywords
        if lower.contains("auto_increment")
            || lower.contains("engine=")
            || lower.contains("unsigned")
            || lower.contains('`')
        {
            return Self::MySQL;
        }

        Self::PostgreSQL
    }

    /// Resolve Auto to a concrete dialect.
    pub fn resolve(self, content: &str) -> Self {
        match self {
            Self::Auto => Self::detect(content),
            other => other,
        }
    }

    /// Concrete dialect used when no content is available to detect from.
    pub fn concrete(self) -> Self {
        match self {
            Self::Auto => Self::PostgreSQL,
            other => other,
        }
    }

    pub fn default_bracket(self) -> BracketStyle {
        match self.concrete() {
            Self::MySQL => BracketStyle::Backtick,
            _ => BracketStyle::DoubleQuote,
        }
    }

    /// Clause emitted for auto-increment columns.
    pub fn identity_clause(self) -> &'static str {
        match self.concrete() {
            Self::MySQL => "AUTO_INCREMENT",
            _ => "GENERATED ALWAYS AS IDENTITY",
        }
    }

    pub fn comment_style(self) -> CommentStyle {
        match self.concrete() {
            Self::MySQL => CommentStyle::Inline,
            _ => CommentStyle::Statement,
        }
    }

    /// Whether a backslash escapes the next character inside string literals.
    pub fn backslash_escapes(self) -> bool {
        matches!(self.concrete(), Self::MySQL)
    }

    /// Quotes `text` as a string literal, escaping as the dialect requires.
    pub fn quote_literal(self, text: &str) -> String {
        let mut escaped = text.replace('\'', "''");
        if self.backslash_escapes() {
            escaped = escaped.replace('\\', "\\\\");
        }
        format!("'{escaped}'")
    }
}

/// Identifier quoting convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BracketStyle {
    None,
    DoubleQuote,
    Backtick,
    SquareBracket,
}

impl BracketStyle {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "none" => Some(Self::None),
            "doublequote" | "double-quote" | "double_quote" => Some(Self::DoubleQuote),
            "backtick" => Some(Self::Backtick),
            "squarebracket" | "square-bracket" | "square_bracket" => Some(Self::SquareBracket),
            _ => None,
        }
    }

    fn delimiters(self) -> (&'static str, &'static str) {
        match self {
            Self::None => ("", ""),
            Self::DoubleQuote => ("\"", "\""),
            Self::Backtick => ("`", "`"),
            Self::SquareBracket => ("[", "]"),
        }
    }

    /// Wraps an identifier in this style's delimiters, doubling any
    /// closing delimiter inside the name.
    pub fn wrap(self, name: &str) -> String {
        let (open, close) = self.delimiters();
        if close.is_empty() {
            return name.to_string();
        }
        let escaped = name.replace(close, &close.repeat(2));
        format!("{open}{escaped}{close}")
    }
}
