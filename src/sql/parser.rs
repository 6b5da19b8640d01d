//! DDL parser producing store mutations.
//!
//! Parsing runs in two phases. Statements are first read into plain
//! definitions keyed by name, then the definitions are resolved against each
//! other and turned into entities. A statement that cannot be read is
//! skipped with a diagnostic; the rest of the input still contributes.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use super::dialect::Dialect;
use super::lexer::{Lexer, Spanned, Token};
use super::types::TypeCatalog;
use crate::model::{
    Column, ColumnOptions, Index, IndexColumn, OrderType, Relationship, RelationshipPoint,
    RelationshipType, StartRelationshipType, Table,
};
use crate::store::{Batch, Entity, EntityKind};

#[derive(Debug, Error)]
pub enum SqlParseError {
    #[error("Unexpected token: {0:?}")]
    UnexpectedToken(Token),
    #[error("Expected {expected}, found {found:?}")]
    Expected { expected: String, found: Token },
    #[error("Unexpected end of input")]
    UnexpectedEof,
    #[error("unsupported statement: {0}")]
    Unsupported(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A statement kind the parser does not model.
    Unsupported,
    /// A statement that could not be read.
    Malformed,
    /// A name that does not match any parsed table or column.
    UnresolvedReference,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-based line the statement starts on.
    pub line: usize,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Result of parsing DDL text.
#[derive(Debug, Clone, Default)]
pub struct Parsed {
    pub batch: Batch,
    pub diagnostics: Vec<Diagnostic>,
}

/// Supplies ids for entities created by the parser.
pub trait IdSource {
    fn next_id(&mut self, kind: EntityKind) -> String;
}

/// Ids of the form `table-1`, `column-1`, counted per kind.
#[derive(Debug, Default)]
pub struct SequentialIds {
    counters: HashMap<EntityKind, usize>,
}

impl IdSource for SequentialIds {
    fn next_id(&mut self, kind: EntityKind) -> String {
        let counter = self.counters.entry(kind).or_insert(0);
        *counter += 1;
        let prefix = match kind {
            EntityKind::Table => "table",
            EntityKind::Column => "column",
            EntityKind::Relationship => "relationship",
            EntityKind::Index => "index",
            EntityKind::IndexColumn => "indexColumn",
        };
        format!("{prefix}-{counter}")
    }
}

/// Parse DDL text into a batch of entities using sequential ids.
pub fn parse(input: &str, dialect: Dialect) -> Parsed {
    parse_with_ids(input, dialect, &mut SequentialIds::default())
}

pub fn parse_with_ids(input: &str, dialect: Dialect, ids: &mut dyn IdSource) -> Parsed {
    let dialect = dialect.resolve(input);
    let tokens = Lexer::new(input)
        .with_backslash_escapes(dialect.backslash_escapes())
        .tokenize();

    let mut parser = Parser::new(tokens, dialect);
    let statements = parser.parse();
    tracing::debug!(
        dialect = dialect.name(),
        statements = statements.len(),
        diagnostics = parser.diagnostics.len(),
        "parsed ddl statements"
    );

    let mut assembler = Assembler {
        ids,
        tables: Vec::new(),
        diagnostics: parser.diagnostics,
    };
    let batch = assembler.assemble(statements);
    Parsed {
        batch,
        diagnostics: assembler.diagnostics,
    }
}

struct TableDef {
    name: String,
    comment: String,
    columns: Vec<ColumnDef>,
}

struct ColumnDef {
    name: String,
    data_type: String,
    default: String,
    options: ColumnOptions,
    comment: String,
}

struct ForeignKeyDef {
    name: String,
    table: String,
    columns: Vec<String>,
    ref_table: String,
    /// Empty means the referenced table's primary key.
    ref_columns: Vec<String>,
}

struct IndexDef {
    name: String,
    table: String,
    unique: bool,
    columns: Vec<(String, OrderType)>,
}

enum Statement {
    CreateTable(TableDef),
    ForeignKey(ForeignKeyDef),
    PrimaryKey {
        table: String,
        columns: Vec<String>,
    },
    Unique {
        name: String,
        table: String,
        columns: Vec<String>,
    },
    Index(IndexDef),
    Comment {
        table: String,
        column: Option<String>,
        text: String,
    },
}

/// Tokens that end a column default expression at nesting depth zero.
fn ends_default(token: &Token) -> bool {
    matches!(
        token,
        Token::Not
            | Token::Null
            | Token::Unique
            | Token::Primary
            | Token::References
            | Token::Check
            | Token::Constraint
            | Token::Generated
            | Token::AutoIncrement
            | Token::Comment
            | Token::Default
            | Token::On
    )
}

/// Rebuild expression text from tokens with conventional spacing.
fn render(tokens: &[Token], dialect: Dialect) -> String {
    let mut out = String::new();
    let mut prev: Option<&Token> = None;
    for token in tokens {
        let text = match token {
            Token::Ident(s) | Token::Num(s) => s.clone(),
            Token::Str(s) => dialect.quote_literal(s),
            Token::LParen => "(".to_string(),
            Token::RParen => ")".to_string(),
            Token::Comma => ",".to_string(),
            Token::Dot => ".".to_string(),
            Token::DoubleColon => "::".to_string(),
            Token::Brackets => "[]".to_string(),
            Token::Op(c) => c.to_string(),
            Token::Semicolon | Token::Eof => continue,
            keyword => keyword.keyword_text().unwrap_or_default().to_string(),
        };
        let spaced = match (prev, token) {
            (None, _) => false,
            (_, Token::RParen | Token::Comma | Token::Dot | Token::DoubleColon | Token::Brackets) => {
                false
            }
            (Some(Token::LParen | Token::Dot | Token::DoubleColon), _) => false,
            (Some(Token::Ident(_)), Token::LParen) => false,
            (Some(Token::Op(_)), Token::Op(_)) => false,
            _ => true,
        };
        if spaced {
            out.push(' ');
        }
        out.push_str(&text);
        prev = Some(token);
    }
    out
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    dialect: Dialect,
    catalog: TypeCatalog,
    diagnostics: Vec<Diagnostic>,
}

/// Keywords that may still name a table, column or index.
fn is_non_reserved(token: &Token) -> bool {
    matches!(
        token,
        Token::Add
            | Token::Key
            | Token::Delete
            | Token::Update
            | Token::Cascade
            | Token::Restrict
            | Token::Index
            | Token::Exists
            | Token::AutoIncrement
            | Token::Generated
            | Token::Comment
            | Token::Asc
            | Token::Desc
    )
}

impl Parser {
    fn new(tokens: Vec<Spanned>, dialect: Dialect) -> Self {
        Self {
            tokens,
            pos: 0,
            dialect,
            catalog: TypeCatalog::for_dialect(dialect),
            diagnostics: Vec::new(),
        }
    }

    fn current(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        self.tokens
            .get(self.pos + offset)
            .map(|s| &s.token)
            .unwrap_or(&Token::Eof)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|s| s.line)
            .unwrap_or(1)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.current() == token {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_word(&mut self, word: &str) -> bool {
        match self.current() {
            Token::Ident(s) if s.eq_ignore_ascii_case(word) => {
                self.advance();
                true
            }
            _ => false,
        }
    }

    fn expect(&mut self, token: Token, what: &str) -> Result<(), SqlParseError> {
        if self.eat(&token) {
            return Ok(());
        }
        Err(self.expected(what))
    }

    fn expected(&self, what: &str) -> SqlParseError {
        match self.current() {
            Token::Eof => SqlParseError::UnexpectedEof,
            found => SqlParseError::Expected {
                expected: what.to_string(),
                found: found.clone(),
            },
        }
    }

    /// The token at `offset` read as a name, keeping a keyword's spelling.
    fn name_at(&self, offset: usize) -> Option<String> {
        let spanned = self.tokens.get(self.pos + offset)?;
        match &spanned.token {
            Token::Ident(name) => Some(name.clone()),
            token if is_non_reserved(token) => spanned
                .word
                .clone()
                .or_else(|| token.keyword_text().map(str::to_string)),
            _ => None,
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<String, SqlParseError> {
        match self.name_at(0) {
            Some(name) => {
                self.advance();
                Ok(name)
            }
            None => Err(self.expected(what)),
        }
    }

    /// Up to `limit` consecutive plain words from the cursor.
    fn words_ahead(&self, limit: usize) -> Vec<&str> {
        self.tokens[self.pos..]
            .iter()
            .take(limit)
            .map_while(|s| match &s.token {
                Token::Ident(word) => Some(word.as_str()),
                _ => None,
            })
            .collect()
    }

    /// A keyword in table element position that names a column
    /// (`comment TEXT`, `key VARCHAR(10)`) rather than opening `KEY idx (a)`.
    fn at_keyword_column(&self) -> bool {
        if !is_non_reserved(self.current()) {
            return false;
        }
        match self.peek_at(1) {
            Token::Ident(word) => {
                self.peek_at(2) != &Token::LParen
                    || self.catalog.match_words(&[word.as_str()]).is_some()
            }
            _ => false,
        }
    }

    /// `name` or `schema.name`, returning every part.
    fn qualified_parts(&mut self, what: &str) -> Result<Vec<String>, SqlParseError> {
        let mut parts = vec![self.expect_ident(what)?];
        while self.eat(&Token::Dot) {
            parts.push(self.expect_ident(what)?);
        }
        Ok(parts)
    }

    /// Last part of a possibly schema-qualified name.
    fn qualified_name(&mut self, what: &str) -> Result<String, SqlParseError> {
        let mut parts = self.qualified_parts(what)?;
        parts.pop().ok_or(SqlParseError::UnexpectedEof)
    }

    fn eat_if_not_exists(&mut self) {
        if self.current() == &Token::If {
            self.advance();
            self.eat(&Token::Not);
            self.eat(&Token::Exists);
        }
    }

    /// Source words of the statement starting at `start`, for messages.
    fn describe(&self, start: usize) -> String {
        self.tokens[start..]
            .iter()
            .take(2)
            .filter_map(|s| match &s.token {
                Token::Ident(word) => Some(word.to_uppercase()),
                other => other.keyword_text().map(str::to_string),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn diagnose(&mut self, line: usize, kind: DiagnosticKind, message: String) {
        tracing::debug!(line, ?kind, %message, "ddl diagnostic");
        self.diagnostics.push(Diagnostic {
            line,
            kind,
            message,
        });
    }

    fn parse(&mut self) -> Vec<(usize, Statement)> {
        let mut statements = Vec::new();

        while self.current() != &Token::Eof {
            if self.eat(&Token::Semicolon) {
                continue;
            }

            let start = self.pos;
            let line = self.line();
            let result = match self.current() {
                Token::Create => self.parse_create(start),
                Token::Alter => self.parse_alter(start),
                Token::Comment => self.parse_comment_on(start),
                _ => Err(SqlParseError::Unsupported(self.describe(start))),
            };

            match result {
                Ok(parsed) => {
                    statements.extend(parsed.into_iter().map(|s| (line, s)));
                }
                Err(SqlParseError::Unsupported(what)) => {
                    self.diagnose(
                        line,
                        DiagnosticKind::Unsupported,
                        format!("unsupported statement: {what}"),
                    );
                    self.pos = start;
                    self.skip_statement();
                }
                Err(err) => {
                    self.diagnose(line, DiagnosticKind::Malformed, err.to_string());
                    self.skip_statement();
                }
            }
        }

        statements
    }

    fn parse_create(&mut self, start: usize) -> Result<Vec<Statement>, SqlParseError> {
        self.advance(); // CREATE
        while self.eat_word("TEMPORARY") || self.eat_word("TEMP") || self.eat_word("UNLOGGED") {}

        match self.current() {
            Token::Table => {
                self.advance();
                self.parse_create_table(start)
            }
            Token::Unique => {
                self.advance();
                self.expect(Token::Index, "INDEX")?;
                self.parse_create_index(true)
            }
            Token::Index => {
                self.advance();
                self.parse_create_index(false)
            }
            _ => Err(SqlParseError::Unsupported(self.describe(start))),
        }
    }

    fn parse_create_table(&mut self, start: usize) -> Result<Vec<Statement>, SqlParseError> {
        self.eat_if_not_exists();
        let name = self.qualified_name("table name")?;
        if self.current() != &Token::LParen {
            return Err(SqlParseError::Unsupported(format!(
                "{} without column list",
                self.describe(start)
            )));
        }
        self.advance();

        let mut table = TableDef {
            name,
            comment: String::new(),
            columns: Vec::new(),
        };
        let mut extra = Vec::new();
        let mut constraint_name = String::new();

        loop {
            match self.current() {
                Token::RParen => {
                    self.advance();
                    break;
                }
                Token::Comma => {
                    self.advance();
                    constraint_name.clear();
                }
                Token::Constraint => {
                    self.advance();
                    if let Token::Ident(name) = self.current() {
                        constraint_name = name.clone();
                        self.advance();
                    }
                }
                Token::Primary => {
                    self.advance();
                    self.expect(Token::Key, "KEY")?;
                    let columns = self.parse_column_list()?;
                    extra.push(Statement::PrimaryKey {
                        table: table.name.clone(),
                        columns,
                    });
                }
                Token::Foreign => {
                    let fk = self.parse_foreign_key(&table.name, &constraint_name)?;
                    extra.push(Statement::ForeignKey(fk));
                }
                Token::Unique => {
                    self.advance();
                    if !self.eat(&Token::Key) {
                        self.eat(&Token::Index);
                    }
                    let mut name = std::mem::take(&mut constraint_name);
                    if let Token::Ident(index_name) = self.current() {
                        name = index_name.clone();
                        self.advance();
                    }
                    let columns = self.parse_column_list()?;
                    extra.push(Statement::Unique {
                        name,
                        table: table.name.clone(),
                        columns,
                    });
                }
                _ if self.at_keyword_column() => {
                    let (column, fk) = self.parse_column(&table.name, &constraint_name)?;
                    table.columns.push(column);
                    extra.extend(fk.map(Statement::ForeignKey));
                }
                Token::Index | Token::Key => {
                    self.advance();
                    let mut name = String::new();
                    if let Token::Ident(index_name) = self.current() {
                        name = index_name.clone();
                        self.advance();
                    }
                    if self.eat(&Token::Using) {
                        self.expect_ident("index method")?;
                    }
                    let columns = self.parse_index_columns()?;
                    extra.push(Statement::Index(IndexDef {
                        name,
                        table: table.name.clone(),
                        unique: false,
                        columns,
                    }));
                }
                Token::Check => {
                    self.advance();
                    self.skip_parenthesized();
                }
                Token::Ident(word)
                    if ["FULLTEXT", "SPATIAL", "EXCLUDE"]
                        .iter()
                        .any(|w| word.eq_ignore_ascii_case(w)) =>
                {
                    tracing::debug!(table = %table.name, %word, "skipping table element");
                    self.skip_table_element();
                }
                Token::Ident(_) => {
                    let (column, fk) = self.parse_column(&table.name, &constraint_name)?;
                    table.columns.push(column);
                    extra.extend(fk.map(Statement::ForeignKey));
                }
                Token::Eof => return Err(SqlParseError::UnexpectedEof),
                other => return Err(SqlParseError::UnexpectedToken(other.clone())),
            }
        }

        // Table options (ENGINE=InnoDB, COMMENT='...', ...)
        while !matches!(self.current(), Token::Semicolon | Token::Eof) {
            if self.eat(&Token::Comment) {
                self.eat(&Token::Op('='));
                if let Token::Str(text) = self.current() {
                    table.comment = text.clone();
                }
            }
            self.advance();
        }
        self.eat(&Token::Semicolon);

        let mut statements = vec![Statement::CreateTable(table)];
        statements.extend(extra);
        Ok(statements)
    }

    fn parse_column(
        &mut self,
        table: &str,
        constraint_name: &str,
    ) -> Result<(ColumnDef, Option<ForeignKeyDef>), SqlParseError> {
        let name = self.expect_ident("column name")?;
        let data_type = self.parse_data_type()?;

        let mut column = ColumnDef {
            name,
            data_type,
            default: String::new(),
            options: ColumnOptions::empty(),
            comment: String::new(),
        };
        let mut foreign_key = None;
        let mut fk_name = constraint_name.to_string();

        loop {
            match self.current() {
                Token::Comma | Token::RParen | Token::Semicolon | Token::Eof => break,
                Token::Constraint => {
                    self.advance();
                    if let Token::Ident(name) = self.current() {
                        fk_name = name.clone();
                        self.advance();
                    }
                }
                Token::Not => {
                    self.advance();
                    self.expect(Token::Null, "NULL")?;
                    column.options.insert(ColumnOptions::NOT_NULL);
                }
                Token::Null => {
                    self.advance();
                    column.options.remove(ColumnOptions::NOT_NULL);
                }
                Token::Primary => {
                    self.advance();
                    self.expect(Token::Key, "KEY")?;
                    column.options.insert(ColumnOptions::PRIMARY_KEY);
                }
                Token::Unique => {
                    self.advance();
                    self.eat(&Token::Key);
                    column.options.insert(ColumnOptions::UNIQUE);
                }
                Token::Default => {
                    self.advance();
                    column.default = self.parse_default_expression();
                }
                Token::AutoIncrement => {
                    self.advance();
                    column.options.insert(ColumnOptions::AUTO_INCREMENT);
                }
                Token::Generated => {
                    self.advance();
                    if self.parse_generated()? {
                        column.options.insert(ColumnOptions::AUTO_INCREMENT);
                    }
                }
                Token::References => {
                    self.advance();
                    let (ref_table, ref_columns) = self.parse_reference()?;
                    foreign_key = Some(ForeignKeyDef {
                        name: std::mem::take(&mut fk_name),
                        table: table.to_string(),
                        columns: vec![column.name.clone()],
                        ref_table,
                        ref_columns,
                    });
                }
                Token::Comment => {
                    self.advance();
                    self.eat(&Token::Op('='));
                    if let Token::Str(text) = self.current() {
                        column.comment = text.clone();
                        self.advance();
                    }
                }
                Token::Check => {
                    self.advance();
                    self.skip_parenthesized();
                }
                Token::On => self.skip_on_actions(),
                Token::LParen => self.skip_parenthesized(),
                _ => self.advance(),
            }
        }

        Ok((column, foreign_key))
    }

    /// Reads a data type: the longest catalog match, else a single word,
    /// followed by parameters, modifiers and array brackets.
    fn parse_data_type(&mut self) -> Result<String, SqlParseError> {
        let words = self.words_ahead(4);

        let mut base = None;
        let mut data_type = match self.catalog.match_words(&words) {
            Some((count, _)) => {
                let text = words[..count].join(" ");
                if count == 1 {
                    base = Some(text.clone());
                }
                for _ in 0..count {
                    self.advance();
                }
                text
            }
            None => {
                let parts = self.qualified_parts("data type")?;
                let text = parts.join(".");
                tracing::trace!(data_type = %text, "data type not in catalog");
                text
            }
        };

        if self.current() == &Token::LParen {
            data_type.push_str(&self.parse_type_parameters()?);
            if let Some(base) = base {
                let words = self.words_ahead(3);
                if let Some(count) = self.catalog.match_suffix(&base, &words) {
                    data_type.push(' ');
                    data_type.push_str(&words[..count].join(" "));
                    for _ in 0..count {
                        self.advance();
                    }
                }
            }
        }
        while let Token::Ident(word) = self.current() {
            if !self.catalog.is_modifier(word) {
                break;
            }
            data_type.push(' ');
            data_type.push_str(word);
            self.advance();
        }
        while self.eat(&Token::Brackets) {
            data_type.push_str("[]");
        }

        Ok(data_type)
    }

    /// `(255)`, `(10,2)` or `('a','b')`, written without spaces.
    fn parse_type_parameters(&mut self) -> Result<String, SqlParseError> {
        self.advance(); // (
        let mut out = String::from("(");
        loop {
            match self.current() {
                Token::RParen => {
                    self.advance();
                    break;
                }
                Token::Eof => return Err(SqlParseError::UnexpectedEof),
                Token::Comma => out.push(','),
                Token::Str(s) => out.push_str(&self.dialect.quote_literal(s)),
                Token::Ident(s) | Token::Num(s) => out.push_str(s),
                other => return Err(SqlParseError::UnexpectedToken(other.clone())),
            }
            self.advance();
        }
        out.push(')');
        Ok(out)
    }

    fn parse_default_expression(&mut self) -> String {
        let mut parts = Vec::new();
        let mut depth = 0usize;

        loop {
            let token = self.current().clone();
            match &token {
                Token::Eof | Token::Semicolon => break,
                Token::Comma if depth == 0 => break,
                Token::RParen if depth == 0 => break,
                Token::LParen => depth += 1,
                Token::RParen => depth -= 1,
                t if depth == 0 && !parts.is_empty() && ends_default(t) => break,
                _ => {}
            }
            parts.push(token);
            self.advance();
        }

        render(&parts, self.dialect)
    }

    /// After GENERATED. Returns whether the column is an identity column.
    fn parse_generated(&mut self) -> Result<bool, SqlParseError> {
        if !self.eat_word("ALWAYS") && self.eat_word("BY") {
            self.expect(Token::Default, "DEFAULT")?;
        }
        if !self.eat_word("AS") {
            return Err(self.expected("AS"));
        }
        if self.eat_word("IDENTITY") {
            if self.current() == &Token::LParen {
                self.skip_parenthesized();
            }
            return Ok(true);
        }
        // Computed column: GENERATED ALWAYS AS (expr) [STORED]
        self.skip_parenthesized();
        if !self.eat_word("STORED") {
            self.eat_word("VIRTUAL");
        }
        Ok(false)
    }

    fn parse_reference(&mut self) -> Result<(String, Vec<String>), SqlParseError> {
        let target = self.qualified_name("referenced table")?;
        let columns = if self.current() == &Token::LParen {
            self.parse_column_list()?
        } else {
            Vec::new()
        };
        self.skip_on_actions();
        Ok((target, columns))
    }

    fn parse_foreign_key(
        &mut self,
        table: &str,
        name: &str,
    ) -> Result<ForeignKeyDef, SqlParseError> {
        self.advance(); // FOREIGN
        self.expect(Token::Key, "KEY")?;
        let columns = self.parse_column_list()?;
        self.expect(Token::References, "REFERENCES")?;
        let (ref_table, ref_columns) = self.parse_reference()?;
        Ok(ForeignKeyDef {
            name: name.to_string(),
            table: table.to_string(),
            columns,
            ref_table,
            ref_columns,
        })
    }

    fn parse_alter(&mut self, start: usize) -> Result<Vec<Statement>, SqlParseError> {
        self.advance(); // ALTER
        if !self.eat(&Token::Table) {
            return Err(SqlParseError::Unsupported(self.describe(start)));
        }
        self.eat_if_exists();
        self.eat(&Token::Only);
        let table = self.qualified_name("table name")?;
        if !self.eat(&Token::Add) {
            return Err(SqlParseError::Unsupported(format!(
                "ALTER TABLE {table} {}",
                self.describe(self.pos)
            )));
        }

        let mut name = String::new();
        if self.eat(&Token::Constraint) {
            name = self.expect_ident("constraint name")?;
        }

        let statement = match self.current() {
            Token::Foreign => Statement::ForeignKey(self.parse_foreign_key(&table, &name)?),
            Token::Primary => {
                self.advance();
                self.expect(Token::Key, "KEY")?;
                Statement::PrimaryKey {
                    table,
                    columns: self.parse_column_list()?,
                }
            }
            Token::Unique => {
                self.advance();
                if !self.eat(&Token::Key) {
                    self.eat(&Token::Index);
                }
                Statement::Unique {
                    name,
                    table,
                    columns: self.parse_column_list()?,
                }
            }
            _ => {
                return Err(SqlParseError::Unsupported(format!(
                    "ALTER TABLE {table} ADD {}",
                    self.describe(self.pos)
                )));
            }
        };
        self.skip_statement();
        Ok(vec![statement])
    }

    fn eat_if_exists(&mut self) {
        if self.current() == &Token::If {
            self.advance();
            self.eat(&Token::Exists);
        }
    }

    fn parse_create_index(&mut self, unique: bool) -> Result<Vec<Statement>, SqlParseError> {
        self.eat_word("CONCURRENTLY");
        self.eat_if_not_exists();
        let name = if self.current() == &Token::On {
            String::new()
        } else {
            self.qualified_name("index name")?
        };
        self.expect(Token::On, "ON")?;
        self.eat(&Token::Only);
        let table = self.qualified_name("table name")?;
        if self.eat(&Token::Using) {
            self.expect_ident("index method")?;
        }
        let columns = self.parse_index_columns()?;
        self.skip_statement();

        Ok(vec![Statement::Index(IndexDef {
            name,
            table,
            unique,
            columns,
        })])
    }

    /// `(col [ASC|DESC] [NULLS FIRST|LAST], ...)`. Expressions are rejected.
    fn parse_index_columns(&mut self) -> Result<Vec<(String, OrderType)>, SqlParseError> {
        self.expect(Token::LParen, "(")?;
        let mut columns = Vec::new();

        loop {
            let name = match (self.name_at(0), self.current()) {
                (Some(name), _) if self.peek_at(1) != &Token::LParen => name,
                (Some(_), _) | (None, Token::LParen) => {
                    return Err(SqlParseError::Unsupported("expression index".to_string()));
                }
                (None, Token::Eof) => return Err(SqlParseError::UnexpectedEof),
                (None, other) => return Err(SqlParseError::UnexpectedToken(other.clone())),
            };
            self.advance();

            let mut order = OrderType::Asc;
            loop {
                match self.current() {
                    Token::Comma | Token::RParen | Token::Eof => break,
                    Token::Asc => order = OrderType::Asc,
                    Token::Desc => order = OrderType::Desc,
                    Token::LParen => {
                        // MySQL prefix length: col(10)
                        self.skip_parenthesized();
                        continue;
                    }
                    _ => {}
                }
                self.advance();
            }
            columns.push((name, order));

            match self.current() {
                Token::Comma => self.advance(),
                Token::RParen => {
                    self.advance();
                    break;
                }
                _ => return Err(SqlParseError::UnexpectedEof),
            }
        }

        Ok(columns)
    }

    fn parse_comment_on(&mut self, start: usize) -> Result<Vec<Statement>, SqlParseError> {
        self.advance(); // COMMENT
        self.expect(Token::On, "ON")?;
        let on_column = match self.current() {
            Token::Table => false,
            Token::Column => true,
            _ => {
                return Err(SqlParseError::Unsupported(format!(
                    "{} {}",
                    self.describe(start),
                    self.describe(self.pos)
                )));
            }
        };
        self.advance();

        let mut parts = self.qualified_parts("object name")?;
        let column = if on_column {
            if parts.len() < 2 {
                return Err(self.expected("table.column"));
            }
            parts.pop()
        } else {
            None
        };
        let table = parts.pop().ok_or(SqlParseError::UnexpectedEof)?;

        self.expect(Token::Is, "IS")?;
        let text = match self.current() {
            Token::Str(text) => text.clone(),
            Token::Null => String::new(),
            _ => return Err(self.expected("string literal")),
        };
        self.advance();
        self.skip_statement();

        Ok(vec![Statement::Comment {
            table,
            column,
            text,
        }])
    }

    fn parse_column_list(&mut self) -> Result<Vec<String>, SqlParseError> {
        self.expect(Token::LParen, "(")?;
        let mut cols = Vec::new();
        // Only the first word of each item names a column: `(id ASC, key)`.
        let mut at_item = true;

        loop {
            match self.current() {
                Token::Comma => {
                    self.advance();
                    at_item = true;
                }
                Token::LParen => self.skip_parenthesized(),
                Token::RParen => {
                    self.advance();
                    break;
                }
                Token::Eof => return Err(SqlParseError::UnexpectedEof),
                _ => {
                    if at_item {
                        if let Some(name) = self.name_at(0) {
                            cols.push(name);
                        }
                        at_item = false;
                    }
                    self.advance();
                }
            }
        }

        Ok(cols)
    }

    fn skip_on_actions(&mut self) {
        while self.current() == &Token::On {
            self.advance();
            // DELETE or UPDATE
            if matches!(self.current(), Token::Delete | Token::Update) {
                self.advance();
            }
            // Action: CASCADE, RESTRICT, SET NULL, SET DEFAULT, NO ACTION
            match self.current() {
                Token::Cascade | Token::Restrict => {
                    self.advance();
                }
                Token::Ident(s) if s.eq_ignore_ascii_case("SET") => {
                    self.advance();
                    if matches!(self.current(), Token::Null | Token::Default) {
                        self.advance();
                    }
                }
                Token::Ident(s) if s.eq_ignore_ascii_case("NO") => {
                    self.advance();
                    self.eat_word("ACTION");
                }
                _ => {}
            }
        }
    }

    /// Skips one table element, stopping before the `,` or `)` that ends it.
    fn skip_table_element(&mut self) {
        loop {
            match self.current() {
                Token::Comma | Token::RParen | Token::Semicolon | Token::Eof => break,
                Token::LParen => self.skip_parenthesized(),
                _ => self.advance(),
            }
        }
    }

    fn skip_parenthesized(&mut self) {
        if self.current() != &Token::LParen {
            return;
        }
        let mut depth = 0usize;
        loop {
            match self.current() {
                Token::LParen => depth += 1,
                Token::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        break;
                    }
                }
                Token::Eof => break,
                _ => {}
            }
            self.advance();
        }
    }

    fn skip_statement(&mut self) {
        while !matches!(self.current(), Token::Semicolon | Token::Eof) {
            self.advance();
        }
        self.eat(&Token::Semicolon);
    }
}

struct BuiltTable {
    table: Table,
    columns: Vec<Column>,
}

impl BuiltTable {
    fn find_column(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .or_else(|| {
                self.columns
                    .iter()
                    .position(|c| c.name.eq_ignore_ascii_case(name))
            })
    }

    fn column_ids(&self, names: &[String]) -> Result<Vec<String>, String> {
        names
            .iter()
            .map(|name| {
                self.find_column(name)
                    .map(|i| self.columns[i].id.clone())
                    .ok_or_else(|| format!("{}.{}", self.table.name, name))
            })
            .collect()
    }

    fn primary_key_ids(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.is_primary_key())
            .map(|c| c.id.clone())
            .collect()
    }
}

/// Resolves parsed definitions by name and emits entities.
struct Assembler<'i> {
    ids: &'i mut dyn IdSource,
    tables: Vec<BuiltTable>,
    diagnostics: Vec<Diagnostic>,
}

impl Assembler<'_> {
    fn unresolved(&mut self, line: usize, message: String) {
        tracing::debug!(line, %message, "unresolved ddl reference");
        self.diagnostics.push(Diagnostic {
            line,
            kind: DiagnosticKind::UnresolvedReference,
            message,
        });
    }

    fn find_table(&self, name: &str) -> Option<usize> {
        self.tables
            .iter()
            .position(|t| t.table.name == name)
            .or_else(|| {
                self.tables
                    .iter()
                    .position(|t| t.table.name.eq_ignore_ascii_case(name))
            })
    }

    fn assemble(&mut self, statements: Vec<(usize, Statement)>) -> Batch {
        let mut foreign_keys = Vec::new();
        let mut indexes = Vec::new();
        let mut deferred = Vec::new();

        for (line, statement) in statements {
            match statement {
                Statement::CreateTable(def) => self.add_table(line, def),
                Statement::ForeignKey(fk) => foreign_keys.push((line, fk)),
                Statement::Index(index) => indexes.push((line, index)),
                other => deferred.push((line, other)),
            }
        }

        for (line, statement) in deferred {
            match statement {
                Statement::PrimaryKey { table, columns } => {
                    self.mark_columns(line, &table, &columns, ColumnOptions::PRIMARY_KEY);
                }
                Statement::Unique {
                    name,
                    table,
                    columns,
                } => {
                    if columns.len() == 1 {
                        self.mark_columns(line, &table, &columns, ColumnOptions::UNIQUE);
                    } else {
                        let columns = columns.into_iter().map(|c| (c, OrderType::Asc)).collect();
                        indexes.push((
                            line,
                            IndexDef {
                                name,
                                table,
                                unique: true,
                                columns,
                            },
                        ));
                    }
                }
                Statement::Comment {
                    table,
                    column,
                    text,
                } => self.apply_comment(line, &table, column.as_deref(), text),
                _ => {}
            }
        }

        let mut batch = Batch::new();
        let relationships: Vec<Relationship> = foreign_keys
            .into_iter()
            .filter_map(|(line, fk)| self.build_relationship(line, fk))
            .collect();
        let built_indexes: Vec<(Index, Vec<IndexColumn>)> = indexes
            .into_iter()
            .filter_map(|(line, index)| self.build_index(line, index))
            .collect();

        for built in self.tables.drain(..) {
            batch.upsert(Entity::Table(built.table));
            for column in built.columns {
                batch.upsert(Entity::Column(column));
            }
        }
        for relationship in relationships {
            batch.upsert(Entity::Relationship(relationship));
        }
        for (index, index_columns) in built_indexes {
            batch.upsert(Entity::Index(index));
            for index_column in index_columns {
                batch.upsert(Entity::IndexColumn(index_column));
            }
        }
        batch
    }

    fn add_table(&mut self, line: usize, def: TableDef) {
        if let Some(existing) = self.find_table(&def.name) {
            let message = format!(
                "table {} is already defined",
                self.tables[existing].table.name
            );
            self.diagnostics.push(Diagnostic {
                line,
                kind: DiagnosticKind::Malformed,
                message,
            });
            return;
        }

        let mut table = Table::new(self.ids.next_id(EntityKind::Table), def.name);
        table.comment = def.comment;
        let columns: Vec<Column> = def
            .columns
            .into_iter()
            .map(|c| {
                let mut column = Column::new(
                    self.ids.next_id(EntityKind::Column),
                    table.id.clone(),
                    c.name,
                    c.data_type,
                )
                .with_options(c.options);
                column.default = c.default;
                column.comment = c.comment;
                column
            })
            .collect();
        table.column_ids = columns.iter().map(|c| c.id.clone()).collect();
        self.tables.push(BuiltTable { table, columns });
    }

    fn mark_columns(&mut self, line: usize, table: &str, names: &[String], option: ColumnOptions) {
        let Some(t) = self.find_table(table) else {
            self.unresolved(line, format!("unknown table {table}"));
            return;
        };
        for name in names {
            match self.tables[t].find_column(name) {
                Some(c) => self.tables[t].columns[c].options.insert(option),
                None => {
                    let message = format!("unknown column {table}.{name}");
                    self.unresolved(line, message);
                }
            }
        }
    }

    fn apply_comment(&mut self, line: usize, table: &str, column: Option<&str>, text: String) {
        let Some(t) = self.find_table(table) else {
            self.unresolved(line, format!("unknown table {table}"));
            return;
        };
        match column {
            None => self.tables[t].table.comment = text,
            Some(name) => match self.tables[t].find_column(name) {
                Some(c) => self.tables[t].columns[c].comment = text,
                None => self.unresolved(line, format!("unknown column {table}.{name}")),
            },
        }
    }

    fn build_relationship(&mut self, line: usize, fk: ForeignKeyDef) -> Option<Relationship> {
        let (Some(end), Some(start)) = (self.find_table(&fk.table), self.find_table(&fk.ref_table))
        else {
            self.unresolved(
                line,
                format!(
                    "foreign key from {} references unknown table {}",
                    fk.table, fk.ref_table
                ),
            );
            return None;
        };

        let end_ids = match self.tables[end].column_ids(&fk.columns) {
            Ok(ids) => ids,
            Err(name) => {
                self.unresolved(line, format!("unknown column {name}"));
                return None;
            }
        };
        let start_ids = if fk.ref_columns.is_empty() {
            self.tables[start].primary_key_ids()
        } else {
            match self.tables[start].column_ids(&fk.ref_columns) {
                Ok(ids) => ids,
                Err(name) => {
                    self.unresolved(line, format!("unknown column {name}"));
                    return None;
                }
            }
        };
        if end_ids.is_empty() || start_ids.len() != end_ids.len() {
            self.unresolved(
                line,
                format!(
                    "foreign key from {} to {} has mismatched columns",
                    fk.table, fk.ref_table
                ),
            );
            return None;
        }

        let end_table = &self.tables[end];
        let end_columns: Vec<&Column> = end_table
            .columns
            .iter()
            .filter(|c| end_ids.contains(&c.id))
            .collect();
        let identification = end_columns.iter().all(|c| c.is_primary_key());
        let primary_key = end_table.primary_key_ids();
        let one_to_one = match end_columns.as_slice() {
            [single] => single.options.contains(ColumnOptions::UNIQUE) || primary_key == end_ids,
            _ => {
                let mut sorted = end_ids.clone();
                sorted.sort();
                let mut pk_sorted = primary_key;
                pk_sorted.sort();
                sorted == pk_sorted
            }
        };
        let end_table_id = end_table.table.id.clone();
        let start_table_id = self.tables[start].table.id.clone();

        Some(Relationship {
            id: self.ids.next_id(EntityKind::Relationship),
            name: fk.name,
            identification,
            relationship_type: if one_to_one {
                RelationshipType::ZeroOne
            } else {
                RelationshipType::ZeroN
            },
            start_relationship_type: StartRelationshipType::Dash,
            start: RelationshipPoint::new(start_table_id, start_ids),
            end: RelationshipPoint::new(end_table_id, end_ids),
        })
    }

    fn build_index(&mut self, line: usize, def: IndexDef) -> Option<(Index, Vec<IndexColumn>)> {
        let Some(t) = self.find_table(&def.table) else {
            self.unresolved(line, format!("index on unknown table {}", def.table));
            return None;
        };
        let names: Vec<String> = def.columns.iter().map(|(name, _)| name.clone()).collect();
        let column_ids = match self.tables[t].column_ids(&names) {
            Ok(ids) => ids,
            Err(name) => {
                self.unresolved(line, format!("index on unknown column {name}"));
                return None;
            }
        };

        let index_id = self.ids.next_id(EntityKind::Index);
        let index_columns: Vec<IndexColumn> = column_ids
            .into_iter()
            .zip(def.columns)
            .map(|(column_id, (_, order_type))| IndexColumn {
                id: self.ids.next_id(EntityKind::IndexColumn),
                index_id: index_id.clone(),
                column_id,
                order_type,
            })
            .collect();

        let index = Index {
            id: index_id,
            name: def.name,
            table_id: self.tables[t].table.id.clone(),
            unique: def.unique,
            index_column_ids: index_columns.iter().map(|c| c.id.clone()).collect(),
        };
        Some((index, index_columns))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::EntityStore;

    fn parse_store(sql: &str, dialect: Dialect) -> (EntityStore, Vec<Diagnostic>) {
        let parsed = parse(sql, dialect);
        let mut store = EntityStore::new();
        store.apply(parsed.batch);
        (store, parsed.diagnostics)
    }

    fn column<'a>(store: &'a EntityStore, table: &str, name: &str) -> &'a Column {
        store
            .columns
            .iter()
            .find(|c| c.name == name && store.table(&c.table_id).unwrap().name == table)
            .unwrap()
    }

    #[test]
    fn test_simple_create_table() {
        let sql = r#"
            CREATE TABLE users (
                id INTEGER PRIMARY KEY,
                name VARCHAR(255) NOT NULL,
                email TEXT UNIQUE
            );
        "#;
        let (store, diagnostics) = parse_store(sql, Dialect::PostgreSQL);
        assert!(diagnostics.is_empty());
        assert_eq!(store.tables.len(), 1);

        let table = store.tables.iter().next().unwrap();
        assert_eq!(table.id, "table-1");
        assert_eq!(table.name, "users");
        assert_eq!(table.column_ids, vec!["column-1", "column-2", "column-3"]);

        assert!(column(&store, "users", "id").is_primary_key());
        let name = column(&store, "users", "name");
        assert_eq!(name.data_type, "VARCHAR(255)");
        assert!(name.options.contains(ColumnOptions::NOT_NULL));
        assert!(column(&store, "users", "email")
            .options
            .contains(ColumnOptions::UNIQUE));
    }

    #[test]
    fn test_multi_word_types() {
        let sql = r#"
            CREATE TABLE events (
                happened_at TIMESTAMP WITH TIME ZONE NOT NULL,
                score double precision,
                label character varying(40),
                tags text[]
            );
        "#;
        let (store, _) = parse_store(sql, Dialect::PostgreSQL);
        assert_eq!(
            column(&store, "events", "happened_at").data_type,
            "TIMESTAMP WITH TIME ZONE"
        );
        assert!(column(&store, "events", "happened_at")
            .options
            .contains(ColumnOptions::NOT_NULL));
        assert_eq!(column(&store, "events", "score").data_type, "double precision");
        assert_eq!(
            column(&store, "events", "label").data_type,
            "character varying(40)"
        );
        assert_eq!(column(&store, "events", "tags").data_type, "text[]");
    }

    #[test]
    fn test_defaults_are_reconstructed() {
        let sql = r#"
            CREATE TABLE orders (
                id integer DEFAULT nextval('orders_id_seq'::regclass) NOT NULL,
                status varchar(20) DEFAULT 'new',
                total numeric(10,2) DEFAULT 0,
                created_at timestamp DEFAULT now(),
                ratio real DEFAULT (1 + 2)
            );
        "#;
        let (store, _) = parse_store(sql, Dialect::PostgreSQL);
        assert_eq!(
            column(&store, "orders", "id").default,
            "nextval('orders_id_seq'::regclass)"
        );
        assert!(column(&store, "orders", "id")
            .options
            .contains(ColumnOptions::NOT_NULL));
        assert_eq!(column(&store, "orders", "status").default, "'new'");
        assert_eq!(column(&store, "orders", "total").data_type, "numeric(10,2)");
        assert_eq!(column(&store, "orders", "total").default, "0");
        assert_eq!(column(&store, "orders", "created_at").default, "now()");
        assert_eq!(column(&store, "orders", "ratio").default, "(1 + 2)");
    }

    #[test]
    fn test_identity_and_auto_increment() {
        let pg = "CREATE TABLE t (id BIGINT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY);";
        let (store, _) = parse_store(pg, Dialect::PostgreSQL);
        let id = column(&store, "t", "id");
        assert!(id.options.contains(ColumnOptions::AUTO_INCREMENT));
        assert!(id.is_primary_key());

        let mysql = "CREATE TABLE `t` (`id` INT UNSIGNED NOT NULL AUTO_INCREMENT, PRIMARY KEY (`id`)) ENGINE=InnoDB;";
        let (store, diagnostics) = parse_store(mysql, Dialect::MySQL);
        assert!(diagnostics.is_empty());
        let id = column(&store, "t", "id");
        assert_eq!(id.data_type, "INT UNSIGNED");
        assert!(id.options.contains(ColumnOptions::AUTO_INCREMENT));
        assert!(id.is_primary_key());
    }

    #[test]
    fn test_unsupported_statement_is_skipped() {
        let sql = r#"
CREATE VIEW active_users AS SELECT * FROM users;
CREATE TABLE users (id INT);
"#;
        let (store, diagnostics) = parse_store(sql, Dialect::PostgreSQL);
        assert_eq!(store.tables.len(), 1);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::Unsupported);
        assert_eq!(diagnostics[0].line, 2);
        assert!(diagnostics[0].message.contains("CREATE VIEW"));
    }

    #[test]
    fn test_malformed_statement_does_not_stop_parsing() {
        let sql = r#"
CREATE TABLE broken (id INT NOT 5);
CREATE TABLE ok (id INT);
"#;
        let (store, diagnostics) = parse_store(sql, Dialect::PostgreSQL);
        assert_eq!(store.tables.len(), 1);
        assert_eq!(store.tables.iter().next().unwrap().name, "ok");
        assert_eq!(diagnostics[0].kind, DiagnosticKind::Malformed);
    }

    #[test]
    fn test_alter_table_foreign_key() {
        let sql = r#"
            CREATE TABLE users (id INT NOT NULL, PRIMARY KEY (id));
            CREATE TABLE orders (id INT PRIMARY KEY, user_id INT);
            ALTER TABLE ONLY public.orders
              ADD CONSTRAINT fk_orders_user FOREIGN KEY (user_id) REFERENCES users (id)
              ON DELETE CASCADE;
        "#;
        let (store, diagnostics) = parse_store(sql, Dialect::PostgreSQL);
        assert!(diagnostics.is_empty());
        let relationship = store.relationships.iter().next().unwrap();
        assert_eq!(relationship.name, "fk_orders_user");
        assert_eq!(store.table(&relationship.start.table_id).unwrap().name, "users");
        assert_eq!(store.table(&relationship.end.table_id).unwrap().name, "orders");
        assert_eq!(
            store.column(&relationship.end.column_ids[0]).unwrap().name,
            "user_id"
        );
        assert!(!relationship.identification);
        assert_eq!(relationship.relationship_type, RelationshipType::ZeroN);
    }

    #[test]
    fn test_inline_reference_defaults_to_primary_key() {
        let sql = r#"
            CREATE TABLE users (id INT PRIMARY KEY);
            CREATE TABLE profiles (user_id INT PRIMARY KEY REFERENCES users);
        "#;
        let (store, diagnostics) = parse_store(sql, Dialect::PostgreSQL);
        assert!(diagnostics.is_empty());
        let relationship = store.relationships.iter().next().unwrap();
        assert!(relationship.identification);
        assert_eq!(relationship.relationship_type, RelationshipType::ZeroOne);
        assert_eq!(relationship.name, "");
    }

    #[test]
    fn test_unresolved_foreign_key_is_reported() {
        let sql = r#"
CREATE TABLE orders (id INT, user_id INT);
ALTER TABLE orders ADD FOREIGN KEY (user_id) REFERENCES users (id);
"#;
        let (store, diagnostics) = parse_store(sql, Dialect::PostgreSQL);
        assert_eq!(store.relationships.len(), 0);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::UnresolvedReference);
        assert_eq!(diagnostics[0].line, 3);
    }

    #[test]
    fn test_indexes() {
        let sql = r#"
            CREATE TABLE users (id INT, email TEXT, name TEXT, UNIQUE (email, name));
            CREATE UNIQUE INDEX IF NOT EXISTS idx_email ON public.users USING btree (email DESC);
            CREATE INDEX ON users (name);
            CREATE INDEX idx_lower ON users (lower(email));
        "#;
        let (store, diagnostics) = parse_store(sql, Dialect::PostgreSQL);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::Unsupported);

        let indexes: Vec<&Index> = store.indexes.iter().collect();
        assert_eq!(indexes.len(), 3);
        assert!(indexes.iter().filter(|i| i.unique).count() == 2);

        let by_name = indexes.iter().find(|i| i.name == "idx_email").unwrap();
        let index_column = store.index_column(&by_name.index_column_ids[0]).unwrap();
        assert_eq!(index_column.order_type, OrderType::Desc);
        assert_eq!(index_column.index_id, by_name.id);
        assert_eq!(store.column(&index_column.column_id).unwrap().name, "email");
    }

    #[test]
    fn test_comments() {
        let pg = r#"
            CREATE TABLE users (id INT, email TEXT);
            COMMENT ON TABLE public.users IS 'people';
            COMMENT ON COLUMN users.email IS 'it''s private';
            COMMENT ON COLUMN users.missing IS 'nope';
        "#;
        let (store, diagnostics) = parse_store(pg, Dialect::PostgreSQL);
        assert_eq!(store.tables.iter().next().unwrap().comment, "people");
        assert_eq!(column(&store, "users", "email").comment, "it's private");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::UnresolvedReference);

        let mysql = r"CREATE TABLE `users` (`id` INT COMMENT 'key\'s') COMMENT = 'people';";
        let (store, diagnostics) = parse_store(mysql, Dialect::MySQL);
        assert!(diagnostics.is_empty());
        assert_eq!(store.tables.iter().next().unwrap().comment, "people");
        assert_eq!(column(&store, "users", "id").comment, "key's");
    }

    #[test]
    fn test_mysql_keys() {
        let sql = r#"
CREATE TABLE `posts` (
  `id` int(11) NOT NULL AUTO_INCREMENT,
  `author_id` int(11) NOT NULL,
  `title` varchar(255) CHARACTER SET utf8mb4 DEFAULT NULL,
  PRIMARY KEY (`id`),
  UNIQUE KEY `uq_title` (`title`),
  KEY `idx_author` (`author_id`),
  FULLTEXT KEY `ft_title` (`title`),
  CONSTRAINT `fk_author` FOREIGN KEY (`author_id`) REFERENCES `posts` (`id`) ON DELETE CASCADE
) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;
"#;
        let (store, diagnostics) = parse_store(sql, Dialect::Auto);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert_eq!(column(&store, "posts", "id").data_type, "int(11)");
        assert_eq!(column(&store, "posts", "title").default, "NULL");
        assert!(column(&store, "posts", "title")
            .options
            .contains(ColumnOptions::UNIQUE));
        assert_eq!(store.indexes.len(), 1);
        assert_eq!(store.indexes.iter().next().unwrap().name, "idx_author");
        assert_eq!(store.relationships.iter().next().unwrap().name, "fk_author");
    }

    #[test]
    fn test_duplicate_table_is_reported() {
        let sql = "CREATE TABLE t (a INT);\nCREATE TABLE t (b INT);";
        let (store, diagnostics) = parse_store(sql, Dialect::PostgreSQL);
        assert_eq!(store.tables.len(), 1);
        assert_eq!(store.columns.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::Malformed);
        assert_eq!(diagnostics[0].line, 2);
    }

    #[test]
    fn test_render_spacing() {
        let tokens = vec![
            Token::Ident("coalesce".into()),
            Token::LParen,
            Token::Ident("a".into()),
            Token::Comma,
            Token::Str("x".into()),
            Token::RParen,
            Token::DoubleColon,
            Token::Ident("text".into()),
        ];
        assert_eq!(render(&tokens, Dialect::PostgreSQL), "coalesce(a, 'x')::text");
    }

    #[test]
    fn test_parameterized_types_keep_trailing_words() {
        let sql = "CREATE TABLE e (at timestamp(6) with time zone NOT NULL, t time(3) without time zone);";
        let (store, diagnostics) = parse_store(sql, Dialect::PostgreSQL);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");

        let at = column(&store, "e", "at");
        assert_eq!(at.data_type, "timestamp(6) with time zone");
        assert!(at.options.contains(ColumnOptions::NOT_NULL));
        assert_eq!(column(&store, "e", "t").data_type, "time(3) without time zone");
    }

    #[test]
    fn test_keywords_as_column_names() {
        let sql = r#"
            CREATE TABLE notes (
                id INT,
                comment TEXT,
                key TEXT NOT NULL,
                index integer,
                Desc VARCHAR(20),
                PRIMARY KEY (id ASC, key)
            );
            CREATE INDEX idx_comment ON notes (comment DESC);
        "#;
        let (store, diagnostics) = parse_store(sql, Dialect::PostgreSQL);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert_eq!(store.tables.len(), 1);

        let names: Vec<&str> = store.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "comment", "key", "index", "Desc"]);
        assert_eq!(column(&store, "notes", "Desc").data_type, "VARCHAR(20)");
        assert!(column(&store, "notes", "key").is_primary_key());
        assert!(column(&store, "notes", "key")
            .options
            .contains(ColumnOptions::NOT_NULL));
        assert_eq!(store.indexes.iter().next().unwrap().name, "idx_comment");
    }

    #[test]
    fn test_mysql_key_still_opens_an_index() {
        let sql = "CREATE TABLE t (a INT, key VARCHAR(10), KEY idx_a (a), INDEX (key));";
        let (store, diagnostics) = parse_store(sql, Dialect::MySQL);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert_eq!(column(&store, "t", "key").data_type, "VARCHAR(10)");
        assert_eq!(store.columns.len(), 2);
        assert_eq!(store.indexes.len(), 2);
        assert_eq!(store.index_columns.len(), 2);
    }

    #[test]
    fn test_multi_character_operators_in_defaults() {
        let sql = r#"
            CREATE TABLE t (
                label text DEFAULT 'x' || 'y',
                ok boolean DEFAULT 1 >= 0,
                other boolean DEFAULT (a <> b)
            );
        "#;
        let (store, _) = parse_store(sql, Dialect::PostgreSQL);
        assert_eq!(column(&store, "t", "label").default, "'x' || 'y'");
        assert_eq!(column(&store, "t", "ok").default, "1 >= 0");
        assert_eq!(column(&store, "t", "other").default, "(a <> b)");
    }

    #[test]
    fn test_escaped_delimiters_in_names() {
        let sql = r#"CREATE TABLE "my""table" (`a``b` INT);"#;
        let (store, diagnostics) = parse_store(sql, Dialect::PostgreSQL);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert_eq!(store.tables.iter().next().unwrap().name, "my\"table");
        assert_eq!(store.columns.iter().next().unwrap().name, "a`b");
    }
}
