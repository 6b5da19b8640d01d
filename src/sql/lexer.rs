//! SQL lexer for tokenizing DDL statements.

use std::iter::Peekable;
use std::str::Chars;

/// SQL token types.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords
    Create,
    Alter,
    Add,
    Table,
    Only,
    Primary,
    Key,
    Foreign,
    References,
    Not,
    Null,
    Unique,
    Default,
    On,
    Delete,
    Update,
    Cascade,
    Restrict,
    Constraint,
    Index,
    If,
    Exists,
    AutoIncrement,
    Generated,
    Check,
    Comment,
    Is,
    Column,
    Using,
    Asc,
    Desc,

    // Identifiers and literals
    Ident(String),
    Str(String),
    Num(String),

    // Symbols
    LParen,
    RParen,
    Comma,
    Semicolon,
    Dot,
    /// `::` cast
    DoubleColon,
    /// `[]` array suffix
    Brackets,
    /// Any other operator character, kept for default expressions.
    Op(char),

    // End of input
    Eof,
}

impl Token {
    /// Source spelling of a keyword token, used to rebuild expressions.
    pub fn keyword_text(&self) -> Option<&'static str> {
        let text = match self {
            Token::Create => "CREATE",
            Token::Alter => "ALTER",
            Token::Add => "ADD",
            Token::Table => "TABLE",
            Token::Only => "ONLY",
            Token::Primary => "PRIMARY",
            Token::Key => "KEY",
            Token::Foreign => "FOREIGN",
            Token::References => "REFERENCES",
            Token::Not => "NOT",
            Token::Null => "NULL",
            Token::Unique => "UNIQUE",
            Token::Default => "DEFAULT",
            Token::On => "ON",
            Token::Delete => "DELETE",
            Token::Update => "UPDATE",
            Token::Cascade => "CASCADE",
            Token::Restrict => "RESTRICT",
            Token::Constraint => "CONSTRAINT",
            Token::Index => "INDEX",
            Token::If => "IF",
            Token::Exists => "EXISTS",
            Token::AutoIncrement => "AUTO_INCREMENT",
            Token::Generated => "GENERATED",
            Token::Check => "CHECK",
            Token::Comment => "COMMENT",
            Token::Is => "IS",
            Token::Column => "COLUMN",
            Token::Using => "USING",
            Token::Asc => "ASC",
            Token::Desc => "DESC",
            _ => return None,
        };
        Some(text)
    }
}

/// A token with the 1-based line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub line: usize,
    /// Source spelling of a keyword token, for keywords used as names.
    pub word: Option<String>,
}

/// SQL lexer.
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    current_char: Option<char>,
    line: usize,
    start_line: usize,
    word: Option<String>,
    backslash_escapes: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut chars = input.chars().peekable();
        let current_char = chars.next();
        Self {
            chars,
            current_char,
            line: 1,
            start_line: 1,
            word: None,
            backslash_escapes: false,
        }
    }

    /// Treat `\` inside string literals as an escape (MySQL).
    pub fn with_backslash_escapes(mut self, enabled: bool) -> Self {
        self.backslash_escapes = enabled;
        self
    }

    fn advance(&mut self) {
        if self.current_char == Some('\n') {
            self.line += 1;
        }
        self.current_char = self.chars.next();
    }

    fn peek(&mut self) -> Option<&char> {
        self.chars.peek()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.current_char {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.current_char {
            if c == '\n' {
                self.advance();
                break;
            }
            self.advance();
        }
    }

    fn skip_block_comment(&mut self) {
        self.advance(); // skip *
        while let Some(c) = self.current_char {
            if c == '*' {
                self.advance();
                if self.current_char == Some('/') {
                    self.advance();
                    break;
                }
            } else {
                self.advance();
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut ident = String::new();
        while let Some(c) = self.current_char {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                ident.push(c);
                self.advance();
            } else {
                break;
            }
        }
        ident
    }

    fn read_quoted_identifier(&mut self, close: char) -> String {
        self.advance(); // skip opening quote
        let mut ident = String::new();
        while let Some(c) = self.current_char {
            if c == close {
                // Check for escaped quote (doubled)
                if self.peek() == Some(&close) {
                    ident.push(c);
                    self.advance();
                    self.advance();
                } else {
                    self.advance(); // skip closing quote
                    break;
                }
            } else {
                ident.push(c);
                self.advance();
            }
        }
        ident
    }

    fn read_string(&mut self) -> String {
        self.advance(); // skip opening quote
        let mut s = String::new();
        while let Some(c) = self.current_char {
            if c == '\'' {
                // Check for escaped quote
                if self.peek() == Some(&'\'') {
                    s.push(c);
                    self.advance();
                    self.advance();
                } else {
                    self.advance(); // skip closing quote
                    break;
                }
            } else if c == '\\' && self.backslash_escapes {
                self.advance();
                if let Some(escaped) = self.current_char {
                    match escaped {
                        'n' => s.push('\n'),
                        't' => s.push('\t'),
                        'r' => s.push('\r'),
                        _ => s.push(escaped),
                    }
                    self.advance();
                }
            } else {
                s.push(c);
                self.advance();
            }
        }
        s
    }

    fn read_number(&mut self) -> String {
        let mut num = String::new();
        let mut has_dot = false;

        // Handle negative sign
        if self.current_char == Some('-') {
            num.push('-');
            self.advance();
        }

        while let Some(c) = self.current_char {
            if c.is_ascii_digit() {
                num.push(c);
                self.advance();
            } else if c == '.' && !has_dot {
                has_dot = true;
                num.push(c);
                self.advance();
            } else {
                break;
            }
        }
        num
    }

    fn keyword_or_ident(&self, s: &str) -> Token {
        match s.to_uppercase().as_str() {
            "CREATE" => Token::Create,
            "ALTER" => Token::Alter,
            "ADD" => Token::Add,
            "TABLE" => Token::Table,
            "ONLY" => Token::Only,
            "PRIMARY" => Token::Primary,
            "KEY" => Token::Key,
            "FOREIGN" => Token::Foreign,
            "REFERENCES" => Token::References,
            "NOT" => Token::Not,
            "NULL" => Token::Null,
            "UNIQUE" => Token::Unique,
            "DEFAULT" => Token::Default,
            "ON" => Token::On,
            "DELETE" => Token::Delete,
            "UPDATE" => Token::Update,
            "CASCADE" => Token::Cascade,
            "RESTRICT" => Token::Restrict,
            "CONSTRAINT" => Token::Constraint,
            "INDEX" => Token::Index,
            "IF" => Token::If,
            "EXISTS" => Token::Exists,
            "AUTO_INCREMENT" | "AUTOINCREMENT" => Token::AutoIncrement,
            "GENERATED" => Token::Generated,
            "CHECK" => Token::Check,
            "COMMENT" => Token::Comment,
            "IS" => Token::Is,
            "COLUMN" => Token::Column,
            "USING" => Token::Using,
            "ASC" => Token::Asc,
            "DESC" => Token::Desc,
            _ => Token::Ident(s.to_string()),
        }
    }

    pub fn next_token(&mut self) -> Token {
        loop {
            self.skip_whitespace();
            self.start_line = self.line;
            self.word = None;

            match self.current_char {
                None => return Token::Eof,

                Some('-') => {
                    if self.peek() == Some(&'-') {
                        self.skip_line_comment();
                        continue;
                    } else if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                        return Token::Num(self.read_number());
                    } else {
                        self.advance();
                        return Token::Op('-');
                    }
                }

                Some('/') => {
                    if self.peek() == Some(&'*') {
                        self.advance();
                        self.skip_block_comment();
                        continue;
                    } else {
                        self.advance();
                        return Token::Op('/');
                    }
                }

                Some('#') => {
                    self.skip_line_comment();
                    continue;
                }

                Some(':') => {
                    self.advance();
                    if self.current_char == Some(':') {
                        self.advance();
                        return Token::DoubleColon;
                    }
                    return Token::Op(':');
                }

                Some('(') => {
                    self.advance();
                    return Token::LParen;
                }
                Some(')') => {
                    self.advance();
                    return Token::RParen;
                }
                Some(',') => {
                    self.advance();
                    return Token::Comma;
                }
                Some(';') => {
                    self.advance();
                    return Token::Semicolon;
                }
                Some('.') => {
                    self.advance();
                    return Token::Dot;
                }

                Some('"') => {
                    let ident = self.read_quoted_identifier('"');
                    return Token::Ident(ident);
                }
                Some('`') => {
                    let ident = self.read_quoted_identifier('`');
                    return Token::Ident(ident);
                }
                Some('[') => {
                    if self.peek() == Some(&']') {
                        self.advance();
                        self.advance();
                        return Token::Brackets;
                    }
                    // SQL Server style [identifier]
                    let ident = self.read_quoted_identifier(']');
                    return Token::Ident(ident);
                }

                Some('\'') => {
                    let s = self.read_string();
                    return Token::Str(s);
                }

                Some(c) if c.is_ascii_digit() => {
                    return Token::Num(self.read_number());
                }

                Some(c) if c.is_alphabetic() || c == '_' => {
                    let ident = self.read_identifier();
                    let token = self.keyword_or_ident(&ident);
                    if token.keyword_text().is_some() {
                        self.word = Some(ident);
                    }
                    return token;
                }

                Some(c) => {
                    self.advance();
                    return Token::Op(c);
                }
            }
        }
    }

    /// Collect all tokens with their starting lines.
    pub fn tokenize(&mut self) -> Vec<Spanned> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token == Token::Eof;
            tokens.push(Spanned {
                token,
                line: self.start_line,
                word: self.word.take(),
            });
            if done {
                break;
            }
        }
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(sql: &str) -> Vec<Token> {
        Lexer::new(sql).tokenize().into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn test_simple_create_table() {
        let tokens = tokens("CREATE TABLE users (id INT);");

        assert_eq!(tokens[0], Token::Create);
        assert_eq!(tokens[1], Token::Table);
        assert_eq!(tokens[2], Token::Ident("users".to_string()));
        assert_eq!(tokens[3], Token::LParen);
        assert_eq!(tokens[4], Token::Ident("id".to_string()));
        assert_eq!(tokens[5], Token::Ident("INT".to_string()));
        assert_eq!(tokens[6], Token::RParen);
        assert_eq!(tokens[7], Token::Semicolon);
        assert_eq!(tokens[8], Token::Eof);
    }

    #[test]
    fn test_quoted_identifiers() {
        let tokens = tokens(r#"CREATE TABLE "User Table" (`column name` INT, [key] INT);"#);

        assert_eq!(tokens[2], Token::Ident("User Table".to_string()));
        assert_eq!(tokens[4], Token::Ident("column name".to_string()));
        assert_eq!(tokens[7], Token::Ident("key".to_string()));
    }

    #[test]
    fn test_comments() {
        let tokens = tokens("-- comment\nCREATE /* block */ TABLE t (id INT);");

        assert_eq!(tokens[0], Token::Create);
        assert_eq!(tokens[1], Token::Table);
    }

    #[test]
    fn test_array_suffix_and_cast() {
        let tokens = tokens("tags text[] DEFAULT '{}'::text[]");

        assert_eq!(tokens[2], Token::Brackets);
        assert_eq!(tokens[4], Token::Str("{}".to_string()));
        assert_eq!(tokens[5], Token::DoubleColon);
        assert_eq!(tokens[7], Token::Brackets);
    }

    #[test]
    fn test_string_escapes() {
        let sql = r"'it''s' 'a\nb'";
        assert_eq!(
            tokens(sql)[..2],
            [Token::Str("it's".to_string()), Token::Str(r"a\nb".to_string())]
        );

        let mysql: Vec<Token> = Lexer::new(sql)
            .with_backslash_escapes(true)
            .tokenize()
            .into_iter()
            .map(|s| s.token)
            .collect();
        assert_eq!(mysql[1], Token::Str("a\nb".to_string()));
    }

    #[test]
    fn test_line_numbers() {
        let spans = Lexer::new("CREATE\n\nTABLE t;").tokenize();
        assert_eq!(spans[0].line, 1);
        assert_eq!(spans[1].line, 3);
    }

    #[test]
    fn test_keyword_spelling_is_kept() {
        let spans = Lexer::new("comment Key \"index\"").tokenize();
        assert_eq!(spans[0].token, Token::Comment);
        assert_eq!(spans[0].word.as_deref(), Some("comment"));
        assert_eq!(spans[1].word.as_deref(), Some("Key"));
        assert_eq!(spans[2].token, Token::Ident("index".to_string()));
        assert_eq!(spans[2].word, None);
    }
}
