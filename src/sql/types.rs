//! Per-dialect catalog of recognized data type keywords.
//!
//! The parser walks the catalog to decide how many words belong to a
//! column's type. Multi-word types must be tried before any shorter type
//! sharing their first word, so [`TypeCatalog::keywords`] is ordered by word
//! count, then length, descending.

use super::Dialect;

/// https://www.postgresql.org/docs/current/datatype.html
const POSTGRESQL_TYPES: &[&str] = &[
    "BIGINT",
    "BIGSERIAL",
    "BIT VARYING",
    "BIT",
    "BOOL",
    "BOOLEAN",
    "BOX",
    "BYTEA",
    "CHAR",
    "CHARACTER VARYING",
    "CHARACTER",
    "CIDR",
    "CIRCLE",
    "DATE",
    "DECIMAL",
    "DOUBLE PRECISION",
    "FLOAT4",
    "FLOAT8",
    "INET",
    "INT",
    "INT2",
    "INT4",
    "INT8",
    "INTEGER",
    "INTERVAL",
    "JSON",
    "JSONB",
    "LINE",
    "LSEG",
    "MACADDR",
    "MACADDR8",
    "MONEY",
    "NUMERIC",
    "PATH",
    "PG_LSN",
    "POINT",
    "POLYGON",
    "REAL",
    "SERIAL",
    "SERIAL2",
    "SERIAL4",
    "SERIAL8",
    "SMALLINT",
    "SMALLSERIAL",
    "TEXT",
    "TIME WITH TIME ZONE",
    "TIME WITHOUT TIME ZONE",
    "TIME",
    "TIMESTAMP WITH TIME ZONE",
    "TIMESTAMP WITHOUT TIME ZONE",
    "TIMESTAMP",
    "TIMESTAMPTZ",
    "TIMETZ",
    "TSQUERY",
    "TSVECTOR",
    "TXID_SNAPSHOT",
    "UUID",
    "VARBIT",
    "VARCHAR",
    "XML",
];

/// https://dev.mysql.com/doc/refman/8.0/en/data-types.html
const MYSQL_TYPES: &[&str] = &[
    "BIGINT",
    "BINARY",
    "BIT",
    "BLOB",
    "BOOL",
    "BOOLEAN",
    "CHAR",
    "DATE",
    "DATETIME",
    "DEC",
    "DECIMAL",
    "DOUBLE PRECISION",
    "DOUBLE",
    "ENUM",
    "FIXED",
    "FLOAT",
    "GEOMETRY",
    "GEOMETRYCOLLECTION",
    "INT",
    "INTEGER",
    "JSON",
    "LINESTRING",
    "LONGBLOB",
    "LONGTEXT",
    "MEDIUMBLOB",
    "MEDIUMINT",
    "MEDIUMTEXT",
    "MULTILINESTRING",
    "MULTIPOINT",
    "MULTIPOLYGON",
    "NUMERIC",
    "POINT",
    "POLYGON",
    "REAL",
    "SET",
    "SMALLINT",
    "TEXT",
    "TIME",
    "TIMESTAMP",
    "TINYBLOB",
    "TINYINT",
    "TINYTEXT",
    "VARBINARY",
    "VARCHAR",
    "YEAR",
];

/// Words that may trail a MySQL numeric type and belong to it.
const MYSQL_TYPE_MODIFIERS: &[&str] = &["UNSIGNED", "ZEROFILL", "SIGNED"];

#[derive(Debug, Clone)]
pub struct TypeCatalog {
    keywords: Vec<&'static str>,
    modifiers: &'static [&'static str],
}

impl TypeCatalog {
    pub fn for_dialect(dialect: Dialect) -> Self {
        let (source, modifiers): (&[&str], &[&str]) = match dialect.concrete() {
            Dialect::MySQL => (MYSQL_TYPES, MYSQL_TYPE_MODIFIERS),
            _ => (POSTGRESQL_TYPES, &[]),
        };

        let mut keywords = source.to_vec();
        keywords.sort_by(|a, b| {
            word_count(b)
                .cmp(&word_count(a))
                .then(b.len().cmp(&a.len()))
                .then(a.cmp(b))
        });

        Self {
            keywords,
            modifiers,
        }
    }

    /// Keywords in match order: most words first, then longest first.
    pub fn keywords(&self) -> &[&'static str] {
        &self.keywords
    }

    /// Longest keyword made of the leading `words`, compared
    /// case-insensitively. Returns how many words it spans.
    pub fn match_words(&self, words: &[&str]) -> Option<(usize, &'static str)> {
        self.keywords.iter().find_map(|keyword| {
            let parts: Vec<&str> = keyword.split(' ').collect();
            let matched = parts.len() <= words.len()
                && parts
                    .iter()
                    .zip(words)
                    .all(|(part, word)| part.eq_ignore_ascii_case(word));
            matched.then_some((parts.len(), *keyword))
        })
    }

    /// Words that continue `base` after its parameters, as in
    /// `TIMESTAMP(6) WITH TIME ZONE`. Returns how many of `words` complete
    /// the longest keyword starting with `base`.
    pub fn match_suffix(&self, base: &str, words: &[&str]) -> Option<usize> {
        self.keywords.iter().find_map(|keyword| {
            let mut parts = keyword.split(' ');
            if !parts.next()?.eq_ignore_ascii_case(base) {
                return None;
            }
            let tail: Vec<&str> = parts.collect();
            let matched = !tail.is_empty()
                && tail.len() <= words.len()
                && tail
                    .iter()
                    .zip(words)
                    .all(|(part, word)| part.eq_ignore_ascii_case(word));
            matched.then_some(tail.len())
        })
    }

    /// Whether `word` is a modifier that extends the preceding type.
    pub fn is_modifier(&self, word: &str) -> bool {
        self.modifiers.iter().any(|m| m.eq_ignore_ascii_case(word))
    }

    /// Whether the base keyword of a stored type string is in the catalog.
    /// Parameters, array brackets and modifiers are ignored.
    pub fn contains(&self, data_type: &str) -> bool {
        let base = data_type.split(['(', '[']).next().unwrap_or(data_type);
        let words: Vec<&str> = base
            .split_whitespace()
            .filter(|w| !self.is_modifier(w))
            .collect();
        if words.is_empty() {
            return false;
        }
        matches!(self.match_words(&words), Some((n, _)) if n == words.len())
    }
}

fn word_count(keyword: &str) -> usize {
    keyword.split(' ').count()
}
