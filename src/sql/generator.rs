//! DDL generation from an entity store snapshot.
//!
//! Output is a pure function of the store and the options. Tables are
//! emitted by name, then comments, then foreign keys, then indexes. Every
//! statement block is followed by one blank line.

use serde::{Deserialize, Serialize};

use super::dialect::{BracketStyle, CommentStyle, Dialect};
use super::types::TypeCatalog;
use crate::measure::{ColumnWidths, pad, text_width};
use crate::model::{Column, ColumnOptions, Index, Relationship, Table};
use crate::naming::NameAllocator;
use crate::store::{EntityKind, EntityStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerateOptions {
    pub dialect: Dialect,
    /// Identifier quoting; the dialect's default when unset.
    pub bracket: Option<BracketStyle>,
}

impl GenerateOptions {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            bracket: None,
        }
    }

    pub fn with_bracket(mut self, bracket: BracketStyle) -> Self {
        self.bracket = Some(bracket);
        self
    }

    pub fn bracket(&self) -> BracketStyle {
        self.bracket.unwrap_or_else(|| self.dialect.default_bracket())
    }
}

/// Why a statement was left out of the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    UnresolvedStartTable,
    UnresolvedEndTable,
    UnresolvedTable,
    NoResolvableColumns,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedStatement {
    pub kind: EntityKind,
    pub id: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    pub sql: String,
    pub skipped: Vec<SkippedStatement>,
}

/// Generate DDL text for the whole store.
pub fn generate(store: &EntityStore, options: &GenerateOptions) -> String {
    generate_report(store, options).sql
}

/// Like [`generate`], also listing relationships and indexes that were
/// dropped because their references did not resolve.
pub fn generate_report(store: &EntityStore, options: &GenerateOptions) -> Generated {
    let mut generator = Generator::new(store, options);
    generator.run();
    Generated {
        sql: generator.buffer.join("\n"),
        skipped: generator.skipped,
    }
}

struct Generator<'a> {
    store: &'a EntityStore,
    dialect: Dialect,
    bracket: BracketStyle,
    catalog: TypeCatalog,
    buffer: Vec<String>,
    skipped: Vec<SkippedStatement>,
}

impl<'a> Generator<'a> {
    fn new(store: &'a EntityStore, options: &GenerateOptions) -> Self {
        let dialect = options.dialect.concrete();
        Self {
            store,
            dialect,
            bracket: options.bracket(),
            catalog: TypeCatalog::for_dialect(dialect),
            buffer: Vec::new(),
            skipped: Vec::new(),
        }
    }

    fn run(&mut self) {
        let store = self.store;
        for table in store.sorted_tables() {
            self.format_table(table);
            self.buffer.push(String::new());
            if self.dialect.comment_style() == CommentStyle::Statement {
                self.format_comments(table);
            }
        }
        self.format_relationships();
        self.format_indexes();
    }

    fn wrap(&self, name: &str) -> String {
        self.bracket.wrap(name)
    }

    fn wrap_names(&self, columns: &[&Column]) -> String {
        columns
            .iter()
            .map(|c| self.wrap(&c.name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn quote(&self, text: &str) -> String {
        self.dialect.quote_literal(text)
    }

    fn skip(&mut self, kind: EntityKind, id: &str, reason: SkipReason) {
        tracing::debug!(?kind, id, ?reason, "skipping statement");
        self.skipped.push(SkippedStatement {
            kind,
            id: id.to_string(),
            reason,
        });
    }

    fn format_table(&mut self, table: &Table) {
        let store = self.store;
        let columns = store.table_columns(table);
        let widths = ColumnWidths::measure(&columns);
        let pk_columns: Vec<&Column> = columns
            .iter()
            .copied()
            .filter(|c| c.is_primary_key())
            .collect();
        let has_pk = !pk_columns.is_empty();

        self.buffer.push(format!("CREATE TABLE {}", self.wrap(&table.name)));
        self.buffer.push("(".to_string());
        for (i, column) in columns.iter().enumerate() {
            let comma = has_pk || i + 1 != columns.len();
            let line = self.format_column(column, widths, comma);
            self.buffer.push(line);
        }
        if has_pk {
            let names = self.wrap_names(&pk_columns);
            self.buffer.push(format!("  PRIMARY KEY ({names})"));
        }

        let inline_comment = self.dialect.comment_style() == CommentStyle::Inline
            && !table.comment.trim().is_empty();
        if inline_comment {
            self.buffer.push(format!(") COMMENT {};", self.quote(&table.comment)));
        } else {
            self.buffer.push(");".to_string());
        }
    }

    fn format_column(&self, column: &Column, widths: ColumnWidths, comma: bool) -> String {
        if !self.catalog.contains(&column.data_type) {
            tracing::debug!(
                column = %column.name,
                data_type = %column.data_type,
                dialect = self.dialect.name(),
                "data type not in catalog, emitting as is"
            );
        }

        let name = self.wrap(&column.name);
        let name_width = widths.name + text_width(&name) - text_width(&column.name);
        let mut parts = vec![pad(&name, name_width), pad(&column.data_type, widths.data_type)];

        if column.options.contains(ColumnOptions::NOT_NULL) {
            parts.push("NOT NULL".to_string());
        }
        if column.options.contains(ColumnOptions::AUTO_INCREMENT) {
            parts.push(self.dialect.identity_clause().to_string());
        } else if !column.default.trim().is_empty() {
            parts.push(format!("DEFAULT {}", column.default));
        }
        if column.options.contains(ColumnOptions::UNIQUE) {
            parts.push("UNIQUE".to_string());
        }
        if self.dialect.comment_style() == CommentStyle::Inline && !column.comment.trim().is_empty()
        {
            parts.push(format!("COMMENT {}", self.quote(&column.comment)));
        }

        let mut line = format!("  {}", parts.join(" ").trim_end());
        if comma {
            line.push(',');
        }
        line
    }

    fn format_comments(&mut self, table: &Table) {
        let table_name = self.wrap(&table.name);
        if !table.comment.trim().is_empty() {
            let comment = self.quote(&table.comment);
            self.buffer
                .push(format!("COMMENT ON TABLE {table_name} IS {comment};"));
            self.buffer.push(String::new());
        }
        let store = self.store;
        for column in store.table_columns(table) {
            if column.comment.trim().is_empty() {
                continue;
            }
            let column_name = self.wrap(&column.name);
            let comment = self.quote(&column.comment);
            self.buffer.push(format!(
                "COMMENT ON COLUMN {table_name}.{column_name} IS {comment};"
            ));
            self.buffer.push(String::new());
        }
    }

    fn format_relationships(&mut self) {
        let store = self.store;
        let mut fk_names = NameAllocator::with_existing(
            store
                .relationships
                .iter()
                .map(|r| r.name.trim())
                .filter(|name| !name.is_empty()),
        );

        let mut resolved: Vec<(&Relationship, &Table, &Table)> = Vec::new();
        for relationship in store.relationships.iter() {
            let start = store.table(&relationship.start.table_id);
            let end = store.table(&relationship.end.table_id);
            match (start, end) {
                (Some(start), Some(end)) => resolved.push((relationship, start, end)),
                (None, _) => self.skip(
                    EntityKind::Relationship,
                    &relationship.id,
                    SkipReason::UnresolvedStartTable,
                ),
                (_, None) => self.skip(
                    EntityKind::Relationship,
                    &relationship.id,
                    SkipReason::UnresolvedEndTable,
                ),
            }
        }
        resolved.sort_by(|(_, a_start, a_end), (_, b_start, b_end)| {
            a_end
                .name
                .cmp(&b_end.name)
                .then_with(|| a_start.name.cmp(&b_start.name))
        });

        for (relationship, start, end) in resolved {
            let start_columns = store.columns.get_many(&relationship.start.column_ids);
            let end_columns = store.columns.get_many(&relationship.end.column_ids);
            if start_columns.is_empty() || end_columns.is_empty() {
                self.skip(
                    EntityKind::Relationship,
                    &relationship.id,
                    SkipReason::NoResolvableColumns,
                );
                continue;
            }

            let fk_name = match relationship.name.trim() {
                "" => fk_names.allocate(&format!("FK_{}_TO_{}", start.name, end.name)),
                name => name.to_string(),
            };

            self.buffer
                .push(format!("ALTER TABLE {}", self.wrap(&end.name)));
            self.buffer
                .push(format!("  ADD CONSTRAINT {}", self.wrap(&fk_name)));
            self.buffer
                .push(format!("    FOREIGN KEY ({})", self.wrap_names(&end_columns)));
            self.buffer.push(format!(
                "    REFERENCES {} ({});",
                self.wrap(&start.name),
                self.wrap_names(&start_columns)
            ));
            self.buffer.push(String::new());
        }
    }

    fn format_indexes(&mut self) {
        let store = self.store;
        let mut index_names = NameAllocator::with_existing(
            store
                .indexes
                .iter()
                .map(|i| i.name.trim())
                .filter(|name| !name.is_empty()),
        );

        let mut resolved: Vec<(&Index, &Table, Vec<String>)> = Vec::new();
        for index in store.indexes.iter() {
            let Some(table) = store.table(&index.table_id) else {
                self.skip(EntityKind::Index, &index.id, SkipReason::UnresolvedTable);
                continue;
            };
            let column_names: Vec<String> = store
                .index_columns
                .get_many(&index.index_column_ids)
                .into_iter()
                .filter_map(|index_column| {
                    store.column(&index_column.column_id).map(|column| {
                        format!(
                            "{} {}",
                            self.wrap(&column.name),
                            index_column.order_type.keyword()
                        )
                    })
                })
                .collect();
            if column_names.is_empty() {
                self.skip(EntityKind::Index, &index.id, SkipReason::NoResolvableColumns);
                continue;
            }
            resolved.push((index, table, column_names));
        }
        resolved.sort_by(|(a, a_table, _), (b, b_table, _)| {
            a_table
                .name
                .cmp(&b_table.name)
                .then_with(|| a.name.cmp(&b.name))
        });

        for (index, table, column_names) in resolved {
            let index_name = match index.name.trim() {
                "" => index_names.allocate(&format!("IDX_{}", table.name)),
                name => name.to_string(),
            };
            let unique = if index.unique { "UNIQUE " } else { "" };

            self.buffer.push(format!(
                "CREATE {unique}INDEX {}",
                self.wrap(&index_name)
            ));
            self.buffer.push(format!(
                "  ON {} ({});",
                self.wrap(&table.name),
                column_names.join(", ")
            ));
            self.buffer.push(String::new());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IndexColumn, OrderType, RelationshipPoint, RelationshipType};
    use crate::store::Entity;
    use pretty_assertions::assert_eq;

    fn add_table(store: &mut EntityStore, id: &str, name: &str, columns: Vec<Column>) {
        let mut table = Table::new(id, name);
        for column in columns {
            table.column_ids.push(column.id.clone());
            store.upsert(Entity::Column(column));
        }
        store.upsert(Entity::Table(table));
    }

    fn users_store() -> EntityStore {
        let mut store = EntityStore::new();
        add_table(
            &mut store,
            "t1",
            "users",
            vec![
                Column::new("c1", "t1", "id", "INT")
                    .with_options(ColumnOptions::PRIMARY_KEY | ColumnOptions::NOT_NULL),
                Column::new("c2", "t1", "email", "VARCHAR"),
            ],
        );
        store
    }

    fn relationship(id: &str, start: (&str, &str), end: (&str, &str)) -> Relationship {
        Relationship {
            id: id.to_string(),
            name: String::new(),
            identification: false,
            relationship_type: RelationshipType::ZeroN,
            start_relationship_type: Default::default(),
            start: RelationshipPoint::new(start.0, vec![start.1.to_string()]),
            end: RelationshipPoint::new(end.0, vec![end.1.to_string()]),
        }
    }

    #[test]
    fn test_primary_key_table() {
        let sql = generate(&users_store(), &GenerateOptions::default());
        assert_eq!(
            sql,
            "CREATE TABLE \"users\"\n\
             (\n  \"id\"    INT     NOT NULL,\n  \"email\" VARCHAR,\n  PRIMARY KEY (\"id\")\n);\n"
        );
    }

    #[test]
    fn test_table_without_primary_key() {
        let mut store = EntityStore::new();
        add_table(
            &mut store,
            "t1",
            "logs",
            vec![
                Column::new("c1", "t1", "message", "TEXT"),
                Column::new("c2", "t1", "at", "TIMESTAMP"),
            ],
        );
        let sql = generate(&store, &GenerateOptions::new(Dialect::PostgreSQL).with_bracket(BracketStyle::None));
        assert_eq!(
            sql,
            "CREATE TABLE logs\n(\n  message TEXT,\n  at      TIMESTAMP\n);\n"
        );
    }

    #[test]
    fn test_column_clauses() {
        let mut store = EntityStore::new();
        let mut id = Column::new("c1", "t1", "id", "BIGINT")
            .with_options(ColumnOptions::AUTO_INCREMENT | ColumnOptions::NOT_NULL);
        id.default = "0".to_string();
        let mut status = Column::new("c2", "t1", "status", "TEXT")
            .with_options(ColumnOptions::UNIQUE | ColumnOptions::NOT_NULL);
        status.default = "'new'".to_string();
        add_table(&mut store, "t1", "jobs", vec![id, status]);

        let sql = generate(&store, &GenerateOptions::default());
        assert!(sql.contains("  \"id\"     BIGINT NOT NULL GENERATED ALWAYS AS IDENTITY,\n"));
        assert!(sql.contains("  \"status\" TEXT   NOT NULL DEFAULT 'new' UNIQUE\n"));

        let mysql = generate(&store, &GenerateOptions::new(Dialect::MySQL));
        assert!(mysql.contains("  `id`     BIGINT NOT NULL AUTO_INCREMENT,\n"));
    }

    #[test]
    fn test_comment_statements() {
        let mut store = users_store();
        let mut email = store.column("c2").cloned().unwrap();
        email.comment = "user email".to_string();
        store.upsert(Entity::Column(email));
        let mut users = store.table("t1").cloned().unwrap();
        users.comment = "   ".to_string();
        store.upsert(Entity::Table(users));

        let sql = generate(&store, &GenerateOptions::default());
        assert!(!sql.contains("COMMENT ON TABLE"));
        assert!(sql.ends_with(
            ");\n\nCOMMENT ON COLUMN \"users\".\"email\" IS 'user email';\n"
        ));
    }

    #[test]
    fn test_inline_comments_for_mysql() {
        let mut store = EntityStore::new();
        let mut name = Column::new("c1", "t1", "name", "VARCHAR(20)");
        name.comment = "it's".to_string();
        add_table(&mut store, "t1", "pets", vec![name]);
        let mut pets = store.table("t1").cloned().unwrap();
        pets.comment = "animals".to_string();
        store.upsert(Entity::Table(pets));

        let sql = generate(&store, &GenerateOptions::new(Dialect::MySQL));
        assert_eq!(
            sql,
            "CREATE TABLE `pets`\n(\n  `name` VARCHAR(20) COMMENT 'it''s'\n) COMMENT 'animals';\n"
        );
    }

    #[test]
    fn test_foreign_key_names_are_unique() {
        let mut store = users_store();
        add_table(
            &mut store,
            "t2",
            "orders",
            vec![Column::new("c3", "t2", "user_id", "INT")],
        );
        for id in ["r1", "r2", "r3"] {
            store.upsert(Entity::Relationship(relationship(id, ("t1", "c1"), ("t2", "c3"))));
        }

        let sql = generate(&store, &GenerateOptions::default());
        assert!(sql.contains("ADD CONSTRAINT \"FK_users_TO_orders\"\n"));
        assert!(sql.contains("ADD CONSTRAINT \"FK_users_TO_orders1\"\n"));
        assert!(sql.contains("ADD CONSTRAINT \"FK_users_TO_orders2\"\n"));
        assert!(sql.contains(
            "ALTER TABLE \"orders\"\n  ADD CONSTRAINT \"FK_users_TO_orders\"\n    FOREIGN KEY (\"user_id\")\n    REFERENCES \"users\" (\"id\");\n\n"
        ));
    }

    #[test]
    fn test_explicit_fk_name_is_respected() {
        let mut store = users_store();
        add_table(&mut store, "t2", "orders", vec![Column::new("c3", "t2", "user_id", "INT")]);
        let mut named = relationship("r1", ("t1", "c1"), ("t2", "c3"));
        named.name = "FK_users_TO_orders".to_string();
        store.upsert(Entity::Relationship(relationship("r0", ("t1", "c1"), ("t2", "c3"))));
        store.upsert(Entity::Relationship(named));

        let sql = generate(&store, &GenerateOptions::default());
        assert_eq!(sql.matches("\"FK_users_TO_orders\"").count(), 1);
        assert!(sql.contains("\"FK_users_TO_orders1\""));
    }

    #[test]
    fn test_unresolved_relationship_is_skipped() {
        let mut store = users_store();
        store.upsert(Entity::Relationship(relationship("r1", ("t1", "c1"), ("gone", "c9"))));

        let report = generate_report(&store, &GenerateOptions::default());
        assert!(!report.sql.contains("FOREIGN KEY"));
        assert!(report.sql.contains("CREATE TABLE \"users\""));
        assert_eq!(
            report.skipped,
            vec![SkippedStatement {
                kind: EntityKind::Relationship,
                id: "r1".to_string(),
                reason: SkipReason::UnresolvedEndTable,
            }]
        );
    }

    #[test]
    fn test_indexes() {
        let mut store = users_store();
        store.upsert(Entity::Index(Index {
            id: "i1".to_string(),
            name: String::new(),
            table_id: "t1".to_string(),
            unique: true,
            index_column_ids: vec!["ic1".to_string(), "ic-missing".to_string(), "ic2".to_string()],
        }));
        store.upsert(Entity::IndexColumn(IndexColumn {
            id: "ic1".to_string(),
            index_id: "i1".to_string(),
            column_id: "c2".to_string(),
            order_type: OrderType::Asc,
        }));
        store.upsert(Entity::IndexColumn(IndexColumn {
            id: "ic2".to_string(),
            index_id: "i1".to_string(),
            column_id: "c1".to_string(),
            order_type: OrderType::Desc,
        }));
        store.upsert(Entity::Index(Index {
            id: "i2".to_string(),
            name: String::new(),
            table_id: "t1".to_string(),
            unique: false,
            index_column_ids: vec!["ic-missing".to_string()],
        }));

        let report = generate_report(&store, &GenerateOptions::default());
        assert!(report.sql.ends_with(
            "CREATE UNIQUE INDEX \"IDX_users\"\n  ON \"users\" (\"email\" ASC, \"id\" DESC);\n"
        ));
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].reason, SkipReason::NoResolvableColumns);
    }

    #[test]
    fn test_tables_sorted_by_name() {
        let mut store = EntityStore::new();
        add_table(&mut store, "t1", "zebra", vec![]);
        add_table(&mut store, "t2", "apple", vec![]);
        let sql = generate(&store, &GenerateOptions::default());
        assert!(sql.find("\"apple\"").unwrap() < sql.find("\"zebra\"").unwrap());
    }

    #[test]
    fn test_deterministic_output() {
        let store = users_store();
        let options = GenerateOptions::default();
        assert_eq!(generate(&store, &options), generate(&store, &options));
    }

    #[test]
    fn test_options_from_toml_shape() {
        let options: GenerateOptions =
            serde_json::from_str(r#"{ "dialect": "mysql", "bracket": "none" }"#).unwrap();
        assert_eq!(options.dialect, Dialect::MySQL);
        assert_eq!(options.bracket(), BracketStyle::None);
        assert_eq!(GenerateOptions::default().bracket(), BracketStyle::DoubleQuote);
    }
}
