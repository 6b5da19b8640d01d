//! Structural checks for untrusted document fragments.
//!
//! A fragment either converts into a fully populated entity or yields the
//! complete list of field-level violations. Nothing in between.

use std::fmt;

use serde_json::{Map, Value};

use super::migrate::{
    migrate_column_options, migrate_direction, migrate_order_type, migrate_relationship_type,
    migrate_start_relationship_type,
};
use crate::model::{Column, Index, IndexColumn, Relationship, RelationshipPoint, Table};

/// Primitive kind a field was expected to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    String,
    Number,
    Boolean,
    Object,
    Array,
    StringArray,
    /// Either a numeric `options` or a legacy `option` object.
    ColumnOptions,
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
            Self::StringArray => "array of strings",
            Self::ColumnOptions => "column options",
        };
        f.write_str(name)
    }
}

/// One failed check, located by JSON path (e.g. `relationships[0].end.direction`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: String,
    pub expected: Expected,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: expected {}", self.path, self.expected)
    }
}

static NULL: Value = Value::Null;

/// Collects violations for one fragment.
struct Checker<'a> {
    path: &'a str,
    fields: Option<&'a Map<String, Value>>,
    violations: Vec<Violation>,
}

impl<'a> Checker<'a> {
    fn new(value: &'a Value, path: &'a str) -> Self {
        let fields = value.as_object();
        let mut violations = Vec::new();
        if fields.is_none() {
            violations.push(Violation {
                path: path.to_string(),
                expected: Expected::Object,
            });
        }
        Self {
            path,
            fields,
            violations,
        }
    }

    fn fail(&mut self, field: &str, expected: Expected) {
        self.violations.push(Violation {
            path: format!("{}.{}", self.path, field),
            expected,
        });
    }

    fn field(&self, field: &str) -> Option<&'a Value> {
        self.fields.and_then(|f| f.get(field))
    }

    fn string(&mut self, field: &str) -> String {
        match self.field(field).and_then(Value::as_str) {
            Some(s) => s.to_string(),
            None => {
                if self.fields.is_some() {
                    self.fail(field, Expected::String);
                }
                String::new()
            }
        }
    }

    /// Absent is fine, present-but-wrong is not.
    fn optional_string(&mut self, field: &str) -> Option<String> {
        match self.field(field) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                self.fail(field, Expected::String);
                None
            }
        }
    }

    fn number(&mut self, field: &str) -> f64 {
        match self.field(field).and_then(Value::as_f64) {
            Some(n) => n,
            None => {
                if self.fields.is_some() {
                    self.fail(field, Expected::Number);
                }
                0.0
            }
        }
    }

    fn boolean(&mut self, field: &str) -> bool {
        match self.field(field).and_then(Value::as_bool) {
            Some(b) => b,
            None => {
                if self.fields.is_some() {
                    self.fail(field, Expected::Boolean);
                }
                false
            }
        }
    }

    fn string_array(&mut self, field: &str) -> Vec<String> {
        let items = self.field(field).and_then(Value::as_array).and_then(|items| {
            items
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
        });
        match items {
            Some(items) => items,
            None => {
                if self.fields.is_some() {
                    self.fail(field, Expected::StringArray);
                }
                Vec::new()
            }
        }
    }

    fn point(&mut self, field: &str) -> RelationshipPoint {
        let path = format!("{}.{}", self.path, field);
        let value = self.field(field).unwrap_or(&NULL);
        if self.fields.is_none() {
            return RelationshipPoint::new("", Vec::new());
        }
        let mut nested = Checker::new(value, &path);
        let point = RelationshipPoint {
            table_id: nested.string("tableId"),
            column_ids: nested.string_array("columnIds"),
            x: nested.number("x"),
            y: nested.number("y"),
            direction: migrate_direction(&nested.string("direction")),
        };
        self.violations.append(&mut nested.violations);
        point
    }

    fn finish<T>(self, value: T) -> Result<T, Vec<Violation>> {
        if self.violations.is_empty() {
            Ok(value)
        } else {
            Err(self.violations)
        }
    }
}

pub fn validate_table(value: &Value, path: &str) -> Result<Table, Vec<Violation>> {
    let mut check = Checker::new(value, path);
    let table = Table {
        id: check.string("id"),
        name: check.string("name"),
        comment: check.string("comment"),
        column_ids: check.string_array("columnIds"),
    };
    check.finish(table)
}

pub fn validate_column(value: &Value, path: &str) -> Result<Column, Vec<Violation>> {
    let mut check = Checker::new(value, path);
    let options = match migrate_column_options(value) {
        Some(options) => options,
        None => {
            if check.fields.is_some() {
                check.fail("options", Expected::ColumnOptions);
            }
            Default::default()
        }
    };
    let column = Column {
        id: check.string("id"),
        table_id: check.optional_string("tableId").unwrap_or_default(),
        name: check.string("name"),
        data_type: check.string("dataType"),
        default: check.string("default"),
        options,
        comment: check.string("comment"),
    };
    check.finish(column)
}

pub fn validate_relationship(value: &Value, path: &str) -> Result<Relationship, Vec<Violation>> {
    let mut check = Checker::new(value, path);
    let id = check.string("id");
    let name = check.optional_string("name").unwrap_or_default();
    let identification = check.boolean("identification");
    let relationship_type = migrate_relationship_type(&check.string("relationshipType"));
    let start_relationship_type = check
        .optional_string("startRelationshipType")
        .map(|tag| migrate_start_relationship_type(&tag))
        .unwrap_or_default();
    let start = check.point("start");
    let end = check.point("end");
    check.finish(Relationship {
        id,
        name,
        identification,
        relationship_type,
        start_relationship_type,
        start,
        end,
    })
}

pub fn validate_index(value: &Value, path: &str) -> Result<Index, Vec<Violation>> {
    let mut check = Checker::new(value, path);
    let index = Index {
        id: check.string("id"),
        name: check.string("name"),
        table_id: check.string("tableId"),
        unique: check.boolean("unique"),
        index_column_ids: check.string_array("indexColumnIds"),
    };
    check.finish(index)
}

pub fn validate_index_column(value: &Value, path: &str) -> Result<IndexColumn, Vec<Violation>> {
    let mut check = Checker::new(value, path);
    let index_column = IndexColumn {
        id: check.string("id"),
        index_id: check.optional_string("indexId").unwrap_or_default(),
        column_id: check.string("columnId"),
        order_type: migrate_order_type(&check.string("orderType")),
    };
    check.finish(index_column)
}
