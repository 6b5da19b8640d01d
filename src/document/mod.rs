//! Persisted document loading and entity construction.
//!
//! Two admission paths exist for every entity kind: a trusted *fresh*
//! payload issued by the command layer, and an untrusted *load* fragment
//! read from a saved or imported document. The load path is fully
//! validated; a document with any bad fragment is rejected as a whole.

mod migrate;
mod validate;

pub use migrate::{
    migrate_column_options, migrate_direction, migrate_order_type, migrate_relationship_type,
    migrate_start_relationship_type,
};
pub use validate::{
    Expected, Violation, validate_column, validate_index, validate_index_column,
    validate_relationship, validate_table,
};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::model::{
    Column, Index, IndexColumn, OrderType, Relationship, RelationshipPoint, Table,
};
use crate::store::{Entity, EntityStore};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Document root must be an object")]
    NotAnObject,
    #[error("Document rejected: {}", format_violations(.violations))]
    Rejected { violations: Vec<Violation> },
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(Violation::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error, PartialEq)]
pub enum ConstructionError {
    #[error("No payload supplied for {0}")]
    Missing(&'static str),
    #[error("Invalid {kind}: {}", format_violations(.violations))]
    Invalid {
        kind: &'static str,
        violations: Vec<Violation>,
    },
}

/// Where a new entity comes from.
#[derive(Debug, Clone)]
pub enum EntitySource<'a, P> {
    /// Trusted command payload.
    Fresh(P),
    /// Untrusted persisted fragment.
    Load(&'a Value),
    None,
}

/// Two-path construction shared by every entity kind.
pub trait Build: Sized {
    const KIND: &'static str;
    type Fresh;

    fn fresh(payload: Self::Fresh) -> Self;

    fn load(value: &Value, path: &str) -> Result<Self, Vec<Violation>>;

    fn build(source: EntitySource<'_, Self::Fresh>) -> Result<Self, ConstructionError> {
        match source {
            EntitySource::Fresh(payload) => Ok(Self::fresh(payload)),
            EntitySource::Load(value) => {
                Self::load(value, Self::KIND).map_err(|violations| ConstructionError::Invalid {
                    kind: Self::KIND,
                    violations,
                })
            }
            EntitySource::None => Err(ConstructionError::Missing(Self::KIND)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AddTable {
    pub id: String,
    pub name: String,
}

impl Build for Table {
    const KIND: &'static str = "table";
    type Fresh = AddTable;

    fn fresh(payload: AddTable) -> Self {
        Table::new(payload.id, payload.name)
    }

    fn load(value: &Value, path: &str) -> Result<Self, Vec<Violation>> {
        validate_table(value, path)
    }
}

#[derive(Debug, Clone)]
pub struct AddColumn {
    pub id: String,
    pub table_id: String,
    pub name: String,
    pub data_type: String,
}

impl Build for Column {
    const KIND: &'static str = "column";
    type Fresh = AddColumn;

    fn fresh(payload: AddColumn) -> Self {
        Column::new(payload.id, payload.table_id, payload.name, payload.data_type)
    }

    fn load(value: &Value, path: &str) -> Result<Self, Vec<Violation>> {
        validate_column(value, path)
    }
}

#[derive(Debug, Clone)]
pub struct AddRelationship {
    pub id: String,
    /// May be a legacy tag.
    pub relationship_type: String,
    pub start_table_id: String,
    pub start_column_ids: Vec<String>,
    pub end_table_id: String,
    pub end_column_ids: Vec<String>,
}

impl Build for Relationship {
    const KIND: &'static str = "relationship";
    type Fresh = AddRelationship;

    fn fresh(payload: AddRelationship) -> Self {
        Relationship {
            id: payload.id,
            name: String::new(),
            identification: false,
            relationship_type: migrate_relationship_type(&payload.relationship_type),
            start_relationship_type: Default::default(),
            start: RelationshipPoint::new(payload.start_table_id, payload.start_column_ids),
            end: RelationshipPoint::new(payload.end_table_id, payload.end_column_ids),
        }
    }

    fn load(value: &Value, path: &str) -> Result<Self, Vec<Violation>> {
        validate_relationship(value, path)
    }
}

#[derive(Debug, Clone)]
pub struct AddIndex {
    pub id: String,
    pub table_id: String,
}

impl Build for Index {
    const KIND: &'static str = "index";
    type Fresh = AddIndex;

    fn fresh(payload: AddIndex) -> Self {
        Index {
            id: payload.id,
            name: String::new(),
            table_id: payload.table_id,
            unique: false,
            index_column_ids: Vec::new(),
        }
    }

    fn load(value: &Value, path: &str) -> Result<Self, Vec<Violation>> {
        validate_index(value, path)
    }
}

#[derive(Debug, Clone)]
pub struct AddIndexColumn {
    pub id: String,
    pub index_id: String,
    pub column_id: String,
}

impl Build for IndexColumn {
    const KIND: &'static str = "indexColumn";
    type Fresh = AddIndexColumn;

    fn fresh(payload: AddIndexColumn) -> Self {
        IndexColumn {
            id: payload.id,
            index_id: payload.index_id,
            column_id: payload.column_id,
            order_type: OrderType::Asc,
        }
    }

    fn load(value: &Value, path: &str) -> Result<Self, Vec<Violation>> {
        validate_index_column(value, path)
    }
}

/// Validates every fragment of a JSON document and builds a store from it.
///
/// Missing collections count as empty. Any violation anywhere rejects the
/// whole document; no partial store is returned.
pub fn load_document(json: &str) -> Result<EntityStore, LoadError> {
    let root: Value = serde_json::from_str(json)?;
    let root = root.as_object().ok_or(LoadError::NotAnObject)?;

    let mut entities = Vec::new();
    let mut violations = Vec::new();

    collect::<Table>(root.get("tables"), "tables", Entity::Table, &mut entities, &mut violations);
    collect::<Column>(root.get("columns"), "columns", Entity::Column, &mut entities, &mut violations);
    collect::<Relationship>(
        root.get("relationships"),
        "relationships",
        Entity::Relationship,
        &mut entities,
        &mut violations,
    );
    collect::<Index>(root.get("indexes"), "indexes", Entity::Index, &mut entities, &mut violations);
    collect::<IndexColumn>(
        root.get("indexColumns"),
        "indexColumns",
        Entity::IndexColumn,
        &mut entities,
        &mut violations,
    );

    if !violations.is_empty() {
        tracing::debug!(count = violations.len(), "document rejected");
        return Err(LoadError::Rejected { violations });
    }

    let mut store = EntityStore::new();
    for entity in entities {
        store.upsert(entity);
    }
    Ok(store)
}

fn collect<T: Build>(
    fragments: Option<&Value>,
    key: &str,
    wrap: fn(T) -> Entity,
    entities: &mut Vec<Entity>,
    violations: &mut Vec<Violation>,
) {
    let fragments = match fragments {
        None | Some(Value::Null) => return,
        Some(Value::Array(items)) => items,
        Some(_) => {
            violations.push(Violation {
                path: key.to_string(),
                expected: Expected::Array,
            });
            return;
        }
    };

    for (i, fragment) in fragments.iter().enumerate() {
        match T::load(fragment, &format!("{key}[{i}]")) {
            Ok(entity) => entities.push(wrap(entity)),
            Err(mut found) => violations.append(&mut found),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentRef<'a> {
    tables: Vec<&'a Table>,
    columns: Vec<&'a Column>,
    relationships: Vec<&'a Relationship>,
    indexes: Vec<&'a Index>,
    index_columns: Vec<&'a IndexColumn>,
}

/// Serializes the store in the shape [`load_document`] accepts.
pub fn save_document(store: &EntityStore) -> Result<String, serde_json::Error> {
    let doc = DocumentRef {
        tables: store.tables.iter().collect(),
        columns: store.columns.iter().collect(),
        relationships: store.relationships.iter().collect(),
        indexes: store.indexes.iter().collect(),
        index_columns: store.index_columns.iter().collect(),
    };
    serde_json::to_string_pretty(&doc)
}
