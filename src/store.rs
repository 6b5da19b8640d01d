//! Normalized entity store.
//!
//! Each kind lives in its own insertion-ordered collection. The store never
//! checks cross-entity references and never cascades a removal.

use indexmap::IndexMap;

use crate::model::{Column, Index, IndexColumn, Relationship, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Table,
    Column,
    Relationship,
    Index,
    IndexColumn,
}

/// An owned entity of any kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Table(Table),
    Column(Column),
    Relationship(Relationship),
    Index(Index),
    IndexColumn(IndexColumn),
}

impl Entity {
    pub fn id(&self) -> &str {
        match self {
            Self::Table(e) => &e.id,
            Self::Column(e) => &e.id,
            Self::Relationship(e) => &e.id,
            Self::Index(e) => &e.id,
            Self::IndexColumn(e) => &e.id,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Table(_) => EntityKind::Table,
            Self::Column(_) => EntityKind::Column,
            Self::Relationship(_) => EntityKind::Relationship,
            Self::Index(_) => EntityKind::Index,
            Self::IndexColumn(_) => EntityKind::IndexColumn,
        }
    }
}

/// A borrowed entity of any kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntityRef<'a> {
    Table(&'a Table),
    Column(&'a Column),
    Relationship(&'a Relationship),
    Index(&'a Index),
    IndexColumn(&'a IndexColumn),
}

impl EntityRef<'_> {
    pub fn id(&self) -> &str {
        match self {
            Self::Table(e) => &e.id,
            Self::Column(e) => &e.id,
            Self::Relationship(e) => &e.id,
            Self::Index(e) => &e.id,
            Self::IndexColumn(e) => &e.id,
        }
    }

    pub fn to_owned(self) -> Entity {
        match self {
            Self::Table(e) => Entity::Table(e.clone()),
            Self::Column(e) => Entity::Column(e.clone()),
            Self::Relationship(e) => Entity::Relationship(e.clone()),
            Self::Index(e) => Entity::Index(e.clone()),
            Self::IndexColumn(e) => Entity::IndexColumn(e.clone()),
        }
    }
}

/// Anything stored in a [`Collection`].
pub trait Keyed {
    fn key(&self) -> &str;
}

macro_rules! impl_keyed {
    ($($ty:ty),*) => {
        $(impl Keyed for $ty {
            fn key(&self) -> &str {
                &self.id
            }
        })*
    };
}

impl_keyed!(Table, Column, Relationship, Index, IndexColumn);

/// Insertion-ordered map from id to entity.
#[derive(Debug, Clone)]
pub struct Collection<T> {
    items: IndexMap<String, T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            items: IndexMap::new(),
        }
    }
}

impl<T: Keyed> Collection<T> {
    /// Inserts or replaces. A replaced entity keeps its original position.
    pub fn upsert(&mut self, item: T) -> Option<T> {
        self.items.insert(item.key().to_string(), item)
    }

    /// Removes `id`; the remaining entities keep their relative order.
    pub fn remove(&mut self, id: &str) -> Option<T> {
        self.items.shift_remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        self.items.get_mut(id)
    }

    /// Resolves ids in input order, dropping the ones that do not resolve.
    pub fn get_many<S: AsRef<str>>(&self, ids: &[S]) -> Vec<&T> {
        ids.iter().filter_map(|id| self.get(id.as_ref())).collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    pub fn iter(&self) -> indexmap::map::Values<'_, String, T> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    pub tables: Collection<Table>,
    pub columns: Collection<Column>,
    pub relationships: Collection<Relationship>,
    pub indexes: Collection<Index>,
    pub index_columns: Collection<IndexColumn>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an entity, returning the previous value.
    pub fn upsert(&mut self, entity: Entity) -> Option<Entity> {
        match entity {
            Entity::Table(e) => self.tables.upsert(e).map(Entity::Table),
            Entity::Column(e) => self.columns.upsert(e).map(Entity::Column),
            Entity::Relationship(e) => self.relationships.upsert(e).map(Entity::Relationship),
            Entity::Index(e) => self.indexes.upsert(e).map(Entity::Index),
            Entity::IndexColumn(e) => self.index_columns.upsert(e).map(Entity::IndexColumn),
        }
    }

    /// Removes the entity with `id`, whatever its kind. Referencing
    /// entities are left untouched.
    pub fn remove(&mut self, id: &str) -> Option<Entity> {
        if let Some(e) = self.tables.remove(id) {
            return Some(Entity::Table(e));
        }
        if let Some(e) = self.columns.remove(id) {
            return Some(Entity::Column(e));
        }
        if let Some(e) = self.relationships.remove(id) {
            return Some(Entity::Relationship(e));
        }
        if let Some(e) = self.indexes.remove(id) {
            return Some(Entity::Index(e));
        }
        self.index_columns.remove(id).map(Entity::IndexColumn)
    }

    pub fn get(&self, id: &str) -> Option<EntityRef<'_>> {
        if let Some(e) = self.tables.get(id) {
            return Some(EntityRef::Table(e));
        }
        if let Some(e) = self.columns.get(id) {
            return Some(EntityRef::Column(e));
        }
        if let Some(e) = self.relationships.get(id) {
            return Some(EntityRef::Relationship(e));
        }
        if let Some(e) = self.indexes.get(id) {
            return Some(EntityRef::Index(e));
        }
        self.index_columns.get(id).map(EntityRef::IndexColumn)
    }

    /// Resolves ids of any kind in input order, dropping unresolved ones.
    pub fn get_many<S: AsRef<str>>(&self, ids: &[S]) -> Vec<EntityRef<'_>> {
        ids.iter().filter_map(|id| self.get(id.as_ref())).collect()
    }

    /// All entities of one kind, in insertion order.
    pub fn all_of_kind(&self, kind: EntityKind) -> Vec<EntityRef<'_>> {
        match kind {
            EntityKind::Table => self.tables.iter().map(EntityRef::Table).collect(),
            EntityKind::Column => self.columns.iter().map(EntityRef::Column).collect(),
            EntityKind::Relationship => self
                .relationships
                .iter()
                .map(EntityRef::Relationship)
                .collect(),
            EntityKind::Index => self.indexes.iter().map(EntityRef::Index).collect(),
            EntityKind::IndexColumn => self
                .index_columns
                .iter()
                .map(EntityRef::IndexColumn)
                .collect(),
        }
    }

    pub fn table(&self, id: &str) -> Option<&Table> {
        self.tables.get(id)
    }

    pub fn column(&self, id: &str) -> Option<&Column> {
        self.columns.get(id)
    }

    pub fn relationship(&self, id: &str) -> Option<&Relationship> {
        self.relationships.get(id)
    }

    pub fn index(&self, id: &str) -> Option<&Index> {
        self.indexes.get(id)
    }

    pub fn index_column(&self, id: &str) -> Option<&IndexColumn> {
        self.index_columns.get(id)
    }

    /// Columns of a table in declared order, unresolved ids dropped.
    pub fn table_columns(&self, table: &Table) -> Vec<&Column> {
        self.columns.get_many(&table.column_ids)
    }

    /// Tables ordered by name ascending; ties keep insertion order.
    pub fn sorted_tables(&self) -> Vec<&Table> {
        let mut tables: Vec<&Table> = self.tables.iter().collect();
        tables.sort_by(|a, b| a.name.cmp(&b.name));
        tables
    }

    /// Commits a batch of mutations in order.
    pub fn apply(&mut self, batch: Batch) {
        for mutation in batch.mutations {
            match mutation {
                Mutation::Upsert(entity) => {
                    self.upsert(entity);
                }
                Mutation::Remove(id) => {
                    self.remove(&id);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.tables.len()
            + self.columns.len()
            + self.relationships.len()
            + self.indexes.len()
            + self.index_columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Upsert(Entity),
    Remove(String),
}

/// An ordered list of store mutations produced by the parser or loader.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    pub mutations: Vec<Mutation>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&mut self, entity: Entity) {
        self.mutations.push(Mutation::Upsert(entity));
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    /// Upserted entities of one kind, in batch order.
    pub fn entities(&self, kind: EntityKind) -> impl Iterator<Item = &Entity> {
        self.mutations.iter().filter_map(move |m| match m {
            Mutation::Upsert(e) if e.kind() == kind => Some(e),
            _ => None,
        })
    }
}
