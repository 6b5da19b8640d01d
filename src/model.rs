//! Schema entities held by the [`EntityStore`](crate::store::EntityStore).
//!
//! Entities refer to each other by id only. Nothing here checks that an id
//! resolves; consumers treat a dangling id as a soft fault.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub comment: String,
    /// Column order is significant: it drives output order and padding.
    #[serde(default)]
    pub column_ids: Vec<String>,
}

impl Table {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            comment: String::new(),
            column_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: String,
    #[serde(default)]
    pub table_id: String,
    pub name: String,
    /// Opaque type text chosen at creation time, e.g. `VARCHAR(255)`.
    pub data_type: String,
    /// Raw SQL default expression; empty means none.
    #[serde(default)]
    pub default: String,
    #[serde(default)]
    pub options: ColumnOptions,
    #[serde(default)]
    pub comment: String,
}

impl Column {
    pub fn new(
        id: impl Into<String>,
        table_id: impl Into<String>,
        name: impl Into<String>,
        data_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            table_id: table_id.into(),
            name: name.into(),
            data_type: data_type.into(),
            default: String::new(),
            options: ColumnOptions::empty(),
            comment: String::new(),
        }
    }

    pub fn with_options(mut self, options: ColumnOptions) -> Self {
        self.options = options;
        self
    }

    pub fn is_primary_key(&self) -> bool {
        self.options.contains(ColumnOptions::PRIMARY_KEY)
    }
}

/// Column flags packed into one byte.
///
/// The set is exhaustive: [`AUTO_INCREMENT`](Self::AUTO_INCREMENT),
/// [`PRIMARY_KEY`](Self::PRIMARY_KEY), [`UNIQUE`](Self::UNIQUE) and
/// [`NOT_NULL`](Self::NOT_NULL). The bit values match the persisted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnOptions(u8);

impl ColumnOptions {
    pub const AUTO_INCREMENT: Self = Self(0b0001);
    pub const PRIMARY_KEY: Self = Self(0b0010);
    pub const UNIQUE: Self = Self(0b0100);
    pub const NOT_NULL: Self = Self(0b1000);

    const ALL: u8 = 0b1111;

    pub const fn empty() -> Self {
        Self(0)
    }

    /// Builds a set from raw bits, dropping unknown ones.
    pub const fn from_bits_truncate(bits: u8) -> Self {
        Self(bits & Self::ALL)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    pub fn set(&mut self, other: Self, value: bool) {
        if value {
            self.insert(other);
        } else {
            self.remove(other);
        }
    }
}

impl std::ops::BitOr for ColumnOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub id: String,
    /// Explicit FK constraint name; empty means the generator picks one.
    #[serde(default)]
    pub name: String,
    pub identification: bool,
    pub relationship_type: RelationshipType,
    #[serde(default)]
    pub start_relationship_type: StartRelationshipType,
    pub start: RelationshipPoint,
    pub end: RelationshipPoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipPoint {
    pub table_id: String,
    pub column_ids: Vec<String>,
    pub x: f64,
    pub y: f64,
    pub direction: Direction,
}

impl RelationshipPoint {
    pub fn new(table_id: impl Into<String>, column_ids: Vec<String>) -> Self {
        Self {
            table_id: table_id.into(),
            column_ids,
            x: 0.0,
            y: 0.0,
            direction: Direction::default(),
        }
    }
}

/// Cardinality of a relationship as seen from its end table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RelationshipType {
    ZeroOne,
    #[default]
    ZeroN,
    OneOnly,
    OneN,
}

impl RelationshipType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ZeroOne => "ZeroOne",
            Self::ZeroN => "ZeroN",
            Self::OneOnly => "OneOnly",
            Self::OneN => "OneN",
        }
    }
}

/// Line style drawn at the start of a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StartRelationshipType {
    #[default]
    Dash,
    Ring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
    Top,
    #[default]
    Bottom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    pub id: String,
    /// Empty means the generator picks one.
    #[serde(default)]
    pub name: String,
    pub table_id: String,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub index_column_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexColumn {
    pub id: String,
    #[serde(default)]
    pub index_id: String,
    pub column_id: String,
    #[serde(default)]
    pub order_type: OrderType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    #[default]
    Asc,
    Desc,
}

impl OrderType {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_options_set_and_clear() {
        let mut options = ColumnOptions::NOT_NULL | ColumnOptions::PRIMARY_KEY;
        assert!(options.contains(ColumnOptions::NOT_NULL));
        assert!(options.contains(ColumnOptions::PRIMARY_KEY));
        assert!(!options.contains(ColumnOptions::UNIQUE));

        options.remove(ColumnOptions::NOT_NULL);
        assert!(!options.contains(ColumnOptions::NOT_NULL));

        options.set(ColumnOptions::UNIQUE, true);
        assert_eq!(options.bits(), 0b0110);
    }

    #[test]
    fn test_column_options_truncate_unknown_bits() {
        assert_eq!(ColumnOptions::from_bits_truncate(0b1111_0001).bits(), 0b0001);
    }

    #[test]
    fn test_serialized_field_names() {
        let column = Column::new("c1", "t1", "id", "INT").with_options(ColumnOptions::NOT_NULL);
        let json = serde_json::to_value(&column).unwrap();
        assert_eq!(json["dataType"], "INT");
        assert_eq!(json["tableId"], "t1");
        assert_eq!(json["options"], 8);
    }
}
