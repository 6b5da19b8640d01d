//! Maps historical document tags onto the current vocabulary.
//!
//! Every function here is total: an unknown tag falls back to a fixed
//! default so that old documents stay loadable.

use serde_json::Value;

use crate::model::{ColumnOptions, Direction, OrderType, RelationshipType, StartRelationshipType};

/// Relationship type tags, old and current.
///
/// | tag        | maps to   |
/// |------------|-----------|
/// | `ZeroOneN` | `ZeroN`   |
/// | `One`      | `OneOnly` |
/// | `N`        | `OneN`    |
/// | `ZeroOne`  | `ZeroOne` |
/// | `ZeroN`    | `ZeroN`   |
/// | `OneOnly`  | `OneOnly` |
/// | `OneN`     | `OneN`    |
/// | other      | `ZeroN`   |
pub fn migrate_relationship_type(tag: &str) -> RelationshipType {
    match tag {
        "ZeroOneN" => RelationshipType::ZeroN,
        "One" => RelationshipType::OneOnly,
        "N" => RelationshipType::OneN,
        "ZeroOne" => RelationshipType::ZeroOne,
        "ZeroN" => RelationshipType::ZeroN,
        "OneOnly" => RelationshipType::OneOnly,
        "OneN" => RelationshipType::OneN,
        other => {
            tracing::debug!(tag = other, "unknown relationship type, using ZeroN");
            RelationshipType::ZeroN
        }
    }
}

/// `Ring` or `Dash`; anything else is `Dash`.
pub fn migrate_start_relationship_type(tag: &str) -> StartRelationshipType {
    match tag {
        "Ring" => StartRelationshipType::Ring,
        _ => StartRelationshipType::Dash,
    }
}

/// Case-insensitive side name; anything else is `Bottom`.
pub fn migrate_direction(tag: &str) -> Direction {
    match tag.to_ascii_lowercase().as_str() {
        "left" => Direction::Left,
        "right" => Direction::Right,
        "top" => Direction::Top,
        _ => Direction::Bottom,
    }
}

/// `DESC` in any case is descending; anything else is ascending.
pub fn migrate_order_type(tag: &str) -> OrderType {
    if tag.eq_ignore_ascii_case("desc") {
        OrderType::Desc
    } else {
        OrderType::Asc
    }
}

/// Reads column flags from either the current numeric `options` field or
/// the legacy `option` object of booleans.
///
/// Returns `None` when neither form is present.
pub fn migrate_column_options(column: &Value) -> Option<ColumnOptions> {
    if let Some(bits) = column.get("options").and_then(Value::as_u64) {
        return Some(ColumnOptions::from_bits_truncate((bits & 0xff) as u8));
    }

    let legacy = column.get("option")?.as_object()?;
    let flag = |key: &str| legacy.get(key).and_then(Value::as_bool).unwrap_or(false);

    let mut options = ColumnOptions::empty();
    options.set(ColumnOptions::AUTO_INCREMENT, flag("autoIncrement"));
    options.set(ColumnOptions::PRIMARY_KEY, flag("primaryKey"));
    options.set(ColumnOptions::UNIQUE, flag("unique"));
    options.set(ColumnOptions::NOT_NULL, flag("notNull"));
    Some(options)
}
