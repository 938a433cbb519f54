//! Resolve merge key names against a schema.
//!
//! Binding happens once, against the first input's schema. Every other
//! input must carry the same columns in the same order, each of the same
//! type class, since rows are emitted unchanged under the first schema.

use smerge_core::id::InputId;
use smerge_core::key::KeySpec;
use smerge_core::prelude::{Collation, DataType, Schema};
use smerge_core::types::Row;

use crate::traits::OpError;

/// One merge key after resolution against a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundKey {
    pub name: String,
    pub column_index: usize,
    pub data_type: DataType,
    pub ascending: bool,
    pub collation: Option<Collation>,
    pub case_insensitive: bool,
}

impl BoundKey {
    /// Collation applied to string values of this key.
    pub fn effective_collation(&self) -> Collation {
        match (self.collation, self.case_insensitive) {
            (Some(c), _) => c,
            (None, true) => Collation::NoCase,
            (None, false) => Collation::Binary,
        }
    }
}

/// Resolve every key of `spec` in `schema`, preserving order and direction.
pub fn bind(spec: &KeySpec, schema: &Schema) -> Result<Vec<BoundKey>, OpError> {
    spec.keys()
        .iter()
        .map(|key| {
            let column_index =
                schema
                    .index_of(&key.name)
                    .ok_or_else(|| OpError::KeyNotFound {
                        field: key.name.clone(),
                    })?;
            let field = &schema.fields[column_index];
            Ok(BoundKey {
                name: key.name.clone(),
                column_index,
                data_type: field.data_type,
                ascending: key.ascending,
                collation: field.collation,
                case_insensitive: key.case_insensitive || field.case_insensitive,
            })
        })
        .collect()
}

/// Key names from `spec` that `schema` does not contain, in spec order.
pub fn unresolved<'a>(spec: &'a KeySpec, schema: &Schema) -> Vec<&'a str> {
    spec.names()
        .filter(|name| schema.index_of(name).is_none())
        .collect()
}

/// Check that another input's schema lines up with the reference layout.
///
/// Key columns are checked first so a misplaced key is reported by name.
pub fn check_compatible(
    bound: &[BoundKey],
    reference: &Schema,
    input: InputId,
    schema: &Schema,
) -> Result<(), OpError> {
    for key in bound {
        let Some(idx) = schema.index_of(&key.name) else {
            return Err(OpError::SchemaMismatch {
                input,
                field: key.name.clone(),
                detail: "column missing".into(),
            });
        };
        if idx != key.column_index {
            return Err(OpError::SchemaMismatch {
                input,
                field: key.name.clone(),
                detail: format!(
                    "column at position {idx}, expected position {}",
                    key.column_index
                ),
            });
        }
        let found = schema.fields[idx].data_type;
        if found.class() != key.data_type.class() {
            return Err(OpError::SchemaMismatch {
                input,
                field: key.name.clone(),
                detail: format!("type {found} is not comparable with {}", key.data_type),
            });
        }
    }

    for (pos, (want, got)) in reference.fields.iter().zip(&schema.fields).enumerate() {
        if want.name != got.name {
            return Err(OpError::SchemaMismatch {
                input,
                field: want.name.clone(),
                detail: format!("column {pos} is '{}', expected '{}'", got.name, want.name),
            });
        }
        if want.data_type.class() != got.data_type.class() {
            return Err(OpError::SchemaMismatch {
                input,
                field: want.name.clone(),
                detail: format!("type {} does not match {}", got.data_type, want.data_type),
            });
        }
    }
    let (have, expected) = (schema.fields.len(), reference.fields.len());
    if have != expected {
        let field = if have > expected {
            &schema.fields[expected].name
        } else {
            &reference.fields[have].name
        };
        return Err(OpError::SchemaMismatch {
            input,
            field: field.clone(),
            detail: format!("{have} columns, expected {expected}"),
        });
    }
    Ok(())
}

/// Check the key values of the first row an input produces.
pub fn check_row(bound: &[BoundKey], input: InputId, row: &Row) -> Result<(), OpError> {
    for key in bound {
        let Some(value) = row.get(key.column_index) else {
            return Err(OpError::SchemaMismatch {
                input,
                field: key.name.clone(),
                detail: format!("row has {} values, key is column {}", row.len(), key.column_index),
            });
        };
        if let Some(found) = value.data_type() {
            if found.class() != key.data_type.class() {
                return Err(OpError::SchemaMismatch {
                    input,
                    field: key.name.clone(),
                    detail: format!("value of type {found} in a {} column", key.data_type),
                });
            }
        }
    }
    Ok(())
}

/// The emitted schema: the reference schema with key columns marked sorted.
pub fn output_schema(spec: &KeySpec, reference: &Schema) -> Schema {
    let mut schema = reference.clone();
    for key in spec.keys() {
        if let Some(idx) = schema.index_of(&key.name) {
            let field = &mut schema.fields[idx];
            if field.sorted.is_none() {
                field.sorted = Some(key.direction());
            }
        }
    }
    schema
}
