//! Logical schema types. Pure data; no columnar dependency here.
//!
//! A `Field` carries the per-column ordering attributes the merge needs
//! (string collation, case-insensitivity) and, on the output side, the sorted
//! direction marker that downstream consumers can inspect.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Boolean,
    Int32,
    Int64,
    Float32,
    Float64,
    Decimal,
    Utf8,
    Binary,
    Timestamp,
}

/// Coarse grouping used to decide whether two key columns can be compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeClass {
    Numeric,
    Boolean,
    String,
    Timestamp,
    Binary,
}

impl DataType {
    pub fn class(self) -> TypeClass {
        use DataType::*;
        match self {
            Int32 | Int64 | Float32 | Float64 | Decimal => TypeClass::Numeric,
            Boolean => TypeClass::Boolean,
            Utf8 => TypeClass::String,
            Timestamp => TypeClass::Timestamp,
            Binary => TypeClass::Binary,
        }
    }

    /// Parse the type names accepted by pipeline documents and schema files.
    pub fn parse(s: &str) -> Option<DataType> {
        Some(match s {
            "Boolean" | "bool" => DataType::Boolean,
            "Int32" | "i32" => DataType::Int32,
            "Int64" | "i64" | "int" => DataType::Int64,
            "Float32" | "f32" => DataType::Float32,
            "Float64" | "f64" | "float" => DataType::Float64,
            "Decimal" | "decimal" => DataType::Decimal,
            "Utf8" | "string" | "str" => DataType::Utf8,
            "Binary" | "bytes" => DataType::Binary,
            "Timestamp" | "timestamp" => DataType::Timestamp,
            _ => return None,
        })
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// String collations understood by the comparator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Collation {
    /// Byte-lexicographic.
    #[default]
    Binary,
    /// Unicode lowercase fold before comparing.
    NoCase,
    /// Trailing spaces are ignored.
    Rtrim,
}

impl Collation {
    pub fn parse(s: &str) -> Option<Collation> {
        match s.to_ascii_lowercase().as_str() {
            "binary" => Some(Collation::Binary),
            "nocase" => Some(Collation::NoCase),
            "rtrim" => Some(Collation::Rtrim),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn from_ascending(ascending: bool) -> Self {
        if ascending {
            SortDirection::Ascending
        } else {
            SortDirection::Descending
        }
    }

    pub fn is_ascending(self) -> bool {
        self == SortDirection::Ascending
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
    #[serde(default)]
    pub collation: Option<Collation>,
    #[serde(default)]
    pub case_insensitive: bool,
    /// Set on output schemas for columns the stream is known to be ordered by.
    #[serde(default)]
    pub sorted: Option<SortDirection>,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: DataType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable,
            collation: None,
            case_insensitive: false,
            sorted: None,
        }
    }

    pub fn with_collation(mut self, collation: Collation) -> Self {
        self.collation = Some(collation);
        self
    }

    pub fn with_case_insensitive(mut self, case_insensitive: bool) -> Self {
        self.case_insensitive = case_insensitive;
        self
    }

    /// Collation the comparator should apply; an explicit collation wins over
    /// the case-insensitive flag.
    pub fn effective_collation(&self) -> Collation {
        match (self.collation, self.case_insensitive) {
            (Some(c), _) => c,
            (None, true) => Collation::NoCase,
            (None, false) => Collation::Binary,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn field(&self, idx: usize) -> Option<&Field> {
        self.fields.get(idx)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_collation_beats_case_flag() {
        let f = Field::new("s", DataType::Utf8, true)
            .with_case_insensitive(true)
            .with_collation(Collation::Rtrim);
        assert_eq!(f.effective_collation(), Collation::Rtrim);

        let g = Field::new("s", DataType::Utf8, true).with_case_insensitive(true);
        assert_eq!(g.effective_collation(), Collation::NoCase);
    }

    #[test]
    fn numeric_types_share_a_class() {
        assert_eq!(DataType::Int32.class(), DataType::Decimal.class());
        assert_eq!(DataType::Float64.class(), TypeClass::Numeric);
        assert_ne!(DataType::Utf8.class(), DataType::Binary.class());
    }
}
