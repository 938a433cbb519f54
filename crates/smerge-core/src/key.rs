//! Merge key specification: an ordered list of `(field, direction)` entries.
//!
//! Earlier entries dominate. An empty specification is valid and makes every
//! row compare equal, so the merge degenerates to concatenation by input order.

use serde::{Deserialize, Serialize};

use crate::schema::SortDirection;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortKey {
    pub name: String,
    #[serde(default = "default_ascending")]
    pub ascending: bool,
    /// Compare case-folded strings for this key even if the column is not
    /// flagged case-insensitive.
    #[serde(default)]
    pub case_insensitive: bool,
}

fn default_ascending() -> bool {
    true
}

impl SortKey {
    pub fn new(name: impl Into<String>, ascending: bool) -> Self {
        Self {
            name: name.into(),
            ascending,
            case_insensitive: false,
        }
    }

    pub fn asc(name: impl Into<String>) -> Self {
        Self::new(name, true)
    }

    pub fn desc(name: impl Into<String>) -> Self {
        Self::new(name, false)
    }

    pub fn with_case_insensitive(mut self, yes: bool) -> Self {
        self.case_insensitive = yes;
        self
    }

    pub fn direction(&self) -> SortDirection {
        SortDirection::from_ascending(self.ascending)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeySpec(pub Vec<SortKey>);

impl KeySpec {
    pub fn new(keys: Vec<SortKey>) -> Self {
        Self(keys)
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|k| k.name.as_str())
    }
}

impl From<Vec<SortKey>> for KeySpec {
    fn from(keys: Vec<SortKey>) -> Self {
        KeySpec(keys)
    }
}

impl FromIterator<SortKey> for KeySpec {
    fn from_iter<I: IntoIterator<Item = SortKey>>(iter: I) -> Self {
        KeySpec(iter.into_iter().collect())
    }
}
