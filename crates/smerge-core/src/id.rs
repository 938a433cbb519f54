//! Input identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of an upstream in the driver's input list. Lower ordinals win
/// ties between rows that compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputId(u32);

impl InputId {
    pub const fn new(ordinal: u32) -> Self {
        Self(ordinal)
    }

    pub const fn ordinal(self) -> usize {
        self.0 as usize
    }
}

impl TryFrom<usize> for InputId {
    type Error = std::num::TryFromIntError;

    fn try_from(v: usize) -> Result<Self, Self::Error> {
        u32::try_from(v).map(InputId)
    }
}

impl fmt::Display for InputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "input #{}", self.0)
    }
}
