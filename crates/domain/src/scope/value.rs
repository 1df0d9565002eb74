//! Selected variable values

use serde::{Deserialize, Serialize};

/// Value standing for "every option" of a list variable.
pub const ALL_VALUE: &str = "$__all";

/// The value currently selected for a variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableValue {
    /// One value.
    Single(String),
    /// Several values (multi-select list variables).
    Multiple(Vec<String>),
}

impl VariableValue {
    /// Returns the "All" selection.
    #[must_use]
    pub fn all() -> Self {
        Self::Single(ALL_VALUE.to_string())
    }

    /// Returns true if this is the "All" selection.
    #[must_use]
    pub fn is_all(&self) -> bool {
        matches!(self, Self::Single(v) if v == ALL_VALUE)
    }

    /// Returns the values as a list.
    #[must_use]
    pub fn as_list(&self) -> Vec<&str> {
        match self {
            Self::Single(value) => vec![value.as_str()],
            Self::Multiple(values) => values.iter().map(String::as_str).collect(),
        }
    }

    /// Builds a value from repeated query parameter values.
    ///
    /// Returns `None` when `values` is empty.
    #[must_use]
    pub fn from_list(mut values: Vec<String>) -> Option<Self> {
        match values.len() {
            0 => None,
            1 => values.pop().map(Self::Single),
            _ => Some(Self::Multiple(values)),
        }
    }
}
