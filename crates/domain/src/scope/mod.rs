//! Variable scopes and scope-tagged definition bundles

mod store;
mod value;

use serde::{Deserialize, Serialize};

use crate::variable::VariableDefinition;

pub use store::{ResolvedVariable, VALUE_PARAM_PREFIX, VariableStore};
pub use value::{ALL_VALUE, VariableValue};

/// Scope a variable definition comes from.
///
/// Lower scopes shadow higher ones: a dashboard-local definition hides a
/// project one of the same name, which hides a global one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableScope {
    /// Defined for every project - lowest precedence.
    Global = 0,
    /// Defined for one project.
    Project = 1,
    /// Defined on the dashboard itself - highest precedence.
    Local = 2,
}

impl VariableScope {
    /// Returns the precedence level (higher = takes priority).
    #[must_use]
    pub const fn precedence(&self) -> u8 {
        *self as u8
    }

    /// Returns a human-readable name for the scope.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Global => "Global",
            Self::Project => "Project",
            Self::Local => "Local",
        }
    }
}

/// A scope-tagged bundle of definitions supplied from outside the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalVariableDefinition {
    /// Scope every definition of the bundle belongs to.
    pub scope: VariableScope,
    /// Human label of the origin: `global` or the project name.
    pub source: String,
    /// Definitions, unique by name.
    pub definitions: Vec<VariableDefinition>,
}

impl ExternalVariableDefinition {
    /// Creates a bundle, keeping the first definition of each name.
    #[must_use]
    pub fn new(
        scope: VariableScope,
        source: impl Into<String>,
        definitions: impl IntoIterator<Item = VariableDefinition>,
    ) -> Self {
        let mut unique: Vec<VariableDefinition> = Vec::new();
        for definition in definitions {
            if !unique.iter().any(|d| d.name == definition.name) {
                unique.push(definition);
            }
        }
        Self {
            scope,
            source: source.into(),
            definitions: unique,
        }
    }

    /// Finds a definition by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&VariableDefinition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    /// Returns true if the bundle has no definitions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
