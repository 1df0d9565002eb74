//! Runtime variable definitions

use serde::{Deserialize, Serialize};

use super::spec::{Variable, VariableMetadata, VariableSpec};

/// A variable definition as consumed outside the editor: the name is folded
/// into the spec payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableDefinition {
    /// Variable name.
    pub name: String,
    /// Definition payload.
    #[serde(flatten)]
    pub spec: VariableSpec,
}

impl VariableDefinition {
    /// Creates a definition from a name and a spec.
    #[must_use]
    pub fn new(name: impl Into<String>, spec: VariableSpec) -> Self {
        Self {
            name: name.into(),
            spec,
        }
    }

    /// Unfolds the definition back into a persisted variable in `project`.
    #[must_use]
    pub fn into_variable(self, project: Option<String>) -> Variable {
        Variable {
            metadata: VariableMetadata {
                name: self.name,
                project,
            },
            spec: self.spec,
        }
    }
}

impl From<&Variable> for VariableDefinition {
    fn from(variable: &Variable) -> Self {
        variable.to_definition()
    }
}
