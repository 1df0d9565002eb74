//! Variable definition payloads

use serde::{Deserialize, Serialize};

use crate::datasource::DatasourceSelector;
use crate::scope::VariableScope;

/// Kind of a variable, which decides how its query is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum VariableKind {
    /// A free-text variable. `query` holds the literal value.
    #[default]
    TextVariable,
    /// A variable whose options come from evaluating `query`.
    ListVariable,
}

/// Sort order applied to list variable options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VariableSort {
    /// Keep the order returned by the query.
    None,
    /// Alphabetical, ascending.
    AlphabeticalAsc,
    /// Alphabetical, descending.
    AlphabeticalDesc,
    /// Numerical, ascending.
    NumericalAsc,
    /// Numerical, descending.
    NumericalDesc,
}

impl VariableSort {
    /// Sorts `values` in place.
    ///
    /// Numerical orders place values that do not parse as numbers last, in
    /// their original order.
    pub fn apply(self, values: &mut [String]) {
        let number = |v: &String| v.trim().parse::<f64>().ok();
        match self {
            Self::None => {}
            Self::AlphabeticalAsc => values.sort(),
            Self::AlphabeticalDesc => values.sort_by(|a, b| b.cmp(a)),
            Self::NumericalAsc => values.sort_by(|a, b| match (number(a), number(b)) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            }),
            Self::NumericalDesc => values.sort_by(|a, b| match (number(a), number(b)) {
                (Some(x), Some(y)) => y.total_cmp(&x),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            }),
        }
    }
}

/// Presentation options for a variable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableDisplay {
    /// Label shown instead of the variable name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Help text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Hide the variable from the dashboard toolbar.
    #[serde(default)]
    pub hidden: bool,
}

/// Scope-agnostic definition payload of a variable.
///
/// The spec is a value type: edits replace it wholesale through a draft,
/// it is never patched in place on a persisted [`super::Variable`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableSpec {
    /// Variable kind.
    pub kind: VariableKind,
    /// Display options.
    #[serde(default)]
    pub display: VariableDisplay,
    /// Literal value for text variables, option query for list variables.
    #[serde(default)]
    pub query: String,
    /// Datasource the query runs against (list variables).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datasource: Option<DatasourceSelector>,
    /// Value selected when nothing else is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// Allow selecting several options at once.
    #[serde(default)]
    pub allow_multiple: bool,
    /// Offer an "All" option.
    #[serde(default)]
    pub allow_all_value: bool,
    /// Option ordering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<VariableSort>,
}

impl VariableSpec {
    /// Creates a text variable spec with the given value.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            kind: VariableKind::TextVariable,
            query: value.into(),
            ..Self::default()
        }
    }

    /// Creates a list variable spec evaluated against a datasource.
    #[must_use]
    pub fn list(query: impl Into<String>, datasource: DatasourceSelector) -> Self {
        Self {
            kind: VariableKind::ListVariable,
            query: query.into(),
            datasource: Some(datasource),
            ..Self::default()
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display.name = Some(name.into());
        self
    }
}

/// Metadata identifying a persisted variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariableMetadata {
    /// Name, unique within its scope.
    pub name: String,
    /// Owning project. `None` means the variable is global.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

/// A persisted variable resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    /// Identity of the resource.
    pub metadata: VariableMetadata,
    /// Definition payload.
    pub spec: VariableSpec,
}

impl Variable {
    /// Creates a global variable.
    #[must_use]
    pub fn global(name: impl Into<String>, spec: VariableSpec) -> Self {
        Self {
            metadata: VariableMetadata {
                name: name.into(),
                project: None,
            },
            spec,
        }
    }

    /// Creates a project variable.
    #[must_use]
    pub fn project(project: impl Into<String>, name: impl Into<String>, spec: VariableSpec) -> Self {
        Self {
            metadata: VariableMetadata {
                name: name.into(),
                project: Some(project.into()),
            },
            spec,
        }
    }

    /// Returns the variable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Returns the owning project, if any.
    #[must_use]
    pub fn project_name(&self) -> Option<&str> {
        self.metadata.project.as_deref()
    }

    /// Returns the scope this variable is defined in.
    #[must_use]
    pub const fn scope(&self) -> VariableScope {
        if self.metadata.project.is_some() {
            VariableScope::Project
        } else {
            VariableScope::Global
        }
    }

    /// Folds the name into the spec, producing the runtime definition.
    #[must_use]
    pub fn to_definition(&self) -> super::VariableDefinition {
        super::VariableDefinition {
            name: self.metadata.name.clone(),
            spec: self.spec.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scope_follows_project() {
        let global = Variable::global("region", VariableSpec::text("eu"));
        let project = Variable::project("infra", "region", VariableSpec::text("us"));

        assert_eq!(global.scope(), VariableScope::Global);
        assert_eq!(project.scope(), VariableScope::Project);
        assert_eq!(project.project_name(), Some("infra"));
    }

    #[test]
    fn test_spec_json_shape() {
        let spec = VariableSpec::list("up", DatasourceSelector::kind("PrometheusDatasource"))
            .with_display_name("Instance");
        let json = serde_json::to_value(&spec).expect("Should serialize");

        assert_eq!(json["kind"], "ListVariable");
        assert_eq!(json["display"]["name"], "Instance");
        assert_eq!(json["datasource"]["kind"], "PrometheusDatasource");
        assert_eq!(json["allowMultiple"], false);
    }

    #[test]
    fn test_sort_orders() {
        let values = || vec!["10".to_string(), "b".to_string(), "9".to_string()];

        let mut alpha = values();
        VariableSort::AlphabeticalAsc.apply(&mut alpha);
        assert_eq!(alpha, vec!["10", "9", "b"]);

        let mut numeric = values();
        VariableSort::NumericalAsc.apply(&mut numeric);
        assert_eq!(numeric, vec!["9", "10", "b"]);

        let mut numeric_desc = values();
        VariableSort::NumericalDesc.apply(&mut numeric_desc);
        assert_eq!(numeric_desc, vec!["10", "9", "b"]);
    }

    #[test]
    fn test_variable_deserializes_without_project() {
        let json = r#"{"metadata":{"name":"env"},"spec":{"kind":"TextVariable","query":"prod"}}"#;
        let variable: Variable = serde_json::from_str(json).expect("Should parse");

        assert_eq!(variable.name(), "env");
        assert_eq!(variable.project_name(), None);
        assert_eq!(variable.spec.query, "prod");
    }
}
