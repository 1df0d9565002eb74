//! Merge global and project variables into external definitions

use varscope_domain::{ExternalVariableDefinition, Variable, VariableDefinition, VariableScope};

/// Project name meaning "no project selected".
pub const NO_PROJECT: &str = "none";

/// Source label of the global bundle.
pub const GLOBAL_SOURCE: &str = "global";

/// Normalizes a selected project name: unset, empty and the [`NO_PROJECT`]
/// sentinel all mean no project.
#[must_use]
pub fn selected_project(name: Option<&str>) -> Option<&str> {
    name.filter(|n| !n.is_empty() && *n != NO_PROJECT)
}

/// Combines the global and project scopes into scope-tagged bundles.
///
/// The output is always `[project, global]`. Which definition wins on a name
/// collision is decided by the scope tag when the bundles are resolved, not
/// by this order.
pub struct ScopeMerger;

impl ScopeMerger {
    /// Builds both bundles.
    ///
    /// # Arguments
    /// * `project_name` - Selected project, possibly the sentinel
    /// * `global_variables` - Variables returned by the global listing
    /// * `project_variables` - Variables returned by the project listing
    #[must_use]
    pub fn merge(
        project_name: Option<&str>,
        global_variables: &[Variable],
        project_variables: &[Variable],
    ) -> Vec<ExternalVariableDefinition> {
        vec![
            Self::project_bundle(project_name, project_variables),
            Self::global_bundle(global_variables),
        ]
    }

    /// Builds the project bundle.
    ///
    /// With no project selected the bundle is empty and labelled `""`, so no
    /// project variable can leak into the view. Variables owned by another
    /// project are dropped.
    #[must_use]
    pub fn project_bundle(
        project_name: Option<&str>,
        variables: &[Variable],
    ) -> ExternalVariableDefinition {
        let Some(project) = selected_project(project_name) else {
            return ExternalVariableDefinition::new(VariableScope::Project, "", Vec::new());
        };

        let definitions = variables.iter().filter_map(|variable| {
            if variable.project_name() == Some(project) {
                Some(VariableDefinition::from(variable))
            } else {
                tracing::warn!(
                    variable = variable.name(),
                    owner = ?variable.project_name(),
                    project,
                    "Skipping variable from another scope"
                );
                None
            }
        });
        Self::bundle(VariableScope::Project, project, definitions)
    }

    /// Builds the global bundle.
    #[must_use]
    pub fn global_bundle(variables: &[Variable]) -> ExternalVariableDefinition {
        Self::bundle(
            VariableScope::Global,
            GLOBAL_SOURCE,
            variables.iter().map(VariableDefinition::from),
        )
    }

    fn bundle(
        scope: VariableScope,
        source: &str,
        definitions: impl Iterator<Item = VariableDefinition>,
    ) -> ExternalVariableDefinition {
        let definitions: Vec<VariableDefinition> = definitions.collect();
        let count = definitions.len();
        let bundle = ExternalVariableDefinition::new(scope, source, definitions);
        if bundle.definitions.len() != count {
            tracing::warn!(
                source,
                dropped = count - bundle.definitions.len(),
                "Duplicate variable names in scope, keeping the first definition"
            );
        }
        bundle
    }
}
