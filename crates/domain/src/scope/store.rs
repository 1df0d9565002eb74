//! Variable store with scope-precedence resolution
//!
//! Holds dashboard-local definitions, the external bundles supplied by the
//! host, and the values currently selected for each variable.
//! Resolution order (highest wins):
//! 1. Local definitions
//! 2. Project bundles
//! 3. Global bundles
//!
//! Within one scope a later bundle shadows an earlier one.

use std::collections::BTreeMap;

use super::value::VariableValue;
use super::{ExternalVariableDefinition, VariableScope};
use crate::error::{DomainError, DomainResult};
use crate::variable::VariableDefinition;

/// Query parameter prefix used to share selected values.
pub const VALUE_PARAM_PREFIX: &str = "var-";

/// A definition together with the scope it was resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVariable {
    /// Winning definition.
    pub definition: VariableDefinition,
    /// Scope of the winning definition.
    pub scope: VariableScope,
    /// Origin label (`local`, `global`, or a project name).
    pub source: String,
}

impl ResolvedVariable {
    /// Returns the variable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.definition.name
    }
}

/// Variables visible to one dashboard or exploration view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableStore {
    local: Vec<VariableDefinition>,
    external: Vec<ExternalVariableDefinition>,
    values: BTreeMap<String, VariableValue>,
}

impl VariableStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with external bundles.
    #[must_use]
    pub fn with_external(external: Vec<ExternalVariableDefinition>) -> Self {
        Self {
            external,
            ..Self::default()
        }
    }

    /// Sets the dashboard-local definitions.
    #[must_use]
    pub fn with_local(mut self, local: Vec<VariableDefinition>) -> Self {
        self.local = local;
        self
    }

    /// Returns the external bundles in evaluation order.
    #[must_use]
    pub fn external(&self) -> &[ExternalVariableDefinition] {
        &self.external
    }

    /// Returns the dashboard-local definitions.
    #[must_use]
    pub fn local(&self) -> &[VariableDefinition] {
        &self.local
    }

    /// Returns true if no definition is visible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.local.is_empty() && self.external.iter().all(ExternalVariableDefinition::is_empty)
    }

    /// Returns every definition of `name`, winner first.
    #[must_use]
    pub fn candidates(&self, name: &str) -> Vec<ResolvedVariable> {
        let mut found: Vec<(usize, ResolvedVariable)> = Vec::new();

        for definition in self.local.iter().filter(|d| d.name == name) {
            found.push((
                usize::MAX,
                ResolvedVariable {
                    definition: definition.clone(),
                    scope: VariableScope::Local,
                    source: "local".to_string(),
                },
            ));
        }

        for (position, bundle) in self.external.iter().enumerate() {
            if let Some(definition) = bundle.get(name) {
                found.push((
                    position,
                    ResolvedVariable {
                        definition: definition.clone(),
                        scope: bundle.scope,
                        source: bundle.source.clone(),
                    },
                ));
            }
        }

        // Higher scope first, then later bundle first within a scope.
        found.sort_by(|(pos_a, a), (pos_b, b)| {
            b.scope
                .precedence()
                .cmp(&a.scope.precedence())
                .then(pos_b.cmp(pos_a))
        });
        found.into_iter().map(|(_, resolved)| resolved).collect()
    }

    /// Resolves `name` to its winning definition.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<ResolvedVariable> {
        self.candidates(name).into_iter().next()
    }

    /// Returns all variable names across all scopes, highest scope first,
    /// without duplicates.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut bundles: Vec<&ExternalVariableDefinition> = self.external.iter().collect();
        bundles.sort_by_key(|b| std::cmp::Reverse(b.scope.precedence()));

        let mut names: Vec<String> = Vec::new();
        let all = self
            .local
            .iter()
            .chain(bundles.into_iter().flat_map(|b| b.definitions.iter()));
        for definition in all {
            if !names.contains(&definition.name) {
                names.push(definition.name.clone());
            }
        }
        names
    }

    /// Resolves every visible variable, one entry per name.
    #[must_use]
    pub fn resolve_all(&self) -> Vec<ResolvedVariable> {
        self.names()
            .iter()
            .filter_map(|name| self.resolve(name))
            .collect()
    }

    /// Selects a value for `name`.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidVariable` if `name` does not resolve, or
    /// if several values are given to a variable that does not allow it.
    pub fn set_value(&mut self, name: &str, value: VariableValue) -> DomainResult<()> {
        let resolved = self
            .resolve(name)
            .ok_or_else(|| DomainError::InvalidVariable(format!("unknown variable '{name}'")))?;

        if matches!(value, VariableValue::Multiple(_)) && !resolved.definition.spec.allow_multiple {
            return Err(DomainError::InvalidVariable(format!(
                "variable '{name}' does not allow multiple values"
            )));
        }

        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Returns the value selected for `name`, falling back to the default
    /// value of its definition.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<VariableValue> {
        if let Some(value) = self.values.get(name) {
            return Some(value.clone());
        }
        self.resolve(name)
            .and_then(|r| r.definition.spec.default_value)
            .map(VariableValue::Single)
    }

    /// Encodes the explicitly selected values as `var-<name>` query
    /// parameters.
    #[must_use]
    pub fn to_query_params(&self) -> Vec<(String, String)> {
        self.values
            .iter()
            .flat_map(|(name, value)| {
                value
                    .as_list()
                    .into_iter()
                    .map(move |v| (format!("{VALUE_PARAM_PREFIX}{name}"), v.to_string()))
            })
            .collect()
    }

    /// Applies `var-<name>` query parameters, skipping names that do not
    /// resolve or values the definition does not accept.
    pub fn apply_query_params(&mut self, params: &[(String, String)]) {
        let mut grouped: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for (key, value) in params {
            if let Some(name) = key.strip_prefix(VALUE_PARAM_PREFIX) {
                grouped.entry(name).or_default().push(value.clone());
            }
        }
        for (name, values) in grouped {
            if let Some(value) = VariableValue::from_list(values) {
                // Stale parameters from a shared link are not an error.
                let _ = self.set_value(name, value);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::variable::VariableSpec;
    use pretty_assertions::assert_eq;

    fn text(name: &str, value: &str) -> VariableDefinition {
        VariableDefinition::new(name, VariableSpec::text(value))
    }

    fn global_bundle(definitions: Vec<VariableDefinition>) -> ExternalVariableDefinition {
        ExternalVariableDefinition::new(VariableScope::Global, "global", definitions)
    }

    fn project_bundle(definitions: Vec<VariableDefinition>) -> ExternalVariableDefinition {
        ExternalVariableDefinition::new(VariableScope::Project, "infra", definitions)
    }

    #[test]
    fn test_project_wins_when_listed_first() {
        let store = VariableStore::with_external(vec![
            project_bundle(vec![text("region", "project")]),
            global_bundle(vec![text("region", "global")]),
        ]);

        let resolved = store.resolve("region").expect("Should resolve");
        assert_eq!(resolved.scope, VariableScope::Project);
        assert_eq!(resolved.definition.spec.query, "project");
    }

    #[test]
    fn test_project_wins_when_listed_last() {
        let store = VariableStore::with_external(vec![
            global_bundle(vec![text("region", "global")]),
            project_bundle(vec![text("region", "project")]),
        ]);

        let resolved = store.resolve("region").expect("Should resolve");
        assert_eq!(resolved.scope, VariableScope::Project);
    }

    #[test]
    fn test_later_bundle_wins_within_scope() {
        let store = VariableStore::with_external(vec![
            global_bundle(vec![text("region", "first")]),
            global_bundle(vec![text("region", "second")]),
        ]);

        let resolved = store.resolve("region").expect("Should resolve");
        assert_eq!(resolved.definition.spec.query, "second");
    }

    #[test]
    fn test_local_shadows_external() {
        let store = VariableStore::with_external(vec![project_bundle(vec![text("env", "p")])])
            .with_local(vec![text("env", "local")]);

        let resolved = store.resolve("env").expect("Should resolve");
        assert_eq!(resolved.scope, VariableScope::Local);
        assert_eq!(store.candidates("env").len(), 2);
    }

    #[test]
    fn test_resolve_all_is_union() {
        let store = VariableStore::with_external(vec![
            project_bundle(vec![text("instance", "a"), text("region", "p")]),
            global_bundle(vec![text("region", "g"), text("cluster", "c")]),
        ]);

        let resolved = store.resolve_all();
        let names: Vec<&str> = resolved.iter().map(ResolvedVariable::name).collect();
        assert_eq!(names, vec!["instance", "region", "cluster"]);
        assert_eq!(resolved[1].scope, VariableScope::Project);
    }

    #[test]
    fn test_resolve_not_found() {
        assert!(VariableStore::new().resolve("missing").is_none());
        assert!(VariableStore::new().is_empty());
    }

    #[test]
    fn test_value_falls_back_to_default() {
        let mut spec = VariableSpec::text("x");
        spec.default_value = Some("eu".to_string());
        let store = VariableStore::with_external(vec![global_bundle(vec![VariableDefinition::new(
            "region", spec,
        )])]);

        assert_eq!(store.value("region"), Some(VariableValue::Single("eu".to_string())));
    }

    #[test]
    fn test_multiple_values_require_allow_multiple() {
        let mut store =
            VariableStore::with_external(vec![global_bundle(vec![text("region", "eu")])]);

        let result = store.set_value(
            "region",
            VariableValue::Multiple(vec!["eu".to_string(), "us".to_string()]),
        );
        assert!(result.is_err());
        assert!(store.set_value("unknown", VariableValue::all()).is_err());
    }

    #[test]
    fn test_query_params_round_trip() {
        let mut spec = VariableSpec::text("");
        spec.allow_multiple = true;
        let definitions = vec![VariableDefinition::new("region", spec), text("env", "")];
        let mut store = VariableStore::with_external(vec![global_bundle(definitions.clone())]);
        store
            .set_value(
                "region",
                VariableValue::Multiple(vec!["eu".to_string(), "us".to_string()]),
            )
            .expect("Should set");
        store
            .set_value("env", VariableValue::Single("prod".to_string()))
            .expect("Should set");

        let params = store.to_query_params();
        let mut restored = VariableStore::with_external(vec![global_bundle(definitions)]);
        restored.apply_query_params(&params);

        assert_eq!(restored.value("region"), store.value("region"));
        assert_eq!(restored.value("env"), Some(VariableValue::Single("prod".to_string())));
    }
}
