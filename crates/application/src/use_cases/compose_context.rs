//! Resolution context composition
//!
//! A resolution context bundles everything a variable query needs: the
//! addressable datasources, the time range and the visible variables. It is
//! composed in that order, because each layer may depend on the ones
//! before it.

use std::sync::Arc;

use varscope_domain::time_range::{END_PARAM, START_PARAM};
use varscope_domain::{
    AbsoluteTimeRange, DatasourceResource, DatasourceSelector, DatasourceStore,
    ExternalVariableDefinition, TimeRange, VALUE_PARAM_PREFIX, VariableStore, VariableValue,
};

use crate::error::{ApplicationError, ApplicationResult};
use crate::ports::{Clock, QueryParamStore};

use super::merge_scopes::selected_project;

/// Datasources, time range and variables of one view.
pub struct ResolvedContext {
    datasources: DatasourceStore,
    time_range: TimeRange,
    variables: VariableStore,
    params: Arc<dyn QueryParamStore>,
    clock: Arc<dyn Clock>,
}

impl ResolvedContext {
    /// Returns the addressable datasources.
    #[must_use]
    pub const fn datasources(&self) -> &DatasourceStore {
        &self.datasources
    }

    /// Finds the datasource answering `selector`.
    #[must_use]
    pub fn find_datasource(&self, selector: &DatasourceSelector) -> Option<&DatasourceResource> {
        self.datasources.find(selector)
    }

    /// Returns the current time range.
    #[must_use]
    pub const fn time_range(&self) -> &TimeRange {
        &self.time_range
    }

    /// Changes the time range and writes it to the shareable parameters.
    pub fn set_time_range(&mut self, time_range: TimeRange) {
        self.params.replace(
            &|key| key == START_PARAM || key == END_PARAM,
            time_range.to_query_params(),
        );
        tracing::debug!(?time_range, "Time range changed");
        self.time_range = time_range;
    }

    /// Returns the concrete window of the time range, as of now.
    #[must_use]
    pub fn window(&self) -> AbsoluteTimeRange {
        self.time_range.to_absolute(self.clock.now())
    }

    /// Returns the visible variables.
    #[must_use]
    pub const fn variables(&self) -> &VariableStore {
        &self.variables
    }

    /// Selects a value for `name` and writes it to the shareable
    /// parameters.
    ///
    /// # Errors
    /// Returns `ApplicationError::Domain` if `name` is not visible or does
    /// not accept `value`.
    pub fn set_variable_value(&mut self, name: &str, value: VariableValue) -> ApplicationResult<()> {
        let key = format!("{VALUE_PARAM_PREFIX}{name}");
        let params = value
            .as_list()
            .into_iter()
            .map(|v| (key.clone(), v.to_string()))
            .collect();
        self.variables.set_value(name, value)?;
        self.params.replace(&|k| k == key, params);
        Ok(())
    }
}

impl std::fmt::Debug for ResolvedContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedContext")
            .field("datasources", &self.datasources)
            .field("time_range", &self.time_range)
            .field("variables", &self.variables)
            .finish_non_exhaustive()
    }
}

/// Builds [`ResolvedContext`]s against the host's parameters and clock.
#[derive(Clone)]
pub struct ResolutionContextComposer {
    params: Arc<dyn QueryParamStore>,
    clock: Arc<dyn Clock>,
}

impl ResolutionContextComposer {
    /// Creates a new composer.
    pub fn new(params: Arc<dyn QueryParamStore>, clock: Arc<dyn Clock>) -> Self {
        Self { params, clock }
    }

    /// Composes a context: datasources, then time range, then variables.
    ///
    /// # Arguments
    /// * `project` - Selected project, possibly the sentinel
    /// * `datasources` - Full datasource inventory
    /// * `initial_time_range` - Used when the parameters carry none
    /// * `definitions` - External bundles seeding the variable store
    ///
    /// # Errors
    /// Returns `ApplicationError::Resolution` if the datasource inventory is
    /// unusable; nothing of the context is built in that case.
    pub fn compose(
        &self,
        project: Option<&str>,
        datasources: Vec<DatasourceResource>,
        initial_time_range: TimeRange,
        definitions: Vec<ExternalVariableDefinition>,
    ) -> ApplicationResult<ResolvedContext> {
        let datasources = DatasourceStore::new(selected_project(project), datasources)
            .map_err(|e| {
                tracing::warn!(error = %e, "Datasource inventory rejected");
                ApplicationError::Resolution(e.to_string())
            })?;

        let params = self.params.params();
        let time_range = match TimeRange::from_query_params(&params) {
            Some(Ok(range)) => range,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "Ignoring invalid time range parameters");
                initial_time_range
            }
            None => initial_time_range,
        };

        let mut variables = VariableStore::with_external(definitions);
        variables.apply_query_params(&params);

        tracing::debug!(
            datasources = datasources.len(),
            variables = variables.names().len(),
            "Resolution context composed"
        );

        Ok(ResolvedContext {
            datasources,
            time_range,
            variables,
            params: Arc::clone(&self.params),
            clock: Arc::clone(&self.clock),
        })
    }

    /// Composes the context of an editing session.
    ///
    /// The variable store starts empty so the edited variable can never
    /// resolve against itself.
    ///
    /// # Errors
    /// See [`Self::compose`].
    pub fn for_editing(
        &self,
        project: Option<&str>,
        datasources: Vec<DatasourceResource>,
        initial_time_range: TimeRange,
    ) -> ApplicationResult<ResolvedContext> {
        self.compose(project, datasources, initial_time_range, Vec::new())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::test_support::{FixedClock, MemoryParams};
    use crate::use_cases::ScopeMerger;
    use pretty_assertions::assert_eq;
    use varscope_domain::{Variable, VariableScope, VariableSpec};

    const PROM: &str = "PrometheusDatasource";

    fn composer(params: Arc<MemoryParams>) -> ResolutionContextComposer {
        ResolutionContextComposer::new(params, FixedClock::at_millis(7_200_000))
    }

    fn inventory() -> Vec<DatasourceResource> {
        vec![
            DatasourceResource::global("prom", PROM).as_default(),
            DatasourceResource::project("infra", "prom-infra", PROM).as_default(),
        ]
    }

    #[test]
    fn test_editing_context_has_no_variables() {
        let context = composer(MemoryParams::with(&[]))
            .for_editing(Some("infra"), inventory(), TimeRange::default())
            .expect("Should compose");

        assert!(context.variables().is_empty());
        assert_eq!(context.time_range(), &TimeRange::default());
        let default = context
            .find_datasource(&DatasourceSelector::kind(PROM))
            .expect("Should find default");
        assert_eq!(default.name(), "prom-infra");
    }

    #[test]
    fn test_exploration_context_resolves_project_first() {
        let bundles = ScopeMerger::merge(
            Some("infra"),
            &[Variable::global("region", VariableSpec::text("global"))],
            &[Variable::project("infra", "region", VariableSpec::text("project"))],
        );
        let context = composer(MemoryParams::with(&[]))
            .compose(Some("infra"), inventory(), TimeRange::default(), bundles)
            .expect("Should compose");

        let region = context.variables().resolve("region").expect("Should resolve");
        assert_eq!(region.scope, VariableScope::Project);
    }

    #[test]
    fn test_bad_inventory_fails_before_anything_else() {
        let params = MemoryParams::with(&[("start", "not a duration")]);
        let broken = vec![DatasourceResource::global("prom", "")];

        let result = composer(params).compose(None, broken, TimeRange::default(), Vec::new());

        assert!(matches!(result, Err(ApplicationError::Resolution(_))));
    }

    #[test]
    fn test_time_range_comes_from_params() {
        let context = composer(MemoryParams::with(&[("start", "6h")]))
            .for_editing(None, inventory(), TimeRange::default())
            .expect("Should compose");

        assert_eq!(context.time_range(), &TimeRange::relative("6h").expect("valid"));
        let window = context.window();
        assert_eq!((window.end - window.start).num_hours(), 6);
    }

    #[test]
    fn test_invalid_time_params_fall_back() {
        let context = composer(MemoryParams::with(&[("start", "soon")]))
            .for_editing(None, inventory(), TimeRange::default())
            .expect("Should compose");

        assert_eq!(context.time_range(), &TimeRange::default());
    }

    #[test]
    fn test_time_range_change_is_written_back() {
        let params = MemoryParams::with(&[("start", "1h"), ("project", "infra")]);
        let mut context = composer(Arc::clone(&params))
            .for_editing(None, inventory(), TimeRange::default())
            .expect("Should compose");

        context.set_time_range(TimeRange::relative("24h").expect("valid"));

        assert_eq!(params.get("start"), vec!["24h"]);
        assert_eq!(params.get("project"), vec!["infra"]);
        assert_eq!(params.params().len(), 2);
    }

    #[test]
    fn test_variable_values_follow_params() {
        let params = MemoryParams::with(&[("var-region", "us")]);
        let bundles = ScopeMerger::merge(
            None,
            &[Variable::global("region", VariableSpec::text("eu"))],
            &[],
        );
        let mut context = composer(Arc::clone(&params))
            .compose(None, inventory(), TimeRange::default(), bundles)
            .expect("Should compose");

        assert_eq!(
            context.variables().value("region"),
            Some(VariableValue::Single("us".to_string()))
        );

        context
            .set_variable_value("region", VariableValue::Single("ap".to_string()))
            .expect("Should set");
        assert_eq!(params.get("var-region"), vec!["ap"]);
        assert!(context.set_variable_value("missing", VariableValue::all()).is_err());
    }
}
