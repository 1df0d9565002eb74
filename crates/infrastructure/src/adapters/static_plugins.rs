//! Built-in plugin that needs no remote bundle.
//!
//! List variables are evaluated from their query text alone: the query is a
//! comma-separated list of values, where `${name}` is replaced by the value
//! currently selected for variable `name`.

use std::sync::Arc;

use async_trait::async_trait;
use varscope_application::ports::{PluginError, PluginLoader, QueryCapability, QueryContext};
use varscope_domain::{VariableDefinition, VariableKind};

/// Evaluates static list queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticQueryCapability;

impl StaticQueryCapability {
    fn interpolate(query: &str, context: &QueryContext<'_>) -> String {
        context
            .variables
            .names()
            .iter()
            .fold(query.to_string(), |query, name| {
                let placeholder = format!("${{{name}}}");
                if !query.contains(&placeholder) {
                    return query;
                }
                let value = context
                    .variables
                    .value(name)
                    .map(|v| v.as_list().join(","))
                    .unwrap_or_default();
                query.replace(&placeholder, &value)
            })
    }
}

#[async_trait]
impl QueryCapability for StaticQueryCapability {
    async fn list_values(
        &self,
        definition: &VariableDefinition,
        context: QueryContext<'_>,
    ) -> Result<Vec<String>, PluginError> {
        if definition.spec.kind == VariableKind::TextVariable {
            return Ok(vec![definition.spec.query.clone()]);
        }

        let query = Self::interpolate(&definition.spec.query, &context);
        let mut values: Vec<String> = Vec::new();
        for value in query.split(',').map(str::trim).filter(|v| !v.is_empty()) {
            if !values.iter().any(|v| v == value) {
                values.push(value.to_string());
            }
        }
        if values.is_empty() {
            return Err(PluginError::Query(format!(
                "query of '{}' yields no values",
                definition.name
            )));
        }
        Ok(values)
    }
}

/// Loader that always provides [`StaticQueryCapability`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticPluginLoader;

impl StaticPluginLoader {
    /// Creates a new loader.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PluginLoader for StaticPluginLoader {
    async fn load(&self) -> Result<Arc<dyn QueryCapability>, PluginError> {
        Ok(Arc::new(StaticQueryCapability))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use varscope_domain::{
        AbsoluteTimeRange, DatasourceSelector, ExternalVariableDefinition, VariableScope,
        VariableSpec, VariableStore, VariableValue,
    };

    fn window() -> AbsoluteTimeRange {
        let at = |ms| Utc.timestamp_millis_opt(ms).single().expect("valid");
        AbsoluteTimeRange::new(at(0), at(1000)).expect("valid")
    }

    fn list(name: &str, query: &str) -> VariableDefinition {
        VariableDefinition::new(
            name,
            VariableSpec::list(query, DatasourceSelector::kind("PrometheusDatasource")),
        )
    }

    async fn evaluate(definition: &VariableDefinition, variables: &VariableStore) -> Result<Vec<String>, PluginError> {
        let capability = StaticPluginLoader::new().load().await.expect("Should load");
        let context = QueryContext {
            datasource: None,
            window: window(),
            variables,
        };
        capability.list_values(definition, context).await
    }

    #[tokio::test]
    async fn test_splits_and_dedupes() {
        let values = evaluate(&list("region", " eu, us ,eu,,ap"), &VariableStore::new())
            .await
            .expect("Should evaluate");

        assert_eq!(values, vec!["eu", "us", "ap"]);
    }

    #[tokio::test]
    async fn test_interpolates_selected_values() {
        let mut variables = VariableStore::with_external(vec![ExternalVariableDefinition::new(
            VariableScope::Global,
            "global",
            vec![VariableDefinition::new("region", VariableSpec::text("eu"))],
        )]);
        variables
            .set_value("region", VariableValue::Single("us".to_string()))
            .expect("Should set");

        let values = evaluate(&list("zone", "${region}-1,${region}-2"), &variables)
            .await
            .expect("Should evaluate");

        assert_eq!(values, vec!["us-1", "us-2"]);
    }

    #[tokio::test]
    async fn test_empty_query_is_an_error() {
        let result = evaluate(&list("region", " , "), &VariableStore::new()).await;

        assert!(matches!(result, Err(PluginError::Query(_))));
    }

    #[tokio::test]
    async fn test_text_variable_yields_its_value() {
        let definition = VariableDefinition::new("env", VariableSpec::text("prod"));

        let values = evaluate(&definition, &VariableStore::new())
            .await
            .expect("Should evaluate");

        assert_eq!(values, vec!["prod"]);
    }
}
