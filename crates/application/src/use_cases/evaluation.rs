//! Variable option evaluation

use varscope_domain::{ALL_VALUE, VariableDefinition, VariableKind};

use crate::error::{ApplicationError, ApplicationResult};
use crate::ports::{QueryCapability, QueryContext};

use super::compose_context::ResolvedContext;

/// Computes the options offered by `definition` within `context`.
///
/// A text variable offers its literal value. A list variable is evaluated
/// by `capability` against its datasource and the context's time window,
/// then sorted; the "All" option comes first when allowed.
///
/// # Errors
/// Returns `ApplicationError::Plugin` if the datasource cannot be found or
/// the query fails.
pub async fn evaluate_options(
    capability: &dyn QueryCapability,
    definition: &VariableDefinition,
    context: &ResolvedContext,
) -> ApplicationResult<Vec<String>> {
    let spec = &definition.spec;
    if spec.kind == VariableKind::TextVariable {
        return Ok(vec![spec.query.clone()]);
    }

    let datasource = match &spec.datasource {
        Some(selector) => Some(context.find_datasource(selector).ok_or_else(|| {
            ApplicationError::Plugin(format!(
                "no datasource of kind '{}' for variable '{}'",
                selector.kind, definition.name
            ))
        })?),
        None => None,
    };

    let query_context = QueryContext {
        datasource,
        window: context.window(),
        variables: context.variables(),
    };
    let mut values = capability
        .list_values(definition, query_context)
        .await
        .map_err(|e| {
            tracing::warn!(variable = %definition.name, error = %e, "Variable query failed");
            ApplicationError::Plugin(e.to_string())
        })?;

    if let Some(sort) = spec.sort {
        sort.apply(&mut values);
    }
    if spec.allow_all_value {
        values.insert(0, ALL_VALUE.to_string());
    }
    Ok(values)
}
