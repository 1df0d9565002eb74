//! Built-in validation rules for variable definitions

use std::sync::LazyLock;

use regex::Regex;

use super::definition::VariableDefinition;
use super::spec::VariableKind;
use crate::error::{DomainError, DomainResult};

/// Maximum length of a resource name.
pub const MAX_NAME_LENGTH: usize = 75;

static NAME_PATTERN: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_.-]+$"));

/// Checks that `name` is a valid resource name.
///
/// # Errors
/// Returns `DomainError::InvalidName` if the name is empty, too long or
/// contains characters other than ASCII letters, digits, `_`, `.` and `-`.
pub fn validate_name(name: &str) -> DomainResult<()> {
    if name.is_empty() {
        return Err(DomainError::InvalidName("name cannot be empty".to_string()));
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(DomainError::InvalidName(format!(
            "'{name}' is longer than {MAX_NAME_LENGTH} characters"
        )));
    }
    let matches = match NAME_PATTERN.as_ref() {
        Ok(pattern) => pattern.is_match(name),
        Err(e) => return Err(DomainError::InvalidName(e.to_string())),
    };
    if !matches {
        return Err(DomainError::InvalidName(format!(
            "'{name}' must only contain alphanumerics, '_', '.' or '-'"
        )));
    }
    Ok(())
}

/// Runs every built-in rule against `definition` and collects the violations.
#[must_use]
pub fn definition_violations(definition: &VariableDefinition) -> Vec<DomainError> {
    let mut violations = Vec::new();

    if let Err(e) = validate_name(&definition.name) {
        violations.push(e);
    }

    if definition.spec.kind == VariableKind::ListVariable {
        if definition.spec.query.trim().is_empty() {
            violations.push(DomainError::InvalidVariable(
                "list variable requires a query".to_string(),
            ));
        }
        match &definition.spec.datasource {
            Some(selector) if selector.kind.trim().is_empty() => {
                violations.push(DomainError::InvalidVariable(
                    "datasource kind cannot be empty".to_string(),
                ));
            }
            None => violations.push(DomainError::InvalidVariable(
                "list variable requires a datasource".to_string(),
            )),
            Some(_) => {}
        }
    }

    violations
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::datasource::DatasourceSelector;
    use crate::variable::VariableSpec;

    #[test]
    fn test_valid_names() {
        assert!(validate_name("region").is_ok());
        assert!(validate_name("my_var-2.0").is_ok());
    }

    #[test]
    fn test_invalid_names() {
        assert!(validate_name("").is_err());
        assert!(validate_name("has space").is_err());
        assert!(validate_name("$region").is_err());
        assert!(validate_name(&"a".repeat(MAX_NAME_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_text_variable_has_no_violations() {
        let definition = VariableDefinition::new("env", VariableSpec::text(""));
        assert!(definition_violations(&definition).is_empty());
    }

    #[test]
    fn test_list_variable_requires_query_and_datasource() {
        let mut spec = VariableSpec::list("", DatasourceSelector::kind("PrometheusDatasource"));
        spec.datasource = None;
        let definition = VariableDefinition::new("instance", spec);

        let violations = definition_violations(&definition);
        assert_eq!(violations.len(), 2);
    }
}
