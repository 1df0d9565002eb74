//! Validation activation scope

use std::sync::Arc;

use varscope_domain::VariableDefinition;
use varscope_domain::variable::definition_violations;

use crate::ports::Validator;

/// The built-in rule set: resource-name syntax, and a query plus a
/// datasource kind for list variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinValidator;

impl Validator for BuiltinValidator {
    fn validate(&self, definition: &VariableDefinition) -> Vec<String> {
        definition_violations(definition)
            .into_iter()
            .map(|e| e.to_string())
            .collect()
    }
}

/// Whether validation rules run for the views below it.
///
/// Only activation is modelled; the rules themselves come from the
/// [`Validator`]. The default scope runs the built-in rules.
#[derive(Clone)]
pub struct ValidationScope {
    validator: Option<Arc<dyn Validator>>,
}

impl ValidationScope {
    /// Activates `validator`.
    #[must_use]
    pub fn enabled(validator: Arc<dyn Validator>) -> Self {
        Self {
            validator: Some(validator),
        }
    }

    /// Activates the built-in rules.
    #[must_use]
    pub fn builtin() -> Self {
        Self::enabled(Arc::new(BuiltinValidator))
    }

    /// No rule runs.
    #[must_use]
    pub const fn disabled() -> Self {
        Self { validator: None }
    }

    /// Returns true if rules run.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.validator.is_some()
    }

    /// Returns the violations of `definition`; always empty while inactive.
    #[must_use]
    pub fn check(&self, definition: &VariableDefinition) -> Vec<String> {
        self.validator
            .as_ref()
            .map(|validator| validator.validate(definition))
            .unwrap_or_default()
    }
}

impl Default for ValidationScope {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for ValidationScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationScope")
            .field("active", &self.is_active())
            .finish()
    }
}
