//! Validation rule engine port

use varscope_domain::VariableDefinition;

/// A set of validation rules for variable definitions.
pub trait Validator: Send + Sync {
    /// Returns one message per violated rule, empty when valid.
    fn validate(&self, definition: &VariableDefinition) -> Vec<String>;
}
