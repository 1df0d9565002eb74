//! Variable resources, runtime definitions and drafts

mod definition;
mod draft;
mod spec;
mod validation;

pub use definition::VariableDefinition;
pub use draft::{Draft, DraftChange};
pub use spec::{
    Variable, VariableDisplay, VariableKind, VariableMetadata, VariableSort, VariableSpec,
};
pub use validation::{MAX_NAME_LENGTH, definition_violations, validate_name};
