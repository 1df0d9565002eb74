//! Application use cases (variable workflow orchestration).

mod compose_context;
mod deletion_workflow;
mod draft_controller;
mod evaluation;
mod load_scopes;
mod merge_scopes;
mod project_explore;
mod services;
mod validation;
mod variable_editor;

pub use compose_context::{ResolutionContextComposer, ResolvedContext};
pub use deletion_workflow::DeletionWorkflow;
pub use draft_controller::{DraftController, SessionOptions};
pub use evaluation::evaluate_options;
pub use load_scopes::{LoadScopes, ScopeFetch, ScopeSnapshot, guarded};
pub use merge_scopes::{GLOBAL_SOURCE, NO_PROJECT, ScopeMerger, selected_project};
pub use project_explore::ProjectExplore;
pub use services::ViewServices;
pub use validation::{BuiltinValidator, ValidationScope};
pub use variable_editor::VariableEditor;
