//! varscope Domain - Core variable types
//!
//! This crate defines the domain model for scoped dashboard variables:
//! variable resources and drafts, scope-tagged definition bundles and their
//! precedence rule, datasources, time ranges and the view-readiness gate.
//! All types here are pure Rust with no I/O dependencies.

pub mod datasource;
pub mod editor;
pub mod error;
pub mod id;
pub mod load_gate;
pub mod scope;
pub mod time_range;
pub mod variable;

pub use datasource::{
    DatasourceMetadata, DatasourcePlugin, DatasourceResource, DatasourceSelector,
    DatasourceSpec, DatasourceStore,
};
pub use editor::{DeletionDialog, DismissOutcome, EditorAction};
pub use error::{DomainError, DomainResult};
pub use id::generate_session_id;
pub use load_gate::{Fault, FaultBoundary, FaultOrigin, FetchKind, GateState, LoadGate};
pub use scope::{
    ALL_VALUE, ExternalVariableDefinition, ResolvedVariable, VALUE_PARAM_PREFIX, VariableScope,
    VariableStore, VariableValue,
};
pub use time_range::{AbsoluteTimeRange, DEFAULT_TIME_RANGE, DurationString, TimeRange};
pub use variable::{
    Draft, DraftChange, Variable, VariableDefinition, VariableDisplay, VariableKind,
    VariableMetadata, VariableSort, VariableSpec,
};
