//! Editing drafts
//!
//! A draft is an owned copy of a variable's definition that can be edited
//! freely. Nothing reaches the persisted [`Variable`] until the draft is
//! folded back with [`Draft::to_variable`].

use crate::datasource::DatasourceSelector;

use super::definition::VariableDefinition;
use super::spec::{Variable, VariableKind, VariableSort, VariableSpec};

/// A single change applied to a draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftChange {
    /// Renames the variable.
    Rename(String),
    /// Replaces the whole spec.
    ReplaceSpec(VariableSpec),
    /// Changes the variable kind.
    SetKind(VariableKind),
    /// Sets or clears the display name.
    SetDisplayName(Option<String>),
    /// Sets or clears the description.
    SetDescription(Option<String>),
    /// Hides or shows the variable.
    SetHidden(bool),
    /// Replaces the query text.
    SetQuery(String),
    /// Sets or clears the datasource selector.
    SetDatasource(Option<DatasourceSelector>),
    /// Sets or clears the default value.
    SetDefaultValue(Option<String>),
    /// Toggles multi-selection.
    SetAllowMultiple(bool),
    /// Toggles the "All" option.
    SetAllowAllValue(bool),
    /// Sets or clears the option sort.
    SetSort(Option<VariableSort>),
}

/// An in-progress edit of one variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    current: VariableDefinition,
    baseline: VariableDefinition,
}

impl Draft {
    /// Starts a draft from a persisted variable.
    ///
    /// The draft owns a deep copy of the spec with the name denormalized in;
    /// it keeps no reference into `variable`.
    #[must_use]
    pub fn begin(variable: &Variable) -> Self {
        let definition = variable.to_definition();
        Self {
            current: definition.clone(),
            baseline: definition,
        }
    }

    /// Returns a draft reflecting `change`.
    #[must_use]
    pub fn edit(mut self, change: DraftChange) -> Self {
        let spec = &mut self.current.spec;
        match change {
            DraftChange::Rename(name) => self.current.name = name,
            DraftChange::ReplaceSpec(new_spec) => *spec = new_spec,
            DraftChange::SetKind(kind) => spec.kind = kind,
            DraftChange::SetDisplayName(name) => spec.display.name = name,
            DraftChange::SetDescription(description) => spec.display.description = description,
            DraftChange::SetHidden(hidden) => spec.display.hidden = hidden,
            DraftChange::SetQuery(query) => spec.query = query,
            DraftChange::SetDatasource(datasource) => spec.datasource = datasource,
            DraftChange::SetDefaultValue(value) => spec.default_value = value,
            DraftChange::SetAllowMultiple(allow) => spec.allow_multiple = allow,
            DraftChange::SetAllowAllValue(allow) => spec.allow_all_value = allow,
            DraftChange::SetSort(sort) => spec.sort = sort,
        }
        self
    }

    /// Returns the draft name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.current.name
    }

    /// Returns the draft spec.
    #[must_use]
    pub const fn spec(&self) -> &VariableSpec {
        &self.current.spec
    }

    /// Returns the draft as a runtime definition.
    #[must_use]
    pub const fn definition(&self) -> &VariableDefinition {
        &self.current
    }

    /// Returns true if the draft differs from the variable it started from.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.current != self.baseline
    }

    /// Folds the draft back into `original`, overwriting its name and spec.
    ///
    /// The project of `original` is preserved.
    #[must_use]
    pub fn to_variable(&self, original: &Variable) -> Variable {
        self.current
            .clone()
            .into_variable(original.metadata.project.clone())
    }
}
