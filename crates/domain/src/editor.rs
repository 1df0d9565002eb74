//! Editing session state types.
//!
//! These enums describe what the host chrome should show for an editing
//! session: which mode the editor is in and whether the delete confirmation
//! is open.

use serde::{Deserialize, Serialize};

/// Mode of the variable editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EditorAction {
    /// Viewing a variable.
    #[default]
    Read,
    /// Editing an existing variable.
    Update,
    /// Creating a new variable.
    Create,
}

impl EditorAction {
    /// Returns true if this mode accepts edits.
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        matches!(self, Self::Update | Self::Create)
    }
}

/// State of the delete confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DeletionDialog {
    /// Not shown.
    #[default]
    Closed,
    /// Waiting for the user to confirm.
    Confirming {
        /// Error of the last failed attempt, shown inline.
        error: Option<String>,
    },
    /// The delete collaborator is running.
    Submitting,
}

impl DeletionDialog {
    /// Returns true if the confirmation is visible.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }

    /// Returns the error of the last failed attempt.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Confirming { error } => error.as_deref(),
            _ => None,
        }
    }
}

/// Outcome of a dismissal request that did not come from an explicit
/// cancel or close (for example a click outside the editor).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissOutcome {
    /// The session stays open.
    Ignored,
    /// No session was open.
    NotOpen,
}
