//! Editor observer port

use varscope_domain::EditorAction;

/// Receives notifications the host chrome needs to leave or switch the
/// editing mode.
pub trait EditorObserver: Send + Sync {
    /// The editor switched mode.
    fn action_changed(&self, action: EditorAction);

    /// The editing session ended (commit, delete, discard or close).
    fn closed(&self);
}

/// Observer that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl EditorObserver for NoopObserver {
    fn action_changed(&self, _action: EditorAction) {}

    fn closed(&self) {}
}
