//! Draft lifecycle of one variable editing session

use std::sync::Arc;

use varscope_domain::{
    DismissOutcome, Draft, DraftChange, EditorAction, Variable, generate_session_id,
};

use crate::error::{ApplicationError, ApplicationResult};
use crate::ports::{EditorObserver, VariableRepository};

use super::validation::ValidationScope;

/// Options of an editing session.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Initial editor mode.
    pub action: EditorAction,
    /// Reject every change, whatever the mode.
    pub read_only: bool,
    /// Rules checked before saving.
    pub validation: ValidationScope,
}

/// Owns the draft of one variable from `begin` until commit or discard.
///
/// The persisted variable is never touched until [`Self::commit`] succeeds.
pub struct DraftController<R> {
    repository: R,
    observer: Arc<dyn EditorObserver>,
    original: Variable,
    draft: Option<Draft>,
    action: EditorAction,
    read_only: bool,
    validation: ValidationScope,
    session_id: String,
}

impl<R: VariableRepository> DraftController<R> {
    /// Starts an editing session on a copy of `variable`.
    pub fn begin(
        repository: R,
        observer: Arc<dyn EditorObserver>,
        variable: Variable,
        options: SessionOptions,
    ) -> Self {
        let session_id = generate_session_id();
        tracing::debug!(
            session = %session_id,
            variable = variable.name(),
            action = ?options.action,
            "Editing session started"
        );
        Self {
            repository,
            observer,
            draft: Some(Draft::begin(&variable)),
            original: variable,
            action: options.action,
            read_only: options.read_only,
            validation: options.validation,
            session_id,
        }
    }

    /// Returns the live draft, if the session is open.
    #[must_use]
    pub const fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    /// Returns the persisted variable as last committed.
    #[must_use]
    pub const fn original(&self) -> &Variable {
        &self.original
    }

    /// Returns the editor mode.
    #[must_use]
    pub const fn action(&self) -> EditorAction {
        self.action
    }

    /// Returns true if the session rejects changes.
    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Returns true until the session was committed, discarded or closed.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.draft.is_some()
    }

    /// Returns the session identifier used in logs.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Switches the editor mode and notifies the observer.
    ///
    /// # Errors
    /// Returns `ApplicationError::SessionClosed` if the session ended, or
    /// `ApplicationError::ReadOnly` when switching a read-only session to an
    /// editable mode.
    pub fn set_action(&mut self, action: EditorAction) -> ApplicationResult<()> {
        if !self.is_open() {
            return Err(ApplicationError::SessionClosed);
        }
        if self.read_only && action.is_editable() {
            return Err(ApplicationError::ReadOnly);
        }
        if self.action != action {
            self.action = action;
            self.observer.action_changed(action);
        }
        Ok(())
    }

    /// Applies `change` to the draft.
    ///
    /// # Errors
    /// Returns `ApplicationError::SessionClosed` if the session ended, or
    /// `ApplicationError::ReadOnly` if the session does not accept changes.
    pub fn edit(&mut self, change: DraftChange) -> ApplicationResult<&Draft> {
        self.ensure_writable()?;
        let draft = self.draft.take().ok_or(ApplicationError::SessionClosed)?;
        Ok(&*self.draft.insert(draft.edit(change)))
    }

    /// Validates the draft and saves it, ending the session on success.
    ///
    /// The saved variable takes its name and spec from the draft and keeps
    /// the project of the original.
    ///
    /// # Errors
    /// Returns `ApplicationError::Validation` if active rules are violated,
    /// or `ApplicationError::Commit` if the save is rejected. Either way
    /// the draft stays live and nothing was persisted.
    pub async fn commit(&mut self) -> ApplicationResult<Variable> {
        self.ensure_writable()?;
        let draft = self.draft.as_ref().ok_or(ApplicationError::SessionClosed)?;

        let violations = self.validation.check(draft.definition());
        if !violations.is_empty() {
            tracing::debug!(session = %self.session_id, ?violations, "Draft rejected by validation");
            return Err(ApplicationError::Validation(violations));
        }

        let updated = draft.to_variable(&self.original);
        self.repository.save(&updated).await.map_err(|e| {
            tracing::warn!(
                session = %self.session_id,
                variable = updated.name(),
                error = %e,
                "Failed to save variable"
            );
            ApplicationError::Commit(e.to_string())
        })?;

        tracing::info!(
            session = %self.session_id,
            variable = updated.name(),
            project = ?updated.project_name(),
            "Variable saved"
        );
        self.original = updated.clone();
        self.finish();
        Ok(updated)
    }

    /// Drops the draft without saving and ends the session.
    ///
    /// # Errors
    /// Returns `ApplicationError::SessionClosed` if the session already
    /// ended.
    pub fn discard(&mut self) -> ApplicationResult<()> {
        if !self.is_open() {
            return Err(ApplicationError::SessionClosed);
        }
        tracing::debug!(session = %self.session_id, "Draft discarded");
        self.finish();
        Ok(())
    }

    /// Handles a dismissal that is not an explicit cancel, such as a click
    /// outside the editor. The session is never closed this way.
    #[must_use]
    pub const fn dismiss_outside(&self) -> DismissOutcome {
        if self.is_open() {
            DismissOutcome::Ignored
        } else {
            DismissOutcome::NotOpen
        }
    }

    /// Ends the session, notifying the observer the first time only.
    pub(crate) fn finish(&mut self) {
        if self.draft.take().is_some() {
            self.observer.closed();
        }
    }

    pub(crate) fn ensure_writable(&self) -> ApplicationResult<()> {
        if self.draft.is_none() {
            return Err(ApplicationError::SessionClosed);
        }
        if self.read_only || !self.action.is_editable() {
            return Err(ApplicationError::ReadOnly);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::test_support::{MockObserver, MockRepository};
    use pretty_assertions::assert_eq;
    use varscope_domain::{DatasourceSelector, VariableSpec};

    fn env_variable() -> Variable {
        Variable::project("infra", "env", VariableSpec::text("prod"))
    }

    fn update() -> SessionOptions {
        SessionOptions {
            action: EditorAction::Update,
            ..SessionOptions::default()
        }
    }

    fn controller(
        repository: &MockRepository,
        options: SessionOptions,
    ) -> (DraftController<MockRepository>, Arc<MockObserver>) {
        let observer = Arc::new(MockObserver::default());
        let controller = DraftController::begin(
            repository.clone(),
            Arc::clone(&observer) as Arc<dyn EditorObserver>,
            env_variable(),
            options,
        );
        (controller, observer)
    }

    #[test]
    fn test_discard_leaves_original_untouched() {
        let repository = MockRepository::with(vec![env_variable()]);
        let (mut controller, observer) = controller(&repository, update());

        controller
            .edit(DraftChange::SetQuery("staging".to_string()))
            .expect("Should edit");
        controller.discard().expect("Should discard");

        assert_eq!(controller.original(), &env_variable());
        assert_eq!(controller.original().spec.query, "prod");
        assert_eq!(repository.variables(), vec![env_variable()]);
        assert_eq!(repository.save_count(), 0);
        assert_eq!(observer.closed_count(), 1);
        assert!(!controller.is_open());
    }

    #[tokio::test]
    async fn test_commit_round_trips_name_and_spec() {
        let repository = MockRepository::with(vec![env_variable()]);
        let (mut controller, observer) = controller(&repository, update());

        controller
            .edit(DraftChange::SetQuery("staging".to_string()))
            .expect("Should edit");
        controller
            .edit(DraftChange::SetDescription(Some("Deployment".to_string())))
            .expect("Should edit");
        let saved = controller.commit().await.expect("Should commit");

        assert_eq!(saved.name(), "env");
        assert_eq!(saved.project_name(), Some("infra"));
        assert_eq!(saved.spec.query, "staging");
        assert_eq!(saved.spec.display.description.as_deref(), Some("Deployment"));
        assert_eq!(repository.variables(), vec![saved.clone()]);
        assert_eq!(controller.original(), &saved);
        assert_eq!(observer.closed_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_commit_keeps_draft() {
        let repository = MockRepository::with(vec![env_variable()]);
        repository.fail_saves(Some("409 Conflict"));
        let (mut controller, observer) = controller(&repository, update());

        controller
            .edit(DraftChange::SetQuery("staging".to_string()))
            .expect("Should edit");
        let result = controller.commit().await;

        assert!(matches!(result, Err(ApplicationError::Commit(_))));
        assert!(controller.is_open());
        assert_eq!(controller.draft().expect("Draft").spec().query, "staging");
        assert_eq!(controller.original(), &env_variable());
        assert_eq!(observer.closed_count(), 0);

        repository.fail_saves(None);
        let saved = controller.commit().await.expect("Retry should commit");
        assert_eq!(saved.spec.query, "staging");
        assert_eq!(observer.closed_count(), 1);
    }

    #[tokio::test]
    async fn test_validation_blocks_commit() {
        let repository = MockRepository::default();
        let options = SessionOptions {
            validation: ValidationScope::builtin(),
            ..update()
        };
        let (mut controller, _observer) = controller(&repository, options);

        controller
            .edit(DraftChange::ReplaceSpec(VariableSpec::list(
                "",
                DatasourceSelector::kind("PrometheusDatasource"),
            )))
            .expect("Should edit");
        let result = controller.commit().await;

        assert!(matches!(result, Err(ApplicationError::Validation(v)) if v.len() == 1));
        assert_eq!(repository.save_count(), 0);
        assert!(controller.is_open());
    }

    #[tokio::test]
    async fn test_read_only_rejects_changes() {
        let repository = MockRepository::with(vec![env_variable()]);
        let options = SessionOptions {
            read_only: true,
            ..SessionOptions::default()
        };
        let (mut controller, observer) = controller(&repository, options);

        assert!(matches!(
            controller.edit(DraftChange::SetHidden(true)),
            Err(ApplicationError::ReadOnly)
        ));
        assert!(matches!(
            controller.set_action(EditorAction::Update),
            Err(ApplicationError::ReadOnly)
        ));
        assert!(matches!(controller.commit().await, Err(ApplicationError::ReadOnly)));
        assert!(observer.actions().is_empty());
    }

    #[test]
    fn test_read_mode_requires_switch_to_update() {
        let repository = MockRepository::default();
        let (mut controller, observer) = controller(&repository, SessionOptions::default());

        assert!(controller.edit(DraftChange::SetHidden(true)).is_err());
        controller
            .set_action(EditorAction::Update)
            .expect("Should switch");
        controller
            .set_action(EditorAction::Update)
            .expect("Same mode is a no-op");

        assert!(controller.edit(DraftChange::SetHidden(true)).is_ok());
        assert_eq!(observer.actions(), vec![EditorAction::Update]);
    }

    #[test]
    fn test_click_outside_is_ignored() {
        let repository = MockRepository::default();
        let (mut controller, observer) = controller(&repository, update());

        assert_eq!(controller.dismiss_outside(), DismissOutcome::Ignored);
        assert!(controller.is_open());
        assert_eq!(observer.closed_count(), 0);

        controller.discard().expect("Should discard");
        assert_eq!(controller.dismiss_outside(), DismissOutcome::NotOpen);
        assert!(matches!(controller.discard(), Err(ApplicationError::SessionClosed)));
        assert_eq!(observer.closed_count(), 1);
    }
}
