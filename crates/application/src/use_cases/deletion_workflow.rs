//! Confirm-then-delete workflow

use varscope_domain::{DeletionDialog, Variable};

use crate::error::{ApplicationError, ApplicationResult};
use crate::ports::VariableRepository;

/// Removes one variable after an explicit confirmation.
///
/// Nothing is deleted until [`Self::confirm`]; a rejected delete leaves the
/// confirmation open with the error attached.
pub struct DeletionWorkflow<R> {
    repository: R,
    target: Variable,
    dialog: DeletionDialog,
    deleted: bool,
}

impl<R: VariableRepository> DeletionWorkflow<R> {
    /// Creates the workflow for `target`.
    pub const fn new(repository: R, target: Variable) -> Self {
        Self {
            repository,
            target,
            dialog: DeletionDialog::Closed,
            deleted: false,
        }
    }

    /// Returns the variable to delete.
    #[must_use]
    pub const fn target(&self) -> &Variable {
        &self.target
    }

    /// Returns the confirmation state.
    #[must_use]
    pub const fn dialog(&self) -> &DeletionDialog {
        &self.dialog
    }

    /// Returns true once the variable was deleted.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Opens the confirmation.
    ///
    /// # Errors
    /// Returns `ApplicationError::SessionClosed` if the variable is already
    /// deleted.
    pub fn request(&mut self) -> ApplicationResult<()> {
        if self.deleted {
            return Err(ApplicationError::SessionClosed);
        }
        if !self.dialog.is_open() {
            self.dialog = DeletionDialog::Confirming { error: None };
        }
        Ok(())
    }

    /// Closes the confirmation without deleting.
    pub fn cancel(&mut self) {
        if matches!(self.dialog, DeletionDialog::Confirming { .. }) {
            self.dialog = DeletionDialog::Closed;
        }
    }

    /// Deletes the variable.
    ///
    /// # Errors
    /// Returns `ApplicationError::NotConfirming` if the confirmation is not
    /// open, or `ApplicationError::Commit` if the delete is rejected. The
    /// confirmation then stays open and shows the error.
    pub async fn confirm(&mut self) -> ApplicationResult<()> {
        if !matches!(self.dialog, DeletionDialog::Confirming { .. }) {
            return Err(ApplicationError::NotConfirming);
        }

        self.dialog = DeletionDialog::Submitting;
        match self.repository.delete(&self.target).await {
            Ok(()) => {
                tracing::info!(
                    variable = self.target.name(),
                    project = ?self.target.project_name(),
                    "Variable deleted"
                );
                self.dialog = DeletionDialog::Closed;
                self.deleted = true;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(variable = self.target.name(), error = %e, "Failed to delete variable");
                let message = e.to_string();
                self.dialog = DeletionDialog::Confirming {
                    error: Some(message.clone()),
                };
                Err(ApplicationError::Commit(message))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::test_support::MockRepository;
    use pretty_assertions::assert_eq;
    use varscope_domain::VariableSpec;

    fn region() -> Variable {
        Variable::global("region", VariableSpec::text("eu"))
    }

    #[test]
    fn test_request_is_not_destructive() {
        let repository = MockRepository::with(vec![region()]);
        let mut workflow = DeletionWorkflow::new(repository.clone(), region());

        workflow.request().expect("Should open");
        assert_eq!(workflow.dialog(), &DeletionDialog::Confirming { error: None });

        workflow.cancel();
        assert_eq!(workflow.dialog(), &DeletionDialog::Closed);
        assert_eq!(repository.variables(), vec![region()]);
    }

    #[tokio::test]
    async fn test_rejected_delete_keeps_confirmation_open() {
        let repository = MockRepository::with(vec![region()]);
        repository.fail_deletes(Some("403 Forbidden"));
        let mut workflow = DeletionWorkflow::new(repository.clone(), region());

        workflow.request().expect("Should open");
        let result = workflow.confirm().await;

        assert!(matches!(result, Err(ApplicationError::Commit(_))));
        assert!(workflow.dialog().is_open());
        assert!(workflow.dialog().error().is_some_and(|e| e.contains("403")));
        assert!(!workflow.is_deleted());
        assert_eq!(repository.variables(), vec![region()]);
    }

    #[tokio::test]
    async fn test_successful_delete_closes_confirmation() {
        let repository = MockRepository::with(vec![region()]);
        let mut workflow = DeletionWorkflow::new(repository.clone(), region());

        workflow.request().expect("Should open");
        workflow.confirm().await.expect("Should delete");

        assert_eq!(workflow.dialog(), &DeletionDialog::Closed);
        assert!(workflow.is_deleted());
        assert!(repository.variables().is_empty());
        assert!(matches!(workflow.request(), Err(ApplicationError::SessionClosed)));
        assert!(matches!(
            workflow.confirm().await,
            Err(ApplicationError::NotConfirming)
        ));
        assert_eq!(repository.delete_count(), 1);
    }

    #[tokio::test]
    async fn test_confirm_without_request() {
        let repository = MockRepository::with(vec![region()]);
        let mut workflow = DeletionWorkflow::new(repository.clone(), region());

        assert!(matches!(
            workflow.confirm().await,
            Err(ApplicationError::NotConfirming)
        ));
        assert_eq!(repository.delete_count(), 0);
    }
}
